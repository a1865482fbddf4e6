use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_phone: Option<String>,
    pub company: String,
    pub domains: Option<String>,
    pub lms_url: Option<String>,
    pub lms_api_key: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub contact_phone: Option<String>,
    pub company: Option<String>,
    pub domains: Option<String>,
    pub lms_url: Option<String>,
    pub lms_api_key: Option<String>,
}

/// Metadata part of the multipart SCORM upload. It must precede the `file` part.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadScormRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub duration_minutes: Option<i64>,
    /// LMS identifier when the package was already registered with the LMS.
    pub scorm_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignScormRequest {
    pub scorms: Vec<i64>,
    #[serde(default = "default_seats")]
    pub number_of_seats: i64,
    pub validity_start_date: Option<DateTime<Utc>>,
    pub validity_end_date: Option<DateTime<Utc>>,
}

fn default_seats() -> i64 {
    1
}
