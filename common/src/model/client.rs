use crate::model::assignment::ScormAssignment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organization that licenses SCORM packages.
///
/// `domains` holds the comma separated list of hosts allowed to launch the
/// client's packages. `lms_api_key` doubles as the client-admin bearer token
/// and is never serialized back to API consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_phone: Option<String>,
    pub company: String,
    pub domains: Option<String>,
    pub lms_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub lms_api_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    /// Domains allowed to launch this client's packages, trimmed and without empties.
    pub fn allowed_domains(&self) -> Vec<&str> {
        self.domains
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .collect()
    }

    pub fn allows_domain(&self, domain: &str) -> bool {
        let domain = domain.trim();
        self.allowed_domains()
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
    }
}

/// A client together with everything assigned to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientDetails {
    #[serde(flatten)]
    pub client: Client,
    pub assignments: Vec<ScormAssignment>,
}
