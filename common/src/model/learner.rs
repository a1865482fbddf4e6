use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A learner of a client, created on first launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientUser {
    pub id: i64,
    pub client_id: i64,
    pub learner_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub scorm_consumed: i64,
    pub cloudscorm_user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
