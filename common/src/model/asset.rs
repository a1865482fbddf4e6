use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A SCORM package uploaded by a core admin.
///
/// `scorm_id` is the identifier the LMS assigned to the package; it is the
/// course half of every launch token minted for this asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScormAsset {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub duration_minutes: Option<i64>,
    pub upload_date: DateTime<Utc>,
    pub is_deleted: bool,
    pub scorm_id: Option<String>,
    pub scorm_file: String,
}
