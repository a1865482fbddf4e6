use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A SCORM asset licensed to a client, with the client-specific wrapper package
/// generated for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScormAssignment {
    pub id: i64,
    pub client_id: i64,
    pub asset_id: i64,
    pub date_assigned: DateTime<Utc>,
    pub number_of_seats: i64,
    pub validity_start_date: Option<DateTime<Utc>>,
    pub validity_end_date: Option<DateTime<Utc>>,
    /// Storage name of the generated package, relative to the media root.
    pub client_scorm_file: Option<String>,
    pub package_md5: Option<String>,
    /// Public URL of the generated package. Filled in by the API, not stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_url: Option<String>,
}

impl ScormAssignment {
    /// Whether `now` falls inside the validity window. A missing bound is open.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let started = self.validity_start_date.is_none_or(|start| start <= now);
        let not_ended = self.validity_end_date.is_none_or(|end| now <= end);
        started && not_ended
    }

    /// Seat check. Learners already holding a seat are always admitted.
    pub fn has_seat_for(&self, seats_taken: i64, already_mapped: bool) -> bool {
        already_mapped || seats_taken < self.number_of_seats
    }
}
