use serde::{Deserialize, Serialize};

/// Body of `POST /api/validate-and-launch`.
///
/// Every field is optional on the wire so that a missing field is reported as
/// "Missing required data" rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchRequest {
    /// Launch token minted when the client's package was generated.
    pub id: Option<String>,
    pub referringurl: Option<String>,
    pub learner_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchResponse {
    pub launch_url: String,
    pub cloudscorm_user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
