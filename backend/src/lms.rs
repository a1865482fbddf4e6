//! CloudScorm LMS client.
//!
//! Three calls are used: package upload (which yields the LMS course id),
//! learner creation, and launch URL construction. All requests carry the
//! configured bearer token.

use crate::error::LmsError;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const LAUNCH_SUFFIX: &str = "online/0-0-0-0-0";

#[derive(Debug, Clone, Default)]
pub struct LmsSettings {
    /// Base URL of the LMS, e.g. `https://cloudscorm.example.com`.
    pub base_url: Option<String>,
    /// Package upload endpoint.
    pub upload_url: Option<String>,
    pub token: Option<String>,
}

/// What the LMS answered to a package upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedPackage {
    pub scorm_id: String,
    pub message: Option<String>,
    /// Raw response body, kept on the asset for auditing.
    pub raw: String,
}

#[derive(Deserialize)]
struct UploadBody {
    status: Option<bool>,
    message: Option<String>,
    scorm: Option<Value>,
}

#[derive(Deserialize)]
struct UserBody {
    user_id: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct CloudScormClient {
    http: reqwest::Client,
    settings: LmsSettings,
}

impl CloudScormClient {
    pub fn new(settings: LmsSettings) -> Result<Self, LmsError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, settings })
    }

    pub fn is_configured(&self) -> bool {
        self.settings.base_url.is_some()
    }

    fn base_url(&self) -> Result<&str, LmsError> {
        self.settings
            .base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .ok_or(LmsError::NotConfigured("base URL"))
    }

    fn token(&self) -> Result<&str, LmsError> {
        self.settings
            .token
            .as_deref()
            .ok_or(LmsError::NotConfigured("API token"))
    }

    /// Uploads a SCORM package and returns the identifier the LMS assigned.
    pub async fn upload_package(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedPackage, LmsError> {
        let url = self
            .settings
            .upload_url
            .as_deref()
            .ok_or(LmsError::NotConfigured("upload URL"))?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/zip")?;
        let response = self
            .http
            .post(url)
            .bearer_auth(self.token()?)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("LMS upload answered {}: {}", status, body);
        parse_upload_response(status, &body)
    }

    /// Registers a learner with the LMS and returns its LMS user id.
    pub async fn create_user(&self, learner_id: &str, website: &str) -> Result<String, LmsError> {
        let url = format!("{}/user/signup", self.base_url()?);
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.token()?)
            .form(&[("website_user_id", learner_id), ("website", website)])
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        let user_id = parse_user_response(status, &body)?;
        info!("Created LMS user {} for learner {}", user_id, learner_id);
        Ok(user_id)
    }

    pub fn launch_url(&self, scorm_id: &str, cloudscorm_user_id: &str) -> Result<String, LmsError> {
        Ok(format!(
            "{}/course/{}/{}/{}",
            self.base_url()?,
            scorm_id,
            cloudscorm_user_id,
            LAUNCH_SUFFIX
        ))
    }
}

/// LMS ids arrive as JSON numbers or strings.
fn id_from(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn parse_upload_response(status: u16, body: &str) -> Result<UploadedPackage, LmsError> {
    if status != 200 {
        return Err(LmsError::Api {
            status,
            body: body.to_string(),
        });
    }
    let parsed: UploadBody =
        serde_json::from_str(body).map_err(|e| LmsError::Parse(e.to_string()))?;
    if parsed.status != Some(true) {
        return Err(LmsError::Parse(format!(
            "upload rejected: {}",
            parsed.message.unwrap_or_default()
        )));
    }
    let scorm_id = parsed
        .scorm
        .as_ref()
        .and_then(id_from)
        .ok_or_else(|| LmsError::Parse("response has no scorm id".into()))?;
    Ok(UploadedPackage {
        scorm_id,
        message: parsed.message,
        raw: body.to_string(),
    })
}

fn parse_user_response(status: u16, body: &str) -> Result<String, LmsError> {
    if !(200..300).contains(&status) {
        return Err(LmsError::Api {
            status,
            body: body.to_string(),
        });
    }
    let parsed: UserBody =
        serde_json::from_str(body).map_err(|e| LmsError::Parse(e.to_string()))?;
    parsed
        .user_id
        .as_ref()
        .and_then(id_from)
        .ok_or_else(|| LmsError::Parse("response has no user_id".into()))
}
