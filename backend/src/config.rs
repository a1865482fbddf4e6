//! Command line and environment configuration.
//!
//! Every `serve` option can come from a flag or from its `SCORMHUB_*`
//! environment variable. The token key and the admin token have no default:
//! starting without them is a configuration error.

use crate::packaging::codec::{KeyError, TokenCodec};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid SCORMHUB_TOKEN_KEY: {0}")]
    TokenKey(#[from] KeyError),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Parser, Debug)]
#[command(name = "scormhub")]
#[command(about = "Distributes client-branded SCORM wrapper packages")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Print a new random token key
    Keygen,
    /// Build one client package from the command line
    Package(PackageArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1", env = "SCORMHUB_HOST")]
    pub host: String,

    #[arg(short, long, default_value = "8080", env = "SCORMHUB_PORT")]
    pub port: u16,

    /// SQLite database file
    #[arg(long, default_value = "scormhub.sqlite", env = "SCORMHUB_DB")]
    pub db: PathBuf,

    /// Directory uploaded and generated packages are stored in
    #[arg(long, default_value = "media", env = "SCORMHUB_MEDIA_ROOT")]
    pub media_root: PathBuf,

    /// Public URL prefix of the media root
    #[arg(long, default_value = "/media", env = "SCORMHUB_MEDIA_URL")]
    pub media_url: String,

    /// Generic SCORM wrapper every client package is built from
    #[arg(
        long,
        default_value = "media/scorm_wrapper/scorm-wrapper.zip",
        env = "SCORMHUB_WRAPPER_TEMPLATE"
    )]
    pub wrapper_template: PathBuf,

    /// Base64 AES-256 key for launch tokens (see `scormhub keygen`)
    #[arg(long, env = "SCORMHUB_TOKEN_KEY", hide_env_values = true)]
    pub token_key: String,

    /// Bearer token granting core-admin access
    #[arg(long, env = "SCORMHUB_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: String,

    #[arg(long, env = "SCORMHUB_LMS_URL")]
    pub lms_url: Option<String>,

    #[arg(long, env = "SCORMHUB_LMS_UPLOAD_URL")]
    pub lms_upload_url: Option<String>,

    #[arg(long, env = "SCORMHUB_LMS_TOKEN", hide_env_values = true)]
    pub lms_token: Option<String>,

    /// Upper bound for building one package
    #[arg(long, default_value = "60", env = "SCORMHUB_PACKAGE_TIMEOUT_SECS")]
    pub package_timeout_secs: u64,

    /// Largest accepted SCORM upload, in MiB
    #[arg(long, default_value = "100", env = "SCORMHUB_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,
}

impl ServeArgs {
    pub fn codec(&self) -> Result<TokenCodec, ConfigError> {
        Ok(TokenCodec::from_base64_key(&self.token_key)?)
    }

    pub fn package_timeout(&self) -> Duration {
        Duration::from_secs(self.package_timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_token.trim().is_empty() {
            return Err(ConfigError::Invalid("SCORMHUB_ADMIN_TOKEN must not be empty".into()));
        }
        if self.package_timeout_secs == 0 {
            return Err(ConfigError::Invalid("package timeout must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct PackageArgs {
    #[arg(long, env = "SCORMHUB_WRAPPER_TEMPLATE")]
    pub template: PathBuf,

    #[arg(long, env = "SCORMHUB_TOKEN_KEY", hide_env_values = true)]
    pub token_key: String,

    #[arg(long)]
    pub client_id: u64,

    /// LMS course identifier
    #[arg(long)]
    pub course_id: String,

    #[arg(long)]
    pub title: String,

    #[arg(short, long)]
    pub output: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn serve_defaults() {
        let key = TokenCodec::generate_key();
        let cli = parse(&[
            "scormhub",
            "serve",
            "--token-key",
            &key,
            "--admin-token",
            "admin",
        ]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.port, 8080);
        assert_eq!(args.package_timeout(), Duration::from_secs(60));
        assert_eq!(args.max_upload_bytes(), 100 * 1024 * 1024);
        assert!(args.codec().is_ok());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn bad_key_is_a_config_error() {
        let cli = parse(&[
            "scormhub",
            "serve",
            "--token-key",
            "c2hvcnQ=",
            "--admin-token",
            "admin",
        ]);
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert!(matches!(args.codec(), Err(ConfigError::TokenKey(_))));
    }

    #[test]
    fn package_command() {
        let cli = parse(&[
            "scormhub",
            "package",
            "--template",
            "wrapper.zip",
            "--token-key",
            "k",
            "--client-id",
            "3",
            "--course-id",
            "abc-1",
            "--title",
            "Intro",
            "-o",
            "out.zip",
        ]);
        assert!(matches!(cli.command, Command::Package(ref a) if a.client_id == 3 && a.course_id == "abc-1"));
    }
}
