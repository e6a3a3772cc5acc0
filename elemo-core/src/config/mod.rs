//! Configuration management for Elemo Core

use crate::domain::VersionInfo;
use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Outgoing email configuration
    pub smtp: SmtpConfig,
    /// Logging configuration
    pub telemetry: TelemetryConfig,
    /// Build identifiers disclosed by the system service
    pub version: VersionInfo,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmtpConfig {
    /// Public hostname links in emails point at (e.g. `elemo.example.com`)
    pub hostname: String,
    /// Address users can reply to for help
    pub support_address: String,
    /// Sender address of outgoing mail
    pub from_address: String,
    /// SMTP relay host
    pub host: String,
    /// SMTP relay port (typically 587 for STARTTLS, 25 for unencrypted)
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Use STARTTLS when talking to the relay
    pub use_tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            support_address: "support@localhost".to_string(),
            from_address: "no-reply@localhost".to_string(),
            host: "localhost".to_string(),
            port: 25,
            username: None,
            password: None,
            use_tls: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// "json" or "text"
    pub log_format: String,
    /// Filter used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            default_filter: "elemo_core=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, reading a `.env`
    /// file first when one exists.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let smtp_defaults = SmtpConfig::default();
        let telemetry_defaults = TelemetryConfig::default();

        Ok(Self {
            smtp: SmtpConfig {
                hostname: env::var("SMTP_HOSTNAME").context("SMTP_HOSTNAME is required")?,
                support_address: env::var("SMTP_SUPPORT_ADDRESS")
                    .context("SMTP_SUPPORT_ADDRESS is required")?,
                from_address: env::var("SMTP_FROM_ADDRESS")
                    .context("SMTP_FROM_ADDRESS is required")?,
                host: env::var("SMTP_HOST").unwrap_or(smtp_defaults.host),
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| smtp_defaults.port.to_string())
                    .parse()
                    .context("Invalid SMTP_PORT")?,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
                use_tls: env::var("SMTP_USE_TLS")
                    .map(|v| v.to_lowercase() == "true" || v == "1")
                    .unwrap_or(smtp_defaults.use_tls),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or(telemetry_defaults.log_format),
                default_filter: env::var("LOG_FILTER")
                    .unwrap_or(telemetry_defaults.default_filter),
            },
            version: VersionInfo {
                version: env::var("ELEMO_VERSION")
                    .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
                commit: env::var("ELEMO_COMMIT").unwrap_or_else(|_| "unknown".to_string()),
                date: env::var("ELEMO_BUILD_DATE").unwrap_or_else(|_| "unknown".to_string()),
                rust_version: env::var("ELEMO_RUST_VERSION")
                    .unwrap_or_else(|_| "unknown".to_string()),
            },
        })
    }
}
