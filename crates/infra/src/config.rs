//! Configuration loading and representation.
//!
//! Settings come from the process environment. Every loader also accepts an
//! explicit lookup function so tests never touch the real environment.
//!
//! Loading happens before any read or send; a missing required value aborts
//! the run with [`ConfigError::Missing`].

use core::fmt;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use kitwatch_alerts::Sender;

pub const FIREBASE_SERVICE_ACCOUNT: &str = "FIREBASE_SERVICE_ACCOUNT";
pub const FIREBASE_DB_URL: &str = "FIREBASE_DB_URL";
pub const SENDGRID_API_KEY: &str = "SENDGRID_API_KEY";
pub const SENDER_EMAIL: &str = "SENDER_EMAIL";
pub const INVENTORY_PATH: &str = "KITWATCH_INVENTORY_PATH";
pub const CONTACTS_PATH: &str = "KITWATCH_CONTACTS_PATH";

pub const DEFAULT_INVENTORY_PATH: &str = "inventory_live_v1";
pub const DEFAULT_CONTACTS_PATH: &str = "study_contacts";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid setting {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Google service-account credentials (the JSON key file contents).
#[derive(Clone, Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Where and how to read the inventory and contacts snapshots.
#[derive(Debug, Clone)]
pub struct DataSourceSettings {
    pub service_account: ServiceAccount,
    pub database_url: Url,
    pub inventory_path: String,
    pub contacts_path: String,
}

impl DataSourceSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_account = required(&lookup, FIREBASE_SERVICE_ACCOUNT)?;
        let service_account: ServiceAccount =
            serde_json::from_str(&raw_account).map_err(|e| ConfigError::Invalid {
                name: FIREBASE_SERVICE_ACCOUNT,
                message: e.to_string(),
            })?;

        let raw_url = required(&lookup, FIREBASE_DB_URL)?;
        let database_url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            name: FIREBASE_DB_URL,
            message: e.to_string(),
        })?;
        if !matches!(database_url.scheme(), "https" | "http") {
            return Err(ConfigError::Invalid {
                name: FIREBASE_DB_URL,
                message: format!("unsupported scheme '{}'", database_url.scheme()),
            });
        }

        Ok(Self {
            service_account,
            database_url,
            inventory_path: optional(&lookup, INVENTORY_PATH, DEFAULT_INVENTORY_PATH),
            contacts_path: optional(&lookup, CONTACTS_PATH, DEFAULT_CONTACTS_PATH),
        })
    }

    /// REST URL of a node: `{database_url}/{path}.json`.
    pub fn node_url(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.database_url.as_str().trim_end_matches('/'),
            path.trim_matches('/')
        )
    }
}

/// Mail provider credentials and sender identity.
#[derive(Clone)]
pub struct MailSettings {
    pub api_key: String,
    pub sender: Sender,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("api_key", &"<redacted>")
            .field("sender", &self.sender)
            .finish()
    }
}

impl MailSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = required(&lookup, SENDGRID_API_KEY)?;
        let raw_sender = required(&lookup, SENDER_EMAIL)?;
        let sender = Sender::parse(&raw_sender).map_err(|e| ConfigError::Invalid {
            name: SENDER_EMAIL,
            message: e.to_string(),
        })?;
        Ok(Self { api_key, sender })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
