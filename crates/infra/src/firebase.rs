//! Firebase Realtime Database snapshot reader.
//!
//! Authenticates with a service account (signed JWT assertion exchanged for an
//! OAuth access token) and reads whole nodes over the REST API.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::OnceCell;
use tracing::debug;

use kitwatch_alerts::{ReadError, SnapshotReader};
use kitwatch_inventory::{ContactsSnapshot, InventorySnapshot};

use crate::config::DataSourceSettings;

const TOKEN_SCOPES: &str = "https://www.googleapis.com/auth/firebase.database \
https://www.googleapis.com/auth/userinfo.email";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct FirebaseSnapshotReader {
    http: reqwest::Client,
    settings: DataSourceSettings,
    /// Access token, fetched on first read and reused for the reader's lifetime.
    token: OnceCell<String>,
}

impl FirebaseSnapshotReader {
    pub fn new(settings: DataSourceSettings) -> Self {
        Self::with_client(reqwest::Client::new(), settings)
    }

    pub fn with_client(http: reqwest::Client, settings: DataSourceSettings) -> Self {
        Self {
            http,
            settings,
            token: OnceCell::new(),
        }
    }

    async fn access_token(&self) -> Result<&str, ReadError> {
        self.token
            .get_or_try_init(|| self.fetch_token())
            .await
            .map(String::as_str)
    }

    async fn fetch_token(&self) -> Result<String, ReadError> {
        let account = &self.settings.service_account;
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &account.client_email,
            scope: TOKEN_SCOPES,
            aud: &account.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| ReadError::Auth(format!("service account key: {e}")))?;
        let assertion = jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| ReadError::Auth(format!("signing assertion: {e}")))?;

        let resp = self
            .http
            .post(&account.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ReadError::Auth(format!("token request: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ReadError::Auth(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ReadError::Auth(format!("token response: {e}")))?;

        debug!(client_email = %account.client_email, "obtained data source access token");
        Ok(token.access_token)
    }

    async fn read_node(&self, path: &str) -> Result<JsonValue, ReadError> {
        let token = self.access_token().await?;
        let url = self.settings.node_url(path);

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ReadError::Transport {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ReadError::Status {
                path: path.to_string(),
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        resp.json().await.map_err(|e| ReadError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SnapshotReader for FirebaseSnapshotReader {
    async fn inventory(&self) -> Result<InventorySnapshot, ReadError> {
        let value = self.read_node(&self.settings.inventory_path).await?;
        Ok(InventorySnapshot::from_json(value))
    }

    async fn contacts(&self) -> Result<ContactsSnapshot, ReadError> {
        let value = self.read_node(&self.settings.contacts_path).await?;
        Ok(ContactsSnapshot::from_json(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FIREBASE_DB_URL, FIREBASE_SERVICE_ACCOUNT};

    fn settings(private_key: &str) -> DataSourceSettings {
        let account = serde_json::json!({
            "client_email": "alerts@lims-demo.iam.gserviceaccount.com",
            "private_key": private_key,
            // Unroutable on purpose: the test must fail before any request.
            "token_uri": "http://127.0.0.1:9/token",
        })
        .to_string();
        DataSourceSettings::from_lookup(move |k| match k {
            FIREBASE_SERVICE_ACCOUNT => Some(account.clone()),
            FIREBASE_DB_URL => Some("https://lims-demo.firebaseio.com".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn malformed_private_key_is_an_auth_error() {
        let reader = FirebaseSnapshotReader::new(settings("not a pem"));
        let err = reader.inventory().await.unwrap_err();
        assert!(matches!(err, ReadError::Auth(msg) if msg.contains("service account key")));
    }
}
