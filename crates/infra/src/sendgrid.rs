//! SendGrid v3 mail dispatcher.

use serde::Serialize;
use tracing::debug;

use kitwatch_alerts::{DispatchError, NotificationDispatcher, OutgoingEmail, Sender};

pub const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

#[derive(Debug, Serialize)]
struct MailSend<'a> {
    personalizations: [Personalization<'a>; 1],
    from: &'a Sender,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

impl<'a> From<&'a OutgoingEmail> for MailSend<'a> {
    fn from(email: &'a OutgoingEmail) -> Self {
        Self {
            personalizations: [Personalization {
                to: [Address { email: &email.to }],
            }],
            from: &email.from,
            subject: &email.subject,
            content: [Content {
                kind: "text/html",
                value: &email.html,
            }],
        }
    }
}

pub struct SendGridDispatcher {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl SendGridDispatcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: SENDGRID_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for SendGridDispatcher {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&MailSend::from(email))
            .send()
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DispatchError::Rejected {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        debug!(to = %email.to, status = status.as_u16(), "mail accepted by provider");
        Ok(())
    }
}
