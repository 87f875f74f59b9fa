//! Microsoft Graph `sendMail` transport.
//!
//! Authenticates with the OAuth2 client-credentials flow and caches the
//! access token until shortly before it expires.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD};
use missive_common::{internal, outgoing};
use missive_tracing::traced;
use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tokio::{sync::Mutex, time::Instant};

use crate::{
    GraphConfig, OutboundMessage, Result, SendOutcome, TransportError, r#trait::MailTransport,
};

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const FILE_ATTACHMENT: &str = "#microsoft.graph.fileAttachment";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    message: GraphMessage<'a>,
    save_to_sent_items: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphMessage<'a> {
    subject: &'a str,
    body: ItemBody<'a>,
    to_recipients: Vec<Recipient<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc_recipients: Vec<Recipient<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc_recipients: Vec<Recipient<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<FileAttachment<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient<'a> {
    email_address: EmailAddress<'a>,
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    address: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileAttachment<'a> {
    #[serde(rename = "@odata.type")]
    odata_type: &'static str,
    name: &'a str,
    content_type: &'a str,
    content_bytes: String,
}

fn recipients(addresses: &[String]) -> Vec<Recipient<'_>> {
    addresses
        .iter()
        .map(|address| Recipient {
            email_address: EmailAddress { address },
        })
        .collect()
}

impl<'a> SendMailRequest<'a> {
    fn new(message: &'a OutboundMessage, save_to_sent_items: bool) -> Self {
        Self {
            message: GraphMessage {
                subject: &message.subject,
                body: ItemBody {
                    content_type: message.body_kind.as_str(),
                    content: &message.body,
                },
                to_recipients: recipients(&message.to),
                cc_recipients: recipients(&message.cc),
                bcc_recipients: recipients(&message.bcc),
                attachments: message
                    .attachments
                    .iter()
                    .map(|attachment| FileAttachment {
                        odata_type: FILE_ATTACHMENT,
                        name: &attachment.name,
                        content_type: &attachment.content_type,
                        content_bytes: STANDARD.encode(&attachment.content),
                    })
                    .collect(),
            },
            save_to_sent_items,
        }
    }
}

/// Seconds from a `Retry-After` header, when it is a positive integer.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i64>().ok())
        .and_then(|secs| u64::try_from(secs).ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

/// Sends mail through Microsoft Graph on behalf of any mailbox the
/// application is permitted to use.
#[derive(Debug)]
pub struct GraphTransport {
    config: GraphConfig,
    client_secret: String,
    client: Client,
    token: Mutex<Option<CachedToken>>,
}

impl GraphTransport {
    /// Build the HTTP client and validate the credentials are present
    ///
    /// # Errors
    /// Returns an error if no client secret is available or the HTTP client
    /// cannot be constructed
    pub fn new(config: GraphConfig) -> Result<Self> {
        let client_secret = config.client_secret()?;
        config.graph_base()?;
        if config.tenant_id.is_empty() || config.client_id.is_empty() {
            return Err(TransportError::Configuration(
                "tenant_id and client_id must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        internal!(
            "Graph transport ready (tenant={}, timeout={}s)",
            config.tenant_id,
            config.timeout_secs
        );

        Ok(Self {
            config,
            client_secret,
            client,
            token: Mutex::new(None),
        })
    }

    /// A valid access token, from the cache when possible
    ///
    /// # Errors
    /// Returns an error if the token endpoint cannot be reached or refuses
    /// the credentials
    #[traced(instrument(level = tracing::Level::TRACE, skip_all), timing(precision = "ms"))]
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        outgoing!(level = DEBUG, "Requesting a new Graph access token");

        let response = self
            .client
            .post(self.config.token_url())
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("scope", GRAPH_SCOPE),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = token
            .expires_in
            .saturating_sub(self.config.token_refresh_margin_secs);

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + Duration::from_secs(lifetime),
        });

        Ok(token.access_token)
    }

    async fn post_message(&self, message: &OutboundMessage) -> Result<reqwest::Response> {
        let token = self.access_token().await?;
        let request = SendMailRequest::new(message, self.config.save_to_sent_items);

        Ok(self
            .client
            .post(self.config.send_mail_url(&message.from)?)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?)
    }
}

#[async_trait]
impl MailTransport for GraphTransport {
    async fn send(&self, message: &OutboundMessage) -> SendOutcome {
        let response = match self.post_message(message).await {
            Ok(response) => response,
            Err(err) => return SendOutcome::TransientError(err.to_string()),
        };

        let status = response.status();
        outgoing!(level = DEBUG, "Graph answered {status} for mailbox {}", message.from);

        match status {
            StatusCode::ACCEPTED => SendOutcome::Accepted,
            StatusCode::TOO_MANY_REQUESTS => SendOutcome::Throttled {
                retry_after: retry_after(&response),
            },
            _ => SendOutcome::PermanentFailure {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use missive_common::BodyKind;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::OutboundAttachment;

    fn message() -> OutboundMessage {
        OutboundMessage {
            from: "billing@example.com".to_string(),
            to: vec!["to@example.com".to_string()],
            cc: vec![],
            bcc: vec!["audit@example.com".to_string()],
            subject: "Invoice".to_string(),
            body: "<p>Due</p>".to_string(),
            body_kind: BodyKind::Html,
            attachments: vec![OutboundAttachment {
                name: "hello.txt".to_string(),
                content_type: "text/plain".to_string(),
                content: b"hello".to_vec(),
            }],
        }
    }

    #[test]
    fn test_request_payload_shape() {
        let message = message();
        let json = serde_json::to_value(SendMailRequest::new(&message, true)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "message": {
                    "subject": "Invoice",
                    "body": {"contentType": "HTML", "content": "<p>Due</p>"},
                    "toRecipients": [{"emailAddress": {"address": "to@example.com"}}],
                    "bccRecipients": [{"emailAddress": {"address": "audit@example.com"}}],
                    "attachments": [{
                        "@odata.type": "#microsoft.graph.fileAttachment",
                        "name": "hello.txt",
                        "contentType": "text/plain",
                        "contentBytes": "aGVsbG8="
                    }]
                },
                "saveToSentItems": true
            })
        );
    }

    #[test]
    fn test_missing_secret_rejected() {
        let mut config = GraphConfig::new("tenant", "client", "");
        config.client_secret = String::new();

        // Only meaningful when the environment does not provide a secret
        if std::env::var(crate::config::CLIENT_SECRET_ENV).is_err() {
            assert!(matches!(
                GraphTransport::new(config),
                Err(TransportError::Configuration(_))
            ));
        }
    }
}
