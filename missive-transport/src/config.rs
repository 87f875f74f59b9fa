use reqwest::Url;
use serde::Deserialize;

use crate::{Result, TransportError};

/// Environment variable consulted when the config file carries no secret.
pub const CLIENT_SECRET_ENV: &str = "MISSIVE_GRAPH_CLIENT_SECRET";

mod defaults {
    pub fn authority_url() -> String {
        "https://login.microsoftonline.com".to_string()
    }

    pub fn graph_url() -> String {
        "https://graph.microsoft.com".to_string()
    }

    pub const fn timeout_secs() -> u64 {
        20
    }

    pub const fn token_refresh_margin_secs() -> u64 {
        60
    }

    pub const fn save_to_sent_items() -> bool {
        true
    }
}

/// Microsoft Graph application credentials and endpoints
///
/// ```ron
/// transport: (
///     tenant_id: "00000000-0000-0000-0000-000000000000",
///     client_id: "11111111-1111-1111-1111-111111111111",
/// ),
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,

    /// Client secret; when empty or omitted it is read from `MISSIVE_GRAPH_CLIENT_SECRET`
    #[serde(default)]
    pub client_secret: String,

    #[serde(default = "defaults::authority_url")]
    pub authority_url: String,

    #[serde(default = "defaults::graph_url")]
    pub graph_url: String,

    /// Per-request HTTP timeout (in seconds)
    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,

    /// Tokens are refreshed this long before the provider says they expire (in seconds)
    #[serde(default = "defaults::token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,

    #[serde(default = "defaults::save_to_sent_items")]
    pub save_to_sent_items: bool,
}

impl GraphConfig {
    /// Config with default endpoints for the given credentials
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            authority_url: defaults::authority_url(),
            graph_url: defaults::graph_url(),
            timeout_secs: defaults::timeout_secs(),
            token_refresh_margin_secs: defaults::token_refresh_margin_secs(),
            save_to_sent_items: defaults::save_to_sent_items(),
        }
    }

    /// The configured secret, or the one from the environment
    ///
    /// # Errors
    /// Returns [`TransportError::Configuration`] if neither is set
    pub fn client_secret(&self) -> Result<String> {
        if !self.client_secret.is_empty() {
            return Ok(self.client_secret.clone());
        }

        std::env::var(CLIENT_SECRET_ENV).map_err(|_| {
            TransportError::Configuration(format!(
                "no client_secret configured and {CLIENT_SECRET_ENV} is not set"
            ))
        })
    }

    pub(crate) fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_url.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// `graph_url` as a parsed base URL
    ///
    /// # Errors
    /// Returns [`TransportError::Configuration`] if it is not an absolute URL
    pub(crate) fn graph_base(&self) -> Result<Url> {
        let url = Url::parse(&self.graph_url).map_err(|e| {
            TransportError::Configuration(format!("invalid graph_url {}: {e}", self.graph_url))
        })?;

        if url.cannot_be_a_base() {
            return Err(TransportError::Configuration(format!(
                "graph_url {} cannot be used as a base URL",
                self.graph_url
            )));
        }

        Ok(url)
    }

    /// The `sendMail` endpoint of `mailbox`, which is encoded as one path segment
    pub(crate) fn send_mail_url(&self, mailbox: &str) -> Result<Url> {
        let mut url = self.graph_base()?;
        url.path_segments_mut()
            .map_err(|()| {
                TransportError::Configuration(format!("graph_url {} has no path", self.graph_url))
            })?
            .pop_if_empty()
            .extend(["v1.0", "users", mailbox, "sendMail"]);

        Ok(url)
    }
}
