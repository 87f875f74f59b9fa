//! The queued email job and its attachments.
//!
//! The JSON field names are the wire format shared with intake producers and
//! must not change.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a job payload can never be delivered, no matter how often it is
/// redelivered.
#[derive(Debug, Error)]
pub enum JobError {
    /// The payload is not a valid JSON job.
    #[error("Malformed job payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The job does not name a single primary recipient.
    #[error("Job has no recipients")]
    NoRecipients,
}

/// An attachment as carried in the queue, with base64 encoded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "@odata.type", default, skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<String>,
    pub name: String,
    #[serde(rename = "contentBytes")]
    pub content_bytes: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// Which representation of the body is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "Text")]
    Text,
}

impl BodyKind {
    /// Content type label understood by the provider.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Html => "HTML",
            Self::Text => "Text",
        }
    }
}

/// One request to send an email on behalf of a tenant application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailJob {
    pub recipients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc_recipients: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc_recipients: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body_content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub html_body_content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    pub app_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_context: Option<HashMap<String, String>>,
}

impl EmailJob {
    /// Parse and validate a payload pulled from the queue.
    pub fn from_slice(payload: &[u8]) -> Result<Self, JobError> {
        let job: Self = serde_json::from_slice(payload)?;
        job.validate()?;
        Ok(job)
    }

    /// Serialise the job for publishing.
    pub fn to_vec(&self) -> Result<Vec<u8>, JobError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// A job needs at least one primary recipient.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.recipients.is_empty() {
            return Err(JobError::NoRecipients);
        }
        Ok(())
    }

    /// The body to send: HTML wins whenever it is present.
    pub fn body(&self) -> (&str, BodyKind) {
        if self.html_body_content.is_empty() {
            (self.body_content.as_str(), BodyKind::Text)
        } else {
            (self.html_body_content.as_str(), BodyKind::Html)
        }
    }

    /// To, cc and bcc recipients in that order, for logging.
    pub fn all_recipients(&self) -> Vec<&str> {
        self.recipients
            .iter()
            .chain(&self.cc_recipients)
            .chain(&self.bcc_recipients)
            .map(String::as_str)
            .collect()
    }
}
