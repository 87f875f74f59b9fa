use serde::{Deserialize, Serialize};

/// The mailbox identity a tenant application sends as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub app_tag: String,
    pub email: String,
}
