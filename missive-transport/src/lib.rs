pub mod config;
pub mod error;
pub mod graph;
pub mod message;
pub mod r#trait;

pub use config::GraphConfig;
pub use error::{Result, TransportError};
pub use graph::GraphTransport;
pub use message::{OutboundAttachment, OutboundMessage, SendOutcome};
pub use r#trait::MailTransport;
