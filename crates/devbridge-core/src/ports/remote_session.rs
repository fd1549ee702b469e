//! Remote-control session port.
//!
//! The automation wire protocol is an external collaborator. This port only
//! describes how a session is requested and how failures are reported, so
//! the orchestrator can apply its retry contract around it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Where and how to open a remote-control session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTarget {
    pub host: String,
    pub port: u16,
    /// Opaque capability object forwarded to the server unchanged.
    pub capabilities: serde_json::Value,
}

impl SessionTarget {
    /// Target a server listening on the loopback interface.
    pub fn local(port: u16, capabilities: serde_json::Value) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port,
            capabilities,
        }
    }
}

/// Failure reported by a remote-control client.
///
/// The client's error taxonomy is external, so only the message is kept;
/// callers classify it by content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteSessionError {
    pub message: String,
}

impl RemoteSessionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Client able to open remote-control sessions against an automation server.
#[async_trait]
pub trait RemoteControlClient: Send + Sync {
    /// Session handle returned on success.
    type Session: Send;

    /// Attempt to open a session once.
    async fn connect(&self, target: &SessionTarget) -> Result<Self::Session, RemoteSessionError>;
}
