use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use super::ExchangeError;

pub type BackendArc = Arc<dyn ChatBackend + Send + Sync>;

#[async_trait]
pub trait ChatBackend {
    /// Used at startup to verify the chat service can be reached. A failure
    /// here is only a warning, sends are still attempted.
    async fn health_check(&self) -> Result<()>;

    /// Sends one user message and resolves with the assistant's reply.
    async fn send(&self, text: &str) -> Result<String, ExchangeError>;
}
