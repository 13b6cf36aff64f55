//! Language model trait definitions.

use async_trait::async_trait;

use super::{Availability, SessionOptions, SessionPurpose};
use crate::error::ModelError;

/// Core trait for model backends.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the backend ID.
    fn id(&self) -> &str;

    /// Probe whether sessions for `purpose` can currently be created.
    async fn availability(&self, purpose: SessionPurpose) -> Availability;

    /// Create a fresh session. Sessions are never shared between callers.
    async fn create_session(
        &self,
        options: SessionOptions,
    ) -> Result<Box<dyn ModelSession>, ModelError>;
}

/// A stateful handle to the model backend.
#[async_trait]
pub trait ModelSession: Send + Sync {
    /// Purpose this session was created for.
    fn purpose(&self) -> SessionPurpose;

    /// Send a prompt and return the model's reply.
    async fn prompt(&self, input: &str) -> Result<String, ModelError>;

    /// Summarize `input` according to the session's summary options.
    async fn summarize(&self, input: &str) -> Result<String, ModelError>;

    /// Release the native handle. Must be idempotent and must not block.
    fn destroy(&self);
}
