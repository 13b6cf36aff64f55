//! Model backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use pagemind_config::ModelConfig;
use pagemind_protocols::{
    Availability, LanguageModel, ModelError, ModelSession, SessionOptions, SessionPurpose,
};

use crate::client::Client;
use crate::session::OpenAiCompatSession;

/// Language model served over an OpenAI-compatible HTTP API.
pub struct OpenAiCompatModel {
    client: Arc<Client>,
}

impl OpenAiCompatModel {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = Client::new(config)?;
        info!("Using model {} at {}", client.model(), client.base_url());
        Ok(Self {
            client: Arc::new(client),
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatModel {
    fn id(&self) -> &str {
        "openai-compat"
    }

    async fn availability(&self, purpose: SessionPurpose) -> Availability {
        match self.client.list_models().await {
            Ok(models) if models.iter().any(|m| m == self.client.model()) => Availability::Yes,
            Ok(_) => {
                debug!(
                    "{} not listed by server, {} may need a download",
                    self.client.model(),
                    purpose
                );
                Availability::Maybe
            }
            Err(e) => {
                warn!("Model server unreachable: {}", e);
                Availability::No
            }
        }
    }

    async fn create_session(
        &self,
        options: SessionOptions,
    ) -> Result<Box<dyn ModelSession>, ModelError> {
        debug!("Creating {} session", options.purpose);
        Ok(Box::new(OpenAiCompatSession::new(self.client.clone(), options)))
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
