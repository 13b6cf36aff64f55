//! Sessions against a chat completions endpoint.
//!
//! Chat sessions keep the running transcript and send it with every prompt.
//! All other purposes are stateless: each call carries only the system
//! instruction and the input.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::trace;

use pagemind_protocols::{ModelError, ModelSession, SessionOptions, SessionPurpose};

use crate::api::ApiMessage;
use crate::client::Client;
use crate::instructions;

pub(crate) struct OpenAiCompatSession {
    client: Arc<Client>,
    options: SessionOptions,
    transcript: Mutex<Vec<ApiMessage>>,
    destroyed: AtomicBool,
}

impl OpenAiCompatSession {
    pub fn new(client: Arc<Client>, options: SessionOptions) -> Self {
        let transcript = instructions::prompt_instruction(&options)
            .map(ApiMessage::system)
            .into_iter()
            .collect();
        Self {
            client,
            options,
            transcript: Mutex::new(transcript),
            destroyed: AtomicBool::new(false),
        }
    }

    fn ensure_live(&self) -> Result<(), ModelError> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(ModelError::SessionDestroyed);
        }
        Ok(())
    }
}

#[async_trait]
impl ModelSession for OpenAiCompatSession {
    fn purpose(&self) -> SessionPurpose {
        self.options.purpose
    }

    async fn prompt(&self, input: &str) -> Result<String, ModelError> {
        self.ensure_live()?;

        let mut transcript = self.transcript.lock().await;
        let mut messages = transcript.clone();
        messages.push(ApiMessage::user(input));

        let reply = self.client.complete(messages).await?;
        if self.options.purpose == SessionPurpose::Chat {
            transcript.push(ApiMessage::user(input));
            transcript.push(ApiMessage::assistant(reply.clone()));
            trace!("Chat transcript now {} messages", transcript.len());
        }
        Ok(reply)
    }

    async fn summarize(&self, input: &str) -> Result<String, ModelError> {
        self.ensure_live()?;

        let messages = vec![
            ApiMessage::system(instructions::summarizer_instruction(&self.options)),
            ApiMessage::user(input),
        ];
        self.client.complete(messages).await
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            if let Ok(mut transcript) = self.transcript.try_lock() {
                transcript.clear();
            }
            trace!("Destroyed {} session", self.options.purpose);
        }
    }
}
