//! Chat over the content of one page.
//!
//! A chat session is primed once with the page text and then answers
//! questions. The system instruction and the first chunk go into session
//! creation; every further chunk is fed with one priming prompt.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use pagemind_protocols::{SessionOptions, SessionPurpose};

use crate::chunker;
use crate::pipeline::PipelineOutcome;
use crate::prompts;
use crate::retry::{ErrorUpdate, RetryingInvoker};
use crate::sentinel;
use crate::session_pool::{ModelSessionPool, SessionGuard};

/// Chunk budget used when priming a chat session.
pub const CHAT_CHUNK_BUDGET: usize = 3800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Uninitialized,
    Initializing,
    Ready,
}

/// Result of [`ChatBotSession::initialize_model`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Session created; `failed_primes` chunks could not be fed.
    Ready { chunks: usize, failed_primes: usize },
    AlreadyInitializing,
    AlreadyReady,
    /// Session creation failed; the chat is back to uninitialized.
    Failed(&'static str),
    /// The chat was destroyed while initializing; nothing was installed.
    Cancelled,
}

pub struct ChatBotSession {
    state: Mutex<ChatState>,
    session: tokio::sync::Mutex<Option<SessionGuard>>,
    /// Bumped by every `destroy`.
    generation: AtomicU64,
    pool: Arc<ModelSessionPool>,
    invoker: Arc<RetryingInvoker>,
    budget: usize,
}

impl ChatBotSession {
    pub fn new(pool: Arc<ModelSessionPool>, invoker: Arc<RetryingInvoker>) -> Self {
        Self::with_budget(pool, invoker, CHAT_CHUNK_BUDGET)
    }

    pub fn with_budget(
        pool: Arc<ModelSessionPool>,
        invoker: Arc<RetryingInvoker>,
        budget: usize,
    ) -> Self {
        Self {
            state: Mutex::new(ChatState::Uninitialized),
            session: tokio::sync::Mutex::new(None),
            generation: AtomicU64::new(0),
            pool,
            invoker,
            budget,
        }
    }

    pub fn state(&self) -> ChatState {
        *self.state.lock()
    }

    /// Create and prime the chat session with `page_content`.
    pub async fn initialize_model(
        &self,
        page_content: &str,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> InitOutcome {
        let generation = {
            let mut state = self.state.lock();
            match *state {
                ChatState::Initializing => {
                    warn!("Chat initialization already in progress");
                    return InitOutcome::AlreadyInitializing;
                }
                ChatState::Ready => {
                    debug!("Chat already initialized");
                    return InitOutcome::AlreadyReady;
                }
                ChatState::Uninitialized => *state = ChatState::Initializing,
            }
            self.generation.load(Ordering::SeqCst)
        };
        let mut reset = ResetOnDrop {
            state: &self.state,
            generation: &self.generation,
            started: generation,
            armed: true,
        };

        let chunks = chunker::chunk(page_content, self.budget);
        let options = SessionOptions::new(SessionPurpose::Chat).with_system_prompt(
            prompts::chat_system_prompt(chunks.first().map(String::as_str)),
        );

        let pool = self.pool.as_ref();
        let guard = match self
            .invoker
            .run(SessionPurpose::Chat, on_error, move || {
                pool.acquire(options.clone())
            })
            .await
        {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Failed to create chat session: {}", e);
                return InitOutcome::Failed(e.sentinel(sentinel::INITIALIZE_FAILED));
            }
        };

        let mut failed_primes = 0;
        for (i, chunk) in chunks.iter().enumerate().skip(1) {
            let message = prompts::chat_priming(chunk);
            let (session, message) = (&guard, message.as_str());
            debug!("Priming chat with chunk {}/{}", i + 1, chunks.len());
            if let Err(e) = self
                .invoker
                .run(SessionPurpose::Chat, on_error, move || session.prompt(message))
                .await
            {
                warn!("Priming chunk {} failed: {}", i + 1, e);
                failed_primes += 1;
            }
        }

        let mut session = self.session.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            reset.armed = false;
            info!("Chat destroyed during initialization, dropping session #{}", guard.id());
            return InitOutcome::Cancelled;
        }
        *session = Some(guard);
        *self.state.lock() = ChatState::Ready;
        reset.armed = false;
        drop(session);
        info!(
            "Chat ready ({} chunks, {} priming failures)",
            chunks.len(),
            failed_primes
        );

        InitOutcome::Ready {
            chunks: chunks.len(),
            failed_primes,
        }
    }

    /// Ask a question about the page. Queries are answered one at a time.
    pub async fn query(&self, input: &str, on_error: Option<ErrorUpdate<'_>>) -> PipelineOutcome {
        let session = self.session.lock().await;
        let Some(guard) = session.as_ref() else {
            return PipelineOutcome::Failed(sentinel::CHAT_NOT_INITIALIZED);
        };

        match self
            .invoker
            .run(SessionPurpose::Chat, on_error, move || guard.prompt(input))
            .await
        {
            Ok(answer) => PipelineOutcome::Completed(answer),
            Err(e) => {
                warn!("Chat query failed: {}", e);
                PipelineOutcome::Failed(e.sentinel(sentinel::CHAT_FAILED))
            }
        }
    }

    /// Release the chat session and clear the state. Idempotent.
    ///
    /// An initialization still in flight is abandoned.
    pub async fn destroy(&self) {
        let mut session = self.session.lock().await;
        {
            let mut state = self.state.lock();
            self.generation.fetch_add(1, Ordering::SeqCst);
            *state = ChatState::Uninitialized;
        }
        let released = session.take();
        drop(session);
        if let Some(guard) = released {
            debug!("Destroying chat session #{}", guard.id());
        }
    }
}

/// Puts an interrupted initialization back to `Uninitialized`, unless a
/// `destroy` already did and a newer initialization may own the state.
struct ResetOnDrop<'a> {
    state: &'a Mutex<ChatState>,
    generation: &'a AtomicU64,
    started: u64,
    armed: bool,
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) == self.started {
            *state = ChatState::Uninitialized;
        }
    }
}

#[cfg(test)]
#[path = "chat_tests.rs"]
mod tests;
