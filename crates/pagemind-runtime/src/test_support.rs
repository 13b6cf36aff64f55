//! Scripted in-memory model shared by the runtime tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use pagemind_protocols::{
    Availability, LanguageModel, ModelError, ModelSession, SessionOptions, SessionPurpose,
    SummaryLength,
};

/// The text every scripted summary returns: `chars` chars of repeated words.
pub fn summary_text(chars: usize) -> String {
    "word ".chars().cycle().take(chars).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Prompt,
    Summarize,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub purpose: SessionPurpose,
    pub kind: CallKind,
    pub length: Option<SummaryLength>,
    pub input: String,
}

struct Script {
    availability: Mutex<Availability>,
    failures_left: AtomicU32,
    fail_session_creation: AtomicBool,
    created: Mutex<Vec<SessionOptions>>,
    destroyed: AtomicUsize,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Semaphore>>,
    summary_chars: usize,
}

/// Model whose behavior is set up front and whose calls are recorded.
#[derive(Clone)]
pub struct ScriptedModel {
    script: Arc<Script>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::build(None, 40)
    }

    /// Every prompt and summarize waits for a permit on `gate`.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self::build(Some(gate), 40)
    }

    /// Summaries are `chars` long regardless of input.
    pub fn with_summary_chars(chars: usize) -> Self {
        Self::build(None, chars)
    }

    fn build(gate: Option<Arc<Semaphore>>, summary_chars: usize) -> Self {
        Self {
            script: Arc::new(Script {
                availability: Mutex::new(Availability::Yes),
                failures_left: AtomicU32::new(0),
                fail_session_creation: AtomicBool::new(false),
                created: Mutex::new(Vec::new()),
                destroyed: AtomicUsize::new(0),
                calls: Mutex::new(Vec::new()),
                gate,
                summary_chars,
            }),
        }
    }

    pub fn into_arc(self) -> Arc<dyn LanguageModel> {
        Arc::new(self)
    }

    pub fn set_availability(&self, availability: Availability) {
        *self.script.availability.lock() = availability;
    }

    /// The next `n` prompt/summarize calls fail with a network error.
    pub fn fail_next(&self, n: u32) {
        self.script.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn fail_session_creation(&self, fail: bool) {
        self.script.fail_session_creation.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.script.calls.lock().len()
    }

    pub fn calls_for(&self, purpose: SessionPurpose) -> usize {
        self.script
            .calls
            .lock()
            .iter()
            .filter(|c| c.purpose == purpose)
            .count()
    }

    pub fn created_sessions(&self) -> Vec<SessionOptions> {
        self.script.created.lock().clone()
    }

    pub fn destroyed_sessions(&self) -> usize {
        self.script.destroyed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn availability(&self, _purpose: SessionPurpose) -> Availability {
        *self.script.availability.lock()
    }

    async fn create_session(
        &self,
        options: SessionOptions,
    ) -> Result<Box<dyn ModelSession>, ModelError> {
        if self.script.fail_session_creation.load(Ordering::SeqCst) {
            return Err(ModelError::SessionCreation("scripted failure".to_string()));
        }
        self.script.created.lock().push(options.clone());
        Ok(Box::new(ScriptedSession {
            script: self.script.clone(),
            options,
            destroyed: AtomicBool::new(false),
        }))
    }
}

struct ScriptedSession {
    script: Arc<Script>,
    options: SessionOptions,
    destroyed: AtomicBool,
}

impl ScriptedSession {
    async fn record(&self, kind: CallKind, input: &str) -> Result<(), ModelError> {
        self.script.calls.lock().push(Call {
            purpose: self.options.purpose,
            kind,
            length: self.options.length,
            input: input.to_string(),
        });

        if let Some(gate) = &self.script.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| ModelError::Invocation("gate closed".to_string()))?;
            permit.forget();
        }

        let failed = self
            .script
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ModelError::Network("scripted failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ModelSession for ScriptedSession {
    fn purpose(&self) -> SessionPurpose {
        self.options.purpose
    }

    async fn prompt(&self, input: &str) -> Result<String, ModelError> {
        self.record(CallKind::Prompt, input).await?;
        Ok(format!("{} reply #{}", self.options.purpose, self.script.calls.lock().len()))
    }

    async fn summarize(&self, input: &str) -> Result<String, ModelError> {
        self.record(CallKind::Summarize, input).await?;
        Ok(summary_text(self.script.summary_chars))
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::SeqCst) {
            self.script.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
