//! Model pipelines: summarization and the single-shot tasks.
//!
//! Pipelines never fail outward. Every terminal error becomes a sentinel
//! string, and every session they acquire is released before they return.

mod summarize;
mod tasks;

use std::sync::Arc;

use pagemind_config::ChunkingConfig;
use pagemind_protocols::SessionOptions;

use crate::retry::{ErrorUpdate, RetryingInvoker};
use crate::session_pool::{ModelSessionPool, SessionGuard};

/// Text produced by a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Model output.
    Completed(String),
    /// A fixed sentinel explaining the failure.
    Failed(&'static str),
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed(_))
    }

    pub fn text(&self) -> &str {
        match self {
            PipelineOutcome::Completed(text) => text,
            PipelineOutcome::Failed(sentinel) => sentinel,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            PipelineOutcome::Completed(text) => text,
            PipelineOutcome::Failed(sentinel) => sentinel.to_string(),
        }
    }
}

/// Limits applied by the pipelines.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Maximum chars sent to the model in one call.
    pub budget_chars: usize,
    /// Upper bound on re-summarization passes.
    pub max_resummarize_passes: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&ChunkingConfig::default())
    }
}

impl From<&ChunkingConfig> for PipelineSettings {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            budget_chars: config.budget_chars.max(1),
            max_resummarize_passes: config.max_resummarize_passes,
        }
    }
}

/// Runs the page pipelines against a shared pool and invoker.
pub struct Pipelines {
    pool: Arc<ModelSessionPool>,
    invoker: Arc<RetryingInvoker>,
    settings: PipelineSettings,
}

impl Pipelines {
    pub fn new(
        pool: Arc<ModelSessionPool>,
        invoker: Arc<RetryingInvoker>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            pool,
            invoker,
            settings,
        }
    }

    pub fn pool(&self) -> &Arc<ModelSessionPool> {
        &self.pool
    }

    /// Acquire a session through the invoker, mapping failure to a sentinel.
    async fn acquire(
        &self,
        options: SessionOptions,
        failure: &'static str,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> Result<SessionGuard, &'static str> {
        let purpose = options.purpose;
        let pool = self.pool.as_ref();
        self.invoker
            .run(purpose, on_error, move || pool.acquire(options.clone()))
            .await
            .map_err(|e| {
                tracing::warn!("Could not create {} session: {}", purpose, e);
                e.sentinel(failure)
            })
    }
}
