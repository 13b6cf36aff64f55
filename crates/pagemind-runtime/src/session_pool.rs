//! Fresh-per-call model sessions with guaranteed release.
//!
//! Every [`acquire`](ModelSessionPool::acquire) creates a new backend session
//! wrapped in a [`SessionGuard`]. The guard destroys the session when it is
//! released or dropped, so no exit path (success, sentinel, cancellation) can
//! leak a native handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tracing::{debug, trace};

use pagemind_protocols::{LanguageModel, ModelError, ModelSession, SessionOptions, SessionPurpose};

#[derive(Default)]
struct PoolCounters {
    live: [AtomicUsize; SessionPurpose::ALL.len()],
    created: [AtomicUsize; SessionPurpose::ALL.len()],
    next_id: AtomicU64,
}

fn slot(purpose: SessionPurpose) -> usize {
    match purpose {
        SessionPurpose::Chat => 0,
        SessionPurpose::Summarize => 1,
        SessionPurpose::Analyze => 2,
        SessionPurpose::FactCheck => 3,
        SessionPurpose::Define => 4,
        SessionPurpose::Rewrite => 5,
    }
}

/// Creates model sessions and tracks how many are alive.
pub struct ModelSessionPool {
    model: Arc<dyn LanguageModel>,
    counters: Arc<PoolCounters>,
}

impl ModelSessionPool {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            counters: Arc::new(PoolCounters::default()),
        }
    }

    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// Create a fresh session configured by `options`.
    pub async fn acquire(&self, options: SessionOptions) -> Result<SessionGuard, ModelError> {
        let purpose = options.purpose;
        let session = self.model.create_session(options).await?;

        let idx = slot(purpose);
        self.counters.live[idx].fetch_add(1, Ordering::SeqCst);
        self.counters.created[idx].fetch_add(1, Ordering::SeqCst);
        let id = self.counters.next_id.fetch_add(1, Ordering::SeqCst);
        debug!("Acquired {} session #{}", purpose, id);

        Ok(SessionGuard {
            id,
            purpose,
            session,
            counters: self.counters.clone(),
        })
    }

    /// Destroy the session held by `guard`.
    pub fn release(&self, guard: SessionGuard) {
        drop(guard);
    }

    /// Sessions for `purpose` that are currently alive.
    pub fn live(&self, purpose: SessionPurpose) -> usize {
        self.counters.live[slot(purpose)].load(Ordering::SeqCst)
    }

    /// Sessions alive across all purposes.
    pub fn live_total(&self) -> usize {
        self.counters
            .live
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    /// Sessions ever created for `purpose`.
    pub fn created(&self, purpose: SessionPurpose) -> usize {
        self.counters.created[slot(purpose)].load(Ordering::SeqCst)
    }
}

/// Exclusive handle to one live session.
pub struct SessionGuard {
    id: u64,
    purpose: SessionPurpose,
    session: Box<dyn ModelSession>,
    counters: Arc<PoolCounters>,
}

impl SessionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn purpose(&self) -> SessionPurpose {
        self.purpose
    }

    pub async fn prompt(&self, input: &str) -> Result<String, ModelError> {
        self.session.prompt(input).await
    }

    pub async fn summarize(&self, input: &str) -> Result<String, ModelError> {
        self.session.summarize(input).await
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.destroy();
        self.counters.live[slot(self.purpose)].fetch_sub(1, Ordering::SeqCst);
        trace!("Released {} session #{}", self.purpose, self.id);
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("id", &self.id)
            .field("purpose", &self.purpose)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    #[tokio::test]
    async fn test_acquire_and_release_tracks_live_sessions() {
        let scripted = ScriptedModel::new();
        let pool = ModelSessionPool::new(scripted.clone().into_arc());

        let a = pool
            .acquire(SessionOptions::new(SessionPurpose::Analyze))
            .await
            .unwrap();
        let b = pool
            .acquire(SessionOptions::new(SessionPurpose::Analyze))
            .await
            .unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(pool.live(SessionPurpose::Analyze), 2);
        assert_eq!(pool.live_total(), 2);

        pool.release(a);
        assert_eq!(pool.live(SessionPurpose::Analyze), 1);

        drop(b);
        assert_eq!(pool.live_total(), 0);
        assert_eq!(pool.created(SessionPurpose::Analyze), 2);
        assert_eq!(scripted.destroyed_sessions(), 2);
    }

    #[tokio::test]
    async fn test_failed_creation_does_not_count() {
        let scripted = ScriptedModel::new();
        scripted.fail_session_creation(true);
        let pool = ModelSessionPool::new(scripted.into_arc());

        let result = pool.acquire(SessionOptions::new(SessionPurpose::Define)).await;
        assert!(matches!(result, Err(ModelError::SessionCreation(_))));
        assert_eq!(pool.live_total(), 0);
        assert_eq!(pool.created(SessionPurpose::Define), 0);
    }

    #[tokio::test]
    async fn test_guard_released_on_cancellation() {
        let scripted = ScriptedModel::gated(Arc::new(tokio::sync::Semaphore::new(0)));
        let pool = Arc::new(ModelSessionPool::new(scripted.clone().into_arc()));

        let task_pool = pool.clone();
        let handle = tokio::spawn(async move {
            let guard = task_pool
                .acquire(SessionOptions::new(SessionPurpose::Rewrite))
                .await?;
            guard.prompt("never finishes").await
        });

        while scripted.call_count() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(pool.live(SessionPurpose::Rewrite), 1);

        handle.abort();
        let _ = handle.await;
        assert_eq!(pool.live(SessionPurpose::Rewrite), 0);
        assert_eq!(scripted.destroyed_sessions(), 1);
    }
}
