//! Per-tab contexts and the registry that owns them.
//!
//! A [`TabContext`] lives as long as its tab shows the same URL. Navigating
//! replaces it with a fresh one; closing the tab removes it. Tasks still
//! holding the old `Arc` finish against orphaned state, and their results are
//! dropped by [`ExtensionState::is_current`] checks.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::{debug, info};

use pagemind_protocols::TabId;

use crate::chat::ChatBotSession;
use crate::operation::OperationStateMachine;
use crate::retry::RetryingInvoker;
use crate::session_pool::ModelSessionPool;

/// State bound to one tab and one page URL.
pub struct TabContext {
    tab_id: TabId,
    page_url: String,
    chat: ChatBotSession,
    operations: OperationStateMachine,
    summary: RwLock<Option<String>>,
}

impl TabContext {
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn chat(&self) -> &ChatBotSession {
        &self.chat
    }

    pub fn operations(&self) -> &OperationStateMachine {
        &self.operations
    }

    /// Latest page summary, if summarization has succeeded.
    pub fn summary(&self) -> Option<String> {
        self.summary.read().clone()
    }

    pub fn set_summary(&self, summary: String) {
        *self.summary.write() = Some(summary);
    }
}

/// Registry of live tab contexts.
pub struct ExtensionState {
    tabs: DashMap<TabId, Arc<TabContext>>,
    pool: Arc<ModelSessionPool>,
    invoker: Arc<RetryingInvoker>,
    chat_budget: usize,
}

impl ExtensionState {
    pub fn new(
        pool: Arc<ModelSessionPool>,
        invoker: Arc<RetryingInvoker>,
        chat_budget: usize,
    ) -> Self {
        Self {
            tabs: DashMap::new(),
            pool,
            invoker,
            chat_budget,
        }
    }

    /// Context for `tab_id` showing `url`, creating or replacing as needed.
    pub fn context_for(&self, tab_id: TabId, url: &str) -> Arc<TabContext> {
        match self.tabs.entry(tab_id) {
            Entry::Occupied(mut entry) => {
                if entry.get().page_url() == url {
                    return entry.get().clone();
                }
                info!("{} navigated to {}, replacing context", tab_id, url);
                let fresh = self.new_context(tab_id, url);
                entry.insert(fresh.clone());
                fresh
            }
            Entry::Vacant(entry) => {
                debug!("Creating context for {} at {}", tab_id, url);
                let fresh = self.new_context(tab_id, url);
                entry.insert(fresh.clone());
                fresh
            }
        }
    }

    pub fn get(&self, tab_id: TabId) -> Option<Arc<TabContext>> {
        self.tabs.get(&tab_id).map(|entry| entry.value().clone())
    }

    /// Whether `context` is still the registered context of its tab.
    pub fn is_current(&self, context: &Arc<TabContext>) -> bool {
        self.tabs
            .get(&context.tab_id())
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), context))
    }

    /// Forget the context of a closed tab.
    pub fn remove(&self, tab_id: TabId) -> Option<Arc<TabContext>> {
        let removed = self.tabs.remove(&tab_id).map(|(_, context)| context);
        if removed.is_some() {
            info!("Removed context for {}", tab_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    fn new_context(&self, tab_id: TabId, url: &str) -> Arc<TabContext> {
        Arc::new(TabContext {
            tab_id,
            page_url: url.to_string(),
            chat: ChatBotSession::with_budget(
                self.pool.clone(),
                self.invoker.clone(),
                self.chat_budget,
            ),
            operations: OperationStateMachine::new(),
            summary: RwLock::new(None),
        })
    }
}
