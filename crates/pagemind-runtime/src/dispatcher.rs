//! Routes requests to tab contexts and pipelines.
//!
//! `handle` returns `None` when a request is dropped: a duplicate of a
//! running operation, or a result for a tab whose context was replaced or
//! closed while the operation ran.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use pagemind_protocols::{ChatRole, OperationKind, Request, Response, TabId};

use crate::chat::InitOutcome;
use crate::chat_history::ChatHistory;
use crate::pipeline::{PipelineOutcome, Pipelines};
use crate::tab::{ExtensionState, TabContext};

pub const CHAT_READY: &str = "Chat is ready.";

pub struct Dispatcher {
    state: Arc<ExtensionState>,
    pipelines: Arc<Pipelines>,
    history: Option<Arc<ChatHistory>>,
    progress: Option<UnboundedSender<Response>>,
}

impl Dispatcher {
    pub fn new(state: Arc<ExtensionState>, pipelines: Arc<Pipelines>) -> Self {
        Self {
            state,
            pipelines,
            history: None,
            progress: None,
        }
    }

    /// Persist chat turns to `history`.
    pub fn with_history(mut self, history: Arc<ChatHistory>) -> Self {
        self.history = Some(history);
        self
    }

    /// Send error updates from retrying calls to `outbox` as they happen.
    pub fn with_progress(mut self, outbox: UnboundedSender<Response>) -> Self {
        self.progress = Some(outbox);
        self
    }

    pub fn state(&self) -> &Arc<ExtensionState> {
        &self.state
    }

    pub async fn handle(&self, request: Request) -> Option<Response> {
        debug!("Handling {:?} for {}", request.kind(), request.tab_id());

        match request {
            Request::PageLoaded {
                tab_id,
                url,
                content,
            }
            | Request::InitializeChat {
                tab_id,
                url,
                content,
            } => self.initialize_chat(tab_id, &url, &content).await,

            Request::Summarize {
                tab_id,
                url,
                content,
                focus,
            } => {
                let tab = self.state.context_for(tab_id, &url);
                let _op = tab.operations().begin(OperationKind::Summarizing)?;
                let progress = self.progress_for(&tab, Some(OperationKind::Summarizing));

                let outcome = self
                    .pipelines
                    .summarize(&content, &focus, Some(&progress))
                    .await;
                if let PipelineOutcome::Completed(summary) = &outcome {
                    tab.set_summary(summary.clone());
                    tab.operations().mark_summarized();
                }
                self.finish(&tab, OperationKind::Summarizing, outcome)
            }

            Request::Analyze {
                tab_id,
                url,
                selection,
            } => {
                let tab = self.state.context_for(tab_id, &url);
                let _op = tab.operations().begin(OperationKind::Analyzing)?;
                let progress = self.progress_for(&tab, Some(OperationKind::Analyzing));
                let summary = tab.summary();

                let outcome = self
                    .pipelines
                    .analyze(&selection, summary.as_deref(), Some(&progress))
                    .await;
                self.finish(&tab, OperationKind::Analyzing, outcome)
            }

            Request::FactCheck {
                tab_id,
                url,
                selection,
            } => {
                let tab = self.state.context_for(tab_id, &url);
                let _op = tab.operations().begin(OperationKind::FactChecking)?;
                let progress = self.progress_for(&tab, Some(OperationKind::FactChecking));
                let summary = tab.summary();

                let outcome = self
                    .pipelines
                    .fact_check(&selection, summary.as_deref(), Some(&progress))
                    .await;
                self.finish(&tab, OperationKind::FactChecking, outcome)
            }

            Request::Define { tab_id, url, term } => {
                let tab = self.state.context_for(tab_id, &url);
                let _op = tab.operations().begin(OperationKind::Defining)?;
                let progress = self.progress_for(&tab, Some(OperationKind::Defining));
                let summary = tab.summary();

                let outcome = self
                    .pipelines
                    .define(&term, summary.as_deref(), Some(&progress))
                    .await;
                self.finish(&tab, OperationKind::Defining, outcome)
            }

            Request::Rewrite {
                tab_id,
                url,
                text,
                level,
            } => {
                let tab = self.state.context_for(tab_id, &url);
                let _op = tab.operations().begin(OperationKind::Rewriting)?;
                let progress = self.progress_for(&tab, Some(OperationKind::Rewriting));

                let outcome = self.pipelines.rewrite(&text, level, Some(&progress)).await;
                self.finish(&tab, OperationKind::Rewriting, outcome)
            }

            Request::Chat { tab_id, url, query } => {
                let tab = self.state.context_for(tab_id, &url);
                let progress = self.progress_for(&tab, None);

                let outcome = tab.chat().query(&query, Some(&progress)).await;
                if let PipelineOutcome::Completed(answer) = &outcome {
                    self.record_turns(&url, &query, answer).await;
                }
                self.deliver(
                    &tab,
                    Response::ChatReply {
                        tab_id,
                        text: outcome.into_text(),
                    },
                )
            }

            Request::ChatHistory { tab_id, url } => {
                self.state.context_for(tab_id, &url);
                let turns = match &self.history {
                    Some(history) => history.load(&url).await.unwrap_or_else(|e| {
                        warn!("Failed to load chat history for {}: {}", url, e);
                        Vec::new()
                    }),
                    None => Vec::new(),
                };
                Some(Response::History { tab_id, turns })
            }

            Request::OperationStatus { tab_id, url } => {
                let tab = self.state.context_for(tab_id, &url);
                Some(Response::Status {
                    tab_id,
                    flags: tab.operations().snapshot(),
                })
            }

            Request::TabClosed { tab_id } => {
                self.state.remove(tab_id);
                Some(Response::Ack { tab_id })
            }
        }
    }

    async fn initialize_chat(&self, tab_id: TabId, url: &str, content: &str) -> Option<Response> {
        let tab = self.state.context_for(tab_id, url);
        let _op = tab.operations().begin(OperationKind::Initializing)?;
        let progress = self.progress_for(&tab, Some(OperationKind::Initializing));

        let text = match tab.chat().initialize_model(content, Some(&progress)).await {
            InitOutcome::Ready { .. } | InitOutcome::AlreadyReady => CHAT_READY,
            InitOutcome::AlreadyInitializing | InitOutcome::Cancelled => return None,
            InitOutcome::Failed(sentinel) => sentinel,
        };
        self.deliver(
            &tab,
            Response::Result {
                tab_id,
                kind: OperationKind::Initializing,
                text: text.to_string(),
            },
        )
    }

    async fn record_turns(&self, url: &str, query: &str, answer: &str) {
        let Some(history) = &self.history else {
            return;
        };
        for (role, text) in [(ChatRole::User, query), (ChatRole::Assistant, answer)] {
            if let Err(e) = history.append(url, role, text).await {
                warn!("Failed to persist chat turn for {}: {}", url, e);
                return;
            }
        }
    }

    fn finish(
        &self,
        tab: &Arc<TabContext>,
        kind: OperationKind,
        outcome: PipelineOutcome,
    ) -> Option<Response> {
        let status = if outcome.is_completed() { "ok" } else { "failed" };
        info!("{} finished for {} ({})", kind, tab.tab_id(), status);
        self.deliver(
            tab,
            Response::Result {
                tab_id: tab.tab_id(),
                kind,
                text: outcome.into_text(),
            },
        )
    }

    fn deliver(&self, tab: &Arc<TabContext>, response: Response) -> Option<Response> {
        if self.state.is_current(tab) {
            Some(response)
        } else {
            debug!("Dropping response for stale context of {}", tab.tab_id());
            None
        }
    }

    /// Callback forwarding retry errors as progress messages for `tab`.
    fn progress_for(
        &self,
        tab: &Arc<TabContext>,
        kind: Option<OperationKind>,
    ) -> impl Fn(&str) + Send + Sync + 'static {
        let outbox = self.progress.clone();
        let state = self.state.clone();
        let tab = tab.clone();
        move |message: &str| {
            let Some(outbox) = &outbox else {
                return;
            };
            if !state.is_current(&tab) {
                return;
            }
            let _ = outbox.send(Response::Progress {
                tab_id: tab.tab_id(),
                kind,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
