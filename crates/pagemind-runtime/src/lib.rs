//! # PageMind Runtime
//!
//! Per-tab session coordination and the model pipelines built on it.

pub mod chat;
pub mod chat_history;
pub mod chunker;
pub mod dispatcher;
pub mod operation;
pub mod pipeline;
pub mod prompts;
pub mod retry;
pub mod sentinel;
pub mod session_pool;
pub mod store;
pub mod tab;

#[cfg(test)]
mod test_support;

pub use chat::{ChatBotSession, ChatState, InitOutcome};
pub use chat_history::ChatHistory;
pub use chunker::chunk;
pub use dispatcher::Dispatcher;
pub use operation::{OperationGuard, OperationStateMachine};
pub use pipeline::{PipelineOutcome, PipelineSettings, Pipelines};
pub use retry::{ErrorUpdate, InvokeFailure, RetryPolicy, RetryingInvoker, retry_with_backoff};
pub use session_pool::{ModelSessionPool, SessionGuard};
pub use store::{FileStore, MemoryStore, StoreSweeper};
pub use tab::{ExtensionState, TabContext};
