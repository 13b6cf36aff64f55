//! Fixed, displayable strings returned in place of terminal failures.

use pagemind_protocols::OperationKind;

pub const MODEL_UNAVAILABLE: &str =
    "The on-device model is unavailable. Please restart the browser and try again.";
pub const SUMMARIZE_FAILED: &str = "Summarizing failed after multiple attempts.";
pub const ANALYZE_FAILED: &str = "Analyzing failed after multiple attempts.";
pub const FACT_CHECK_FAILED: &str = "Fact-checking failed after multiple attempts.";
pub const DEFINE_FAILED: &str = "Defining failed after multiple attempts.";
pub const REWRITE_FAILED: &str = "Rewriting failed after multiple attempts.";
pub const INITIALIZE_FAILED: &str = "Preparing the chat failed after multiple attempts.";
pub const CHAT_FAILED: &str = "Sorry, I couldn't come up with an answer. Please try again.";
pub const CHAT_NOT_INITIALIZED: &str =
    "The model is not initialized yet. Please wait for the page to finish loading.";
pub const NOTHING_TO_SUMMARIZE: &str = "There is no readable content on this page to summarize.";
pub const NOTHING_SELECTED: &str = "Select some text first.";

/// Sentinel shown when retries for `kind` are exhausted.
pub fn failure_for(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Summarizing => SUMMARIZE_FAILED,
        OperationKind::Analyzing => ANALYZE_FAILED,
        OperationKind::FactChecking => FACT_CHECK_FAILED,
        OperationKind::Defining => DEFINE_FAILED,
        OperationKind::Rewriting => REWRITE_FAILED,
        OperationKind::Initializing => INITIALIZE_FAILED,
    }
}
