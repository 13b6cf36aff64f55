//! Single-shot pipelines: analyze, fact-check, define and rewrite.

use tracing::{debug, warn};

use pagemind_protocols::{ReadingLevel, SessionOptions, SessionPurpose};

use super::{PipelineOutcome, Pipelines};
use crate::chunker::{self, char_len};
use crate::prompts;
use crate::retry::ErrorUpdate;
use crate::sentinel;

impl Pipelines {
    /// Explain what `selection` means and why it matters.
    pub async fn analyze(
        &self,
        selection: &str,
        page_summary: Option<&str>,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> PipelineOutcome {
        self.single_shot(
            SessionPurpose::Analyze,
            prompts::ANALYZE_SYSTEM_PROMPT.to_string(),
            "Selection",
            selection,
            page_summary,
            sentinel::ANALYZE_FAILED,
            on_error,
        )
        .await
    }

    /// Judge whether the claim in `selection` holds up.
    pub async fn fact_check(
        &self,
        selection: &str,
        page_summary: Option<&str>,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> PipelineOutcome {
        self.single_shot(
            SessionPurpose::FactCheck,
            prompts::FACT_CHECK_SYSTEM_PROMPT.to_string(),
            "Claim",
            selection,
            page_summary,
            sentinel::FACT_CHECK_FAILED,
            on_error,
        )
        .await
    }

    /// Define `term` as it is used on the page.
    pub async fn define(
        &self,
        term: &str,
        page_summary: Option<&str>,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> PipelineOutcome {
        self.single_shot(
            SessionPurpose::Define,
            prompts::DEFINE_SYSTEM_PROMPT.to_string(),
            "Term",
            term,
            page_summary,
            sentinel::DEFINE_FAILED,
            on_error,
        )
        .await
    }

    /// Rewrite `text` for readers at `level`.
    ///
    /// Text over the budget is split into chunks that are rewritten in order
    /// against one session and joined with blank lines.
    pub async fn rewrite(
        &self,
        text: &str,
        level: ReadingLevel,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> PipelineOutcome {
        let text = text.trim();
        if text.is_empty() {
            return PipelineOutcome::Failed(sentinel::NOTHING_SELECTED);
        }

        let budget = self.settings.budget_chars;
        let pieces = if char_len(text) <= budget {
            vec![text.to_string()]
        } else {
            chunker::chunk_unfiltered(text, budget)
        };

        let options = SessionOptions::new(SessionPurpose::Rewrite)
            .with_system_prompt(prompts::rewrite_system_prompt(level));
        let session = match self.acquire(options, sentinel::REWRITE_FAILED, on_error).await {
            Ok(session) => session,
            Err(failure) => return PipelineOutcome::Failed(failure),
        };

        let mut rewritten = Vec::with_capacity(pieces.len());
        for (i, piece) in pieces.iter().enumerate() {
            debug!("Rewriting part {}/{}", i + 1, pieces.len());
            let (session, piece) = (&session, piece.as_str());
            match self
                .invoker
                .run(SessionPurpose::Rewrite, on_error, move || session.prompt(piece))
                .await
            {
                Ok(text) => rewritten.push(text),
                Err(e) => {
                    warn!("Rewrite of part {} failed: {}", i + 1, e);
                    return PipelineOutcome::Failed(e.sentinel(sentinel::REWRITE_FAILED));
                }
            }
        }

        PipelineOutcome::Completed(rewritten.join("\n\n"))
    }

    #[allow(clippy::too_many_arguments)]
    async fn single_shot(
        &self,
        purpose: SessionPurpose,
        system_prompt: String,
        label: &str,
        input: &str,
        page_summary: Option<&str>,
        failure: &'static str,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> PipelineOutcome {
        let input = input.trim();
        if input.is_empty() {
            return PipelineOutcome::Failed(sentinel::NOTHING_SELECTED);
        }

        let options = SessionOptions::new(purpose).with_system_prompt(system_prompt);
        let session = match self.acquire(options, failure, on_error).await {
            Ok(session) => session,
            Err(failure) => return PipelineOutcome::Failed(failure),
        };

        let prompt = prompts::with_page_context(label, input, page_summary);
        let (session, prompt) = (&session, prompt.as_str());
        match self
            .invoker
            .run(purpose, on_error, move || session.prompt(prompt))
            .await
        {
            Ok(text) => PipelineOutcome::Completed(text),
            Err(e) => {
                warn!("{} failed: {}", purpose, e);
                PipelineOutcome::Failed(e.sentinel(failure))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::pipeline::PipelineSettings;
    use crate::retry::{RetryPolicy, RetryingInvoker};
    use crate::session_pool::ModelSessionPool;
    use crate::test_support::ScriptedModel;

    fn pipelines(scripted: &ScriptedModel, budget_chars: usize) -> Pipelines {
        let model = scripted.clone().into_arc();
        Pipelines::new(
            Arc::new(ModelSessionPool::new(model.clone())),
            Arc::new(RetryingInvoker::new(model, RetryPolicy::default())),
            PipelineSettings {
                budget_chars,
                max_resummarize_passes: 3,
            },
        )
    }

    #[tokio::test]
    async fn test_analyze_includes_page_summary() {
        let scripted = ScriptedModel::new();
        let pipelines = pipelines(&scripted, 3800);

        let outcome = pipelines
            .analyze("the borrow checker", Some("A page about Rust."), None)
            .await;

        assert!(outcome.is_completed());
        let calls = scripted.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].purpose, SessionPurpose::Analyze);
        assert!(calls[0].input.contains("A page about Rust."));
        assert!(calls[0].input.ends_with("Selection:\nthe borrow checker"));
        assert_eq!(
            scripted.created_sessions()[0].system_prompt.as_deref(),
            Some(prompts::ANALYZE_SYSTEM_PROMPT)
        );
        assert_eq!(pipelines.pool().live_total(), 0);
    }

    #[tokio::test]
    async fn test_fact_check_and_define_use_own_purpose() {
        let scripted = ScriptedModel::new();
        let pipelines = pipelines(&scripted, 3800);

        pipelines.fact_check("Water boils at 50C.", None, None).await;
        pipelines.define("idempotent", None, None).await;

        assert_eq!(scripted.calls_for(SessionPurpose::FactCheck), 1);
        assert_eq!(scripted.calls_for(SessionPurpose::Define), 1);
        assert_eq!(scripted.calls()[1].input, "Term:\nidempotent");
        assert_eq!(pipelines.pool().live_total(), 0);
    }

    #[tokio::test]
    async fn test_blank_selection_is_rejected() {
        let scripted = ScriptedModel::new();
        let pipelines = pipelines(&scripted, 3800);

        let outcome = pipelines.define("   ", None, None).await;

        assert_eq!(outcome, PipelineOutcome::Failed(sentinel::NOTHING_SELECTED));
        assert!(scripted.created_sessions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_task_sentinel() {
        let scripted = ScriptedModel::new();
        scripted.fail_next(3);
        let pipelines = pipelines(&scripted, 3800);

        let outcome = pipelines.fact_check("The moon is cheese.", None, None).await;

        assert_eq!(outcome, PipelineOutcome::Failed(sentinel::FACT_CHECK_FAILED));
        assert_eq!(pipelines.pool().live_total(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_short_text_in_one_call() {
        let scripted = ScriptedModel::new();
        let pipelines = pipelines(&scripted, 3800);

        let outcome = pipelines
            .rewrite("Photosynthesis converts light.", ReadingLevel::Elementary, None)
            .await;

        assert!(outcome.is_completed());
        assert_eq!(scripted.call_count(), 1);
        let prompt = scripted.created_sessions()[0].system_prompt.clone().unwrap();
        assert!(prompt.contains("elementary school"));
    }

    #[tokio::test]
    async fn test_rewrite_long_text_chunks_against_one_session() {
        let scripted = ScriptedModel::new();
        let pipelines = pipelines(&scripted, 100);
        let text: String = (0..6)
            .map(|i| format!("Heading {}\nBody text of section {} goes here.\n", i, i))
            .collect();

        let outcome = pipelines.rewrite(&text, ReadingLevel::College, None).await;

        let parts = chunker::chunk_unfiltered(&text, 100);
        assert!(parts.len() > 1);
        assert_eq!(scripted.created_sessions().len(), 1);
        assert_eq!(scripted.call_count(), parts.len());
        assert_eq!(outcome.text().split("\n\n").count(), parts.len());
        assert!(scripted.calls()[0].input.starts_with("Heading 0\n"));
        assert_eq!(pipelines.pool().live_total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rewrite_chunk_failure_returns_sentinel() {
        let scripted = ScriptedModel::new();
        scripted.fail_next(3);
        let pipelines = pipelines(&scripted, 3800);

        let outcome = pipelines
            .rewrite("Some text to simplify.", ReadingLevel::Expert, None)
            .await;

        assert_eq!(outcome, PipelineOutcome::Failed(sentinel::REWRITE_FAILED));
    }
}
