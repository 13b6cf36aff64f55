//! Page summarization.
//!
//! Content within the budget is summarized in one call. Longer content is
//! chunked, each chunk is summarized, and the concatenated summaries are
//! condensed by one final combine pass. When the concatenation is itself
//! over budget it is re-chunked and re-summarized, at most
//! `max_resummarize_passes` times.

use tracing::{debug, info, warn};

use pagemind_protocols::{SessionOptions, SessionPurpose, SummaryLength};

use super::{PipelineOutcome, Pipelines};
use crate::chunker::{self, char_len};
use crate::prompts;
use crate::retry::ErrorUpdate;
use crate::sentinel;

impl Pipelines {
    /// Summarize `content`, steering the summary towards `focus` if given.
    pub async fn summarize(
        &self,
        content: &str,
        focus: &str,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> PipelineOutcome {
        let content = content.trim();
        if content.is_empty() {
            return PipelineOutcome::Failed(sentinel::NOTHING_TO_SUMMARIZE);
        }

        let budget = self.settings.budget_chars;
        if char_len(content) <= budget {
            debug!("Summarizing {} chars in one pass", char_len(content));
            let options = SessionOptions::summarizer(SummaryLength::Short).with_shared_context(focus);
            return self.summarize_once(options, content, on_error).await;
        }

        let mut combined = match self.summarize_chunks(content, on_error).await {
            Ok(combined) => combined,
            Err(failure) => return PipelineOutcome::Failed(failure),
        };

        let mut passes = 0;
        while char_len(&combined) > budget {
            if passes >= self.settings.max_resummarize_passes {
                warn!(
                    "Chunk summaries still {} chars after {} passes, truncating to {}",
                    char_len(&combined),
                    passes,
                    budget
                );
                combined = chunker::truncate_chars(&combined, budget);
                break;
            }

            let before = char_len(&combined);
            let next = match self.summarize_chunks(&combined, on_error).await {
                Ok(next) => next,
                Err(failure) => return PipelineOutcome::Failed(failure),
            };
            passes += 1;
            info!("Re-summarized {} chars into {}", before, char_len(&next));

            if char_len(&next) >= before {
                warn!("Re-summarization did not shrink the text, truncating to {}", budget);
                combined = chunker::truncate_chars(&next, budget);
                break;
            }
            combined = next;
        }

        let options = SessionOptions::summarizer(SummaryLength::Short)
            .with_shared_context(prompts::combine_context(focus));
        self.summarize_once(options, &combined, on_error).await
    }

    async fn summarize_once(
        &self,
        options: SessionOptions,
        text: &str,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> PipelineOutcome {
        let session = match self
            .acquire(options, sentinel::SUMMARIZE_FAILED, on_error)
            .await
        {
            Ok(session) => session,
            Err(failure) => return PipelineOutcome::Failed(failure),
        };

        let session = &session;
        match self
            .invoker
            .run(SessionPurpose::Summarize, on_error, move || session.summarize(text))
            .await
        {
            Ok(summary) => PipelineOutcome::Completed(summary),
            Err(e) => {
                warn!("Summarization failed: {}", e);
                PipelineOutcome::Failed(e.sentinel(sentinel::SUMMARIZE_FAILED))
            }
        }
    }

    /// Summarize each chunk of `text` and join the summaries with newlines.
    async fn summarize_chunks(
        &self,
        text: &str,
        on_error: Option<ErrorUpdate<'_>>,
    ) -> Result<String, &'static str> {
        let chunks = chunker::chunk(text, self.settings.budget_chars);
        if chunks.is_empty() {
            warn!("No qualifying lines in {} chars of content", char_len(text));
            return Err(sentinel::NOTHING_TO_SUMMARIZE);
        }

        let session = self
            .acquire(
                SessionOptions::summarizer(SummaryLength::Medium),
                sentinel::SUMMARIZE_FAILED,
                on_error,
            )
            .await?;

        let mut summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            debug!("Summarizing chunk {}/{} ({} chars)", i + 1, chunks.len(), char_len(chunk));
            let (session, chunk) = (&session, chunk.as_str());
            match self
                .invoker
                .run(SessionPurpose::Summarize, on_error, move || session.summarize(chunk))
                .await
            {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    warn!("Chunk {} failed: {}", i + 1, e);
                    return Err(e.sentinel(sentinel::SUMMARIZE_FAILED));
                }
            }
        }

        Ok(summaries.join("\n"))
    }
}

#[cfg(test)]
#[path = "summarize_tests.rs"]
mod tests;
