//! Instruction text sent to the model.

use pagemind_protocols::ReadingLevel;

pub const CHAT_SYSTEM_PROMPT: &str =
    "Answer questions about the content given. Keep responses short.";

pub const COMBINE_CONTEXT: &str = "The text is a series of summaries of consecutive parts of one \
     page. Figure out the main topic and summarize it into a single paragraph.";

pub const ANALYZE_SYSTEM_PROMPT: &str = "You explain passages from web pages. Describe what the \
     selected text means and why it matters, in a few sentences.";

pub const FACT_CHECK_SYSTEM_PROMPT: &str = "You check claims from web pages. Judge the claim as \
     supported, disputed or unverifiable, then justify the verdict in two or three sentences.";

pub const DEFINE_SYSTEM_PROMPT: &str = "You define terms found on web pages. Give a concise \
     definition that fits how the term is used on the page.";

/// System prompt for a chat session, with the first page chunk folded in.
pub fn chat_system_prompt(first_chunk: Option<&str>) -> String {
    match first_chunk {
        Some(chunk) => format!("{}\n\nContent:\n{}", CHAT_SYSTEM_PROMPT, chunk),
        None => CHAT_SYSTEM_PROMPT.to_string(),
    }
}

/// Follow-up prompt feeding one more chunk of page content into a chat.
pub fn chat_priming(chunk: &str) -> String {
    format!(
        "Here is more of the same content. Reply only with \"OK\".\n\n{}",
        chunk
    )
}

/// Shared context for the final combine pass.
pub fn combine_context(focus: &str) -> String {
    let focus = focus.trim();
    if focus.is_empty() {
        COMBINE_CONTEXT.to_string()
    } else {
        format!("{} Focus on: {}", COMBINE_CONTEXT, focus)
    }
}

pub fn rewrite_system_prompt(level: ReadingLevel) -> String {
    format!(
        "You rewrite text so that {} can read it easily. Keep the meaning and facts intact. \
         Reply with the rewritten text only.",
        level.audience()
    )
}

/// Wrap a user selection with the page summary, when one exists.
pub fn with_page_context(label: &str, input: &str, page_summary: Option<&str>) -> String {
    match page_summary.map(str::trim).filter(|s| !s.is_empty()) {
        Some(summary) => format!("Page summary:\n{}\n\n{}:\n{}", summary, label, input),
        None => format!("{}:\n{}", label, input),
    }
}
