//! System instructions derived from session options.

use pagemind_protocols::{SessionOptions, SummaryFormat, SummaryLength, SummaryType};

/// Instruction for a summarizer session.
pub fn summarizer_instruction(options: &SessionOptions) -> String {
    let length = options.length.unwrap_or(SummaryLength::Medium);
    let summary_type = options.summary_type.unwrap_or(SummaryType::KeyPoints);

    let shape = match (summary_type, length) {
        (SummaryType::KeyPoints, SummaryLength::Short) => "the 3 most important points as a bulleted list",
        (SummaryType::KeyPoints, SummaryLength::Medium) => "the 5 most important points as a bulleted list",
        (SummaryType::KeyPoints, SummaryLength::Long) => "the 7 most important points as a bulleted list",
        (SummaryType::Tldr, SummaryLength::Short) => "a one-sentence overview",
        (SummaryType::Tldr, SummaryLength::Medium) => "a three-sentence overview",
        (SummaryType::Tldr, SummaryLength::Long) => "a five-sentence overview",
        (SummaryType::Teaser, SummaryLength::Short) => "a one-sentence teaser that makes the reader want more",
        (SummaryType::Teaser, SummaryLength::Medium) => "a three-sentence teaser that makes the reader want more",
        (SummaryType::Teaser, SummaryLength::Long) => "a five-sentence teaser that makes the reader want more",
        (SummaryType::Headline, SummaryLength::Short) => "a headline of at most 12 words",
        (SummaryType::Headline, SummaryLength::Medium) => "a headline of at most 17 words",
        (SummaryType::Headline, SummaryLength::Long) => "a headline of at most 22 words",
    };

    let format = match options.format.unwrap_or(SummaryFormat::PlainText) {
        SummaryFormat::PlainText => "Use plain text without any markdown.",
        SummaryFormat::Markdown => "Format the answer as markdown.",
    };

    let mut instruction = format!(
        "Summarize the text the user sends as {}. {} Reply with the summary only.",
        shape, format
    );
    if let Some(context) = &options.shared_context {
        instruction.push_str("\n\nContext: ");
        instruction.push_str(context);
    }
    instruction
}

/// System message for a prompt session, if it has one.
pub fn prompt_instruction(options: &SessionOptions) -> Option<String> {
    options
        .system_prompt
        .clone()
        .or_else(|| options.shared_context.clone())
}
