//! Session configuration types.

use serde::{Deserialize, Serialize};

/// Result of a capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    /// Ready to create sessions.
    Yes,
    /// Not usable until the host restarts or the model is installed.
    No,
    /// Usable after a download or warm-up.
    Maybe,
}

impl Availability {
    pub fn is_unavailable(self) -> bool {
        matches!(self, Availability::No)
    }
}

/// What a session is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPurpose {
    Chat,
    Summarize,
    Analyze,
    FactCheck,
    Define,
    Rewrite,
}

impl SessionPurpose {
    pub const ALL: [SessionPurpose; 6] = [
        SessionPurpose::Chat,
        SessionPurpose::Summarize,
        SessionPurpose::Analyze,
        SessionPurpose::FactCheck,
        SessionPurpose::Define,
        SessionPurpose::Rewrite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SessionPurpose::Chat => "chat",
            SessionPurpose::Summarize => "summarize",
            SessionPurpose::Analyze => "analyze",
            SessionPurpose::FactCheck => "factCheck",
            SessionPurpose::Define => "define",
            SessionPurpose::Rewrite => "rewrite",
        }
    }
}

impl std::fmt::Display for SessionPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target length of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

/// Output format of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryFormat {
    PlainText,
    Markdown,
}

/// Style of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryType {
    KeyPoints,
    Tldr,
    Teaser,
    Headline,
}

/// Options for creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Purpose of the session.
    pub purpose: SessionPurpose,

    /// System instruction for prompt sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Extra context applied to every summarize call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_context: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<SummaryLength>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<SummaryFormat>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub summary_type: Option<SummaryType>,
}

impl SessionOptions {
    /// Options for a prompt-style session.
    pub fn new(purpose: SessionPurpose) -> Self {
        Self {
            purpose,
            system_prompt: None,
            shared_context: None,
            length: None,
            format: None,
            summary_type: None,
        }
    }

    /// Options for a summarizer session.
    pub fn summarizer(length: SummaryLength) -> Self {
        Self::new(SessionPurpose::Summarize)
            .with_length(length)
            .with_format(SummaryFormat::PlainText)
            .with_type(SummaryType::Tldr)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_shared_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        if !context.trim().is_empty() {
            self.shared_context = Some(context);
        }
        self
    }

    pub fn with_length(mut self, length: SummaryLength) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_format(mut self, format: SummaryFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_type(mut self, summary_type: SummaryType) -> Self {
        self.summary_type = Some(summary_type);
        self
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
