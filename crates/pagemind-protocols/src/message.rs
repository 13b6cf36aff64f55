//! Messages exchanged between the extension contexts and the core.
//!
//! Every request is addressed by tab id. Responses for tabs that have closed
//! or navigated away are dropped by the transport.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// A pipeline category subject to per-tab mutual exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationKind {
    Summarizing,
    Analyzing,
    FactChecking,
    Defining,
    Rewriting,
    Initializing,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Summarizing,
        OperationKind::Analyzing,
        OperationKind::FactChecking,
        OperationKind::Defining,
        OperationKind::Rewriting,
        OperationKind::Initializing,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Summarizing => "summarizing",
            OperationKind::Analyzing => "analyzing",
            OperationKind::FactChecking => "factChecking",
            OperationKind::Defining => "defining",
            OperationKind::Rewriting => "rewriting",
            OperationKind::Initializing => "initializing",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target audience of the rewrite pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadingLevel {
    Elementary,
    #[default]
    MiddleSchool,
    HighSchool,
    College,
    Expert,
}

impl ReadingLevel {
    /// Audience phrase used in rewrite instructions.
    pub fn audience(self) -> &'static str {
        match self {
            ReadingLevel::Elementary => "a child in elementary school",
            ReadingLevel::MiddleSchool => "a middle school student",
            ReadingLevel::HighSchool => "a high school student",
            ReadingLevel::College => "a college student",
            ReadingLevel::Expert => "a domain expert",
        }
    }
}

/// Author of a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Operation flags of one tab, as shown to the popup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationFlags {
    pub running: BTreeMap<OperationKind, bool>,
    pub summarized: bool,
    pub all_idle: bool,
}

/// Requests sent to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// A page finished loading; primes the tab's chat session.
    PageLoaded {
        tab_id: TabId,
        url: String,
        content: String,
    },
    Summarize {
        tab_id: TabId,
        url: String,
        content: String,
        #[serde(default)]
        focus: String,
    },
    Analyze {
        tab_id: TabId,
        url: String,
        selection: String,
    },
    FactCheck {
        tab_id: TabId,
        url: String,
        selection: String,
    },
    Define {
        tab_id: TabId,
        url: String,
        term: String,
    },
    Rewrite {
        tab_id: TabId,
        url: String,
        text: String,
        #[serde(default)]
        level: ReadingLevel,
    },
    InitializeChat {
        tab_id: TabId,
        url: String,
        content: String,
    },
    Chat {
        tab_id: TabId,
        url: String,
        query: String,
    },
    ChatHistory {
        tab_id: TabId,
        url: String,
    },
    OperationStatus {
        tab_id: TabId,
        url: String,
    },
    TabClosed {
        tab_id: TabId,
    },
}

impl Request {
    pub fn tab_id(&self) -> TabId {
        match self {
            Request::PageLoaded { tab_id, .. }
            | Request::Summarize { tab_id, .. }
            | Request::Analyze { tab_id, .. }
            | Request::FactCheck { tab_id, .. }
            | Request::Define { tab_id, .. }
            | Request::Rewrite { tab_id, .. }
            | Request::InitializeChat { tab_id, .. }
            | Request::Chat { tab_id, .. }
            | Request::ChatHistory { tab_id, .. }
            | Request::OperationStatus { tab_id, .. }
            | Request::TabClosed { tab_id } => *tab_id,
        }
    }

    /// Page URL the request was issued from, if it carries one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Request::PageLoaded { url, .. }
            | Request::Summarize { url, .. }
            | Request::Analyze { url, .. }
            | Request::FactCheck { url, .. }
            | Request::Define { url, .. }
            | Request::Rewrite { url, .. }
            | Request::InitializeChat { url, .. }
            | Request::Chat { url, .. }
            | Request::ChatHistory { url, .. }
            | Request::OperationStatus { url, .. } => Some(url),
            Request::TabClosed { .. } => None,
        }
    }

    /// Operation kind guarded by the tab's state machine, if any.
    pub fn kind(&self) -> Option<OperationKind> {
        match self {
            Request::PageLoaded { .. } | Request::InitializeChat { .. } => {
                Some(OperationKind::Initializing)
            }
            Request::Summarize { .. } => Some(OperationKind::Summarizing),
            Request::Analyze { .. } => Some(OperationKind::Analyzing),
            Request::FactCheck { .. } => Some(OperationKind::FactChecking),
            Request::Define { .. } => Some(OperationKind::Defining),
            Request::Rewrite { .. } => Some(OperationKind::Rewriting),
            Request::Chat { .. }
            | Request::ChatHistory { .. }
            | Request::OperationStatus { .. }
            | Request::TabClosed { .. } => None,
        }
    }
}

/// Messages sent back to the extension contexts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    /// Final output of a pipeline; may be a failure sentinel.
    Result {
        tab_id: TabId,
        kind: OperationKind,
        text: String,
    },
    ChatReply {
        tab_id: TabId,
        text: String,
    },
    /// Live error update from a retrying call.
    Progress {
        tab_id: TabId,
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<OperationKind>,
        message: String,
    },
    Status {
        tab_id: TabId,
        flags: OperationFlags,
    },
    History {
        tab_id: TabId,
        turns: Vec<ChatTurn>,
    },
    Ack {
        tab_id: TabId,
    },
}

impl Response {
    pub fn tab_id(&self) -> TabId {
        match self {
            Response::Result { tab_id, .. }
            | Response::ChatReply { tab_id, .. }
            | Response::Progress { tab_id, .. }
            | Response::Status { tab_id, .. }
            | Response::History { tab_id, .. }
            | Response::Ack { tab_id } => *tab_id,
        }
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
