//! Mailbox snapshot types shared by the labeler core and the Gmail client.

use serde::{Deserialize, Serialize};

/// Gmail's system label marking a message as unread.
pub const UNREAD_LABEL: &str = "UNREAD";

/// A label as listed by the mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub id: String,
    pub name: String,
}

/// A thread as it appears in a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: String,
}

/// One page of a thread listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadPage {
    #[serde(default)]
    pub threads: Vec<ThreadSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A single message header. Names may repeat within a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Metadata snapshot of one message in a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSnapshot {
    pub id: String,
    pub label_ids: Vec<String>,
    pub headers: Vec<Header>,
}

impl MessageSnapshot {
    /// Whether the message still carries the unread marker.
    pub fn is_unread(&self) -> bool {
        self.has_label(UNREAD_LABEL)
    }

    pub fn has_label(&self, label_id: &str) -> bool {
        self.label_ids.iter().any(|l| l == label_id)
    }

    /// First header with the given name (ASCII case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Subject line for log output.
    pub fn subject(&self) -> &str {
        self.header("Subject").unwrap_or("(No Subject)")
    }
}
