//! Scripted in-memory mailbox for labeler unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::gmail::{Header, LabelSummary, MailService, MessageSnapshot, ThreadPage, ThreadSummary};

/// A recorded call against the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListLabels,
    ListThreads {
        label: String,
        token: Option<String>,
    },
    GetThread(String),
    Modify {
        message_id: String,
        remove: Vec<String>,
        add: Vec<String>,
    },
}

impl Call {
    pub fn modify(message_id: &str, remove: &[&str], add: &[&str]) -> Self {
        Self::Modify {
            message_id: message_id.into(),
            remove: remove.iter().map(|s| s.to_string()).collect(),
            add: add.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Build a message with a subject, an optional `Date` and the given labels.
pub(crate) fn message(id: &str, labels: &[&str], date: Option<&str>) -> MessageSnapshot {
    let mut headers = vec![Header {
        name: "Subject".into(),
        value: format!("Subject {id}"),
    }];
    if let Some(date) = date {
        headers.push(Header {
            name: "Date".into(),
            value: date.into(),
        });
    }
    MessageSnapshot {
        id: id.into(),
        label_ids: labels.iter().map(|s| s.to_string()).collect(),
        headers,
    }
}

fn not_found(operation: &str, what: &str) -> TransportError {
    TransportError::Status {
        operation: operation.into(),
        status: 404,
        body: format!("{what} not scripted"),
    }
}

/// Answers listing calls from fixed pages and records every call.
#[derive(Default)]
pub(crate) struct ScriptedMailbox {
    pub labels: Vec<LabelSummary>,
    /// Keyed by (label id, page token).
    pub pages: HashMap<(String, Option<String>), ThreadPage>,
    pub threads: HashMap<String, Vec<MessageSnapshot>>,
    pub fail_modify_on: Option<String>,
    pub fail_thread: Option<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl ScriptedMailbox {
    pub fn with_labels(mut self, labels: &[(&str, &str)]) -> Self {
        self.labels = labels
            .iter()
            .map(|(id, name)| LabelSummary {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn with_page(
        mut self,
        label: &str,
        token: Option<&str>,
        thread_ids: &[&str],
        next: Option<&str>,
    ) -> Self {
        let page = ThreadPage {
            threads: thread_ids
                .iter()
                .map(|id| ThreadSummary { id: id.to_string() })
                .collect(),
            next_page_token: next.map(str::to_string),
        };
        self.pages
            .insert((label.to_string(), token.map(str::to_string)), page);
        self
    }

    pub fn with_thread(mut self, id: &str, messages: Vec<MessageSnapshot>) -> Self {
        self.threads.insert(id.to_string(), messages);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn modify_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Modify { .. }))
            .collect()
    }

    pub fn pages_requested(&self, label: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::ListThreads { label: l, .. } if l == label))
            .count()
    }
}

#[async_trait]
impl MailService for ScriptedMailbox {
    async fn list_labels(&self) -> Result<Vec<LabelSummary>, TransportError> {
        self.record(Call::ListLabels);
        Ok(self.labels.clone())
    }

    async fn list_threads(
        &self,
        label_id: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, TransportError> {
        self.record(Call::ListThreads {
            label: label_id.into(),
            token: page_token.map(str::to_string),
        });
        self.pages
            .get(&(label_id.to_string(), page_token.map(str::to_string)))
            .cloned()
            .ok_or_else(|| not_found("threads.list", label_id))
    }

    async fn get_thread_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<MessageSnapshot>, TransportError> {
        self.record(Call::GetThread(thread_id.into()));
        if self.fail_thread.as_deref() == Some(thread_id) {
            return Err(TransportError::RequestFailed {
                operation: "threads.get".into(),
                reason: "connection reset".into(),
            });
        }
        self.threads
            .get(thread_id)
            .cloned()
            .ok_or_else(|| not_found("threads.get", thread_id))
    }

    async fn modify_message_labels(
        &self,
        message_id: &str,
        remove_ids: &[String],
        add_ids: &[String],
    ) -> Result<(), TransportError> {
        self.record(Call::Modify {
            message_id: message_id.into(),
            remove: remove_ids.to_vec(),
            add: add_ids.to_vec(),
        });
        if self.fail_modify_on.as_deref() == Some(message_id) {
            return Err(TransportError::Status {
                operation: "messages.modify".into(),
                status: 500,
                body: "backend error".into(),
            });
        }
        Ok(())
    }
}
