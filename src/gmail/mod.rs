//! Remote mailbox access.
//!
//! The labeler core only talks to [`MailService`]; [`GmailClient`] is the
//! production implementation over the Gmail v1 REST API.

pub mod auth;
pub mod client;
pub mod types;

pub use auth::{GMAIL_MODIFY_SCOPE, load_access_token};
pub use client::GmailClient;
pub use types::{Header, LabelSummary, MessageSnapshot, ThreadPage, ThreadSummary, UNREAD_LABEL};

use async_trait::async_trait;

use crate::error::TransportError;

/// The four mailbox operations the labeler needs.
#[async_trait]
pub trait MailService: Send + Sync {
    /// List every label in the mailbox.
    async fn list_labels(&self) -> Result<Vec<LabelSummary>, TransportError>;

    /// One page of threads carrying `label_id`. `page_token` is `None` for the first page.
    async fn list_threads(
        &self,
        label_id: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, TransportError>;

    /// Metadata for every message in a thread, root first.
    async fn get_thread_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<MessageSnapshot>, TransportError>;

    /// Remove then add labels on a single message.
    async fn modify_message_labels(
        &self,
        message_id: &str,
        remove_ids: &[String],
        add_ids: &[String],
    ) -> Result<(), TransportError>;
}
