//! Paginated sweep over the threads carrying one label.
//!
//! Flow per page:
//! 1. List a page of thread summaries for the search label
//! 2. Fetch each thread's metadata snapshot, in listing order
//! 3. Evaluate the pass's [`Transition`]; on a match, swap labels
//! 4. Follow the next-page token until there is none
//!
//! An empty page ends the pass on the spot, even when the listing hands back
//! a next-page token. Any remote failure or malformed date aborts the pass.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::gmail::{MailService, MessageSnapshot};
use crate::labeler::conditions::Transition;
use crate::labeler::mutator::{LabelMutator, LabelSwap};

/// One direction of the run: which label to sweep, what to check, what to swap.
#[derive(Debug, Clone)]
pub struct Pass {
    pub search_label: String,
    pub swap: LabelSwap,
    pub transition: Transition,
}

/// Counters for a finished pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Threads whose snapshot was fetched and evaluated.
    pub threads_reviewed: usize,
    /// Threads the transition matched.
    pub threads_matched: usize,
    /// `modify_message_labels` calls issued (zero in dry-run).
    pub mutations_applied: usize,
    /// Listing pages requested, including a trailing empty one.
    pub pages_fetched: usize,
    /// The pass stopped at an empty page rather than a missing token.
    pub ended_on_empty_page: bool,
}

/// Walks a label's thread listing and applies a pass to every thread.
pub struct ThreadTraversal<'a> {
    service: &'a dyn MailService,
    mutator: LabelMutator,
}

impl<'a> ThreadTraversal<'a> {
    pub fn new(service: &'a dyn MailService, mutator: LabelMutator) -> Self {
        Self { service, mutator }
    }

    /// Run the pass to completion.
    pub async fn sweep(&self, pass: &Pass) -> Result<PassSummary> {
        let mut summary = PassSummary::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .service
                .list_threads(&pass.search_label, page_token.as_deref())
                .await?;
            summary.pages_fetched += 1;

            if page.threads.is_empty() {
                warn!(
                    search_label_id = %pass.search_label,
                    "No messages found with search label"
                );
                summary.ended_on_empty_page = true;
                return Ok(summary);
            }

            for thread in &page.threads {
                let messages = self.service.get_thread_messages(&thread.id).await?;
                summary.threads_reviewed += 1;

                if !pass.transition.applies(&messages)? {
                    debug!(thread_id = %thread.id, "Thread does not meet conditions");
                    continue;
                }

                summary.threads_matched += 1;
                info!(
                    thread_id = %thread.id,
                    subject = %messages.first().map_or("(No Subject)", MessageSnapshot::subject),
                    dry_run = self.mutator.is_dry_run(),
                    "Thread found meeting conditions"
                );
                summary.mutations_applied += self
                    .mutator
                    .apply(self.service, &messages, &pass.swap)
                    .await?;
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    info!("Retrieving next page of results");
                    page_token = Some(token);
                }
                None => break,
            }
        }

        info!(
            search_label_id = %pass.search_label,
            thread_cnt = summary.threads_reviewed,
            matched = summary.threads_matched,
            "Done reviewing threads with search label"
        );
        Ok(summary)
    }
}
