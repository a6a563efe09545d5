//! Moves a thread from one label to the other.
//!
//! Only the root message ends up carrying the destination label, so the
//! thread shows one marker in list views. Every later message is stripped of
//! both labels.

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::gmail::{MailService, MessageSnapshot};

/// Label ids to take off and put on a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSwap {
    pub remove: String,
    pub add: String,
}

impl LabelSwap {
    pub fn new(remove: impl Into<String>, add: impl Into<String>) -> Self {
        Self {
            remove: remove.into(),
            add: add.into(),
        }
    }
}

/// Applies a [`LabelSwap`] across a thread, one remote call per message.
#[derive(Debug, Clone, Copy)]
pub struct LabelMutator {
    dry_run: bool,
}

impl LabelMutator {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Swap labels on every message of the thread. Returns the number of
    /// remote calls made.
    ///
    /// Calls go out in thread order and stop at the first failure; messages
    /// already modified stay modified.
    pub async fn apply(
        &self,
        service: &dyn MailService,
        messages: &[MessageSnapshot],
        swap: &LabelSwap,
    ) -> Result<usize, TransportError> {
        if self.dry_run {
            warn!(
                messages = messages.len(),
                remove = %swap.remove,
                add = %swap.add,
                "Skipping label changes due to dry-run"
            );
            return Ok(0);
        }

        let Some((root, rest)) = messages.split_first() else {
            return Ok(0);
        };

        service
            .modify_message_labels(
                &root.id,
                std::slice::from_ref(&swap.remove),
                std::slice::from_ref(&swap.add),
            )
            .await?;

        let strip = [swap.remove.clone(), swap.add.clone()];
        for message in rest {
            service
                .modify_message_labels(&message.id, &strip, &[])
                .await?;
        }

        debug!(calls = messages.len(), "Labels swapped on thread");
        Ok(messages.len())
    }
}
