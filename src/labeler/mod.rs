//! Thread classification and label transitions.
//!
//! A run resolves the two label names once, then makes two passes:
//! 1. Reply → archive: threads fully read and idle past the cutoff
//! 2. Archive → reply: threads with any unread message
//!
//! Each pass pages through the threads carrying its search label, evaluates a
//! [`Transition`] against every thread snapshot and swaps labels on a match.

pub mod conditions;
pub mod labels;
pub mod mutator;
pub mod run;
pub mod traversal;

#[cfg(test)]
pub(crate) mod fake;

pub use conditions::Transition;
pub use labels::{LabelDirectory, resolve_label_id};
pub use mutator::{LabelMutator, LabelSwap};
pub use run::{Labeler, RunSummary, cutoff_for, run};
pub use traversal::{Pass, PassSummary, ThreadTraversal};
