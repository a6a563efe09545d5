//! Run orchestration: resolve labels, then sweep reply → archive and
//! archive → reply, strictly one after the other.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::error::Result;
use crate::gmail::MailService;
use crate::labeler::conditions::Transition;
use crate::labeler::labels::LabelDirectory;
use crate::labeler::mutator::{LabelMutator, LabelSwap};
use crate::labeler::traversal::{Pass, PassSummary, ThreadTraversal};

/// Outcome of both passes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Pass A: reply → archive.
    pub reply_to_archive: PassSummary,
    /// Pass B: archive → reply.
    pub archive_to_reply: PassSummary,
}

impl RunSummary {
    pub fn threads_reviewed_pass_a(&self) -> usize {
        self.reply_to_archive.threads_reviewed
    }

    pub fn threads_reviewed_pass_b(&self) -> usize {
        self.archive_to_reply.threads_reviewed
    }
}

/// Instant before which a fully-read thread counts as idle.
pub fn cutoff_for(now: DateTime<Utc>, idle_days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(idle_days))
}

/// Drives one labeling run against a mailbox.
pub struct Labeler {
    service: Arc<dyn MailService>,
    config: RunConfig,
}

impl Labeler {
    pub fn new(service: Arc<dyn MailService>, config: RunConfig) -> Self {
        Self { service, config }
    }

    /// Run both passes with the current time.
    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now()).await
    }

    /// Run both passes as of `now`. The cutoff is derived once from `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let span = info_span!(
            "run",
            run_id = %Uuid::new_v4(),
            dry_run = self.config.dry_run
        );
        self.run_inner(now).instrument(span).await
    }

    async fn run_inner(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        let service = self.service.as_ref();

        info!(
            reply = %self.config.reply_label,
            archive = %self.config.archive_label,
            "Resolving label ids"
        );
        let directory = LabelDirectory::fetch(service).await?;
        let reply_id = directory.resolve(&self.config.reply_label)?.to_string();
        debug!(label = %self.config.reply_label, id = %reply_id, "Respond To Label mapped");
        let archive_id = directory.resolve(&self.config.archive_label)?.to_string();
        debug!(label = %self.config.archive_label, id = %archive_id, "Archive Label mapped");

        let cutoff = cutoff_for(now, self.config.idle_days);
        info!(date = %cutoff, "Clean out date calculated");

        let traversal = ThreadTraversal::new(service, LabelMutator::new(self.config.dry_run));

        let to_archive = Pass {
            search_label: reply_id.clone(),
            swap: LabelSwap::new(reply_id.clone(), archive_id.clone()),
            transition: Transition::ReplyToArchive { cutoff },
        };
        info!("Starting check for reply to archive");
        let reply_to_archive = traversal
            .sweep(&to_archive)
            .instrument(info_span!("pass", pass = to_archive.transition.name()))
            .await?;

        let to_reply = Pass {
            search_label: archive_id.clone(),
            swap: LabelSwap::new(archive_id, reply_id),
            transition: Transition::ArchiveToReply,
        };
        info!("Starting check for archive to reply");
        let archive_to_reply = traversal
            .sweep(&to_reply)
            .instrument(info_span!("pass", pass = to_reply.transition.name()))
            .await?;

        let summary = RunSummary {
            reply_to_archive,
            archive_to_reply,
        };
        info!(
            threads_reviewed_pass_a = summary.threads_reviewed_pass_a(),
            threads_reviewed_pass_b = summary.threads_reviewed_pass_b(),
            "Run complete"
        );
        Ok(summary)
    }
}

/// Run both passes against `service` with the current time.
pub async fn run(config: &RunConfig, service: Arc<dyn MailService>) -> Result<RunSummary> {
    Labeler::new(service, config.clone()).run().await
}
