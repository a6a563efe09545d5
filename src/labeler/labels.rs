//! Label name → id resolution.

use crate::error::{ConfigError, Result, TransportError};
use crate::gmail::{LabelSummary, MailService};

/// One snapshot of the mailbox's label listing, taken at the start of a run.
#[derive(Debug, Clone)]
pub struct LabelDirectory {
    labels: Vec<LabelSummary>,
}

impl LabelDirectory {
    /// Fetch the full label listing once.
    pub async fn fetch(service: &dyn MailService) -> std::result::Result<Self, TransportError> {
        let labels = service.list_labels().await?;
        tracing::debug!(count = labels.len(), "Fetched label listing");
        Ok(Self { labels })
    }

    /// Id of the first label whose name matches exactly.
    pub fn resolve(&self, name: &str) -> std::result::Result<&str, ConfigError> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.id.as_str())
            .ok_or_else(|| ConfigError::LabelNotFound { name: name.into() })
    }
}

/// Resolve a single label name with a fresh listing.
pub async fn resolve_label_id(service: &dyn MailService, name: &str) -> Result<String> {
    let directory = LabelDirectory::fetch(service).await?;
    Ok(directory.resolve(name)?.to_string())
}
