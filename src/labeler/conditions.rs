//! Thread transition predicates.
//!
//! Both predicates look at a whole thread snapshot, never a single message,
//! and are pure: no I/O and no clock reads.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;

use crate::error::MalformedDateError;
use crate::gmail::MessageSnapshot;

/// Parenthesized zone names some senders append, e.g. `+0000 (UTC)`.
static ZONE_ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\([A-Za-z]+\)").expect("zone annotation regex"));

/// Leading day-of-week, e.g. `Tue, `. Senders get it wrong often enough that
/// it is dropped rather than cross-checked against the date.
static DAY_OF_WEEK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Za-z]{3},\s*").expect("day-of-week regex"));

/// What is left once cleaned: four-digit year, seconds, numeric UTC offset.
/// Obsolete zone names (`GMT`, `EST`, military letters) do not match.
static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}\s+[A-Za-z]{3}\s+\d{4}\s+\d{1,2}:\d{2}:\d{2}\s+[+-]\d{4}$")
        .expect("numeric date regex")
});

const DATE_FORMAT: &str = "%d %b %Y %H:%M:%S %z";

/// Which way a pass moves threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Every message read and dated at or before `cutoff`.
    ReplyToArchive { cutoff: DateTime<Utc> },
    /// At least one message unread.
    ArchiveToReply,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReplyToArchive { .. } => "reply_to_archive",
            Self::ArchiveToReply => "archive_to_reply",
        }
    }

    /// Decide whether the thread should move.
    pub fn applies(&self, messages: &[MessageSnapshot]) -> Result<bool, MalformedDateError> {
        match self {
            Self::ReplyToArchive { cutoff } => reply_to_archive(messages, *cutoff),
            Self::ArchiveToReply => Ok(archive_to_reply(messages)),
        }
    }
}

/// True iff every message is read and none is newer than `cutoff`.
///
/// Messages are checked in thread order. Each message's `Date` is parsed
/// before its read state is looked at, so a malformed date on any message up
/// to the first disqualifying one fails the whole check.
pub fn reply_to_archive(
    messages: &[MessageSnapshot],
    cutoff: DateTime<Utc>,
) -> Result<bool, MalformedDateError> {
    for message in messages {
        let sent = message_date(message)?;
        if message.is_unread() || sent > cutoff {
            return Ok(false);
        }
    }
    Ok(true)
}

/// True iff any message in the thread is unread.
pub fn archive_to_reply(messages: &[MessageSnapshot]) -> bool {
    messages.iter().any(MessageSnapshot::is_unread)
}

/// Strip zone annotations and the day-of-week from a raw `Date` value.
pub fn clean_date_header(raw: &str) -> String {
    let without_zone = ZONE_ANNOTATION.replace_all(raw, "");
    DAY_OF_WEEK.replace(&without_zone, "").trim().to_string()
}

/// Parse a raw `Date` header value as an RFC 2822 timestamp with a numeric
/// UTC offset. The error is a human-readable reason.
pub fn parse_date_header(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    let cleaned = clean_date_header(raw);
    if !NUMERIC_DATE.is_match(&cleaned) {
        return Err(format!("expected `DD Mon YYYY HH:MM:SS +HHMM`, got {cleaned:?}"));
    }
    DateTime::parse_from_str(&cleaned, DATE_FORMAT).map_err(|e| e.to_string())
}

/// The message's `Date` header as an instant.
pub fn message_date(message: &MessageSnapshot) -> Result<DateTime<FixedOffset>, MalformedDateError> {
    let raw = message
        .header("Date")
        .ok_or_else(|| MalformedDateError::Missing {
            message_id: message.id.clone(),
        })?;
    parse_date_header(raw).map_err(|e| MalformedDateError::Unparsable {
        message_id: message.id.clone(),
        value: raw.to_string(),
        reason: e,
    })
}
