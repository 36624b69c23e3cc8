//! Page boundaries for descending partition scans.

use super::{ChatMessage, ClusteringKey};
use chrono::{DateTime, Utc};

/// Upper boundary of a partition scan.
///
/// Scans walk the partition newest-first and return only rows the cursor
/// admits.
///
/// - [`PageCursor::latest`] admits rows at or before the instant (the
///   default first page, "now").
/// - [`PageCursor::before`] admits rows strictly older than the timestamp.
///   Two rows sharing the boundary millisecond are both skipped.
/// - [`PageCursor::after`] admits rows strictly after the given message in
///   scan order, using the message identifier as a tiebreak, so pages never
///   split or repeat a same-millisecond cluster.
///
/// # Examples
///
/// ```
/// use chatstore::chat::domain::{ClusteringKey, MessageId, PageCursor};
/// use chrono::{TimeDelta, Utc};
///
/// let now = Utc::now();
/// let older = ClusteringKey { timestamp: now - TimeDelta::seconds(1), message_id: MessageId::new() };
/// let same = ClusteringKey { timestamp: now, message_id: MessageId::new() };
///
/// assert!(PageCursor::before(now).admits(&older));
/// assert!(!PageCursor::before(now).admits(&same));
/// assert!(PageCursor::latest(now).admits(&same));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    /// Rows with `timestamp <= instant`.
    Latest(DateTime<Utc>),
    /// Rows with `timestamp < instant`.
    Before(DateTime<Utc>),
    /// Rows with `(timestamp, message_id) < key`.
    After(ClusteringKey),
}

impl PageCursor {
    /// First-page cursor anchored at `now`.
    #[must_use]
    pub const fn latest(now: DateTime<Utc>) -> Self {
        Self::Latest(now)
    }

    /// Strict timestamp cursor.
    #[must_use]
    pub const fn before(timestamp: DateTime<Utc>) -> Self {
        Self::Before(timestamp)
    }

    /// Composite cursor continuing after `last`, the final item of the
    /// previous page.
    #[must_use]
    pub const fn after(last: &ChatMessage) -> Self {
        Self::After(last.clustering_key())
    }

    /// Returns `true` when a row with `key` belongs beyond this boundary.
    #[must_use]
    pub fn admits(&self, key: &ClusteringKey) -> bool {
        match self {
            Self::Latest(instant) => key.timestamp <= *instant,
            Self::Before(instant) => key.timestamp < *instant,
            Self::After(boundary) => key < boundary,
        }
    }
}

impl From<DateTime<Utc>> for PageCursor {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self::before(timestamp)
    }
}
