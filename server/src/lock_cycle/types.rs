//! Configuration and outcome types of the lock-cycle engine.

use crate::model::Message;
use serde::Deserialize;
use std::time::Duration;

/// When messages examined during a search, but not targeted, are released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonPolicy {
    /// Abandon every non-matching message before the next receive.
    ///
    /// At most one batch is locked at a time until the broker hands an
    /// abandoned message back. From then on examined messages are held as
    /// under `Deferred`, so targets beyond the first batch stay reachable.
    #[default]
    PerBatch,
    /// Keep non-matching messages locked until the search ends, then abandon
    /// all of them.
    ///
    /// Reaches targets anywhere in the backlog at the cost of holding every
    /// examined lock for the duration of the search.
    Deferred,
}

/// Tunables of the lock-cycle engine.
///
/// Every field is optional so the struct can be embedded in a layered
/// configuration; accessors supply the defaults.
///
/// # Examples
///
/// ```no_run
/// use server::lock_cycle::{AbandonPolicy, LockCycleConfig};
///
/// let config = LockCycleConfig::default();
/// assert_eq!(config.fetch_batch_size(), 100);
/// assert_eq!(config.abandon_policy(), AbandonPolicy::PerBatch);
///
/// let config = LockCycleConfig::new(10).with_abandon_policy(AbandonPolicy::Deferred);
/// assert_eq!(config.fetch_batch_size(), 10);
/// ```
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct LockCycleConfig {
    /// Messages requested per receive call (default: 100)
    fetch_batch_size: Option<u32>,
    /// Per-receive timeout for purge and transfer in seconds (default: 5)
    bulk_receive_timeout_secs: Option<u64>,
    /// Per-receive timeout for single-message searches in seconds (default: 60)
    search_receive_timeout_secs: Option<u64>,
    /// Release policy for examined messages (default: per_batch)
    abandon_policy: Option<AbandonPolicy>,
    /// Default number of messages listed by a peek (default: 100)
    peek_count: Option<u32>,
}

impl LockCycleConfig {
    pub fn new(fetch_batch_size: u32) -> Self {
        Self {
            fetch_batch_size: Some(fetch_batch_size),
            ..Default::default()
        }
    }

    pub fn with_abandon_policy(mut self, policy: AbandonPolicy) -> Self {
        self.abandon_policy = Some(policy);
        self
    }

    pub fn with_bulk_receive_timeout_secs(mut self, secs: u64) -> Self {
        self.bulk_receive_timeout_secs = Some(secs);
        self
    }

    pub fn with_search_receive_timeout_secs(mut self, secs: u64) -> Self {
        self.search_receive_timeout_secs = Some(secs);
        self
    }

    pub fn fetch_batch_size(&self) -> u32 {
        self.fetch_batch_size.unwrap_or(100)
    }

    pub fn bulk_receive_timeout_secs(&self) -> u64 {
        self.bulk_receive_timeout_secs.unwrap_or(5)
    }

    pub fn search_receive_timeout_secs(&self) -> u64 {
        self.search_receive_timeout_secs.unwrap_or(60)
    }

    pub fn abandon_policy(&self) -> AbandonPolicy {
        self.abandon_policy.unwrap_or_default()
    }

    pub fn peek_count(&self) -> u32 {
        self.peek_count.unwrap_or(100)
    }

    pub fn bulk_receive_timeout(&self) -> Duration {
        Duration::from_secs(self.bulk_receive_timeout_secs())
    }

    pub fn search_receive_timeout(&self) -> Duration {
        Duration::from_secs(self.search_receive_timeout_secs())
    }
}

/// Result of a search over one backlog.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The target was located and resolved; carries its snapshot at receive time
    Found(Message),
    NotFound,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found(_))
    }

    pub fn into_message(self) -> Option<Message> {
        match self {
            SearchOutcome::Found(message) => Some(message),
            SearchOutcome::NotFound => None,
        }
    }
}

/// Result of resubmitting a dead-lettered message.
#[derive(Debug, Clone, PartialEq)]
pub enum ResubmitOutcome {
    /// Clone sent to the main backlog and the original removed from the dead-letter sub-queue
    Resubmitted(Message),
    /// Clone sent, but the original was no longer in the dead-letter sub-queue
    /// when it was searched for removal
    OriginalNotRemoved(Message),
    /// No message with the requested sequence number in the dead-letter sub-queue
    NotFound,
}
