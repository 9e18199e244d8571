//! First-settled-wins racing and tag-and-drop staleness checks.

use std::future::Future;

use tokio::time::{Duration, sleep};

/// Result of racing a future against a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T> {
    Completed(T),
    TimedOut,
}

/// Run `primary` against a `limit` timer; whichever settles first wins.
///
/// The loser is dropped, so a primary that finishes after the timer can never
/// deliver its value. When both are ready on the same poll the primary wins.
pub async fn first_settled<F>(primary: F, limit: Duration) -> Settled<F::Output>
where
    F: Future,
{
    tokio::select! {
        biased;
        out = primary => Settled::Completed(out),
        _ = sleep(limit) => Settled::TimedOut,
    }
}

/// Identifies which transition an async result was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTag {
    pub epoch: u64,
    pub identity_id: String,
}

/// Monotonic transition counter.
///
/// Every transition advances the epoch; a result is only applied if its tag
/// still names the current epoch and the current identity.
#[derive(Debug, Default)]
pub struct Epoch {
    current: u64,
}

impl Epoch {
    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn advance(&mut self) -> u64 {
        self.current = self.current.wrapping_add(1);
        self.current
    }

    pub fn tag(&self, identity_id: impl Into<String>) -> ResolutionTag {
        ResolutionTag {
            epoch: self.current,
            identity_id: identity_id.into(),
        }
    }

    pub fn is_current(&self, tag: &ResolutionTag, identity_id: Option<&str>) -> bool {
        tag.epoch == self.current && identity_id == Some(tag.identity_id.as_str())
    }
}
