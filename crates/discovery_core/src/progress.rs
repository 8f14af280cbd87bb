use std::time::Duration;

/// Progress shown while the submission request is in flight.
pub const SUBMITTING_PROGRESS: u8 = 5;
/// Progress shown once the job is terminal and results are being fetched.
pub const FETCHING_PROGRESS: u8 = 90;
/// Only reached when results have actually been fetched.
pub const COMPLETE_PROGRESS: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    Normal,
    Debug,
}

/// Poll cadence and the heuristic progress curve for one poll loop.
///
/// The estimate is a display aid, not a measured completion fraction:
/// `base + min(cap_extent, poll_count * cap_extent / max_polls_assumed)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollProfile {
    pub interval: Duration,
    pub base: u8,
    pub cap_extent: u8,
    pub max_polls_assumed: u32,
    /// Transport errors tolerated in a row before the loop gives up.
    pub max_consecutive_errors: u32,
}

impl PollProfile {
    pub fn normal() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            base: 10,
            cap_extent: 80,
            max_polls_assumed: 20,
            max_consecutive_errors: 3,
        }
    }

    /// Debug lookups poll faster and stop at the first transport error.
    pub fn debug() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            base: 10,
            cap_extent: 60,
            max_polls_assumed: 15,
            max_consecutive_errors: 0,
        }
    }

    pub fn estimate(&self, poll_count: u32) -> u8 {
        let cap = u64::from(self.cap_extent);
        let extent = if self.max_polls_assumed == 0 {
            cap
        } else {
            (u64::from(poll_count) * cap / u64::from(self.max_polls_assumed)).min(cap)
        };
        let estimate = u64::from(self.base) + extent;
        // Never claim completion from polling alone.
        estimate.min(u64::from(COMPLETE_PROGRESS - 1)) as u8
    }
}
