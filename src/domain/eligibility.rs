//! Claim eligibility and the countdown projection derived from it

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock unix seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Next-claim timestamp read from the faucet for one address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimEligibility {
    pub next_claim_at: u64,
}

impl ClaimEligibility {
    pub fn new(next_claim_at: u64) -> Self {
        Self { next_claim_at }
    }

    /// Claims are allowed at the boundary instant itself
    pub fn is_eligible(&self, now: u64) -> bool {
        now >= self.next_claim_at
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.next_claim_at.saturating_sub(now)
    }
}

/// `"{h}h {m}m {s}s"`
pub fn format_countdown(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

/// Countdown sampled against the wall clock at a fixed interval
///
/// Only a display projection: the text is recomputed from the clock on each
/// sample, and eligibility after a claim comes from a fresh chain read.
#[derive(Debug, Clone)]
pub struct Countdown {
    eligibility: ClaimEligibility,
    interval: Duration,
    last_sample: Option<u64>,
    display: Option<String>,
}

impl Countdown {
    pub const INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(eligibility: ClaimEligibility) -> Self {
        Self {
            eligibility,
            interval: Self::INTERVAL,
            last_sample: None,
            display: None,
        }
    }

    pub fn eligibility(&self) -> ClaimEligibility {
        self.eligibility
    }

    /// Sample the clock; returns true when the display changed
    ///
    /// Samples closer together than the interval are ignored.
    pub fn tick(&mut self, now: u64) -> bool {
        if let Some(last) = self.last_sample {
            if now < last + self.interval.as_secs().max(1) {
                return false;
            }
        }
        self.last_sample = Some(now);
        let next = if self.eligibility.is_eligible(now) {
            None
        } else {
            Some(format_countdown(self.eligibility.remaining(now)))
        };
        let changed = next != self.display;
        self.display = next;
        changed
    }

    /// Remaining time text, or `None` once the claim is available
    pub fn display(&self) -> Option<&str> {
        self.display.as_deref()
    }

    pub fn is_running(&self) -> bool {
        self.display.is_some()
    }
}
