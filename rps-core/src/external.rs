//! Collaborators the engine relies on but does not own: where the current
//! height comes from and how withdrawn value leaves the engine.

use crate::error::{EscrowError, Result};
use crate::types::PlayerId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of the current block/tick height. Must never go backwards.
pub trait HeightOracle {
    fn current_height(&self) -> u64;
}

impl<T: HeightOracle + ?Sized> HeightOracle for Arc<T> {
    fn current_height(&self) -> u64 {
        (**self).current_height()
    }
}

impl<T: HeightOracle + ?Sized> HeightOracle for &T {
    fn current_height(&self) -> u64 {
        (**self).current_height()
    }
}

/// Height that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualHeight {
    height: AtomicU64,
}

impl ManualHeight {
    pub fn new(height: u64) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    pub fn advance(&self, blocks: u64) -> u64 {
        let previous = self.height.fetch_add(blocks, Ordering::SeqCst);
        previous + blocks
    }

    /// Move to `height`; lower values are ignored.
    pub fn set(&self, height: u64) {
        self.height.fetch_max(height, Ordering::SeqCst);
    }
}

impl HeightOracle for ManualHeight {
    fn current_height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }
}

/// Height derived from wall-clock time: one block per `interval` since `genesis`.
#[derive(Debug, Clone)]
pub struct WallClockHeight {
    genesis: DateTime<Utc>,
    interval: Duration,
}

impl WallClockHeight {
    pub fn new(genesis: DateTime<Utc>, interval: Duration) -> Result<Self> {
        if interval <= Duration::zero() {
            return Err(EscrowError::config("Block interval must be positive"));
        }
        Ok(Self { genesis, interval })
    }

    pub fn height_at(&self, now: DateTime<Utc>) -> u64 {
        let elapsed = now.signed_duration_since(self.genesis);
        if elapsed <= Duration::zero() {
            return 0;
        }
        let interval_ms = self.interval.num_milliseconds().max(1);
        (elapsed.num_milliseconds() / interval_ms) as u64
    }
}

impl HeightOracle for WallClockHeight {
    fn current_height(&self) -> u64 {
        self.height_at(Utc::now())
    }
}

/// Outbound value transfer performed on withdrawal.
pub trait PayoutSink {
    fn transfer(&mut self, to: PlayerId, amount: u64) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub to: PlayerId,
    pub amount: u64,
}

/// Sink that records transfers for a caller to settle later.
#[derive(Debug, Default)]
pub struct PayoutLog {
    payouts: Vec<Payout>,
}

impl PayoutLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }

    pub fn take(&mut self) -> Vec<Payout> {
        std::mem::take(&mut self.payouts)
    }
}

impl PayoutSink for PayoutLog {
    fn transfer(&mut self, to: PlayerId, amount: u64) -> Result<()> {
        self.payouts.push(Payout { to, amount });
        Ok(())
    }
}
