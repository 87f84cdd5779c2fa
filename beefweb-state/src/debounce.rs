//! Grace window for idle player updates
//!
//! While the player switches tracks it briefly reports no active item. The
//! gate holds such an idle snapshot for a grace window and drops it if any
//! other player update arrives first, so subscribers never see the blip.

use std::sync::Arc;
use std::time::Duration;

use beefweb_api::PlayerSnapshot;
use tokio::time::Instant;

/// What to do with a player snapshot offered to the gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Accept the snapshot now
    Deliver(Arc<PlayerSnapshot>),
    /// Snapshot is held until the grace window elapses
    Held,
}

#[derive(Debug)]
struct HeldUpdate {
    snapshot: Arc<PlayerSnapshot>,
    deadline: Instant,
}

/// Single-slot hold for idle player snapshots
#[derive(Debug)]
pub struct DebounceGate {
    grace: Duration,
    pending: Option<HeldUpdate>,
}

impl DebounceGate {
    pub fn new(grace: Duration) -> Self {
        Self { grace, pending: None }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn is_holding(&self) -> bool {
        self.pending.is_some()
    }

    /// Offer a freshly built player snapshot
    ///
    /// Any held snapshot is discarded first. The new one is held only if it
    /// is idle, the grace window is non-zero, and a player snapshot had
    /// already been accepted (`had_previous`); the first snapshot after
    /// connecting is always delivered.
    pub fn offer(&mut self, snapshot: Arc<PlayerSnapshot>, had_previous: bool) -> GateDecision {
        if self.pending.take().is_some() {
            tracing::trace!("superseding held idle player update");
        }

        if snapshot.is_idle() && !self.grace.is_zero() && had_previous {
            tracing::debug!(grace_ms = self.grace.as_millis() as u64, "holding idle player update");
            self.pending = Some(HeldUpdate {
                snapshot,
                deadline: Instant::now() + self.grace,
            });
            GateDecision::Held
        } else {
            GateDecision::Deliver(snapshot)
        }
    }

    /// Drop the held snapshot, if any
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Wait for the held snapshot's grace window to elapse and release it
    ///
    /// Pends forever while nothing is held. Cancel safe: dropping the future
    /// before the deadline leaves the hold in place.
    pub async fn expired(&mut self) -> Arc<PlayerSnapshot> {
        let deadline = match &self.pending {
            Some(held) => held.deadline,
            None => return std::future::pending().await,
        };

        tokio::time::sleep_until(deadline).await;

        match self.pending.take() {
            Some(held) => held.snapshot,
            None => std::future::pending().await,
        }
    }
}
