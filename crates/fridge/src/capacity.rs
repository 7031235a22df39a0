//! Capacity trackers: one actor per bounded counter (weight, space).

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::aggregator::{AggregatorAddress, AggregatorReply};
use crate::error::{FridgeError, Result};

/// Which resource a tracker counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapacityKind {
    /// Total unit weight of the stocked products.
    Weight,
    /// Number of stocked items (slots).
    Space,
}

impl CapacityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapacityKind::Weight => "weight",
            CapacityKind::Space => "space",
        }
    }

    fn actor_name(&self) -> &'static str {
        match self {
            CapacityKind::Weight => "weight tracker",
            CapacityKind::Space => "space tracker",
        }
    }

    /// Wraps an available figure in the reply variant for this tracker.
    pub fn reply(&self, available: i64) -> AggregatorReply {
        match self {
            CapacityKind::Weight => AggregatorReply::WeightAvailable(available),
            CapacityKind::Space => AggregatorReply::SpaceAvailable(available),
        }
    }
}

impl std::fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A used-amount counter with its limit.
///
/// `current` follows every delta exactly, even past `max` or below zero, so it
/// converges to the real stock once all updates are processed. Only
/// [`available`](Self::available) is bounded to `[0, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityState {
    pub current: i64,
    pub max: i64,
}

impl CapacityState {
    pub fn new(current: i64, max: i64) -> Self {
        Self {
            current,
            max: max.max(0),
        }
    }

    /// Remaining headroom, never negative and never above `max`.
    pub fn available(&self) -> i64 {
        self.max.saturating_sub(self.current).clamp(0, self.max)
    }

    /// Whether `0 <= current <= max` holds.
    pub fn in_range(&self) -> bool {
        (0..=self.max).contains(&self.current)
    }

    /// Applies a signed delta. Returns false if the counter left `[0, max]`.
    pub fn apply(&mut self, delta: i64) -> bool {
        self.current = self.current.saturating_add(delta);
        self.in_range()
    }
}

pub(crate) enum CapacityCommand {
    Add(i64),
    Remove(i64),
    GetAvailable(AggregatorAddress),
    State(oneshot::Sender<CapacityState>),
}

/// Actor owning one capacity counter.
///
/// The mailbox is drained strictly in order, so queries always observe every
/// delta that was sent before them.
pub struct CapacityTracker {
    kind: CapacityKind,
    state: CapacityState,
    mailbox: mpsc::UnboundedReceiver<CapacityCommand>,
}

impl CapacityTracker {
    /// Spawns a tracker task seeded with `current` used out of `max`.
    ///
    /// The task stops once every handle has been dropped.
    pub fn spawn(kind: CapacityKind, current: i64, max: i64) -> CapacityHandle {
        let (sender, mailbox) = mpsc::unbounded_channel();
        let state = CapacityState::new(current, max);
        if !state.in_range() {
            tracing::warn!(
                tracker = kind.as_str(),
                current = state.current,
                max = state.max,
                "initial capacity out of range"
            );
        }

        let tracker = Self {
            kind,
            state,
            mailbox,
        };
        tokio::spawn(tracker.run());

        CapacityHandle { kind, sender }
    }

    async fn run(mut self) {
        tracing::info!(
            tracker = self.kind.as_str(),
            current = self.state.current,
            max = self.state.max,
            "capacity tracker started"
        );
        self.publish_gauge();

        while let Some(command) = self.mailbox.recv().await {
            self.handle(command);
        }

        tracing::info!(tracker = self.kind.as_str(), "capacity tracker stopped");
    }

    fn handle(&mut self, command: CapacityCommand) {
        match command {
            CapacityCommand::Add(amount) => self.apply(amount, "added"),
            CapacityCommand::Remove(amount) => self.apply(amount.saturating_neg(), "removed"),
            CapacityCommand::GetAvailable(reply_to) => {
                let available = self.state.available();
                tracing::debug!(
                    tracker = self.kind.as_str(),
                    aggregator_id = %reply_to.id(),
                    available,
                    "answering availability query"
                );
                // The aggregator may already have given up.
                if reply_to.tell(self.kind.reply(available)).is_err() {
                    tracing::debug!(
                        tracker = self.kind.as_str(),
                        aggregator_id = %reply_to.id(),
                        "aggregator gone, reply dropped"
                    );
                }
            }
            CapacityCommand::State(respond_to) => {
                let _ = respond_to.send(self.state);
            }
        }
    }

    fn apply(&mut self, delta: i64, action: &'static str) {
        if !self.state.apply(delta) {
            tracing::warn!(
                tracker = self.kind.as_str(),
                delta,
                current = self.state.current,
                max = self.state.max,
                "capacity out of range, fridge over- or under-counted"
            );
        } else {
            tracing::info!(
                tracker = self.kind.as_str(),
                amount = delta.unsigned_abs(),
                current = self.state.current,
                max = self.state.max,
                "capacity {action}"
            );
        }
        self.publish_gauge();
    }

    fn publish_gauge(&self) {
        metrics::gauge!("fridge_capacity_used", "tracker" => self.kind.as_str())
            .set(self.state.current as f64);
    }
}

/// Cloneable address of a running [`CapacityTracker`].
#[derive(Clone)]
pub struct CapacityHandle {
    kind: CapacityKind,
    sender: mpsc::UnboundedSender<CapacityCommand>,
}

impl CapacityHandle {
    pub fn kind(&self) -> CapacityKind {
        self.kind
    }

    /// Increases the used amount.
    pub fn add(&self, amount: i64) -> Result<()> {
        self.tell(CapacityCommand::Add(amount))
    }

    /// Decreases the used amount.
    pub fn remove(&self, amount: i64) -> Result<()> {
        self.tell(CapacityCommand::Remove(amount))
    }

    /// Asks the tracker to send its headroom to `reply_to`.
    pub fn get_available(&self, reply_to: AggregatorAddress) -> Result<()> {
        self.tell(CapacityCommand::GetAvailable(reply_to))
    }

    /// Reads the counter after every previously sent delta has been applied.
    pub async fn state(&self) -> Result<CapacityState> {
        let (respond_to, response) = oneshot::channel();
        self.tell(CapacityCommand::State(respond_to))?;
        response.await.map_err(|_| FridgeError::ReplyDropped {
            actor: self.kind.actor_name(),
        })
    }

    fn tell(&self, command: CapacityCommand) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| FridgeError::MailboxClosed {
                actor: self.kind.actor_name(),
            })
    }
}

#[cfg(test)]
impl CapacityHandle {
    /// Builds a handle over a bare channel so tests can play the tracker.
    pub(crate) fn detached(kind: CapacityKind) -> (Self, mpsc::UnboundedReceiver<CapacityCommand>) {
        let (sender, mailbox) = mpsc::unbounded_channel();
        (Self { kind, sender }, mailbox)
    }
}
