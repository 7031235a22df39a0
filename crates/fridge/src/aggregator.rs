//! Order aggregator: a one-shot actor deciding a single order request.
//!
//! ```text
//! Start ──► AwaitingReplies ──► Decide ──► Terminated
//!                 │                           ▲
//!                 └──── timeout / trackers gone
//! ```
//!
//! On start the aggregator sends `GetAvailable` to both capacity trackers.
//! Replies may arrive in either order. Once both figures are known it decides
//! exactly once: stock the product if it fits, otherwise log a rejection.

use std::time::{Duration, Instant};

use domain::Product;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::capacity::{CapacityHandle, CapacityKind};
use crate::error::{FridgeError, Result};
use crate::events::{AbandonReason, FridgeEvent};
use crate::fridge::FridgeHandle;

/// Unique identity of an order aggregator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatorId(Uuid);

impl AggregatorId {
    /// Creates a new random aggregator ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AggregatorId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AggregatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A capacity tracker's answer to an availability query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorReply {
    WeightAvailable(i64),
    SpaceAvailable(i64),
}

/// Return address handed to the trackers so they can reply to one aggregator.
#[derive(Debug, Clone)]
pub struct AggregatorAddress {
    id: AggregatorId,
    sender: mpsc::UnboundedSender<AggregatorReply>,
}

impl AggregatorAddress {
    pub fn new(id: AggregatorId, sender: mpsc::UnboundedSender<AggregatorReply>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> AggregatorId {
        self.id
    }

    /// Delivers a reply. Fails once the aggregator has terminated.
    pub fn tell(&self, reply: AggregatorReply) -> Result<()> {
        self.sender
            .send(reply)
            .map_err(|_| FridgeError::MailboxClosed {
                actor: "order aggregator",
            })
    }
}

/// Outcome of combining both availability figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The product fits: stock it.
    Stock,
    /// The product does not fit the remaining weight or space.
    Reject {
        available_weight: i64,
        available_space: i64,
    },
}

impl Decision {
    /// The product fits when its weight is strictly below the remaining weight
    /// and at least one slot is free.
    pub fn evaluate(product: &Product, available_weight: i64, available_space: i64) -> Self {
        if available_weight > product.unit_weight() && available_space > 0 {
            Decision::Stock
        } else {
            Decision::Reject {
                available_weight,
                available_space,
            }
        }
    }
}

/// Fan-in state of one order request: the product and the two pending slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    product: Product,
    available_weight: Option<i64>,
    available_space: Option<i64>,
}

impl PendingOrder {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            available_weight: None,
            available_space: None,
        }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Stores a reply and returns the decision once both figures are known.
    pub fn record(&mut self, reply: AggregatorReply) -> Option<Decision> {
        match reply {
            AggregatorReply::WeightAvailable(weight) => self.available_weight = Some(weight),
            AggregatorReply::SpaceAvailable(space) => self.available_space = Some(space),
        }

        match (self.available_weight, self.available_space) {
            (Some(weight), Some(space)) => Some(Decision::evaluate(&self.product, weight, space)),
            _ => None,
        }
    }

    /// Trackers that have not replied yet.
    pub fn missing(&self) -> Vec<CapacityKind> {
        let mut missing = Vec::new();
        if self.available_weight.is_none() {
            missing.push(CapacityKind::Weight);
        }
        if self.available_space.is_none() {
            missing.push(CapacityKind::Space);
        }
        missing
    }
}

enum Outcome {
    Decided(Decision),
    Abandoned(AbandonReason),
}

/// The per-request actor. Created by the fridge for every order request.
pub(crate) struct OrderAggregator {
    id: AggregatorId,
    pending: PendingOrder,
    mailbox: mpsc::UnboundedReceiver<AggregatorReply>,
    fridge: FridgeHandle,
    events: broadcast::Sender<FridgeEvent>,
    reply_timeout: Option<Duration>,
}

impl OrderAggregator {
    /// Queries both trackers and spawns the aggregator task.
    pub(crate) fn spawn(
        product: Product,
        fridge: FridgeHandle,
        weight: &CapacityHandle,
        space: &CapacityHandle,
        events: broadcast::Sender<FridgeEvent>,
        reply_timeout: Option<Duration>,
    ) -> AggregatorId {
        let id = AggregatorId::new();
        let (sender, mailbox) = mpsc::unbounded_channel();
        let address = AggregatorAddress::new(id, sender);

        for tracker in [weight, space] {
            if let Err(e) = tracker.get_available(address.clone()) {
                tracing::warn!(aggregator_id = %id, error = %e, "availability query not delivered");
            }
        }
        // Only the trackers hold the address from here on.
        drop(address);

        let aggregator = Self {
            id,
            pending: PendingOrder::new(product),
            mailbox,
            fridge,
            events,
            reply_timeout,
        };
        tokio::spawn(aggregator.run());

        id
    }

    async fn run(mut self) {
        tracing::info!(
            aggregator_id = %self.id,
            product = self.pending.product().name(),
            "order aggregator started"
        );
        let started = Instant::now();
        let deadline = self
            .reply_timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);

        let outcome = loop {
            let next = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.mailbox.recv()).await {
                        Ok(next) => next,
                        Err(_) => break Outcome::Abandoned(AbandonReason::TimedOut),
                    }
                }
                None => self.mailbox.recv().await,
            };

            let Some(reply) = next else {
                break Outcome::Abandoned(AbandonReason::TrackersGone);
            };

            if let Some(decision) = self.pending.record(reply) {
                break Outcome::Decided(decision);
            }
        };

        // Terminated: late replies are refused from here on.
        self.mailbox.close();

        match outcome {
            Outcome::Decided(decision) => self.complete(decision),
            Outcome::Abandoned(reason) => self.abandon(reason),
        }

        metrics::histogram!("fridge_order_decision_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(aggregator_id = %self.id, "order aggregator stopped");
    }

    fn complete(&self, decision: Decision) {
        let product = self.pending.product();
        match decision {
            Decision::Stock => {
                tracing::info!(
                    aggregator_id = %self.id,
                    product = product.name(),
                    "order approved"
                );
                if let Err(e) = self.fridge.commit_stock(product.clone(), self.id) {
                    tracing::warn!(aggregator_id = %self.id, error = %e, "approved order lost");
                }
            }
            Decision::Reject {
                available_weight,
                available_space,
            } => {
                metrics::counter!("fridge_orders_rejected_total").increment(1);
                tracing::warn!(
                    aggregator_id = %self.id,
                    product = product.name(),
                    available_space,
                    available_weight,
                    order_weight = product.unit_weight(),
                    "fridge can't be stocked"
                );
                let _ = self.events.send(FridgeEvent::OrderRejected {
                    aggregator_id: self.id,
                    product: product.clone(),
                    available_weight,
                    available_space,
                });
            }
        }
    }

    fn abandon(&self, reason: AbandonReason) {
        let missing = self.pending.missing();
        metrics::counter!("fridge_orders_abandoned_total").increment(1);
        tracing::warn!(
            aggregator_id = %self.id,
            product = self.pending.product().name(),
            ?missing,
            ?reason,
            "order abandoned before both capacity replies arrived"
        );
        let _ = self.events.send(FridgeEvent::OrderAbandoned {
            aggregator_id: self.id,
            product: self.pending.product().clone(),
            missing,
            reason,
        });
    }
}
