//! Outcome notifications published by the fridge and its order aggregators.

use domain::{OrderRecord, Product};
use serde::{Deserialize, Serialize};

use crate::aggregator::AggregatorId;
use crate::capacity::CapacityKind;

/// Number of events buffered per subscriber before it starts lagging.
pub(crate) const EVENT_BUFFER: usize = 256;

/// Why an order aggregator stopped without deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbandonReason {
    /// The reply timeout elapsed.
    TimedOut,
    /// Every reply address was dropped before both replies arrived.
    TrackersGone,
}

/// Something observable that happened in the replenishment pipeline.
///
/// Events are informational. Nothing in the pipeline depends on them being
/// received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FridgeEvent {
    /// One instance of a product was taken out.
    Consumed { product: Product, remaining: usize },

    /// A consume request found no matching product.
    ConsumeMissed { product: Product },

    /// The last instance of a product was consumed and a reorder was queued.
    ReplenishmentTriggered { product: Product },

    /// An order aggregator was spawned for a product.
    OrderRequested {
        aggregator_id: AggregatorId,
        product: Product,
    },

    /// An approved order was added to stock and to the order history.
    StockCommitted {
        aggregator_id: AggregatorId,
        order: OrderRecord,
    },

    /// An order did not fit the remaining weight or space.
    OrderRejected {
        aggregator_id: AggregatorId,
        product: Product,
        available_weight: i64,
        available_space: i64,
    },

    /// An order aggregator stopped before both tracker replies arrived.
    OrderAbandoned {
        aggregator_id: AggregatorId,
        product: Product,
        missing: Vec<CapacityKind>,
        reason: AbandonReason,
    },
}

impl FridgeEvent {
    /// Returns the event name.
    pub fn event_type(&self) -> &'static str {
        match self {
            FridgeEvent::Consumed { .. } => "Consumed",
            FridgeEvent::ConsumeMissed { .. } => "ConsumeMissed",
            FridgeEvent::ReplenishmentTriggered { .. } => "ReplenishmentTriggered",
            FridgeEvent::OrderRequested { .. } => "OrderRequested",
            FridgeEvent::StockCommitted { .. } => "StockCommitted",
            FridgeEvent::OrderRejected { .. } => "OrderRejected",
            FridgeEvent::OrderAbandoned { .. } => "OrderAbandoned",
        }
    }

    /// Returns true for the events that end an order aggregator's life.
    pub fn is_order_outcome(&self) -> bool {
        matches!(
            self,
            FridgeEvent::StockCommitted { .. }
                | FridgeEvent::OrderRejected { .. }
                | FridgeEvent::OrderAbandoned { .. }
        )
    }
}
