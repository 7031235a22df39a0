//! Actor-based inventory and replenishment pipeline for the smart fridge.
//!
//! Every component runs as its own tokio task with a private mailbox:
//! 1. The fridge owns stock and order history and accepts consume and
//!    order requests
//! 2. Two capacity trackers own the used weight and used space counters
//! 3. An order aggregator is spawned per order request; it asks both
//!    trackers for their headroom, combines the replies in whatever order
//!    they arrive, decides once, and stops
//!
//! Components only communicate through messages. No state is shared.

pub mod aggregator;
pub mod capacity;
pub mod config;
pub mod error;
pub mod events;
pub mod fridge;

pub use aggregator::{AggregatorAddress, AggregatorId, AggregatorReply, Decision, PendingOrder};
pub use capacity::{CapacityHandle, CapacityKind, CapacityState, CapacityTracker};
pub use config::FridgeConfig;
pub use error::{FridgeError, Result};
pub use events::{AbandonReason, FridgeEvent};
pub use fridge::{Fridge, FridgeHandle, FridgeSnapshot};
