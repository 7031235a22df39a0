//! The fridge actor: sole owner of stock and order history.

use std::time::Duration;

use domain::{OrderRecord, Product, Stock};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::aggregator::{AggregatorId, OrderAggregator};
use crate::capacity::{CapacityHandle, CapacityKind, CapacityState, CapacityTracker};
use crate::config::FridgeConfig;
use crate::error::{FridgeError, Result};
use crate::events::{EVENT_BUFFER, FridgeEvent};

pub(crate) enum FridgeCommand {
    RequestOrder(Product),
    Consume(Product),
    CommitStock {
        product: Product,
        aggregator_id: AggregatorId,
    },
    DisplayStock,
    DisplayOrderHistory,
    Inspect(oneshot::Sender<(Stock, Vec<OrderRecord>)>),
}

/// Read-only view of the fridge and both trackers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FridgeSnapshot {
    pub stock: Stock,
    pub orders: Vec<OrderRecord>,
    pub weight: CapacityState,
    pub space: CapacityState,
}

/// Inventory owner actor.
///
/// Stock only changes through `Consume` (one instance out) and `CommitStock`
/// (one instance in, sent by an order aggregator). Tracker counters follow
/// each stock change through separate fire-and-forget messages, so they are
/// not updated atomically with the stock.
pub struct Fridge {
    stock: Stock,
    orders: Vec<OrderRecord>,
    weight: CapacityHandle,
    space: CapacityHandle,
    events: broadcast::Sender<FridgeEvent>,
    mailbox: mpsc::UnboundedReceiver<FridgeCommand>,
    myself: mpsc::WeakUnboundedSender<FridgeCommand>,
    reply_timeout: Option<Duration>,
}

impl Fridge {
    /// Spawns the fridge and its two capacity trackers.
    ///
    /// Trackers are seeded from the initial stock. The fridge task ends once
    /// every [`FridgeHandle`] (including those held by in-flight order
    /// aggregators) has been dropped and the mailbox is drained. A reorder
    /// triggered by a `Consume` still queued at that point is logged and
    /// dropped.
    pub fn spawn(config: FridgeConfig) -> (FridgeHandle, JoinHandle<()>) {
        let stock: Stock = config.initial_stock.into_iter().collect();
        let weight = CapacityTracker::spawn(
            CapacityKind::Weight,
            stock.total_weight(),
            config.max_weight,
        );
        let space =
            CapacityTracker::spawn(CapacityKind::Space, stock.len() as i64, config.max_space);

        let (sender, mailbox) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let fridge = Self {
            stock,
            orders: Vec::new(),
            weight: weight.clone(),
            space: space.clone(),
            events: events.clone(),
            mailbox,
            myself: sender.downgrade(),
            reply_timeout: config.reply_timeout,
        };
        let join = tokio::spawn(fridge.run());

        let handle = FridgeHandle {
            sender,
            events,
            weight,
            space,
        };
        (handle, join)
    }

    async fn run(mut self) {
        tracing::info!(items = self.stock.len(), "fridge started");

        while let Some(command) = self.mailbox.recv().await {
            self.handle(command);
        }

        tracing::info!(
            items = self.stock.len(),
            orders = self.orders.len(),
            "fridge stopped"
        );
    }

    fn handle(&mut self, command: FridgeCommand) {
        match command {
            FridgeCommand::RequestOrder(product) => self.on_request_order(product),
            FridgeCommand::Consume(product) => self.on_consume(product),
            FridgeCommand::CommitStock {
                product,
                aggregator_id,
            } => self.on_commit_stock(product, aggregator_id),
            FridgeCommand::DisplayStock => self.on_display_stock(),
            FridgeCommand::DisplayOrderHistory => self.on_display_order_history(),
            FridgeCommand::Inspect(respond_to) => {
                let _ = respond_to.send((self.stock.clone(), self.orders.clone()));
            }
        }
    }

    #[tracing::instrument(skip_all, fields(product = product.name()))]
    fn on_request_order(&mut self, product: Product) {
        // Aggregators commit through a strong handle; without one nobody is
        // left to receive the result.
        let Some(sender) = self.myself.upgrade() else {
            tracing::warn!("fridge shutting down, order request dropped");
            return;
        };
        let fridge = FridgeHandle {
            sender,
            events: self.events.clone(),
            weight: self.weight.clone(),
            space: self.space.clone(),
        };

        metrics::counter!("fridge_orders_requested_total").increment(1);
        let aggregator_id = OrderAggregator::spawn(
            product.clone(),
            fridge,
            &self.weight,
            &self.space,
            self.events.clone(),
            self.reply_timeout,
        );
        tracing::info!(%aggregator_id, "order aggregator spawned");
        self.publish(FridgeEvent::OrderRequested {
            aggregator_id,
            product,
        });
    }

    #[tracing::instrument(skip_all, fields(product = product.name()))]
    fn on_consume(&mut self, product: Product) {
        let remaining = match self.stock.remove_one(&product) {
            Ok(remaining) => remaining,
            Err(e) => {
                metrics::counter!("fridge_consume_missed_total").increment(1);
                tracing::info!(reason = %e, "nothing to consume");
                self.publish(FridgeEvent::ConsumeMissed { product });
                return;
            }
        };

        metrics::counter!("fridge_consume_total").increment(1);
        tracing::info!(remaining, "removed from fridge");
        self.tell_tracker(&self.weight, |t| t.remove(product.unit_weight()));
        self.tell_tracker(&self.space, |t| t.remove(1));
        self.publish(FridgeEvent::Consumed {
            product: product.clone(),
            remaining,
        });

        if remaining == 0 {
            tracing::info!("last one consumed, ordering more");
            self.publish(FridgeEvent::ReplenishmentTriggered {
                product: product.clone(),
            });
            // Queued behind whatever is already in the mailbox.
            match self.myself.upgrade() {
                Some(sender) => {
                    let _ = sender.send(FridgeCommand::RequestOrder(product));
                }
                None => tracing::warn!("fridge shutting down, reorder dropped"),
            }
        }
    }

    #[tracing::instrument(skip_all, fields(product = product.name(), %aggregator_id))]
    fn on_commit_stock(&mut self, product: Product, aggregator_id: AggregatorId) {
        self.stock.add(product.clone());
        self.tell_tracker(&self.weight, |t| t.add(product.unit_weight()));
        self.tell_tracker(&self.space, |t| t.add(1));
        tracing::info!(items = self.stock.len(), "added to fridge");

        let order = OrderRecord::new(product);
        println!("\n{}", order.receipt());
        self.orders.push(order.clone());

        metrics::counter!("fridge_orders_committed_total").increment(1);
        self.publish(FridgeEvent::StockCommitted {
            aggregator_id,
            order,
        });
    }

    fn on_display_stock(&self) {
        println!("\n{}", self.stock);
    }

    fn on_display_order_history(&self) {
        println!("\nOrder history:");
        if self.orders.is_empty() {
            println!("  (no orders)");
        }
        for order in &self.orders {
            println!("  {order}");
        }
        println!("Total spent\t{}", OrderRecord::sum_totals(&self.orders));
        println!();
    }

    fn tell_tracker(
        &self,
        tracker: &CapacityHandle,
        send: impl FnOnce(&CapacityHandle) -> Result<()>,
    ) {
        if let Err(e) = send(tracker) {
            tracing::warn!(tracker = tracker.kind().as_str(), error = %e, "capacity update lost");
        }
    }

    fn publish(&self, event: FridgeEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Cloneable address of a running [`Fridge`].
///
/// Every command is fire-and-forget. Results of order requests are observable
/// through [`FridgeHandle::subscribe`] and [`FridgeHandle::snapshot`].
#[derive(Clone)]
pub struct FridgeHandle {
    sender: mpsc::UnboundedSender<FridgeCommand>,
    events: broadcast::Sender<FridgeEvent>,
    weight: CapacityHandle,
    space: CapacityHandle,
}

impl FridgeHandle {
    /// Asks the fridge to order one instance of `product`.
    pub fn request_order(&self, product: Product) -> Result<()> {
        self.tell(FridgeCommand::RequestOrder(product))
    }

    /// Takes one instance of `product` out of the fridge.
    pub fn consume(&self, product: Product) -> Result<()> {
        self.tell(FridgeCommand::Consume(product))
    }

    /// Prints the current stock.
    pub fn display_stock(&self) -> Result<()> {
        self.tell(FridgeCommand::DisplayStock)
    }

    /// Prints the order history.
    pub fn display_order_history(&self) -> Result<()> {
        self.tell(FridgeCommand::DisplayOrderHistory)
    }

    /// Returns stock, history and both capacity counters.
    ///
    /// Everything sent to the fridge before this call is reflected, apart from
    /// orders whose aggregator has not decided yet.
    pub async fn snapshot(&self) -> Result<FridgeSnapshot> {
        let (respond_to, response) = oneshot::channel();
        self.tell(FridgeCommand::Inspect(respond_to))?;
        let (stock, orders) = response
            .await
            .map_err(|_| FridgeError::ReplyDropped { actor: "fridge" })?;

        Ok(FridgeSnapshot {
            stock,
            orders,
            weight: self.weight.state().await?,
            space: self.space.state().await?,
        })
    }

    /// Subscribes to pipeline events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<FridgeEvent> {
        self.events.subscribe()
    }

    pub fn weight_tracker(&self) -> &CapacityHandle {
        &self.weight
    }

    pub fn space_tracker(&self) -> &CapacityHandle {
        &self.space
    }

    pub(crate) fn commit_stock(&self, product: Product, aggregator_id: AggregatorId) -> Result<()> {
        self.tell(FridgeCommand::CommitStock {
            product,
            aggregator_id,
        })
    }

    fn tell(&self, command: FridgeCommand) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| FridgeError::MailboxClosed { actor: "fridge" })
    }
}

#[cfg(test)]
impl FridgeHandle {
    /// Builds a handle over a bare channel so tests can play the fridge.
    pub(crate) fn detached(
        weight: CapacityHandle,
        space: CapacityHandle,
    ) -> (
        Self,
        mpsc::UnboundedReceiver<FridgeCommand>,
        broadcast::Sender<FridgeEvent>,
    ) {
        let (sender, mailbox) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let handle = Self {
            sender,
            events: events.clone(),
            weight,
            space,
        };
        (handle, mailbox, events)
    }
}
