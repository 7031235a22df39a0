//! Dispatches parsed console commands to the fridge.

use fridge::FridgeHandle;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::command::{ConsoleCommand, HELP};
use crate::error::CliError;

/// Whether the input loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Console session bound to a running fridge.
pub struct Console {
    fridge: FridgeHandle,
    metrics: Option<PrometheusHandle>,
}

impl Console {
    pub fn new(fridge: FridgeHandle, metrics: Option<PrometheusHandle>) -> Self {
        Self { fridge, metrics }
    }

    /// Forwards `command` to the fridge without waiting for its effects.
    #[tracing::instrument(skip(self, command), fields(command = command.name()))]
    pub fn execute(&self, command: ConsoleCommand) -> Result<Flow, CliError> {
        metrics::counter!("console_commands_total", "command" => command.name()).increment(1);

        match command {
            ConsoleCommand::Order(product) => self.fridge.request_order(product)?,
            ConsoleCommand::Consume(product) => self.fridge.consume(product)?,
            ConsoleCommand::DisplayStock => self.fridge.display_stock()?,
            ConsoleCommand::DisplayOrderHistory => self.fridge.display_order_history()?,
            ConsoleCommand::Metrics => match &self.metrics {
                Some(handle) => println!("{}", handle.render()),
                None => println!("No metrics recorder installed"),
            },
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    pub fn fridge(&self) -> &FridgeHandle {
        &self.fridge
    }
}
