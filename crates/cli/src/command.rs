//! Parsing of console input lines.

use std::str::FromStr;

use domain::{CATALOG_NAMES, Product};
use thiserror::Error;

/// Help text printed by `?`.
pub const HELP: &str = "\
Commands:
fadd <product>    - order a product for the fridge
frem <product>    - consume a product from the fridge
fdis              - display the fridge content
fhis              - display the order history
metrics           - print collected metrics
?                 - show this help
quit              - stop the simulation";

/// A fridge command entered on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Order(Product),
    Consume(Product),
    DisplayStock,
    DisplayOrderHistory,
    Metrics,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Returns the command keyword.
    pub fn name(&self) -> &'static str {
        match self {
            ConsoleCommand::Order(_) => "fadd",
            ConsoleCommand::Consume(_) => "frem",
            ConsoleCommand::DisplayStock => "fdis",
            ConsoleCommand::DisplayOrderHistory => "fhis",
            ConsoleCommand::Metrics => "metrics",
            ConsoleCommand::Help => "?",
            ConsoleCommand::Quit => "quit",
        }
    }
}

/// Errors produced while parsing a console line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The line was blank.
    #[error("Empty command")]
    Empty,

    /// The keyword is not known.
    #[error("Unknown command '{0}', type ? for help")]
    UnknownCommand(String),

    /// A product command was given without a product.
    #[error("'{command}' needs a product, try: {}", product_hint())]
    MissingProduct { command: &'static str },

    /// The product is not in the catalog.
    #[error("Unknown product '{name}', try: {}", product_hint())]
    UnknownProduct { name: String },
}

fn product_hint() -> String {
    CATALOG_NAMES
        .iter()
        .map(|name| format!("'{name}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_product(command: &'static str, rest: &str) -> Result<Product, CommandError> {
    // Product names may contain spaces ("elden ring").
    let name = rest.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(CommandError::MissingProduct { command });
    }
    Product::from_catalog(&name).ok_or(CommandError::UnknownProduct { name })
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        match keyword {
            "" => Err(CommandError::Empty),
            "fadd" => parse_product("fadd", rest).map(ConsoleCommand::Order),
            "frem" => parse_product("frem", rest).map(ConsoleCommand::Consume),
            "fdis" => Ok(ConsoleCommand::DisplayStock),
            "fhis" => Ok(ConsoleCommand::DisplayOrderHistory),
            "metrics" => Ok(ConsoleCommand::Metrics),
            "?" => Ok(ConsoleCommand::Help),
            _ if keyword.eq_ignore_ascii_case("quit") => Ok(ConsoleCommand::Quit),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}
