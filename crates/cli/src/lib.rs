//! Console front end for the smart-fridge simulation.
//!
//! Reads commands line by line, forwards them to the fridge actor as
//! fire-and-forget messages, and prints help and metrics on request.

pub mod command;
pub mod config;
pub mod console;
pub mod error;

pub use command::{CommandError, ConsoleCommand, HELP};
pub use config::{Config, LogFormat};
pub use console::{Console, Flow};
pub use error::CliError;
