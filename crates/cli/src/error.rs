//! Console error types.

use fridge::FridgeError;
use thiserror::Error;

/// Errors that end the console session.
#[derive(Debug, Error)]
pub enum CliError {
    /// The fridge stopped accepting commands.
    #[error("Fridge error: {0}")]
    Fridge(#[from] FridgeError),

    /// Reading from stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
