//! Harness-level errors.

use auctionbench_model::TableError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transition table error: {0}")]
    Table(#[from] TableError),
}
