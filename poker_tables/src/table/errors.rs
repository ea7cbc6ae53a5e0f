//! Table error types.

use thiserror::Error;

use crate::game::{
    ActionError, SeatError, StartError,
    entities::TableId,
};

/// Table errors
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TableError {
    /// Action rejected by the state machine
    #[error(transparent)]
    Action(#[from] ActionError),

    /// Seat conflict or missing seat
    #[error(transparent)]
    Seat(#[from] SeatError),

    /// Hand could not be started
    #[error(transparent)]
    Start(#[from] StartError),

    /// No table with this ID
    #[error("Table {0} not found")]
    NotFound(TableId),

    /// Table actor has shut down
    #[error("Table {0} is closed")]
    Closed(TableId),

    /// Table still has players seated
    #[error("Table {0} still has seated players")]
    Occupied(TableId),

    /// Configuration failed validation
    #[error("Invalid table config: {0}")]
    InvalidConfig(String),
}

impl TableError {
    /// Get a client-safe error message
    ///
    /// Table IDs are redacted; rejection reasons from the game are passed
    /// through since they only describe the caller's own move.
    pub fn client_message(&self) -> String {
        match self {
            TableError::NotFound(_) => "Table not found".to_string(),
            TableError::Closed(_) => "Table is closed".to_string(),
            TableError::Occupied(_) => "Table still has seated players".to_string(),
            _ => self.to_string(),
        }
    }

    /// True for ordinary game rejections (bad move, taken seat) as opposed
    /// to routing failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TableError::Action(_) | TableError::Seat(_) | TableError::Start(_)
        )
    }
}

/// Result type for table operations
pub type TableResult<T> = Result<T, TableError>;
