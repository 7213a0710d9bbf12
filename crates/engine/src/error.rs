//! The module contains the errors the engine can return.
//!
//! - [`OutOfRange`] an edit/delete addressed a position outside the ledger.
//! - [`ParseFailure`] an amount could not be read as a decimal.
//! - [`InvalidEntry`] an entry was rejected by view-layer validation.
//! - [`PersistenceUnavailable`] the durable slot could not be read or written.
//! - [`RemoteUnavailable`] the budget assistant could not be reached.
//!
//!  [`OutOfRange`]: EngineError::OutOfRange
//!  [`ParseFailure`]: EngineError::ParseFailure
//!  [`InvalidEntry`]: EngineError::InvalidEntry
//!  [`PersistenceUnavailable`]: EngineError::PersistenceUnavailable
//!  [`RemoteUnavailable`]: EngineError::RemoteUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("position {position} out of range (ledger has {len} entries)")]
    OutOfRange { position: i64, len: usize },
    #[error("Parse failure: {0}")]
    ParseFailure(String),
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::OutOfRange {
                    position: a,
                    len: a_len,
                },
                Self::OutOfRange {
                    position: b,
                    len: b_len,
                },
            ) => a == b && a_len == b_len,
            (Self::ParseFailure(a), Self::ParseFailure(b)) => a == b,
            (Self::InvalidEntry(a), Self::InvalidEntry(b)) => a == b,
            (Self::PersistenceUnavailable(a), Self::PersistenceUnavailable(b)) => a == b,
            (Self::RemoteUnavailable(a), Self::RemoteUnavailable(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
