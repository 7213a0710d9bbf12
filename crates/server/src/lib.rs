use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use assistant::{AssistantClient, AssistantError, FALLBACK_MESSAGE};
pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod assistant;
mod ledger;
mod server;

pub mod types {
    pub mod ledger {
        pub use api_types::ledger::{
            AmountInput, EntryFields, EntryNew, EntryUpdate, EntryView, LedgerView,
            TransactionKind, WeeklyBudgetUpdate, WeeklyLimitInput, WeeklyLimitUpdate,
        };
    }

    pub mod assistant {
        pub use api_types::assistant::{AssistantAsk, AssistantQuery, AssistantReply};
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::OutOfRange { .. } => StatusCode::NOT_FOUND,
        EngineError::ParseFailure(_) | EngineError::InvalidEntry(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::RemoteUnavailable(_) => StatusCode::BAD_GATEWAY,
        EngineError::PersistenceUnavailable(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::PersistenceUnavailable(reason) => {
            tracing::error!("persistence unavailable: {reason}");
            "storage unavailable".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
