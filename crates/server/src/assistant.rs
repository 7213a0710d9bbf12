//! Budget assistant proxy.
//!
//! `/assistant/ask` gathers the week-to-date figures of the caller, posts them
//! with the question to the assistant service and relays its answer. When the
//! service cannot be reached the caller gets [`FALLBACK_MESSAGE`] instead of
//! an error, and no ledger is touched.

use std::time::Duration;

use api_types::assistant::{AssistantAsk, AssistantQuery, AssistantReply};
use axum::{Json, extract::State};
use chrono::Utc;
use engine::{AssistantSnapshot, EngineError, Identity};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{ServerError, server::ServerState};

pub const FALLBACK_MESSAGE: &str =
    "Unable to connect to the assistant. Please try again later.";

#[derive(Clone, Debug)]
pub struct AssistantClient {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{status}: {message}")]
    Server { status: StatusCode, message: String },
}

impl From<AssistantError> for EngineError {
    fn from(value: AssistantError) -> Self {
        EngineError::RemoteUnavailable(value.to_string())
    }
}

impl AssistantClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn ask(&self, query: &AssistantQuery) -> Result<AssistantReply, AssistantError> {
        let resp = self.client.post(&self.url).json(query).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<AssistantReply>().await?);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(err) => err.error,
            Err(_) => "assistant error".to_string(),
        };
        Err(AssistantError::Server { status, message })
    }
}

fn query_from(question: String, snapshot: &AssistantSnapshot) -> AssistantQuery {
    AssistantQuery {
        question,
        weekly_budget_personal: snapshot.weekly_budget_personal.as_units(),
        spent_this_week_personal: snapshot.spent_this_week_personal.as_units(),
        case_cash_total_semester: snapshot.case_cash_total_semester.as_units(),
        case_cash_spent_this_week: snapshot.case_cash_spent_this_week.as_units(),
        meal_swipes_weekly_total: snapshot.meal_swipes_weekly_total,
        meal_swipes_used_this_week: snapshot.meal_swipes_used_this_week,
    }
}

pub async fn ask(
    State(state): State<ServerState>,
    Json(payload): Json<AssistantAsk>,
) -> Result<Json<AssistantReply>, ServerError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(EngineError::InvalidEntry("question must not be empty".to_string()).into());
    }

    let identity = Identity::from_email(payload.user_id.as_deref());
    let snapshot = state.engine.open(&identity).await.snapshot(Utc::now());
    let query = query_from(question.to_string(), &snapshot);

    let reply = match &state.assistant {
        Some(client) => client.ask(&query).await.map_err(EngineError::from),
        None => Err(EngineError::RemoteUnavailable(
            "assistant url not configured".to_string(),
        )),
    };

    let message = match reply {
        Ok(reply) => reply.message,
        Err(err) => {
            tracing::warn!("assistant request for {identity} failed: {err}");
            FALLBACK_MESSAGE.to_string()
        }
    };
    Ok(Json(AssistantReply { message }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::MoneyCents;

    #[test]
    fn query_carries_dollars_and_null_for_unlimited() {
        let snapshot = AssistantSnapshot {
            weekly_budget_personal: MoneyCents::new(100_00),
            spent_this_week_personal: MoneyCents::new(12_50),
            case_cash_total_semester: MoneyCents::new(40_25),
            case_cash_spent_this_week: MoneyCents::new(5_00),
            meal_swipes_weekly_total: None,
            meal_swipes_used_this_week: 4,
        };
        let query = query_from("Can I buy a game?".to_string(), &snapshot);

        assert_eq!(query.weekly_budget_personal, 100.0);
        assert_eq!(query.spent_this_week_personal, 12.5);
        assert_eq!(query.case_cash_total_semester, 40.25);
        assert_eq!(query.meal_swipes_weekly_total, None);
        assert_eq!(query.meal_swipes_used_this_week, 4);
    }
}
