use axum::{
    Router,
    routing::{get, patch, post, put},
};
use tokio::sync::Mutex;

use std::sync::Arc;

use crate::{assistant, assistant::AssistantClient, ledger};
use engine::{CaseCash, Engine, MealSwipes, Personal};

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub assistant: Option<AssistantClient>,
    /// Serializes load, apply and save so concurrent writers cannot lose updates.
    pub writes: Arc<Mutex<()>>,
}

impl ServerState {
    pub fn new(engine: Engine, assistant: Option<AssistantClient>) -> Self {
        Self {
            engine: Arc::new(engine),
            assistant,
            writes: Arc::new(Mutex::new(())),
        }
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/transactions", post(ledger::create::<Personal>))
        .route("/transactions/{user_id}", get(ledger::list::<Personal>))
        .route(
            "/transactions/{user_id}/{position}",
            patch(ledger::update::<Personal>).delete(ledger::delete::<Personal>),
        )
        .route("/transactions/{user_id}/budget", put(ledger::set_weekly_budget))
        .route("/casecash", post(ledger::create::<CaseCash>))
        .route("/casecash/{user_id}", get(ledger::list::<CaseCash>))
        .route(
            "/casecash/{user_id}/{position}",
            patch(ledger::update::<CaseCash>).delete(ledger::delete::<CaseCash>),
        )
        .route("/mealplan", post(ledger::create::<MealSwipes>))
        .route("/mealplan/{user_id}", get(ledger::list::<MealSwipes>))
        .route(
            "/mealplan/{user_id}/{position}",
            patch(ledger::update::<MealSwipes>).delete(ledger::delete::<MealSwipes>),
        )
        .route("/mealplan/{user_id}/limit", put(ledger::set_weekly_limit))
        .route("/mealplan/{user_id}/reset", post(ledger::reset_week))
        .route("/assistant/ask", post(assistant::ask))
        .with_state(state)
}

pub async fn run(state: ServerState, bind: &str) {
    let listener = match tokio::net::TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {bind}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(state, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
