//! Ledger API endpoints, shared by the three pools.
//!
//! Handlers are generic over the pool; the route picks the pool through the
//! path prefix. Every write holds `ServerState::writes` from load to save.

use api_types::ledger::{
    EntryFields, EntryNew, EntryUpdate, EntryView, LedgerView, TransactionKind,
    WeeklyBudgetUpdate, WeeklyLimitInput, WeeklyLimitUpdate,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{NaiveDateTime, Utc};
use engine::{
    EngineError, Entry, EntryKind, Identity, Intent, Ledger, MealSwipes, MoneyCents, Personal,
    Pool, PoolKind, Session, WeeklyLimit,
};

use crate::{ServerError, server::ServerState};

pub async fn list<P: Pool>(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<LedgerView>, ServerError> {
    let identity = Identity::from_email(Some(&user_id));
    let session = state.engine.open(&identity).await;
    Ok(Json(ledger_view(&session, P::KIND, true)))
}

pub async fn create<P: Pool>(
    State(state): State<ServerState>,
    Json(payload): Json<EntryNew>,
) -> Result<(StatusCode, Json<LedgerView>), ServerError> {
    let identity = Identity::from_email(payload.user_id.as_deref());
    let now = Utc::now()
        .with_timezone(&state.engine.timezone())
        .naive_local();
    let entry = build_entry(P::KIND, Entry::default(), payload.fields, Some(now));
    P::validate(&entry)?;

    let _guard = state.writes.lock().await;
    let mut session = state.engine.open(&identity).await;
    let persisted = apply(&mut session, P::KIND, Intent::Add(entry)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ledger_view(&session, P::KIND, persisted)),
    ))
}

/// Overwrites the fields present in the body; the others keep their value.
pub async fn update<P: Pool>(
    State(state): State<ServerState>,
    Path((user_id, position)): Path<(String, i64)>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<LedgerView>, ServerError> {
    let identity = Identity::from_email(Some(&user_id));

    let _guard = state.writes.lock().await;
    let mut session = state.engine.open(&identity).await;
    let current = entry_at(&session, P::KIND, position)?;
    let entry = build_entry(P::KIND, current, payload, None);
    P::validate(&entry)?;

    let persisted = apply(&mut session, P::KIND, Intent::Edit { position, entry }).await?;
    Ok(Json(ledger_view(&session, P::KIND, persisted)))
}

pub async fn delete<P: Pool>(
    State(state): State<ServerState>,
    Path((user_id, position)): Path<(String, i64)>,
) -> Result<Json<LedgerView>, ServerError> {
    let identity = Identity::from_email(Some(&user_id));

    let _guard = state.writes.lock().await;
    let mut session = state.engine.open(&identity).await;
    let persisted = apply(&mut session, P::KIND, Intent::Delete { position }).await?;
    Ok(Json(ledger_view(&session, P::KIND, persisted)))
}

pub async fn set_weekly_limit(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Json(payload): Json<WeeklyLimitUpdate>,
) -> Result<Json<LedgerView>, ServerError> {
    let identity = Identity::from_email(Some(&user_id));
    let limit = match payload.weekly_limit {
        WeeklyLimitInput::Count(count) => WeeklyLimit::Limited(count),
        WeeklyLimitInput::Text(text) => text.parse::<WeeklyLimit>()?,
    };

    let _guard = state.writes.lock().await;
    let mut session = state.engine.open(&identity).await;
    let change = session.set_weekly_limit(limit).await;
    Ok(Json(ledger_view(
        &session,
        MealSwipes::KIND,
        change.persisted,
    )))
}

pub async fn set_weekly_budget(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
    Json(payload): Json<WeeklyBudgetUpdate>,
) -> Result<Json<LedgerView>, ServerError> {
    let identity = Identity::from_email(Some(&user_id));
    let budget: MoneyCents = payload.weekly_budget.into_text().parse()?;
    if budget.is_negative() {
        return Err(EngineError::InvalidEntry("weekly budget must be >= 0".to_string()).into());
    }

    let _guard = state.writes.lock().await;
    let mut session = state.engine.open(&identity).await;
    let change = session.set_weekly_budget(budget).await;
    Ok(Json(ledger_view(&session, Personal::KIND, change.persisted)))
}

pub async fn reset_week(
    State(state): State<ServerState>,
    Path(user_id): Path<String>,
) -> Result<Json<LedgerView>, ServerError> {
    let identity = Identity::from_email(Some(&user_id));
    let today = Utc::now()
        .with_timezone(&state.engine.timezone())
        .date_naive();

    let _guard = state.writes.lock().await;
    let mut session = state.engine.open(&identity).await;
    let change = session.reset_week(today).await;
    Ok(Json(ledger_view(
        &session,
        MealSwipes::KIND,
        change.persisted,
    )))
}

/// Returns whether the change reached the store.
async fn apply(
    session: &mut Session<'_>,
    pool: PoolKind,
    intent: Intent,
) -> Result<bool, ServerError> {
    let change = match pool {
        PoolKind::Personal => session.apply_personal(intent).await?,
        PoolKind::CaseCash => session.apply_case_cash(intent).await?,
        PoolKind::MealSwipes => session.apply_meal_swipe(intent).await?,
    };
    Ok(change.persisted)
}

fn entry_at(session: &Session<'_>, pool: PoolKind, position: i64) -> Result<Entry, ServerError> {
    let (entry, len) = match pool {
        PoolKind::Personal => lookup(session.personal(), position),
        PoolKind::CaseCash => lookup(session.case_cash(), position),
        PoolKind::MealSwipes => lookup(session.meal_plan(), position),
    };
    entry.ok_or_else(|| EngineError::OutOfRange { position, len }.into())
}

fn lookup<P: Pool>(ledger: &Ledger<P>, position: i64) -> (Option<Entry>, usize) {
    let entry = usize::try_from(position)
        .ok()
        .and_then(|index| ledger.get(index))
        .cloned();
    (entry, ledger.len())
}

/// Merges request fields into `base`. `now` (local time) stamps a new swipe
/// that came without a date.
fn build_entry(
    pool: PoolKind,
    mut base: Entry,
    fields: EntryFields,
    now: Option<NaiveDateTime>,
) -> Entry {
    if let Some(date) = fields.date {
        base.date = Some(date);
    }
    if let Some(time) = fields.time {
        base.time = Some(time);
    }
    if let Some(label) = fields.label {
        base.label = label.trim().to_string();
    }
    if let Some(notes) = fields.notes {
        base.notes = Some(notes);
    }
    if let Some(amount) = fields.amount {
        base.amount = amount.into_text().trim().to_string();
    }

    match pool {
        PoolKind::Personal => {
            let kind = fields.kind.map(|kind| match kind {
                TransactionKind::Income => EntryKind::Income,
                TransactionKind::Expense => EntryKind::Expense,
            });
            base.kind = Some(kind.or(base.kind).unwrap_or(EntryKind::Expense));
        }
        PoolKind::CaseCash => base.kind = None,
        PoolKind::MealSwipes => {
            base.kind = None;
            if let Some(now) = now {
                if base.date.is_none() {
                    base.date = Some(now.format("%Y-%m-%d").to_string());
                }
                if base.time.is_none() {
                    base.time = Some(now.format("%H:%M").to_string());
                }
            }
        }
    }
    base
}

fn ledger_view(session: &Session<'_>, pool: PoolKind, persisted: bool) -> LedgerView {
    let user_id = session.identity().to_string();
    match pool {
        PoolKind::Personal => {
            let ledger = session.personal();
            LedgerView {
                weekly_budget: Some(ledger.config().weekly_budget.to_string()),
                ..base_view(pool, user_id, ledger, persisted)
            }
        }
        PoolKind::CaseCash => base_view(pool, user_id, session.case_cash(), persisted),
        PoolKind::MealSwipes => {
            let ledger = session.meal_plan();
            let config = ledger.config();
            let weekly_limit = match config.weekly_limit {
                WeeklyLimit::Limited(count) => WeeklyLimitInput::Count(count),
                WeeklyLimit::Unlimited => {
                    WeeklyLimitInput::Text(WeeklyLimit::Unlimited.to_string())
                }
            };
            LedgerView {
                weekly_limit: Some(weekly_limit),
                swipes_remaining: config.weekly_limit.remaining(ledger.total()),
                last_reset: config.last_reset.clone(),
                ..base_view(pool, user_id, ledger, persisted)
            }
        }
    }
}

fn base_view<P: Pool>(
    pool: PoolKind,
    user_id: String,
    ledger: &Ledger<P>,
    persisted: bool,
) -> LedgerView {
    let entries = ledger
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| EntryView {
            position,
            date: entry.date.clone(),
            time: entry.time.clone(),
            label: entry.label.clone(),
            kind: entry.kind.map(|kind| match kind {
                EntryKind::Income => TransactionKind::Income,
                EntryKind::Expense => TransactionKind::Expense,
            }),
            amount: entry.amount.clone(),
            notes: entry.notes.clone(),
        })
        .collect();

    LedgerView {
        pool: pool.slug().to_string(),
        user_id,
        entries,
        total: ledger.total().to_string(),
        weekly_budget: None,
        weekly_limit: None,
        swipes_remaining: None,
        last_reset: None,
        persisted,
    }
}
