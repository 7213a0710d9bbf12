//! One user's view of the three pools.
//!
//! A `Session` is opened from the [`Engine`](crate::Engine), owns the loaded
//! ledgers, and writes the full slot back after every change. A failed write
//! does not undo the in-memory change; it is reported in [`Change::persisted`].

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    Applied, CaseCash, Engine, Entry, Intent, Ledger, MealSwipes, MoneyCents, Personal, Pool,
    ResultEngine, WeeklyLimit,
    persistence::{self, Identity, Slot},
    week::{AssistantSnapshot, WeekWindow},
};

/// Result of a mutation plus whether it reached the store.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Change<T> {
    pub outcome: T,
    pub persisted: bool,
}

#[derive(Debug)]
pub struct Session<'e> {
    engine: &'e Engine,
    identity: Identity,
    personal: Ledger<Personal>,
    case_cash: Ledger<CaseCash>,
    meal_plan: Ledger<MealSwipes>,
}

impl<'e> Session<'e> {
    pub(crate) async fn load(engine: &'e Engine, identity: Identity) -> Session<'e> {
        let store = engine.store();
        let personal = persistence::load::<Personal, _>(store, &identity).await;
        let case_cash = persistence::load::<CaseCash, _>(store, &identity).await;
        let meal_plan = persistence::load::<MealSwipes, _>(store, &identity).await;

        Session {
            engine,
            identity,
            personal: personal.into_ledger(),
            case_cash: case_cash.into_ledger(),
            meal_plan: meal_plan.into_ledger(),
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn personal(&self) -> &Ledger<Personal> {
        &self.personal
    }

    pub fn case_cash(&self) -> &Ledger<CaseCash> {
        &self.case_cash
    }

    pub fn meal_plan(&self) -> &Ledger<MealSwipes> {
        &self.meal_plan
    }

    pub async fn apply_personal(&mut self, intent: Intent) -> ResultEngine<Change<Applied>> {
        let outcome = self.personal.apply(intent)?;
        let persisted = persist(self.engine, &self.identity, &self.personal).await;
        Ok(Change { outcome, persisted })
    }

    pub async fn apply_case_cash(&mut self, intent: Intent) -> ResultEngine<Change<Applied>> {
        let outcome = self.case_cash.apply(intent)?;
        let persisted = persist(self.engine, &self.identity, &self.case_cash).await;
        Ok(Change { outcome, persisted })
    }

    pub async fn apply_meal_swipe(&mut self, intent: Intent) -> ResultEngine<Change<Applied>> {
        let outcome = self.meal_plan.apply(intent)?;
        let persisted = persist(self.engine, &self.identity, &self.meal_plan).await;
        Ok(Change { outcome, persisted })
    }

    /// Changes the weekly swipe allowance. Recorded swipes are kept.
    pub async fn set_weekly_limit(&mut self, limit: WeeklyLimit) -> Change<WeeklyLimit> {
        let mut config = self.meal_plan.config().clone();
        let previous = std::mem::replace(&mut config.weekly_limit, limit);
        self.meal_plan.set_config(config);
        tracing::info!("{} weekly limit {previous} -> {limit}", self.identity);

        let persisted = persist(self.engine, &self.identity, &self.meal_plan).await;
        Change {
            outcome: previous,
            persisted,
        }
    }

    pub async fn set_weekly_budget(&mut self, budget: MoneyCents) -> Change<MoneyCents> {
        let mut config = self.personal.config().clone();
        let previous = std::mem::replace(&mut config.weekly_budget, budget);
        self.personal.set_config(config);

        let persisted = persist(self.engine, &self.identity, &self.personal).await;
        Change {
            outcome: previous,
            persisted,
        }
    }

    /// Starts a new swipe week: the recorded swipes are drained and returned.
    pub async fn reset_week(&mut self, today: NaiveDate) -> Change<Vec<Entry>> {
        let drained = self.meal_plan.drain();
        let mut config = self.meal_plan.config().clone();
        config.last_reset = Some(today.format("%Y-%m-%d").to_string());
        self.meal_plan.set_config(config);
        tracing::info!(
            "{} meal plan reset on {today}, {} swipes cleared",
            self.identity,
            drained.len()
        );

        let persisted = persist(self.engine, &self.identity, &self.meal_plan).await;
        Change {
            outcome: drained,
            persisted,
        }
    }

    /// Week-to-date figures for the week containing `now`.
    pub fn snapshot(&self, now: DateTime<Utc>) -> AssistantSnapshot {
        let week = WeekWindow::containing(now, self.engine.timezone());
        AssistantSnapshot::build(&self.personal, &self.case_cash, &self.meal_plan, week)
    }
}

async fn persist<P: Pool>(engine: &Engine, identity: &Identity, ledger: &Ledger<P>) -> bool {
    let slot = Slot::from_ledger(ledger);
    match persistence::save(engine.store(), identity, &slot).await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("{} change for {identity} kept in memory only: {err}", P::KIND);
            false
        }
    }
}
