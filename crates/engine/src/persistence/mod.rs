//! Mirrors sub-ledgers to durable slots, one per pool and user identity.
//!
//! A slot always holds the full `{version, config, entries}` snapshot; saving
//! overwrites it. Loading never fails the caller: a missing slot is an empty
//! ledger and a corrupt or unreachable one is logged and treated the same way.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, Entry, Ledger, Pool, PoolKind, ResultEngine};

mod database;
mod memory;

pub use database::DbStore;
pub use memory::MemoryStore;

/// Current slot schema version.
pub const SLOT_VERSION: u32 = 1;

const GUEST: &str = "guest";

/// Who a slot belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    User(String),
    /// Shared by everyone who never signs in on this device.
    Guest,
}

impl Identity {
    /// Derives the identity from an email address.
    ///
    /// The address is trimmed, NFKC-normalized and lowercased so that the
    /// same person always lands on the same slot. Blank input is a guest.
    pub fn from_email(email: Option<&str>) -> Self {
        let normalized: String = email
            .unwrap_or_default()
            .trim()
            .nfkc()
            .collect::<String>()
            .to_lowercase();
        if normalized.is_empty() || normalized == GUEST {
            Self::Guest
        } else {
            Self::User(normalized)
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(email) => f.write_str(email),
            Self::Guest => f.write_str(GUEST),
        }
    }
}

/// Storage key of one slot: `{pool}:{identity}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pool: PoolKind,
    identity: Identity,
}

impl ScopeKey {
    pub fn new(pool: PoolKind, identity: &Identity) -> Self {
        Self {
            pool,
            identity: identity.clone(),
        }
    }

    pub fn pool(&self) -> PoolKind {
        self.pool
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pool.slug(), self.identity)
    }
}

/// Persisted document of one sub-ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct Slot<P: Pool> {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub config: P::Config,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

fn current_version() -> u32 {
    SLOT_VERSION
}

impl<P: Pool> Default for Slot<P> {
    fn default() -> Self {
        Self {
            version: SLOT_VERSION,
            config: P::Config::default(),
            entries: Vec::new(),
        }
    }
}

impl<P: Pool> Slot<P> {
    pub fn from_ledger(ledger: &Ledger<P>) -> Self {
        Self {
            version: SLOT_VERSION,
            config: ledger.config().clone(),
            entries: ledger.entries().to_vec(),
        }
    }

    pub fn into_ledger(self) -> Ledger<P> {
        Ledger::from_parts(self.config, self.entries)
    }

    /// Reads a stored document, upgrading older shapes.
    pub fn decode(payload: &str) -> ResultEngine<Self> {
        let value: serde_json::Value = serde_json::from_str(payload)
            .map_err(|err| corrupt(format!("not JSON: {err}")))?;

        match value.get("version").and_then(serde_json::Value::as_u64) {
            Some(version) if version > u64::from(SLOT_VERSION) => {
                Err(corrupt(format!("unsupported slot version {version}")))
            }
            Some(_) => serde_json::from_value(value).map_err(|err| corrupt(err.to_string())),
            None => {
                if let Some((config, entries)) = P::from_legacy(&value) {
                    tracing::info!("upgrading legacy {} slot", P::KIND);
                    return Ok(Self {
                        version: SLOT_VERSION,
                        config,
                        entries,
                    });
                }
                serde_json::from_value(value).map_err(|err| corrupt(err.to_string()))
            }
        }
    }

    pub fn encode(&self) -> ResultEngine<String> {
        serde_json::to_string(self).map_err(|err| corrupt(err.to_string()))
    }
}

fn corrupt(reason: String) -> EngineError {
    EngineError::PersistenceUnavailable(format!("corrupt slot: {reason}"))
}

/// Durable key-value backend for slots.
pub trait SlotStore: Send + Sync {
    fn read(&self, key: &ScopeKey) -> impl Future<Output = ResultEngine<Option<String>>> + Send;

    fn write(
        &self,
        key: &ScopeKey,
        payload: String,
    ) -> impl Future<Output = ResultEngine<()>> + Send;

    fn remove(&self, key: &ScopeKey) -> impl Future<Output = ResultEngine<()>> + Send;
}

/// Loads the slot for `identity`, falling back to defaults on any problem.
pub async fn load<P: Pool, S: SlotStore>(store: &S, identity: &Identity) -> Slot<P> {
    let key = ScopeKey::new(P::KIND, identity);
    let payload = match store.read(&key).await {
        Ok(Some(payload)) => payload,
        Ok(None) => return Slot::default(),
        Err(err) => {
            tracing::warn!("slot {key} unavailable, starting empty: {err}");
            return Slot::default();
        }
    };

    match Slot::<P>::decode(&payload) {
        Ok(slot) => slot,
        Err(err) => {
            tracing::warn!("slot {key} ignored: {err}");
            Slot::default()
        }
    }
}

/// Overwrites the slot for `identity` with `slot`.
pub async fn save<P: Pool, S: SlotStore>(
    store: &S,
    identity: &Identity,
    slot: &Slot<P>,
) -> ResultEngine<()> {
    let key = ScopeKey::new(P::KIND, identity);
    let payload = slot.encode()?;
    store.write(&key, payload).await.map_err(|err| match err {
        EngineError::Database(db_err) => EngineError::PersistenceUnavailable(db_err.to_string()),
        other => other,
    })?;
    tracing::debug!("saved slot {key} ({} entries)", slot.entries.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CaseCash, EntryKind, MealPlanConfig, MealSwipes, Personal, WeeklyLimit};

    #[test]
    fn identity_is_normalized() {
        assert_eq!(
            Identity::from_email(Some("  Alice@Case.EDU ")),
            Identity::User("alice@case.edu".to_string())
        );
        assert_eq!(
            Identity::from_email(Some("ａｌｉｃｅ@case.edu")),
            Identity::User("alice@case.edu".to_string())
        );
        assert_eq!(Identity::from_email(None), Identity::Guest);
        assert_eq!(Identity::from_email(Some("   ")), Identity::Guest);
        assert_eq!(Identity::from_email(Some("Guest")), Identity::Guest);
    }

    #[test]
    fn scope_key_is_per_pool_and_identity() {
        let alice = Identity::from_email(Some("alice@case.edu"));
        assert_eq!(
            ScopeKey::new(PoolKind::MealSwipes, &alice).to_string(),
            "mealplan:alice@case.edu"
        );
        assert_eq!(
            ScopeKey::new(PoolKind::Personal, &Identity::Guest).to_string(),
            "transactions:guest"
        );
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let slot = Slot::<Personal> {
            version: SLOT_VERSION,
            config: Default::default(),
            entries: vec![
                Entry::personal(EntryKind::Income, "Job", "100").date("2025-01-13"),
                Entry::personal(EntryKind::Expense, "Books", "abc").notes("raw text kept"),
            ],
        };
        let decoded = Slot::<Personal>::decode(&slot.encode().unwrap()).unwrap();
        assert_eq!(decoded, slot);
    }

    #[test]
    fn missing_fields_default() {
        let slot = Slot::<MealSwipes>::decode(r#"{"version":1}"#).unwrap();
        assert_eq!(slot.config, MealPlanConfig::default());
        assert!(slot.entries.is_empty());

        let slot = Slot::<CaseCash>::decode(r#"{"entries":[{"location":"Grab-It","amount":"2.50"}]}"#)
            .unwrap();
        assert_eq!(slot.version, SLOT_VERSION);
        assert_eq!(slot.entries[0].label, "Grab-It");
    }

    #[test]
    fn newer_or_broken_documents_are_rejected() {
        assert!(Slot::<Personal>::decode(r#"{"version":99}"#).is_err());
        assert!(Slot::<Personal>::decode("{not json").is_err());
        assert!(Slot::<Personal>::decode(r#"{"version":1,"entries":7}"#).is_err());
    }

    #[test]
    fn legacy_meal_plan_is_upgraded() {
        let legacy = r#"{"weeklyLimit":14,"swipesUsed":1,"swipeHistory":[{"date":"14/01/2025","time":"12:30","location":"Fribley","notes":"-"}]}"#;
        let slot = Slot::<MealSwipes>::decode(legacy).unwrap();
        assert_eq!(slot.config.weekly_limit, WeeklyLimit::Limited(14));
        assert_eq!(slot.entries.len(), 1);
        assert_eq!(slot.entries[0].notes.as_deref(), Some("-"));
    }
}
