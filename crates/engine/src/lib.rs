use chrono_tz::Tz;
use sea_orm::DatabaseConnection;

pub use entry::{Entry, EntryKind};
pub use error::EngineError;
pub use ledger::{Applied, Intent, Ledger};
pub use money::MoneyCents;
pub use persistence::{DbStore, Identity, MemoryStore, ScopeKey, Slot, SlotStore};
pub use pool::{
    CaseCash, CaseCashConfig, MealPlanConfig, MealSwipes, Personal, PersonalConfig, Pool,
    PoolKind, SwipeCount, WeeklyLimit,
};
pub use reconciler::Reconciler;
pub use session::{Change, Session};
pub use week::{AssistantSnapshot, WeekWindow, parse_entry_date, week_start};

mod entry;
mod error;
mod ledger;
mod money;
pub mod persistence;
mod pool;
mod reconciler;
mod session;
pub mod week;

pub type ResultEngine<T> = Result<T, EngineError>;

/// Backend the engine keeps its slots in.
#[derive(Clone, Debug)]
pub enum Store {
    Database(DbStore),
    Memory(MemoryStore),
}

impl SlotStore for Store {
    async fn read(&self, key: &ScopeKey) -> ResultEngine<Option<String>> {
        match self {
            Store::Database(store) => store.read(key).await,
            Store::Memory(store) => store.read(key).await,
        }
    }

    async fn write(&self, key: &ScopeKey, payload: String) -> ResultEngine<()> {
        match self {
            Store::Database(store) => store.write(key, payload).await,
            Store::Memory(store) => store.write(key, payload).await,
        }
    }

    async fn remove(&self, key: &ScopeKey) -> ResultEngine<()> {
        match self {
            Store::Database(store) => store.remove(key).await,
            Store::Memory(store) => store.remove(key).await,
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    store: Store,
    timezone: Tz,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Timezone that decides where a week starts.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Loads the three sub-ledgers of `identity`.
    pub async fn open(&self, identity: &Identity) -> Session<'_> {
        Session::load(self, identity.clone()).await
    }

    /// Deletes every slot of `identity`.
    pub async fn forget(&self, identity: &Identity) -> ResultEngine<()> {
        for pool in PoolKind::ALL {
            self.store.remove(&ScopeKey::new(pool, identity)).await?;
        }
        tracing::info!("slots of {identity} removed");
        Ok(())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Store>,
    timezone: Option<Tz>,
}

impl EngineBuilder {
    pub fn store(mut self, store: Store) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Pass the required database
    pub fn database(self, db: DatabaseConnection) -> EngineBuilder {
        self.store(Store::Database(DbStore::new(db)))
    }

    pub fn memory(self, store: MemoryStore) -> EngineBuilder {
        self.store(Store::Memory(store))
    }

    pub fn timezone(mut self, timezone: Tz) -> EngineBuilder {
        self.timezone = Some(timezone);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let store = self.store.unwrap_or_else(|| {
            tracing::warn!("no store configured, slots live in memory only");
            Store::Memory(MemoryStore::new())
        });
        if let Store::Database(db) = &store {
            db.connection().ping().await?;
        }
        Ok(Engine {
            store,
            timezone: self.timezone.unwrap_or(Tz::UTC),
        })
    }
}
