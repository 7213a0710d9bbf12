//! The module contains `Ledger`, the ordered sub-ledger of one pool.
//!
//! Entries keep insertion order. Every mutation updates the entry list and
//! the aggregate in the same call, after all checks have passed, so a failed
//! call leaves both untouched.

use crate::{EngineError, Entry, Pool, Reconciler, ResultEngine};

/// A view's request against a ledger.
///
/// Positions are signed because they come straight from the view; anything
/// outside `0..len` is rejected with [`EngineError::OutOfRange`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Add(Entry),
    Edit { position: i64, entry: Entry },
    Delete { position: i64 },
}

/// What a successful [`Ledger::apply`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applied {
    Added { position: usize },
    Edited { position: usize, previous: Entry },
    Deleted { position: usize, removed: Entry },
}

#[derive(Debug, Clone)]
pub struct Ledger<P: Pool> {
    entries: Vec<Entry>,
    config: P::Config,
    reconciler: Reconciler<P>,
}

impl<P: Pool> Default for Ledger<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Pool> Ledger<P> {
    pub fn new() -> Self {
        Self::with_config(P::Config::default())
    }

    pub fn with_config(config: P::Config) -> Self {
        Self {
            entries: Vec::new(),
            config,
            reconciler: Reconciler::default(),
        }
    }

    /// Rebuilds a ledger from persisted parts; the aggregate is refolded.
    pub fn from_parts(config: P::Config, entries: Vec<Entry>) -> Self {
        let reconciler = Reconciler::from_entries(&entries);
        Self {
            entries,
            config,
            reconciler,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&Entry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &P::Config {
        &self.config
    }

    pub fn set_config(&mut self, config: P::Config) {
        self.config = config;
    }

    /// Incrementally maintained aggregate.
    pub fn total(&self) -> P::Total {
        self.reconciler.total()
    }

    /// Aggregate recomputed from the entry list.
    pub fn refold(&self) -> P::Total {
        Reconciler::<P>::refold(&self.entries)
    }

    pub fn is_consistent(&self) -> bool {
        self.total() == self.refold()
    }

    /// Replaces the running aggregate with the refold.
    pub fn resync(&mut self) {
        if !self.is_consistent() {
            tracing::warn!(
                "{} aggregate drifted: running {} vs refold {}",
                P::KIND,
                self.total(),
                self.refold()
            );
        }
        self.reconciler.resync(&self.entries);
    }

    /// Appends at the end. The amount is not validated here.
    pub fn append(&mut self, entry: Entry) -> usize {
        self.reconciler.on_add(&entry);
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Replaces the entry at `position`, returning the one it replaced.
    pub fn replace(&mut self, position: usize, entry: Entry) -> ResultEngine<Entry> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(position)
            .ok_or_else(|| out_of_range(position as i64, len))?;
        let previous = std::mem::replace(slot, entry);
        self.reconciler.on_replace(&previous, slot);
        Ok(previous)
    }

    /// Removes the entry at `position`; later entries shift down by one.
    pub fn remove(&mut self, position: usize) -> ResultEngine<Entry> {
        if position >= self.entries.len() {
            return Err(out_of_range(position as i64, self.entries.len()));
        }
        let removed = self.entries.remove(position);
        self.reconciler.on_remove(&removed);
        Ok(removed)
    }

    /// Empties the ledger and returns what it held. Config is kept.
    pub fn drain(&mut self) -> Vec<Entry> {
        let drained = std::mem::take(&mut self.entries);
        self.reconciler = Reconciler::default();
        drained
    }

    /// Applies one intent as a single transition of entries and aggregate.
    pub fn apply(&mut self, intent: Intent) -> ResultEngine<Applied> {
        let applied = match intent {
            Intent::Add(entry) => Applied::Added {
                position: self.append(entry),
            },
            Intent::Edit { position, entry } => {
                let position = self.checked_position(position)?;
                let previous = self.replace(position, entry)?;
                Applied::Edited { position, previous }
            }
            Intent::Delete { position } => {
                let position = self.checked_position(position)?;
                let removed = self.remove(position)?;
                Applied::Deleted { position, removed }
            }
        };
        tracing::debug!("{} ledger: {:?}, total {}", P::KIND, applied, self.total());
        Ok(applied)
    }

    fn checked_position(&self, position: i64) -> ResultEngine<usize> {
        usize::try_from(position)
            .ok()
            .filter(|&index| index < self.entries.len())
            .ok_or_else(|| out_of_range(position, self.entries.len()))
    }
}

fn out_of_range(position: i64, len: usize) -> EngineError {
    EngineError::OutOfRange { position, len }
}
