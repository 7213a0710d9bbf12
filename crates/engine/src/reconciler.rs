//! Incremental maintenance of a pool aggregate.
//!
//! The reconciler never looks at the entry list on its own: the ledger tells
//! it what changed (the new entry on add, the prior and new entry on edit, the
//! removed entry on delete). [`Reconciler::refold`] recomputes from scratch and
//! is the reference the incremental value must always match.

use std::marker::PhantomData;

use crate::{Entry, Pool};

#[derive(Debug, Clone)]
pub struct Reconciler<P: Pool> {
    total: P::Total,
    _pool: PhantomData<P>,
}

impl<P: Pool> Default for Reconciler<P> {
    fn default() -> Self {
        Self {
            total: P::Total::default(),
            _pool: PhantomData,
        }
    }
}

impl<P: Pool> Reconciler<P> {
    /// Starts from the refold of an existing entry list.
    pub fn from_entries(entries: &[Entry]) -> Self {
        Self {
            total: Self::refold(entries),
            _pool: PhantomData,
        }
    }

    pub fn total(&self) -> P::Total {
        self.total
    }

    /// Full recomputation over the entries, in order.
    pub fn refold(entries: &[Entry]) -> P::Total {
        entries
            .iter()
            .fold(P::Total::default(), |acc, entry| acc + P::effect(entry))
    }

    pub fn on_add(&mut self, entry: &Entry) {
        self.total = self.total + P::effect(entry);
    }

    /// `previous` must be the entry as it was before the overwrite.
    pub fn on_replace(&mut self, previous: &Entry, next: &Entry) {
        self.total = self.total - P::effect(previous) + P::effect(next);
    }

    pub fn on_remove(&mut self, removed: &Entry) {
        self.total = self.total - P::effect(removed);
    }

    /// Drops the running value and takes the refold instead.
    pub fn resync(&mut self, entries: &[Entry]) {
        self.total = Self::refold(entries);
    }
}
