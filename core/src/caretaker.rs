//! Memento caretaker — frozen snapshots of evicted caches.
//!
//! RULE: A saved memento is immutable. Saving copies the cache's
//! state; mutating the live cache afterwards (or a cache rebuilt from
//! the memento) never reaches back into the snapshot.
//!
//! A cell is never both live and frozen: the viewport pass saves and
//! removes the live entry in one step, and `restore` removes on read.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cache::Cache;
use crate::coin::CoinId;
use crate::grid::Cell;
use crate::types::Serial;

/// Frozen cache state: the coins at eviction time plus the serial
/// watermark, so a rehydrated cache can keep minting without reuse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMemento {
    pub coins: Vec<CoinId>,
    pub next_serial: Serial,
}

/// Snapshot arena keyed by cell. BTreeMap so persistence and audits
/// walk mementos in a stable order.
#[derive(Debug, Default)]
pub struct Caretaker {
    frozen: BTreeMap<Cell, CacheMemento>,
}

impl Caretaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot a live cache. Copy-on-save: the memento owns its coin
    /// list outright.
    pub fn save(&mut self, cell: Cell, cache: &Cache) {
        let memento = CacheMemento {
            coins: cache.coins().to_vec(),
            next_serial: cache.next_serial(),
        };
        let replaced = self.frozen.insert(cell, memento);
        debug_assert!(
            replaced.is_none(),
            "cell {cell} was already frozen while a live cache existed"
        );
    }

    /// One-shot restore: returns and removes the snapshot.
    pub fn restore(&mut self, cell: Cell) -> Option<CacheMemento> {
        self.frozen.remove(&cell)
    }

    /// Non-consuming inspection, for persistence and audits.
    pub fn peek(&self, cell: Cell) -> Option<&CacheMemento> {
        self.frozen.get(&cell)
    }

    /// Insert a snapshot directly. Used by the save-file decoder to
    /// park out-of-view cache states without materializing them.
    pub fn absorb(&mut self, cell: Cell, memento: CacheMemento) {
        self.frozen.insert(cell, memento);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Cell, &CacheMemento)> {
        self.frozen.iter()
    }

    pub fn len(&self) -> usize {
        self.frozen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frozen.is_empty()
    }

    pub fn clear(&mut self) {
        self.frozen.clear();
    }
}
