//! Live caches and the deterministic generation lottery.
//!
//! RULE: No global counters. Each cache owns its serial watermark, and
//! all randomness flows through the injected luck function, so fresh
//! generation is a pure function of (cell, luck, config) — evict a
//! never-touched cell, wipe its memento, regenerate, and you get the
//! identical coin set back.

use std::collections::HashMap;

use crate::caretaker::Caretaker;
use crate::coin::CoinId;
use crate::config::GameConfig;
use crate::grid::Cell;
use crate::rng::{coin_count_key, spawn_key, LuckFn};
use crate::types::Serial;

/// The live, mutable coin collection for one in-view cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cache {
    cell: Cell,
    coins: Vec<CoinId>,
    next_serial: Serial,
}

impl Cache {
    /// Rebuild a cache from persisted or frozen parts.
    pub(crate) fn from_parts(cell: Cell, coins: Vec<CoinId>, next_serial: Serial) -> Self {
        Self {
            cell,
            coins,
            next_serial,
        }
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn coins(&self) -> &[CoinId] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    /// Serial watermark: the next serial this cell would mint.
    pub fn next_serial(&self) -> Serial {
        self.next_serial
    }

    /// Remove a coin by identity. None if it is not here — callers
    /// treat that as a benign no-op, not an error.
    pub fn take(&mut self, id: CoinId) -> Option<CoinId> {
        let at = self.coins.iter().position(|c| *c == id)?;
        Some(self.coins.remove(at))
    }

    /// Add a coin. Refuses a duplicate identity (returns false) so a
    /// replayed deposit cannot clone a coin.
    pub fn put(&mut self, id: CoinId) -> bool {
        if self.coins.contains(&id) {
            return false;
        }
        self.coins.push(id);
        true
    }
}

/// What a viewport materialization did for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialized {
    /// Cache was already live; untouched.
    AlreadyLive,
    /// Rehydrated verbatim from a memento.
    Restored,
    /// Freshly generated with this many coins.
    Spawned(usize),
    /// The lottery says this cell never holds a cache.
    Barren,
}

/// All live caches plus the generation lottery.
pub struct CacheStore {
    live: HashMap<Cell, Cache>,
    luck: LuckFn,
    spawn_probability: f64,
    max_coins: u32,
}

impl CacheStore {
    pub fn new(luck: LuckFn, config: &GameConfig) -> Self {
        Self {
            live: HashMap::new(),
            luck,
            spawn_probability: config.spawn_probability,
            max_coins: config.max_coins,
        }
    }

    /// Ensure the cell's cache is live if one exists at all.
    ///
    /// Order is load-bearing: live hit, then memento (authoritative
    /// over regeneration — an emptied cache must come back empty),
    /// then the spawn lottery, then fresh generation.
    pub fn materialize(&mut self, cell: Cell, caretaker: &mut Caretaker) -> Materialized {
        if self.live.contains_key(&cell) {
            return Materialized::AlreadyLive;
        }
        if let Some(memento) = caretaker.restore(cell) {
            let cache = Cache::from_parts(cell, memento.coins, memento.next_serial);
            log::debug!("cache {cell} restored with {} coins", cache.len());
            self.live.insert(cell, cache);
            return Materialized::Restored;
        }
        if (self.luck)(&spawn_key(cell)) >= self.spawn_probability {
            return Materialized::Barren;
        }
        let count = ((self.luck)(&coin_count_key(cell)) * f64::from(self.max_coins)) as u32 + 1;
        let coins = (0..count).map(|serial| CoinId::new(cell, serial)).collect();
        let cache = Cache::from_parts(cell, coins, count);
        log::debug!("cache {cell} spawned with {count} coins");
        self.live.insert(cell, cache);
        Materialized::Spawned(count as usize)
    }

    /// Materialize, then hand out the live cache if the cell has one.
    pub fn get_or_create(
        &mut self,
        cell: Cell,
        caretaker: &mut Caretaker,
    ) -> Option<&mut Cache> {
        self.materialize(cell, caretaker);
        self.live.get_mut(&cell)
    }

    pub fn get(&self, cell: Cell) -> Option<&Cache> {
        self.live.get(&cell)
    }

    pub fn get_mut(&mut self, cell: Cell) -> Option<&mut Cache> {
        self.live.get_mut(&cell)
    }

    /// Freeze the cell's cache into the caretaker and drop the live
    /// entry. Empty caches are evicted too — "generated and emptied"
    /// is state worth keeping, distinct from "never spawned". Returns
    /// the evicted coin count, or None if the cell had no live cache.
    pub fn evict(&mut self, cell: Cell, caretaker: &mut Caretaker) -> Option<usize> {
        let cache = self.live.remove(&cell)?;
        let count = cache.len();
        caretaker.save(cell, &cache);
        log::debug!("cache {cell} evicted with {count} coins");
        Some(count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Cell, &Cache)> {
        self.live.iter()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }
}
