//! The game session — one context object owning every piece of state.
//!
//! EXECUTION ORDER within a viewport refresh (fixed, never reordered):
//!   1. Evict every old-viewport cell that left view. All evictions
//!      land in the caretaker before step 2 begins.
//!   2. Materialize every new-viewport cell: live hit, else memento,
//!      else the spawn lottery.
//!
//! RULES:
//!   - Single-threaded, run-to-completion: each command (and each
//!     geolocation sample) is one atomic state transition.
//!   - No global mutable state. Serial watermarks live on caches, the
//!     luck function is injected, everything threads through here.
//!   - Missing coin on collect/deposit is a no-op, never an error.

use std::collections::HashSet;

use crate::cache::{Cache, CacheStore, Materialized};
use crate::caretaker::{CacheMemento, Caretaker};
use crate::codec::{self, SaveRecord};
use crate::coin::{CoinId, CoinLocation};
use crate::command::PlayerCommand;
use crate::config::GameConfig;
use crate::error::GameResult;
use crate::event::GameEvent;
use crate::grid::{Cell, CellIndex};
use crate::player::{MovementMode, Player};
use crate::rng::{self, LuckFn};
use crate::store::{KeyValueStore, MemoryStore};
use crate::ui::{
    DeniedGeo, GeoSource, NullRender, NullStatus, RenderSink, SequentialGeo, StatusReport,
    StatusSink,
};
use crate::types::{LatLng, WatchId};

pub struct GameSession {
    config: GameConfig,
    index: CellIndex,
    caches: CacheStore,
    caretaker: Caretaker,
    player: Player,
    center: Cell,
    store: Box<dyn KeyValueStore>,
    render: Box<dyn RenderSink>,
    status: Box<dyn StatusSink>,
    geo: Box<dyn GeoSource>,
}

impl GameSession {
    /// Build a fully wired session and materialize the starting
    /// viewport.
    pub fn new(
        config: GameConfig,
        store: Box<dyn KeyValueStore>,
        render: Box<dyn RenderSink>,
        status: Box<dyn StatusSink>,
        geo: Box<dyn GeoSource>,
    ) -> Self {
        Self::with_luck(rng::luck, config, store, render, status, geo)
    }

    /// Same, with an explicit luck source. Tests pass stubs here.
    pub fn with_luck(
        luck: LuckFn,
        config: GameConfig,
        store: Box<dyn KeyValueStore>,
        render: Box<dyn RenderSink>,
        status: Box<dyn StatusSink>,
        geo: Box<dyn GeoSource>,
    ) -> Self {
        let mut index = CellIndex::new(config.tile_size);
        let (lat, lng) = config.start();
        let center = index.cell_at(lat, lng);
        let caches = CacheStore::new(luck, &config);
        let player = Player::new((lat, lng));
        let mut session = Self {
            config,
            index,
            caches,
            caretaker: Caretaker::new(),
            player,
            center,
            store,
            render,
            status,
            geo,
        };
        let spawned = session.refresh_viewport(None, center).len();
        log::info!("session started at {center}, {spawned} caches in view");
        session.push_status();
        session
    }

    /// In-memory store, silent sinks, sequential geolocation. The
    /// shape every test and the runner's demo mode use.
    pub fn headless(config: GameConfig) -> Self {
        Self::headless_with_luck(config, rng::luck)
    }

    pub fn headless_with_luck(config: GameConfig, luck: LuckFn) -> Self {
        Self::with_luck(
            luck,
            config,
            Box::new(MemoryStore::new()),
            Box::new(NullRender),
            Box::new(NullStatus),
            Box::<SequentialGeo>::default(),
        )
    }

    /// Headless, but with geolocation denied. For exercising the
    /// unavailable-device path.
    pub fn headless_without_geo(config: GameConfig) -> Self {
        Self::with_luck(
            rng::luck,
            config,
            Box::new(MemoryStore::new()),
            Box::new(NullRender),
            Box::new(NullStatus),
            Box::new(DeniedGeo),
        )
    }

    // ── Command dispatch ───────────────────────────────────────────

    /// Apply one command to completion and report what happened.
    pub fn apply(&mut self, command: PlayerCommand) -> GameResult<Vec<GameEvent>> {
        let events = match command {
            PlayerCommand::Move { di, dj } => {
                let target = Cell::new(self.center.i + di, self.center.j + dj);
                let (lat, lng) = self.index.center_of(target);
                Ok(self.move_to(lat, lng))
            }
            PlayerCommand::Teleport { lat, lng } => Ok(self.move_to(lat, lng)),
            PlayerCommand::Collect { cell, coin } => Ok(self.collect(cell, coin)),
            PlayerCommand::Deposit { cell, coin } => Ok(self.deposit(cell, coin)),
            PlayerCommand::StartTracking => self.start_tracking(),
            PlayerCommand::StopTracking => Ok(self.stop_tracking()),
            PlayerCommand::Save { slot } => self.save(&slot),
            PlayerCommand::Load { slot } => self.load(&slot),
            PlayerCommand::Reset => Ok(self.reset()),
        }?;
        self.push_status();
        Ok(events)
    }

    /// Deliver one geolocation sample. Accepted only while tracking
    /// under the same watch handle; anything else is stale and
    /// dropped — unsubscribe is synchronous, so a dropped sample can
    /// never mutate state after cancellation.
    pub fn geo_sample(&mut self, watch: WatchId, lat: f64, lng: f64) -> Vec<GameEvent> {
        match self.player.mode {
            MovementMode::Tracking { watch: active } if active == watch => {
                let events = self.move_to(lat, lng);
                self.push_status();
                events
            }
            _ => {
                log::debug!("dropping geolocation sample under stale watch {watch}");
                Vec::new()
            }
        }
    }

    // ── Movement & viewport ────────────────────────────────────────

    fn move_to(&mut self, lat: f64, lng: f64) -> Vec<GameEvent> {
        self.player.record_position(lat, lng);
        self.render.trail_extended(lat, lng);
        let new_center = self.index.cell_at(lat, lng);
        let mut events = vec![GameEvent::PlayerMoved {
            lat,
            lng,
            cell: new_center,
        }];
        if new_center != self.center {
            events.extend(self.refresh_viewport(Some(self.center), new_center));
        }
        events
    }

    /// One atomic viewport recomputation. Eviction of departing cells
    /// fully completes before any materialization, so a cell can never
    /// be double-counted between the two passes.
    fn refresh_viewport(&mut self, old: Option<Cell>, new_center: Cell) -> Vec<GameEvent> {
        let radius = self.config.neighborhood_radius;
        let incoming = self.index.neighborhood(new_center, radius);
        let incoming_set: HashSet<Cell> = incoming.iter().copied().collect();
        let mut events = Vec::new();

        if let Some(old_center) = old {
            for cell in self.index.neighborhood(old_center, radius) {
                if incoming_set.contains(&cell) {
                    continue;
                }
                if let Some(coins) = self.caches.evict(cell, &mut self.caretaker) {
                    self.render.cache_removed(cell);
                    events.push(GameEvent::CacheEvicted { cell, coins });
                }
            }
        }

        for cell in incoming {
            let outcome = self.caches.materialize(cell, &mut self.caretaker);
            let event = match outcome {
                Materialized::Spawned(coins) => GameEvent::CacheSpawned { cell, coins },
                Materialized::Restored => GameEvent::CacheRestored {
                    cell,
                    coins: self.caches.get(cell).map_or(0, Cache::len),
                },
                Materialized::AlreadyLive | Materialized::Barren => continue,
            };
            if let Some(cache) = self.caches.get(cell) {
                self.render.cache_shown(cell, cache.coins());
            }
            events.push(event);
        }

        self.center = new_center;
        self.debug_audit();
        events
    }

    // ── Coin transfer ──────────────────────────────────────────────

    fn collect(&mut self, cell: Cell, coin: CoinId) -> Vec<GameEvent> {
        let Some(cache) = self.caches.get_mut(cell) else {
            log::debug!("collect {coin} at {cell}: no live cache, no-op");
            return Vec::new();
        };
        let Some(id) = cache.take(coin) else {
            log::debug!("collect {coin} at {cell}: coin not present, no-op");
            return Vec::new();
        };
        if !self.player.hold(id) {
            // Duplicate identity in the inventory cannot happen while
            // conservation holds; put the coin back rather than lose it.
            if let Some(cache) = self.caches.get_mut(cell) {
                cache.put(id);
            }
            return Vec::new();
        }
        self.debug_audit();
        vec![GameEvent::CoinCollected { cell, coin: id }]
    }

    fn deposit(&mut self, cell: Cell, coin: CoinId) -> Vec<GameEvent> {
        if !self.player.has(coin) {
            log::debug!("deposit {coin} at {cell}: not held, no-op");
            return Vec::new();
        }
        let Some(cache) = self.caches.get_mut(cell) else {
            log::debug!("deposit {coin} at {cell}: no live cache, no-op");
            return Vec::new();
        };
        let Some(id) = self.player.take(coin) else {
            return Vec::new();
        };
        if !cache.put(id) {
            self.player.hold(id);
            return Vec::new();
        }
        self.player.award_point();
        self.debug_audit();
        vec![GameEvent::CoinDeposited {
            cell,
            coin: id,
            points: self.player.points(),
        }]
    }

    // ── Geolocation lifecycle ──────────────────────────────────────

    fn start_tracking(&mut self) -> GameResult<Vec<GameEvent>> {
        if let MovementMode::Tracking { .. } = self.player.mode {
            return Ok(Vec::new());
        }
        let watch = self.geo.subscribe()?;
        self.player.mode = MovementMode::Tracking { watch };
        log::info!("tracking started under watch {watch}");
        Ok(vec![GameEvent::TrackingStarted { watch }])
    }

    fn stop_tracking(&mut self) -> Vec<GameEvent> {
        let MovementMode::Tracking { watch } = self.player.mode else {
            return Vec::new();
        };
        self.geo.unsubscribe(watch);
        self.player.mode = MovementMode::Manual;
        log::info!("tracking stopped, watch {watch} released");
        vec![GameEvent::TrackingStopped { watch }]
    }

    // ── Persistence & reset ────────────────────────────────────────

    fn save(&mut self, slot: &str) -> GameResult<Vec<GameEvent>> {
        let record = codec::encode(self);
        let payload = serde_json::to_string(&record)?;
        self.store.set(slot, &payload)?;
        log::info!("session saved to slot '{slot}'");
        Ok(vec![GameEvent::SessionSaved {
            slot: slot.to_string(),
        }])
    }

    fn load(&mut self, slot: &str) -> GameResult<Vec<GameEvent>> {
        let record = self.store.get(slot)?.and_then(|raw| codec::decode(&raw));
        let restored = record.is_some();
        if restored {
            log::info!("session loaded from slot '{slot}'");
        } else {
            log::warn!("slot '{slot}' missing or damaged; starting fresh");
        }
        let mut events = vec![GameEvent::SessionLoaded {
            slot: slot.to_string(),
            restored,
        }];
        events.extend(self.install(record));
        Ok(events)
    }

    fn reset(&mut self) -> Vec<GameEvent> {
        log::info!("session reset");
        let mut events = vec![GameEvent::SessionReset];
        events.extend(self.install(None));
        events
    }

    /// Replace all state with a persisted record, or with a fresh
    /// session when there is none. Cache states land in the caretaker
    /// and materialize only when the viewport covers them — known
    /// cells never re-run generation.
    fn install(&mut self, record: Option<SaveRecord>) -> Vec<GameEvent> {
        let mut events = self.stop_tracking();

        let shown: Vec<Cell> = self.caches.iter().map(|(cell, _)| *cell).collect();
        for cell in shown {
            self.render.cache_removed(cell);
        }
        self.caches.clear();
        self.caretaker.clear();

        let start = self.config.start();
        match record {
            Some(record) => {
                for state in record.cache_states {
                    if let Some((cell, memento)) = state.into_memento() {
                        self.caretaker.absorb(cell, memento);
                    }
                }
                self.player.restore(
                    record.player_coins.into_iter().map(CoinId::from).collect(),
                    record.location_history,
                    record.points,
                    start,
                );
            }
            None => self.player = Player::new(start),
        }

        let (lat, lng) = self.player.position();
        let center = self.index.cell_at(lat, lng);
        events.extend(self.refresh_viewport(None, center));
        events
    }

    // ── Introspection ──────────────────────────────────────────────

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn position(&self) -> LatLng {
        self.player.position()
    }

    pub fn center(&self) -> Cell {
        self.center
    }

    pub fn mode(&self) -> MovementMode {
        self.player.mode
    }

    pub fn inventory(&self) -> &[CoinId] {
        self.player.inventory()
    }

    pub fn trail(&self) -> &[LatLng] {
        self.player.trail()
    }

    pub fn points(&self) -> u64 {
        self.player.points()
    }

    pub fn caches(&self) -> impl Iterator<Item = (&Cell, &Cache)> {
        self.caches.iter()
    }

    pub fn cache_at(&self, cell: Cell) -> Option<&Cache> {
        self.caches.get(cell)
    }

    pub fn mementos(&self) -> impl Iterator<Item = (&Cell, &CacheMemento)> {
        self.caretaker.iter()
    }

    pub fn memento_at(&self, cell: Cell) -> Option<&CacheMemento> {
        self.caretaker.peek(cell)
    }

    /// Every coin in the universe with its current container, sorted
    /// by identity. Conservation says this list never gains or loses
    /// an identity except through fresh generation.
    pub fn census(&self) -> Vec<(CoinId, CoinLocation)> {
        let mut all = Vec::new();
        for (cell, cache) in self.caches.iter() {
            for coin in cache.coins() {
                all.push((*coin, CoinLocation::InCache { cell: *cell }));
            }
        }
        for coin in self.player.inventory() {
            all.push((*coin, CoinLocation::WithPlayer));
        }
        for (cell, memento) in self.caretaker.iter() {
            for coin in &memento.coins {
                all.push((*coin, CoinLocation::Frozen { cell: *cell }));
            }
        }
        all.sort_by_key(|(id, _)| *id);
        all
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            points: self.player.points(),
            inventory: self.player.inventory().iter().map(CoinId::label).collect(),
            trail_len: self.player.trail().len(),
            live_caches: self.caches.len(),
            frozen_caches: self.caretaker.len(),
        }
    }

    fn push_status(&mut self) {
        let report = self.status_report();
        self.status.status_changed(&report);
    }

    /// A coin in two containers is a programming-invariant violation:
    /// fail fast in debug builds, cost nothing in release.
    fn debug_audit(&self) {
        if cfg!(debug_assertions) {
            let census = self.census();
            for pair in census.windows(2) {
                assert!(
                    pair[0].0 != pair[1].0,
                    "coin {} present in two containers",
                    pair[0].0
                );
            }
        }
    }
}
