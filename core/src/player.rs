//! Player state: position, inventory, trail, points, movement mode.

use serde::{Deserialize, Serialize};

use crate::coin::CoinId;
use crate::types::{LatLng, WatchId};

/// How the player currently moves. Switched explicitly by the session;
/// a tagged variant, not a strategy hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MovementMode {
    /// Discrete directional moves.
    Manual,
    /// Position fed by the geolocation collaborator under this watch.
    Tracking { watch: WatchId },
}

#[derive(Debug, Clone)]
pub struct Player {
    lat: f64,
    lng: f64,
    inventory: Vec<CoinId>,
    trail: Vec<LatLng>,
    points: u64,
    pub mode: MovementMode,
}

impl Player {
    /// A fresh player at the start position. The start counts as the
    /// first visited position on the trail.
    pub fn new(start: LatLng) -> Self {
        Self {
            lat: start.0,
            lng: start.1,
            inventory: Vec::new(),
            trail: vec![start],
            points: 0,
            mode: MovementMode::Manual,
        }
    }

    pub fn position(&self) -> LatLng {
        (self.lat, self.lng)
    }

    /// Accept a position update: move there and append to the trail.
    /// Exact repeats are appended too, keeping the persisted trail
    /// byte-faithful to what happened.
    pub fn record_position(&mut self, lat: f64, lng: f64) {
        self.lat = lat;
        self.lng = lng;
        self.trail.push((lat, lng));
    }

    pub fn inventory(&self) -> &[CoinId] {
        &self.inventory
    }

    pub fn has(&self, id: CoinId) -> bool {
        self.inventory.contains(&id)
    }

    /// Put a collected coin into the inventory. Refuses a duplicate
    /// identity so a replayed collect cannot clone a coin.
    pub fn hold(&mut self, id: CoinId) -> bool {
        if self.inventory.contains(&id) {
            return false;
        }
        self.inventory.push(id);
        true
    }

    /// Remove a coin for deposit. None if the player no longer holds
    /// it — callers treat that as a benign no-op.
    pub fn take(&mut self, id: CoinId) -> Option<CoinId> {
        let at = self.inventory.iter().position(|c| *c == id)?;
        Some(self.inventory.remove(at))
    }

    pub fn trail(&self) -> &[LatLng] {
        &self.trail
    }

    /// Monotonic score: total coins ever deposited. Not the inventory
    /// size — collecting does not score, depositing does.
    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn award_point(&mut self) {
        self.points += 1;
    }

    /// Restore persisted fields in one step. Position becomes the last
    /// trail entry; an empty trail falls back to `start`.
    pub(crate) fn restore(
        &mut self,
        inventory: Vec<CoinId>,
        trail: Vec<LatLng>,
        points: u64,
        start: LatLng,
    ) {
        let (lat, lng) = trail.last().copied().unwrap_or(start);
        self.lat = lat;
        self.lng = lng;
        self.inventory = inventory;
        self.trail = if trail.is_empty() { vec![start] } else { trail };
        self.points = points;
        self.mode = MovementMode::Manual;
    }
}
