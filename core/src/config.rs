//! Game tuning knobs, loaded from a JSON file or defaulted.

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::Context;

use crate::error::GameResult;
use crate::types::LatLng;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GameConfig {
    /// Angular size of one grid cell, in degrees.
    pub tile_size: f64,
    /// Probability that a cell holds a cache at all.
    pub spawn_probability: f64,
    /// Coin count per fresh cache is in 1..=max_coins.
    pub max_coins: u32,
    /// Viewport is the square of this radius around the player's cell.
    pub neighborhood_radius: i64,
    /// Session start position. Null island unless configured.
    pub start_lat: f64,
    pub start_lng: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tile_size: 1e-4,
            spawn_probability: 0.1,
            max_coins: 5,
            neighborhood_radius: 8,
            start_lat: 0.0,
            start_lng: 0.0,
        }
    }
}

impl GameConfig {
    /// Read a config file. Missing keys take defaults; a missing or
    /// unreadable file is an error — see [`GameConfig::load_or_default`]
    /// for the tolerant path.
    pub fn from_file(path: &Path) -> GameResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config.sanitized())
    }

    /// Tolerant load: any failure logs a warning and falls back to
    /// defaults rather than refusing to start.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("config {}: {err}; using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn start(&self) -> LatLng {
        (self.start_lat, self.start_lng)
    }

    /// Clamp knobs into sane ranges. A probability outside [0, 1] or a
    /// zero coin ceiling is a config mistake, not a crash.
    fn sanitized(mut self) -> Self {
        self.spawn_probability = self.spawn_probability.clamp(0.0, 1.0);
        if self.max_coins == 0 {
            log::warn!("max_coins 0 is not usable; using 1");
            self.max_coins = 1;
        }
        if self.neighborhood_radius < 0 {
            log::warn!("negative neighborhood_radius; using 0");
            self.neighborhood_radius = 0;
        }
        self
    }
}
