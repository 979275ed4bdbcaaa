//! Collaborator boundaries.
//!
//! RULE: The core never touches a map, a widget, or a device. It calls
//! these traits; the embedding layer draws, wires popups to
//! [`GameSession::apply`](crate::session::GameSession::apply) with
//! `Collect`/`Deposit` commands, and feeds position samples back in.
//! All push-only except [`GeoSource`], whose handles the session holds.

use serde::Serialize;

use crate::coin::CoinId;
use crate::error::{GameError, GameResult};
use crate::grid::Cell;
use crate::types::WatchId;

/// Draws and removes cache regions and the movement trail.
pub trait RenderSink {
    fn cache_shown(&mut self, cell: Cell, coins: &[CoinId]);
    fn cache_removed(&mut self, cell: Cell);
    fn trail_extended(&mut self, lat: f64, lng: f64);
}

/// Computed summary pushed to the status display after every command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub points: u64,
    pub inventory: Vec<String>,
    pub trail_len: usize,
    pub live_caches: usize,
    pub frozen_caches: usize,
}

pub trait StatusSink {
    fn status_changed(&mut self, report: &StatusReport);
}

/// Geolocation device boundary. `subscribe` starts a watch and returns
/// its handle; `unsubscribe` releases it synchronously — after it
/// returns, samples under that handle are stale and the session drops
/// them.
pub trait GeoSource {
    fn subscribe(&mut self) -> GameResult<WatchId>;
    fn unsubscribe(&mut self, watch: WatchId);
}

/// Render sink that draws nothing. Headless runs and tests.
#[derive(Debug, Default)]
pub struct NullRender;

impl RenderSink for NullRender {
    fn cache_shown(&mut self, _cell: Cell, _coins: &[CoinId]) {}
    fn cache_removed(&mut self, _cell: Cell) {}
    fn trail_extended(&mut self, _lat: f64, _lng: f64) {}
}

/// Status sink that discards reports.
#[derive(Debug, Default)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn status_changed(&mut self, _report: &StatusReport) {}
}

/// Geolocation source that hands out sequential watch ids and trusts
/// the embedder to push samples. The headless runner's device.
#[derive(Debug, Default)]
pub struct SequentialGeo {
    next: WatchId,
}

impl GeoSource for SequentialGeo {
    fn subscribe(&mut self) -> GameResult<WatchId> {
        let watch = self.next;
        self.next += 1;
        Ok(watch)
    }

    fn unsubscribe(&mut self, _watch: WatchId) {}
}

/// Geolocation source for environments with no device, or where the
/// user denied access. Subscribing reports the denial; the session
/// stays in manual mode.
#[derive(Debug, Default)]
pub struct DeniedGeo;

impl GeoSource for DeniedGeo {
    fn subscribe(&mut self) -> GameResult<WatchId> {
        Err(GameError::GeoUnavailable)
    }

    fn unsubscribe(&mut self, _watch: WatchId) {}
}
