use serde::{Deserialize, Serialize};

use crate::coin::CoinId;
use crate::grid::Cell;

/// All player-issued commands. Every state transition in the core is
/// triggered by one of these (or by a geolocation sample, which the
/// session treats as a move).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    // ── Movement ──────────────────────────────────
    /// Step by whole cells.
    Move { di: i64, dj: i64 },
    /// Jump to an absolute position.
    Teleport { lat: f64, lng: f64 },

    // ── Coins ─────────────────────────────────────
    Collect { cell: Cell, coin: CoinId },
    Deposit { cell: Cell, coin: CoinId },

    // ── Geolocation ───────────────────────────────
    StartTracking,
    StopTracking,

    // ── Session ───────────────────────────────────
    Save { slot: String },
    Load { slot: String },
    Reset,
}
