//! Events emitted by the session, one batch per applied command.
//!
//! RULE: Events are facts about what happened, not requests. The UI
//! layer renders them; nothing in the core reacts to its own events.

use serde::{Deserialize, Serialize};

use crate::coin::CoinId;
use crate::grid::Cell;
use crate::types::WatchId;

/// Every observable state transition. Variants are added over time —
/// never removed or reordered, the runner's IPC peers match on `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Movement ───────────────────────────────────
    PlayerMoved {
        lat: f64,
        lng: f64,
        cell: Cell,
    },

    // ── Viewport ───────────────────────────────────
    CacheSpawned {
        cell: Cell,
        coins: usize,
    },
    CacheRestored {
        cell: Cell,
        coins: usize,
    },
    CacheEvicted {
        cell: Cell,
        coins: usize,
    },

    // ── Coins ──────────────────────────────────────
    CoinCollected {
        cell: Cell,
        coin: CoinId,
    },
    CoinDeposited {
        cell: Cell,
        coin: CoinId,
        points: u64,
    },

    // ── Geolocation ────────────────────────────────
    TrackingStarted {
        watch: WatchId,
    },
    TrackingStopped {
        watch: WatchId,
    },

    // ── Session ────────────────────────────────────
    SessionSaved {
        slot: String,
    },
    SessionLoaded {
        slot: String,
        restored: bool,
    },
    SessionReset,
}
