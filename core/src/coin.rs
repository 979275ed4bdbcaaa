//! Coin identity.
//!
//! A coin is identified by the cell it was generated in plus a
//! per-cell serial. That triple never changes — collecting a coin or
//! depositing it into a different cache relocates it, it does not
//! re-mint it. Which container currently holds a coin is derived
//! state, kept out of the identity on purpose.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::Cell;
use crate::types::Serial;

/// Globally unique, immutable coin identity: origin cell + serial.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct CoinId {
    pub origin: Cell,
    pub serial: Serial,
}

impl CoinId {
    pub fn new(origin: Cell, serial: Serial) -> Self {
        Self { origin, serial }
    }

    /// Compact `i:j#serial` label for logs and status displays.
    pub fn label(&self) -> String {
        format!("{}:{}#{}", self.origin.i, self.origin.j, self.serial)
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Where a coin currently sits. Display-only; never part of identity
/// and never persisted — containers are the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum CoinLocation {
    InCache { cell: Cell },
    WithPlayer,
    Frozen { cell: Cell },
}
