//! Save-record codec — full session state to/from plain JSON data.
//!
//! The record flattens the player's coins, the movement trail, and the
//! union of live caches and frozen mementos. Loading parks every cache
//! state in the caretaker; cells materialize from there when the
//! viewport next covers them, so known (possibly emptied) caches are
//! never re-run through generation.

use serde::{Deserialize, Serialize};

use crate::caretaker::CacheMemento;
use crate::coin::CoinId;
use crate::grid::Cell;
use crate::session::GameSession;
use crate::types::{LatLng, Serial};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinRecord {
    pub origin_i: i64,
    pub origin_j: i64,
    pub serial: Serial,
}

impl From<CoinId> for CoinRecord {
    fn from(id: CoinId) -> Self {
        Self {
            origin_i: id.origin.i,
            origin_j: id.origin.j,
            serial: id.serial,
        }
    }
}

impl From<CoinRecord> for CoinId {
    fn from(record: CoinRecord) -> Self {
        CoinId::new(Cell::new(record.origin_i, record.origin_j), record.serial)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    pub cell_key: String,
    #[serde(default)]
    pub next_serial: Serial,
    pub coins: Vec<CoinRecord>,
}

impl CacheRecord {
    /// Decode into a frozen cache state. None if the cell key is
    /// damaged — the caller skips the entry rather than crashing.
    pub fn into_memento(self) -> Option<(Cell, CacheMemento)> {
        let cell = Cell::parse_key(&self.cell_key)?;
        let coins: Vec<CoinId> = self.coins.into_iter().map(CoinId::from).collect();
        // Records from before the watermark field default next_serial
        // to 0; never let a rehydrated cache re-mint a live serial.
        let floor = coins
            .iter()
            .filter(|c| c.origin == cell)
            .map(|c| c.serial + 1)
            .max()
            .unwrap_or(0);
        let next_serial = self.next_serial.max(floor);
        Some((cell, CacheMemento { coins, next_serial }))
    }
}

/// The persisted shape. Field names are part of the save format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    pub player_coins: Vec<CoinRecord>,
    pub location_history: Vec<LatLng>,
    pub cache_states: Vec<CacheRecord>,
    #[serde(default)]
    pub points: u64,
}

/// Flatten the session: inventory, trail, and every known cache state
/// (live and frozen alike), in stable cell order.
pub fn encode(session: &GameSession) -> SaveRecord {
    let mut states: Vec<(Cell, Vec<CoinId>, Serial)> = session
        .caches()
        .map(|(cell, cache)| (*cell, cache.coins().to_vec(), cache.next_serial()))
        .chain(
            session
                .mementos()
                .map(|(cell, m)| (*cell, m.coins.clone(), m.next_serial)),
        )
        .collect();
    states.sort_by_key(|(cell, _, _)| *cell);

    SaveRecord {
        player_coins: session
            .inventory()
            .iter()
            .copied()
            .map(CoinRecord::from)
            .collect(),
        location_history: session.trail().to_vec(),
        cache_states: states
            .into_iter()
            .map(|(cell, coins, next_serial)| CacheRecord {
                cell_key: cell.key(),
                next_serial,
                coins: coins.into_iter().map(CoinRecord::from).collect(),
            })
            .collect(),
        points: session.points(),
    }
}

/// Parse a persisted payload. None on any malformed input — loading
/// falls back to a fresh session, never a crash.
pub fn decode(raw: &str) -> Option<SaveRecord> {
    match serde_json::from_str(raw) {
        Ok(record) => Some(record),
        Err(err) => {
            log::warn!("discarding malformed save record: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damaged_cell_key_is_skipped_not_fatal() {
        let record = CacheRecord {
            cell_key: "not-a-cell".into(),
            next_serial: 0,
            coins: vec![],
        };
        assert!(record.into_memento().is_none());
    }

    #[test]
    fn legacy_record_without_watermark_floors_above_live_serials() {
        let record = CacheRecord {
            cell_key: "2,3".into(),
            next_serial: 0,
            coins: vec![
                CoinRecord { origin_i: 2, origin_j: 3, serial: 0 },
                CoinRecord { origin_i: 2, origin_j: 3, serial: 4 },
                // Foreign coin deposited here; must not affect the floor.
                CoinRecord { origin_i: 9, origin_j: 9, serial: 7 },
            ],
        };
        let (_, memento) = record.into_memento().unwrap();
        assert_eq!(memento.next_serial, 5);
    }

    #[test]
    fn malformed_payloads_decode_to_none() {
        assert!(decode("").is_none());
        assert!(decode("{").is_none());
        assert!(decode("{\"playerCoins\": 3}").is_none());
    }
}
