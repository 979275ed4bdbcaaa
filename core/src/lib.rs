//! geostash-core — a deterministic, explorable geocaching simulation.
//!
//! An infinite, lazily materialized grid of cells, some of which hold
//! caches of collectible coins. Generation is a pure function of cell
//! coordinates, eviction snapshots mutated caches for exact later
//! restoration, and every coin identity is conserved across all
//! operations and across persistence round-trips.

pub mod cache;
pub mod caretaker;
pub mod codec;
pub mod coin;
pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod player;
pub mod rng;
pub mod session;
pub mod store;
pub mod types;
pub mod ui;
