//! Memento fidelity — eviction snapshots restore exactly, one-shot,
//! and as value copies.

use geostash_core::{
    coin::CoinId,
    command::PlayerCommand,
    config::GameConfig,
    grid::Cell,
    session::GameSession,
};

fn forced_config() -> GameConfig {
    GameConfig {
        spawn_probability: 1.0,
        neighborhood_radius: 2,
        ..GameConfig::default()
    }
}

fn half_luck(_key: &str) -> f64 {
    0.5
}

#[test]
fn evict_then_restore_is_lossless_without_mutation() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    let cell = Cell::new(-2, 1);
    let before = session.cache_at(cell).expect("forced spawn").coins().to_vec();

    session.apply(PlayerCommand::Move { di: 10, dj: 0 }).unwrap();
    let frozen = session.memento_at(cell).expect("departed cell must freeze");
    assert_eq!(frozen.coins, before);

    session.apply(PlayerCommand::Move { di: -10, dj: 0 }).unwrap();
    let restored = session.cache_at(cell).expect("cell back in view");
    assert_eq!(restored.coins(), before.as_slice());
    assert_eq!(restored.len(), before.len());
}

#[test]
fn an_emptied_cache_is_frozen_not_forgotten() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    let cell = Cell::new(0, 0);
    let coins = session.cache_at(cell).unwrap().coins().to_vec();
    for coin in coins {
        session.apply(PlayerCommand::Collect { cell, coin }).unwrap();
    }
    assert!(session.cache_at(cell).unwrap().is_empty());

    session.apply(PlayerCommand::Move { di: 10, dj: 0 }).unwrap();
    let frozen = session.memento_at(cell).expect("empty caches are evicted too");
    assert!(frozen.coins.is_empty());
    // The watermark survives so the cell can never re-mint serial 0.
    assert_eq!(frozen.next_serial, 3);

    session.apply(PlayerCommand::Move { di: -10, dj: 0 }).unwrap();
    assert!(session.cache_at(cell).unwrap().is_empty());
}

#[test]
fn restore_is_one_shot() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    let cell = Cell::new(1, 1);

    session.apply(PlayerCommand::Move { di: 10, dj: 0 }).unwrap();
    assert!(session.memento_at(cell).is_some());

    session.apply(PlayerCommand::Move { di: -10, dj: 0 }).unwrap();
    assert!(session.cache_at(cell).is_some());
    assert!(
        session.memento_at(cell).is_none(),
        "a restored cell must not linger in the caretaker"
    );
}

#[test]
fn snapshots_are_value_copies_not_aliases() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    let cell = Cell::new(0, 1);

    session.apply(PlayerCommand::Move { di: 10, dj: 0 }).unwrap();
    let first_snapshot = session.memento_at(cell).unwrap().clone();

    // Restore, mutate the live cache, evict again.
    session.apply(PlayerCommand::Move { di: -10, dj: 0 }).unwrap();
    session
        .apply(PlayerCommand::Collect { cell, coin: CoinId::new(cell, 0) })
        .unwrap();
    session.apply(PlayerCommand::Move { di: 10, dj: 0 }).unwrap();

    let second_snapshot = session.memento_at(cell).unwrap();
    assert_eq!(first_snapshot.coins.len(), 3, "earlier snapshot untouched");
    assert_eq!(second_snapshot.coins.len(), 2, "later snapshot sees the collect");
    assert_eq!(second_snapshot.next_serial, first_snapshot.next_serial);
}
