//! Movement, viewport membership, trail recording, and the
//! geolocation tracking lifecycle.

use geostash_core::{
    coin::CoinId,
    command::PlayerCommand,
    config::GameConfig,
    error::GameError,
    event::GameEvent,
    grid::Cell,
    player::MovementMode,
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

fn count_events(events: &[GameEvent], pick: fn(&GameEvent) -> bool) -> usize {
    events.iter().filter(|e| pick(e)).count()
}

#[test]
fn viewport_holds_exactly_the_square_neighborhood() {
    let session = GameSession::headless_with_luck(forced_config(), half_luck);
    // Radius 2 around (0,0): a 5×5 square, every cell forced to spawn.
    assert_eq!(session.caches().count(), 25);
    assert!(session.cache_at(Cell::new(2, -2)).is_some());
    assert!(session.cache_at(Cell::new(3, 0)).is_none());
}

#[test]
fn a_single_step_evicts_one_edge_and_spawns_the_other() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    let events = session.apply(PlayerCommand::Move { di: 1, dj: 0 }).unwrap();

    let evicted = count_events(&events, |e| matches!(e, GameEvent::CacheEvicted { .. }));
    let spawned = count_events(&events, |e| matches!(e, GameEvent::CacheSpawned { .. }));
    assert_eq!(evicted, 5, "the departed column freezes");
    assert_eq!(spawned, 5, "the arriving column generates");
    assert_eq!(session.caches().count(), 25);
    assert_eq!(session.mementos().count(), 5);
    assert_eq!(session.center(), Cell::new(1, 0));
}

#[test]
fn eviction_precedes_materialization_in_the_event_stream() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    let events = session.apply(PlayerCommand::Move { di: 10, dj: 0 }).unwrap();

    let last_evict = events
        .iter()
        .rposition(|e| matches!(e, GameEvent::CacheEvicted { .. }))
        .expect("disjoint move must evict");
    let first_spawn = events
        .iter()
        .position(|e| matches!(e, GameEvent::CacheSpawned { .. }))
        .expect("disjoint move must spawn");
    assert!(
        last_evict < first_spawn,
        "all evictions must land before any materialization"
    );
}

#[test]
fn trail_records_every_accepted_update_in_order() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    assert_eq!(session.trail().len(), 1, "start position opens the trail");

    session
        .apply(PlayerCommand::Teleport { lat: 0.0012, lng: 0.0007 })
        .unwrap();
    session
        .apply(PlayerCommand::Teleport { lat: 0.0012, lng: 0.0007 })
        .unwrap();

    let trail = session.trail();
    assert_eq!(trail.len(), 3, "exact repeats are appended too");
    assert_eq!(trail[1], trail[2]);
}

#[test]
fn tracking_lifecycle_accepts_only_the_live_watch() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);

    let events = session.apply(PlayerCommand::StartTracking).unwrap();
    assert_eq!(events, vec![GameEvent::TrackingStarted { watch: 0 }]);
    assert_eq!(session.mode(), MovementMode::Tracking { watch: 0 });

    // Second start is a no-op; the watch does not churn.
    assert!(session.apply(PlayerCommand::StartTracking).unwrap().is_empty());
    assert_eq!(session.mode(), MovementMode::Tracking { watch: 0 });

    // A sample under the live watch is an ordinary move.
    let before = session.position();
    let events = session.geo_sample(0, 0.0031, -0.0044);
    assert!(matches!(events.first(), Some(GameEvent::PlayerMoved { .. })));
    assert_ne!(session.position(), before);

    // A sample under any other watch is stale and dropped.
    let position = session.position();
    assert!(session.geo_sample(7, 1.0, 1.0).is_empty());
    assert_eq!(session.position(), position);

    // Stop releases the handle synchronously; the old watch is dead.
    let events = session.apply(PlayerCommand::StopTracking).unwrap();
    assert_eq!(events, vec![GameEvent::TrackingStopped { watch: 0 }]);
    assert_eq!(session.mode(), MovementMode::Manual);
    assert!(session.geo_sample(0, 2.0, 2.0).is_empty());
    assert_eq!(session.position(), position);
}

#[test]
fn denied_geolocation_reports_and_stays_manual() {
    let mut session = GameSession::headless_without_geo(forced_config());
    let result = session.apply(PlayerCommand::StartTracking);
    assert!(matches!(result, Err(GameError::GeoUnavailable)));
    assert_eq!(session.mode(), MovementMode::Manual);
}

#[test]
fn reset_returns_to_the_start_and_stops_tracking() {
    let mut session = GameSession::headless_with_luck(forced_config(), half_luck);
    session.apply(PlayerCommand::StartTracking).unwrap();
    session.geo_sample(0, 0.05005, 0.05005);
    let origin = Cell::new(500, 500);
    session
        .apply(PlayerCommand::Collect { cell: origin, coin: CoinId::new(origin, 0) })
        .unwrap();

    let events = session.apply(PlayerCommand::Reset).unwrap();
    assert!(matches!(events.first(), Some(GameEvent::SessionReset)));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::TrackingStopped { .. })));

    assert_eq!(session.mode(), MovementMode::Manual);
    assert_eq!(session.center(), Cell::new(0, 0));
    assert_eq!(session.trail().len(), 1);
    assert!(session.inventory().is_empty());
    assert_eq!(session.mementos().count(), 0);
}
