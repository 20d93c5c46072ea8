use chipway_core::{Cell, EnemyBehavior, TeleportState};
use chipway_world::{query, Level, LevelError, World};

const INTRO: &str = include_str!("../../levels/intro.toml");

#[test]
fn bundled_level_loads_every_component() {
    let level = Level::from_toml_str(INTRO).expect("intro level parses");
    assert_eq!(level.name(), "intro");
    assert_eq!(level.next(), Some("intro-2"));
    assert_eq!(level.dimensions(), (9, 5));

    let world = World::new(level);
    let teleporters = query::teleporters(&world);
    assert_eq!(teleporters.len(), 1);
    assert_eq!(teleporters[0].state, TeleportState::Armed);
    assert_eq!(query::gates(&world).len(), 1);
    assert_eq!(query::switches(&world).len(), 1);
    assert_eq!(query::remaining_pickups(&world).len(), 1);

    let view = query::entity_view(&world);
    let enemy = view.enemies().next().expect("enemy exists");
    assert_eq!(enemy.cell, Cell::new(1, 3));
    assert_eq!(enemy.behavior, Some(EnemyBehavior::Wander));
}

#[test]
fn unknown_keys_are_rejected() {
    let source = format!("bonus = 3\n{INTRO}");
    let error = Level::from_toml_str(&source).expect_err("unknown key rejected");
    assert!(matches!(error, LevelError::Parse(_)), "got {error:?}");
}
