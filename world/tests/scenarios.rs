use std::time::Duration;

use chipway_core::{
    Cell, Command, Direction, EntityId, EntityKind, Event, GateId, MotionState, MoveOutcome,
    Pushable, RejectReason, RelaySubject, SwitchId, TeleportState, TeleporterId, TileKind,
};
use chipway_world::{
    apply, query, resolve_destruction, resolve_teleports, resolve_win_check, GateSpec, Level,
    LevelStatus, SwitchSpec, TeleporterSpec, World,
};

const FRAME: Duration = Duration::from_millis(20);

fn world_from(rows: &[&str]) -> World {
    World::new(Level::from_rows("scenario", rows).expect("level is valid"))
}

fn player_id(world: &World) -> EntityId {
    query::player(world).expect("player exists").id
}

fn player_cell(world: &World) -> Cell {
    query::player(world).expect("player exists").cell
}

fn enemy_id(world: &World) -> EntityId {
    query::entity_view(world)
        .enemies()
        .next()
        .expect("enemy exists")
        .id
}

/// Runs the post-input phases the way the simulation loop orders them.
fn tick(world: &mut World, events: &mut Vec<Event>) {
    apply(world, Command::Tick { dt: FRAME }, events);
    resolve_destruction(world, events);
    resolve_teleports(world, events);
    resolve_win_check(world, events);
}

fn settle(world: &mut World, events: &mut Vec<Event>) {
    for _ in 0..25 {
        tick(world, events);
    }
}

fn step(world: &mut World, direction: Direction, events: &mut Vec<Event>) -> MoveOutcome {
    let player = player_id(world);
    let outcome = world.request_step(player, direction, events);
    settle(world, events);
    outcome
}

#[test]
fn step_into_wall_is_rejected() {
    let mut world = world_from(&["P#"]);
    let mut events = Vec::new();

    let outcome = step(&mut world, Direction::Right, &mut events);

    assert_eq!(outcome, MoveOutcome::Rejected);
    assert_eq!(player_cell(&world), Cell::new(0, 0), "player must not move");
    assert!(events.contains(&Event::StepRejected {
        entity: player_id(&world),
        direction: Direction::Right,
        reason: RejectReason::Wall,
    }));
}

#[test]
fn pushing_a_tile_moves_both_cells() {
    let mut world = world_from(&["PB."]);
    let mut events = Vec::new();

    let outcome = step(&mut world, Direction::Right, &mut events);

    assert_eq!(outcome, MoveOutcome::Accepted);
    assert_eq!(player_cell(&world), Cell::new(1, 0));
    let tiles = query::tile_layer(&world);
    assert_eq!(tiles.kind(Cell::new(2, 0)), TileKind::Moveable);
    assert_eq!(tiles.kind(Cell::new(1, 0)), TileKind::Empty);
    assert!(query::tile_slides(&world).is_empty(), "slide finished");
    assert!(events.contains(&Event::BlockPushed {
        pushable: Pushable::Tile,
        from: Cell::new(1, 0),
        to: Cell::new(2, 0),
    }));
}

#[test]
fn pushing_an_entity_moves_both_cells() {
    let mut world = world_from(&["PM."]);
    let mut events = Vec::new();

    assert_eq!(step(&mut world, Direction::Right, &mut events), MoveOutcome::Accepted);

    let block = query::entity_view(&world)
        .iter()
        .find(|entity| entity.kind == EntityKind::Moveable)
        .copied()
        .expect("block exists");
    assert_eq!(block.cell, Cell::new(2, 0));
    assert!(!block.is_moving());
    assert_eq!(player_cell(&world), Cell::new(1, 0));
}

#[test]
fn blocked_push_leaves_everything_unchanged() {
    for rows in [["PB#."], ["PBB."], ["PBM."], ["PBE."]] {
        let mut world = world_from(&rows);
        let tiles_before: Vec<_> = query::tile_layer(&world).moveable_cells().collect();
        let entities_before = query::entity_view(&world).into_vec();
        let mut events = Vec::new();

        let player = player_id(&world);
        let outcome = world.request_step(player, Direction::Right, &mut events);

        assert_eq!(outcome, MoveOutcome::Rejected, "push in {rows:?} must fail");
        assert_eq!(
            events,
            vec![Event::StepRejected {
                entity: player,
                direction: Direction::Right,
                reason: RejectReason::PushBlocked,
            }],
            "rejection in {rows:?} must not emit side effects"
        );
        let tiles_after: Vec<_> = query::tile_layer(&world).moveable_cells().collect();
        assert_eq!(tiles_before, tiles_after);
        assert_eq!(entities_before, query::entity_view(&world).into_vec());
    }
}

#[test]
fn push_onto_destructible_destroys_and_completes_together() {
    for rows in [["PBX"], ["PMD"]] {
        let mut world = world_from(&rows);
        let player = player_id(&world);
        let mut events = Vec::new();

        let outcome = world.request_step(player, Direction::Right, &mut events);

        assert_eq!(outcome, MoveOutcome::Accepted, "push in {rows:?} must succeed");
        let destroyed = events
            .iter()
            .position(|event| {
                matches!(
                    event,
                    Event::DestructibleDestroyed { cell, .. } if *cell == Cell::new(2, 0)
                )
            })
            .expect("destructible destroyed in the same call");
        let pushed = events
            .iter()
            .position(|event| {
                matches!(event, Event::BlockPushed { to, .. } if *to == Cell::new(2, 0))
            })
            .expect("push committed in the same call");
        assert!(destroyed < pushed, "destruction precedes the committed push");
        assert_eq!(query::tile_layer(&world).floor(Cell::new(2, 0)), TileKind::Empty);
        assert!(query::entity_view(&world)
            .iter()
            .all(|entity| entity.kind != EntityKind::Destructible));
    }
}

#[test]
fn destroying_an_empty_cell_is_a_no_op() {
    let mut world = world_from(&["P.X"]);
    let mut events = Vec::new();
    assert!(!world.try_destroy_at(Cell::new(1, 0), &mut events));
    assert!(events.is_empty());
    assert!(world.try_destroy_at(Cell::new(2, 0), &mut events));
    assert_eq!(events.len(), 1);
}

#[test]
fn enemies_never_push() {
    let mut world = world_from(&["EB.P"]);
    let enemy = enemy_id(&world);
    let mut events = Vec::new();

    let outcome = world.request_step(enemy, Direction::Right, &mut events);

    assert_eq!(outcome, MoveOutcome::Rejected);
    assert!(query::tile_layer(&world).has_moveable(Cell::new(1, 0)));
}

#[test]
fn dash_travels_full_distance_in_open_space() {
    let mut world = world_from(&["P....."]);
    let player = player_id(&world);
    let mut events = Vec::new();

    let outcome = world.request_dash(player, Direction::Right, &mut events);

    assert_eq!(outcome, MoveOutcome::Accepted);
    assert_eq!(
        events,
        vec![Event::MoveStarted {
            entity: player,
            from: Cell::new(0, 0),
            to: Cell::new(2, 0),
            motion: MotionState::Dashing,
        }]
    );
    let dashing = query::player(&world).expect("player exists");
    assert_eq!(dashing.motion, MotionState::Dashing);

    settle(&mut world, &mut events);
    assert_eq!(player_cell(&world), Cell::new(2, 0));
}

#[test]
fn dash_stops_before_pushables() {
    let mut world = world_from(&["P.B.."]);
    let player = player_id(&world);
    let mut events = Vec::new();

    assert_eq!(
        world.request_dash(player, Direction::Right, &mut events),
        MoveOutcome::Accepted
    );
    assert_eq!(player_cell(&world), Cell::new(1, 0), "dash stops before the block");
}

#[test]
fn dash_collects_pickups_it_passes_over() {
    let mut world = world_from(&["PC.."]);
    let player = player_id(&world);
    let mut events = Vec::new();

    assert_eq!(
        world.request_dash(player, Direction::Right, &mut events),
        MoveOutcome::Accepted
    );
    settle(&mut world, &mut events);

    assert_eq!(player_cell(&world), Cell::new(2, 0));
    let progress = query::win_progress(&world);
    assert_eq!((progress.collected, progress.total), (1, 1));
    assert!(progress.all_collected);
    assert!(events.contains(&Event::AllPickupsCollected));
}

#[test]
fn dash_flips_switches_it_passes_over() {
    let level = Level::from_rows("scenario", &["P...", "...."])
        .expect("level is valid")
        .with_gate(GateSpec {
            cells: vec![Cell::new(3, 1)],
            open: false,
        })
        .with_switch(SwitchSpec {
            cell: Cell::new(1, 0),
            gates: vec![0],
        });
    let mut world = World::new(level);
    let player = player_id(&world);
    let mut events = Vec::new();

    let _ = world.request_dash(player, Direction::Right, &mut events);
    settle(&mut world, &mut events);

    assert_eq!(player_cell(&world), Cell::new(2, 0));
    assert!(events.contains(&Event::SwitchToggled {
        switch: SwitchId::new(0),
        on: true,
    }));
    assert_eq!(query::gate_open(&world, GateId::new(0)), Some(true));
}

#[test]
fn dash_into_adjacent_wall_falls_back_to_step() {
    let mut world = world_from(&["P#"]);
    let player = player_id(&world);
    let mut events = Vec::new();

    let outcome = world.request_dash(player, Direction::Right, &mut events);

    assert_eq!(outcome, MoveOutcome::Rejected);
    assert_eq!(
        events,
        vec![Event::StepRejected {
            entity: player,
            direction: Direction::Right,
            reason: RejectReason::Wall,
        }],
        "zero-distance dash must fall back to a plain step"
    );
    assert_eq!(query::player(&world).expect("player exists").dash_cooldown, 0.0);
}

#[test]
fn dash_cooldown_falls_back_to_steps() {
    let mut world = world_from(&["P......."]);
    let player = player_id(&world);
    let mut events = Vec::new();

    let _ = world.request_dash(player, Direction::Right, &mut events);
    settle(&mut world, &mut events);
    events.clear();

    let outcome = world.request_dash(player, Direction::Right, &mut events);

    assert_eq!(outcome, MoveOutcome::Accepted);
    assert_eq!(
        events,
        vec![Event::MoveStarted {
            entity: player,
            from: Cell::new(2, 0),
            to: Cell::new(3, 0),
            motion: MotionState::Moving,
        }]
    );
}

#[test]
fn teleport_waits_for_occupied_destination() {
    let level = Level::from_rows("scenario", &["P...E.", "......"])
        .expect("level is valid")
        .with_teleporter(TeleporterSpec::new(Cell::new(1, 0), Cell::new(4, 0)));
    let mut world = World::new(level);
    let mut events = Vec::new();

    let _ = step(&mut world, Direction::Right, &mut events);
    assert_eq!(player_cell(&world), Cell::new(1, 0), "destination is occupied");
    let link = TeleporterId::new(0);
    let player = RelaySubject::Entity(player_id(&world));
    assert!(!world.try_relay(link, player, &mut events));

    let enemy = enemy_id(&world);
    assert_eq!(
        world.request_step(enemy, Direction::Down, &mut events),
        MoveOutcome::Accepted
    );
    assert!(world.try_relay(link, player, &mut events));
    assert_eq!(player_cell(&world), Cell::new(4, 0));
    assert_eq!(
        query::player(&world).expect("player exists").position,
        query::grid_space(&world).cell_center(Cell::new(4, 0)),
        "relay snaps without animation"
    );
}

#[test]
fn single_use_link_relays_at_most_once() {
    let mut spec = TeleporterSpec::new(Cell::new(1, 0), Cell::new(3, 0));
    spec.single_use = true;
    let level = Level::from_rows("scenario", &["P...."])
        .expect("level is valid")
        .with_teleporter(spec);
    let mut world = World::new(level);
    let mut events = Vec::new();

    let _ = step(&mut world, Direction::Right, &mut events);
    assert_eq!(player_cell(&world), Cell::new(3, 0));

    for _ in 0..3 {
        let _ = step(&mut world, Direction::Left, &mut events);
        let _ = step(&mut world, Direction::Left, &mut events);
        assert_eq!(player_cell(&world), Cell::new(1, 0), "spent link must not relay");
        let _ = step(&mut world, Direction::Right, &mut events);
        let _ = step(&mut world, Direction::Right, &mut events);
    }

    let relays = events
        .iter()
        .filter(|event| matches!(event, Event::TeleportEntered { .. }))
        .count();
    assert_eq!(relays, 1);
    assert_eq!(query::teleporters(&world)[0].state, TeleportState::Spent);
}

#[test]
fn paired_links_do_not_ping_pong() {
    let level = Level::from_rows("scenario", &["P....."])
        .expect("level is valid")
        .with_teleporter(TeleporterSpec::new(Cell::new(1, 0), Cell::new(4, 0)))
        .with_teleporter(TeleporterSpec::new(Cell::new(4, 0), Cell::new(1, 0)));
    let mut world = World::new(level);
    let mut events = Vec::new();

    let _ = step(&mut world, Direction::Right, &mut events);
    settle(&mut world, &mut events);
    assert_eq!(player_cell(&world), Cell::new(4, 0), "player stays on the far link");

    let _ = step(&mut world, Direction::Right, &mut events);
    let _ = step(&mut world, Direction::Left, &mut events);
    assert_eq!(player_cell(&world), Cell::new(1, 0), "re-entry relays back");
}

#[test]
fn pushed_tile_is_relayed_when_its_slide_ends() {
    let level = Level::from_rows("scenario", &["PB...."])
        .expect("level is valid")
        .with_teleporter(TeleporterSpec::new(Cell::new(2, 0), Cell::new(5, 0)));
    let mut world = World::new(level);
    let player = player_id(&world);
    let mut events = Vec::new();

    let _ = world.request_step(player, Direction::Right, &mut events);
    let mut relayed_at = None;
    for frame in 0..20 {
        let sliding_before = !query::tile_slides(&world).is_empty();
        let before = events.len();
        tick(&mut world, &mut events);
        let slide_finished = sliding_before && query::tile_slides(&world).is_empty();
        let relayed = events[before..].iter().any(|event| {
            matches!(
                event,
                Event::TeleportEntered {
                    subject: RelaySubject::MoveableTile,
                    ..
                }
            )
        });
        assert_eq!(
            relayed, slide_finished,
            "relay happens in the tick the slide ends, frame {frame}"
        );
        if relayed {
            relayed_at = Some(frame);
            break;
        }
    }
    assert!(relayed_at.is_some(), "tile relayed");
    assert!(query::tile_layer(&world).has_moveable(Cell::new(5, 0)));
    assert!(!query::tile_layer(&world).has_moveable(Cell::new(2, 0)));
}

#[test]
fn relayed_block_crushes_destructible_on_next_scan() {
    let level = Level::from_rows("scenario", &["PB..X"])
        .expect("level is valid")
        .with_teleporter(TeleporterSpec::new(Cell::new(2, 0), Cell::new(4, 0)));
    let mut world = World::new(level);
    let mut events = Vec::new();

    let _ = step(&mut world, Direction::Right, &mut events);

    let tiles = query::tile_layer(&world);
    assert!(!tiles.has_moveable(Cell::new(2, 0)));
    assert!(tiles.has_moveable(Cell::new(4, 0)));
    assert_eq!(tiles.floor(Cell::new(4, 0)), TileKind::Empty);
    let relayed = events
        .iter()
        .position(|event| matches!(event, Event::TeleportExited { .. }))
        .expect("block relayed");
    let destroyed = events
        .iter()
        .position(|event| {
            matches!(event, Event::DestructibleDestroyed { cell, .. } if *cell == Cell::new(4, 0))
        })
        .expect("destruction scan crushed the destructible");
    assert!(relayed < destroyed);
}

#[test]
fn player_is_not_relayed_onto_destructible() {
    let level = Level::from_rows("scenario", &["P.X"])
        .expect("level is valid")
        .with_teleporter(TeleporterSpec::new(Cell::new(1, 0), Cell::new(2, 0)));
    let mut world = World::new(level);
    let mut events = Vec::new();

    let _ = step(&mut world, Direction::Right, &mut events);

    assert_eq!(player_cell(&world), Cell::new(1, 0));
    assert_eq!(query::tile_layer(&world).floor(Cell::new(2, 0)), TileKind::Destructible);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::TeleportEntered { .. })));
}

#[test]
fn enemies_are_not_relayed() {
    let level = Level::from_rows("scenario", &["P.E..."])
        .expect("level is valid")
        .with_teleporter(TeleporterSpec::new(Cell::new(3, 0), Cell::new(5, 0)));
    let mut world = World::new(level);
    let enemy = enemy_id(&world);
    let mut events = Vec::new();

    let _ = world.request_step(enemy, Direction::Right, &mut events);
    settle(&mut world, &mut events);

    let cell = query::entity_view(&world).get(enemy).expect("enemy exists").cell;
    assert_eq!(cell, Cell::new(3, 0));
}

#[test]
fn two_pickups_and_goal_complete_exactly_once() {
    let level = Level::from_rows("scenario", &["PCWC"])
        .expect("level is valid")
        .with_next("second");
    let mut world = World::new(level);
    let mut events = Vec::new();

    let _ = step(&mut world, Direction::Right, &mut events);
    let _ = step(&mut world, Direction::Right, &mut events);
    assert!(query::win_progress(&world).goal_reached);
    assert_eq!(query::win_progress(&world).collected, 1);
    assert!(!events.contains(&Event::LevelComplete), "one pickup is missing");

    let _ = step(&mut world, Direction::Right, &mut events);
    settle(&mut world, &mut events);

    let completions = events
        .iter()
        .filter(|event| **event == Event::LevelComplete)
        .count();
    assert_eq!(completions, 1);
    assert!(events.contains(&Event::SceneChangeRequested {
        name: "second".to_owned(),
        delay: Duration::from_secs(1),
    }));
    assert_eq!(query::status(&world), LevelStatus::Complete);
}

#[test]
fn enemy_stepping_into_player_catches() {
    let mut world = world_from(&["PE."]);
    let enemy = enemy_id(&world);
    let mut events = Vec::new();

    let outcome = world.request_step(enemy, Direction::Left, &mut events);

    assert_eq!(outcome, MoveOutcome::Rejected);
    assert_eq!(player_cell(&world), Cell::new(0, 0));
    assert_eq!(query::status(&world), LevelStatus::Caught);
    assert!(events.contains(&Event::PlayerCaught { enemy }));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::SceneChangeRequested { name, .. } if name == "scenario"
    )));

    let player = player_id(&world);
    assert_eq!(
        world.request_step(player, Direction::Down, &mut events),
        MoveOutcome::Rejected,
        "no moves after the catch"
    );
}

#[test]
fn key_blocking_tiles_stop_enemies_only() {
    let mut world = world_from(&["PK.", ".E.", "..."]);
    let enemy = enemy_id(&world);
    let mut events = Vec::new();

    assert_eq!(
        world.request_step(enemy, Direction::Up, &mut events),
        MoveOutcome::Rejected
    );
    assert_eq!(step(&mut world, Direction::Right, &mut events), MoveOutcome::Accepted);
    assert_eq!(player_cell(&world), Cell::new(1, 0));
}

#[test]
fn switch_toggles_linked_gate() {
    let level = Level::from_rows("scenario", &["P...", "...."])
        .expect("level is valid")
        .with_gate(GateSpec {
            cells: vec![Cell::new(2, 0)],
            open: false,
        })
        .with_switch(SwitchSpec {
            cell: Cell::new(0, 1),
            gates: vec![0],
        });
    let mut world = World::new(level);
    let mut events = Vec::new();

    let _ = step(&mut world, Direction::Right, &mut events);
    assert_eq!(step(&mut world, Direction::Right, &mut events), MoveOutcome::Rejected);

    let _ = step(&mut world, Direction::Left, &mut events);
    let _ = step(&mut world, Direction::Down, &mut events);
    assert_eq!(query::gate_open(&world, GateId::new(0)), Some(true));
    assert!(events.contains(&Event::SwitchToggled {
        switch: SwitchId::new(0),
        on: true,
    }));

    let _ = step(&mut world, Direction::Up, &mut events);
    let _ = step(&mut world, Direction::Right, &mut events);
    assert_eq!(step(&mut world, Direction::Right, &mut events), MoveOutcome::Accepted);

    apply(
        &mut world,
        Command::TriggerSwitch {
            switch: SwitchId::new(0),
        },
        &mut events,
    );
    assert_eq!(query::gate_open(&world, GateId::new(0)), Some(false));
}
