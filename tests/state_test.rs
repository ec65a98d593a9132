mod common;

use boostball::{
    Arena, GameMode, Team,
    sim::{
        ArenaConfig, BallState, BoostPadState, CarConfig, CarControls, GameState, SerializeError,
    },
};
use common::init_test_engine;
use glam::Vec3A;

fn busy_2v2_arena() -> Arena {
    init_test_engine();

    let config = ArenaConfig {
        rng_seed: Some(99),
        ..Default::default()
    };
    let mut arena = Arena::new_with_config(GameMode::Soccar, config, 120.0).unwrap();

    for (team, steer) in [
        (Team::Blue, 0.1),
        (Team::Blue, -0.2),
        (Team::Orange, 0.0),
        (Team::Orange, 0.3),
    ] {
        let id = arena.add_car(team, CarConfig::OCTANE);
        arena
            .set_car_controls(
                id,
                CarControls {
                    throttle: 1.0,
                    steer,
                    boost: id % 2 == 0,
                    ..Default::default()
                },
            )
            .unwrap();
    }

    arena.reset_to_random_kickoff(Some(99));
    arena
}

#[test]
fn mirror_wire_format_round_trips_after_play() {
    let mut arena = busy_2v2_arena();
    arena.step(1000);

    let state = GameState::from_arena(&arena);
    assert_eq!(state.cars.len(), 4);
    assert_eq!(state.pads.len(), 34);
    assert_eq!(state.tick_count, 1000);

    let bytes = state.to_bytes();
    assert_eq!(GameState::get_num_bytes(&bytes), Some(bytes.len()));

    let decoded = GameState::from_bytes(&bytes).unwrap();
    assert_eq!(
        decoded.to_bytes(),
        bytes,
        "encode -> decode -> encode must be byte-exact"
    );

    // Spot-check decoded fields against the arena
    assert_eq!(decoded.tick_count, arena.tick_count());
    assert_eq!(decoded.game_mode, GameMode::Soccar);
    assert_eq!(decoded.ball.phys.pos, arena.get_ball_state().phys.pos);
    for (wire, id) in decoded.cars.iter().zip(1u32..) {
        assert_eq!(wire.id, id);
        let car = arena.get_car(id).unwrap();
        assert_eq!(wire.state.phys.pos, car.get_state().phys.pos);
        assert_eq!(wire.state.boost, car.get_state().boost);
        assert_eq!(wire.config, *car.get_config());
    }
}

#[test]
fn snapshot_preserves_configuration_and_entity_states() {
    let mut arena = busy_2v2_arena();

    let mut mutators = *arena.get_mutator_config();
    mutators.ball_hit_extra_force_scale = 1.5;
    mutators.unlimited_flips = true;
    arena.set_mutator_config(mutators);

    arena.step(500);

    let snapshot = arena.serialize();
    let restored = Arena::deserialize_new(&snapshot).unwrap();

    assert_eq!(restored.game_mode(), arena.game_mode());
    assert_eq!(restored.tick_count(), arena.tick_count());
    assert!((restored.get_tick_rate() - arena.get_tick_rate()).abs() < 1e-3);
    assert_eq!(restored.get_mutator_config(), arena.get_mutator_config());
    assert_eq!(
        restored.get_ball_state().phys.pos,
        arena.get_ball_state().phys.pos
    );
    assert_eq!(
        restored.get_ball_state().phys.vel,
        arena.get_ball_state().phys.vel
    );

    // Pad states carry over in sorted order
    assert_eq!(restored.boost_pads().len(), arena.boost_pads().len());
    for (a, b) in arena.boost_pads().iter().zip(restored.boost_pads()) {
        assert_eq!(a.get_config().pos, b.get_config().pos);
        assert_eq!(a.get_state(), b.get_state());
    }

    // Car states and controls carry over; ids are freshly allocated
    let mut original_ids: Vec<u32> = arena.cars().keys().copied().collect();
    original_ids.sort_unstable();
    let mut restored_ids: Vec<u32> = restored.cars().keys().copied().collect();
    restored_ids.sort_unstable();
    assert_eq!(original_ids.len(), restored_ids.len());

    for (orig_id, rest_id) in original_ids.iter().zip(&restored_ids) {
        let orig = arena.get_car(*orig_id).unwrap();
        let rest = restored.get_car(*rest_id).unwrap();
        assert_eq!(orig.team, rest.team);
        assert_eq!(orig.get_config(), rest.get_config());
        assert_eq!(orig.get_state().phys.pos, rest.get_state().phys.pos);
        assert_eq!(orig.get_state().boost, rest.get_state().boost);
        assert_eq!(orig.get_controls(), rest.get_controls());
    }
}

#[test]
fn snapshot_rejects_corruption_without_side_effects() {
    let arena = busy_2v2_arena();
    let snapshot = arena.serialize();

    // Truncation
    let mut truncated = snapshot.clone();
    truncated.truncate(truncated.len() / 2);
    assert!(matches!(
        Arena::deserialize_new(&truncated),
        Err(SerializeError::UnexpectedEnd(_))
    ));

    // Bad magic
    let mut bad_magic = snapshot.clone();
    bad_magic[0] = b'X';
    assert!(matches!(
        Arena::deserialize_new(&bad_magic),
        Err(SerializeError::BadMagic)
    ));

    // Unsupported version
    let mut bad_version = snapshot.clone();
    bad_version[4] = 0xFF;
    assert!(matches!(
        Arena::deserialize_new(&bad_version),
        Err(SerializeError::BadVersion(_))
    ));
}

#[test]
fn set_state_does_not_clear_ball_hit_info() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    let car_id = arena.add_car(Team::Blue, CarConfig::OCTANE);

    // Drive into the ball to record a hit
    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.pos = Vec3A::new(0.0, -300.0, 17.0);
    state.phys.vel = Vec3A::new(0.0, 1200.0, 0.0);
    state.phys.rot_mat = glam::Mat3A::from_rotation_z(std::f32::consts::FRAC_PI_2);
    arena.set_car_state(car_id, &state).unwrap();
    arena.step(60);

    let with_hit = *arena.get_car(car_id).unwrap().get_state();
    let hit = with_hit.ball_hit_info.expect("no ball touch happened");

    // Round-tripping the state through set keeps the hit witness intact
    arena.set_car_state(car_id, &with_hit).unwrap();
    let after = arena.get_car(car_id).unwrap().get_state();
    assert_eq!(after.ball_hit_info, Some(hit));
    assert_eq!(after.tick_count_since_update, 0);
}

#[test]
fn pad_state_can_be_saved_and_restored() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Soccar).unwrap();

    arena.set_boost_pad_state(
        3,
        BoostPadState {
            is_active: false,
            cooldown: 2.5,
        },
    );

    let state = arena.get_boost_pad_state(3);
    assert!(!state.is_active);
    assert_eq!(state.cooldown, 2.5);

    // Cooldown continues from the restored value
    arena.step(120);
    let state = arena.get_boost_pad_state(3);
    assert!(!state.is_active);
    assert!((state.cooldown - 1.5).abs() < 0.02);
}

#[test]
fn dropshot_tiles_save_and_restore_through_the_arena() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Dropshot).unwrap();

    let mut tiles = arena.get_dropshot_tiles_state().unwrap().clone();
    assert_eq!(tiles.tiles().len(), 140);

    tiles.apply_damage(80, 2);
    arena.set_dropshot_tiles_state(&tiles);

    let restored = arena.get_dropshot_tiles_state().unwrap();
    assert_eq!(restored, &tiles);

    // Kickoff reset restores a pristine floor
    arena.reset_to_random_kickoff(Some(1));
    let reset = arena.get_dropshot_tiles_state().unwrap();
    assert!(
        reset
            .tiles()
            .iter()
            .all(|t| t.state == boostball::sim::TileState::Full)
    );
}

#[test]
fn mutator_replacement_takes_effect_atomically() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Soccar).unwrap();

    let mut mutators = *arena.get_mutator_config();
    mutators.gravity = Vec3A::new(0.0, 0.0, -100.0);
    mutators.ball_max_speed = 500.0;
    arena.set_mutator_config(mutators);
    assert_eq!(arena.get_mutator_config().ball_max_speed, 500.0);

    // The lowered cap applies from the next tick on
    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(0.0, 0.0, 500.0);
    ball.phys.vel = Vec3A::new(2000.0, 0.0, 0.0);
    arena.set_ball_state(ball);
    arena.step(1);
    assert!(arena.get_ball_state().phys.vel.length() <= 501.0);
}

#[test]
fn collision_toggles_pass_through_to_mutators() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Soccar).unwrap();

    arena.set_car_car_collision(false);
    arena.set_car_ball_collision(false);
    assert!(!arena.get_mutator_config().enable_car_car_collision);
    assert!(!arena.get_mutator_config().enable_car_ball_collision);

    // With car-ball collision off, driving through the ball does nothing
    let car_id = arena.add_car(Team::Blue, CarConfig::OCTANE);
    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.pos = Vec3A::new(0.0, -300.0, 17.0);
    state.phys.vel = Vec3A::new(0.0, 1500.0, 0.0);
    state.phys.rot_mat = glam::Mat3A::from_rotation_z(std::f32::consts::FRAC_PI_2);
    arena.set_car_state(car_id, &state).unwrap();

    arena.step(60);
    assert!(arena.get_car(car_id).unwrap().get_state().ball_hit_info.is_none());
    assert_eq!(arena.get_ball_state().last_hit_car_id, 0);
}
