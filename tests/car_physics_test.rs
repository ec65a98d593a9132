mod common;

use boostball::{
    Arena, GameMode, Team,
    sim::{BallState, CarConfig, CarControls, CarState},
};
use common::{SETTLE_TICKS, init_test_engine};
use glam::Vec3A;

/// A soccar arena with one settled blue octane at midfield
fn arena_with_grounded_car() -> (Arena, u32) {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    let car_id = arena.add_car(Team::Blue, CarConfig::OCTANE);

    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.pos = Vec3A::new(0.0, -1000.0, 17.0);
    state.phys.vel = Vec3A::ZERO;
    arena.set_car_state(car_id, &state).unwrap();

    arena.step(SETTLE_TICKS);
    assert!(
        arena.get_car(car_id).unwrap().get_state().is_on_ground,
        "car failed to settle on its wheels"
    );

    (arena, car_id)
}

fn hold_controls(arena: &mut Arena, car_id: u32, controls: CarControls, ticks: u32) {
    arena.set_car_controls(car_id, controls).unwrap();
    arena.step(ticks);
}

#[test]
fn jump_timing_follows_the_press() {
    let (mut arena, car_id) = arena_with_grounded_car();

    // Press and hold jump
    let jump_held = CarControls {
        jump: true,
        ..Default::default()
    };
    hold_controls(&mut arena, car_id, jump_held, 1);

    let state = *arena.get_car(car_id).unwrap().get_state();
    assert!(state.has_jumped, "has_jumped must set on the press edge");
    assert!(state.is_jumping);

    // While held under the max jump time, the jump sustains
    arena.step(10);
    let state = *arena.get_car(car_id).unwrap().get_state();
    assert!(state.is_jumping);
    assert!(state.jump_time < 0.2 + 1e-3);
    assert!(!state.is_on_ground, "jump must leave the ground");

    // Hold well past the max time; the sustained jump must end
    arena.step(24);
    let state = *arena.get_car(car_id).unwrap().get_state();
    assert!(!state.is_jumping, "is_jumping past JUMP_MAX_TIME");
    assert!(state.has_jumped, "has_jumped persists while airborne");
    assert!(state.phys.vel.z > 0.0 || state.phys.pos.z > 30.0);
}

#[test]
fn strong_stick_flips_weak_stick_double_jumps() {
    for (pitch, expect_flip) in [(0.6f32, true), (0.3f32, false)] {
        let (mut arena, car_id) = arena_with_grounded_car();

        // Short jump, then release
        hold_controls(
            &mut arena,
            car_id,
            CarControls {
                jump: true,
                ..Default::default()
            },
            8,
        );
        hold_controls(&mut arena, car_id, CarControls::default(), 12);

        let state = *arena.get_car(car_id).unwrap().get_state();
        assert!(!state.is_on_ground, "car should be airborne before dodging");
        assert!(!state.has_flipped && !state.has_double_jumped);

        // Second jump press with the pitch stick deflected
        hold_controls(
            &mut arena,
            car_id,
            CarControls {
                jump: true,
                pitch,
                ..Default::default()
            },
            2,
        );

        let state = *arena.get_car(car_id).unwrap().get_state();
        assert_eq!(
            state.has_flipped, expect_flip,
            "pitch {pitch} flip mismatch"
        );
        assert_eq!(
            state.has_double_jumped, !expect_flip,
            "pitch {pitch} double jump mismatch"
        );
    }
}

#[test]
fn boost_drains_then_recharges() {
    let (mut arena, car_id) = arena_with_grounded_car();

    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.boost = 100.0;
    arena.set_car_state(car_id, &state).unwrap();

    // 3.33s of boosting burns 100 at 100/3 per second
    hold_controls(
        &mut arena,
        car_id,
        CarControls {
            boost: true,
            ..Default::default()
        },
        401,
    );
    let state = *arena.get_car(car_id).unwrap().get_state();
    assert!(state.boost <= 0.5, "boost was {}", state.boost);

    // After the recharge delay, boost climbs back at the recharge rate
    hold_controls(&mut arena, car_id, CarControls::default(), 150);
    let state = *arena.get_car(car_id).unwrap().get_state();
    let mutator = arena.get_mutator_config();
    let expected =
        (150.0 / 120.0 - mutator.recharge_boost_delay) * mutator.recharge_boost_per_second;
    assert!(state.boost > 0.0);
    assert!(
        (state.boost - expected).abs() < 1.5,
        "boost {} vs expected {expected}",
        state.boost
    );
}

#[test]
fn boost_stays_within_bounds_under_random_inputs() {
    let (mut arena, car_id) = arena_with_grounded_car();
    let mut rng = fastrand::Rng::with_seed(77);

    for _ in 0..20 {
        let controls = CarControls {
            throttle: rng.f32() * 2.0 - 1.0,
            steer: rng.f32() * 2.0 - 1.0,
            pitch: rng.f32() * 2.0 - 1.0,
            yaw: rng.f32() * 2.0 - 1.0,
            roll: rng.f32() * 2.0 - 1.0,
            jump: rng.bool(),
            boost: rng.bool(),
            handbrake: rng.bool(),
        };
        hold_controls(&mut arena, car_id, controls, 30);

        let state = arena.get_car(car_id).unwrap().get_state();
        assert!((0.0..=100.0).contains(&state.boost));

        if state.is_on_ground {
            let wheels = state
                .wheels_with_contact
                .iter()
                .filter(|&&contact| contact)
                .count();
            assert!(wheels >= 3, "on ground with only {wheels} wheels down");
        }
    }
}

#[test]
fn supersonic_follows_speed_with_hysteresis() {
    let (mut arena, car_id) = arena_with_grounded_car();

    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.pos = Vec3A::new(0.0, -3000.0, 800.0);
    state.phys.vel = Vec3A::new(0.0, 2250.0, 0.0);
    state.is_on_ground = false;
    arena.set_car_state(car_id, &state).unwrap();

    arena.step(1);
    assert!(arena.get_car(car_id).unwrap().get_state().is_supersonic);

    // Slightly below the start speed but above maintain: stays supersonic
    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.vel = Vec3A::new(0.0, 2180.0, 0.0);
    arena.set_car_state(car_id, &state).unwrap();
    arena.step(1);
    assert!(arena.get_car(car_id).unwrap().get_state().is_supersonic);

    // Far below: clears
    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.vel = Vec3A::new(0.0, 900.0, 0.0);
    arena.set_car_state(car_id, &state).unwrap();
    arena.step(1);
    assert!(!arena.get_car(car_id).unwrap().get_state().is_supersonic);
}

#[test]
fn throttle_drives_the_car_forward() {
    let (mut arena, car_id) = arena_with_grounded_car();

    hold_controls(
        &mut arena,
        car_id,
        CarControls {
            throttle: 1.0,
            ..Default::default()
        },
        120,
    );

    let state = arena.get_car(car_id).unwrap().get_state();
    let forward_speed = state.phys.vel.dot(state.phys.rot_mat.x_axis);
    assert!(
        forward_speed > 300.0,
        "after 1s of full throttle, forward speed was {forward_speed}"
    );
    assert!(state.is_on_ground);
}

#[test]
fn demolished_car_freezes_then_respawns_with_spawn_boost() {
    let (mut arena, car_id) = arena_with_grounded_car();

    arena.demolish_car(car_id).unwrap();
    let state = *arena.get_car(car_id).unwrap().get_state();
    assert!(state.is_demoed);
    assert!(state.demo_respawn_timer > 0.0);

    let frozen_pos = state.phys.pos;
    arena.step(30);
    assert_eq!(
        arena.get_car(car_id).unwrap().get_state().phys.pos,
        frozen_pos,
        "demoed car must stay frozen"
    );

    // Respawn delay is 3s
    arena.step(ticks_for_seconds(3.0) + 10);
    let state = arena.get_car(car_id).unwrap().get_state();
    assert!(!state.is_demoed);
    let spawn_boost = arena.get_mutator_config().car_spawn_boost_amount;
    assert!(
        (state.boost - spawn_boost).abs() < 1.0,
        "respawn boost was {}",
        state.boost
    );
}

const fn ticks_for_seconds(seconds: f32) -> u32 {
    (seconds * 120.0) as u32
}

#[test]
fn car_state_round_trips_within_tolerance() {
    let (mut arena, car_id) = arena_with_grounded_car();

    let mut state = CarState::DEFAULT;
    state.phys.pos = Vec3A::new(123.0, -456.0, 78.0);
    state.phys.vel = Vec3A::new(250.0, -100.0, 60.0);
    state.phys.ang_vel = Vec3A::new(0.1, 0.5, -0.4);
    state.boost = 63.0;
    state.is_on_ground = false;
    state.has_jumped = true;
    state.jump_time = 0.12;

    arena.set_car_state(car_id, &state).unwrap();
    let read_back = arena.get_car(car_id).unwrap().get_state();

    assert!((read_back.phys.pos - state.phys.pos).length() < 0.1);
    assert!((read_back.phys.vel - state.phys.vel).length() < 0.1);
    assert_eq!(read_back.boost, state.boost);
    assert_eq!(read_back.has_jumped, state.has_jumped);
    assert_eq!(read_back.jump_time, state.jump_time);
}

#[test]
fn ball_state_round_trips_and_clamps_speed() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Soccar).unwrap();

    let mut state = BallState::DEFAULT;
    state.phys.pos = Vec3A::new(500.0, 700.0, 400.0);
    state.phys.vel = Vec3A::new(1000.0, -2000.0, 500.0);
    state.phys.ang_vel = Vec3A::new(1.0, 2.0, -1.0);
    arena.set_ball_state(state);

    let read_back = arena.get_ball_state();
    assert!((read_back.phys.pos - state.phys.pos).length() < 0.1);
    assert!((read_back.phys.vel - state.phys.vel).length() < 0.1);
    assert_eq!(read_back.tick_count_since_update, 0);

    // Speeds beyond the mutator cap clamp on set
    let mut fast = BallState::DEFAULT;
    fast.phys.pos = Vec3A::new(0.0, 0.0, 500.0);
    fast.phys.vel = Vec3A::new(9000.0, 0.0, 0.0);
    arena.set_ball_state(fast);
    let max = arena.get_mutator_config().ball_max_speed;
    assert!(arena.get_ball_state().phys.vel.length() <= max + 1.0);
}

#[test]
fn ball_speed_stays_clamped_while_stepping() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    let car_id = arena.add_car(Team::Blue, CarConfig::OCTANE);

    // Drop the ball onto the car for a violent interaction
    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(0.0, -1000.0, 400.0);
    ball.phys.vel = Vec3A::new(0.0, 0.0, -3000.0);
    arena.set_ball_state(ball);

    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.pos = Vec3A::new(0.0, -1000.0, 17.0);
    arena.set_car_state(car_id, &state).unwrap();

    let max = arena.get_mutator_config().ball_max_speed;
    for _ in 0..120 {
        arena.step(1);
        let speed = arena.get_ball_state().phys.vel.length();
        assert!(speed <= max + 1.0, "ball speed {speed} exceeded the cap");
    }
}

#[test]
fn ball_touch_records_hit_info_on_the_car() {
    init_test_engine();
    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    let car_id = arena.add_car(Team::Blue, CarConfig::OCTANE);

    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.pos = Vec3A::new(0.0, -1000.0, 17.0);
    state.phys.vel = Vec3A::new(0.0, 1000.0, 0.0);
    state.phys.rot_mat = glam::Mat3A::from_rotation_z(std::f32::consts::FRAC_PI_2);
    arena.set_car_state(car_id, &state).unwrap();

    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(0.0, -800.0, 93.15);
    arena.set_ball_state(ball);

    arena.step(60);

    let state = arena.get_car(car_id).unwrap().get_state();
    let hit = state.ball_hit_info.expect("car never touched the ball");
    assert!(hit.tick_count_when_hit < 60);
    assert_eq!(arena.get_ball_state().last_hit_car_id, car_id);
    assert!(
        arena.get_ball_state().phys.vel.y > 100.0,
        "ball should have been knocked forward"
    );
}
