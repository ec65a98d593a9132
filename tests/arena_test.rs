mod common;

use boostball::{
    Arena, GameMode, Team,
    consts,
    sim::{ArenaConfig, ArenaError, BallState, CarConfig, CarControls, GameState},
};
use common::init_test_engine;
use glam::Vec3A;
use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

fn seeded_config(seed: u64) -> ArenaConfig {
    ArenaConfig {
        rng_seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn tick_rate_out_of_range_fails_construction() {
    init_test_engine();

    for bad in [0.0, 14.9, 120.1, 500.0] {
        assert!(matches!(
            Arena::new_with_config(GameMode::Soccar, ArenaConfig::DEFAULT, bad),
            Err(ArenaError::InvalidTickRate(_))
        ));
    }

    assert!(Arena::new_with_config(GameMode::Soccar, ArenaConfig::DEFAULT, 120.0).is_ok());
    assert!(Arena::new_with_config(GameMode::Soccar, ArenaConfig::DEFAULT, 15.0).is_ok());
}

#[test]
fn step_advances_tick_count_exactly() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    arena.add_car(Team::Blue, CarConfig::OCTANE);

    assert_eq!(arena.tick_count(), 0);
    arena.step(7);
    assert_eq!(arena.tick_count(), 7);
    arena.step(120);
    assert_eq!(arena.tick_count(), 127);
}

#[test]
fn car_ids_are_monotonic_and_unique() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    let a = arena.add_car(Team::Blue, CarConfig::OCTANE);
    let b = arena.add_car(Team::Orange, CarConfig::DOMINUS);
    assert!(b > a);

    arena.remove_car(a).unwrap();
    let c = arena.add_car(Team::Blue, CarConfig::MERC);
    assert!(c > b, "removed ids must not be reused");

    assert!(matches!(
        arena.remove_car(a),
        Err(ArenaError::CarNotFound(_))
    ));
    assert!(arena.get_car(a).is_none());
    assert!(arena.get_car(b).is_some());
}

#[test]
fn kickoff_is_deterministic_for_a_seed() {
    init_test_engine();

    let spawn_snapshot = |seed: u64| {
        let mut arena =
            Arena::new_with_config(GameMode::Soccar, seeded_config(seed), 120.0).unwrap();
        arena.add_car(Team::Blue, CarConfig::OCTANE);
        arena.reset_to_random_kickoff(Some(42));

        let ball_pos = arena.get_ball_state().phys.pos;
        let car_id = *arena.cars().keys().next().unwrap();
        let car_pos = arena.get_car(car_id).unwrap().get_state().phys.pos;
        (ball_pos, car_pos)
    };

    let (ball_a, car_a) = spawn_snapshot(1);
    let (ball_b, car_b) = spawn_snapshot(1);

    assert_eq!(ball_a, ball_b);
    assert_eq!(car_a, car_b);

    // Ball rests at center
    assert_eq!(ball_a.truncate(), glam::Vec2::ZERO);

    // The car must sit at one of the five canonical kickoff spots
    let matches_spawn = consts::car::spawn::KICKOFF_LOCATIONS_SOCCAR
        .iter()
        .any(|spawn| (Vec3A::new(spawn.x, spawn.y, car_a.z) - car_a).length() < 1.0);
    assert!(matches_spawn, "car spawned at unexpected spot {car_a}");
}

#[test]
fn identical_seeds_produce_identical_trajectories() {
    init_test_engine();

    let run = |seed: u64| {
        let mut arena =
            Arena::new_with_config(GameMode::Soccar, seeded_config(seed), 120.0).unwrap();
        let blue = arena.add_car(Team::Blue, CarConfig::OCTANE);
        let orange = arena.add_car(Team::Orange, CarConfig::BREAKOUT);
        arena.reset_to_random_kickoff(Some(17));

        arena
            .set_car_controls(
                blue,
                CarControls {
                    throttle: 1.0,
                    boost: true,
                    ..Default::default()
                },
            )
            .unwrap();
        arena
            .set_car_controls(
                orange,
                CarControls {
                    throttle: 1.0,
                    steer: 0.3,
                    ..Default::default()
                },
            )
            .unwrap();

        arena.step(100);
        GameState::from_arena(&arena).to_bytes()
    };

    assert_eq!(run(5), run(5), "same seed must be byte-identical");
    assert_ne!(
        run(5),
        run(6),
        "different seeds must diverge within 100 ticks"
    );
}

#[test]
fn parallel_arenas_are_independent() {
    init_test_engine();

    let run = |seed: u64| {
        std::thread::spawn(move || {
            let mut arena =
                Arena::new_with_config(GameMode::Soccar, seeded_config(seed), 120.0).unwrap();
            for team in [Team::Blue, Team::Orange] {
                let id = arena.add_car(team, CarConfig::OCTANE);
                arena
                    .set_car_controls(
                        id,
                        CarControls {
                            throttle: 1.0,
                            ..Default::default()
                        },
                    )
                    .unwrap();
            }
            arena.reset_to_random_kickoff(Some(seed));
            arena.step(200);
            GameState::from_arena(&arena).to_bytes()
        })
    };

    let a = run(9).join().unwrap();
    let b = run(9).join().unwrap();
    assert_eq!(a, b);
}

#[test]
fn boost_pad_layout_is_sorted_and_stable() {
    init_test_engine();

    let arena = Arena::new(GameMode::Soccar).unwrap();
    let pads = arena.boost_pads();
    assert_eq!(pads.len(), 34);
    assert_eq!(
        pads.iter().filter(|p| p.get_config().is_big).count(),
        6
    );

    // Sorted by (y, then x)
    for pair in pads.windows(2) {
        let a = pair[0].get_config().pos;
        let b = pair[1].get_config().pos;
        assert!(
            (a.y, a.x) < (b.y, b.x),
            "pads out of order: {a} before {b}"
        );
    }

    // Same ordering after a reset and for a second arena
    let mut arena2 = Arena::new(GameMode::Soccar).unwrap();
    arena2.reset_to_random_kickoff(Some(3));
    for (a, b) in arena.boost_pads().iter().zip(arena2.boost_pads()) {
        assert_eq!(a.get_config().pos, b.get_config().pos);
    }
}

#[test]
fn void_mode_rejects_goal_and_pickup_callbacks() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::TheVoid).unwrap();
    assert!(arena.boost_pads().is_empty());

    assert!(matches!(
        arena.set_goal_score_callback(Arc::new(|_, _, _| {}), 0),
        Err(ArenaError::ModeUnsupported(GameMode::TheVoid))
    ));
    assert!(matches!(
        arena.set_boost_pickup_callback(Arc::new(|_, _, _| {}), 0),
        Err(ArenaError::ModeUnsupported(GameMode::TheVoid))
    ));

    // Bump and touch callbacks stay available
    assert!(arena.set_ball_touch_callback(Arc::new(|_, _, _| {}), 0).is_none());
}

#[test]
fn ball_crossing_goal_line_scores_once() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();

    let goals = Arc::new(AtomicU32::new(0));
    let goals_cb = goals.clone();
    arena
        .set_goal_score_callback(
            Arc::new(move |_, team, _| {
                assert_eq!(team, Team::Blue);
                goals_cb.fetch_add(1, Ordering::SeqCst);
            }),
            0,
        )
        .unwrap();

    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(0.0, 5000.0, 300.0);
    ball.phys.vel = Vec3A::new(0.0, 2000.0, 0.0);
    arena.set_ball_state(ball);

    arena.step(60);
    assert!(arena.is_ball_scored());
    assert_eq!(
        goals.load(Ordering::SeqCst),
        1,
        "goal must fire exactly once while the ball sits in the net"
    );
}

#[test]
fn callback_can_stop_the_step_loop() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    arena
        .set_goal_score_callback(Arc::new(|control, _, _| control.stop()), 0)
        .unwrap();

    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(0.0, 5000.0, 300.0);
    ball.phys.vel = Vec3A::new(0.0, 3000.0, 0.0);
    arena.set_ball_state(ball);

    arena.step(600);
    assert!(
        arena.tick_count() < 600,
        "stop must exit the loop early, got {}",
        arena.tick_count()
    );

    // Stepping works again afterwards
    let before = arena.tick_count();
    arena.step(5);
    assert_eq!(arena.tick_count(), before + 5);
}

#[test]
fn panicking_callback_reraises_at_step_exit() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    arena
        .set_goal_score_callback(Arc::new(|_, _, _| panic!("callback exploded")), 0)
        .unwrap();

    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(0.0, 5300.0, 300.0);
    arena.set_ball_state(ball);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| arena.step(10)));
    assert!(result.is_err(), "panic must propagate out of step");
}

#[test]
fn shot_prediction_overestimates_goal_entry() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();

    // Straight powerful shot at the orange goal mouth
    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(0.0, 3000.0, 200.0);
    ball.phys.vel = Vec3A::new(0.0, 4000.0, 100.0);
    arena.set_ball_state(ball);
    assert_eq!(
        arena.is_ball_probably_going_in(2.0, 0.0),
        Some(Team::Blue)
    );

    // Shot angled at the corner, not the mouth
    let mut wide = BallState::DEFAULT;
    wide.phys.pos = Vec3A::new(3000.0, 3000.0, 200.0);
    wide.phys.vel = Vec3A::new(500.0, 4000.0, 0.0);
    arena.set_ball_state(wide);
    assert_eq!(arena.is_ball_probably_going_in(2.0, 0.0), None);

    // A slow roller never arrives within the horizon
    let mut slow = BallState::DEFAULT;
    slow.phys.vel = Vec3A::new(0.0, 300.0, 0.0);
    arena.set_ball_state(slow);
    assert_eq!(arena.is_ball_probably_going_in(1.0, 0.0), None);
}

#[test]
fn bump_sets_cooldown_and_suppresses_repeat_callbacks() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    let mut mutators = *arena.get_mutator_config();
    mutators.demo_mode = boostball::sim::DemoMode::Disabled;
    arena.set_mutator_config(mutators);

    let bumper = arena.add_car(Team::Blue, CarConfig::OCTANE);
    let victim = arena.add_car(Team::Orange, CarConfig::OCTANE);

    // Bumper faces and drives +y, straight into the victim's side
    let mut bumper_state = *arena.get_car(bumper).unwrap().get_state();
    bumper_state.phys.pos = Vec3A::new(0.0, -200.0, 17.0);
    bumper_state.phys.rot_mat = glam::Mat3A::from_rotation_z(std::f32::consts::FRAC_PI_2);
    bumper_state.phys.vel = Vec3A::new(0.0, 2400.0, 0.0);
    bumper_state.is_on_ground = true;
    arena.set_car_state(bumper, &bumper_state).unwrap();

    let mut victim_state = *arena.get_car(victim).unwrap().get_state();
    victim_state.phys.pos = Vec3A::new(0.0, 0.0, 17.0);
    victim_state.phys.rot_mat = glam::Mat3A::IDENTITY;
    arena.set_car_state(victim, &victim_state).unwrap();

    let bumps = Arc::new(AtomicU32::new(0));
    let bumps_cb = bumps.clone();
    arena.set_car_bump_callback(
        Arc::new(move |_, event, _| {
            assert!(!event.is_demo);
            bumps_cb.fetch_add(1, Ordering::SeqCst);
        }),
        0,
    );

    arena.step(30);

    let contact = arena.get_car(bumper).unwrap().get_state().car_contact;
    assert!(bumps.load(Ordering::SeqCst) >= 1, "bump never fired");
    assert_eq!(
        bumps.load(Ordering::SeqCst),
        1,
        "cooldown must suppress repeat bumps"
    );
    if let Some(contact) = contact {
        assert_eq!(contact.other_car_id, victim);
    }
}

#[test]
fn cloned_arena_reproduces_the_original() {
    init_test_engine();

    let mut arena = Arena::new_with_config(GameMode::Soccar, seeded_config(11), 120.0).unwrap();
    let blue = arena.add_car(Team::Blue, CarConfig::OCTANE);
    arena.add_car(Team::Orange, CarConfig::HYBRID);
    arena.reset_to_random_kickoff(Some(11));
    arena
        .set_car_controls(
            blue,
            CarControls {
                throttle: 1.0,
                boost: true,
                ..Default::default()
            },
        )
        .unwrap();
    arena.step(50);

    let mut clone = arena.clone_arena(false);
    assert_eq!(clone.tick_count(), arena.tick_count());
    assert_eq!(
        GameState::from_arena(&clone).to_bytes(),
        GameState::from_arena(&arena).to_bytes()
    );

    // Both copies continue identically
    arena.step(50);
    clone.step(50);
    assert_eq!(
        GameState::from_arena(&clone).to_bytes(),
        GameState::from_arena(&arena).to_bytes()
    );
}

#[test]
fn boost_pickup_fires_and_pad_goes_inactive() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Soccar).unwrap();
    let car_id = arena.add_car(Team::Blue, CarConfig::OCTANE);

    // Park the car on a known small pad with empty boost
    let pad_idx = arena
        .boost_pads()
        .iter()
        .position(|p| !p.get_config().is_big)
        .unwrap();
    let pad_pos = arena.boost_pads()[pad_idx].get_config().pos;

    let mut state = *arena.get_car(car_id).unwrap().get_state();
    state.phys.pos = Vec3A::new(pad_pos.x, pad_pos.y, 17.0);
    state.phys.vel = Vec3A::ZERO;
    state.boost = 0.0;
    arena.set_car_state(car_id, &state).unwrap();

    let pickups = Arc::new(AtomicU32::new(0));
    let pickups_cb = pickups.clone();
    arena
        .set_boost_pickup_callback(
            Arc::new(move |_, event, _| {
                pickups_cb.fetch_add(1, Ordering::SeqCst);
                assert_eq!(event.car_id, 1);
            }),
            0,
        )
        .unwrap();

    arena.step(5);

    assert!(pickups.load(Ordering::SeqCst) >= 1);
    let car_boost = arena.get_car(car_id).unwrap().get_state().boost;
    assert!(car_boost >= 12.0, "boost after pickup was {car_boost}");
    assert!(!arena.boost_pads()[pad_idx].get_state().is_active);
    assert!(arena.boost_pads()[pad_idx].get_state().cooldown > 0.0);
}

#[test]
fn heatseeker_homes_toward_the_target_net() {
    init_test_engine();

    let mut arena = Arena::new(GameMode::Heatseeker).unwrap();

    let mut ball = BallState::DEFAULT;
    ball.phys.pos = Vec3A::new(1000.0, 0.0, 500.0);
    ball.phys.vel = Vec3A::new(-800.0, 0.0, 100.0);
    ball.hs_info.y_target_dir = 1.0;
    ball.hs_info.time_since_hit = 1.0;
    arena.set_ball_state(ball);

    arena.step(60);

    let vel = arena.get_ball_state().phys.vel;
    assert!(
        vel.y > 500.0,
        "ball should be curving towards +y, vel was {vel}"
    );
}
