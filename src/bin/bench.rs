//! Throughput benchmark over the arena simulation.
//!
//! `bench --readme` runs the canonical 2v2 soccar measurement: one million
//! ticks at 120hz, reporting ticks per second.

use boostball::{
    Arena, GameMode, Team,
    sim::{ArenaConfig, CarConfig, CarControls},
};
use std::{env, process::ExitCode, time::Instant};

const README_TICKS: u32 = 1_000_000;
const PROFILE_TICKS: u32 = 100_000;

struct BenchArgs {
    readme: bool,
    profile: bool,
    threads: usize,
    seed: u64,
    meshes: String,
}

fn parse_args() -> Result<BenchArgs, String> {
    let mut args = BenchArgs {
        readme: false,
        profile: false,
        threads: 1,
        seed: 123,
        meshes: "./collision_meshes".to_string(),
    };

    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--readme" => args.readme = true,
            "--profile" => args.profile = true,
            "--threads" => {
                let val = iter.next().ok_or("--threads requires a value")?;
                args.threads = val
                    .parse()
                    .map_err(|_| format!("invalid thread count: {val}"))?;
                if args.threads == 0 {
                    return Err("--threads must be at least 1".to_string());
                }
            }
            "--seed" => {
                let val = iter.next().ok_or("--seed requires a value")?;
                args.seed = val.parse().map_err(|_| format!("invalid seed: {val}"))?;
            }
            "--meshes" => {
                args.meshes = iter.next().ok_or("--meshes requires a value")?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    if !args.readme && !args.profile {
        args.readme = true;
    }

    Ok(args)
}

fn make_2v2_arena(seed: u64) -> Arena {
    let config = ArenaConfig {
        rng_seed: Some(seed),
        ..Default::default()
    };

    let mut arena =
        Arena::new_with_config(GameMode::Soccar, config, 120.0).expect("arena creation failed");

    for team in [Team::Blue, Team::Blue, Team::Orange, Team::Orange] {
        let id = arena.add_car(team, CarConfig::OCTANE);
        arena
            .set_car_controls(
                id,
                CarControls {
                    throttle: 1.0,
                    steer: if id % 2 == 0 { 0.2 } else { -0.15 },
                    boost: id % 2 == 0,
                    ..Default::default()
                },
            )
            .unwrap();
    }

    arena.reset_to_random_kickoff(Some(seed));
    arena
}

fn run_readme(seed: u64, threads: usize) {
    let total_ticks = README_TICKS;

    println!(
        "simulating {total_ticks} ticks of 2v2 soccar at 120hz on {threads} thread(s)..."
    );

    let start = Instant::now();
    if threads == 1 {
        let mut arena = make_2v2_arena(seed);
        arena.step(total_ticks);
    } else {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                std::thread::spawn(move || {
                    let mut arena = make_2v2_arena(seed + i as u64);
                    arena.step(total_ticks);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("benchmark thread panicked");
        }
    }

    let elapsed = start.elapsed().as_secs_f64();
    let simulated = total_ticks as f64 * threads as f64;
    println!(
        "simulated {simulated:.0} ticks in {elapsed:.2}s: {:.0} ticks/sec",
        simulated / elapsed
    );
}

fn run_profile(seed: u64) {
    println!("profiling {PROFILE_TICKS} ticks in 10 batches...");

    let mut arena = make_2v2_arena(seed);
    let batch = PROFILE_TICKS / 10;

    for i in 0..10 {
        let start = Instant::now();
        arena.step(batch);
        let elapsed = start.elapsed().as_secs_f64();
        println!(
            "batch {:>2}: {batch} ticks in {elapsed:.3}s ({:.0} ticks/sec)",
            i + 1,
            f64::from(batch) / elapsed
        );
    }
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("error: {msg}");
            eprintln!(
                "usage: bench [--readme] [--profile] [--threads N] [--seed N] [--meshes PATH]"
            );
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = boostball::init(&args.meshes, true) {
        eprintln!("failed to load collision meshes from {}: {err}", args.meshes);
        return ExitCode::FAILURE;
    }

    if args.profile {
        run_profile(args.seed);
    }
    if args.readme {
        run_readme(args.seed, args.threads);
    }

    ExitCode::SUCCESS
}
