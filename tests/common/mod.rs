//! Shared test scaffolding: initializes the engine with synthetic arena
//! geometry so no dumped mesh assets are needed.
#![allow(dead_code)]

use ahash::AHashMap;
use boostball::{GameMode, phys::Triangle};
use glam::Vec3A;
use std::sync::Once;

fn quad(a: Vec3A, b: Vec3A, c: Vec3A, d: Vec3A) -> [Triangle; 2] {
    [
        Triangle {
            v0: a,
            v1: b,
            v2: c,
        },
        Triangle {
            v0: a,
            v1: c,
            v2: d,
        },
    ]
}

/// Vertical wall panel spanning `x0..x1` and `z0..z1` at the given `y`
fn wall_panel(x0: f32, x1: f32, y: f32, z0: f32, z1: f32) -> [Triangle; 2] {
    quad(
        Vec3A::new(x0, y, z0),
        Vec3A::new(x1, y, z0),
        Vec3A::new(x1, y, z1),
        Vec3A::new(x0, y, z1),
    )
}

/// Soccar-style back walls with goal mouth openings, plus net back walls
fn soccar_mesh() -> Vec<Triangle> {
    const EXTENT_X: f32 = 4096.0;
    const WALL_Y: f32 = 5120.0;
    const HEIGHT: f32 = 2048.0;
    const GOAL_HALF_WIDTH: f32 = 892.755;
    const GOAL_HEIGHT: f32 = 642.775;
    const NET_BACK_Y: f32 = 5990.0;

    let mut tris = Vec::new();
    for y_sign in [-1.0f32, 1.0] {
        let y = WALL_Y * y_sign;

        // Side panels beside the goal mouth
        tris.extend(wall_panel(-EXTENT_X, -GOAL_HALF_WIDTH, y, 0.0, HEIGHT));
        tris.extend(wall_panel(GOAL_HALF_WIDTH, EXTENT_X, y, 0.0, HEIGHT));
        // Panel above the crossbar
        tris.extend(wall_panel(
            -GOAL_HALF_WIDTH,
            GOAL_HALF_WIDTH,
            y,
            GOAL_HEIGHT,
            HEIGHT,
        ));
        // Back of the net
        tris.extend(wall_panel(
            -GOAL_HALF_WIDTH,
            GOAL_HALF_WIDTH,
            NET_BACK_Y * y_sign,
            0.0,
            GOAL_HEIGHT,
        ));
    }

    tris
}

/// Plain enclosing back walls for modes without goal mouths in the hull
fn walled_mesh(extent_y: f32, height: f32) -> Vec<Triangle> {
    let mut tris = Vec::new();
    for y_sign in [-1.0f32, 1.0] {
        tris.extend(wall_panel(-4096.0, 4096.0, extent_y * y_sign, 0.0, height));
    }
    tris
}

static INIT: Once = Once::new();

/// Idempotent per-process engine initialization with synthetic geometry
pub fn init_test_engine() {
    INIT.call_once(|| {
        let mut mesh_map = AHashMap::new();
        mesh_map.insert(GameMode::Soccar, vec![soccar_mesh()]);
        mesh_map.insert(GameMode::Hoops, vec![walled_mesh(3581.0, 1820.0)]);
        mesh_map.insert(GameMode::Dropshot, vec![walled_mesh(5120.0, 2024.0)]);

        boostball::init_from_mem(mesh_map, true).expect("test init failed");
    });
}

/// Ticks needed for a freshly spawned car to settle on its suspension
pub const SETTLE_TICKS: u32 = 120;
