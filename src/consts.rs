//! Every named physical constant of the simulation.
//!
//! Values are in unreal units (UU, ~1cm), seconds, and radians unless
//! stated otherwise. Curves are immutable for the process lifetime.

use crate::math::LinearPieceCurve;
use glam::Vec3A;

pub const GRAVITY_Z: f32 = -650.0;

/// Combined contact material for a colliding pair
#[derive(Clone, Copy, Debug)]
pub struct MaterialCoefs {
    pub friction: f32,
    pub restitution: f32,
}

pub mod arena {
    use super::MaterialCoefs;

    pub const EXTENT_X: f32 = 4096.0;
    /// Distance from center to the goal-line plane
    pub const EXTENT_Y: f32 = 5120.0;
    pub const HEIGHT: f32 = 2048.0;

    pub const EXTENT_X_HOOPS: f32 = 2966.77;
    pub const EXTENT_Y_HOOPS: f32 = 3581.0;
    pub const HEIGHT_HOOPS: f32 = 1820.0;

    pub const HEIGHT_DROPSHOT: f32 = 2024.0;
    pub const FLOOR_HEIGHT_DROPSHOT: f32 = 1.5;

    pub const BASE_COEFS: MaterialCoefs = MaterialCoefs {
        friction: 0.6,
        restitution: 0.3,
    };
}

pub mod goal {
    /// Ball center must pass this Y (plus ball radius) for a soccar goal
    pub const SOCCAR_SCORE_BASE_THRESHOLD_Y: f32 = 5124.25;
    /// Half-width of the goal mouth
    pub const SOCCAR_GOAL_HALF_WIDTH: f32 = 892.755;
    /// Crossbar height
    pub const SOCCAR_GOAL_HEIGHT: f32 = 642.775;

    pub const HOOPS_SCORE_THRESHOLD_Z: f32 = 270.0;
    pub const HOOPS_RIM_SCALE_Y: f32 = 0.9;
    pub const HOOPS_RIM_OFFSET_Y: f32 = 2770.0;
    pub const HOOPS_RIM_RADIUS: f32 = 716.0;
}

pub mod ball {
    use super::MaterialCoefs;

    pub const MASS: f32 = 30.0;
    pub const REST_Z: f32 = 93.15;
    pub const MAX_SPEED: f32 = 6000.0;
    pub const MAX_ANG_SPEED: f32 = 6.0;
    pub const DRAG: f32 = 0.03;

    pub const RADIUS_SOCCAR: f32 = 91.25;
    pub const RADIUS_HOOPS: f32 = 96.38;
    pub const RADIUS_DROPSHOT: f32 = 100.21;

    pub const COEFS: MaterialCoefs = MaterialCoefs {
        friction: 0.35,
        restitution: 0.6,
    };

    pub mod car_hit_impulse {
        /// Relative speed beyond this adds no further extra impulse
        pub const MAX_DELTA_VEL: f32 = 4600.0;
        pub const Z_SCALE_NORMAL: f32 = 0.35;
        pub const Z_SCALE_HOOPS_GROUND: f32 = 0.55;
        pub const Z_SCALE_HOOPS_NORMAL_Z_THRESH: f32 = 0.1;
        pub const FORWARD_SCALE: f32 = 0.65;
    }
}

pub mod snowday {
    use super::MaterialCoefs;

    pub const PUCK_MASS: f32 = 50.0;
    pub const PUCK_RADIUS: f32 = 114.25;
    pub const PUCK_HEIGHT: f32 = 62.5;
    pub const PUCK_COEFS: MaterialCoefs = MaterialCoefs {
        friction: 0.1,
        restitution: 0.3,
    };
}

pub mod car {
    use super::{MaterialCoefs, Vec3A};

    pub const MASS: f32 = 180.0;
    pub const MAX_SPEED: f32 = 2300.0;
    pub const MAX_ANG_SPEED: f32 = 5.5;

    pub const BASE_COEFS: MaterialCoefs = MaterialCoefs {
        friction: 0.3,
        restitution: 0.1,
    };
    pub const HIT_BALL_COEFS: MaterialCoefs = MaterialCoefs {
        friction: 2.0,
        restitution: 0.0,
    };
    pub const HIT_CAR_COEFS: MaterialCoefs = MaterialCoefs {
        friction: 0.09,
        restitution: 0.1,
    };
    pub const HIT_WORLD_COEFS: MaterialCoefs = MaterialCoefs {
        friction: 0.3,
        restitution: 0.3,
    };

    pub mod jump {
        pub const MIN_TIME: f32 = 0.025;
        pub const MAX_TIME: f32 = 0.2;
        /// Pad after a minimum-time jump during which landing does not reset it
        pub const RESET_TIME_PAD: f32 = 1.0 / 40.0;
        pub const ACCEL: f32 = 4375.0 / 3.0;
        pub const IMMEDIATE_FORCE: f32 = 875.0 / 3.0;
        /// Window after a jump in which a double jump or flip may start
        pub const DOUBLEJUMP_MAX_DELAY: f32 = 1.25;
    }

    pub mod flip {
        /// Time of flip torque application
        pub const TORQUE_TIME: f32 = 0.65;
        /// Extra pitchlock time after the torque stops
        pub const PITCHLOCK_EXTRA_TIME: f32 = 0.3;
        pub const TORQUE_X: f32 = 260.0;
        pub const TORQUE_Y: f32 = 224.0;
        pub const INITIAL_VEL_SCALE: f32 = 500.0;
        pub const FORWARD_IMPULSE_MAX_SPEED_SCALE: f32 = 1.0;
        pub const SIDE_IMPULSE_MAX_SPEED_SCALE: f32 = 1.9;
        pub const BACKWARD_IMPULSE_MAX_SPEED_SCALE: f32 = 2.5;
        pub const BACKWARD_IMPULSE_SCALE_X: f32 = 16.0 / 15.0;
        /// Z-velocity damping factor per tick at 120hz during the damp window
        pub const Z_DAMP_120: f32 = 0.35;
        pub const Z_DAMP_START: f32 = 0.15;
        pub const Z_DAMP_END: f32 = 0.21;
    }

    pub mod boost {
        pub const MAX: f32 = 100.0;
        pub const USED_PER_SECOND: f32 = 100.0 / 3.0;
        /// Minimum time boost applies for once started
        pub const MIN_TIME: f32 = 0.1;
        pub const ACCEL_GROUND: f32 = 2975.0 / 3.0;
        pub const ACCEL_AIR: f32 = 3175.0 / 3.0;
        pub const SPAWN_AMOUNT: f32 = 100.0 / 3.0;
        pub const RECHARGE_PER_SECOND: f32 = 10.0;
        pub const RECHARGE_DELAY: f32 = 0.25;
    }

    pub mod supersonic {
        pub const START_SPEED: f32 = 2200.0;
        pub const MAINTAIN_MIN_SPEED: f32 = 2175.0;
        /// How long supersonic persists below the start speed
        pub const MAINTAIN_MAX_TIME: f32 = 1.0;
    }

    pub mod drive {
        /// Full-throttle ground acceleration at standstill
        pub const THROTTLE_ACCEL: f32 = 1600.0;
        pub const BRAKE_ACCEL: f32 = 3500.0;
        pub const THROTTLE_AIR_ACCEL: f32 = 200.0 / 3.0;
        pub const THROTTLE_DEADZONE: f32 = 0.001;
        /// Below this forward speed the car brakes to a stop
        pub const STOPPING_FORWARD_VEL: f32 = 25.0;
        pub const COASTING_BRAKE_FACTOR: f32 = 0.15;
        pub const BRAKING_NO_THROTTLE_SPEED_THRESH: f32 = 0.01;
        pub const POWERSLIDE_RISE_RATE: f32 = 5.0;
        pub const POWERSLIDE_FALL_RATE: f32 = 2.0;
    }

    pub mod suspension {
        /// Per-wheel spring rate, force per UU of compression
        pub const STIFFNESS: f32 = 6000.0;
        /// Per-wheel damping against suspension travel speed
        pub const DAMPING: f32 = 450.0;
        pub const MAX_TRAVEL: f32 = 12.0;
        pub const FORCE_SCALE_FRONT: f32 = 1.0;
        pub const FORCE_SCALE_BACK: f32 = 1.06;
        /// Extra downward stick force applied while wheels touch the world,
        /// as a multiple of gravity
        pub const STICKY_FORCE_SCALE: f32 = 0.5;
    }

    pub mod air_control {
        use super::Vec3A;

        /// (pitch, yaw, roll) torque inputs, scaled by `TORQUE_APPLY_SCALE`
        pub const TORQUE: Vec3A = Vec3A::new(130.0, 95.0, 400.0);
        pub const DAMPING: Vec3A = Vec3A::new(30.0, 20.0, 50.0);
        pub const TORQUE_APPLY_SCALE: f32 = 0.09587;
    }

    pub mod autoflip {
        /// World contact normal Z must exceed this for an auto-flip
        pub const NORM_Z_THRESH: f32 = 0.5;
        pub const ROLL_THRESH: f32 = 2.8;
        pub const TIME: f32 = 0.4;
        pub const IMPULSE: f32 = 200.0;
        pub const TORQUE: f32 = 50.0;
    }

    pub mod autoroll {
        pub const FORCE: f32 = 100.0;
        pub const TORQUE: f32 = 80.0;
    }

    pub mod bump {
        /// Local X of the contact must exceed this to count as a front bump
        pub const MIN_FORWARD_DIST: f32 = 64.5;
        pub const COOLDOWN_TIME: f32 = 0.25;
        /// Minimum closing speed for a supersonic demo
        pub const DEMO_MIN_REL_SPEED: f32 = 2200.0;
    }

    pub mod spawn {
        pub const SPAWN_Z: f32 = 17.0;
        pub const RESPAWN_TIME: f32 = 3.0;

        /// A canonical kickoff or respawn pose for the blue team.
        /// Orange poses are the Y-inverted mirror.
        #[derive(Clone, Copy, Debug)]
        pub struct SpawnPos {
            pub x: f32,
            pub y: f32,
            pub yaw_ang: f32,
        }

        impl SpawnPos {
            pub const fn new(x: f32, y: f32, yaw_ang: f32) -> Self {
                Self { x, y, yaw_ang }
            }
        }

        use std::f32::consts::PI;

        pub const KICKOFF_LOCATIONS_SOCCAR: [SpawnPos; 5] = [
            SpawnPos::new(-2048.0, -2560.0, PI * 0.25),
            SpawnPos::new(2048.0, -2560.0, PI * 0.75),
            SpawnPos::new(-256.0, -3840.0, PI * 0.5),
            SpawnPos::new(256.0, -3840.0, PI * 0.5),
            SpawnPos::new(0.0, -4608.0, PI * 0.5),
        ];

        pub const KICKOFF_LOCATIONS_HOOPS: [SpawnPos; 5] = [
            SpawnPos::new(-1536.0, -3072.0, PI * 0.5),
            SpawnPos::new(1536.0, -3072.0, PI * 0.5),
            SpawnPos::new(-256.0, -2816.0, PI * 0.5),
            SpawnPos::new(256.0, -2816.0, PI * 0.5),
            SpawnPos::new(0.0, -3200.0, PI * 0.5),
        ];

        pub const KICKOFF_LOCATIONS_HEATSEEKER: [SpawnPos; 4] = [
            SpawnPos::new(-1000.0, -4620.0, PI * 0.5),
            SpawnPos::new(1000.0, -4620.0, PI * 0.5),
            SpawnPos::new(-2000.0, -4620.0, PI * 0.5),
            SpawnPos::new(2000.0, -4620.0, PI * 0.5),
        ];

        pub const KICKOFF_LOCATIONS_DROPSHOT: [SpawnPos; 5] = [
            SpawnPos::new(-1867.0, -2380.0, PI * 0.25),
            SpawnPos::new(1867.0, -2380.0, PI * 0.75),
            SpawnPos::new(-256.0, -3576.0, PI * 0.5),
            SpawnPos::new(256.0, -3576.0, PI * 0.5),
            SpawnPos::new(0.0, -4088.0, PI * 0.5),
        ];

        pub const RESPAWN_LOCATIONS_SOCCAR: [SpawnPos; 4] = [
            SpawnPos::new(-2304.0, -4608.0, PI * 0.5),
            SpawnPos::new(-2688.0, -4608.0, PI * 0.5),
            SpawnPos::new(2304.0, -4608.0, PI * 0.5),
            SpawnPos::new(2688.0, -4608.0, PI * 0.5),
        ];

        pub const RESPAWN_LOCATIONS_HOOPS: [SpawnPos; 4] = [
            SpawnPos::new(-1152.0, -3072.0, PI * 0.5),
            SpawnPos::new(-1920.0, -3072.0, PI * 0.5),
            SpawnPos::new(1152.0, -3072.0, PI * 0.5),
            SpawnPos::new(1920.0, -3072.0, PI * 0.5),
        ];

        pub const RESPAWN_LOCATIONS_DROPSHOT: [SpawnPos; 4] = [
            SpawnPos::new(-2304.0, -3817.0, PI * 0.5),
            SpawnPos::new(-2688.0, -3817.0, PI * 0.5),
            SpawnPos::new(2304.0, -3817.0, PI * 0.5),
            SpawnPos::new(2688.0, -3817.0, PI * 0.5),
        ];

        use crate::sim::GameMode;

        /// Canonical kickoff spawn poses for the blue team in this mode
        #[must_use]
        pub fn kickoff_locations(game_mode: GameMode) -> &'static [SpawnPos] {
            match game_mode {
                GameMode::Hoops => &KICKOFF_LOCATIONS_HOOPS,
                GameMode::Heatseeker => &KICKOFF_LOCATIONS_HEATSEEKER,
                GameMode::Dropshot => &KICKOFF_LOCATIONS_DROPSHOT,
                _ => &KICKOFF_LOCATIONS_SOCCAR,
            }
        }

        /// Post-demo respawn poses for the blue team in this mode
        #[must_use]
        pub fn respawn_locations(game_mode: GameMode) -> &'static [SpawnPos] {
            match game_mode {
                GameMode::Hoops => &RESPAWN_LOCATIONS_HOOPS,
                GameMode::Dropshot => &RESPAWN_LOCATIONS_DROPSHOT,
                _ => &RESPAWN_LOCATIONS_SOCCAR,
            }
        }
    }
}

pub mod boost_pads {
    use super::Vec3A;

    pub const BOOST_AMOUNT_BIG: f32 = 100.0;
    pub const BOOST_AMOUNT_SMALL: f32 = 12.0;
    pub const COOLDOWN_BIG: f32 = 10.0;
    pub const COOLDOWN_SMALL: f32 = 4.0;

    /// Pickup sensor cylinder
    pub const CYL_HEIGHT: f32 = 95.0;
    pub const CYL_RAD_BIG: f32 = 208.0;
    pub const CYL_RAD_SMALL: f32 = 144.0;

    pub const LOCS_BIG_SOCCAR: [Vec3A; 6] = [
        Vec3A::new(-3584.0, 0.0, 73.0),
        Vec3A::new(3584.0, 0.0, 73.0),
        Vec3A::new(-3072.0, -4096.0, 73.0),
        Vec3A::new(3072.0, -4096.0, 73.0),
        Vec3A::new(-3072.0, 4096.0, 73.0),
        Vec3A::new(3072.0, 4096.0, 73.0),
    ];

    pub const LOCS_SMALL_SOCCAR: [Vec3A; 28] = [
        Vec3A::new(0.0, -4240.0, 70.0),
        Vec3A::new(-1792.0, -4184.0, 70.0),
        Vec3A::new(1792.0, -4184.0, 70.0),
        Vec3A::new(-940.0, -3308.0, 70.0),
        Vec3A::new(940.0, -3308.0, 70.0),
        Vec3A::new(0.0, -2816.0, 70.0),
        Vec3A::new(-3584.0, -2484.0, 70.0),
        Vec3A::new(3584.0, -2484.0, 70.0),
        Vec3A::new(-1788.0, -2300.0, 70.0),
        Vec3A::new(1788.0, -2300.0, 70.0),
        Vec3A::new(-2048.0, -1036.0, 70.0),
        Vec3A::new(0.0, -1024.0, 70.0),
        Vec3A::new(2048.0, -1036.0, 70.0),
        Vec3A::new(-1024.0, 0.0, 70.0),
        Vec3A::new(1024.0, 0.0, 70.0),
        Vec3A::new(-2048.0, 1036.0, 70.0),
        Vec3A::new(0.0, 1024.0, 70.0),
        Vec3A::new(2048.0, 1036.0, 70.0),
        Vec3A::new(-1788.0, 2300.0, 70.0),
        Vec3A::new(1788.0, 2300.0, 70.0),
        Vec3A::new(-3584.0, 2484.0, 70.0),
        Vec3A::new(3584.0, 2484.0, 70.0),
        Vec3A::new(0.0, 2816.0, 70.0),
        Vec3A::new(-940.0, 3308.0, 70.0),
        Vec3A::new(940.0, 3308.0, 70.0),
        Vec3A::new(-1792.0, 4184.0, 70.0),
        Vec3A::new(1792.0, 4184.0, 70.0),
        Vec3A::new(0.0, 4240.0, 70.0),
    ];

    pub const LOCS_BIG_HOOPS: [Vec3A; 6] = [
        Vec3A::new(-2176.0, -2944.0, 72.0),
        Vec3A::new(2176.0, -2944.0, 72.0),
        Vec3A::new(-1280.0, 0.0, 72.0),
        Vec3A::new(1280.0, 0.0, 72.0),
        Vec3A::new(-2176.0, 2944.0, 72.0),
        Vec3A::new(2176.0, 2944.0, 72.0),
    ];

    pub const LOCS_SMALL_HOOPS: [Vec3A; 14] = [
        Vec3A::new(0.0, -2816.0, 65.0),
        Vec3A::new(-1280.0, -2304.0, 65.0),
        Vec3A::new(1280.0, -2304.0, 65.0),
        Vec3A::new(-512.0, -1536.0, 65.0),
        Vec3A::new(512.0, -1536.0, 65.0),
        Vec3A::new(-2432.0, -1024.0, 65.0),
        Vec3A::new(2432.0, -1024.0, 65.0),
        Vec3A::new(-2432.0, 1024.0, 65.0),
        Vec3A::new(2432.0, 1024.0, 65.0),
        Vec3A::new(-512.0, 1536.0, 65.0),
        Vec3A::new(512.0, 1536.0, 65.0),
        Vec3A::new(-1280.0, 2304.0, 65.0),
        Vec3A::new(1280.0, 2304.0, 65.0),
        Vec3A::new(0.0, 2816.0, 65.0),
    ];
}

pub mod heatseeker {
    use super::Vec3A;

    pub const INITIAL_TARGET_SPEED: f32 = 2900.0;
    pub const TARGET_SPEED_INCREMENT: f32 = 85.0;
    /// Touches within this interval of the last do not speed the ball up
    pub const MIN_SPEEDUP_INTERVAL: f32 = 1.0;
    pub const MAX_SPEED: f32 = 4600.0;

    /// Point inside the goal the ball curves towards
    pub const TARGET_Y: f32 = 5120.0;
    pub const TARGET_Z: f32 = 320.0;

    /// Time after a touch before the ball starts homing again
    pub const RETARGET_DELAY: f32 = 0.1;
    /// Per-second blend rate of the velocity direction towards the target
    pub const TURN_RATE: f32 = 2.25;
    /// Per-second blend rate of the speed towards the target speed
    pub const SPEED_BLEND_RATE: f32 = 1.3;
    /// Homing only applies above this height
    pub const MIN_HOMING_Z: f32 = 91.25;

    pub const BALL_START_POS: Vec3A = Vec3A::new(-1000.0, -2220.0, 92.75);
    pub const BALL_START_VEL: Vec3A = Vec3A::new(0.0, -65.0, 650.0);
}

pub mod dropshot {
    /// Minimum closing speed for a hit to accumulate charge force
    pub const MIN_CHARGE_HIT_SPEED: f32 = 250.0;
    pub const MIN_ABSORBED_FORCE_FOR_CHARGE: f32 = 2500.0;
    pub const MIN_ABSORBED_FORCE_FOR_SUPERCHARGE: f32 = 11000.0;
    /// Downward speed the ball must land with to damage a tile
    pub const MIN_DAMAGE_IMPACT_SPEED: f32 = 300.0;
    /// Ticks between two damaging impacts
    pub const MIN_DAMAGE_INTERVAL_TICKS: u64 = 8;

    pub const NUM_TILES: usize = 140;
    pub const NUM_TILES_PER_TEAM: usize = 70;
    /// Center-to-corner radius of one hexagonal tile
    pub const TILE_HEX_RADIUS: f32 = 443.0;
    /// Tile rows per side run from the back wall to midfield, widening
    pub const TILE_ROWS: [usize; 7] = [7, 8, 9, 10, 11, 12, 13];
}

pub mod curves {
    use super::LinearPieceCurve;

    pub const DRIVE_SPEED_TORQUE_FACTOR: LinearPieceCurve<3> =
        LinearPieceCurve::new([(0.0, 1.0), (1400.0, 0.1), (1410.0, 0.0)]);

    pub const STEER_ANGLE_FROM_SPEED: LinearPieceCurve<6> = LinearPieceCurve::new([
        (0.0, 0.53356),
        (500.0, 0.31930),
        (1000.0, 0.18203),
        (1500.0, 0.10570),
        (1750.0, 0.08507),
        (3000.0, 0.03454),
    ]);

    pub const POWERSLIDE_STEER_ANGLE_FROM_SPEED: LinearPieceCurve<2> =
        LinearPieceCurve::new([(0.0, 0.39235), (2500.0, 0.12610)]);

    pub const LAT_FRICTION: LinearPieceCurve<2> =
        LinearPieceCurve::new([(0.0, 1.0), (1.0, 0.2)]);

    pub const LONG_FRICTION: LinearPieceCurve<0> = LinearPieceCurve::new([]);

    pub const HANDBRAKE_LAT_FRICTION_FACTOR: f32 = 0.9;

    pub const HANDBRAKE_LONG_FRICTION_FACTOR: LinearPieceCurve<2> =
        LinearPieceCurve::new([(0.0, 0.7), (1.0, 1.0)]);

    pub const NON_STICKY_FRICTION_FACTOR: LinearPieceCurve<3> =
        LinearPieceCurve::new([(0.0, 0.1), (0.7075, 0.5), (1.0, 1.0)]);

    pub const BALL_CAR_EXTRA_IMPULSE_FACTOR: LinearPieceCurve<5> = LinearPieceCurve::new([
        (0.0, 0.65),
        (500.0, 0.65),
        (2300.0, 0.55),
        (4600.0, 0.30),
        (6000.0, 0.30),
    ]);

    pub const BUMP_VEL_AMOUNT_GROUND: LinearPieceCurve<3> =
        LinearPieceCurve::new([(0.0, 5.0 / 3.0), (1400.0, 1100.0), (2200.0, 1530.0)]);

    pub const BUMP_VEL_AMOUNT_AIR: LinearPieceCurve<3> =
        LinearPieceCurve::new([(0.0, 5.0 / 4.0), (1400.0, 1390.0), (2200.0, 1945.0)]);

    pub const BUMP_UPWARD_VEL_AMOUNT: LinearPieceCurve<3> =
        LinearPieceCurve::new([(0.0, 2.0 / 6.0), (1400.0, 278.0), (2200.0, 417.0)]);
}
