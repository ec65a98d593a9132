mod arena;
mod arena_config;
mod ball;
mod ball_hit_info;
mod boost_pad;
mod car;
mod contact_tracker;
mod dropshot_tiles;
mod error;
mod game_mode;
mod game_state;
mod mutator_config;
mod serialize;
mod team;

pub use arena::*;
pub use arena_config::*;
pub use ball::*;
pub use ball_hit_info::*;
pub use boost_pad::*;
pub use car::*;
pub use contact_tracker::*;
pub use dropshot_tiles::*;
pub use error::*;
pub use game_mode::*;
pub use game_state::*;
pub use mutator_config::*;
pub use serialize::*;
pub use team::*;

use glam::{Mat3A, Vec3A};

/// Entity kind tags stored on rigid bodies.
/// Contact dispatch orders pairs by ascending tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub(crate) enum UserInfoTypes {
    Car = 1,
    Ball = 2,
    None = i32::MAX,
}

impl UserInfoTypes {
    pub(crate) fn from_raw(raw: i32) -> Self {
        match raw {
            1 => Self::Car,
            2 => Self::Ball,
            _ => Self::None,
        }
    }
}

pub(crate) mod collision_masks {
    /// Hoops net geometry only collides with the ball
    pub const HOOPS_NET: u8 = 1 << 5;
    /// Dropshot floor, collided by cars and conditionally by the ball
    pub const DROPSHOT_FLOOR: u8 = 1 << 6;
    pub const DEFAULT: u8 = 1;
    pub const ALL: u8 = u8::MAX;
}

/// Shared kinematic state of any simulated entity
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhysState {
    pub pos: Vec3A,
    pub rot_mat: Mat3A,
    pub vel: Vec3A,
    pub ang_vel: Vec3A,
}

impl Default for PhysState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PhysState {
    pub const DEFAULT: Self = Self {
        pos: Vec3A::ZERO,
        rot_mat: Mat3A::IDENTITY,
        vel: Vec3A::ZERO,
        ang_vel: Vec3A::ZERO,
    };

    /// Mirror the state across the field center (blue <-> orange)
    #[must_use]
    pub fn get_inverted_y(mut self) -> Self {
        const INVERT_SCALE: Vec3A = Vec3A::new(-1.0, -1.0, 1.0);

        self.pos *= INVERT_SCALE;
        self.vel *= INVERT_SCALE;
        self.ang_vel *= INVERT_SCALE;

        for i in 0..3 {
            *self.rot_mat.col_mut(i) *= INVERT_SCALE;
        }

        self
    }

    #[must_use]
    pub const fn get_forward_dir(&self) -> Vec3A {
        self.rot_mat.x_axis
    }

    #[must_use]
    pub const fn get_right_dir(&self) -> Vec3A {
        self.rot_mat.y_axis
    }

    #[must_use]
    pub const fn get_up_dir(&self) -> Vec3A {
        self.rot_mat.z_axis
    }
}
