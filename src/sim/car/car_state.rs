use crate::consts;
use crate::sim::{BallHitInfo, CarControls, PhysState};
use glam::{Mat3A, Vec3A};
use std::ops::{Deref, DerefMut};

/// Back-reference to the last car this car bumped, while the bump cooldown runs
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarContact {
    pub other_car_id: u32,
    pub cooldown_timer: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarState {
    pub phys: PhysState,
    /// Controls to simulate the car with on the next tick
    pub controls: CarControls,
    /// Controls from the last simulated tick (equals `controls` after a step)
    pub last_controls: CarControls,
    /// True if 3 or more wheels have contact
    pub is_on_ground: bool,
    /// Per-wheel contact, ordered FL, FR, BL, BR
    pub wheels_with_contact: [bool; 4],
    /// Whether we jumped to get into the air
    ///
    /// Can be false while airborne, if we left the ground without jumping
    pub has_jumped: bool,
    /// True if we have double jumped and are still in the air
    pub has_double_jumped: bool,
    /// True if we are in the air and have flipped or are currently flipping
    pub has_flipped: bool,
    /// Relative torque direction of the flip; a forward flip has positive Y
    pub flip_rel_torque: Vec3A,
    /// When currently jumping, the time since the jump started, else 0
    pub jump_time: f32,
    /// When currently flipping, the time since the flip started, else 0
    pub flip_time: f32,
    /// True during a flip (not an auto-flip, and not after a flip)
    pub is_flipping: bool,
    /// True during a jump
    pub is_jumping: bool,
    /// Total time spent in the air
    pub air_time: f32,
    /// Time spent in the air once no longer jumping; 0 if we never jumped
    pub air_time_since_jump: f32,
    /// Goes from 0 to 100
    pub boost: f32,
    /// Counts up from the last tick boost was used
    pub time_since_boosted: f32,
    /// True if we boosted this tick.
    /// There is a minimum boosting time once started.
    pub is_boosting: bool,
    pub boosting_time: f32,
    pub is_supersonic: bool,
    /// Time spent supersonic, for the supersonic maintain window
    pub supersonic_time: f32,
    /// State variable due to the rise/fall rate of handbrake inputs
    pub handbrake_val: f32,
    pub is_auto_flipping: bool,
    /// Counts down while auto-flipping
    pub auto_flip_timer: f32,
    pub auto_flip_torque_scale: f32,
    /// Normal of the last world contact, cleared once consumed
    pub world_contact_normal: Option<Vec3A>,
    pub car_contact: Option<CarContact>,
    pub is_demoed: bool,
    pub demo_respawn_timer: f32,
    pub ball_hit_info: Option<BallHitInfo>,
    /// Ticks since the last external `set_state`
    pub tick_count_since_update: u64,
}

impl Default for CarState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CarState {
    pub const DEFAULT: Self = Self {
        phys: PhysState {
            pos: Vec3A::new(0.0, 0.0, consts::car::spawn::SPAWN_Z),
            rot_mat: Mat3A::IDENTITY,
            vel: Vec3A::ZERO,
            ang_vel: Vec3A::ZERO,
        },
        controls: CarControls::DEFAULT,
        last_controls: CarControls::DEFAULT,
        is_on_ground: true,
        wheels_with_contact: [false; 4],
        has_jumped: false,
        has_double_jumped: false,
        has_flipped: false,
        flip_rel_torque: Vec3A::ZERO,
        jump_time: 0.0,
        flip_time: 0.0,
        is_flipping: false,
        is_jumping: false,
        air_time: 0.0,
        air_time_since_jump: 0.0,
        boost: consts::car::boost::SPAWN_AMOUNT,
        time_since_boosted: 0.0,
        is_boosting: false,
        boosting_time: 0.0,
        is_supersonic: false,
        supersonic_time: 0.0,
        handbrake_val: 0.0,
        is_auto_flipping: false,
        auto_flip_timer: 0.0,
        auto_flip_torque_scale: 0.0,
        world_contact_normal: None,
        car_contact: None,
        is_demoed: false,
        demo_respawn_timer: 0.0,
        ball_hit_info: None,
        tick_count_since_update: 0,
    };

    /// True iff the car can still initiate a jump, double-jump, or flip
    #[must_use]
    pub const fn has_flip_or_jump(&self) -> bool {
        self.is_on_ground
            || (!self.has_flipped
                && !self.has_double_jumped
                && self.air_time_since_jump < consts::car::jump::DOUBLEJUMP_MAX_DELAY)
    }

    #[must_use]
    pub const fn has_flip_reset(&self) -> bool {
        !self.is_on_ground && self.has_flip_or_jump() && !self.has_jumped
    }

    #[must_use]
    pub const fn got_flip_reset(&self) -> bool {
        !self.is_on_ground && !self.has_jumped
    }
}

impl Deref for CarState {
    type Target = PhysState;
    fn deref(&self) -> &Self::Target {
        &self.phys
    }
}

impl DerefMut for CarState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.phys
    }
}
