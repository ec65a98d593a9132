use crate::{
    consts,
    phys::{PhysWorld, RigidBody, rigid_body::RigidBodyConstructionInfo, Shape},
    sim::{GameMode, MutatorConfig, PhysState, UserInfoTypes, collision_masks},
};
use glam::{Mat3A, Vec3A};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeatseekerInfo {
    /// Which net the ball should seek towards; 0 = no net
    pub y_target_dir: f32,
    pub cur_target_speed: f32,
    pub time_since_hit: f32,
}

impl Default for HeatseekerInfo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl HeatseekerInfo {
    pub const DEFAULT: Self = Self {
        y_target_dir: 0.0,
        cur_target_speed: consts::heatseeker::INITIAL_TARGET_SPEED,
        time_since_hit: 0.0,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DropshotInfo {
    /// Charge level, which controls the damage radius when hitting tiles:
    /// 1 damages 1 tile, 2 damages 7 tiles, 3 damages 19 tiles
    pub charge_level: i32,
    /// Accumulated hit force; resets when a tile is damaged
    pub accumulated_hit_force: f32,
    /// Which side of the field the ball can damage (0 = none, -1 = blue, 1 = orange)
    pub y_target_dir: f32,
    pub has_damaged: bool,
    /// Only valid if `has_damaged`
    pub last_damage_tick: u64,
}

impl Default for DropshotInfo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl DropshotInfo {
    pub const DEFAULT: Self = Self {
        charge_level: 1,
        accumulated_hit_force: 0.0,
        y_target_dir: 0.0,
        has_damaged: false,
        last_damage_tick: 0,
    };
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BallState {
    pub phys: PhysState,
    /// Id of the last car to touch the ball; 0 = none
    pub last_hit_car_id: u32,
    pub hs_info: HeatseekerInfo,
    pub ds_info: DropshotInfo,
    /// Ticks since the last external `set_state`
    pub tick_count_since_update: u64,
}

impl Default for BallState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BallState {
    pub const DEFAULT: Self = Self {
        phys: PhysState {
            pos: Vec3A::new(0.0, 0.0, consts::ball::REST_Z),
            rot_mat: Mat3A::IDENTITY,
            vel: Vec3A::ZERO,
            ang_vel: Vec3A::ZERO,
        },
        last_hit_car_id: 0,
        hs_info: HeatseekerInfo::DEFAULT,
        ds_info: DropshotInfo::DEFAULT,
        tick_count_since_update: 0,
    };
}

impl std::ops::Deref for BallState {
    type Target = PhysState;
    fn deref(&self) -> &Self::Target {
        &self.phys
    }
}

impl std::ops::DerefMut for BallState {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.phys
    }
}

pub(crate) struct Ball {
    pub state: BallState,
    pub rigid_body_idx: usize,
    /// Bump and hit impulses accumulate here and apply after the solver step
    pub velocity_impulse_cache: Vec3A,
}

impl Ball {
    fn make_collision_shape(game_mode: GameMode, mutator_config: &MutatorConfig) -> Shape {
        if game_mode == GameMode::Snowday {
            Shape::Cylinder {
                radius: mutator_config.ball_radius,
                half_height: consts::snowday::PUCK_HEIGHT * 0.5,
            }
        } else {
            Shape::Sphere {
                radius: mutator_config.ball_radius,
            }
        }
    }

    pub fn new(
        game_mode: GameMode,
        world: &mut PhysWorld,
        mutator_config: &MutatorConfig,
        no_rot: bool,
    ) -> Self {
        let shape = Self::make_collision_shape(game_mode, mutator_config);
        let is_sphere = matches!(shape, Shape::Sphere { .. });

        let mut info = RigidBodyConstructionInfo::new(mutator_config.ball_mass, shape);
        info.start_pos = Vec3A::new(0.0, 0.0, consts::ball::REST_Z);
        info.linear_damping = mutator_config.ball_drag;
        info.friction = mutator_config.ball_world_friction;
        info.restitution = mutator_config.ball_world_restitution;

        let mut body = RigidBody::new(info);
        body.user_index = UserInfoTypes::Ball as i32;
        body.custom_material_callback = true;
        body.no_rot = no_rot && is_sphere;

        let rigid_body_idx = world.add_rigid_body(
            body,
            collision_masks::DEFAULT | collision_masks::HOOPS_NET | collision_masks::DROPSHOT_FLOOR,
            collision_masks::ALL,
        );

        Self {
            state: BallState::DEFAULT,
            rigid_body_idx,
            velocity_impulse_cache: Vec3A::ZERO,
        }
    }

    /// Per-mode post-physics hook. Heatseeker curves the velocity towards a
    /// point inside the target net once the retarget delay has passed.
    pub fn mode_post_tick_update(&mut self, game_mode: GameMode, rb: &mut RigidBody, dt: f32) {
        if game_mode != GameMode::Heatseeker {
            return;
        }

        let hs = &mut self.state.hs_info;
        hs.time_since_hit += dt;

        if hs.y_target_dir == 0.0
            || hs.time_since_hit < consts::heatseeker::RETARGET_DELAY
            || rb.pos.z < consts::heatseeker::MIN_HOMING_Z
        {
            return;
        }

        let target = Vec3A::new(
            0.0,
            consts::heatseeker::TARGET_Y * hs.y_target_dir,
            consts::heatseeker::TARGET_Z,
        );
        let to_target = (target - rb.pos).normalize_or_zero();

        let speed = rb.lin_vel.length();
        let cur_dir = if speed > 1.0 {
            rb.lin_vel / speed
        } else {
            to_target
        };

        let blend = (consts::heatseeker::TURN_RATE * dt).min(1.0);
        let new_dir = (cur_dir + (to_target - cur_dir) * blend).normalize_or_zero();

        let speed_blend = (consts::heatseeker::SPEED_BLEND_RATE * dt).min(1.0);
        let new_speed = speed + (hs.cur_target_speed - speed) * speed_blend;

        rb.lin_vel = new_dir * new_speed;
    }

    /// Apply cached impulses, clamp speeds, and sync `state` from the body
    pub fn finish_physics_tick(&mut self, rb: &mut RigidBody, mutator_config: &MutatorConfig) {
        if self.velocity_impulse_cache != Vec3A::ZERO {
            rb.lin_vel += self.velocity_impulse_cache;
            self.velocity_impulse_cache = Vec3A::ZERO;
        }

        let max_speed = mutator_config.ball_max_speed;
        if rb.lin_vel.length_squared() > max_speed * max_speed {
            rb.lin_vel = rb.lin_vel.normalize() * max_speed;
        }

        if rb.ang_vel.length_squared() > consts::ball::MAX_ANG_SPEED * consts::ball::MAX_ANG_SPEED {
            rb.ang_vel = rb.ang_vel.normalize() * consts::ball::MAX_ANG_SPEED;
        }

        self.state.phys.pos = rb.pos;
        self.state.phys.rot_mat = rb.rot;
        self.state.phys.vel = rb.lin_vel;
        self.state.phys.ang_vel = rb.ang_vel;
        self.state.tick_count_since_update += 1;
    }
}
