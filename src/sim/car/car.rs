use crate::{
    consts,
    consts::{car as car_consts, car::drive as drive_consts, curves},
    math::Angle,
    phys::{PhysWorld, RigidBody, Shape, rigid_body::RigidBodyConstructionInfo},
    sim::{
        CarConfig, CarControls, CarState, GameMode, MutatorConfig, Team, UserInfoTypes,
        collision_masks,
    },
};
use fastrand::Rng;
use glam::Vec3A;
use std::f32::consts::PI;

/// Per-wheel runtime data, refreshed by the suspension raycast each tick
#[derive(Clone, Copy, Debug, Default)]
struct WheelRuntime {
    in_contact: bool,
    contact_point: Vec3A,
    contact_normal: Vec3A,
    suspension_compression: f32,
}

pub struct Car {
    pub id: u32,
    pub team: Team,
    config: CarConfig,
    pub(crate) rigid_body_idx: usize,
    /// Bump impulses accumulate here and apply after the solver step
    pub(crate) velocity_impulse_cache: Vec3A,
    pub(crate) state: CarState,
    wheels: [WheelRuntime; 4],
}

impl Car {
    pub(crate) fn new(
        id: u32,
        team: Team,
        world: &mut PhysWorld,
        mutator_config: &MutatorConfig,
        config: CarConfig,
    ) -> Self {
        let shape = Shape::CompoundBox {
            half_extents: config.hitbox_size * 0.5,
            offset: config.hitbox_pos_offset,
        };

        let mut info = RigidBodyConstructionInfo::new(mutator_config.car_mass, shape);
        info.friction = car_consts::BASE_COEFS.friction;
        info.restitution = car_consts::BASE_COEFS.restitution;

        let mut body = RigidBody::new(info);
        body.user_index = UserInfoTypes::Car as i32;
        body.user_pointer = id;
        body.custom_material_callback = true;

        let rigid_body_idx = world.add_rigid_body(
            body,
            collision_masks::DEFAULT | collision_masks::DROPSHOT_FLOOR,
            collision_masks::ALL,
        );

        Self {
            id,
            team,
            config,
            rigid_body_idx,
            velocity_impulse_cache: Vec3A::ZERO,
            state: CarState {
                boost: mutator_config.car_spawn_boost_amount,
                ..Default::default()
            },
            wheels: [WheelRuntime::default(); 4],
        }
    }

    /// Get the forward direction as a unit vector
    #[must_use]
    pub const fn get_forward_dir(&self) -> Vec3A {
        self.state.phys.rot_mat.x_axis
    }

    /// Get the rightward direction as a unit vector
    #[must_use]
    pub const fn get_right_dir(&self) -> Vec3A {
        self.state.phys.rot_mat.y_axis
    }

    /// Get the upward direction as a unit vector
    #[must_use]
    pub const fn get_up_dir(&self) -> Vec3A {
        self.state.phys.rot_mat.z_axis
    }

    #[must_use]
    pub const fn get_config(&self) -> &CarConfig {
        &self.config
    }

    #[must_use]
    pub const fn get_state(&self) -> &CarState {
        &self.state
    }

    pub const fn set_controls(&mut self, new_controls: CarControls) {
        self.state.controls = new_controls;
    }

    #[must_use]
    pub const fn get_controls(&self) -> &CarControls {
        &self.state.controls
    }

    /// Immediately demolish the car; it respawns after `respawn_delay`
    pub const fn demolish(&mut self, respawn_delay: f32) {
        self.state.is_demoed = true;
        self.state.demo_respawn_timer = respawn_delay;
    }

    /// The caller owns `ball_hit_info` through the state; it is not cleared
    pub(crate) fn set_state(&mut self, rb: &mut RigidBody, state: &CarState) {
        debug_assert_eq!(rb.user_index, UserInfoTypes::Car as i32);

        rb.pos = state.phys.pos;
        rb.rot = state.phys.rot_mat;
        rb.lin_vel = state.phys.vel;
        rb.ang_vel = state.phys.ang_vel;

        self.velocity_impulse_cache = Vec3A::ZERO;
        self.state = *state;
        self.state.tick_count_since_update = 0;
    }

    /// Respawn at a team-side spawn pose, called after the demo timer expires
    pub(crate) fn respawn(
        &mut self,
        rb: &mut RigidBody,
        rng: &mut Rng,
        game_mode: GameMode,
        boost_amount: f32,
    ) {
        let locations = consts::car::spawn::respawn_locations(game_mode);
        let spawn_pos = locations[rng.usize(0..locations.len())];
        let y_dir = -self.team.get_y_dir();

        let yaw = spawn_pos.yaw_ang + if self.team == Team::Blue { 0.0 } else { PI };
        let new_state = CarState {
            phys: crate::sim::PhysState {
                pos: Vec3A::new(
                    spawn_pos.x,
                    spawn_pos.y * y_dir,
                    consts::car::spawn::SPAWN_Z,
                ),
                rot_mat: Angle::new(yaw, 0.0, 0.0).to_rot_mat(),
                vel: Vec3A::ZERO,
                ang_vel: Vec3A::ZERO,
            },
            boost: boost_amount,
            ..Default::default()
        };

        self.set_state(rb, &new_state);
    }

    fn wheel_connection_offset(&self, wheel_idx: usize) -> Vec3A {
        let pair = if wheel_idx < 2 {
            &self.config.front_wheels
        } else {
            &self.config.back_wheels
        };

        let mut offset = pair.connection_point_offset;
        if wheel_idx % 2 == 0 {
            // Left wheel
            offset.y = -offset.y;
        }
        offset
    }

    fn wheel_pair(&self, wheel_idx: usize) -> &super::WheelPairConfig {
        if wheel_idx < 2 {
            &self.config.front_wheels
        } else {
            &self.config.back_wheels
        }
    }

    /// Raycast all four wheels and store contact info.
    /// Returns the number of wheels in contact.
    fn update_suspension_raycasts(&mut self, world: &PhysWorld) -> u8 {
        let rb = &world.bodies()[self.rigid_body_idx];
        let down = -rb.rot.z_axis;
        let ray_mask = collision_masks::DEFAULT | collision_masks::DROPSHOT_FLOOR;

        let mut num_in_contact = 0u8;
        for i in 0..4 {
            let pair = *self.wheel_pair(i);
            let start = rb.pos + rb.rot * self.wheel_connection_offset(i);
            let ray_len = pair.suspension_rest_length + pair.wheel_radius;

            let wheel = &mut self.wheels[i];
            match world.ray_cast(start, down * ray_len, ray_mask) {
                Some(hit) => {
                    wheel.in_contact = true;
                    wheel.contact_point = hit.pos;
                    wheel.contact_normal = hit.normal;
                    wheel.suspension_compression = (ray_len - hit.frac * ray_len)
                        .min(consts::car::suspension::MAX_TRAVEL);
                    num_in_contact += 1;
                }
                None => *wheel = WheelRuntime::default(),
            }

            self.state.wheels_with_contact[i] = wheel.in_contact;
        }

        num_in_contact
    }

    fn apply_suspension_forces(&mut self, rb: &mut RigidBody) {
        for (i, wheel) in self.wheels.iter().enumerate() {
            if !wheel.in_contact {
                continue;
            }

            let scale = if i < 2 {
                consts::car::suspension::FORCE_SCALE_FRONT
            } else {
                consts::car::suspension::FORCE_SCALE_BACK
            };

            let rel = wheel.contact_point - rb.pos;
            let vel_along_normal = rb.velocity_at(rel).dot(wheel.contact_normal);

            let force = (consts::car::suspension::STIFFNESS * wheel.suspension_compression
                - consts::car::suspension::DAMPING * vel_along_normal)
                * scale;

            if force > 0.0 {
                rb.apply_force_at(wheel.contact_normal * force, rel);
            }
        }
    }

    fn update_handbrake(&mut self, tick_time: f32) {
        let rate = if self.state.controls.handbrake {
            drive_consts::POWERSLIDE_RISE_RATE
        } else {
            -drive_consts::POWERSLIDE_FALL_RATE
        };
        self.state.handbrake_val = (self.state.handbrake_val + rate * tick_time).clamp(0.0, 1.0);
    }

    /// Throttle, brake, steering, and tire friction for all wheels in contact
    fn update_wheels(
        &mut self,
        rb: &mut RigidBody,
        tick_time: f32,
        num_wheels_in_contact: u8,
        forward_speed: f32,
    ) {
        let real_throttle = if self.state.controls.boost && self.state.boost > 0.0 {
            1.0
        } else {
            self.state.controls.throttle
        };

        let abs_forward_speed = forward_speed.abs();
        let mut engine_throttle = real_throttle;
        let mut real_brake = 0.0;

        if !self.state.controls.handbrake {
            if real_throttle.abs() >= drive_consts::THROTTLE_DEADZONE {
                if abs_forward_speed > drive_consts::STOPPING_FORWARD_VEL
                    && real_throttle.signum() != forward_speed.signum()
                {
                    // Throttling against the current motion
                    real_brake = 1.0;
                    if abs_forward_speed > drive_consts::BRAKING_NO_THROTTLE_SPEED_THRESH {
                        engine_throttle = 0.0;
                    }
                }
            } else {
                engine_throttle = 0.0;
                real_brake = if abs_forward_speed < drive_consts::STOPPING_FORWARD_VEL {
                    1.0
                } else {
                    drive_consts::COASTING_BRAKE_FACTOR
                };
            }
        }

        let mut drive_speed_scale = curves::DRIVE_SPEED_TORQUE_FACTOR.get_output(abs_forward_speed);
        if num_wheels_in_contact < 3 {
            drive_speed_scale /= 4.0;
        }

        let mut steer_angle = curves::STEER_ANGLE_FROM_SPEED.get_output(abs_forward_speed);
        if self.state.handbrake_val != 0.0 {
            steer_angle += (curves::POWERSLIDE_STEER_ANGLE_FROM_SPEED.get_output(abs_forward_speed)
                - steer_angle)
                * self.state.handbrake_val;
        }
        steer_angle *= self.state.controls.steer;

        let mass_per_wheel = rb.inv_mass().recip() / f32::from(num_wheels_in_contact.max(1));
        let drive_force_per_wheel = engine_throttle
            * drive_consts::THROTTLE_ACCEL
            * drive_speed_scale
            * rb.inv_mass().recip()
            / f32::from(num_wheels_in_contact.max(1));

        for i in 0..4 {
            let wheel = self.wheels[i];
            if !wheel.in_contact {
                continue;
            }

            let steer = if i < 2 { steer_angle } else { 0.0 };
            let (sin_steer, cos_steer) = steer.sin_cos();
            let wheel_forward =
                rb.rot * Vec3A::new(cos_steer, sin_steer, 0.0);

            let normal = wheel.contact_normal;
            let long_dir = (wheel_forward - normal * wheel_forward.dot(normal)).normalize_or_zero();
            if long_dir == Vec3A::ZERO {
                continue;
            }
            let lat_dir = normal.cross(long_dir);

            let rel = wheel.contact_point - rb.pos;
            let contact_vel = rb.velocity_at(rel);
            let lat_vel = contact_vel.dot(lat_dir);
            let long_vel = contact_vel.dot(long_dir);

            // Slip-dependent lateral grip
            let base_friction = lat_vel.abs();
            let friction_curve_input = if base_friction > 5.0 {
                base_friction / (long_vel.abs() + base_friction)
            } else {
                0.0
            };

            let mut lat_friction = curves::LAT_FRICTION.get_output(friction_curve_input);
            let mut long_friction =
                curves::LONG_FRICTION.get_output_or(friction_curve_input, 1.0);

            if self.state.handbrake_val != 0.0 {
                let amount = self.state.handbrake_val;
                lat_friction *= 1.0 - curves::HANDBRAKE_LAT_FRICTION_FACTOR * amount;
                long_friction *= 1.0
                    + (curves::HANDBRAKE_LONG_FRICTION_FACTOR.get_output(friction_curve_input)
                        - 1.0)
                        * amount;
            }

            if real_throttle == 0.0 {
                let non_sticky = curves::NON_STICKY_FRICTION_FACTOR.get_output(normal.z);
                lat_friction *= non_sticky;
                long_friction *= non_sticky;
            }

            // Engine force
            if drive_force_per_wheel != 0.0 {
                rb.apply_force_at(long_dir * drive_force_per_wheel, rel);
            }

            // Brake, clamped so it never reverses the wheel within a tick
            if real_brake != 0.0 && long_vel.abs() > 1e-3 {
                let brake_delta = (real_brake * drive_consts::BRAKE_ACCEL * tick_time)
                    .min(long_vel.abs())
                    * long_friction;
                rb.apply_impulse_at(long_dir * (-long_vel.signum() * brake_delta * mass_per_wheel), rel);
            }

            // Lateral grip
            let lat_impulse = -lat_vel * lat_friction * mass_per_wheel;
            rb.apply_impulse_at(lat_dir * lat_impulse, rel);
        }

        // Sticky force pressing the car into the surface it is driving on
        if num_wheels_in_contact > 0 {
            let up_dir = self.average_wheel_contact_normal();
            let full_stick = real_throttle != 0.0
                || abs_forward_speed > drive_consts::STOPPING_FORWARD_VEL;

            let mut sticky_scale = consts::car::suspension::STICKY_FORCE_SCALE;
            if full_stick {
                sticky_scale += 1.0 - up_dir.z.abs();
            }

            rb.apply_central_force(
                up_dir * (consts::GRAVITY_Z * sticky_scale * rb.inv_mass().recip()),
            );
        }
    }

    fn average_wheel_contact_normal(&self) -> Vec3A {
        let mut sum = Vec3A::ZERO;
        for wheel in &self.wheels {
            if wheel.in_contact {
                sum += wheel.contact_normal;
            }
        }
        sum.normalize_or(Vec3A::Z)
    }

    /// Pitch/yaw/roll torque from stick inputs while airborne,
    /// plus flip torque while a flip is active
    fn update_air_torque(&mut self, rb: &mut RigidBody, tick_time: f32, update_air_control: bool) {
        let dir_pitch = -self.get_right_dir();
        let dir_yaw = self.get_up_dir();
        let dir_roll = -self.get_forward_dir();

        if self.state.is_flipping {
            self.state.is_flipping =
                self.state.has_flipped && self.state.flip_time < consts::car::flip::TORQUE_TIME;
        }

        let mut do_air_control = false;
        if self.state.is_flipping {
            if self.state.flip_rel_torque == Vec3A::ZERO {
                // Stall flip, air control stays usable
                do_air_control = true;
            } else {
                let mut rel_torque = self.state.flip_rel_torque;

                // Pitch input against the flip cancels its pitch torque
                if rel_torque.y != 0.0
                    && self.state.controls.pitch != 0.0
                    && rel_torque.y.signum() == self.state.controls.pitch.signum()
                {
                    rel_torque.y *= 1.0 - self.state.controls.pitch.abs().min(1.0);
                    do_air_control = true;
                }

                let flip_accel = rel_torque
                    * Vec3A::new(consts::car::flip::TORQUE_X, consts::car::flip::TORQUE_Y, 0.0)
                    * consts::car::air_control::TORQUE_APPLY_SCALE;
                rb.ang_vel += (rb.rot * flip_accel) * tick_time;
            }
        } else {
            do_air_control = true;
        }

        do_air_control &= !self.state.is_auto_flipping && update_air_control;
        if do_air_control {
            let controls = &self.state.controls;
            let mut pitch_scale = 1.0;

            let torque = if controls.pitch != 0.0 || controls.yaw != 0.0 || controls.roll != 0.0 {
                let pitchlocked = self.state.has_flipped
                    && self.state.flip_time
                        < consts::car::flip::TORQUE_TIME + consts::car::flip::PITCHLOCK_EXTRA_TIME;
                if pitchlocked {
                    pitch_scale = 0.0;
                }

                controls.pitch * pitch_scale * consts::car::air_control::TORQUE.x * dir_pitch
                    + controls.yaw * consts::car::air_control::TORQUE.y * dir_yaw
                    + controls.roll * consts::car::air_control::TORQUE.z * dir_roll
            } else {
                Vec3A::ZERO
            };

            let ang_vel = rb.ang_vel;
            let damping = dir_pitch
                * (dir_pitch.dot(ang_vel)
                    * consts::car::air_control::DAMPING.x
                    * (1.0 - (controls.pitch * pitch_scale).abs()))
                + dir_yaw
                    * (dir_yaw.dot(ang_vel)
                        * consts::car::air_control::DAMPING.y
                        * (1.0 - controls.yaw.abs()))
                + dir_roll * (dir_roll.dot(ang_vel) * consts::car::air_control::DAMPING.z);

            rb.ang_vel +=
                (torque - damping) * consts::car::air_control::TORQUE_APPLY_SCALE * tick_time;
        }

        if self.state.controls.throttle != 0.0 {
            rb.apply_central_force(
                self.get_forward_dir()
                    * self.state.controls.throttle
                    * drive_consts::THROTTLE_AIR_ACCEL
                    * rb.inv_mass().recip(),
            );
        }
    }

    fn update_jump(
        &mut self,
        rb: &mut RigidBody,
        tick_time: f32,
        mutator_config: &MutatorConfig,
        jump_pressed: bool,
    ) {
        if self.state.is_on_ground && self.state.is_jumping {
            if self.state.has_jumped
                && self.state.jump_time
                    < consts::car::jump::MIN_TIME + consts::car::jump::RESET_TIME_PAD
            {
                // We may still be leaving the ground after a minimum-time jump
            } else {
                self.state.has_jumped = false;
                self.state.jump_time = 0.0;
            }
        }

        if self.state.is_jumping {
            self.state.is_jumping = self.state.jump_time < consts::car::jump::MIN_TIME
                || (self.state.controls.jump && self.state.jump_time < consts::car::jump::MAX_TIME);
        } else if self.state.is_on_ground && jump_pressed {
            self.state.is_jumping = true;
            self.state.jump_time = 0.0;
            rb.apply_central_impulse(
                self.get_up_dir() * mutator_config.jump_immediate_force * rb.inv_mass().recip(),
            );
        }

        if self.state.is_jumping {
            self.state.has_jumped = true;
            rb.apply_central_force(
                self.get_up_dir() * mutator_config.jump_accel * rb.inv_mass().recip(),
            );
        }

        if self.state.is_jumping || self.state.has_jumped {
            self.state.jump_time += tick_time;
        }
    }

    /// Jump pressed while lying against the world flips the car upright
    fn update_auto_flip(&mut self, rb: &mut RigidBody, tick_time: f32, jump_pressed: bool) {
        if jump_pressed
            && self
                .state
                .world_contact_normal
                .is_some_and(|normal| normal.z > consts::car::autoflip::NORM_Z_THRESH)
        {
            let angle = Angle::from_rot_mat(self.state.phys.rot_mat);
            let abs_roll = angle.roll.abs();
            if abs_roll > consts::car::autoflip::ROLL_THRESH {
                self.state.auto_flip_timer = consts::car::autoflip::TIME * (abs_roll / PI);
                self.state.auto_flip_torque_scale = angle.roll.signum();
                self.state.is_auto_flipping = true;

                rb.apply_central_impulse(
                    -self.get_up_dir() * consts::car::autoflip::IMPULSE * rb.inv_mass().recip(),
                );
            }
        }

        if self.state.is_auto_flipping {
            if self.state.auto_flip_timer <= 0.0 {
                self.state.is_auto_flipping = false;
                self.state.auto_flip_timer = 0.0;
            } else {
                rb.ang_vel += self.get_forward_dir()
                    * consts::car::autoflip::TORQUE
                    * self.state.auto_flip_torque_scale
                    * tick_time;
                self.state.auto_flip_timer -= tick_time;
            }
        }
    }

    fn update_double_jump_or_flip(
        &mut self,
        rb: &mut RigidBody,
        tick_time: f32,
        mutator_config: &MutatorConfig,
        jump_pressed: bool,
        forward_speed: f32,
    ) {
        if self.state.is_on_ground {
            self.state.has_double_jumped = false;
            self.state.has_flipped = false;
            self.state.air_time = 0.0;
            self.state.air_time_since_jump = 0.0;
            self.state.flip_time = 0.0;
            return;
        }

        self.state.air_time += tick_time;

        if self.state.has_jumped && !self.state.is_jumping {
            self.state.air_time_since_jump += tick_time;
        } else {
            self.state.air_time_since_jump = 0.0;
        }

        if jump_pressed
            && self.state.air_time_since_jump < consts::car::jump::DOUBLEJUMP_MAX_DELAY
        {
            let controls = self.state.controls;
            let dodge_mag = controls.pitch.abs().max(controls.yaw.abs());
            let is_flip_input = dodge_mag > self.config.dodge_deadzone;

            let can_use = (!self.state.is_auto_flipping
                && !self.state.has_double_jumped
                && !self.state.has_flipped)
                || if is_flip_input {
                    mutator_config.unlimited_flips
                } else {
                    mutator_config.unlimited_double_jumps
                };

            if can_use {
                if is_flip_input {
                    self.start_flip(rb, forward_speed);
                } else {
                    rb.apply_central_impulse(
                        self.get_up_dir()
                            * mutator_config.jump_immediate_force
                            * rb.inv_mass().recip(),
                    );
                    self.state.has_double_jumped = true;
                }
            }
        }

        if self.state.is_flipping {
            self.state.flip_time += tick_time;

            // Vertical damp window: front flips fight gravity less,
            // back flips momentarily cancel downward motion
            let tick_time_scale = tick_time * 120.0;
            if self.state.flip_time <= consts::car::flip::TORQUE_TIME
                && self.state.flip_time >= consts::car::flip::Z_DAMP_START
                && (rb.lin_vel.z < 0.0 || self.state.flip_time < consts::car::flip::Z_DAMP_END)
            {
                rb.lin_vel.z *= (1.0 - consts::car::flip::Z_DAMP_120).powf(tick_time_scale);
            }
        } else if self.state.has_flipped {
            self.state.flip_time += tick_time;
        }
    }

    fn start_flip(&mut self, rb: &mut RigidBody, forward_speed: f32) {
        self.state.flip_time = 0.0;
        self.state.has_flipped = true;
        self.state.is_flipping = true;

        let controls = self.state.controls;
        let mut dodge_dir = Vec3A::new(-controls.pitch, controls.yaw, 0.0);
        if dodge_dir.x.abs() < 0.1 && dodge_dir.y.abs() < 0.1 {
            dodge_dir = Vec3A::ZERO;
        } else {
            dodge_dir = dodge_dir.normalize();
        }

        self.state.flip_rel_torque = Vec3A::new(-dodge_dir.y, dodge_dir.x, 0.0);

        if dodge_dir.x.abs() < 0.1 {
            dodge_dir.x = 0.0;
        }
        if dodge_dir.y.abs() < 0.1 {
            dodge_dir.y = 0.0;
        }

        if dodge_dir.length_squared() < f32::EPSILON * f32::EPSILON {
            return;
        }

        let forward_speed_ratio = forward_speed.abs() / car_consts::MAX_SPEED;
        let should_dodge_backwards = if forward_speed.abs() < 100.0 {
            dodge_dir.x.is_sign_negative()
        } else {
            dodge_dir.x.signum() != forward_speed.signum()
        };

        let max_speed_scale_x = if should_dodge_backwards {
            consts::car::flip::BACKWARD_IMPULSE_MAX_SPEED_SCALE
        } else {
            consts::car::flip::FORWARD_IMPULSE_MAX_SPEED_SCALE
        };

        let mut initial_vel = dodge_dir * consts::car::flip::INITIAL_VEL_SCALE;
        initial_vel.x *= (max_speed_scale_x - 1.0) * forward_speed_ratio + 1.0;
        initial_vel.y *=
            (consts::car::flip::SIDE_IMPULSE_MAX_SPEED_SCALE - 1.0) * forward_speed_ratio + 1.0;
        if should_dodge_backwards {
            initial_vel.x *= consts::car::flip::BACKWARD_IMPULSE_SCALE_X;
        }

        let forward_2d = self.get_forward_dir().with_z(0.0).normalize_or(Vec3A::X);
        let right_2d = Vec3A::new(-forward_2d.y, forward_2d.x, 0.0);
        let delta_vel = initial_vel.x * forward_2d + initial_vel.y * right_2d;

        rb.apply_central_impulse(delta_vel * rb.inv_mass().recip());
    }

    /// Righting force while partially grounded with throttle held
    fn update_auto_roll(&mut self, rb: &mut RigidBody, num_wheels_in_contact: u8) {
        let ground_up_dir = if num_wheels_in_contact > 0 {
            self.average_wheel_contact_normal()
        } else if let Some(normal) = self.state.world_contact_normal {
            normal
        } else {
            return;
        };

        let ground_down_dir = -ground_up_dir;
        let forward_dir = self.get_forward_dir();
        let right_dir = self.get_right_dir();

        let cross_right_dir = ground_up_dir.cross(forward_dir);
        let cross_forward_dir = ground_down_dir.cross(cross_right_dir);

        let right_torque_factor = 1.0 - right_dir.dot(cross_right_dir).clamp(0.0, 1.0);
        let forward_torque_factor = 1.0 - forward_dir.dot(cross_forward_dir).clamp(0.0, 1.0);

        let torque_dir_right = forward_dir * -right_dir.dot(ground_up_dir).signum();
        let torque_dir_forward = right_dir * forward_dir.dot(ground_up_dir).signum();

        rb.apply_central_force(
            ground_down_dir * consts::car::autoroll::FORCE * rb.inv_mass().recip(),
        );

        let accel = (torque_dir_right * right_torque_factor
            + torque_dir_forward * forward_torque_factor)
            * consts::car::autoroll::TORQUE
            * consts::car::air_control::TORQUE_APPLY_SCALE;
        rb.ang_vel += accel * (1.0 / 120.0);
    }

    fn update_boost(&mut self, rb: &mut RigidBody, tick_time: f32, mutator_config: &MutatorConfig) {
        self.state.is_boosting = if self.state.boost > 0.0 {
            self.state.controls.boost
                || (self.state.is_boosting
                    && self.state.boosting_time < consts::car::boost::MIN_TIME)
        } else {
            false
        };

        if self.state.is_boosting {
            self.state.boosting_time += tick_time;
            self.state.time_since_boosted = 0.0;
            self.state.boost -= mutator_config.boost_used_per_second * tick_time;

            let accel = if self.state.is_on_ground {
                mutator_config.boost_accel_ground
            } else {
                mutator_config.boost_accel_air
            };
            rb.apply_central_force(accel * self.get_forward_dir() * rb.inv_mass().recip());
        } else {
            self.state.boosting_time = 0.0;
            self.state.time_since_boosted += tick_time;

            if mutator_config.recharge_boost_enabled
                && self.state.time_since_boosted >= mutator_config.recharge_boost_delay
            {
                self.state.boost += mutator_config.recharge_boost_per_second * tick_time;
            }
        }

        self.state.boost = self
            .state
            .boost
            .clamp(0.0, mutator_config.car_max_boost_amount);
    }

    fn update_supersonic(&mut self, rb: &RigidBody) {
        let speed_squared = rb.lin_vel.length_squared();
        let threshold = if self.state.is_supersonic
            && self.state.supersonic_time < consts::car::supersonic::MAINTAIN_MAX_TIME
        {
            consts::car::supersonic::MAINTAIN_MIN_SPEED
        } else {
            consts::car::supersonic::START_SPEED
        };

        self.state.is_supersonic = speed_squared >= threshold * threshold;
    }

    pub(crate) fn pre_tick_update(
        &mut self,
        world: &mut PhysWorld,
        rng: &mut Rng,
        game_mode: GameMode,
        tick_time: f32,
        mutator_config: &MutatorConfig,
    ) {
        {
            let rb = &mut world.bodies_mut()[self.rigid_body_idx];

            if self.state.is_demoed {
                self.state.demo_respawn_timer =
                    (self.state.demo_respawn_timer - tick_time).max(0.0);
                if self.state.demo_respawn_timer == 0.0 {
                    self.state.is_demoed = false;
                    self.respawn(rb, rng, game_mode, mutator_config.car_spawn_boost_amount);
                }
            }

            rb.disable_simulation = self.state.is_demoed;
            rb.no_contact_response = self.state.is_demoed;

            if self.state.is_demoed {
                return;
            }
        }

        self.state.controls = self.state.controls.clamp_fix();
        let jump_pressed = self.state.controls.jump && !self.state.last_controls.jump;

        self.update_handbrake(tick_time);

        let num_wheels_in_contact = self.update_suspension_raycasts(world);
        self.state.is_on_ground = num_wheels_in_contact >= 3;

        let rb = &mut world.bodies_mut()[self.rigid_body_idx];
        let forward_speed = rb.forward_speed();

        self.apply_suspension_forces(rb);
        self.update_wheels(rb, tick_time, num_wheels_in_contact, forward_speed);

        if self.state.is_on_ground {
            self.state.is_flipping = false;
        } else {
            self.update_air_torque(rb, tick_time, num_wheels_in_contact == 0);
        }

        self.update_jump(rb, tick_time, mutator_config, jump_pressed);
        self.update_auto_flip(rb, tick_time, jump_pressed);
        self.update_double_jump_or_flip(
            rb,
            tick_time,
            mutator_config,
            jump_pressed,
            forward_speed,
        );

        if self.state.controls.throttle != 0.0
            && ((0 < num_wheels_in_contact && num_wheels_in_contact < 4)
                || self.state.world_contact_normal.is_some())
        {
            self.update_auto_roll(rb, num_wheels_in_contact);
        }

        self.state.world_contact_normal = None;

        self.update_boost(rb, tick_time, mutator_config);
        self.update_supersonic(rb);
        Self::clamp_velocities(rb);
    }

    fn clamp_velocities(rb: &mut RigidBody) {
        if rb.lin_vel.length_squared() > car_consts::MAX_SPEED * car_consts::MAX_SPEED {
            rb.lin_vel = rb.lin_vel.normalize() * car_consts::MAX_SPEED;
        }
        if rb.ang_vel.length_squared() > car_consts::MAX_ANG_SPEED * car_consts::MAX_ANG_SPEED {
            rb.ang_vel = rb.ang_vel.normalize() * car_consts::MAX_ANG_SPEED;
        }
    }

    pub(crate) fn post_tick_update(&mut self, tick_time: f32) {
        self.state.tick_count_since_update += 1;

        if self.state.is_demoed {
            return;
        }

        if self.state.is_supersonic {
            self.state.supersonic_time += tick_time;
        } else {
            self.state.supersonic_time = 0.0;
        }

        if let Some(car_contact) = &mut self.state.car_contact {
            car_contact.cooldown_timer -= tick_time;
        }
        if self
            .state
            .car_contact
            .is_some_and(|contact| contact.cooldown_timer <= 0.0)
        {
            self.state.car_contact = None;
        }

        self.state.last_controls = self.state.controls;
    }

    /// Apply cached impulses, clamp speeds, and sync `state` from the body
    pub(crate) fn finish_physics_tick(&mut self, rb: &mut RigidBody) {
        if self.state.is_demoed {
            return;
        }

        if self.velocity_impulse_cache != Vec3A::ZERO {
            rb.lin_vel += self.velocity_impulse_cache;
            self.velocity_impulse_cache = Vec3A::ZERO;
        }

        Self::clamp_velocities(rb);

        self.state.phys.pos = rb.pos;
        self.state.phys.rot_mat = rb.rot;
        self.state.phys.vel = rb.lin_vel;
        self.state.phys.ang_vel = rb.ang_vel;
    }
}
