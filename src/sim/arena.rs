use crate::{
    ARENA_COLLISION_SHAPES, consts,
    math::{Angle, round_angle_ue3},
    phys::{
        ContactAddedCallback, ManifoldPoint, PhysWorld, RigidBody, Shape,
        rigid_body::RigidBodyConstructionInfo,
    },
    sim::{
        ArenaConfig, ArenaError, Ball, BallHitInfo, BallState, BoostPad, BoostPadConfig,
        BoostPadGrid, BoostPadState, Car, CarConfig, CarContact, CarState, ContactRecord,
        ContactTracker, DemoMode, DropshotTilesState, GameMode, MutatorConfig, PhysState, Team,
        UserInfoTypes, collision_masks,
    },
};
use ahash::AHashMap;
use arrayvec::ArrayVec;
use fastrand::Rng;
use glam::Vec3A;
use std::{
    any::Any,
    f32::consts::PI,
    mem,
    ops::{Deref, DerefMut},
    panic::{AssertUnwindSafe, catch_unwind, resume_unwind},
    sync::Arc,
};

/// Handle passed to callbacks; lets them request that `step` exits early
pub struct StepControl {
    stop: bool,
    pub tick_count: u64,
}

impl StepControl {
    /// Stop stepping at the next safe boundary (between sub-ticks)
    pub fn stop(&mut self) {
        self.stop = true;
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CarBumpEvent {
    pub bumper_id: u32,
    pub victim_id: u32,
    pub is_demo: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct CarDemoEvent {
    pub bumper_id: u32,
    pub victim_id: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct BoostPickupEvent {
    pub car_id: u32,
    pub pad_idx: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct BallTouchEvent {
    pub car_id: u32,
}

pub type GoalScoreCallback = Arc<dyn Fn(&mut StepControl, Team, u64) + Send + Sync>;
pub type CarBumpCallback = Arc<dyn Fn(&mut StepControl, CarBumpEvent, u64) + Send + Sync>;
pub type CarDemoCallback = Arc<dyn Fn(&mut StepControl, CarDemoEvent, u64) + Send + Sync>;
pub type BoostPickupCallback = Arc<dyn Fn(&mut StepControl, BoostPickupEvent, u64) + Send + Sync>;
pub type BallTouchCallback = Arc<dyn Fn(&mut StepControl, BallTouchEvent, u64) + Send + Sync>;

#[derive(Default)]
struct CallbackSlots {
    goal_score: Option<(GoalScoreCallback, u64)>,
    car_bump: Option<(CarBumpCallback, u64)>,
    car_demo: Option<(CarDemoCallback, u64)>,
    boost_pickup: Option<(BoostPickupCallback, u64)>,
    ball_touch: Option<(BallTouchCallback, u64)>,
}

enum ArenaEvent {
    GoalScore(Team),
    CarBump(CarBumpEvent),
    CarDemo(CarDemoEvent),
    BoostPickup(BoostPickupEvent),
    BallTouch(BallTouchEvent),
}

pub struct ArenaInner {
    pub(crate) rng: Rng,
    pub(crate) tick_time: f32,
    pub(crate) last_car_id: u32,
    config: ArenaConfig,

    pub(crate) ball: Ball,
    pub(crate) cars: AHashMap<u32, Car>,
    pub(crate) tick_count: u64,
    pub(crate) game_mode: GameMode,
    pub(crate) mutator_config: MutatorConfig,
    pub(crate) boost_pad_grid: BoostPadGrid,
    pub(crate) dropshot_tiles: Option<DropshotTilesState>,

    contact_tracker: ContactTracker,
    callbacks: CallbackSlots,
    events: Vec<ArenaEvent>,
    /// Car-ball touch callback fires at most once per car per tick
    ball_touch_emitted: Vec<u32>,
    /// Ball-floor impact pending dropshot damage resolution
    pending_floor_hit_pos: Option<Vec3A>,
    stop_requested: bool,
    callback_fault: Option<Box<dyn Any + Send>>,
    ball_scored_last_tick: bool,
}

impl ContactAddedCallback for ArenaInner {
    fn contact_added<'a>(
        &mut self,
        point: &mut ManifoldPoint,
        mut body_a: &'a RigidBody,
        _body_a_idx: usize,
        mut body_b: &'a RigidBody,
        _body_b_idx: usize,
    ) {
        let mut kind_a = UserInfoTypes::from_raw(body_a.user_index);
        let mut kind_b = UserInfoTypes::from_raw(body_b.user_index);

        // Normalize pair order for the record without disturbing the solver's
        // view of the manifold point
        let should_swap = kind_a > kind_b;
        let (mut local_point_a, mut local_point_b) = (point.local_point_a, point.local_point_b);
        let mut normal_world_on_b = point.normal_world_on_b;
        if should_swap {
            mem::swap(&mut body_a, &mut body_b);
            mem::swap(&mut kind_a, &mut kind_b);
            mem::swap(&mut local_point_a, &mut local_point_b);
            normal_world_on_b = -normal_world_on_b;
        }

        match (kind_a, kind_b) {
            (UserInfoTypes::Car, UserInfoTypes::Ball) => {
                if !self.mutator_config.enable_car_ball_collision {
                    point.ignored = true;
                    return;
                }
                point.combined_friction = consts::car::HIT_BALL_COEFS.friction;
                point.combined_restitution = consts::car::HIT_BALL_COEFS.restitution;
            }
            (UserInfoTypes::Car, UserInfoTypes::Car) => {
                if !self.mutator_config.enable_car_car_collision {
                    point.ignored = true;
                    return;
                }
                point.combined_friction = consts::car::HIT_CAR_COEFS.friction;
                point.combined_restitution = consts::car::HIT_CAR_COEFS.restitution;
            }
            (UserInfoTypes::Car, UserInfoTypes::None) => {
                point.combined_friction = self.mutator_config.car_world_friction;
                point.combined_restitution = self.mutator_config.car_world_restitution;
            }
            (UserInfoTypes::Ball, UserInfoTypes::None) => {
                // A charged dropshot ball passes through broken tiles
                if let Some(tiles) = &self.dropshot_tiles {
                    if normal_world_on_b.z > 0.7 && tiles.is_broken_under(body_a.pos) {
                        point.ignored = true;
                        return;
                    }
                }
                point.combined_friction = self.mutator_config.ball_world_friction;
                point.combined_restitution = self.mutator_config.ball_world_restitution;
            }
            _ => return,
        }

        self.contact_tracker.push(ContactRecord {
            user_index_a: kind_a,
            user_index_b: kind_b,
            user_pointer_a: body_a.user_pointer,
            user_pointer_b: body_b.user_pointer,
            local_point_a,
            local_point_b,
            world_point: point.world_point,
            normal_world_on_b,
            combined_friction: point.combined_friction,
            combined_restitution: point.combined_restitution,
        });
    }
}

impl ArenaInner {
    fn queue(&mut self, event: ArenaEvent) {
        self.events.push(event);
    }

    fn on_ball_hit(&mut self, car_id: u32, record: &ContactRecord) {
        let tick_count = self.tick_count;
        let game_mode = self.game_mode;
        let ball_state = &mut self.ball.state;
        let Some(car) = self.cars.get_mut(&car_id) else {
            return;
        };

        if !self.ball_touch_emitted.contains(&car_id) {
            self.ball_touch_emitted.push(car_id);
            self.events.push(ArenaEvent::BallTouch(BallTouchEvent { car_id }));
        }

        ball_state.last_hit_car_id = car_id;

        let mut ball_hit_info = BallHitInfo {
            relative_pos_on_ball: record.local_point_b,
            ball_pos: ball_state.phys.pos,
            extra_hit_vel: Vec3A::ZERO,
            tick_count_when_hit: tick_count,
            tick_count_when_extra_impulse_applied: 0,
        };

        if let Some(old) = car.state.ball_hit_info {
            ball_hit_info.tick_count_when_extra_impulse_applied =
                old.tick_count_when_extra_impulse_applied;

            // The extra impulse cannot apply on two consecutive ticks
            if tick_count <= old.tick_count_when_extra_impulse_applied + 1
                && old.tick_count_when_extra_impulse_applied <= tick_count
            {
                car.state.ball_hit_info = Some(ball_hit_info);
                return;
            }
        }

        ball_hit_info.tick_count_when_extra_impulse_applied = tick_count;

        let car_forward = car.state.phys.rot_mat.x_axis;
        let rel_pos = ball_state.phys.pos - car.state.phys.pos;
        let rel_vel = ball_state.phys.vel - car.state.phys.vel;

        let rel_speed = rel_vel
            .length()
            .min(consts::ball::car_hit_impulse::MAX_DELTA_VEL);
        if rel_speed > 0.0 {
            let extra_z_scale = game_mode == GameMode::Hoops
                && car.state.is_on_ground
                && car.state.phys.rot_mat.z_axis.z
                    > consts::ball::car_hit_impulse::Z_SCALE_HOOPS_NORMAL_Z_THRESH;
            let z_scale = if extra_z_scale {
                consts::ball::car_hit_impulse::Z_SCALE_HOOPS_GROUND
            } else {
                consts::ball::car_hit_impulse::Z_SCALE_NORMAL
            };

            let mut hit_dir = (rel_pos * Vec3A::new(1.0, 1.0, z_scale)).normalize();
            let forward_adjustment = car_forward
                * hit_dir.dot(car_forward)
                * (1.0 - consts::ball::car_hit_impulse::FORWARD_SCALE);
            hit_dir = (hit_dir - forward_adjustment).normalize();

            let added_vel = hit_dir
                * rel_speed
                * consts::curves::BALL_CAR_EXTRA_IMPULSE_FACTOR.get_output(rel_speed)
                * self.mutator_config.ball_hit_extra_force_scale;
            ball_hit_info.extra_hit_vel = added_vel;

            self.ball.velocity_impulse_cache += added_vel;
        }

        car.state.ball_hit_info = Some(ball_hit_info);

        match game_mode {
            GameMode::Heatseeker => {
                let new_dir = -car.team.get_y_dir();
                let hs = &mut ball_state.hs_info;

                let can_increase = hs.time_since_hit > consts::heatseeker::MIN_SPEEDUP_INTERVAL
                    || hs.y_target_dir == 0.0;
                let dir_changed = hs.y_target_dir != new_dir;
                hs.y_target_dir = new_dir;

                if can_increase || dir_changed {
                    hs.time_since_hit = 0.0;
                    hs.cur_target_speed = consts::heatseeker::MAX_SPEED
                        .min(hs.cur_target_speed + consts::heatseeker::TARGET_SPEED_INCREMENT);
                }
            }
            GameMode::Dropshot => {
                let dir_from_car = (ball_state.phys.pos - car.state.phys.pos).normalize_or_zero();
                let rel_vel_from_car = car.state.phys.vel - ball_state.phys.vel;
                let impact_force = dir_from_car.dot(rel_vel_from_car);

                let ds = &mut ball_state.ds_info;
                if impact_force >= consts::dropshot::MIN_CHARGE_HIT_SPEED {
                    ds.accumulated_hit_force += impact_force;

                    if ds.accumulated_hit_force
                        >= consts::dropshot::MIN_ABSORBED_FORCE_FOR_SUPERCHARGE
                    {
                        ds.charge_level = 3;
                    } else if ds.accumulated_hit_force
                        >= consts::dropshot::MIN_ABSORBED_FORCE_FOR_CHARGE
                    {
                        ds.charge_level = 2;
                    }
                }

                // The touching team claims the opponent side for damage
                ds.y_target_dir = -car.team.get_y_dir();
            }
            _ => {}
        }
    }

    fn on_car_car_collision(&mut self, car_1_id: u32, car_2_id: u32, record: &ContactRecord) {
        let [Some(car_1), Some(car_2)] = self.cars.get_disjoint_mut([&car_1_id, &car_2_id]) else {
            return;
        };

        if car_1.state.is_demoed || car_2.state.is_demoed {
            return;
        }

        let mut attacker = car_1;
        let mut victim = car_2;

        // Test the collision both ways
        for is_swapped in [false, true] {
            let mut attacker_id = car_1_id;
            let mut victim_id = car_2_id;
            if is_swapped {
                mem::swap(&mut attacker, &mut victim);
                mem::swap(&mut attacker_id, &mut victim_id);
            }

            if attacker
                .state
                .car_contact
                .is_some_and(|c| c.other_car_id == victim_id && c.cooldown_timer > 0.0)
            {
                // In cooldown
                continue;
            }

            let delta_pos = victim.state.phys.pos - attacker.state.phys.pos;
            if attacker.state.phys.vel.dot(delta_pos) < 0.0 {
                // Moving away from the other car
                continue;
            }

            let vel_dir = attacker.state.phys.vel.normalize_or_zero();
            let dir_to_victim = delta_pos.normalize_or_zero();

            let speed_towards_victim = attacker.state.phys.vel.dot(dir_to_victim);
            let victim_away_speed = victim.state.phys.vel.dot(vel_dir);
            if speed_towards_victim <= victim_away_speed {
                // Approaching slower than the victim is escaping
                continue;
            }
            let rel_speed = speed_towards_victim - victim_away_speed;

            if self.mutator_config.bump_requires_front_hit {
                let local_point_x = if is_swapped {
                    record.local_point_b
                } else {
                    record.local_point_a
                }
                .dot(attacker.state.phys.rot_mat.x_axis);

                if local_point_x <= consts::car::bump::MIN_FORWARD_DIST {
                    // Didn't hit with the bumper
                    continue;
                }
            }

            let mut is_demo = match self.mutator_config.demo_mode {
                DemoMode::OnContact => true,
                DemoMode::Disabled => false,
                DemoMode::Normal => {
                    attacker.state.is_supersonic
                        && rel_speed > consts::car::bump::DEMO_MIN_REL_SPEED
                }
            };
            if is_demo && !self.mutator_config.enable_team_demos {
                is_demo = attacker.team != victim.team;
            }

            if is_demo {
                victim.demolish(self.mutator_config.respawn_delay);
                self.events.push(ArenaEvent::CarBump(CarBumpEvent {
                    bumper_id: attacker_id,
                    victim_id,
                    is_demo: true,
                }));
                self.events.push(ArenaEvent::CarDemo(CarDemoEvent {
                    bumper_id: attacker_id,
                    victim_id,
                }));
            } else {
                let base_scale = if victim.state.is_on_ground {
                    consts::curves::BUMP_VEL_AMOUNT_GROUND
                } else {
                    consts::curves::BUMP_VEL_AMOUNT_AIR
                }
                .get_output(speed_towards_victim);

                let hit_up_dir = if victim.state.is_on_ground {
                    victim.state.phys.rot_mat.z_axis
                } else {
                    Vec3A::Z
                };

                let upward_force = consts::curves::BUMP_UPWARD_VEL_AMOUNT
                    .get_output(speed_towards_victim)
                    * self.mutator_config.bump_force_scale;
                let bump_impulse = vel_dir * base_scale * self.mutator_config.bump_force_scale
                    + hit_up_dir * upward_force;

                victim.velocity_impulse_cache += bump_impulse;
                self.events.push(ArenaEvent::CarBump(CarBumpEvent {
                    bumper_id: attacker_id,
                    victim_id,
                    is_demo: false,
                }));
            }

            attacker.state.car_contact = Some(CarContact {
                other_car_id: victim_id,
                cooldown_timer: self.mutator_config.bump_cooldown_time,
            });
        }
    }

    fn on_car_world_collision(&mut self, car_id: u32, record: &ContactRecord) {
        if let Some(car) = self.cars.get_mut(&car_id) {
            car.state.world_contact_normal = Some(record.normal_world_on_b);
        }
    }

    fn sorted_car_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.cars.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Invoke queued callbacks in dispatch order.
    /// A panicking callback sets the stop flag; the payload re-raises at `step` exit.
    fn invoke_callbacks(&mut self) {
        let events = mem::take(&mut self.events);
        let mut control = StepControl {
            stop: false,
            tick_count: self.tick_count,
        };

        for event in events {
            if self.callback_fault.is_some() {
                break;
            }

            let result = catch_unwind(AssertUnwindSafe(|| match &event {
                ArenaEvent::GoalScore(team) => {
                    if let Some((cb, tag)) = &self.callbacks.goal_score {
                        cb(&mut control, *team, *tag);
                    }
                }
                ArenaEvent::CarBump(bump) => {
                    if let Some((cb, tag)) = &self.callbacks.car_bump {
                        cb(&mut control, *bump, *tag);
                    }
                }
                ArenaEvent::CarDemo(demo) => {
                    if let Some((cb, tag)) = &self.callbacks.car_demo {
                        cb(&mut control, *demo, *tag);
                    }
                }
                ArenaEvent::BoostPickup(pickup) => {
                    if let Some((cb, tag)) = &self.callbacks.boost_pickup {
                        cb(&mut control, *pickup, *tag);
                    }
                }
                ArenaEvent::BallTouch(touch) => {
                    if let Some((cb, tag)) = &self.callbacks.ball_touch {
                        cb(&mut control, *touch, *tag);
                    }
                }
            }));

            if let Err(payload) = result {
                self.callback_fault = Some(payload);
                control.stop = true;
            }
        }

        if control.stop {
            self.stop_requested = true;
        }
    }
}

/// The container for all game simulation: cars, the ball, boost pads, the
/// arena collision geometry, and the overall game state.
pub struct Arena {
    pub(crate) world: PhysWorld,
    pub(crate) inner: ArenaInner,
}

impl Deref for Arena {
    type Target = ArenaInner;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for Arena {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}

impl Arena {
    pub fn new(game_mode: GameMode) -> Result<Self, ArenaError> {
        Self::new_with_config(game_mode, ArenaConfig::DEFAULT, 120.0)
    }

    pub fn new_with_config(
        game_mode: GameMode,
        config: ArenaConfig,
        tick_rate: f32,
    ) -> Result<Self, ArenaError> {
        if !(15.0..=120.0).contains(&tick_rate) {
            return Err(ArenaError::InvalidTickRate(tick_rate));
        }

        let mutator_config = MutatorConfig::new(game_mode);

        let mut world = PhysWorld::new();
        world.set_gravity(mutator_config.gravity);

        Self::setup_arena_collision_shapes(&mut world, game_mode)?;

        let ball = Ball::new(game_mode, &mut world, &mutator_config, config.no_ball_rot);

        let boost_pad_grid = {
            let mut pad_configs: Vec<BoostPadConfig> = Vec::new();
            if game_mode.has_boost_pads() {
                if config.use_custom_boost_pads {
                    for pad in &config.custom_boost_pads {
                        if !pad.pos.is_finite() {
                            return Err(ArenaError::InvalidPadLayout(format!(
                                "non-finite pad position {:?}",
                                pad.pos
                            )));
                        }
                        if pad.pos.cmplt(config.min_pos).any()
                            || pad.pos.cmpgt(config.max_pos).any()
                        {
                            return Err(ArenaError::InvalidPadLayout(format!(
                                "pad at {:?} is outside the world bounds",
                                pad.pos
                            )));
                        }
                    }
                    pad_configs.extend_from_slice(&config.custom_boost_pads);
                } else {
                    let (big, small): (&[Vec3A], &[Vec3A]) = if game_mode == GameMode::Hoops {
                        (
                            &consts::boost_pads::LOCS_BIG_HOOPS,
                            &consts::boost_pads::LOCS_SMALL_HOOPS,
                        )
                    } else {
                        (
                            &consts::boost_pads::LOCS_BIG_SOCCAR,
                            &consts::boost_pads::LOCS_SMALL_SOCCAR,
                        )
                    };

                    pad_configs.reserve(big.len() + small.len());
                    for &pos in small {
                        pad_configs.push(BoostPadConfig { pos, is_big: false });
                    }
                    for &pos in big {
                        pad_configs.push(BoostPadConfig { pos, is_big: true });
                    }
                }
            }

            BoostPadGrid::new(&pad_configs)
        };

        let rng = config.rng_seed.map_or_else(Rng::new, Rng::with_seed);
        let dropshot_tiles =
            (game_mode == GameMode::Dropshot).then(DropshotTilesState::new);

        Ok(Self {
            world,
            inner: ArenaInner {
                rng,
                tick_time: 1.0 / tick_rate,
                last_car_id: 0,
                config,
                ball,
                cars: AHashMap::with_capacity(6),
                tick_count: 0,
                game_mode,
                mutator_config,
                boost_pad_grid,
                dropshot_tiles,
                contact_tracker: ContactTracker::default(),
                callbacks: CallbackSlots::default(),
                events: Vec::new(),
                ball_touch_emitted: Vec::new(),
                pending_floor_hit_pos: None,
                stop_requested: false,
                callback_fault: None,
                ball_scored_last_tick: false,
            },
        })
    }

    fn add_static_plane(world: &mut PhysWorld, normal: Vec3A, d: f32, group: u8, mask: u8) {
        debug_assert!(normal.is_normalized());

        let mut info = RigidBodyConstructionInfo::new(0.0, Shape::StaticPlane { normal, d });
        info.friction = consts::arena::BASE_COEFS.friction;
        info.restitution = consts::arena::BASE_COEFS.restitution;

        let mut body = RigidBody::new(info);
        body.user_index = UserInfoTypes::None as i32;
        world.add_rigid_body(body, group, mask);
    }

    fn setup_arena_collision_shapes(
        world: &mut PhysWorld,
        game_mode: GameMode,
    ) -> Result<(), ArenaError> {
        let collision_shapes = ARENA_COLLISION_SHAPES.read().unwrap();
        let store = collision_shapes.as_ref().ok_or(ArenaError::InitMissing)?;

        if let Some(mesh_mode) = game_mode.mesh_source() {
            let meshes = store
                .get(&mesh_mode)
                .filter(|m| !m.is_empty())
                .ok_or(ArenaError::NoMeshesForMode(game_mode))?;

            for mesh in meshes {
                let mut info =
                    RigidBodyConstructionInfo::new(0.0, Shape::TriangleMesh(mesh.clone()));
                info.friction = consts::arena::BASE_COEFS.friction;
                info.restitution = consts::arena::BASE_COEFS.restitution;
                let mut body = RigidBody::new(info);
                body.user_index = UserInfoTypes::None as i32;
                world.add_rigid_body(body, collision_masks::DEFAULT, collision_masks::ALL);
            }
        }
        drop(collision_shapes);

        if game_mode == GameMode::TheVoid {
            return Ok(());
        }

        let default = (collision_masks::DEFAULT, collision_masks::ALL);

        let (extent_x, floor, height) = match game_mode {
            GameMode::Hoops => (
                consts::arena::EXTENT_X_HOOPS,
                0.0,
                consts::arena::HEIGHT_HOOPS,
            ),
            GameMode::Dropshot => (
                consts::arena::EXTENT_X,
                consts::arena::FLOOR_HEIGHT_DROPSHOT,
                consts::arena::HEIGHT_DROPSHOT,
            ),
            _ => (consts::arena::EXTENT_X, 0.0, consts::arena::HEIGHT),
        };

        // Floor; in dropshot it carries the tile mask so the contact hook
        // can let the ball through broken tiles
        let (floor_group, floor_mask) = if game_mode == GameMode::Dropshot {
            (
                collision_masks::DROPSHOT_FLOOR,
                collision_masks::DROPSHOT_FLOOR,
            )
        } else {
            default
        };
        Self::add_static_plane(world, Vec3A::Z, floor, floor_group, floor_mask);

        if game_mode == GameMode::TheVoidWithGround {
            return Ok(());
        }

        // Ceiling
        Self::add_static_plane(world, Vec3A::NEG_Z, -height, default.0, default.1);

        match game_mode {
            GameMode::Hoops => {
                Self::add_static_plane(
                    world,
                    Vec3A::Y,
                    -consts::arena::EXTENT_Y_HOOPS,
                    default.0,
                    default.1,
                );
                Self::add_static_plane(
                    world,
                    Vec3A::NEG_Y,
                    -consts::arena::EXTENT_Y_HOOPS,
                    default.0,
                    default.1,
                );
            }
            _ => {
                // Side walls
                Self::add_static_plane(world, Vec3A::X, -extent_x, default.0, default.1);
                Self::add_static_plane(world, Vec3A::NEG_X, -extent_x, default.0, default.1);
            }
        }

        Ok(())
    }

    #[must_use]
    pub const fn get_config(&self) -> &ArenaConfig {
        &self.inner.config
    }

    #[inline]
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.inner.tick_count
    }

    #[must_use]
    pub fn get_tick_rate(&self) -> f32 {
        1.0 / self.inner.tick_time
    }

    #[inline]
    #[must_use]
    pub const fn game_mode(&self) -> GameMode {
        self.inner.game_mode
    }

    #[must_use]
    pub const fn get_mutator_config(&self) -> &MutatorConfig {
        &self.inner.mutator_config
    }

    /// Atomically replace the active mutator config.
    /// Changes take effect on the next tick.
    pub fn set_mutator_config(&mut self, mutator_config: MutatorConfig) {
        self.world.set_gravity(mutator_config.gravity);

        let ball_rb = &mut self.world.bodies_mut()[self.inner.ball.rigid_body_idx];
        ball_rb.friction = mutator_config.ball_world_friction;
        ball_rb.restitution = mutator_config.ball_world_restitution;
        ball_rb.linear_damping = mutator_config.ball_drag;

        self.inner.mutator_config = mutator_config;
    }

    pub fn set_car_car_collision(&mut self, enabled: bool) {
        self.inner.mutator_config.enable_car_car_collision = enabled;
    }

    pub fn set_car_ball_collision(&mut self, enabled: bool) {
        self.inner.mutator_config.enable_car_ball_collision = enabled;
    }

    #[inline]
    #[must_use]
    pub fn boost_pads(&self) -> &[BoostPad] {
        self.inner.boost_pad_grid.pads()
    }

    #[must_use]
    pub fn get_boost_pad_state(&self, idx: usize) -> &BoostPadState {
        self.boost_pads()[idx].get_state()
    }

    pub fn set_boost_pad_state(&mut self, idx: usize, state: BoostPadState) {
        self.inner.boost_pad_grid.pads_mut()[idx].set_state(state);
    }

    #[inline]
    #[must_use]
    pub const fn cars(&self) -> &AHashMap<u32, Car> {
        &self.inner.cars
    }

    #[must_use]
    pub fn get_car(&self, car_id: u32) -> Option<&Car> {
        self.inner.cars.get(&car_id)
    }

    #[must_use]
    pub fn get_car_mut(&mut self, car_id: u32) -> Option<&mut Car> {
        self.inner.cars.get_mut(&car_id)
    }

    #[must_use]
    pub const fn get_ball_state(&self) -> &BallState {
        &self.inner.ball.state
    }

    /// Radius of the ball's collision shape for the active mutator config
    #[must_use]
    pub const fn get_ball_radius(&self) -> f32 {
        self.inner.mutator_config.ball_radius
    }

    /// Ball speed clamping applies immediately, like after a solver step
    pub fn set_ball_state(&mut self, mut state: BallState) {
        let max_speed = self.inner.mutator_config.ball_max_speed;
        if state.phys.vel.length_squared() > max_speed * max_speed {
            state.phys.vel = state.phys.vel.normalize() * max_speed;
        }
        if state.phys.ang_vel.length_squared()
            > consts::ball::MAX_ANG_SPEED * consts::ball::MAX_ANG_SPEED
        {
            state.phys.ang_vel = state.phys.ang_vel.normalize() * consts::ball::MAX_ANG_SPEED;
        }

        let ball = &mut self.inner.ball;
        let rb = &mut self.world.bodies_mut()[ball.rigid_body_idx];
        rb.pos = state.phys.pos;
        rb.rot = state.phys.rot_mat;
        rb.lin_vel = state.phys.vel;
        rb.ang_vel = state.phys.ang_vel;

        ball.velocity_impulse_cache = Vec3A::ZERO;
        ball.state = state;
        ball.state.tick_count_since_update = 0;
    }

    /// Adds a car to the match, returning its id.
    /// Ids are issued from a monotonic counter and never reused.
    pub fn add_car(&mut self, team: Team, config: CarConfig) -> u32 {
        let id = self.inner.last_car_id + 1;
        self.add_car_with_id(id, team, config)
    }

    pub(crate) fn add_car_with_id(&mut self, id: u32, team: Team, config: CarConfig) -> u32 {
        debug_assert!(id > self.inner.last_car_id);
        self.inner.last_car_id = id;

        let mut car = Car::new(
            id,
            team,
            &mut self.world,
            &self.inner.mutator_config,
            config,
        );
        car.respawn(
            &mut self.world.bodies_mut()[car.rigid_body_idx],
            &mut self.inner.rng,
            self.inner.game_mode,
            self.inner.mutator_config.car_spawn_boost_amount,
        );

        self.inner.cars.insert(id, car);
        id
    }

    pub fn remove_car(&mut self, id: u32) -> Result<(), ArenaError> {
        let car = self
            .inner
            .cars
            .remove(&id)
            .ok_or(ArenaError::CarNotFound(id))?;

        if car.rigid_body_idx < self.inner.ball.rigid_body_idx {
            self.inner.ball.rigid_body_idx -= 1;
        }
        for other in self.inner.cars.values_mut() {
            if car.rigid_body_idx < other.rigid_body_idx {
                other.rigid_body_idx -= 1;
            }
        }

        self.world.remove_body(car.rigid_body_idx);
        Ok(())
    }

    pub fn set_car_state(&mut self, car_id: u32, state: &CarState) -> Result<(), ArenaError> {
        let car = self
            .inner
            .cars
            .get_mut(&car_id)
            .ok_or(ArenaError::CarNotFound(car_id))?;
        car.set_state(&mut self.world.bodies_mut()[car.rigid_body_idx], state);
        Ok(())
    }

    pub fn set_car_controls(&mut self, car_id: u32, controls: crate::sim::CarControls) -> Result<(), ArenaError> {
        self.inner
            .cars
            .get_mut(&car_id)
            .ok_or(ArenaError::CarNotFound(car_id))?
            .set_controls(controls);
        Ok(())
    }

    pub fn respawn_car(&mut self, car_id: u32) -> Result<(), ArenaError> {
        let car = self
            .inner
            .cars
            .get_mut(&car_id)
            .ok_or(ArenaError::CarNotFound(car_id))?;
        car.state.is_demoed = false;

        let rb = &mut self.world.bodies_mut()[car.rigid_body_idx];
        rb.disable_simulation = false;
        rb.no_contact_response = false;

        let game_mode = self.inner.game_mode;
        let boost = self.inner.mutator_config.car_spawn_boost_amount;
        car.respawn(rb, &mut self.inner.rng, game_mode, boost);
        Ok(())
    }

    pub fn demolish_car(&mut self, car_id: u32) -> Result<(), ArenaError> {
        let respawn_delay = self.inner.mutator_config.respawn_delay;
        self.inner
            .cars
            .get_mut(&car_id)
            .ok_or(ArenaError::CarNotFound(car_id))?
            .demolish(respawn_delay);
        Ok(())
    }

    #[must_use]
    pub const fn get_dropshot_tiles_state(&self) -> Option<&DropshotTilesState> {
        self.inner.dropshot_tiles.as_ref()
    }

    pub fn set_dropshot_tiles_state(&mut self, tiles: &DropshotTilesState) {
        if let Some(own) = &mut self.inner.dropshot_tiles {
            own.set_all(tiles.tiles());
        }
    }

    /// Raise the stop flag; the sub-tick loop exits at the next boundary
    pub fn stop(&mut self) {
        self.inner.stop_requested = true;
    }

    pub fn set_goal_score_callback(
        &mut self,
        callback: GoalScoreCallback,
        user_tag: u64,
    ) -> Result<Option<(GoalScoreCallback, u64)>, ArenaError> {
        if !self.inner.game_mode.has_goals() {
            return Err(ArenaError::ModeUnsupported(self.inner.game_mode));
        }
        Ok(self.inner.callbacks.goal_score.replace((callback, user_tag)))
    }

    pub fn set_car_bump_callback(
        &mut self,
        callback: CarBumpCallback,
        user_tag: u64,
    ) -> Option<(CarBumpCallback, u64)> {
        self.inner.callbacks.car_bump.replace((callback, user_tag))
    }

    pub fn set_car_demo_callback(
        &mut self,
        callback: CarDemoCallback,
        user_tag: u64,
    ) -> Option<(CarDemoCallback, u64)> {
        self.inner.callbacks.car_demo.replace((callback, user_tag))
    }

    pub fn set_boost_pickup_callback(
        &mut self,
        callback: BoostPickupCallback,
        user_tag: u64,
    ) -> Result<Option<(BoostPickupCallback, u64)>, ArenaError> {
        if !self.inner.game_mode.has_boost_pads() {
            return Err(ArenaError::ModeUnsupported(self.inner.game_mode));
        }
        Ok(self
            .inner
            .callbacks
            .boost_pickup
            .replace((callback, user_tag)))
    }

    pub fn set_ball_touch_callback(
        &mut self,
        callback: BallTouchCallback,
        user_tag: u64,
    ) -> Option<(BallTouchCallback, u64)> {
        self.inner.callbacks.ball_touch.replace((callback, user_tag))
    }

    #[must_use]
    pub fn is_ball_scored(&self) -> bool {
        let ball_pos = self.world.bodies()[self.inner.ball.rigid_body_idx].pos;
        let mutator = &self.inner.mutator_config;

        match self.inner.game_mode {
            GameMode::Soccar | GameMode::Heatseeker | GameMode::Snowday => {
                ball_pos.y.abs() > mutator.goal_base_threshold_y + mutator.ball_radius
            }
            GameMode::Hoops => {
                if ball_pos.z < consts::goal::HOOPS_SCORE_THRESHOLD_Z {
                    let dy = ball_pos.y.abs() * consts::goal::HOOPS_RIM_SCALE_Y
                        - consts::goal::HOOPS_RIM_OFFSET_Y;
                    ball_pos.x * ball_pos.x + dy * dy
                        < consts::goal::HOOPS_RIM_RADIUS * consts::goal::HOOPS_RIM_RADIUS
                } else {
                    false
                }
            }
            GameMode::Dropshot => ball_pos.z < -mutator.ball_radius * 1.75,
            GameMode::TheVoid | GameMode::TheVoidWithGround => false,
        }
    }

    /// Trace the ball's ballistic trajectory for up to `max_time`, ignoring
    /// walls and the ceiling, and report the goal mouth it would enter.
    ///
    /// Purposefully overestimates, like the source game's shot prediction.
    /// `extra_margin` widens (or, negative, narrows) the goal mouth.
    #[must_use]
    pub fn is_ball_probably_going_in(&self, max_time: f32, extra_margin: f32) -> Option<Team> {
        if !matches!(
            self.inner.game_mode,
            GameMode::Soccar | GameMode::Heatseeker | GameMode::Snowday
        ) {
            return None;
        }

        let mutator = &self.inner.mutator_config;
        let threshold_y = mutator.goal_base_threshold_y + mutator.ball_radius;
        let margin = mutator.ball_radius + extra_margin;

        const TRACE_DT: f32 = 1.0 / 60.0;
        let gravity = mutator.gravity;
        let mut pos = self.inner.ball.state.phys.pos;
        let mut vel = self.inner.ball.state.phys.vel;

        let mut t = 0.0;
        while t < max_time {
            vel += gravity * TRACE_DT;
            pos += vel * TRACE_DT;
            t += TRACE_DT;

            if pos.y.abs() >= threshold_y {
                let in_mouth = pos.x.abs() < consts::goal::SOCCAR_GOAL_HALF_WIDTH + margin
                    && pos.z < consts::goal::SOCCAR_GOAL_HEIGHT + margin;
                return in_mouth.then(|| Team::from_team_y(pos.y).opponent());
            }
        }

        None
    }

    /// Deterministic given a seed: places the ball at center, cars at
    /// canonical kickoff poses, resets pads and dropshot tiles.
    pub fn reset_to_random_kickoff(&mut self, seed: Option<u64>) {
        if let Some(seed) = seed {
            self.inner.rng = Rng::with_seed(seed);
        }

        let game_mode = self.inner.game_mode;
        let kickoff_locs = consts::car::spawn::kickoff_locations(game_mode);
        let respawn_locs = consts::car::spawn::respawn_locations(game_mode);

        let mut kickoff_order: ArrayVec<usize, 8> = (0..kickoff_locs.len()).collect();
        self.inner.rng.shuffle(&mut kickoff_order);

        let car_ids = self.inner.sorted_car_ids();
        let blue_ids: Vec<u32> = car_ids
            .iter()
            .copied()
            .filter(|id| self.inner.cars[id].team == Team::Blue)
            .collect();
        let orange_ids: Vec<u32> = car_ids
            .iter()
            .copied()
            .filter(|id| self.inner.cars[id].team == Team::Orange)
            .collect();

        let mut num_cars_at_respawn_pos = [0usize; 4];
        let kickoff_position_amount = blue_ids.len().max(orange_ids.len());

        for i in 0..kickoff_position_amount {
            let spawn_pos = if i < kickoff_locs.len() {
                kickoff_locs[kickoff_order[i]]
            } else {
                const EXTRA_OFFSET_Y: f32 = 250.0;

                let idx = (i - kickoff_locs.len()) % respawn_locs.len();
                let mut pos = respawn_locs[idx];
                pos.y += EXTRA_OFFSET_Y * num_cars_at_respawn_pos[idx] as f32;
                num_cars_at_respawn_pos[idx] += 1;
                pos
            };

            for (ids, is_blue) in [(&blue_ids, true), (&orange_ids, false)] {
                let Some(&car_id) = ids.get(i) else {
                    continue;
                };

                let mut pos = Vec3A::new(spawn_pos.x, spawn_pos.y, consts::car::spawn::SPAWN_Z);
                let mut yaw = spawn_pos.yaw_ang;
                if !is_blue {
                    pos *= Vec3A::new(-1.0, -1.0, 1.0);
                    yaw += PI;
                }

                let rounded = round_angle_ue3(Angle::new(yaw, 0.0, 0.0).normalized());
                let spawn_state = CarState {
                    phys: PhysState {
                        pos,
                        rot_mat: rounded.to_rot_mat(),
                        vel: Vec3A::ZERO,
                        ang_vel: Vec3A::ZERO,
                    },
                    boost: self.inner.mutator_config.car_spawn_boost_amount,
                    is_on_ground: true,
                    ..Default::default()
                };

                let car = self.inner.cars.get_mut(&car_id).unwrap();
                car.set_state(
                    &mut self.world.bodies_mut()[car.rigid_body_idx],
                    &spawn_state,
                );
            }
        }

        let mut ball_state = BallState::DEFAULT;
        match game_mode {
            GameMode::Heatseeker => {
                let y_sign = f32::from(i8::from(self.inner.rng.bool()) * 2 - 1);
                let scale = Vec3A::new(1.0, y_sign, 1.0);
                ball_state.phys.pos = consts::heatseeker::BALL_START_POS * scale;
                ball_state.phys.vel = consts::heatseeker::BALL_START_VEL * scale;
            }
            GameMode::Snowday => {
                ball_state.phys.vel.z = f32::EPSILON;
            }
            _ => {}
        }
        self.set_ball_state(ball_state);

        self.inner.boost_pad_grid.reset();
        if let Some(tiles) = &mut self.inner.dropshot_tiles {
            tiles.reset();
        }
        self.inner.ball_scored_last_tick = false;
    }

    fn internal_step(&mut self) {
        self.inner.contact_tracker.clear();
        self.inner.contact_tracker.reserve(16);
        self.inner.ball_touch_emitted.clear();
        self.inner.pending_floor_hit_pos = None;

        // Pre-physics, in ascending car id order
        let car_ids = self.inner.sorted_car_ids();
        {
            let ArenaInner {
                rng,
                cars,
                game_mode,
                tick_time,
                mutator_config,
                ..
            } = &mut self.inner;

            for id in &car_ids {
                let car = cars.get_mut(id).unwrap();
                car.pre_tick_update(&mut self.world, rng, *game_mode, *tick_time, mutator_config);
            }
        }

        // Solver step; contacts are only recorded, never processed inline
        self.world.step(self.inner.tick_time, &mut self.inner);

        // Deferred contact dispatch, in solver manifold order
        let records = self.inner.contact_tracker.take_records();
        for record in &records {
            match (record.user_index_a, record.user_index_b) {
                (UserInfoTypes::Car, UserInfoTypes::Ball) => {
                    self.inner.on_ball_hit(record.user_pointer_a, record);
                }
                (UserInfoTypes::Car, UserInfoTypes::Car) => {
                    self.inner.on_car_car_collision(
                        record.user_pointer_a,
                        record.user_pointer_b,
                        record,
                    );
                }
                (UserInfoTypes::Car, UserInfoTypes::None) => {
                    self.inner.on_car_world_collision(record.user_pointer_a, record);
                }
                (UserInfoTypes::Ball, UserInfoTypes::None) => {
                    if record.normal_world_on_b.z > 0.7 {
                        self.inner.pending_floor_hit_pos = Some(record.world_point);
                    }
                }
                _ => {}
            }
        }

        // Post-physics
        for id in &car_ids {
            let car = self.inner.cars.get_mut(id).unwrap();
            car.post_tick_update(self.inner.tick_time);
            car.finish_physics_tick(&mut self.world.bodies_mut()[car.rigid_body_idx]);
        }

        {
            let ball = &mut self.inner.ball;
            let rb = &mut self.world.bodies_mut()[ball.rigid_body_idx];
            ball.mode_post_tick_update(self.inner.game_mode, rb, self.inner.tick_time);
            ball.finish_physics_tick(rb, &self.inner.mutator_config);
        }

        self.resolve_dropshot_damage();

        // Boost pads
        self.inner.boost_pad_grid.advance_cooldowns(self.inner.tick_time);
        {
            let ArenaInner {
                cars,
                boost_pad_grid,
                mutator_config,
                events,
                ..
            } = &mut self.inner;

            for id in &car_ids {
                let car = cars.get_mut(id).unwrap();
                if let Some(pad_idx) =
                    boost_pad_grid.maybe_give_car_boost(&mut car.state, mutator_config)
                {
                    events.push(ArenaEvent::BoostPickup(BoostPickupEvent {
                        car_id: *id,
                        pad_idx,
                    }));
                }
            }
        }

        // Goal check fires on the tick the ball enters the net
        if self.inner.game_mode.has_goals() {
            let scored = self.is_ball_scored();
            if scored && !self.inner.ball_scored_last_tick {
                let ball_y = self.inner.ball.state.phys.pos.y;
                let scoring_team = Team::from_team_y(ball_y).opponent();
                self.inner.queue(ArenaEvent::GoalScore(scoring_team));
            }
            self.inner.ball_scored_last_tick = scored;
        }

        self.inner.invoke_callbacks();

        // A faulting sub-tick completes but does not advance the tick count
        if self.inner.callback_fault.is_some() {
            self.inner.stop_requested = true;
            return;
        }

        self.inner.tick_count += 1;
    }

    fn resolve_dropshot_damage(&mut self) {
        let Some(hit_pos) = self.inner.pending_floor_hit_pos.take() else {
            return;
        };
        let Some(tiles) = &mut self.inner.dropshot_tiles else {
            return;
        };

        let ds = self.inner.ball.state.ds_info;
        if ds.y_target_dir == 0.0 {
            return;
        }

        // Only the claimed side takes damage
        let side = Team::from_team_y(hit_pos.y);
        if side.get_y_dir() != ds.y_target_dir {
            return;
        }

        if ds.has_damaged
            && self.inner.tick_count
                < ds.last_damage_tick + consts::dropshot::MIN_DAMAGE_INTERVAL_TICKS
        {
            return;
        }

        let Some(center_idx) = tiles.tile_under(hit_pos, side) else {
            return;
        };

        tiles.apply_damage(center_idx, ds.charge_level);

        let ds = &mut self.inner.ball.state.ds_info;
        ds.accumulated_hit_force = 0.0;
        ds.charge_level = 1;
        ds.has_damaged = true;
        ds.last_damage_tick = self.inner.tick_count;
        ds.y_target_dir = 0.0;
    }

    /// Simulate everything in the arena for `ticks_to_simulate` ticks.
    ///
    /// Returns early if a callback requests a stop. A panic raised inside a
    /// callback is re-raised here after the faulting sub-tick completes.
    pub fn step(&mut self, ticks_to_simulate: u32) {
        self.inner.stop_requested = false;

        for _ in 0..ticks_to_simulate {
            self.internal_step();
            if self.inner.stop_requested {
                break;
            }
        }

        if let Some(payload) = self.inner.callback_fault.take() {
            resume_unwind(payload);
        }
    }

    /// Deep copy: fresh solver world and rigid bodies at identical states,
    /// cars keeping their ids, tick count preserved.
    #[must_use]
    pub fn clone_arena(&self, copy_callbacks: bool) -> Self {
        let mut clone = Self::new_with_config(
            self.inner.game_mode,
            self.inner.config.clone(),
            self.get_tick_rate(),
        )
        .expect("source arena was valid");

        clone.inner.mutator_config = self.inner.mutator_config;
        clone.world.set_gravity(self.inner.mutator_config.gravity);
        // Copy the exact tick time; re-deriving it from the rate loses ulps
        clone.inner.tick_time = self.inner.tick_time;
        clone.inner.tick_count = self.inner.tick_count;
        clone.inner.ball_scored_last_tick = self.inner.ball_scored_last_tick;

        for id in self.inner.sorted_car_ids() {
            let car = &self.inner.cars[&id];
            clone.add_car_with_id(id, car.team, *car.get_config());
            clone
                .set_car_state(id, car.get_state())
                .expect("car was just added");
        }
        clone.inner.last_car_id = self.inner.last_car_id;

        // Restore the RNG last: spawning the cars above consumed draws
        clone.inner.rng = Rng::with_seed(self.inner.rng.get_seed());

        clone.set_ball_state(*self.get_ball_state());
        clone.inner.ball.state = self.inner.ball.state;

        for (idx, pad) in self.boost_pads().iter().enumerate() {
            clone.set_boost_pad_state(idx, *pad.get_state());
        }

        if let Some(tiles) = &self.inner.dropshot_tiles {
            clone.set_dropshot_tiles_state(tiles);
        }

        if copy_callbacks {
            clone.inner.callbacks = CallbackSlots {
                goal_score: self.inner.callbacks.goal_score.clone(),
                car_bump: self.inner.callbacks.car_bump.clone(),
                car_demo: self.inner.callbacks.car_demo.clone(),
                boost_pickup: self.inner.callbacks.boost_pickup.clone(),
                ball_touch: self.inner.callbacks.ball_touch.clone(),
            };
        }

        clone
    }
}
