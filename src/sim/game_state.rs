use crate::sim::{
    Arena, BallHitInfo, BallState, CarConfig, CarContact, CarControls, CarState, GameMode,
    HeatseekerInfo, PhysState, SerializeError, Team, WheelPairConfig,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Mat3A, Vec3A};
use std::io::Cursor;

/// Little-endian stream writer for the mirror protocol and snapshots
#[derive(Default)]
pub(crate) struct ByteWriter {
    pub data: Vec<u8>,
}

impl ByteWriter {
    pub fn write_u8(&mut self, val: u8) {
        self.data.push(val);
    }

    pub fn write_bool(&mut self, val: bool) {
        self.write_u8(u8::from(val));
    }

    pub fn write_u32(&mut self, val: u32) {
        self.data.write_u32::<LittleEndian>(val).unwrap();
    }

    pub fn write_u64(&mut self, val: u64) {
        self.data.write_u64::<LittleEndian>(val).unwrap();
    }

    pub fn write_f32(&mut self, val: f32) {
        self.data.write_f32::<LittleEndian>(val).unwrap();
    }

    pub fn write_vec(&mut self, v: Vec3A) {
        self.write_f32(v.x);
        self.write_f32(v.y);
        self.write_f32(v.z);
    }

    /// Rows are written forward, right, up
    pub fn write_rot_mat(&mut self, m: Mat3A) {
        self.write_vec(m.x_axis);
        self.write_vec(m.y_axis);
        self.write_vec(m.z_axis);
    }
}

/// Little-endian stream reader; every read fails cleanly at end of input
pub(crate) struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    fn eof(&self) -> SerializeError {
        SerializeError::UnexpectedEnd(self.offset())
    }

    pub fn read_u8(&mut self) -> Result<u8, SerializeError> {
        self.cursor.read_u8().map_err(|_| self.eof())
    }

    pub fn read_bool(&mut self) -> Result<bool, SerializeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32, SerializeError> {
        self.cursor
            .read_u32::<LittleEndian>()
            .map_err(|_| self.eof())
    }

    pub fn read_u64(&mut self) -> Result<u64, SerializeError> {
        self.cursor
            .read_u64::<LittleEndian>()
            .map_err(|_| self.eof())
    }

    pub fn read_f32(&mut self) -> Result<f32, SerializeError> {
        self.cursor
            .read_f32::<LittleEndian>()
            .map_err(|_| self.eof())
    }

    pub fn read_vec(&mut self) -> Result<Vec3A, SerializeError> {
        Ok(Vec3A::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_rot_mat(&mut self) -> Result<Mat3A, SerializeError> {
        Ok(Mat3A::from_cols(
            self.read_vec()?,
            self.read_vec()?,
            self.read_vec()?,
        ))
    }
}

pub(crate) fn write_car_controls(w: &mut ByteWriter, controls: &CarControls) {
    w.write_f32(controls.throttle);
    w.write_f32(controls.steer);
    w.write_f32(controls.pitch);
    w.write_f32(controls.yaw);
    w.write_f32(controls.roll);
    w.write_bool(controls.boost);
    w.write_bool(controls.jump);
    w.write_bool(controls.handbrake);
}

pub(crate) fn read_car_controls(r: &mut ByteReader) -> Result<CarControls, SerializeError> {
    Ok(CarControls {
        throttle: r.read_f32()?,
        steer: r.read_f32()?,
        pitch: r.read_f32()?,
        yaw: r.read_f32()?,
        roll: r.read_f32()?,
        boost: r.read_bool()?,
        jump: r.read_bool()?,
        handbrake: r.read_bool()?,
    })
}

pub(crate) fn write_car_config(w: &mut ByteWriter, config: &CarConfig) {
    w.write_vec(config.hitbox_size);
    w.write_vec(config.hitbox_pos_offset);
    for pair in [&config.front_wheels, &config.back_wheels] {
        w.write_f32(pair.wheel_radius);
        w.write_f32(pair.suspension_rest_length);
        w.write_vec(pair.connection_point_offset);
    }
    w.write_f32(config.dodge_deadzone);
}

pub(crate) fn read_car_config(r: &mut ByteReader) -> Result<CarConfig, SerializeError> {
    let hitbox_size = r.read_vec()?;
    let hitbox_pos_offset = r.read_vec()?;

    let mut pairs = [WheelPairConfig {
        wheel_radius: 0.0,
        suspension_rest_length: 0.0,
        connection_point_offset: Vec3A::ZERO,
    }; 2];
    for pair in &mut pairs {
        pair.wheel_radius = r.read_f32()?;
        pair.suspension_rest_length = r.read_f32()?;
        pair.connection_point_offset = r.read_vec()?;
    }

    Ok(CarConfig {
        hitbox_size,
        hitbox_pos_offset,
        front_wheels: pairs[0],
        back_wheels: pairs[1],
        dodge_deadzone: r.read_f32()?,
    })
}

/// The full `S_car` block of the wire format, in fixed field order
pub(crate) fn write_car_state(w: &mut ByteWriter, state: &CarState) {
    w.write_vec(state.phys.pos);
    w.write_rot_mat(state.phys.rot_mat);
    w.write_vec(state.phys.vel);
    w.write_vec(state.phys.ang_vel);
    w.write_bool(state.is_on_ground);
    for wheel in state.wheels_with_contact {
        w.write_bool(wheel);
    }
    w.write_bool(state.has_jumped);
    w.write_bool(state.has_double_jumped);
    w.write_bool(state.has_flipped);
    w.write_vec(state.flip_rel_torque);
    w.write_f32(state.jump_time);
    w.write_f32(state.flip_time);
    w.write_bool(state.is_flipping);
    w.write_bool(state.is_jumping);
    w.write_f32(state.air_time);
    w.write_f32(state.air_time_since_jump);
    w.write_f32(state.boost);
    w.write_f32(state.time_since_boosted);
    w.write_bool(state.is_boosting);
    w.write_f32(state.boosting_time);
    w.write_bool(state.is_supersonic);
    w.write_f32(state.supersonic_time);
    w.write_f32(state.handbrake_val);
    w.write_bool(state.is_auto_flipping);
    w.write_f32(state.auto_flip_timer);
    w.write_f32(state.auto_flip_torque_scale);

    let world_contact = state.world_contact_normal;
    w.write_bool(world_contact.is_some());
    w.write_vec(world_contact.unwrap_or(Vec3A::ZERO));

    let car_contact = state.car_contact.unwrap_or_default();
    w.write_u32(car_contact.other_car_id);
    w.write_f32(car_contact.cooldown_timer);

    w.write_bool(state.is_demoed);
    w.write_f32(state.demo_respawn_timer);

    let hit = state.ball_hit_info.unwrap_or_default();
    w.write_bool(state.ball_hit_info.is_some());
    w.write_vec(hit.relative_pos_on_ball);
    w.write_vec(hit.ball_pos);
    w.write_vec(hit.extra_hit_vel);
    w.write_u64(hit.tick_count_when_hit);
    w.write_u64(hit.tick_count_when_extra_impulse_applied);

    write_car_controls(w, &state.last_controls);
}

pub(crate) fn read_car_state(r: &mut ByteReader) -> Result<CarState, SerializeError> {
    let mut state = CarState {
        phys: PhysState {
            pos: r.read_vec()?,
            rot_mat: r.read_rot_mat()?,
            vel: r.read_vec()?,
            ang_vel: r.read_vec()?,
        },
        ..Default::default()
    };

    state.is_on_ground = r.read_bool()?;
    for wheel in &mut state.wheels_with_contact {
        *wheel = r.read_bool()?;
    }
    state.has_jumped = r.read_bool()?;
    state.has_double_jumped = r.read_bool()?;
    state.has_flipped = r.read_bool()?;
    state.flip_rel_torque = r.read_vec()?;
    state.jump_time = r.read_f32()?;
    state.flip_time = r.read_f32()?;
    state.is_flipping = r.read_bool()?;
    state.is_jumping = r.read_bool()?;
    state.air_time = r.read_f32()?;
    state.air_time_since_jump = r.read_f32()?;
    state.boost = r.read_f32()?;
    state.time_since_boosted = r.read_f32()?;
    state.is_boosting = r.read_bool()?;
    state.boosting_time = r.read_f32()?;
    state.is_supersonic = r.read_bool()?;
    state.supersonic_time = r.read_f32()?;
    state.handbrake_val = r.read_f32()?;
    state.is_auto_flipping = r.read_bool()?;
    state.auto_flip_timer = r.read_f32()?;
    state.auto_flip_torque_scale = r.read_f32()?;

    let has_world_contact = r.read_bool()?;
    let contact_normal = r.read_vec()?;
    state.world_contact_normal = has_world_contact.then_some(contact_normal);

    let other_car_id = r.read_u32()?;
    let cooldown_timer = r.read_f32()?;
    state.car_contact = (other_car_id != 0).then_some(CarContact {
        other_car_id,
        cooldown_timer,
    });

    state.is_demoed = r.read_bool()?;
    state.demo_respawn_timer = r.read_f32()?;

    let hit_is_valid = r.read_bool()?;
    let hit = BallHitInfo {
        relative_pos_on_ball: r.read_vec()?,
        ball_pos: r.read_vec()?,
        extra_hit_vel: r.read_vec()?,
        tick_count_when_hit: r.read_u64()?,
        tick_count_when_extra_impulse_applied: r.read_u64()?,
    };
    state.ball_hit_info = hit_is_valid.then_some(hit);

    state.last_controls = read_car_controls(r)?;
    state.controls = state.last_controls;

    Ok(state)
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoostPadInfo {
    pub is_active: bool,
    pub cooldown: f32,
    pub pos: Vec3A,
    pub is_big: bool,
}

impl BoostPadInfo {
    pub const NUM_BYTES: usize = 1 + 4 + 12 + 1;
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarInfo {
    pub id: u32,
    pub team: Team,
    pub state: CarState,
    pub config: CarConfig,
}

impl CarInfo {
    pub const NUM_BYTES: usize = 4     // id
        + 1                            // team
        + 12 + 36 + 12 + 12            // pos, rotMat, vel, angVel
        + 1 + 4                        // isOnGround, wheelsWithContact
        + 1 + 1 + 1                    // hasJumped, hasDoubleJumped, hasFlipped
        + 12 + 4 + 4                   // flipRelTorque, jumpTime, flipTime
        + 1 + 1                        // isFlipping, isJumping
        + 4 + 4                        // airTime, airTimeSinceJump
        + 4 + 4 + 1 + 4                // boost, timeSinceBoosted, isBoosting, boostingTime
        + 1 + 4                        // isSupersonic, supersonicTime
        + 4                            // handbrakeVal
        + 1 + 4 + 4                    // isAutoFlipping, autoFlipTimer, autoFlipTorqueScale
        + 1 + 12                       // worldContact
        + 4 + 4                        // carContact
        + 1 + 4                        // isDemoed, demoRespawnTimer
        + 1 + 12 + 12 + 12 + 8 + 8     // ballHitInfo
        + 5 * 4 + 3                    // lastControls
        + 12 + 12 + (4 + 4 + 12) * 2 + 4; // CarConfig
}

/// A full state snapshot in the mirror wire layout.
///
/// `to_bytes` followed by `from_bytes` is byte-exact.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    pub tick_count: u64,
    pub tick_rate: f32,
    pub game_mode: GameMode,
    pub ball: BallState,
    pub pads: Vec<BoostPadInfo>,
    pub cars: Vec<CarInfo>,
}

impl GameState {
    /// Fixed header: tick count, tick rate, mode, pad count, car count
    pub const HEADER_NUM_BYTES: usize = 8 + 4 + 1 + 4 + 4;
    /// Ball block: pos, rotMat, vel, angVel, heatseeker info
    pub const BALL_NUM_BYTES: usize = 12 + 36 + 12 + 12 + 12;

    #[must_use]
    pub fn from_arena(arena: &Arena) -> Self {
        let mut car_ids: Vec<u32> = arena.cars().keys().copied().collect();
        car_ids.sort_unstable();

        Self {
            tick_count: arena.tick_count(),
            tick_rate: arena.get_tick_rate(),
            game_mode: arena.game_mode(),
            ball: *arena.get_ball_state(),
            pads: arena
                .boost_pads()
                .iter()
                .map(|pad| BoostPadInfo {
                    is_active: pad.get_state().is_active,
                    cooldown: pad.get_state().cooldown,
                    pos: pad.get_config().pos,
                    is_big: pad.get_config().is_big,
                })
                .collect(),
            cars: car_ids
                .into_iter()
                .map(|id| {
                    let car = &arena.cars()[&id];
                    CarInfo {
                        id,
                        team: car.team,
                        state: *car.get_state(),
                        config: *car.get_config(),
                    }
                })
                .collect(),
        }
    }

    /// Total packet size implied by a header; None if the header is short
    #[must_use]
    pub fn get_num_bytes(data: &[u8]) -> Option<usize> {
        let mut r = ByteReader::new(data);
        r.read_u64().ok()?;
        r.read_f32().ok()?;
        r.read_u8().ok()?;
        let num_pads = r.read_u32().ok()? as usize;
        let num_cars = r.read_u32().ok()? as usize;

        Some(
            Self::HEADER_NUM_BYTES
                + Self::BALL_NUM_BYTES
                + num_pads * BoostPadInfo::NUM_BYTES
                + num_cars * CarInfo::NUM_BYTES,
        )
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::default();

        w.write_u64(self.tick_count);
        w.write_f32(self.tick_rate);
        w.write_u8(self.game_mode as u8);
        w.write_u32(self.pads.len() as u32);
        w.write_u32(self.cars.len() as u32);

        w.write_vec(self.ball.phys.pos);
        w.write_rot_mat(self.ball.phys.rot_mat);
        w.write_vec(self.ball.phys.vel);
        w.write_vec(self.ball.phys.ang_vel);
        w.write_f32(self.ball.hs_info.y_target_dir);
        w.write_f32(self.ball.hs_info.cur_target_speed);
        w.write_f32(self.ball.hs_info.time_since_hit);

        for pad in &self.pads {
            w.write_bool(pad.is_active);
            w.write_f32(pad.cooldown);
            w.write_vec(pad.pos);
            w.write_bool(pad.is_big);
        }

        for car in &self.cars {
            w.write_u32(car.id);
            w.write_u8(car.team as u8);
            write_car_state(&mut w, &car.state);
            write_car_config(&mut w, &car.config);
        }

        w.data
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SerializeError> {
        let mut r = ByteReader::new(data);

        let tick_count = r.read_u64()?;
        let tick_rate = r.read_f32()?;
        let mode_raw = r.read_u8()?;
        let game_mode = GameMode::try_from(mode_raw)
            .map_err(|()| SerializeError::Malformed(r.offset(), "unknown game mode"))?;
        let num_pads = r.read_u32()? as usize;
        let num_cars = r.read_u32()? as usize;

        let ball = BallState {
            phys: PhysState {
                pos: r.read_vec()?,
                rot_mat: r.read_rot_mat()?,
                vel: r.read_vec()?,
                ang_vel: r.read_vec()?,
            },
            hs_info: HeatseekerInfo {
                y_target_dir: r.read_f32()?,
                cur_target_speed: r.read_f32()?,
                time_since_hit: r.read_f32()?,
            },
            ..Default::default()
        };

        let mut pads = Vec::with_capacity(num_pads.min(1024));
        for _ in 0..num_pads {
            pads.push(BoostPadInfo {
                is_active: r.read_bool()?,
                cooldown: r.read_f32()?,
                pos: r.read_vec()?,
                is_big: r.read_bool()?,
            });
        }

        let mut cars = Vec::with_capacity(num_cars.min(64));
        for _ in 0..num_cars {
            let id = r.read_u32()?;
            let team_raw = r.read_u8()?;
            let team = Team::try_from(team_raw)
                .map_err(|()| SerializeError::Malformed(r.offset(), "unknown team"))?;
            let state = read_car_state(&mut r)?;
            let config = read_car_config(&mut r)?;
            cars.push(CarInfo {
                id,
                team,
                state,
                config,
            });
        }

        Ok(Self {
            tick_count,
            tick_rate,
            game_mode,
            ball,
            pads,
            cars,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn car_info_size_matches_encoder() {
        let mut w = ByteWriter::default();
        w.write_u32(1);
        w.write_u8(0);
        write_car_state(&mut w, &CarState::DEFAULT);
        write_car_config(&mut w, &CarConfig::OCTANE);
        assert_eq!(w.data.len(), CarInfo::NUM_BYTES);
    }

    #[test]
    fn empty_game_state_round_trips() {
        let state = GameState {
            tick_count: 1234,
            tick_rate: 120.0,
            game_mode: GameMode::Soccar,
            ball: BallState::DEFAULT,
            pads: Vec::new(),
            cars: Vec::new(),
        };

        let bytes = state.to_bytes();
        assert_eq!(GameState::get_num_bytes(&bytes), Some(bytes.len()));

        let decoded = GameState::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.to_bytes(), bytes);
    }

    #[test]
    fn truncated_input_reports_offset() {
        let state = GameState {
            tick_count: 0,
            tick_rate: 120.0,
            game_mode: GameMode::Soccar,
            ball: BallState::DEFAULT,
            pads: vec![BoostPadInfo {
                is_active: true,
                cooldown: 0.0,
                pos: Vec3A::ZERO,
                is_big: false,
            }],
            cars: Vec::new(),
        };

        let mut bytes = state.to_bytes();
        bytes.truncate(bytes.len() - 4);

        match GameState::from_bytes(&bytes) {
            Err(SerializeError::UnexpectedEnd(offset)) => assert!(offset > 0),
            other => panic!("expected UnexpectedEnd, got {other:?}"),
        }
    }
}
