use crate::sim::{
    Arena, ArenaConfig, ArenaMemWeightMode, BallState, BoostPadConfig, BoostPadState, DemoMode,
    DropshotInfo, DropshotTile, GameMode, HeatseekerInfo, MutatorConfig, PhysState, SerializeError,
    Team, TileState,
    game_state::{
        ByteReader, ByteWriter, read_car_config, read_car_controls, read_car_state,
        write_car_config, write_car_controls, write_car_state,
    },
};

const SNAPSHOT_MAGIC: &[u8; 4] = b"BBSN";
const SNAPSHOT_VERSION: u32 = 1;

fn write_mutator_config(w: &mut ByteWriter, m: &MutatorConfig) {
    w.write_vec(m.gravity);
    w.write_f32(m.car_mass);
    w.write_f32(m.car_world_friction);
    w.write_f32(m.car_world_restitution);
    w.write_f32(m.ball_mass);
    w.write_f32(m.ball_max_speed);
    w.write_f32(m.ball_drag);
    w.write_f32(m.ball_world_friction);
    w.write_f32(m.ball_world_restitution);
    w.write_f32(m.ball_radius);
    w.write_f32(m.jump_accel);
    w.write_f32(m.jump_immediate_force);
    w.write_f32(m.boost_accel_ground);
    w.write_f32(m.boost_accel_air);
    w.write_f32(m.boost_used_per_second);
    w.write_f32(m.respawn_delay);
    w.write_f32(m.bump_cooldown_time);
    w.write_bool(m.bump_requires_front_hit);
    w.write_f32(m.car_max_boost_amount);
    w.write_f32(m.car_spawn_boost_amount);
    w.write_f32(m.boost_pad_amount_small);
    w.write_f32(m.boost_pad_amount_big);
    w.write_f32(m.boost_pad_cooldown_big);
    w.write_f32(m.boost_pad_cooldown_small);
    w.write_f32(m.ball_hit_extra_force_scale);
    w.write_f32(m.bump_force_scale);
    w.write_bool(m.unlimited_flips);
    w.write_bool(m.unlimited_double_jumps);
    w.write_bool(m.recharge_boost_enabled);
    w.write_f32(m.recharge_boost_per_second);
    w.write_f32(m.recharge_boost_delay);
    w.write_u8(m.demo_mode as u8);
    w.write_bool(m.enable_team_demos);
    w.write_bool(m.enable_car_car_collision);
    w.write_bool(m.enable_car_ball_collision);
    w.write_f32(m.goal_base_threshold_y);
}

fn read_mutator_config(r: &mut ByteReader) -> Result<MutatorConfig, SerializeError> {
    Ok(MutatorConfig {
        gravity: r.read_vec()?,
        car_mass: r.read_f32()?,
        car_world_friction: r.read_f32()?,
        car_world_restitution: r.read_f32()?,
        ball_mass: r.read_f32()?,
        ball_max_speed: r.read_f32()?,
        ball_drag: r.read_f32()?,
        ball_world_friction: r.read_f32()?,
        ball_world_restitution: r.read_f32()?,
        ball_radius: r.read_f32()?,
        jump_accel: r.read_f32()?,
        jump_immediate_force: r.read_f32()?,
        boost_accel_ground: r.read_f32()?,
        boost_accel_air: r.read_f32()?,
        boost_used_per_second: r.read_f32()?,
        respawn_delay: r.read_f32()?,
        bump_cooldown_time: r.read_f32()?,
        bump_requires_front_hit: r.read_bool()?,
        car_max_boost_amount: r.read_f32()?,
        car_spawn_boost_amount: r.read_f32()?,
        boost_pad_amount_small: r.read_f32()?,
        boost_pad_amount_big: r.read_f32()?,
        boost_pad_cooldown_big: r.read_f32()?,
        boost_pad_cooldown_small: r.read_f32()?,
        ball_hit_extra_force_scale: r.read_f32()?,
        bump_force_scale: r.read_f32()?,
        unlimited_flips: r.read_bool()?,
        unlimited_double_jumps: r.read_bool()?,
        recharge_boost_enabled: r.read_bool()?,
        recharge_boost_per_second: r.read_f32()?,
        recharge_boost_delay: r.read_f32()?,
        demo_mode: {
            let raw = r.read_u8()?;
            DemoMode::try_from(raw)
                .map_err(|()| SerializeError::Malformed(r.offset(), "unknown demo mode"))?
        },
        enable_team_demos: r.read_bool()?,
        enable_car_car_collision: r.read_bool()?,
        enable_car_ball_collision: r.read_bool()?,
        goal_base_threshold_y: r.read_f32()?,
    })
}

fn write_arena_config(w: &mut ByteWriter, c: &ArenaConfig) {
    w.write_u8(c.mem_weight_mode as u8);
    w.write_vec(c.min_pos);
    w.write_vec(c.max_pos);
    w.write_bool(c.no_ball_rot);
    w.write_bool(c.use_custom_boost_pads);
    w.write_u32(c.custom_boost_pads.len() as u32);
    for pad in &c.custom_boost_pads {
        w.write_vec(pad.pos);
        w.write_bool(pad.is_big);
    }
}

fn read_arena_config(r: &mut ByteReader) -> Result<ArenaConfig, SerializeError> {
    let mem_weight_mode = match r.read_u8()? {
        0 => ArenaMemWeightMode::Heavy,
        1 => ArenaMemWeightMode::Light,
        _ => return Err(SerializeError::Malformed(r.offset(), "unknown mem weight")),
    };

    let min_pos = r.read_vec()?;
    let max_pos = r.read_vec()?;
    let no_ball_rot = r.read_bool()?;
    let use_custom_boost_pads = r.read_bool()?;

    let num_pads = r.read_u32()? as usize;
    let mut custom_boost_pads = Vec::with_capacity(num_pads.min(1024));
    for _ in 0..num_pads {
        custom_boost_pads.push(BoostPadConfig {
            pos: r.read_vec()?,
            is_big: r.read_bool()?,
        });
    }

    Ok(ArenaConfig {
        mem_weight_mode,
        min_pos,
        max_pos,
        no_ball_rot,
        use_custom_boost_pads,
        custom_boost_pads,
        rng_seed: None,
    })
}

fn write_ball_state(w: &mut ByteWriter, b: &BallState) {
    w.write_vec(b.phys.pos);
    w.write_rot_mat(b.phys.rot_mat);
    w.write_vec(b.phys.vel);
    w.write_vec(b.phys.ang_vel);
    w.write_u32(b.last_hit_car_id);
    w.write_f32(b.hs_info.y_target_dir);
    w.write_f32(b.hs_info.cur_target_speed);
    w.write_f32(b.hs_info.time_since_hit);
    w.write_u32(b.ds_info.charge_level as u32);
    w.write_f32(b.ds_info.accumulated_hit_force);
    w.write_f32(b.ds_info.y_target_dir);
    w.write_bool(b.ds_info.has_damaged);
    w.write_u64(b.ds_info.last_damage_tick);
}

fn read_ball_state(r: &mut ByteReader) -> Result<BallState, SerializeError> {
    Ok(BallState {
        phys: PhysState {
            pos: r.read_vec()?,
            rot_mat: r.read_rot_mat()?,
            vel: r.read_vec()?,
            ang_vel: r.read_vec()?,
        },
        last_hit_car_id: r.read_u32()?,
        hs_info: HeatseekerInfo {
            y_target_dir: r.read_f32()?,
            cur_target_speed: r.read_f32()?,
            time_since_hit: r.read_f32()?,
        },
        ds_info: DropshotInfo {
            charge_level: r.read_u32()? as i32,
            accumulated_hit_force: r.read_f32()?,
            y_target_dir: r.read_f32()?,
            has_damaged: r.read_bool()?,
            last_damage_tick: r.read_u64()?,
        },
        tick_count_since_update: 0,
    })
}

impl Arena {
    /// Serialize the entire arena state into the versioned snapshot format.
    ///
    /// NOTE: Car ids are not stored; `deserialize_new` assigns fresh ids in
    /// serialized (ascending) order.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = ByteWriter::default();

        w.data.extend_from_slice(SNAPSHOT_MAGIC);
        w.write_u32(SNAPSHOT_VERSION);
        w.write_u8(self.game_mode() as u8);
        w.write_f32(self.get_tick_rate());
        w.write_u64(self.tick_count());
        write_mutator_config(&mut w, self.get_mutator_config());
        write_arena_config(&mut w, self.get_config());

        write_ball_state(&mut w, self.get_ball_state());

        let pads = self.boost_pads();
        w.write_u32(pads.len() as u32);
        for pad in pads {
            w.write_vec(pad.get_config().pos);
            w.write_bool(pad.get_config().is_big);
            w.write_bool(pad.get_state().is_active);
            w.write_f32(pad.get_state().cooldown);
        }

        let mut car_ids: Vec<u32> = self.cars().keys().copied().collect();
        car_ids.sort_unstable();
        w.write_u32(car_ids.len() as u32);
        for id in car_ids {
            let car = &self.cars()[&id];
            w.write_u8(car.team as u8);
            write_car_config(&mut w, car.get_config());
            write_car_state(&mut w, car.get_state());
            write_car_controls(&mut w, car.get_controls());
        }

        match self.get_dropshot_tiles_state() {
            Some(tiles) => {
                w.write_u32(tiles.tiles().len() as u32);
                for tile in tiles.tiles() {
                    w.write_vec(tile.pos);
                    w.write_u8(tile.state as u8);
                }
            }
            None => w.write_u32(0),
        }

        w.data
    }

    /// Build a new arena from a snapshot produced by [`Arena::serialize`].
    ///
    /// Fails without side effects on truncated or version-mismatched input.
    pub fn deserialize_new(data: &[u8]) -> Result<Self, SerializeError> {
        let mut r = ByteReader::new(data);

        let mut magic = [0u8; 4];
        for byte in &mut magic {
            *byte = r.read_u8()?;
        }
        if &magic != SNAPSHOT_MAGIC {
            return Err(SerializeError::BadMagic);
        }

        let version = r.read_u32()?;
        if version != SNAPSHOT_VERSION {
            return Err(SerializeError::BadVersion(version));
        }

        let game_mode = GameMode::try_from(r.read_u8()?)
            .map_err(|()| SerializeError::Malformed(r.offset(), "unknown game mode"))?;
        let tick_rate = r.read_f32()?;
        let tick_count = r.read_u64()?;
        let mutator_config = read_mutator_config(&mut r)?;
        let config = read_arena_config(&mut r)?;

        let ball_state = read_ball_state(&mut r)?;

        let num_pads = r.read_u32()? as usize;
        let mut pad_states = Vec::with_capacity(num_pads.min(1024));
        for _ in 0..num_pads {
            let _pos = r.read_vec()?;
            let _is_big = r.read_bool()?;
            pad_states.push(BoostPadState {
                is_active: r.read_bool()?,
                cooldown: r.read_f32()?,
            });
        }

        struct CarRecord {
            team: Team,
            config: crate::sim::CarConfig,
            state: crate::sim::CarState,
            controls: crate::sim::CarControls,
        }

        let num_cars = r.read_u32()? as usize;
        let mut car_records = Vec::with_capacity(num_cars.min(64));
        for _ in 0..num_cars {
            let team = Team::try_from(r.read_u8()?)
                .map_err(|()| SerializeError::Malformed(r.offset(), "unknown team"))?;
            let config = read_car_config(&mut r)?;
            let state = read_car_state(&mut r)?;
            let controls = read_car_controls(&mut r)?;
            car_records.push(CarRecord {
                team,
                config,
                state,
                controls,
            });
        }

        let num_tiles = r.read_u32()? as usize;
        let mut tiles = Vec::with_capacity(num_tiles.min(256));
        for _ in 0..num_tiles {
            let pos = r.read_vec()?;
            let state = TileState::try_from(r.read_u8()?)
                .map_err(|()| SerializeError::Malformed(r.offset(), "unknown tile state"))?;
            tiles.push(DropshotTile { pos, state });
        }

        // All input parsed; construction can no longer fail halfway
        let mut arena = Self::new_with_config(game_mode, config, tick_rate)
            .map_err(|_| SerializeError::Malformed(0, "snapshot header rejected"))?;
        arena.set_mutator_config(mutator_config);
        arena.inner.tick_count = tick_count;

        arena.set_ball_state(ball_state);
        arena.inner.ball.state = ball_state;

        for (idx, state) in pad_states.into_iter().enumerate() {
            if idx < arena.boost_pads().len() {
                arena.set_boost_pad_state(idx, state);
            }
        }

        for record in car_records {
            let id = arena.add_car(record.team, record.config);
            arena
                .set_car_state(id, &record.state)
                .expect("car was just added");
            arena
                .set_car_controls(id, record.controls)
                .expect("car was just added");
        }

        if !tiles.is_empty() {
            if let Some(own) = &mut arena.inner.dropshot_tiles {
                own.set_all(&tiles);
            }
        }

        Ok(arena)
    }
}
