use crate::{
    consts::boost_pads,
    sim::{CarState, MutatorConfig},
};
use ahash::AHashMap;
use glam::Vec3A;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoostPadConfig {
    pub pos: Vec3A,
    pub is_big: bool,
}

impl BoostPadConfig {
    #[must_use]
    pub(crate) fn max_cooldown(&self, mutator_config: &MutatorConfig) -> f32 {
        if self.is_big {
            mutator_config.boost_pad_cooldown_big
        } else {
            mutator_config.boost_pad_cooldown_small
        }
    }

    #[must_use]
    pub(crate) fn boost_amount(&self, mutator_config: &MutatorConfig) -> f32 {
        if self.is_big {
            mutator_config.boost_pad_amount_big
        } else {
            mutator_config.boost_pad_amount_small
        }
    }

    #[must_use]
    pub(crate) fn sensor_radius(&self) -> f32 {
        if self.is_big {
            boost_pads::CYL_RAD_BIG
        } else {
            boost_pads::CYL_RAD_SMALL
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoostPadState {
    pub is_active: bool,
    /// Seconds until the pad reactivates; 0 while active
    pub cooldown: f32,
}

impl Default for BoostPadState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BoostPadState {
    pub const DEFAULT: Self = Self {
        is_active: true,
        cooldown: 0.0,
    };
}

#[derive(Clone, Copy, Debug)]
pub struct BoostPad {
    config: BoostPadConfig,
    pub(crate) state: BoostPadState,
}

impl BoostPad {
    #[must_use]
    pub(crate) const fn new(config: BoostPadConfig) -> Self {
        Self {
            config,
            state: BoostPadState::DEFAULT,
        }
    }

    #[must_use]
    pub const fn get_config(&self) -> &BoostPadConfig {
        &self.config
    }

    #[must_use]
    pub const fn get_state(&self) -> &BoostPadState {
        &self.state
    }

    pub const fn set_state(&mut self, state: BoostPadState) {
        self.state = state;
    }

    pub(crate) fn reset(&mut self) {
        self.state = BoostPadState::DEFAULT;
    }

    fn advance_cooldown(&mut self, dt: f32) {
        if !self.state.is_active {
            self.state.cooldown = (self.state.cooldown - dt).max(0.0);
            if self.state.cooldown == 0.0 {
                self.state.is_active = true;
            }
        }
    }

    fn overlaps_car(&self, car_pos: Vec3A) -> bool {
        let radius = self.config.sensor_radius();
        let delta = car_pos - self.config.pos;
        delta.truncate().length_squared() < radius * radius
            && delta.z.abs() <= boost_pads::CYL_HEIGHT
    }
}

/// Uniform XY cell index over the pads for O(1) average pickup queries.
///
/// The externally visible pad order is sorted by (y, then x) and is stable
/// across resets.
#[derive(Clone, Debug)]
pub(crate) struct BoostPadGrid {
    pads: Vec<BoostPad>,
    cells: AHashMap<(i32, i32), Vec<u16>>,
    max_pad_z: f32,
}

const CELL_SIZE: f32 = 1024.0;

impl BoostPadGrid {
    #[must_use]
    pub fn new(pad_configs: &[BoostPadConfig]) -> Self {
        let mut configs = pad_configs.to_vec();
        configs.sort_by(|a, b| {
            (a.pos.y, a.pos.x)
                .partial_cmp(&(b.pos.y, b.pos.x))
                .expect("non-finite pad position")
        });

        let pads: Vec<BoostPad> = configs.into_iter().map(BoostPad::new).collect();

        let mut cells: AHashMap<(i32, i32), Vec<u16>> = AHashMap::new();
        let mut max_pad_z: f32 = 0.0;
        for (i, pad) in pads.iter().enumerate() {
            let pos = pad.config.pos;
            max_pad_z = max_pad_z.max(pos.z + boost_pads::CYL_HEIGHT);
            cells
                .entry(Self::cell_of(pos))
                .or_default()
                .push(i as u16);
        }

        Self {
            pads,
            cells,
            max_pad_z,
        }
    }

    fn cell_of(pos: Vec3A) -> (i32, i32) {
        (
            (pos.x / CELL_SIZE).floor() as i32,
            (pos.y / CELL_SIZE).floor() as i32,
        )
    }

    #[must_use]
    pub fn pads(&self) -> &[BoostPad] {
        &self.pads
    }

    #[must_use]
    pub fn pads_mut(&mut self) -> &mut [BoostPad] {
        &mut self.pads
    }

    pub fn reset(&mut self) {
        for pad in &mut self.pads {
            pad.reset();
        }
    }

    pub fn advance_cooldowns(&mut self, dt: f32) {
        for pad in &mut self.pads {
            pad.advance_cooldown(dt);
        }
    }

    /// Attempt a pickup for one car; returns the pad index on success.
    ///
    /// A car triggers a pickup when it overlaps an active pad's sensor
    /// cylinder and is not demoed.
    pub fn maybe_give_car_boost(
        &mut self,
        car_state: &mut CarState,
        mutator_config: &MutatorConfig,
    ) -> Option<usize> {
        if car_state.is_demoed || car_state.phys.pos.z > self.max_pad_z {
            return None;
        }

        let car_pos = car_state.phys.pos;
        let (cx, cy) = Self::cell_of(car_pos);

        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) else {
                    continue;
                };

                for &pad_idx in indices {
                    let pad = &mut self.pads[pad_idx as usize];
                    if !pad.state.is_active || !pad.overlaps_car(car_pos) {
                        continue;
                    }

                    car_state.boost = (car_state.boost + pad.config.boost_amount(mutator_config))
                        .min(mutator_config.car_max_boost_amount);
                    pad.state.is_active = false;
                    pad.state.cooldown = pad.config.max_cooldown(mutator_config);
                    return Some(pad_idx as usize);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::GameMode;

    fn grid_of(configs: &[BoostPadConfig]) -> BoostPadGrid {
        BoostPadGrid::new(configs)
    }

    #[test]
    fn pads_sort_by_y_then_x() {
        let grid = grid_of(&[
            BoostPadConfig {
                pos: Vec3A::new(100.0, 50.0, 70.0),
                is_big: false,
            },
            BoostPadConfig {
                pos: Vec3A::new(-100.0, 50.0, 70.0),
                is_big: false,
            },
            BoostPadConfig {
                pos: Vec3A::new(0.0, -50.0, 70.0),
                is_big: true,
            },
        ]);

        let positions: Vec<(f32, f32)> = grid
            .pads()
            .iter()
            .map(|p| (p.get_config().pos.y, p.get_config().pos.x))
            .collect();
        assert_eq!(positions, vec![(-50.0, 0.0), (50.0, -100.0), (50.0, 100.0)]);
    }

    #[test]
    fn pickup_deactivates_and_cools_down() {
        let mut grid = grid_of(&[BoostPadConfig {
            pos: Vec3A::new(0.0, 0.0, 70.0),
            is_big: true,
        }]);

        let mutator = MutatorConfig::new(GameMode::Soccar);
        let mut car = CarState {
            boost: 10.0,
            ..Default::default()
        };
        car.phys.pos = Vec3A::new(20.0, 0.0, 40.0);

        let picked = grid.maybe_give_car_boost(&mut car, &mutator);
        assert_eq!(picked, Some(0));
        assert_eq!(car.boost, 100.0);
        assert!(!grid.pads()[0].get_state().is_active);

        // Inactive pad must not give boost again
        car.boost = 0.0;
        assert_eq!(grid.maybe_give_car_boost(&mut car, &mutator), None);

        // Cooldown expires back to active
        for _ in 0..1205 {
            grid.advance_cooldowns(1.0 / 120.0);
        }
        assert!(grid.pads()[0].get_state().is_active);
        assert_eq!(grid.maybe_give_car_boost(&mut car, &mutator), Some(0));
    }

    #[test]
    fn demoed_car_cannot_pick_up() {
        let mut grid = grid_of(&[BoostPadConfig {
            pos: Vec3A::new(0.0, 0.0, 70.0),
            is_big: false,
        }]);

        let mutator = MutatorConfig::new(GameMode::Soccar);
        let mut car = CarState {
            is_demoed: true,
            boost: 0.0,
            ..Default::default()
        };
        car.phys.pos = Vec3A::new(0.0, 0.0, 40.0);

        assert_eq!(grid.maybe_give_car_boost(&mut car, &mutator), None);
        assert_eq!(car.boost, 0.0);
    }
}
