use super::BoostPadConfig;
use glam::Vec3A;

/// Trade memory for speed when stepping many arenas at once
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArenaMemWeightMode {
    #[default]
    Heavy,
    Light,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArenaConfig {
    pub mem_weight_mode: ArenaMemWeightMode,
    /// World bounds; entities and custom pads must stay inside
    pub min_pos: Vec3A,
    pub max_pos: Vec3A,
    /// Skip updating the ball's rotation (it is irrelevant for a sphere)
    pub no_ball_rot: bool,
    /// Use `custom_boost_pads` instead of the mode's standard layout
    pub use_custom_boost_pads: bool,
    /// Custom boost pads to use, if `use_custom_boost_pads`
    pub custom_boost_pads: Vec<BoostPadConfig>,
    /// Optional RNG seed for deterministic behavior.
    /// If None, a random seed will be used.
    pub rng_seed: Option<u64>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl ArenaConfig {
    pub const DEFAULT: Self = Self {
        mem_weight_mode: ArenaMemWeightMode::Heavy,
        min_pos: Vec3A::new(-5600.0, -6000.0, -100.0),
        max_pos: Vec3A::new(5600.0, 6000.0, 2200.0),
        no_ball_rot: true,
        use_custom_boost_pads: false,
        custom_boost_pads: Vec::new(),
        rng_seed: None,
    };
}
