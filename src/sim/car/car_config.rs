use glam::Vec3A;

const HITBOX_SIZES: [Vec3A; 6] = [
    Vec3A::new(120.507, 86.6994, 38.6591), // OCTANE
    Vec3A::new(130.427, 85.7799, 33.8),    // DOMINUS
    Vec3A::new(131.32, 87.1704, 31.8944),  // PLANK
    Vec3A::new(133.992, 83.021, 32.8),     // BREAKOUT
    Vec3A::new(129.519, 84.6879, 36.6591), // HYBRID
    Vec3A::new(123.22, 79.2103, 44.1591),  // MERC
];

const HITBOX_OFFSETS: [Vec3A; 6] = [
    Vec3A::new(13.8757, 0.0, 20.755),
    Vec3A::new(9.0, 0.0, 15.75),
    Vec3A::new(9.00857, 0.0, 12.0942),
    Vec3A::new(12.5, 0.0, 11.75),
    Vec3A::new(13.8757, 0.0, 20.755),
    Vec3A::new(11.3757, 0.0, 21.505),
];

const FRONT_WHEEL_RADS: [f32; 6] = [12.5, 12.0, 12.5, 13.5, 12.5, 15.0];
const BACK_WHEEL_RADS: [f32; 6] = [15.0, 13.5, 17.0, 15.0, 15.0, 15.0];

const FRONT_WHEEL_SUS_REST: [f32; 6] = [38.755, 33.95, 31.9242, 29.7, 38.755, 39.505];
const BACK_WHEEL_SUS_REST: [f32; 6] = [37.055, 33.85, 27.9242, 29.666, 37.055, 39.105];

const FRONT_WHEELS_OFFSET: [Vec3A; 6] = [
    Vec3A::new(51.25, 25.90, 20.755),
    Vec3A::new(50.30, 31.10, 15.75),
    Vec3A::new(49.97, 27.80, 12.0942),
    Vec3A::new(51.50, 26.67, 11.75),
    Vec3A::new(51.25, 25.90, 20.755),
    Vec3A::new(51.25, 25.90, 21.505),
];

const BACK_WHEELS_OFFSET: [Vec3A; 6] = [
    Vec3A::new(-33.75, 29.50, 20.755),
    Vec3A::new(-34.75, 33.00, 15.75),
    Vec3A::new(-35.43, 20.28, 12.0942),
    Vec3A::new(-35.75, 35.00, 11.75),
    Vec3A::new(-34.00, 29.50, 20.755),
    Vec3A::new(-33.75, 29.50, 21.505),
];

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelPairConfig {
    /// Radius of both wheels
    pub wheel_radius: f32,
    /// How far out the suspension rests
    pub suspension_rest_length: f32,
    /// Where the wheel connects (suspension start position).
    ///
    /// NOTE: Y should always be positive; it is negated for the left wheel.
    pub connection_point_offset: Vec3A,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarConfig {
    /// Full size of the hitbox (NOT the half-extent)
    pub hitbox_size: Vec3A,
    /// Offset of the hitbox from the body origin.
    ///
    /// NOTE: Does not affect the center of mass, which stays at local (0,0,0).
    pub hitbox_pos_offset: Vec3A,
    pub front_wheels: WheelPairConfig,
    pub back_wheels: WheelPairConfig,
    /// `max(|pitch|, |yaw|)` must exceed this for a dodge input to flip
    pub dodge_deadzone: f32,
}

impl Default for CarConfig {
    fn default() -> Self {
        Self::OCTANE
    }
}

impl CarConfig {
    pub const OCTANE: Self = Self::make_preset(0);
    pub const DOMINUS: Self = Self::make_preset(1);
    pub const PLANK: Self = Self::make_preset(2);
    pub const BREAKOUT: Self = Self::make_preset(3);
    pub const HYBRID: Self = Self::make_preset(4);
    pub const MERC: Self = Self::make_preset(5);

    const fn make_preset(index: usize) -> Self {
        Self {
            hitbox_size: HITBOX_SIZES[index],
            hitbox_pos_offset: HITBOX_OFFSETS[index],
            front_wheels: WheelPairConfig {
                wheel_radius: FRONT_WHEEL_RADS[index],
                suspension_rest_length: FRONT_WHEEL_SUS_REST[index],
                connection_point_offset: FRONT_WHEELS_OFFSET[index],
            },
            back_wheels: WheelPairConfig {
                wheel_radius: BACK_WHEEL_RADS[index],
                suspension_rest_length: BACK_WHEEL_SUS_REST[index],
                connection_point_offset: BACK_WHEELS_OFFSET[index],
            },
            dodge_deadzone: 0.5,
        }
    }
}
