#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarControls {
    pub throttle: f32,
    pub steer: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub jump: bool,
    pub boost: bool,
    pub handbrake: bool,
}

impl Default for CarControls {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CarControls {
    pub const DEFAULT: Self = Self {
        throttle: 0.0,
        steer: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        roll: 0.0,
        jump: false,
        boost: false,
        handbrake: false,
    };

    /// Clamp analog inputs into [-1, 1] and zero out non-finite values
    #[must_use]
    pub fn clamp_fix(mut self) -> Self {
        for val in [
            &mut self.throttle,
            &mut self.steer,
            &mut self.pitch,
            &mut self.yaw,
            &mut self.roll,
        ] {
            *val = if val.is_finite() {
                val.clamp(-1.0, 1.0)
            } else {
                0.0
            };
        }
        self
    }
}
