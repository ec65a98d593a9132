use glam::Vec3A;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BallHitInfo {
    /// Position of the hit relative to the ball's position
    pub relative_pos_on_ball: Vec3A,
    /// World position of the ball when the hit occurred
    pub ball_pos: Vec3A,
    /// Extra velocity added on top of the base collision impulse
    pub extra_hit_vel: Vec3A,
    /// Arena tick count when the hit occurred
    pub tick_count_when_hit: u64,
    /// Arena tick count when the last extra car-ball impulse was applied
    ///
    /// Needed because the extra impulse cannot apply on two consecutive ticks
    pub tick_count_when_extra_impulse_applied: u64,
}
