use super::rigid_body::RigidBody;
use glam::Vec3A;

/// One contact point between a body pair, produced during narrowphase
#[derive(Clone, Copy, Debug)]
pub struct ManifoldPoint {
    /// Contact point relative to body A's center of mass, in world axes
    pub local_point_a: Vec3A,
    /// Contact point relative to body B's center of mass, in world axes
    pub local_point_b: Vec3A,
    pub world_point: Vec3A,
    /// Unit normal on body B, pointing towards body A
    pub normal_world_on_b: Vec3A,
    /// Penetration depth, positive when overlapping
    pub depth: f32,
    pub combined_friction: f32,
    pub combined_restitution: f32,
    /// Set by the contact hook to drop this point before solving
    pub ignored: bool,
}

impl ManifoldPoint {
    #[must_use]
    pub fn new(world_point: Vec3A, normal_world_on_b: Vec3A, depth: f32) -> Self {
        Self {
            local_point_a: Vec3A::ZERO,
            local_point_b: Vec3A::ZERO,
            world_point,
            normal_world_on_b,
            depth,
            combined_friction: 0.0,
            combined_restitution: 0.0,
            ignored: false,
        }
    }
}

/// Observer hook called once per manifold point before impulses are solved.
///
/// Implementations must treat the bodies as read-only; the only permitted
/// mutation is adjusting the point's combined material (or ignoring it) and
/// recording the contact for processing after the step returns.
pub trait ContactAddedCallback {
    fn contact_added<'a>(
        &mut self,
        point: &mut ManifoldPoint,
        body_a: &'a RigidBody,
        body_a_idx: usize,
        body_b: &'a RigidBody,
        body_b_idx: usize,
    );
}

/// No-op hook for worlds stepped without game logic attached
pub struct NoopContactCallback;

impl ContactAddedCallback for NoopContactCallback {
    fn contact_added<'a>(
        &mut self,
        _point: &mut ManifoldPoint,
        _body_a: &'a RigidBody,
        _body_a_idx: usize,
        _body_b: &'a RigidBody,
        _body_b_idx: usize,
    ) {
    }
}
