use super::shapes::{Aabb, Shape};
use glam::{Mat3A, Vec3A};

/// Logical entity tag routed back through contact callbacks.
/// The solver does not interpret these beyond ordering.
pub type UserIndex = i32;

pub struct RigidBodyConstructionInfo {
    pub mass: f32,
    pub shape: Shape,
    pub start_pos: Vec3A,
    pub start_rot: Mat3A,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
}

impl RigidBodyConstructionInfo {
    #[must_use]
    pub fn new(mass: f32, shape: Shape) -> Self {
        Self {
            mass,
            shape,
            start_pos: Vec3A::ZERO,
            start_rot: Mat3A::IDENTITY,
            friction: 0.5,
            restitution: 0.0,
            linear_damping: 0.0,
        }
    }
}

pub struct RigidBody {
    pub pos: Vec3A,
    pub rot: Mat3A,
    pub lin_vel: Vec3A,
    pub ang_vel: Vec3A,

    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,

    pub shape: Shape,

    /// Entity-kind tag, see `sim::UserInfoTypes`
    pub user_index: UserIndex,
    /// Opaque id resolving back to the owning entity (car id)
    pub user_pointer: u32,

    /// Demoed cars keep their body but stop colliding
    pub no_contact_response: bool,
    /// Route this body's contacts through the contact-added hook
    pub custom_material_callback: bool,
    /// Skip orientation integration (ball rotation lock)
    pub no_rot: bool,
    /// Freeze the body entirely (demoed cars awaiting respawn)
    pub disable_simulation: bool,

    pub group: u8,
    pub mask: u8,

    pub(crate) inv_mass: f32,
    pub(crate) local_inv_inertia: Vec3A,
    pub(crate) force_accum: Vec3A,
    pub(crate) torque_accum: Vec3A,
}

impl RigidBody {
    #[must_use]
    pub fn new(info: RigidBodyConstructionInfo) -> Self {
        let inv_mass = if info.mass > 0.0 { 1.0 / info.mass } else { 0.0 };
        let local_inv_inertia = info.shape.local_inv_inertia(info.mass);

        Self {
            pos: info.start_pos,
            rot: info.start_rot,
            lin_vel: Vec3A::ZERO,
            ang_vel: Vec3A::ZERO,
            friction: info.friction,
            restitution: info.restitution,
            linear_damping: info.linear_damping,
            shape: info.shape,
            user_index: 0,
            user_pointer: 0,
            no_contact_response: false,
            custom_material_callback: false,
            no_rot: false,
            disable_simulation: false,
            group: 1,
            mask: u8::MAX,
            inv_mass,
            local_inv_inertia,
            force_accum: Vec3A::ZERO,
            torque_accum: Vec3A::ZERO,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    #[inline]
    #[must_use]
    pub const fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// World-space inverse inertia tensor: `R * diag(I^-1) * R^T`
    #[must_use]
    pub fn inv_inertia_world(&self) -> Mat3A {
        let r = self.rot;
        let scaled = Mat3A::from_cols(
            r.x_axis * self.local_inv_inertia.x,
            r.y_axis * self.local_inv_inertia.y,
            r.z_axis * self.local_inv_inertia.z,
        );
        scaled * r.transpose()
    }

    #[must_use]
    pub fn world_aabb(&self) -> Aabb {
        self.shape.world_aabb(self.pos, &self.rot)
    }

    /// Speed along the body's local X axis
    #[must_use]
    pub fn forward_speed(&self) -> f32 {
        self.lin_vel.dot(self.rot.x_axis)
    }

    pub fn apply_central_force(&mut self, force: Vec3A) {
        self.force_accum += force;
    }

    pub fn apply_torque(&mut self, torque: Vec3A) {
        self.torque_accum += torque;
    }

    pub fn apply_force_at(&mut self, force: Vec3A, rel_pos: Vec3A) {
        self.force_accum += force;
        self.torque_accum += rel_pos.cross(force);
    }

    pub fn apply_central_impulse(&mut self, impulse: Vec3A) {
        self.lin_vel += impulse * self.inv_mass;
    }

    pub fn apply_impulse_at(&mut self, impulse: Vec3A, rel_pos: Vec3A) {
        self.lin_vel += impulse * self.inv_mass;
        self.ang_vel += self.inv_inertia_world() * rel_pos.cross(impulse);
    }

    /// Velocity of the body surface point at `rel_pos` from the center of mass
    #[must_use]
    pub fn velocity_at(&self, rel_pos: Vec3A) -> Vec3A {
        self.lin_vel + self.ang_vel.cross(rel_pos)
    }
}
