use super::{
    manifold::{ContactAddedCallback, ManifoldPoint},
    rigid_body::RigidBody,
    shapes::{Aabb, Shape},
};
use glam::{Mat3A, Vec3A};

const SOLVER_ITERATIONS: usize = 10;
const PENETRATION_SLOP: f32 = 1.0;
const BAUMGARTE_BETA: f32 = 0.2;
const RESTITUTION_VEL_THRESHOLD: f32 = 30.0;
const MAX_POINTS_PER_PAIR: usize = 4;

#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// Fraction along the ray, in [0, 1]
    pub frac: f32,
    pub pos: Vec3A,
    pub normal: Vec3A,
    pub body_idx: usize,
}

struct Contact {
    body_a: usize,
    body_b: usize,
    r_a: Vec3A,
    r_b: Vec3A,
    normal: Vec3A,
    friction: f32,
    normal_mass: f32,
    tangent1: Vec3A,
    tangent2: Vec3A,
    tangent1_mass: f32,
    tangent2_mass: f32,
    /// Target normal velocity: restitution bounce plus penetration bias
    target_vel: f32,
    applied_normal: f32,
    applied_tangent1: f32,
    applied_tangent2: f32,
}

/// A discrete dynamics world: bodies, gravity, one solver pass per step
pub struct PhysWorld {
    bodies: Vec<RigidBody>,
    gravity: Vec3A,
}

impl PhysWorld {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            bodies: Vec::new(),
            gravity: Vec3A::ZERO,
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec3A) {
        self.gravity = gravity;
    }

    #[must_use]
    pub const fn gravity(&self) -> Vec3A {
        self.gravity
    }

    pub fn add_rigid_body(&mut self, body: RigidBody, group: u8, mask: u8) -> usize {
        let mut body = body;
        body.group = group;
        body.mask = mask;
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Removes a body; all indices above `idx` shift down by one
    pub fn remove_body(&mut self, idx: usize) {
        self.bodies.remove(idx);
    }

    #[must_use]
    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    #[must_use]
    pub fn bodies_mut(&mut self) -> &mut [RigidBody] {
        &mut self.bodies
    }

    pub fn step(&mut self, dt: f32, hook: &mut dyn ContactAddedCallback) {
        // Integrate forces
        for body in &mut self.bodies {
            if body.is_static() || body.disable_simulation {
                continue;
            }

            body.lin_vel += (self.gravity + body.force_accum * body.inv_mass) * dt;
            body.ang_vel += body.inv_inertia_world() * body.torque_accum * dt;
            body.force_accum = Vec3A::ZERO;
            body.torque_accum = Vec3A::ZERO;

            if body.linear_damping != 0.0 {
                body.lin_vel *= (1.0 - body.linear_damping).powf(dt);
            }
        }

        let mut contacts = self.generate_contacts(hook, dt);
        self.solve_contacts(&mut contacts);

        // Integrate transforms
        for body in &mut self.bodies {
            if body.is_static() || body.disable_simulation {
                continue;
            }

            body.pos += body.lin_vel * dt;

            if !body.no_rot {
                let ang = body.ang_vel.length();
                if ang > 1e-7 {
                    let axis = body.ang_vel / ang;
                    let delta = Mat3A::from_axis_angle(axis.into(), ang * dt);
                    body.rot = delta * body.rot;
                }
            }
        }
    }

    fn pair_passes_filter(a: &RigidBody, b: &RigidBody) -> bool {
        (a.group & b.mask) != 0 && (b.group & a.mask) != 0
    }

    fn generate_contacts(&self, hook: &mut dyn ContactAddedCallback, dt: f32) -> Vec<Contact> {
        let mut points: Vec<(usize, usize, ManifoldPoint)> = Vec::new();

        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                let a = &self.bodies[i];
                let b = &self.bodies[j];

                if a.is_static() && b.is_static() {
                    continue;
                }
                if a.no_contact_response || b.no_contact_response {
                    continue;
                }
                if !Self::pair_passes_filter(a, b) {
                    continue;
                }
                if !a.world_aabb().expanded(2.0).overlaps(&b.world_aabb()) {
                    continue;
                }

                let start = points.len();
                Self::collide_pair(a, b, i, j, &mut points);

                for (idx_a, idx_b, point) in &mut points[start..] {
                    let (body_a, body_b) = (&self.bodies[*idx_a], &self.bodies[*idx_b]);
                    point.combined_friction = body_a.friction * body_b.friction;
                    point.combined_restitution = body_a.restitution * body_b.restitution;
                    point.local_point_a = point.world_point - body_a.pos;
                    point.local_point_b = point.world_point - body_b.pos;

                    if body_a.custom_material_callback || body_b.custom_material_callback {
                        hook.contact_added(point, body_a, *idx_a, body_b, *idx_b);
                    }
                }
            }
        }

        points
            .into_iter()
            .filter(|(_, _, p)| !p.ignored)
            .map(|(idx_a, idx_b, p)| self.build_contact(idx_a, idx_b, &p, dt))
            .collect()
    }

    /// Dispatch narrowphase for one pair. Produced normals point from B to A.
    fn collide_pair(
        a: &RigidBody,
        b: &RigidBody,
        idx_a: usize,
        idx_b: usize,
        out: &mut Vec<(usize, usize, ManifoldPoint)>,
    ) {
        use Shape::{CompoundBox, Cylinder, Sphere, StaticPlane, TriangleMesh};

        // Shape routines emit points with "A" being the dynamic shape they
        // were handed; emit_swapped records the pair with roles exchanged.
        macro_rules! emit {
            () => {
                |p: ManifoldPoint| out.push((idx_a, idx_b, p))
            };
        }
        macro_rules! emit_swapped {
            () => {
                |p: ManifoldPoint| out.push((idx_b, idx_a, p))
            };
        }

        match (&a.shape, &b.shape) {
            (Sphere { radius }, StaticPlane { normal, d }) => {
                sphere_plane(a.pos, *radius, *normal, *d, &mut emit!());
            }
            (StaticPlane { normal, d }, Sphere { radius }) => {
                sphere_plane(b.pos, *radius, *normal, *d, &mut emit_swapped!());
            }
            (Sphere { radius }, TriangleMesh(mesh)) => {
                sphere_mesh(a.pos, *radius, mesh, &mut emit!());
            }
            (TriangleMesh(mesh), Sphere { radius }) => {
                sphere_mesh(b.pos, *radius, mesh, &mut emit_swapped!());
            }
            (Sphere { radius }, CompoundBox { half_extents, offset }) => {
                sphere_box(a.pos, *radius, b, *half_extents, *offset, &mut emit!());
            }
            (CompoundBox { half_extents, offset }, Sphere { radius }) => {
                sphere_box(b.pos, *radius, a, *half_extents, *offset, &mut emit_swapped!());
            }
            (Cylinder { radius, half_height }, StaticPlane { normal, d }) => {
                cylinder_plane(a, *radius, *half_height, *normal, *d, &mut emit!());
            }
            (StaticPlane { normal, d }, Cylinder { radius, half_height }) => {
                cylinder_plane(b, *radius, *half_height, *normal, *d, &mut emit_swapped!());
            }
            // Puck against everything else behaves as its bounding sphere
            (Cylinder { radius, .. }, TriangleMesh(mesh)) => {
                sphere_mesh(a.pos, *radius, mesh, &mut emit!());
            }
            (TriangleMesh(mesh), Cylinder { radius, .. }) => {
                sphere_mesh(b.pos, *radius, mesh, &mut emit_swapped!());
            }
            (Cylinder { radius, .. }, CompoundBox { half_extents, offset }) => {
                sphere_box(a.pos, *radius, b, *half_extents, *offset, &mut emit!());
            }
            (CompoundBox { half_extents, offset }, Cylinder { radius, .. }) => {
                sphere_box(b.pos, *radius, a, *half_extents, *offset, &mut emit_swapped!());
            }
            (CompoundBox { half_extents, offset }, StaticPlane { normal, d }) => {
                box_plane(a, *half_extents, *offset, *normal, *d, &mut emit!());
            }
            (StaticPlane { normal, d }, CompoundBox { half_extents, offset }) => {
                box_plane(b, *half_extents, *offset, *normal, *d, &mut emit_swapped!());
            }
            (CompoundBox { half_extents, offset }, TriangleMesh(mesh)) => {
                box_mesh(a, *half_extents, *offset, mesh, &mut emit!());
            }
            (TriangleMesh(mesh), CompoundBox { half_extents, offset }) => {
                box_mesh(b, *half_extents, *offset, mesh, &mut emit_swapped!());
            }
            (
                CompoundBox {
                    half_extents: he_a,
                    offset: off_a,
                },
                CompoundBox {
                    half_extents: he_b,
                    offset: off_b,
                },
            ) => {
                box_box(a, *he_a, *off_a, b, *he_b, *off_b, &mut emit!());
            }
            _ => {}
        }
    }

    fn build_contact(&self, idx_a: usize, idx_b: usize, point: &ManifoldPoint, dt: f32) -> Contact {
        let a = &self.bodies[idx_a];
        let b = &self.bodies[idx_b];

        let r_a = point.world_point - a.pos;
        let r_b = point.world_point - b.pos;
        let normal = point.normal_world_on_b;

        let inv_inertia_a = a.inv_inertia_world();
        let inv_inertia_b = b.inv_inertia_world();

        let angular_mass = |dir: Vec3A| {
            let ta = r_a.cross(dir);
            let tb = r_b.cross(dir);
            (inv_inertia_a * ta).cross(r_a).dot(dir) + (inv_inertia_b * tb).cross(r_b).dot(dir)
        };

        let normal_mass = 1.0 / (a.inv_mass() + b.inv_mass() + angular_mass(normal)).max(1e-9);

        // Relative velocity of A w.r.t. B along the normal, pre-solve
        let rel_vel = a.velocity_at(r_a) - b.velocity_at(r_b);
        let closing = rel_vel.dot(normal);

        let restitution_vel = if closing < -RESTITUTION_VEL_THRESHOLD {
            -point.combined_restitution * closing
        } else {
            0.0
        };
        let bias_vel = (BAUMGARTE_BETA / dt) * (point.depth - PENETRATION_SLOP).max(0.0);
        let target_vel = restitution_vel.max(bias_vel);

        let tangent1 = {
            let candidate = rel_vel - normal * closing;
            let len = candidate.length();
            if len > 1e-4 {
                candidate / len
            } else {
                normal.any_orthonormal_vector()
            }
        };
        let tangent2 = normal.cross(tangent1);

        let tangent1_mass =
            1.0 / (a.inv_mass() + b.inv_mass() + angular_mass(tangent1)).max(1e-9);
        let tangent2_mass =
            1.0 / (a.inv_mass() + b.inv_mass() + angular_mass(tangent2)).max(1e-9);

        Contact {
            body_a: idx_a,
            body_b: idx_b,
            r_a,
            r_b,
            normal,
            friction: point.combined_friction,
            normal_mass,
            tangent1,
            tangent2,
            tangent1_mass,
            tangent2_mass,
            target_vel,
            applied_normal: 0.0,
            applied_tangent1: 0.0,
            applied_tangent2: 0.0,
        }
    }

    fn solve_contacts(&mut self, contacts: &mut [Contact]) {
        for _ in 0..SOLVER_ITERATIONS {
            for contact in contacts.iter_mut() {
                let (a, b) = get_pair_mut(&mut self.bodies, contact.body_a, contact.body_b);

                let rel_vel = a.velocity_at(contact.r_a) - b.velocity_at(contact.r_b);
                let closing = rel_vel.dot(contact.normal);

                let delta = (contact.target_vel - closing) * contact.normal_mass;
                let new_applied = (contact.applied_normal + delta).max(0.0);
                let impulse = new_applied - contact.applied_normal;
                contact.applied_normal = new_applied;

                a.apply_impulse_at(contact.normal * impulse, contact.r_a);
                b.apply_impulse_at(contact.normal * -impulse, contact.r_b);

                // Friction, clamped by the accumulated normal impulse
                let max_friction = contact.friction * contact.applied_normal;

                let rel_vel = a.velocity_at(contact.r_a) - b.velocity_at(contact.r_b);
                for (tangent, mass, applied) in [
                    (
                        contact.tangent1,
                        contact.tangent1_mass,
                        &mut contact.applied_tangent1,
                    ),
                    (
                        contact.tangent2,
                        contact.tangent2_mass,
                        &mut contact.applied_tangent2,
                    ),
                ] {
                    let tangent_vel = rel_vel.dot(tangent);
                    let delta = -tangent_vel * mass;
                    let new_applied = (*applied + delta).clamp(-max_friction, max_friction);
                    let impulse = new_applied - *applied;
                    *applied = new_applied;

                    a.apply_impulse_at(tangent * impulse, contact.r_a);
                    b.apply_impulse_at(tangent * -impulse, contact.r_b);
                }
            }
        }
    }

    /// Nearest hit along `from + delta` against static geometry matching `mask`
    #[must_use]
    pub fn ray_cast(&self, from: Vec3A, delta: Vec3A, mask: u8) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;

        for (body_idx, body) in self.bodies.iter().enumerate() {
            if !body.is_static() || (body.group & mask) == 0 {
                continue;
            }

            let hit = match &body.shape {
                Shape::StaticPlane { normal, d } => {
                    let denom = normal.dot(delta);
                    if denom.abs() < 1e-9 {
                        None
                    } else {
                        let t = (*d - normal.dot(from)) / denom;
                        (0.0..=1.0).contains(&t).then(|| RayHit {
                            frac: t,
                            pos: from + delta * t,
                            normal: if denom < 0.0 { *normal } else { -*normal },
                            body_idx,
                        })
                    }
                }
                Shape::TriangleMesh(mesh) => {
                    mesh.ray_cast(from, delta).map(|(t, normal)| RayHit {
                        frac: t,
                        pos: from + delta * t,
                        normal,
                        body_idx,
                    })
                }
                _ => None,
            };

            if let Some(hit) = hit {
                if best.is_none_or(|b| hit.frac < b.frac) {
                    best = Some(hit);
                }
            }
        }

        best
    }
}

impl Default for PhysWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn get_pair_mut(bodies: &mut [RigidBody], a: usize, b: usize) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = bodies.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn world_box_axes(body: &RigidBody, offset: Vec3A) -> (Vec3A, Mat3A) {
    (body.pos + body.rot * offset, body.rot)
}

fn box_corners(center: Vec3A, rot: &Mat3A, he: Vec3A) -> [Vec3A; 8] {
    let mut corners = [Vec3A::ZERO; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let sx = if i & 1 == 0 { -he.x } else { he.x };
        let sy = if i & 2 == 0 { -he.y } else { he.y };
        let sz = if i & 4 == 0 { -he.z } else { he.z };
        *corner = center + *rot * Vec3A::new(sx, sy, sz);
    }
    corners
}

fn sphere_plane(pos: Vec3A, radius: f32, normal: Vec3A, d: f32, emit: &mut impl FnMut(ManifoldPoint)) {
    let dist = normal.dot(pos) - d;
    if dist < radius {
        emit(ManifoldPoint::new(pos - normal * dist, normal, radius - dist));
    }
}

fn sphere_mesh(
    pos: Vec3A,
    radius: f32,
    mesh: &super::shapes::TriangleMeshShape,
    emit: &mut impl FnMut(ManifoldPoint),
) {
    let query = Aabb::new(pos - radius, pos + radius);
    let mut found: Vec<ManifoldPoint> = Vec::new();

    mesh.for_each_overlapping(&query, |tri| {
        let closest = tri.closest_point(pos);
        let to_center = pos - closest;
        let dist_sq = to_center.length_squared();
        if dist_sq >= radius * radius || dist_sq < 1e-12 {
            return;
        }

        let dist = dist_sq.sqrt();
        found.push(ManifoldPoint::new(closest, to_center / dist, radius - dist));
    });

    found.sort_unstable_by(|a, b| b.depth.partial_cmp(&a.depth).unwrap());
    for point in found.into_iter().take(MAX_POINTS_PER_PAIR) {
        emit(point);
    }
}

fn sphere_box(
    pos: Vec3A,
    radius: f32,
    box_body: &RigidBody,
    he: Vec3A,
    offset: Vec3A,
    emit: &mut impl FnMut(ManifoldPoint),
) {
    let (center, rot) = world_box_axes(box_body, offset);
    let local = rot.transpose() * (pos - center);
    let clamped = local.clamp(-he, he);

    if local != clamped {
        // Sphere center outside the box
        let closest = center + rot * clamped;
        let to_center = pos - closest;
        let dist_sq = to_center.length_squared();
        if dist_sq < radius * radius && dist_sq > 1e-12 {
            let dist = dist_sq.sqrt();
            emit(ManifoldPoint::new(closest, to_center / dist, radius - dist));
        }
    } else {
        // Deep contact: push out along the face of least penetration
        let face_dist = he - local.abs();
        let (axis, pen) = if face_dist.x <= face_dist.y && face_dist.x <= face_dist.z {
            (rot.x_axis * local.x.signum(), face_dist.x)
        } else if face_dist.y <= face_dist.z {
            (rot.y_axis * local.y.signum(), face_dist.y)
        } else {
            (rot.z_axis * local.z.signum(), face_dist.z)
        };

        emit(ManifoldPoint::new(pos, axis, pen + radius));
    }
}

fn cylinder_plane(
    body: &RigidBody,
    radius: f32,
    half_height: f32,
    normal: Vec3A,
    d: f32,
    emit: &mut impl FnMut(ManifoldPoint),
) {
    let axis = body.rot.z_axis;
    let axial = axis.dot(normal);
    let radial = normal - axis * axial;

    // Support point of the cylinder opposite the plane normal
    let rim_dir = radial.normalize_or_zero();
    let support = body.pos - axis * half_height * axial.signum() - rim_dir * radius;

    let dist = normal.dot(support) - d;
    if dist < 0.0 {
        emit(ManifoldPoint::new(support - normal * dist, normal, -dist));
    }
}

fn box_plane(
    body: &RigidBody,
    he: Vec3A,
    offset: Vec3A,
    normal: Vec3A,
    d: f32,
    emit: &mut impl FnMut(ManifoldPoint),
) {
    let (center, rot) = world_box_axes(body, offset);
    let mut found: Vec<ManifoldPoint> = box_corners(center, &rot, he)
        .into_iter()
        .filter_map(|corner| {
            let dist = normal.dot(corner) - d;
            (dist < 0.0).then(|| ManifoldPoint::new(corner - normal * dist, normal, -dist))
        })
        .collect();

    found.sort_unstable_by(|a, b| b.depth.partial_cmp(&a.depth).unwrap());
    for point in found.into_iter().take(MAX_POINTS_PER_PAIR) {
        emit(point);
    }
}

fn box_mesh(
    body: &RigidBody,
    he: Vec3A,
    offset: Vec3A,
    mesh: &super::shapes::TriangleMeshShape,
    emit: &mut impl FnMut(ManifoldPoint),
) {
    let (center, rot) = world_box_axes(body, offset);
    let corners = box_corners(center, &rot, he);
    let query = body.world_aabb();
    let mut found: Vec<ManifoldPoint> = Vec::new();

    mesh.for_each_overlapping(&query, |tri| {
        let mut normal = tri.normal();
        if normal.dot(center - tri.v0) < 0.0 {
            normal = -normal;
        }

        for corner in corners {
            let dist = normal.dot(corner - tri.v0);
            if dist >= 0.0 {
                continue;
            }

            // The corner must actually project onto the triangle face
            let closest = tri.closest_point(corner);
            if (corner - closest).length_squared() > dist * dist * 1.05 + 1e-3 {
                continue;
            }

            found.push(ManifoldPoint::new(closest, normal, -dist));
        }
    });

    found.sort_unstable_by(|a, b| b.depth.partial_cmp(&a.depth).unwrap());
    for point in found.into_iter().take(MAX_POINTS_PER_PAIR) {
        emit(point);
    }
}

/// OBB-vs-OBB SAT over the 15 candidate axes, single deepest contact
#[allow(clippy::too_many_arguments)]
fn box_box(
    a: &RigidBody,
    he_a: Vec3A,
    off_a: Vec3A,
    b: &RigidBody,
    he_b: Vec3A,
    off_b: Vec3A,
    emit: &mut impl FnMut(ManifoldPoint),
) {
    let (center_a, rot_a) = world_box_axes(a, off_a);
    let (center_b, rot_b) = world_box_axes(b, off_b);

    let axes_a = [rot_a.x_axis, rot_a.y_axis, rot_a.z_axis];
    let axes_b = [rot_b.x_axis, rot_b.y_axis, rot_b.z_axis];

    let mut candidate_axes: Vec<Vec3A> = Vec::with_capacity(15);
    candidate_axes.extend(axes_a);
    candidate_axes.extend(axes_b);
    for ax_a in axes_a {
        for ax_b in axes_b {
            let cross = ax_a.cross(ax_b);
            if cross.length_squared() > 1e-6 {
                candidate_axes.push(cross.normalize());
            }
        }
    }

    let delta = center_b - center_a;
    let project = |axes: &[Vec3A; 3], he: Vec3A, dir: Vec3A| {
        axes[0].dot(dir).abs() * he.x + axes[1].dot(dir).abs() * he.y + axes[2].dot(dir).abs() * he.z
    };

    let mut min_overlap = f32::MAX;
    let mut best_axis = Vec3A::ZERO;

    for axis in candidate_axes {
        let overlap = project(&axes_a, he_a, axis) + project(&axes_b, he_b, axis) - delta.dot(axis).abs();
        if overlap <= 0.0 {
            return; // Separating axis
        }
        if overlap < min_overlap {
            min_overlap = overlap;
            // Normal on B points towards A
            best_axis = if delta.dot(axis) > 0.0 { -axis } else { axis };
        }
    }

    let support = |center: Vec3A, axes: &[Vec3A; 3], he: Vec3A, dir: Vec3A| {
        center
            + axes[0] * he.x * axes[0].dot(dir).signum()
            + axes[1] * he.y * axes[1].dot(dir).signum()
            + axes[2] * he.z * axes[2].dot(dir).signum()
    };

    let deep_a = support(center_a, &axes_a, he_a, -best_axis);
    let deep_b = support(center_b, &axes_b, he_b, best_axis);
    let world_point = (deep_a + deep_b) * 0.5;

    emit(ManifoldPoint::new(world_point, best_axis, min_overlap));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::phys::rigid_body::RigidBodyConstructionInfo;
    use crate::phys::manifold::NoopContactCallback;

    fn floor() -> RigidBody {
        RigidBody::new(RigidBodyConstructionInfo::new(
            0.0,
            Shape::StaticPlane {
                normal: Vec3A::Z,
                d: 0.0,
            },
        ))
    }

    #[test]
    fn ball_falls_and_bounces() {
        let mut world = PhysWorld::new();
        world.set_gravity(Vec3A::new(0.0, 0.0, -650.0));
        world.add_rigid_body(floor(), 1, u8::MAX);

        let mut info =
            RigidBodyConstructionInfo::new(30.0, Shape::Sphere { radius: 91.25 });
        info.start_pos = Vec3A::new(0.0, 0.0, 500.0);
        info.restitution = 0.6;
        let ball = world.add_rigid_body(RigidBody::new(info), 1, u8::MAX);

        let mut hook = NoopContactCallback;
        for _ in 0..240 {
            world.step(1.0 / 120.0, &mut hook);
        }

        // Ball must neither tunnel through the floor nor fly away
        let pos = world.bodies()[ball].pos;
        assert!(pos.z > 85.0, "ball sank to {}", pos.z);
        assert!(pos.z < 500.0, "ball never came down: {}", pos.z);
    }

    #[test]
    fn resting_box_settles_on_plane() {
        let mut world = PhysWorld::new();
        world.set_gravity(Vec3A::new(0.0, 0.0, -650.0));
        world.add_rigid_body(floor(), 1, u8::MAX);

        let mut info = RigidBodyConstructionInfo::new(
            180.0,
            Shape::CompoundBox {
                half_extents: Vec3A::new(60.0, 42.0, 18.0),
                offset: Vec3A::ZERO,
            },
        );
        info.start_pos = Vec3A::new(0.0, 0.0, 30.0);
        let body = world.add_rigid_body(RigidBody::new(info), 1, u8::MAX);

        let mut hook = NoopContactCallback;
        for _ in 0..240 {
            world.step(1.0 / 120.0, &mut hook);
        }

        let rb = &world.bodies()[body];
        assert!(rb.pos.z > 14.0 && rb.pos.z < 25.0, "box at z={}", rb.pos.z);
        assert!(rb.lin_vel.length() < 20.0);
    }

    #[test]
    fn raycast_prefers_nearest_body() {
        let mut world = PhysWorld::new();
        world.add_rigid_body(floor(), 1, u8::MAX);

        let hit = world
            .ray_cast(Vec3A::new(0.0, 0.0, 100.0), Vec3A::new(0.0, 0.0, -200.0), u8::MAX)
            .unwrap();
        assert!((hit.frac - 0.5).abs() < 1e-5);
        assert!(hit.normal.z > 0.99);
    }
}
