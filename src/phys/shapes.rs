use glam::{Mat3A, Vec3A};
use std::sync::Arc;

#[derive(Clone, Copy, Debug)]
pub struct Aabb {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl Aabb {
    #[must_use]
    pub const fn new(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3A {
        (self.min + self.max) * 0.5
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub v0: Vec3A,
    pub v1: Vec3A,
    pub v2: Vec3A,
}

impl Triangle {
    #[must_use]
    pub fn normal(&self) -> Vec3A {
        (self.v1 - self.v0).cross(self.v2 - self.v0).normalize_or_zero()
    }

    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb {
            min: self.v0.min(self.v1).min(self.v2),
            max: self.v0.max(self.v1).max(self.v2),
        }
    }

    /// Closest point on the triangle to `p` (Ericson, Real-Time Collision Detection)
    #[must_use]
    pub fn closest_point(&self, p: Vec3A) -> Vec3A {
        let ab = self.v1 - self.v0;
        let ac = self.v2 - self.v0;
        let ap = p - self.v0;

        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        let bp = p - self.v1;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return self.v0 + ab * v;
        }

        let cp = p - self.v2;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        self.v0 + ab * v + ac * w
    }

    /// Moller-Trumbore; returns the ray parameter in [0, 1] if hit
    #[must_use]
    pub fn ray_intersect(&self, from: Vec3A, delta: Vec3A) -> Option<f32> {
        const EPS: f32 = 1e-7;

        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let h = delta.cross(edge2);
        let a = edge1.dot(h);
        if a.abs() < EPS {
            return None;
        }

        let f = 1.0 / a;
        let s = from - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = f * delta.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = f * edge2.dot(q);
        (0.0..=1.0).contains(&t).then_some(t)
    }
}

#[derive(Clone, Copy, Debug)]
enum BvhNode {
    Internal { aabb: Aabb, right_child: u32 },
    Leaf { tri_index: u32 },
}

/// A static triangle soup with a median-split BVH for overlap and ray queries
#[derive(Debug)]
pub struct TriangleMeshShape {
    tris: Vec<Triangle>,
    nodes: Vec<BvhNode>,
    aabb: Aabb,
}

impl TriangleMeshShape {
    #[must_use]
    pub fn new(tris: Vec<Triangle>) -> Self {
        assert!(!tris.is_empty(), "triangle mesh must not be empty");

        let aabb = tris
            .iter()
            .map(Triangle::aabb)
            .reduce(|a, b| a.combine(&b))
            .unwrap();

        let mut indices: Vec<u32> = (0..tris.len() as u32).collect();
        let mut nodes = Vec::with_capacity(tris.len() * 2);
        Self::build(&tris, &mut indices, &mut nodes);

        Self { tris, nodes, aabb }
    }

    fn build(tris: &[Triangle], indices: &mut [u32], nodes: &mut Vec<BvhNode>) {
        if indices.len() == 1 {
            nodes.push(BvhNode::Leaf {
                tri_index: indices[0],
            });
            return;
        }

        let aabb = indices
            .iter()
            .map(|&i| tris[i as usize].aabb())
            .reduce(|a, b| a.combine(&b))
            .unwrap();

        let extent = aabb.max - aabb.min;
        let axis = if extent.x >= extent.y && extent.x >= extent.z {
            0
        } else if extent.y >= extent.z {
            1
        } else {
            2
        };

        indices.sort_unstable_by(|&a, &b| {
            let ca = tris[a as usize].aabb().center()[axis];
            let cb = tris[b as usize].aabb().center()[axis];
            ca.partial_cmp(&cb).unwrap()
        });

        let mid = indices.len() / 2;
        let node_idx = nodes.len();
        nodes.push(BvhNode::Internal {
            aabb,
            right_child: 0,
        });

        let (left, right) = indices.split_at_mut(mid);
        Self::build(tris, left, nodes);

        let right_child = nodes.len() as u32;
        if let BvhNode::Internal {
            right_child: slot, ..
        } = &mut nodes[node_idx]
        {
            *slot = right_child;
        }

        Self::build(tris, right, nodes);
    }

    #[must_use]
    pub const fn aabb(&self) -> Aabb {
        self.aabb
    }

    #[must_use]
    pub fn num_tris(&self) -> usize {
        self.tris.len()
    }

    /// Visit every triangle whose AABB overlaps `query`
    pub fn for_each_overlapping(&self, query: &Aabb, mut visit: impl FnMut(&Triangle)) {
        let mut stack = vec![0usize];
        while let Some(node_idx) = stack.pop() {
            match self.nodes[node_idx] {
                BvhNode::Leaf { tri_index } => {
                    let tri = &self.tris[tri_index as usize];
                    if tri.aabb().overlaps(query) {
                        visit(tri);
                    }
                }
                BvhNode::Internal { aabb, right_child } => {
                    if aabb.overlaps(query) {
                        stack.push(node_idx + 1);
                        stack.push(right_child as usize);
                    }
                }
            }
        }
    }

    /// Nearest triangle hit along `from + t * delta`, t in [0, 1]
    #[must_use]
    pub fn ray_cast(&self, from: Vec3A, delta: Vec3A) -> Option<(f32, Vec3A)> {
        let ray_aabb = Aabb::new(from.min(from + delta), from.max(from + delta));

        let mut best: Option<(f32, Vec3A)> = None;
        self.for_each_overlapping(&ray_aabb, |tri| {
            if let Some(t) = tri.ray_intersect(from, delta) {
                if best.is_none_or(|(bt, _)| t < bt) {
                    let mut normal = tri.normal();
                    if normal.dot(delta) > 0.0 {
                        normal = -normal;
                    }
                    best = Some((t, normal));
                }
            }
        });

        best
    }
}

/// Collision shape of a rigid body
#[derive(Clone, Debug)]
pub enum Shape {
    Sphere {
        radius: f32,
    },
    /// Flat puck, axis along local Z
    Cylinder {
        radius: f32,
        half_height: f32,
    },
    /// A box child offset from the body origin, as used for car hitboxes.
    /// The body origin stays the center of mass.
    CompoundBox {
        half_extents: Vec3A,
        offset: Vec3A,
    },
    /// Infinite static plane `dot(normal, p) == d`
    StaticPlane {
        normal: Vec3A,
        d: f32,
    },
    TriangleMesh(Arc<TriangleMeshShape>),
}

impl Shape {
    /// Inverse of the diagonal local inertia tensor for the given mass
    #[must_use]
    pub fn local_inv_inertia(&self, mass: f32) -> Vec3A {
        if mass == 0.0 {
            return Vec3A::ZERO;
        }

        let inertia = match self {
            Self::Sphere { radius } => Vec3A::splat(0.4 * mass * radius * radius),
            Self::Cylinder {
                radius,
                half_height,
            } => {
                let h2 = half_height * half_height * 4.0;
                let r2 = radius * radius;
                let side = mass * (3.0 * r2 + h2) / 12.0;
                Vec3A::new(side, side, 0.5 * mass * r2)
            }
            Self::CompoundBox { half_extents, .. } => {
                let d = *half_extents * 2.0;
                Vec3A::new(
                    mass * (d.y * d.y + d.z * d.z) / 12.0,
                    mass * (d.x * d.x + d.z * d.z) / 12.0,
                    mass * (d.x * d.x + d.y * d.y) / 12.0,
                )
            }
            Self::StaticPlane { .. } | Self::TriangleMesh(_) => return Vec3A::ZERO,
        };

        1.0 / inertia
    }

    #[must_use]
    pub fn world_aabb(&self, pos: Vec3A, rot: &Mat3A) -> Aabb {
        match self {
            Self::Sphere { radius } => Aabb::new(pos - *radius, pos + *radius),
            Self::Cylinder { radius, .. } => Aabb::new(pos - *radius, pos + *radius),
            Self::CompoundBox {
                half_extents,
                offset,
            } => {
                let center = pos + *rot * *offset;
                // Extent of a rotated box along each world axis
                let ext = Vec3A::new(
                    rot.x_axis.x.abs() * half_extents.x
                        + rot.y_axis.x.abs() * half_extents.y
                        + rot.z_axis.x.abs() * half_extents.z,
                    rot.x_axis.y.abs() * half_extents.x
                        + rot.y_axis.y.abs() * half_extents.y
                        + rot.z_axis.y.abs() * half_extents.z,
                    rot.x_axis.z.abs() * half_extents.x
                        + rot.y_axis.z.abs() * half_extents.y
                        + rot.z_axis.z.abs() * half_extents.z,
                );
                Aabb::new(center - ext, center + ext)
            }
            Self::StaticPlane { .. } => Aabb::new(Vec3A::splat(-1e9), Vec3A::splat(1e9)),
            Self::TriangleMesh(mesh) => mesh.aabb(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn quad(a: Vec3A, b: Vec3A, c: Vec3A, d: Vec3A) -> [Triangle; 2] {
        [
            Triangle {
                v0: a,
                v1: b,
                v2: c,
            },
            Triangle {
                v0: a,
                v1: c,
                v2: d,
            },
        ]
    }

    #[test]
    fn bvh_ray_hits_nearest() {
        let mut tris = Vec::new();
        tris.extend(quad(
            Vec3A::new(-100.0, -100.0, 0.0),
            Vec3A::new(100.0, -100.0, 0.0),
            Vec3A::new(100.0, 100.0, 0.0),
            Vec3A::new(-100.0, 100.0, 0.0),
        ));
        tris.extend(quad(
            Vec3A::new(-100.0, -100.0, 50.0),
            Vec3A::new(100.0, -100.0, 50.0),
            Vec3A::new(100.0, 100.0, 50.0),
            Vec3A::new(-100.0, 100.0, 50.0),
        ));

        let mesh = TriangleMeshShape::new(tris);
        let (t, normal) = mesh
            .ray_cast(Vec3A::new(0.0, 0.0, 100.0), Vec3A::new(0.0, 0.0, -100.0))
            .unwrap();

        assert!((t - 0.5).abs() < 1e-5);
        assert!(normal.z > 0.99);
    }

    #[test]
    fn triangle_closest_point_inside_face() {
        let tri = Triangle {
            v0: Vec3A::new(0.0, 0.0, 0.0),
            v1: Vec3A::new(10.0, 0.0, 0.0),
            v2: Vec3A::new(0.0, 10.0, 0.0),
        };
        let p = tri.closest_point(Vec3A::new(2.0, 2.0, 5.0));
        assert!((p - Vec3A::new(2.0, 2.0, 0.0)).length() < 1e-5);
    }
}
