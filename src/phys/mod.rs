//! A compact deterministic rigid-body solver.
//!
//! Provides exactly what the game layer needs: discrete stepping, compound
//! hitboxes, contact manifolds with per-contact material override through a
//! contact-added hook, and raycasts against static geometry. Single
//! threaded; one world per arena.

pub mod manifold;
pub mod rigid_body;
pub mod shapes;
pub mod world;

pub use manifold::{ContactAddedCallback, ManifoldPoint};
pub use rigid_body::RigidBody;
pub use shapes::{Aabb, Shape, Triangle, TriangleMeshShape};
pub use world::{PhysWorld, RayHit};
