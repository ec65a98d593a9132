use crate::sim::UserInfoTypes;
use glam::Vec3A;

/// One contact recorded during the solver step for deferred processing.
///
/// Pairs are normalized so that `user_index_a <= user_index_b`
/// (car before ball before world).
#[derive(Clone, Copy, Debug)]
pub(crate) struct ContactRecord {
    pub user_index_a: UserInfoTypes,
    pub user_index_b: UserInfoTypes,
    /// Entity ids (car id for cars, 0 otherwise)
    pub user_pointer_a: u32,
    pub user_pointer_b: u32,
    /// Contact point relative to each body's center of mass, world axes
    pub local_point_a: Vec3A,
    pub local_point_b: Vec3A,
    pub world_point: Vec3A,
    /// Unit normal on body B, pointing towards body A
    pub normal_world_on_b: Vec3A,
    pub combined_friction: f32,
    pub combined_restitution: f32,
}

/// Collects contacts while the solver steps; drained and dispatched after.
///
/// The solver's contact hook must stay a pure observer, so all game-state
/// mutation happens when these records are processed.
#[derive(Default)]
pub(crate) struct ContactTracker {
    records: Vec<ContactRecord>,
}

impl ContactTracker {
    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn reserve(&mut self, n: usize) {
        self.records.reserve(n);
    }

    pub fn push(&mut self, record: ContactRecord) {
        self.records.push(record);
    }

    /// Records in insertion order, which is the solver's manifold order
    pub fn take_records(&mut self) -> Vec<ContactRecord> {
        std::mem::take(&mut self.records)
    }
}
