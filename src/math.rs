use glam::{EulerRot, Mat3A, Vec3A};
use std::cell::RefCell;
use std::f32::consts::PI;

/// Yaw/pitch/roll in radians, convertible to/from a rotation matrix.
///
/// Follows the source game's ZYX intrinsic rotation order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Angle {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

impl Angle {
    #[must_use]
    pub const fn new(yaw: f32, pitch: f32, roll: f32) -> Self {
        Self { yaw, pitch, roll }
    }

    #[must_use]
    pub fn to_rot_mat(self) -> Mat3A {
        Mat3A::from_euler(EulerRot::ZYX, self.yaw, self.pitch, self.roll)
    }

    #[must_use]
    pub fn from_rot_mat(mat: Mat3A) -> Self {
        let (yaw, pitch, roll) = mat.to_euler(EulerRot::ZYX);
        Self { yaw, pitch, roll }
    }

    /// Wrap all three components into (-pi, pi]
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            yaw: wrap_normalize_float(self.yaw, PI),
            pitch: wrap_normalize_float(self.pitch, PI),
            roll: wrap_normalize_float(self.roll, PI),
        }
    }
}

/// Continuous linear piecewise function over `N` ascending `(input, output)` points
#[derive(Clone, Copy, Debug)]
pub struct LinearPieceCurve<const N: usize> {
    value_mappings: [(f32, f32); N],
}

impl<const N: usize> LinearPieceCurve<N> {
    #[must_use]
    pub const fn new(value_mappings: [(f32, f32); N]) -> Self {
        Self { value_mappings }
    }

    /// Returns the output of the curve at `input`,
    /// or `default_output` when the curve has no points.
    ///
    /// Inputs outside the point range clamp to the end outputs.
    #[must_use]
    pub fn get_output_or(&self, input: f32, default_output: f32) -> f32 {
        if N == 0 {
            return default_output;
        }

        let first_pair = self.value_mappings[0];
        if input <= first_pair.0 {
            return first_pair.1;
        }

        for i in 1..N {
            let before = self.value_mappings[i - 1];
            let after = self.value_mappings[i];

            if after.0 > input {
                let dx = after.0 - before.0;
                if dx <= 0.0 {
                    // Degenerate zero-width segment
                    return before.1;
                }

                let interp_frac = (input - before.0) / dx;
                return (after.1 - before.1) * interp_frac + before.1;
            }
        }

        self.value_mappings[N - 1].1
    }

    #[must_use]
    pub fn get_output(&self, input: f32) -> f32 {
        self.get_output_or(input, 1.0)
    }
}

thread_local! {
    static THREAD_RNG: RefCell<fastrand::Rng> = RefCell::new(fastrand::Rng::new());
}

/// Random integer in `[min, max)` from the thread-local engine,
/// or from a temporary engine seeded with `seed` if given.
///
/// Unseeded calls are NOT deterministic and are meant for test utilities only.
#[must_use]
pub fn rand_int(min: i32, max: i32, seed: Option<u64>) -> i32 {
    match seed {
        Some(seed) => fastrand::Rng::with_seed(seed).i32(min..max),
        None => THREAD_RNG.with_borrow_mut(|rng| rng.i32(min..max)),
    }
}

/// Random float in `[min, max)` from the thread-local engine
#[must_use]
pub fn rand_float(min: f32, max: f32) -> f32 {
    THREAD_RNG.with_borrow_mut(|rng| rng.f32() * (max - min) + min)
}

/// Wraps `val` into (-minmax, minmax]
#[must_use]
pub fn wrap_normalize_float(val: f32, minmax: f32) -> f32 {
    let mut result = val % (minmax * 2.0);
    if result > minmax {
        result -= minmax * 2.0;
    } else if result < -minmax {
        result += minmax * 2.0;
    }
    result
}

/// Simulates the aggressive UE3 rotator rounding that happens when the source
/// game converts a rotator to a direction vector.
///
/// Yaw and pitch quantize to multiples of `(pi / 2^13) * 4`; roll must be zero.
#[must_use]
pub fn round_angle_ue3(ang: Angle) -> Angle {
    const TO_INTS: f32 = (1 << 15) as f32 / PI;
    const BACK_TO_RADIANS: f32 = (1.0 / TO_INTS) * 4.0;
    const ROUNDING_MASK: i32 = 0x4000 - 1;

    debug_assert!(ang.roll == 0.0);

    let r_yaw = (((ang.yaw * TO_INTS) as i32) >> 2) & ROUNDING_MASK;
    let r_pitch = (((ang.pitch * TO_INTS) as i32) >> 2) & ROUNDING_MASK;

    Angle {
        yaw: r_yaw as f32 * BACK_TO_RADIANS,
        pitch: r_pitch as f32 * BACK_TO_RADIANS,
        roll: ang.roll,
    }
}

/// Rounds each component of `vec` to the nearest multiple of `precision`
#[must_use]
pub fn round_vec(vec: Vec3A, precision: f32) -> Vec3A {
    (vec / precision).round() * precision
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_curve_returns_default() {
        let curve = LinearPieceCurve::new([]);
        assert_eq!(curve.get_output_or(5.0, 0.25), 0.25);
        assert_eq!(curve.get_output(5.0), 1.0);
    }

    #[test]
    fn single_point_curve_is_constant() {
        let curve = LinearPieceCurve::new([(2.0, 7.0)]);
        assert_eq!(curve.get_output(-100.0), 7.0);
        assert_eq!(curve.get_output(2.0), 7.0);
        assert_eq!(curve.get_output(100.0), 7.0);
    }

    #[test]
    fn curve_clamps_and_interpolates() {
        let curve = LinearPieceCurve::new([(0.0, 0.0), (10.0, 1.0), (20.0, 3.0)]);
        assert_eq!(curve.get_output(-5.0), 0.0);
        assert_eq!(curve.get_output(5.0), 0.5);
        assert_eq!(curve.get_output(15.0), 2.0);
        assert_eq!(curve.get_output(25.0), 3.0);
    }

    #[test]
    fn zero_width_segment_is_stepped_over() {
        let curve = LinearPieceCurve::new([(0.0, 1.0), (5.0, 2.0), (5.0, 9.0), (10.0, 4.0)]);
        assert!((curve.get_output(4.999) - 2.0).abs() < 1e-2);
        assert_eq!(curve.get_output(5.0), 9.0);
        assert_eq!(curve.get_output(7.5), 6.5);
    }

    #[test]
    fn wrap_normalize_stays_in_range() {
        for val in [-100.0f32, -PI, -1.0, 0.0, 1.0, PI, 10.0, 1e6] {
            let wrapped = wrap_normalize_float(val, PI);
            assert!(wrapped > -PI && wrapped <= PI, "{val} wrapped to {wrapped}");
        }
    }

    #[test]
    fn ue3_rounding_quantizes_yaw() {
        const STEP: f32 = (PI / (1 << 13) as f32) * 4.0;

        let rounded = round_angle_ue3(Angle::new(1.0, 0.5, 0.0));
        let yaw_steps = rounded.yaw / STEP;
        assert!((yaw_steps - yaw_steps.round()).abs() < 1e-3);
        assert!((rounded.yaw - 1.0).abs() < STEP);
        assert!((rounded.pitch - 0.5).abs() < STEP);
    }

    #[test]
    fn angle_rot_mat_round_trip() {
        let ang = Angle::new(1.2, 0.4, -0.6);
        let back = Angle::from_rot_mat(ang.to_rot_mat());
        assert!((ang.yaw - back.yaw).abs() < 1e-5);
        assert!((ang.pitch - back.pitch).abs() < 1e-5);
        assert!((ang.roll - back.roll).abs() < 1e-5);
    }

    #[test]
    fn seeded_rand_int_reproduces() {
        let a = rand_int(0, 1000, Some(17));
        let b = rand_int(0, 1000, Some(17));
        assert_eq!(a, b);
        assert!((0..1000).contains(&a));
    }
}
