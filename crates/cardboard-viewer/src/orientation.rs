//! Device orientation → head rotation.
//!
//! Raw samples follow the W3C `DeviceOrientationEvent` angles, in degrees.
//! The mapping below is tuned for a phone held in landscape inside a
//! cardboard headset: `gamma` drives pitch and `alpha` drives yaw, each
//! recentred so that looking at the horizon gives a level head.

use glam::Quat;
use serde::Deserialize;

/// One raw orientation reading, in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct OrientationSample {
    pub alpha: f64,
    /// Accepted for completeness; roll is not applied.
    #[serde(default)]
    pub beta: f64,
    pub gamma: f64,
}

/// Recentred angles in degrees: `pitch` about X, `yaw` about Y.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeadAngles {
    pub pitch: f64,
    pub yaw: f64,
}

/// Highest tilt [`sample_for`] will produce. At ±90 the recentring folds.
pub const MAX_TILT_DEGREES: f64 = 89.9;

/// Recentres a raw sample.
///
/// `gamma` is shifted by 90° towards zero. `alpha` is turned half a
/// revolution whenever the recentred pitch is non-negative, which undoes the
/// sensor's yaw flip as the phone passes vertical.
pub fn recenter(sample: &OrientationSample) -> HeadAngles {
    let pitch = if sample.gamma >= 0.0 {
        sample.gamma - 90.0
    } else {
        sample.gamma + 90.0
    };
    let yaw = if pitch >= 0.0 {
        sample.alpha - 180.0
    } else {
        sample.alpha
    };
    HeadAngles { pitch, yaw }
}

/// Head rotation for a raw sample: yaw about Y, then pitch about X.
pub fn head_rotation(sample: &OrientationSample) -> Quat {
    let HeadAngles { pitch, yaw } = recenter(sample);
    Quat::from_rotation_y(yaw.to_radians() as f32)
        * Quat::from_rotation_x(pitch.to_radians() as f32)
}

/// Builds the raw sample that [`recenter`] turns into `(heading, tilt)`.
///
/// `tilt` is clamped to ±[`MAX_TILT_DEGREES`].
pub fn sample_for(heading: f64, tilt: f64) -> OrientationSample {
    let tilt = tilt.clamp(-MAX_TILT_DEGREES, MAX_TILT_DEGREES);
    if tilt >= 0.0 {
        OrientationSample { alpha: heading + 180.0, beta: 0.0, gamma: tilt - 90.0 }
    } else {
        OrientationSample { alpha: heading, beta: 0.0, gamma: tilt + 90.0 }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn sample(alpha: f64, gamma: f64) -> OrientationSample {
        OrientationSample { alpha, beta: 0.0, gamma }
    }

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-5), "{a:?} != {b:?}");
    }

    // ── recentring ────────────────────────────────────────────────────────

    #[test]
    fn vertical_gamma_recentres_to_level() {
        assert_eq!(recenter(&sample(0.0, 90.0)).pitch, 0.0);
        assert_eq!(recenter(&sample(0.0, -90.0)).pitch, 0.0);
    }

    #[test]
    fn yaw_flips_only_for_non_negative_pitch() {
        for alpha in [0.0, 45.0, 180.0, 359.0] {
            // gamma 30 → pitch -60: unchanged.
            assert_eq!(recenter(&sample(alpha, 30.0)).yaw, alpha);
            // gamma -30 → pitch 60: shifted.
            assert_eq!(recenter(&sample(alpha, -30.0)).yaw, alpha - 180.0);
            // gamma 90 → pitch 0: shifted.
            assert_eq!(recenter(&sample(alpha, 90.0)).yaw, alpha - 180.0);
        }
    }

    #[test]
    fn beta_is_ignored() {
        let a = OrientationSample { alpha: 10.0, beta: 0.0, gamma: 20.0 };
        let b = OrientationSample { beta: 75.0, ..a };
        assert_eq!(head_rotation(&a), head_rotation(&b));
    }

    // ── rotation ──────────────────────────────────────────────────────────

    #[test]
    fn level_forward_sample_is_identity() {
        let q = head_rotation(&sample(180.0, -90.0));
        assert_vec_eq(q * Vec3::NEG_Z, Vec3::NEG_Z);
        assert_vec_eq(q * Vec3::Y, Vec3::Y);
    }

    #[test]
    fn yaw_applies_after_pitch() {
        // Pitch up 30°, then yaw left 90°: forward ends up pointing at -X, raised.
        let q = head_rotation(&sample_for(90.0, 30.0));
        let f = q * Vec3::NEG_Z;
        let (s, c) = 30f32.to_radians().sin_cos();
        assert_vec_eq(f, Vec3::new(-c, s, 0.0));
    }

    // ── inverse ───────────────────────────────────────────────────────────

    #[test]
    fn sample_for_round_trips() {
        for heading in [-180.0, -90.0, 0.0, 45.0, 179.0] {
            for tilt in [-89.0, -10.0, 0.0, 10.0, 89.0] {
                let got = recenter(&sample_for(heading, tilt));
                assert!((got.yaw - heading).abs() < 1e-9, "yaw {got:?} for {heading}");
                assert!((got.pitch - tilt).abs() < 1e-9, "pitch {got:?} for {tilt}");
            }
        }
    }

    #[test]
    fn sample_for_clamps_tilt() {
        let got = recenter(&sample_for(0.0, 120.0));
        assert!((got.pitch - MAX_TILT_DEGREES).abs() < 1e-9);
    }

    #[test]
    fn parses_json_datagram() {
        let s: OrientationSample =
            serde_json::from_str(r#"{"alpha": 12.5, "beta": -3, "gamma": 80}"#).unwrap();
        assert_eq!(s, OrientationSample { alpha: 12.5, beta: -3.0, gamma: 80.0 });
    }
}
