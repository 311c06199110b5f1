//! Spherical marker layout.
//!
//! Markers sit on a grid of rows and columns wrapped around the viewer.
//! Row and column are angular steps of `π/16` (elevation and azimuth);
//! depth is the distance from the origin.

use std::f32::consts::PI;

use glam::Vec3;

/// Angle covered by one row or column.
pub const GRID_STEP: f32 = PI / 16.0;

/// Maps a `(row, column, depth)` grid coordinate to a world position.
///
/// Row 0 / column 0 lies straight ahead on -Z. Positive rows go up,
/// positive columns go right. The result is always at distance `depth`
/// from the origin.
pub fn grid_to_world(row: f32, column: f32, depth: f32) -> Vec3 {
    let theta = row * GRID_STEP;
    let phi = column * GRID_STEP;
    let rho = depth * theta.cos();

    Vec3::new(rho * phi.sin(), depth * theta.sin(), -rho * phi.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_cell_is_straight_ahead() {
        for d in [0.0, 1.0, 5.0, 8.0] {
            assert_eq!(grid_to_world(0.0, 0.0, d), Vec3::new(0.0, 0.0, -d));
        }
    }

    #[test]
    fn stays_within_depth_bounds() {
        let mut r = -4.0;
        while r <= 4.0 {
            let mut c = -8.0;
            while c <= 8.0 {
                let p = grid_to_world(r, c, 6.0);
                let xz = (p.x * p.x + p.z * p.z).sqrt();
                assert!(xz <= 6.0 + 1e-5, "xz {xz} at ({r}, {c})");
                assert!(p.y.abs() <= 6.0 + 1e-5);
                assert!((p.length() - 6.0).abs() < 1e-4);
                c += 0.25;
            }
            r += 0.25;
        }
    }

    #[test]
    fn positive_row_goes_up_positive_column_goes_right() {
        let up = grid_to_world(1.5, 0.0, 8.0);
        assert!(up.y > 0.0 && up.z < 0.0);

        let right = grid_to_world(0.0, 1.5, 8.0);
        assert!(right.x > 0.0 && right.y.abs() < 1e-6);
    }

    #[test]
    fn eight_columns_is_a_quarter_turn() {
        let p = grid_to_world(0.0, 8.0, 2.0);
        assert!((p.x - 2.0).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }
}
