//! Head frame and the two eye cameras riding on it.
//!
//! Eyes are not children in a retained graph: their world transform is
//! composed on demand as `head rotation * local offset`.

use glam::{Mat4, Quat, Vec3};

use crate::config::RigConfig;

/// Rotation-only frame at the world origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeadFrame {
    pub rotation: Quat,
}

impl Default for HeadFrame {
    fn default() -> Self {
        Self { rotation: Quat::IDENTITY }
    }
}

impl HeadFrame {
    /// Transform from head-local to world space.
    pub fn to_world(&self) -> Mat4 {
        Mat4::from_quat(self.rotation)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Eye {
    Left,
    Right,
}

/// Perspective camera at a fixed offset from the head origin.
#[derive(Debug, Clone, PartialEq)]
pub struct EyeCamera {
    offset: Vec3,
    fov_y: f32,
    near: f32,
    far: f32,
    aspect: f32,
}

impl EyeCamera {
    fn new(offset: Vec3, rig: &RigConfig) -> Self {
        Self {
            offset,
            fov_y: rig.fov_y_degrees.to_radians(),
            near: rig.near,
            far: rig.far,
            aspect: 1.0,
        }
    }

    /// Head-local offset; fixed for the camera's lifetime.
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn world_transform(&self, head: &HeadFrame) -> Mat4 {
        head.to_world() * Mat4::from_translation(self.offset)
    }

    pub fn world_position(&self, head: &HeadFrame) -> Vec3 {
        head.rotation * self.offset
    }

    pub fn view(&self, head: &HeadFrame) -> Mat4 {
        self.world_transform(head).inverse()
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self, head: &HeadFrame) -> Mat4 {
        self.projection() * self.view(head)
    }
}

/// Head frame plus a left and right eye separated along head-local X.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoRig {
    pub head: HeadFrame,
    left: EyeCamera,
    right: EyeCamera,
    camera_distance: f32,
}

impl StereoRig {
    pub fn new(rig: &RigConfig) -> Self {
        let half = rig.eye_separation / 2.0;
        Self {
            head: HeadFrame::default(),
            left: EyeCamera::new(Vec3::new(-half, 0.0, rig.camera_distance), rig),
            right: EyeCamera::new(Vec3::new(half, 0.0, rig.camera_distance), rig),
            camera_distance: rig.camera_distance,
        }
    }

    /// Distance the eyes sit behind the head origin along head-local +Z.
    pub fn camera_distance(&self) -> f32 {
        self.camera_distance
    }

    pub fn eye(&self, eye: Eye) -> &EyeCamera {
        match eye {
            Eye::Left => &self.left,
            Eye::Right => &self.right,
        }
    }

    /// Both eyes always share one aspect ratio.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.left.aspect = aspect;
        self.right.aspect = aspect;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> StereoRig {
        StereoRig::new(&RigConfig::default())
    }

    #[test]
    fn eyes_sit_behind_origin_either_side() {
        let rig = rig();
        assert!(rig.eye(Eye::Left).offset().abs_diff_eq(Vec3::new(-0.05, 0.0, 0.5), 1e-7));
        assert!(rig.eye(Eye::Right).offset().abs_diff_eq(Vec3::new(0.05, 0.0, 0.5), 1e-7));
    }

    #[test]
    fn set_aspect_updates_both_and_keeps_offsets() {
        let mut rig = rig();
        let before = (rig.eye(Eye::Left).offset(), rig.eye(Eye::Right).offset());
        rig.set_aspect(0.75);
        assert_eq!(rig.eye(Eye::Left).aspect(), 0.75);
        assert_eq!(rig.eye(Eye::Right).aspect(), 0.75);
        assert_eq!((rig.eye(Eye::Left).offset(), rig.eye(Eye::Right).offset()), before);
    }

    #[test]
    fn eyes_follow_head_rotation() {
        let mut rig = rig();
        rig.head.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        // Head-local +Z turns into world +X; the left eye's -X offset into +Z.
        let left = rig.eye(Eye::Left).world_position(&rig.head);
        assert!(left.abs_diff_eq(Vec3::new(0.5, 0.0, 0.05), 1e-6), "{left:?}");
    }

    #[test]
    fn view_looks_down_negative_z() {
        let rig = rig();
        let eye = rig.eye(Eye::Right);
        // A point straight ahead of the eye lands at the view-space centre line.
        let p = eye.view(&rig.head).transform_point3(Vec3::new(0.05, 0.0, -5.0));
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -5.5), 1e-5), "{p:?}");
    }

    #[test]
    fn projection_maps_near_plane_to_zero_depth() {
        let rig = rig();
        let clip = rig.eye(Eye::Left).projection() * glam::Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
    }
}
