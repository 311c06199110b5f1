//! Side-by-side stereo rendering.
//!
//! The surface is split into a left and right half; the scene is drawn once
//! per eye into its half, inside a single render pass.

use std::time::{Duration, Instant};

use cardboard_engine::coords::{PixelRect, SurfaceSize};
use cardboard_engine::raster::CoverageMask;
use cardboard_engine::render::{
    RenderCtx, RenderTarget, SpriteDraw, SpriteRenderer, TextureId, ViewPass,
};

use crate::rig::{Eye, HeadFrame, StereoRig};
use crate::scene::Scene;

/// How often the current head pose is written to the debug log.
const POSE_LOG_INTERVAL: Duration = Duration::from_secs(1);

/// Everything needed to draw one stereo frame.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoFrame {
    /// Left eye first.
    pub views: [ViewPass; 2],
    /// Back-to-front.
    pub draws: Vec<SpriteDraw>,
}

pub struct StereoRenderer {
    size: SurfaceSize,
    sprites: SpriteRenderer,
    pending: Vec<(TextureId, CoverageMask)>,
    last_pose_log: Option<Instant>,
}

impl Default for StereoRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoRenderer {
    pub fn new() -> Self {
        Self {
            size: SurfaceSize::default(),
            sprites: SpriteRenderer::new(),
            pending: Vec::new(),
            last_pose_log: None,
        }
    }

    /// Surface size as of the last [`resize`](Self::resize).
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Stores the new surface size and gives each eye half its aspect.
    ///
    /// A zero-height surface (minimized window) keeps the previous aspect.
    pub fn resize(&mut self, size: SurfaceSize, rig: &mut StereoRig) {
        self.size = size;
        if size.height > 0 {
            rig.set_aspect((size.width as f32 / 2.0) / size.height as f32);
        }
        log::debug!("stereo resize {}×{}", size.width, size.height);
    }

    /// Left and right eye rects; together they tile the surface exactly.
    pub fn eye_rects(&self) -> (PixelRect, PixelRect) {
        PixelRect::full(self.size).split_halves()
    }

    /// Builds both eye views and the sorted draw list for the current pose.
    pub fn plan(&self, rig: &StereoRig, scene: &Scene) -> StereoFrame {
        let (left, right) = self.eye_rects();
        let head: &HeadFrame = &rig.head;

        let views = [
            ViewPass { rect: left, view_proj: rig.eye(Eye::Left).view_proj(head) },
            ViewPass { rect: right, view_proj: rig.eye(Eye::Right).view_proj(head) },
        ];

        let mut sprites = scene.world_sprites(head);
        // Head sits at the origin, so distance from it is just the length.
        sprites.sort_by(|a, b| b.position.length_squared().total_cmp(&a.position.length_squared()));

        StereoFrame {
            views,
            draws: sprites.into_iter().map(|s| s.draw).collect(),
        }
    }

    /// Queues masks for upload on the next rendered frame.
    pub fn queue_uploads(&mut self, masks: Vec<(TextureId, CoverageMask)>) {
        self.pending.extend(masks);
    }

    /// Masks queued but not yet on the GPU.
    pub fn pending_uploads(&self) -> usize {
        self.pending.len()
    }

    /// Uploads queued masks, then draws `frame` into both eye rects.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        frame: &StereoFrame,
    ) {
        for (id, mask) in self.pending.drain(..) {
            self.sprites.upload_mask(ctx, id, &mask);
        }
        if !self.size.is_valid() {
            return;
        }
        self.sprites.render(ctx, target, &frame.views, &frame.draws);
    }

    /// Writes the head pose to the debug log at most once per interval.
    pub fn log_pose(&mut self, now: Instant, head: &HeadFrame) {
        let due = self
            .last_pose_log
            .is_none_or(|last| now.saturating_duration_since(last) >= POSE_LOG_INTERVAL);
        if !due {
            return;
        }
        self.last_pose_log = Some(now);

        let (y, x, z) = head.rotation.to_euler(glam::EulerRot::YXZ);
        log::debug!(
            "head yaw {:.1}° pitch {:.1}° roll {:.1}°",
            y.to_degrees(),
            x.to_degrees(),
            z.to_degrees()
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::config::RigConfig;
    use crate::scene::MARKERS;
    use cardboard_engine::raster::SvgRaster;

    fn setup(width: u32, height: u32) -> (StereoRenderer, StereoRig, Scene) {
        let mut renderer = StereoRenderer::new();
        let mut rig = StereoRig::new(&RigConfig::default());
        renderer.resize(SurfaceSize::new(width, height), &mut rig);
        let scene = Scene::new(rig.camera_distance());
        (renderer, rig, scene)
    }

    // ── resize ────────────────────────────────────────────────────────────

    #[test]
    fn resize_sets_half_width_aspect_on_both_eyes() {
        let (mut renderer, mut rig, _) = setup(800, 600);
        let offsets = (rig.eye(Eye::Left).offset(), rig.eye(Eye::Right).offset());

        for (w, h) in [(1920, 1080), (801, 600), (600, 800)] {
            renderer.resize(SurfaceSize::new(w, h), &mut rig);
            let expected = (w as f32 / 2.0) / h as f32;
            assert_eq!(rig.eye(Eye::Left).aspect(), expected);
            assert_eq!(rig.eye(Eye::Right).aspect(), expected);
            assert_eq!(renderer.size(), SurfaceSize::new(w, h));
        }
        assert_eq!((rig.eye(Eye::Left).offset(), rig.eye(Eye::Right).offset()), offsets);
    }

    #[test]
    fn zero_height_keeps_previous_aspect() {
        let (mut renderer, mut rig, _) = setup(800, 600);
        renderer.resize(SurfaceSize::new(800, 0), &mut rig);
        assert_eq!(rig.eye(Eye::Left).aspect(), 400.0 / 600.0);
    }

    // ── split ─────────────────────────────────────────────────────────────

    #[test]
    fn eye_rects_tile_the_surface() {
        for (w, h) in [(800, 600), (801, 600), (1, 1), (2, 3)] {
            let (renderer, _, _) = setup(w, h);
            let (left, right) = renderer.eye_rects();
            assert_eq!(left, PixelRect::new(0, 0, w / 2, h));
            assert_eq!(right, PixelRect::new(w / 2, 0, w - w / 2, h));
            assert_eq!(left.right(), right.x);
            assert_eq!(right.right(), w);
            assert!(left.intersect(right).is_none());
        }
    }

    #[test]
    fn plan_uses_eye_rects_in_order() {
        let (renderer, rig, scene) = setup(800, 600);
        let frame = renderer.plan(&rig, &scene);
        let (left, right) = renderer.eye_rects();
        assert_eq!(frame.views[0].rect, left);
        assert_eq!(frame.views[1].rect, right);
        assert_ne!(frame.views[0].view_proj, frame.views[1].view_proj);
    }

    // ── draw order ────────────────────────────────────────────────────────

    #[test]
    fn draws_are_back_to_front() {
        let (renderer, rig, mut scene) = setup(800, 600);
        for i in 0..MARKERS.len() {
            scene.place_icon(
                i,
                SvgRaster {
                    mask: CoverageMask::solid(4, 4),
                    units: glam::Vec2::new(24.0, 24.0),
                },
            );
        }

        let frame = renderer.plan(&rig, &scene);
        assert_eq!(frame.draws.len(), 1 + MARKERS.len());

        // Icons were uploaded after the cursor, one per marker in table order.
        let depth_of = |t: TextureId| MARKERS[(t.0 - 1) as usize].depth;
        let icon_depths: Vec<f32> =
            frame.draws[..MARKERS.len()].iter().map(|d| depth_of(d.texture)).collect();
        assert!(icon_depths.windows(2).all(|w| w[0] >= w[1]), "{icon_depths:?}");
        // Nearest item is always the cursor.
        assert_eq!(frame.draws.last().map(|d| d.texture), Some(scene.cursor().texture));
    }

    #[test]
    fn head_rotation_moves_both_views() {
        let (renderer, mut rig, scene) = setup(800, 600);
        let before = renderer.plan(&rig, &scene);
        rig.head.rotation = Quat::from_rotation_y(0.3);
        let after = renderer.plan(&rig, &scene);
        assert_ne!(before.views[0].view_proj, after.views[0].view_proj);
        assert_ne!(before.views[1].view_proj, after.views[1].view_proj);

        // The cursor stays centred between the eyes regardless of pose.
        let cursor = after.draws.last().map(|d| d.model.transform_point3(Vec3::new(0.5, 0.5, 0.0)));
        let expected = rig.head.rotation * Vec3::new(0.0, 0.0, -3.5);
        assert!(cursor.is_some_and(|c| c.abs_diff_eq(expected, 1e-5)));
    }

    #[test]
    fn uploads_wait_for_a_rendered_frame() {
        let (mut renderer, _, mut scene) = setup(800, 600);
        renderer.queue_uploads(scene.take_pending_uploads());
        renderer.queue_uploads(Vec::new());
        assert_eq!(renderer.pending_uploads(), 1);
    }

    #[test]
    fn pose_log_is_rate_limited() {
        let (mut renderer, rig, _) = setup(800, 600);
        let t0 = Instant::now();
        renderer.log_pose(t0, &rig.head);
        assert_eq!(renderer.last_pose_log, Some(t0));
        renderer.log_pose(t0 + Duration::from_millis(10), &rig.head);
        assert_eq!(renderer.last_pose_log, Some(t0));
        renderer.log_pose(t0 + POSE_LOG_INTERVAL, &rig.head);
        assert_eq!(renderer.last_pose_log, Some(t0 + POSE_LOG_INTERVAL));
    }
}
