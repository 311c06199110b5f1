//! Scene contents: ambient light, gaze cursor and the marker ring.
//!
//! The scene is plain data. It never touches the GPU: new coverage masks
//! are queued in `pending_uploads` and the app hands them to the renderer.

use glam::{Mat3, Mat4, Quat, Vec3};

use cardboard_engine::paint::Color;
use cardboard_engine::raster::{CoverageMask, SvgRaster};
use cardboard_engine::render::{SpriteDraw, TextureId};
use cardboard_engine::text::{LabelFont, TextRaster};

use crate::rig::HeadFrame;
use crate::sphere::grid_to_world;

/// Label and icon color.
pub const MARKER_COLOR: u32 = 0x777799;
/// Gaze cursor color.
pub const CURSOR_COLOR: u32 = 0x777755;
pub const CURSOR_RADIUS: f32 = 0.01;
/// Distance of the cursor in front of the eyes.
pub const CURSOR_DISTANCE: f32 = 3.0;

/// Label cap: world units per em.
pub const LABEL_SIZE: f32 = 0.1;
/// Label raster resolution.
pub const LABEL_PX_PER_EM: f32 = 96.0;

/// World units per SVG user unit. Negative on every axis: SVG Y runs down.
pub const ICON_SCALE: f32 = -0.01;
pub const ICON_PX_PER_UNIT: f32 = 8.0;
/// Icon offset from its marker, in world space.
pub const ICON_OFFSET: Vec3 = Vec3::new(-0.1, 0.175, 0.0);

/// One entry of the marker table.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerSpec {
    pub row: f32,
    pub column: f32,
    pub depth: f32,
    pub label: &'static str,
    /// Icon id, `Category/name`.
    pub icon: &'static str,
}

pub const MARKERS: [MarkerSpec; 6] = [
    MarkerSpec { row: -1.5, column: -1.0, depth: 8.0, label: "reload", icon: "System/reset-left" },
    MarkerSpec { row: 1.5, column: 0.75, depth: 8.0, label: "calendar", icon: "Business/calendar" },
    MarkerSpec { row: 1.5, column: 1.5, depth: 8.0, label: "clock", icon: "System/time" },
    MarkerSpec { row: -0.5, column: 0.0, depth: 6.0, label: "photos", icon: "Media/image-2" },
    MarkerSpec { row: 0.0, column: 0.0, depth: 5.0, label: "mail", icon: "Business/mail" },
    MarkerSpec { row: 0.5, column: 0.0, depth: 6.0, label: "news", icon: "Document/article" },
];

// ── lighting ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self { color: Color::WHITE, intensity: 0.4 }
    }
}

// ── sprites ───────────────────────────────────────────────────────────────

/// Flat textured quad placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: TextureId,
    /// Unit quad → parent space (world, or head-local for the cursor).
    pub model: Mat4,
    /// Anchor point in parent space, used for draw ordering.
    pub position: Vec3,
    /// Unlit color; ambient light does not change it.
    pub color: Color,
}

impl Sprite {
    /// Local +Z axis in parent space.
    pub fn facing(&self) -> Vec3 {
        self.model.z_axis.truncate().normalize_or_zero()
    }
}

/// A sprite resolved to world space for one frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldSprite {
    pub draw: SpriteDraw,
    pub position: Vec3,
}

/// Rotation whose local +Z points from `position` at `target`, +Y kept up.
pub fn facing_rotation(position: Vec3, target: Vec3) -> Quat {
    let z = (target - position).normalize_or_zero();
    if z == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let mut x = Vec3::Y.cross(z);
    if x.length_squared() < 1e-12 {
        // Looking straight up or down: any horizontal X works.
        x = Vec3::Z.cross(z);
    }
    let x = x.normalize();
    let y = z.cross(x);

    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}

/// One marker: a fixed position plus whatever content has arrived so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub spec: MarkerSpec,
    pub position: Vec3,
    pub label: Option<Sprite>,
    pub icon: Option<Sprite>,
}

/// Icon fetch the scene wants issued for a marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconRequest {
    pub marker: usize,
    pub icon: &'static str,
}

pub struct Scene {
    pub ambient: AmbientLight,
    cursor: Sprite,
    markers: Vec<Marker>,
    pending_uploads: Vec<(TextureId, CoverageMask)>,
    next_texture: u64,
}

impl Scene {
    /// Creates the static part of the scene; markers start empty.
    ///
    /// `camera_distance` is how far the eyes sit behind the head origin.
    pub fn new(camera_distance: f32) -> Self {
        let mut scene = Self {
            ambient: AmbientLight::default(),
            cursor: Sprite {
                texture: TextureId(0),
                model: Mat4::IDENTITY,
                position: Vec3::ZERO,
                color: Color::from_hex(CURSOR_COLOR),
            },
            markers: MARKERS
                .iter()
                .map(|spec| Marker {
                    spec: *spec,
                    position: grid_to_world(spec.row, spec.column, spec.depth),
                    label: None,
                    icon: None,
                })
                .collect(),
            pending_uploads: Vec::new(),
            next_texture: 0,
        };

        // Filled four-segment circle: a unit square turned 45°.
        let texture = scene.queue_upload(CoverageMask::solid(1, 1));
        let position = Vec3::new(0.0, 0.0, -(CURSOR_DISTANCE + camera_distance));
        let side = CURSOR_RADIUS * std::f32::consts::SQRT_2;
        scene.cursor.texture = texture;
        scene.cursor.position = position;
        scene.cursor.model = Mat4::from_translation(position)
            * Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4)
            * Mat4::from_scale(Vec3::new(side, side, 1.0))
            * Mat4::from_translation(Vec3::new(-0.5, -0.5, 0.0));
        scene
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Head-local cursor sprite.
    pub fn cursor(&self) -> &Sprite {
        &self.cursor
    }

    /// Number of markers with both label and icon in place.
    pub fn resolved_count(&self) -> usize {
        self.markers
            .iter()
            .filter(|m| m.label.is_some() && m.icon.is_some())
            .count()
    }

    /// Masks created since the last call, for upload.
    pub fn take_pending_uploads(&mut self) -> Vec<(TextureId, CoverageMask)> {
        std::mem::take(&mut self.pending_uploads)
    }

    fn queue_upload(&mut self, mask: CoverageMask) -> TextureId {
        let id = TextureId(self.next_texture);
        self.next_texture += 1;
        self.pending_uploads.push((id, mask));
        id
    }

    /// Rasterizes every label with `font` and returns the icon fetches to start.
    pub fn apply_font(&mut self, font: &LabelFont) -> Vec<IconRequest> {
        let mut requests = Vec::with_capacity(self.markers.len());
        for index in 0..self.markers.len() {
            let spec = self.markers[index].spec;
            let raster = font.rasterize_line(spec.label, LABEL_PX_PER_EM);
            self.place_label(index, raster);
            requests.push(IconRequest { marker: index, icon: spec.icon });
        }
        requests
    }

    /// Attaches a label to marker `index`, facing the origin.
    ///
    /// The text baseline runs through the marker position; text extends
    /// along local +X.
    pub fn place_label(&mut self, index: usize, raster: TextRaster) {
        let Some(position) = self.markers.get(index).map(|m| m.position) else {
            log::warn!("label for unknown marker {index}");
            return;
        };

        let units_per_px = LABEL_SIZE / raster.px_per_em;
        let width = raster.mask.width() as f32 * units_per_px;
        let height = raster.mask.height() as f32 * units_per_px;
        let descent = raster.descent() as f32 * units_per_px;

        let model = Mat4::from_translation(position)
            * Mat4::from_quat(facing_rotation(position, Vec3::ZERO))
            * Mat4::from_translation(Vec3::new(0.0, -descent, 0.0))
            * Mat4::from_scale(Vec3::new(width, height, 1.0));

        let texture = self.queue_upload(raster.mask);
        let marker = &mut self.markers[index];
        log::debug!("label '{}' placed at {:?}", marker.spec.label, position);
        marker.label = Some(Sprite {
            texture,
            model,
            position,
            color: Color::from_hex(MARKER_COLOR),
        });
    }

    /// Attaches an icon to marker `index`, offset from the marker and facing
    /// the origin. SVG user units map to [`ICON_SCALE`] world units.
    pub fn place_icon(&mut self, index: usize, raster: SvgRaster) {
        let Some(anchor) = self.markers.get(index).map(|m| m.position) else {
            log::warn!("icon for unknown marker {index}");
            return;
        };

        let position = anchor + ICON_OFFSET;
        let (w, h) = (raster.units.x, raster.units.y);

        // Unit quad → SVG user space (top row of the mask at y = 0).
        let to_svg = Mat4::from_translation(Vec3::new(0.0, h, 0.0))
            * Mat4::from_scale(Vec3::new(w, -h, 1.0));

        let model = Mat4::from_translation(position)
            * Mat4::from_quat(facing_rotation(position, Vec3::ZERO))
            * Mat4::from_scale(Vec3::splat(ICON_SCALE))
            * to_svg;

        let texture = self.queue_upload(raster.mask);
        let marker = &mut self.markers[index];
        log::debug!("icon '{}' placed at {:?}", marker.spec.icon, position);
        marker.icon = Some(Sprite {
            texture,
            model,
            position,
            color: Color::from_hex(MARKER_COLOR),
        });
    }

    /// Every sprite in world space for the given head pose, unordered.
    pub fn world_sprites(&self, head: &HeadFrame) -> Vec<WorldSprite> {
        let mut out = Vec::with_capacity(1 + self.markers.len() * 2);

        let head_to_world = head.to_world();
        out.push(WorldSprite {
            draw: SpriteDraw {
                texture: self.cursor.texture,
                model: head_to_world * self.cursor.model,
                tint: self.cursor.color,
            },
            position: head.rotation * self.cursor.position,
        });

        for sprite in self.markers.iter().flat_map(|m| m.label.iter().chain(m.icon.iter())) {
            out.push(WorldSprite {
                draw: SpriteDraw {
                    texture: sprite.texture,
                    model: sprite.model,
                    tint: sprite.color,
                },
                position: sprite.position,
            });
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_FONT: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/fonts/Tuffy.ttf"));

    fn text_raster() -> TextRaster {
        TextRaster { mask: CoverageMask::solid(192, 112), baseline: 90, px_per_em: 96.0 }
    }

    fn svg_raster() -> SvgRaster {
        SvgRaster { mask: CoverageMask::solid(192, 192), units: glam::Vec2::new(24.0, 24.0) }
    }

    fn assert_faces_origin(sprite: &Sprite) {
        let expected = (-sprite.position).normalize();
        let facing = sprite.facing();
        assert!(facing.abs_diff_eq(expected, 1e-5), "{facing:?} vs {expected:?}");
    }

    // ── static content ────────────────────────────────────────────────────

    #[test]
    fn starts_with_cursor_and_empty_markers() {
        let mut scene = Scene::new(0.5);
        assert_eq!(scene.markers().len(), 6);
        assert_eq!(scene.resolved_count(), 0);
        assert!(scene.markers().iter().all(|m| m.label.is_none() && m.icon.is_none()));

        let uploads = scene.take_pending_uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].0, scene.cursor().texture);
        assert!(scene.take_pending_uploads().is_empty());
    }

    #[test]
    fn cursor_is_a_diamond_in_front_of_the_eyes() {
        let scene = Scene::new(0.5);
        let model = scene.cursor().model;
        let centre = model.transform_point3(Vec3::new(0.5, 0.5, 0.0));
        assert!(centre.abs_diff_eq(Vec3::new(0.0, 0.0, -3.5), 1e-6));

        // Quad corners land on the axes at the cursor radius.
        let right = model.transform_point3(Vec3::new(1.0, 0.0, 0.0)) - centre;
        let top = model.transform_point3(Vec3::new(1.0, 1.0, 0.0)) - centre;
        assert!(right.abs_diff_eq(Vec3::new(CURSOR_RADIUS, 0.0, 0.0), 1e-6), "{right:?}");
        assert!(top.abs_diff_eq(Vec3::new(0.0, CURSOR_RADIUS, 0.0), 1e-6), "{top:?}");
    }

    #[test]
    fn cursor_follows_head() {
        let scene = Scene::new(0.5);
        let head = HeadFrame { rotation: Quat::from_rotation_y(std::f32::consts::PI) };
        let cursor = scene.world_sprites(&head)[0];
        assert!(cursor.position.abs_diff_eq(Vec3::new(0.0, 0.0, 3.5), 1e-5));
    }

    // ── markers ───────────────────────────────────────────────────────────

    #[test]
    fn resolved_markers_sit_on_the_grid_and_face_origin() {
        let mut scene = Scene::new(0.5);
        for i in 0..MARKERS.len() {
            scene.place_label(i, text_raster());
            scene.place_icon(i, svg_raster());
        }
        assert_eq!(scene.resolved_count(), 6);

        for (marker, spec) in scene.markers().iter().zip(MARKERS.iter()) {
            let label = marker.label.as_ref().unwrap();
            let icon = marker.icon.as_ref().unwrap();
            assert_eq!(label.position, grid_to_world(spec.row, spec.column, spec.depth));
            assert_eq!(icon.position, label.position + ICON_OFFSET);
            assert_faces_origin(label);
            // Negative scale flips +Z; the quad normal is what must face origin.
            let normal = -icon.facing();
            let expected = (-icon.position).normalize();
            assert!(normal.abs_diff_eq(expected, 1e-5), "{normal:?} vs {expected:?}");
        }
    }

    #[test]
    fn font_places_labels_then_requests_icons_in_table_order() {
        let font = LabelFont::from_bytes(TEST_FONT).unwrap();
        let mut scene = Scene::new(0.5);
        scene.take_pending_uploads();

        let requests = scene.apply_font(&font);
        let expected: Vec<_> = MARKERS
            .iter()
            .enumerate()
            .map(|(marker, spec)| IconRequest { marker, icon: spec.icon })
            .collect();
        assert_eq!(requests, expected);
        assert_eq!(requests[0].icon, "System/reset-left");
        assert_eq!(requests[5].icon, "Document/article");

        for (marker, spec) in scene.markers().iter().zip(MARKERS.iter()) {
            let label = marker.label.as_ref().unwrap();
            assert_eq!(label.position, grid_to_world(spec.row, spec.column, spec.depth));
            assert_faces_origin(label);
            assert!(marker.icon.is_none());
        }
        assert_eq!(scene.resolved_count(), 0);

        let uploads = scene.take_pending_uploads();
        let ids: Vec<_> = uploads.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, (1..=6).map(TextureId).collect::<Vec<_>>());
        let height = uploads[0].1.height();
        assert!(uploads.iter().all(|(_, mask)| !mask.is_empty() && mask.height() == height));
    }

    #[test]
    fn label_baseline_passes_through_marker() {
        let mut scene = Scene::new(0.5);
        scene.place_label(4, text_raster());
        let label = scene.markers()[4].label.clone().unwrap();

        // Marker 4 is straight ahead, so the label is not rotated.
        let descent_v = 22.0 / 112.0;
        let on_baseline = label.model.transform_point3(Vec3::new(0.0, descent_v, 0.0));
        assert!(on_baseline.abs_diff_eq(Vec3::new(0.0, 0.0, -5.0), 1e-5), "{on_baseline:?}");

        let far_corner = label.model.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!((far_corner.x - 0.2).abs() < 1e-5);
    }

    #[test]
    fn icon_spans_svg_units_at_scale() {
        let mut scene = Scene::new(0.5);
        scene.place_icon(4, svg_raster());
        let icon = scene.markers()[4].icon.clone().unwrap();
        let a = icon.model.transform_point3(Vec3::new(0.0, 0.0, 0.0));
        let b = icon.model.transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert!(((a - b).length() - 24.0 * 0.01 * std::f32::consts::SQRT_2).abs() < 1e-4);
    }

    #[test]
    fn content_arrives_in_any_order() {
        let mut scene = Scene::new(0.5);
        scene.place_icon(2, svg_raster());
        scene.place_label(5, text_raster());
        scene.place_label(2, text_raster());
        assert_eq!(scene.resolved_count(), 1);
        assert_eq!(scene.world_sprites(&HeadFrame::default()).len(), 4);
    }

    #[test]
    fn unknown_marker_is_ignored() {
        let mut scene = Scene::new(0.5);
        scene.take_pending_uploads();
        scene.place_icon(42, svg_raster());
        assert!(scene.take_pending_uploads().is_empty());
    }

    #[test]
    fn every_upload_gets_a_fresh_texture() {
        let mut scene = Scene::new(0.5);
        scene.place_label(0, text_raster());
        scene.place_icon(0, svg_raster());
        let ids: Vec<_> = scene.take_pending_uploads().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![TextureId(0), TextureId(1), TextureId(2)]);
    }

    // ── helpers ───────────────────────────────────────────────────────────

    #[test]
    fn facing_rotation_points_z_at_target() {
        let pos = Vec3::new(3.0, -2.0, -7.0);
        let q = facing_rotation(pos, Vec3::ZERO);
        assert!((q * Vec3::Z).abs_diff_eq((-pos).normalize(), 1e-5));
        // Local X stays horizontal.
        assert!((q * Vec3::X).y.abs() < 1e-6);
    }

    #[test]
    fn facing_rotation_handles_vertical_direction() {
        let q = facing_rotation(Vec3::new(0.0, -5.0, 0.0), Vec3::ZERO);
        assert!((q * Vec3::Z).abs_diff_eq(Vec3::Y, 1e-5));
        assert!(q.is_normalized());
    }

    #[test]
    fn sprites_draw_at_their_own_color() {
        let mut scene = Scene::new(0.5);
        assert_eq!(scene.ambient, AmbientLight { color: Color::WHITE, intensity: 0.4 });
        scene.place_label(0, text_raster());

        let sprites = scene.world_sprites(&HeadFrame::default());
        assert_eq!(sprites[0].draw.tint, Color::from_hex(CURSOR_COLOR));
        assert_eq!(sprites[1].draw.tint, Color::from_hex(MARKER_COLOR));
    }
}
