//! Shared GPU types and utilities used by renderers.

use bytemuck::{Pod, Zeroable};

use crate::coords::{PixelRect, SurfaceSize};

// ── blend ─────────────────────────────────────────────────────────────────

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── quad vertex ───────────────────────────────────────────────────────────

/// Unit quad corner in the sprite's local plane (`z = 0`, +Y up).
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub pos: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { pos: [0.0, 0.0] },
    QuadVertex { pos: [1.0, 0.0] },
    QuadVertex { pos: [1.0, 1.0] },
    QuadVertex { pos: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── uniform sizing ────────────────────────────────────────────────────────

/// Returns the `wgpu` minimum binding size for a uniform of type `T`.
///
/// Uniform structs are never zero-sized, so this falls back to 1 only to
/// keep the signature infallible.
pub(super) fn min_binding_size<T>() -> std::num::NonZeroU64 {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64).unwrap_or(std::num::NonZeroU64::MIN)
}

// ── viewport rect ─────────────────────────────────────────────────────────

/// Clamps a view rect to the surface.
///
/// Returns `None` when nothing of the rect is visible; the renderer should
/// skip the view (wgpu rejects scissor rects outside the attachment).
pub(super) fn clamp_to_surface(rect: PixelRect, surface: SurfaceSize) -> Option<PixelRect> {
    rect.intersect(PixelRect::full(surface))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_inside_surface_is_unchanged() {
        let surface = SurfaceSize::new(800, 600);
        let rect = PixelRect::new(400, 0, 400, 600);
        assert_eq!(clamp_to_surface(rect, surface), Some(rect));
    }

    #[test]
    fn view_past_edge_is_clipped() {
        let surface = SurfaceSize::new(800, 600);
        let rect = PixelRect::new(700, 500, 400, 400);
        assert_eq!(clamp_to_surface(rect, surface), Some(PixelRect::new(700, 500, 100, 100)));
    }

    #[test]
    fn view_outside_surface_is_skipped() {
        let surface = SurfaceSize::new(800, 600);
        assert_eq!(clamp_to_surface(PixelRect::new(900, 0, 10, 10), surface), None);
    }
}
