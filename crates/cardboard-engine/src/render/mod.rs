//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers, textures) and
//! create them lazily on first use.
//!
//! Convention:
//! - World space is right-handed, +Y up, cameras look down -Z.
//! - Clip space follows wgpu (depth 0..1); projections come from
//!   `glam::Mat4::perspective_rh`.
//! - Every draw targets an explicit pixel rect of the surface, so one pass
//!   can hold several views side by side.

mod common;
mod ctx;
pub mod sprite;

pub use ctx::{RenderCtx, RenderTarget};
pub use sprite::{SpriteDraw, SpriteRenderer, TextureId, ViewPass};
