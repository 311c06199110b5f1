//! Pixel-space geometry shared by the runtime and renderers.
//!
//! Canonical space:
//! - Physical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! World-space math (positions, rotations, projections) uses `glam`.

mod rect;
mod viewport;

pub use rect::PixelRect;
pub use viewport::SurfaceSize;
