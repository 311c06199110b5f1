//! CPU rasterization into single-channel coverage masks.
//!
//! Masks are uploaded as `R8Unorm` textures and tinted in the sprite shader,
//! so both glyph runs and vector icons share one pipeline.

mod mask;
mod svg;

pub use mask::CoverageMask;
pub use svg::{rasterize_svg, SvgError, SvgRaster};
