//! Text rasterization.
//!
//! Labels are rasterized once on the CPU into a coverage mask and then drawn
//! as a single sprite; there is no glyph atlas because label text never
//! changes after creation.

mod font_system;

pub use font_system::{FontLoadError, LabelFont, TextRaster};
