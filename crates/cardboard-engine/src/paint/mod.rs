//! Paint primitives.
//!
//! Colors are stored premultiplied; the sprite pipeline blends with
//! `One, OneMinusSrcAlpha`.

mod color;

pub use color::Color;
