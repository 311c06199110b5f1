//! Cardboard engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the viewer:
//! window/event loop, wgpu device and surface, input translation, frame
//! timing, and the rasterizers + sprite renderer that draw flat content
//! into 3D space.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod raster;
pub mod render;
pub mod text;
