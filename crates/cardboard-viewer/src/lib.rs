//! Cardboard stereo viewer.
//!
//! Draws a ring of labeled icon markers around the viewer, once per eye,
//! with the head driven by a device orientation stream.
//!
//! Layout:
//! - `sphere` / `orientation`: the two pure mappings (grid → world,
//!   sensor angles → head rotation)
//! - `rig` / `scene` / `stereo`: what gets drawn and how it is split per eye
//! - `assets` / `sensor`: background work on the tokio runtime
//! - `input` / `app`: event routing on the event-loop thread

pub mod app;
pub mod assets;
pub mod config;
pub mod event;
pub mod input;
pub mod orientation;
pub mod rig;
pub mod scene;
pub mod sensor;
pub mod sphere;
pub mod stereo;

pub use app::ViewerApp;
pub use config::ViewerConfig;
