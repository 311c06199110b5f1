//! Messages posted from background tasks to the event-loop thread.

use cardboard_engine::raster::SvgRaster;
use cardboard_engine::text::LabelFont;

use crate::assets::AssetError;
use crate::orientation::OrientationSample;

/// Outcome of an orientation permission request.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Permission {
    Granted,
    Denied,
}

pub enum ViewerEvent {
    /// The label font finished loading (or failed to).
    FontLoaded(Result<LabelFont, AssetError>),

    /// The icon for `marker` finished loading and rasterizing.
    IconLoaded {
        marker: usize,
        result: Result<SvgRaster, AssetError>,
    },

    PermissionResolved(Permission),

    Orientation(OrientationSample),
}

impl std::fmt::Debug for ViewerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerEvent::FontLoaded(r) => write!(f, "FontLoaded(ok: {})", r.is_ok()),
            ViewerEvent::IconLoaded { marker, result } => {
                write!(f, "IconLoaded(marker: {marker}, ok: {})", result.is_ok())
            }
            ViewerEvent::PermissionResolved(p) => write!(f, "PermissionResolved({p:?})"),
            ViewerEvent::Orientation(s) => write!(f, "Orientation({s:?})"),
        }
    }
}
