use resvg::{tiny_skia, usvg};

use super::CoverageMask;

#[derive(Debug, thiserror::Error)]
pub enum SvgError {
    #[error("failed to parse SVG: {0}")]
    Parse(#[from] usvg::Error),

    #[error("SVG has an empty or oversized raster ({width}×{height})")]
    Size { width: u32, height: u32 },
}

/// Largest raster edge accepted for a single icon.
const MAX_RASTER_EDGE: u32 = 4096;

/// An SVG document rasterized into a coverage mask.
///
/// `units` is the document size in SVG user units; renderers use it to size
/// the sprite so one user unit maps to a caller-chosen world scale.
#[derive(Debug, Clone)]
pub struct SvgRaster {
    pub mask: CoverageMask,
    pub units: glam::Vec2,
}

/// Parses `data` and rasterizes it at `pixels_per_unit`.
///
/// Only shape coverage is kept (the alpha channel); fill colors in the
/// document are ignored and replaced by the sprite tint at draw time.
pub fn rasterize_svg(data: &[u8], pixels_per_unit: f32) -> Result<SvgRaster, SvgError> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default())?;
    let size = tree.size();

    let scale = pixels_per_unit.max(0.01);
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;

    if width == 0 || height == 0 || width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
        return Err(SvgError::Size { width, height });
    }

    let mut pixmap =
        tiny_skia::Pixmap::new(width, height).ok_or(SvgError::Size { width, height })?;
    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    let coverage: Vec<u8> = pixmap.pixels().iter().map(|p| p.alpha()).collect();
    let mask = CoverageMask::from_raw(width, height, coverage)
        .ok_or(SvgError::Size { width, height })?;

    Ok(SvgRaster {
        mask,
        units: glam::Vec2::new(size.width(), size.height()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="24" height="24">
        <path d="M0 0H12V12H0Z" fill="currentColor"/>
    </svg>"#;

    #[test]
    fn rasterizes_at_requested_density() {
        let raster = rasterize_svg(SQUARE.as_bytes(), 2.0).expect("valid svg");
        assert_eq!(raster.mask.width(), 48);
        assert_eq!(raster.mask.height(), 48);
        assert_eq!(raster.units, glam::Vec2::new(24.0, 24.0));
    }

    #[test]
    fn coverage_follows_filled_area() {
        let raster = rasterize_svg(SQUARE.as_bytes(), 1.0).expect("valid svg");
        assert_eq!(raster.mask.get(2, 2), Some(255));
        assert_eq!(raster.mask.get(20, 20), Some(0));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = rasterize_svg(b"not an svg", 1.0).unwrap_err();
        assert!(matches!(err, SvgError::Parse(_)));
    }
}
