use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};

use crate::raster::CoverageMask;

/// Error returned by [`LabelFont::from_bytes`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("font load error: {0}")]
pub struct FontLoadError(pub String);

/// A single line of text rasterized into a coverage mask.
///
/// Vertical metrics are in pixels measured from the top of the mask:
/// `baseline` is where the pen sat, so `height - baseline` is the descent.
#[derive(Debug, Clone)]
pub struct TextRaster {
    pub mask: CoverageMask,
    pub baseline: u32,
    /// Pixel size the text was laid out at (pixels per em).
    pub px_per_em: f32,
}

impl TextRaster {
    /// Pixels below the baseline.
    #[inline]
    pub fn descent(&self) -> u32 {
        self.mask.height().saturating_sub(self.baseline)
    }
}

/// A parsed TrueType/OpenType font used for world-space labels.
pub struct LabelFont {
    font: fontdue::Font,
}

impl LabelFont {
    /// Parses a TrueType or OpenType font from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        Ok(Self { font })
    }

    /// Lays out `text` on one line at `px_per_em` and rasterizes it.
    ///
    /// The mask height always spans the font's full ascent + descent so labels
    /// with and without descenders share a baseline.
    pub fn rasterize_line(&self, text: &str, px_per_em: f32) -> TextRaster {
        let px = px_per_em.max(1.0);

        let (ascent, descent) = self
            .font
            .horizontal_line_metrics(px)
            .map_or((px * 0.8, -px * 0.2), |m| (m.ascent, m.descent));

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        let glyphs = layout.glyphs();

        // Pen extent after the last glyph, so trailing spacing is preserved.
        let width = glyphs
            .iter()
            .map(|g| {
                let m = self.font.metrics_indexed(g.key.glyph_index, px);
                g.x - m.xmin as f32 + m.advance_width
            })
            .fold(0.0f32, f32::max)
            .ceil()
            .max(1.0) as u32;
        let height = (ascent - descent).ceil().max(1.0) as u32;
        let baseline = ascent.ceil() as u32;

        let mut mask = CoverageMask::new(width, height);
        for g in glyphs {
            if !g.char_data.rasterize() || g.width == 0 || g.height == 0 {
                continue;
            }
            let (metrics, bitmap) = self.font.rasterize_config(g.key);
            let (dx, dy) = (g.x.round() as i32, g.y.round() as i32);
            mask.blit_max(&bitmap, metrics.width, metrics.height, dx, dy);
        }

        TextRaster {
            mask,
            baseline: baseline.min(height),
            px_per_em: px,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_FONT: &[u8] =
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/fonts/Tuffy.ttf"));

    fn test_font() -> LabelFont {
        LabelFont::from_bytes(TEST_FONT).unwrap()
    }

    /// Rows holding any coverage, top to bottom.
    fn inked_rows(mask: &CoverageMask) -> Vec<u32> {
        (0..mask.height())
            .filter(|&y| (0..mask.width()).any(|x| mask.get(x, y).unwrap_or(0) > 0))
            .collect()
    }

    #[test]
    fn line_spans_ascent_and_descent() {
        let font = test_font();
        let m = font.font.horizontal_line_metrics(96.0).unwrap();
        let raster = font.rasterize_line("mail", 96.0);

        assert_eq!(raster.mask.height(), (m.ascent - m.descent).ceil() as u32);
        assert_eq!(raster.baseline, m.ascent.ceil() as u32);
        assert_eq!(raster.px_per_em, 96.0);
        assert!(raster.descent() > 0);
    }

    #[test]
    fn text_without_descenders_ends_at_the_baseline() {
        let raster = test_font().rasterize_line("mail", 96.0);
        let last = *inked_rows(&raster.mask).last().unwrap();
        assert!(
            last + 3 >= raster.baseline && last <= raster.baseline + 2,
            "last inked row {last}, baseline {}",
            raster.baseline
        );
    }

    #[test]
    fn descenders_reach_below_the_baseline() {
        let raster = test_font().rasterize_line("photos", 96.0);
        let last = *inked_rows(&raster.mask).last().unwrap();
        assert!(
            last >= raster.baseline + 10,
            "last inked row {last}, baseline {}",
            raster.baseline
        );
        assert!(last < raster.mask.height());
    }

    #[test]
    fn labels_share_height_and_grow_with_text() {
        let font = test_font();
        let short = font.rasterize_line("mail", 96.0);
        let long = font.rasterize_line("calendar", 96.0);
        assert_eq!(short.mask.height(), long.mask.height());
        assert_eq!(short.baseline, long.baseline);
        assert!(long.mask.width() > short.mask.width());
    }

    #[test]
    fn invalid_bytes_fail_to_load() {
        let err = LabelFont::from_bytes(b"definitely not a font").err().expect("must fail");
        assert!(err.to_string().starts_with("font load error"));
    }

    #[test]
    fn descent_is_height_below_baseline() {
        let raster = TextRaster {
            mask: CoverageMask::new(10, 20),
            baseline: 15,
            px_per_em: 16.0,
        };
        assert_eq!(raster.descent(), 5);
    }
}
