use super::SurfaceSize;

/// Axis-aligned rectangle in physical pixels (top-left origin).
///
/// Covers the half-open ranges `[x, x + width) × [y, y + height)`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// The whole surface.
    #[inline]
    pub const fn full(size: SurfaceSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(self) -> u32 {
        self.y + self.height
    }

    #[inline]
    pub fn intersect(self, other: PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        if x1 <= x0 || y1 <= y0 {
            None
        } else {
            Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
        }
    }

    /// Splits the rect into left and right halves that tile it exactly.
    ///
    /// The left half gets `floor(width / 2)` columns; for odd widths the right
    /// half takes the remaining column.
    #[inline]
    pub fn split_halves(self) -> (PixelRect, PixelRect) {
        let left_w = self.width / 2;
        let left = PixelRect::new(self.x, self.y, left_w, self.height);
        let right = PixelRect::new(self.x + left_w, self.y, self.width - left_w, self.height);
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: u32, y: u32, w: u32, h: u32) -> PixelRect { PixelRect::new(x, y, w, h) }

    // ── split_halves ──────────────────────────────────────────────────────

    #[test]
    fn split_even_width_is_exact() {
        let (left, right) = r(0, 0, 1920, 1080).split_halves();
        assert_eq!(left, r(0, 0, 960, 1080));
        assert_eq!(right, r(960, 0, 960, 1080));
    }

    #[test]
    fn split_halves_tile_without_gap_or_overlap() {
        for w in [2u32, 3, 640, 641, 1999] {
            let full = r(0, 0, w, 7);
            let (left, right) = full.split_halves();
            assert_eq!(left.right(), right.x, "gap or overlap at width {w}");
            assert_eq!(left.width + right.width, w);
            assert!(left.intersect(right).is_none());
        }
    }

    #[test]
    fn split_odd_width_gives_extra_column_to_right() {
        let (left, right) = r(0, 0, 5, 1).split_halves();
        assert_eq!(left.width, 2);
        assert_eq!(right.width, 3);
    }

    // ── intersection ──────────────────────────────────────────────────────

    #[test]
    fn intersect_disjoint_is_none() {
        assert!(r(0, 0, 5, 5).intersect(r(5, 0, 5, 5)).is_none());
    }

    #[test]
    fn intersect_overlap() {
        assert_eq!(r(0, 0, 10, 10).intersect(r(5, 5, 10, 10)), Some(r(5, 5, 5, 5)));
    }
}
