/// Row-major 8-bit coverage bitmap (`0` = empty, `255` = fully covered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CoverageMask {
    /// Creates an all-zero mask.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Creates a mask where every texel is fully covered.
    pub fn solid(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![u8::MAX; width as usize * height as usize],
        }
    }

    /// Wraps existing texel data. Returns `None` if the length does not match.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize).then_some(Self { width, height, data })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.width as usize + x as usize).copied()
    }

    /// Composites `src` at `(dx, dy)` using max-coverage, clipping at the edges.
    ///
    /// Max (rather than sum) keeps overlapping glyph edges from saturating.
    pub fn blit_max(&mut self, src: &[u8], src_width: usize, src_height: usize, dx: i32, dy: i32) {
        for sy in 0..src_height {
            let ty = dy + sy as i32;
            if ty < 0 || ty >= self.height as i32 {
                continue;
            }
            for sx in 0..src_width {
                let tx = dx + sx as i32;
                if tx < 0 || tx >= self.width as i32 {
                    continue;
                }
                let Some(&value) = src.get(sy * src_width + sx) else { continue };
                let idx = ty as usize * self.width as usize + tx as usize;
                if let Some(dst) = self.data.get_mut(idx) {
                    *dst = (*dst).max(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_length_mismatch() {
        assert!(CoverageMask::from_raw(2, 2, vec![0; 3]).is_none());
        assert!(CoverageMask::from_raw(2, 2, vec![0; 4]).is_some());
    }

    #[test]
    fn blit_clips_and_keeps_max() {
        let mut mask = CoverageMask::new(3, 3);
        mask.blit_max(&[100, 200, 50, 255], 2, 2, 2, 2);
        assert_eq!(mask.get(2, 2), Some(100));
        assert_eq!(mask.get(1, 1), Some(0));

        mask.blit_max(&[10], 1, 1, 2, 2);
        assert_eq!(mask.get(2, 2), Some(100));
    }

    #[test]
    fn blit_negative_offset_is_clipped() {
        let mut mask = CoverageMask::new(2, 2);
        mask.blit_max(&[1, 2, 3, 4], 2, 2, -1, -1);
        assert_eq!(mask.get(0, 0), Some(4));
        assert_eq!(mask.data().iter().filter(|&&v| v > 0).count(), 1);
    }
}
