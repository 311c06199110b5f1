/// Drawable surface size in physical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A zero-area surface (minimized window) cannot be configured or drawn to.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}
