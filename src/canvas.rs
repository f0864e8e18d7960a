// ============================================================================
// CANVAS STATE - committed drawing + preview overlay
// ============================================================================

use image::{Rgba, RgbaImage};

use crate::color::{TRANSPARENT, WHITE};
use crate::ops::transform::resize_canvas;

/// One RGBA pixel buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelSurface {
    pixels: RgbaImage,
}

impl PixelSurface {
    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        Self { pixels: RgbaImage::from_pixel(width, height, color) }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.pixels
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }

    /// Reset every pixel to transparent.
    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    pub fn fill(&mut self, color: Rgba<u8>) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color.0);
        }
    }

    /// Bounds-checked read; `None` off-canvas.
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Rgba<u8>> {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return None;
        }
        Some(*self.pixels.get_pixel(x as u32, y as u32))
    }

    /// Bounds-checked write; off-canvas writes are dropped.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>) {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return;
        }
        self.pixels.put_pixel(x as u32, y as u32, color);
    }

    /// Replace the whole buffer, dimensions included.
    pub fn replace(&mut self, pixels: RgbaImage) {
        self.pixels = pixels;
    }

    /// Resize keeping the top-left content; new area gets `fill`.
    pub fn resize_preserving(&mut self, width: u32, height: u32, fill: Rgba<u8>) {
        self.pixels = resize_canvas(&self.pixels, width, height, fill);
    }
}

/// Names one of the two surfaces in a `CanvasState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceId {
    Committed,
    Preview,
}

/// The drawing (`committed`) plus the transient overlay (`preview`).
///
/// Both surfaces always share the same dimensions.
#[derive(Clone, Debug)]
pub struct CanvasState {
    pub committed: PixelSurface,
    pub preview: PixelSurface,
    /// Bumped on every committed-surface change so a host can skip redraws.
    pub generation: u64,
}

impl CanvasState {
    /// White drawing, empty preview. Zero sizes are raised to 1.
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        Self {
            committed: PixelSurface::filled(width, height, WHITE),
            preview: PixelSurface::new(width, height),
            generation: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.committed.width()
    }

    pub fn height(&self) -> u32 {
        self.committed.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.committed.dimensions()
    }

    pub fn surface(&self, id: SurfaceId) -> &PixelSurface {
        match id {
            SurfaceId::Committed => &self.committed,
            SurfaceId::Preview => &self.preview,
        }
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> &mut PixelSurface {
        if id == SurfaceId::Committed {
            self.generation += 1;
        }
        match id {
            SurfaceId::Committed => &mut self.committed,
            SurfaceId::Preview => &mut self.preview,
        }
    }

    pub fn clear_preview(&mut self) {
        self.preview.clear();
    }

    pub fn mark_dirty(&mut self) {
        self.generation += 1;
    }

    /// Resize both surfaces. The drawing keeps its top-left content and grows
    /// with white; the preview is cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        self.committed.resize_preserving(width, height, WHITE);
        self.preview = PixelSurface::new(width, height);
        self.mark_dirty();
    }

    /// Replace the drawing with `pixels` (dimensions included) and clear the
    /// preview at the same size.
    pub fn restore(&mut self, pixels: &RgbaImage) {
        let (w, h) = pixels.dimensions();
        self.committed.replace(pixels.clone());
        self.preview = PixelSurface::new(w, h);
        self.mark_dirty();
    }
}
