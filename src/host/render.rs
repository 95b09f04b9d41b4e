//! Rasterization of vector images.

use image::RgbaImage;

use crate::error::Result;

/// Rasterizes an SVG document to pixels.
///
/// Screenshots are taken by embedding element markup in an SVG
/// `foreignObject` and handing the result to the host renderer.
pub trait Rasterizer: Send + Sync {
    /// Renders `svg` at `width` x `height` device pixels.
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage>;
}
