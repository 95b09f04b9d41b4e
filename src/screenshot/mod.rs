//! Screenshot rendering and cache.
//!
//! A render serializes the target's markup into an SVG `foreignObject`,
//! hands the SVG to the host [`Rasterizer`], and encodes the bitmap as PNG or
//! JPEG. Renders are kept in a [`ScreenshotCache`] (10 by default, FIFO) and
//! returned to the controller as base64 data URLs.
//!
//! Comparison reports dimension equality and byte identity only.

// ============================================================================
// Imports
// ============================================================================

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::host::Rasterizer;
use crate::identifiers::ScreenshotId;
use crate::store::BoundedStore;
use crate::util::now_ms;

/// Cached renders keyed by id.
pub type ScreenshotCache = BoundedStore<ScreenshotId, Screenshot>;

/// Default JPEG quality.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

// ============================================================================
// Formats
// ============================================================================

/// Requested output format on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenshotFormat {
    /// PNG (default).
    #[default]
    Png,
    /// JPEG.
    Jpeg,
}

/// Image format for screenshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// PNG format (lossless, larger file size).
    #[default]
    Png,
    /// JPEG format with quality (0-100).
    Jpeg(u8),
}

impl ImageFormat {
    /// Creates JPEG format with quality (0-100).
    #[inline]
    #[must_use]
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg(quality.min(100))
    }

    /// Resolves a wire format and optional quality.
    #[must_use]
    pub fn from_request(format: ScreenshotFormat, quality: Option<u8>) -> Self {
        match format {
            ScreenshotFormat::Png => Self::Png,
            ScreenshotFormat::Jpeg => Self::jpeg(quality.unwrap_or(DEFAULT_JPEG_QUALITY)),
        }
    }

    /// Returns the MIME type for this format.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg(_) => "image/jpeg",
        }
    }

    /// Returns the format name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg(_) => "jpeg",
        }
    }
}

// ============================================================================
// Screenshot
// ============================================================================

/// One cached render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// Screenshot id.
    pub id: ScreenshotId,
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Encoding.
    pub format: ImageFormat,
    /// Render time in ms.
    pub timestamp: u64,
    /// Selector rendered, if any.
    pub selector: Option<String>,
    /// `true` for full-page renders.
    pub full_page: bool,
}

impl Screenshot {
    /// Returns the image as a `data:` URL.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            Base64Standard.encode(&self.data)
        )
    }

    /// List entry without pixel data.
    #[must_use]
    pub fn summary(&self) -> ScreenshotSummary {
        ScreenshotSummary {
            id: self.id.clone(),
            width: self.width,
            height: self.height,
            format: self.format.as_str(),
            bytes: self.data.len(),
            timestamp: self.timestamp,
            selector: self.selector.clone(),
            full_page: self.full_page,
        }
    }

    /// Full view including the data URL.
    #[must_use]
    pub fn view(&self) -> ScreenshotView {
        ScreenshotView {
            summary: self.summary(),
            data_url: self.data_url(),
        }
    }
}

/// Screenshot metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotSummary {
    /// Screenshot id.
    pub id: ScreenshotId,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// `png` or `jpeg`.
    pub format: &'static str,
    /// Encoded size.
    pub bytes: usize,
    /// Render time in ms.
    pub timestamp: u64,
    /// Selector rendered.
    pub selector: Option<String>,
    /// `true` for full-page renders.
    pub full_page: bool,
}

/// Screenshot metadata plus image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotView {
    /// Metadata.
    #[serde(flatten)]
    pub summary: ScreenshotSummary,
    /// `data:` URL of the encoded image.
    pub data_url: String,
}

/// Outcome of comparing two renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotComparison {
    /// First render.
    pub first_id: ScreenshotId,
    /// Second render.
    pub second_id: ScreenshotId,
    /// Width and height match.
    pub same_dimensions: bool,
    /// Encoded bytes match exactly.
    pub identical: bool,
    /// First render size `[width, height]`.
    pub first_size: [u32; 2],
    /// Second render size `[width, height]`.
    pub second_size: [u32; 2],
}

/// Compares two renders by dimensions and bytes.
#[must_use]
pub fn compare(first: &Screenshot, second: &Screenshot) -> ScreenshotComparison {
    let same_dimensions = first.width == second.width && first.height == second.height;
    ScreenshotComparison {
        first_id: first.id.clone(),
        second_id: second.id.clone(),
        same_dimensions,
        identical: same_dimensions && first.format == second.format && first.data == second.data,
        first_size: [first.width, first.height],
        second_size: [second.width, second.height],
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// What to render.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Outer markup of the target.
    pub markup: String,
    /// CSS width of the target.
    pub css_width: f64,
    /// CSS height of the target.
    pub css_height: f64,
    /// Device pixel scale.
    pub scale: f64,
    /// Output encoding.
    pub format: ImageFormat,
}

/// Wraps markup in an SVG document of the given CSS size.
#[must_use]
pub fn svg_document(markup: &str, css_width: f64, css_height: f64) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}">"#,
            r#"<foreignObject width="100%" height="100%">"#,
            r#"<div xmlns="http://www.w3.org/1999/xhtml">{markup}</div>"#,
            "</foreignObject></svg>"
        ),
        w = css_width,
        h = css_height,
        markup = markup
    )
}

/// Renders and encodes one target. Returns the bytes and pixel size.
///
/// # Errors
///
/// - [`Error::Render`] if the target has no area
/// - any rasterizer or encoder error
pub fn render(rasterizer: &dyn Rasterizer, request: &RenderRequest) -> Result<(Vec<u8>, u32, u32)> {
    let scale = if request.scale.is_finite() && request.scale > 0.0 {
        request.scale
    } else {
        1.0
    };
    let width = (request.css_width * scale).ceil() as u32;
    let height = (request.css_height * scale).ceil() as u32;
    if width == 0 || height == 0 {
        return Err(Error::render("target has zero dimensions"));
    }

    let svg = svg_document(&request.markup, request.css_width, request.css_height);
    let bitmap = rasterizer.rasterize(&svg, width, height)?;
    let (width, height) = bitmap.dimensions();

    debug!(width, height, format = request.format.as_str(), "Rasterized target");

    Ok((encode(bitmap, request.format)?, width, height))
}

/// Encodes a bitmap.
pub fn encode(bitmap: RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    let image = DynamicImage::ImageRgba8(bitmap);
    let mut output = Cursor::new(Vec::new());

    match format {
        ImageFormat::Png => image.write_to(&mut output, image::ImageFormat::Png)?,
        ImageFormat::Jpeg(quality) => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut output, quality))?;
        }
    }

    Ok(output.into_inner())
}

/// Builds a cache entry.
#[must_use]
pub fn screenshot(
    id: ScreenshotId,
    (data, width, height): (Vec<u8>, u32, u32),
    format: ImageFormat,
    selector: Option<String>,
    full_page: bool,
) -> Screenshot {
    Screenshot {
        id,
        data,
        width,
        height,
        format,
        timestamp: now_ms(),
        selector,
        full_page,
    }
}

// ============================================================================
// Tests
// ============================================================================
