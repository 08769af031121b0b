//! Rendering of sampled grids into palette-indexed images.
//!
//! Frames of float samples are scaled onto the 256-entry palette and encoded
//! as indexed PNG (APNG when animated) or GIF.

pub mod frame;
pub mod gif;
pub mod palette;
pub mod png;

pub use frame::{auto_scale, ColorScale, RenderFrame};
pub use palette::{color_table, Rgb};

use tracing::debug;

/// Output formats GetMap can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Gif,
}

impl ImageFormat {
    /// Every supported format, in advertising order.
    pub const ALL: [ImageFormat; 2] = [ImageFormat::Png, ImageFormat::Gif];

    /// Parse a MIME type. Matching is exact.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(ImageFormat::Png),
            "image/gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
        }
    }
}

/// Styling shared by every frame of one GetMap request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub scale: ColorScale,
    /// Percentage in 0..=100.
    pub opacity: u8,
    pub transparent: bool,
    pub background: Rgb,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            scale: ColorScale::Auto,
            opacity: 100,
            transparent: false,
            background: Rgb::WHITE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no frames to render")]
    NoFrames,

    #[error("frame holds {actual} samples, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("image encoding failed: {0}")]
    Encode(String),
}

/// Palette indices for every frame, with the scale resolved over all of them.
pub fn index_frames(
    frames: &[RenderFrame],
    scale: ColorScale,
) -> Result<Vec<Vec<u8>>, RenderError> {
    let first = frames.first().ok_or(RenderError::NoFrames)?;
    for frame in frames {
        if frame.width != first.width
            || frame.height != first.height
            || frame.values.len() != frame.width * frame.height
        {
            return Err(RenderError::FrameSize {
                expected: first.width * first.height,
                actual: frame.values.len(),
            });
        }
    }
    let (lo, hi) = scale.resolve(frames);
    debug!(lo, hi, frames = frames.len(), "Resolved colour scale");
    Ok(frames.iter().map(|f| f.to_indices(lo, hi)).collect())
}

/// Render frames to an encoded image.
pub fn render(
    frames: &[RenderFrame],
    style: &RenderStyle,
    format: ImageFormat,
) -> Result<Vec<u8>, RenderError> {
    let planes = index_frames(frames, style.scale)?;
    let (width, height) = (frames[0].width, frames[0].height);
    let table = color_table(style.opacity, style.transparent, style.background);

    let encoded = match (format, planes.as_slice()) {
        (ImageFormat::Png, [single]) => png::create_png_indexed(width, height, &table, single)?,
        (ImageFormat::Png, _) => png::create_apng_indexed(width, height, &table, &planes)?,
        (ImageFormat::Gif, _) => gif::create_gif(width, height, &table, &planes)?,
    };
    debug!(
        width,
        height,
        frames = planes.len(),
        bytes = encoded.len(),
        format = format.mime_type(),
        "Rendered image"
    );
    Ok(encoded)
}
