//! GIF output through the `image` crate.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};

use crate::png::FRAME_DELAY_MS;
use crate::RenderError;

/// Encode index planes as a GIF. More than one plane becomes a looping
/// animation.
pub fn create_gif(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    frames: &[Vec<u8>],
) -> Result<Vec<u8>, RenderError> {
    if frames.is_empty() {
        return Err(RenderError::NoFrames);
    }

    let images = frames
        .iter()
        .map(|plane| expand_to_rgba(width, height, palette, plane))
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut out);
        if images.len() > 1 {
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| RenderError::Encode(e.to_string()))?;
        }
        let delay = Delay::from_numer_denom_ms(u32::from(FRAME_DELAY_MS), 1);
        encoder
            .encode_frames(
                images
                    .into_iter()
                    .map(|img| Frame::from_parts(img, 0, 0, delay)),
            )
            .map_err(|e| RenderError::Encode(e.to_string()))?;
    }
    Ok(out)
}

fn expand_to_rgba(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
) -> Result<RgbaImage, RenderError> {
    let rgba: Vec<u8> = indices
        .iter()
        .flat_map(|&idx| {
            let (r, g, b, a) = palette.get(idx as usize).copied().unwrap_or((0, 0, 0, 0));
            [r, g, b, a]
        })
        .collect();
    RgbaImage::from_raw(width as u32, height as u32, rgba).ok_or(RenderError::FrameSize {
        expected: width * height,
        actual: indices.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gif_header() {
        let palette: Vec<_> = (0..=255u8).map(|i| (i, 0, 0, 255)).collect();
        let gif = create_gif(2, 1, &palette, &[vec![10, 200]]).unwrap();
        assert_eq!(&gif[0..3], b"GIF");
    }

    #[test]
    fn test_short_plane_rejected() {
        let palette: Vec<_> = (0..=255u8).map(|i| (i, 0, 0, 255)).collect();
        assert!(create_gif(2, 2, &palette, &[vec![1, 2, 3]]).is_err());
    }
}
