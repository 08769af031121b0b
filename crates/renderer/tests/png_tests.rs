//! Tests for the indexed PNG/APNG and GIF encoders.
//!
//! Encoded images are taken apart chunk by chunk and decoded with the
//! `image` crate to check that palette indices and alpha survive.

use std::io::Read;

use renderer::palette::{color_table, Rgb};
use renderer::png::{create_apng_indexed, create_png_indexed, PNG_SIGNATURE};
use renderer::{render, ColorScale, ImageFormat, RenderFrame, RenderStyle};

const FILL: f32 = 1.0e20;

// ============================================================================
// Helper functions
// ============================================================================

/// Split a PNG into (type, data) chunks, checking every CRC on the way.
fn chunks(png: &[u8]) -> Vec<([u8; 4], Vec<u8>)> {
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    let mut out = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
        let data = png[pos + 8..pos + 8 + len].to_vec();
        let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
        assert_eq!(crc, crc32fast::hash(&png[pos + 4..pos + 8 + len]));
        out.push((kind, data));
        pos += 12 + len;
    }
    out
}

fn chunk_types(png: &[u8]) -> Vec<String> {
    chunks(png)
        .iter()
        .map(|(kind, _)| String::from_utf8_lossy(kind).into_owned())
        .collect()
}

/// Inflate image data and drop the per-row filter bytes.
fn inflate_indices(compressed: &[u8], width: usize) -> Vec<u8> {
    let mut raw = Vec::new();
    flate2::read::ZlibDecoder::new(compressed)
        .read_to_end(&mut raw)
        .unwrap();
    raw.chunks(width + 1)
        .flat_map(|row| {
            assert_eq!(row[0], 0, "filter byte");
            row[1..].to_vec()
        })
        .collect()
}

fn idat_indices(png: &[u8], width: usize) -> Vec<u8> {
    let data: Vec<u8> = chunks(png)
        .into_iter()
        .filter(|(kind, _)| kind == b"IDAT")
        .flat_map(|(_, data)| data)
        .collect();
    inflate_indices(&data, width)
}

fn opaque_style(scale: ColorScale) -> RenderStyle {
    RenderStyle {
        scale,
        ..RenderStyle::default()
    }
}

// ============================================================================
// Static PNG
// ============================================================================

#[test]
fn test_chunk_layout() {
    let table = color_table(100, false, Rgb::WHITE);
    let png = create_png_indexed(3, 2, &table, &[0, 1, 2, 3, 4, 5]).unwrap();
    assert_eq!(chunk_types(&png), vec!["IHDR", "PLTE", "tRNS", "IDAT", "IEND"]);

    let parts = chunks(&png);
    let ihdr = &parts[0].1;
    assert_eq!(&ihdr[0..4], &3u32.to_be_bytes());
    assert_eq!(&ihdr[4..8], &2u32.to_be_bytes());
    assert_eq!(&ihdr[8..], &[8, 3, 0, 0, 0]);
    assert_eq!(parts[1].1.len(), 768);
    assert_eq!(parts[2].1.len(), 256);
    assert!(parts[4].1.is_empty());
}

#[test]
fn test_index_round_trip_across_scale() {
    let values = vec![-10.0, 0.0, 5.0, 10.0, 20.0, FILL];
    let frame = RenderFrame::new(3, 2, values, FILL);
    let expected = frame.to_indices(0.0, 10.0);
    assert_eq!(expected, vec![1, 2, 129, 255, 1, 0]);

    let png = render(
        &[frame],
        &opaque_style(ColorScale::Fixed { min: 0.0, max: 10.0 }),
        ImageFormat::Png,
    )
    .unwrap();
    assert_eq!(idat_indices(&png, 3), expected);
}

#[test]
fn test_decoder_sees_palette_colours() {
    let frame = RenderFrame::new(2, 1, vec![0.0, FILL], FILL);
    let png = render(
        &[frame],
        &opaque_style(ColorScale::Fixed { min: 0.0, max: 1.0 }),
        ImageFormat::Png,
    )
    .unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (2, 1));
    assert_eq!(img.get_pixel(0, 0).0, [0, 0, 143, 255]);
    assert_eq!(img.get_pixel(1, 0).0[3], 0);
}

#[test]
fn test_all_fill_frame_is_fully_transparent() {
    for transparent in [false, true] {
        let frame = RenderFrame::new(5, 4, vec![FILL; 20], FILL);
        let style = RenderStyle {
            transparent,
            ..RenderStyle::default()
        };
        let png = render(&[frame], &style, ImageFormat::Png).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }
}

#[test]
fn test_transparent_and_bgcolor_are_exclusive() {
    let frame = RenderFrame::new(1, 1, vec![0.5], FILL);

    let translucent = RenderStyle {
        scale: ColorScale::Fixed { min: 0.0, max: 1.0 },
        opacity: 40,
        transparent: true,
        background: Rgb::new(255, 0, 0),
    };
    let png = render(&[frame.clone()], &translucent, ImageFormat::Png).unwrap();
    let pixel = image::load_from_memory(&png).unwrap().to_rgba8().get_pixel(0, 0).0;
    assert_eq!(pixel[3], 102);

    let flat = RenderStyle {
        transparent: false,
        ..translucent
    };
    let png = render(&[frame], &flat, ImageFormat::Png).unwrap();
    let pixel = image::load_from_memory(&png).unwrap().to_rgba8().get_pixel(0, 0).0;
    assert_eq!(pixel[3], 255);
    // 40% of the ramp colour over a red background
    assert!(pixel[0] >= 150);
}

// ============================================================================
// Animation
// ============================================================================

#[test]
fn test_apng_frames() {
    let table = color_table(100, false, Rgb::WHITE);
    let planes = vec![vec![2u8, 3], vec![4, 5], vec![6, 7]];
    let png = create_apng_indexed(2, 1, &table, &planes).unwrap();

    assert_eq!(
        chunk_types(&png),
        vec![
            "IHDR", "acTL", "PLTE", "tRNS", "fcTL", "IDAT", "fcTL", "fdAT", "fcTL", "fdAT", "IEND"
        ]
    );

    let parts = chunks(&png);
    let actl = &parts[1].1;
    assert_eq!(&actl[0..4], &3u32.to_be_bytes());
    assert_eq!(&actl[4..8], &0u32.to_be_bytes());

    // Sequence numbers run 0, 1, 2, ... across fcTL and fdAT
    let sequences: Vec<u32> = parts
        .iter()
        .filter(|(kind, _)| kind == b"fcTL" || kind == b"fdAT")
        .map(|(_, data)| u32::from_be_bytes(data[0..4].try_into().unwrap()))
        .collect();
    assert_eq!(sequences, vec![0, 1, 2, 3, 4]);

    assert_eq!(idat_indices(&png, 2), planes[0]);
    let later: Vec<Vec<u8>> = parts
        .iter()
        .filter(|(kind, _)| kind == b"fdAT")
        .map(|(_, data)| inflate_indices(&data[4..], 2))
        .collect();
    assert_eq!(later, vec![planes[1].clone(), planes[2].clone()]);

    // Plain PNG readers still get the first frame
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), (2, 1));
}

#[test]
fn test_multi_frame_render_picks_animation() {
    let frames = vec![
        RenderFrame::new(2, 2, vec![1.0; 4], FILL).with_label("a"),
        RenderFrame::new(2, 2, vec![2.0; 4], FILL).with_label("b"),
    ];
    let style = RenderStyle::default();

    let png = render(&frames, &style, ImageFormat::Png).unwrap();
    assert!(chunk_types(&png).contains(&"acTL".to_string()));

    let gif = render(&frames, &style, ImageFormat::Gif).unwrap();
    assert_eq!(&gif[0..6], b"GIF89a");
}

#[test]
fn test_mismatched_frames_rejected() {
    let frames = vec![
        RenderFrame::new(2, 2, vec![1.0; 4], FILL),
        RenderFrame::new(1, 2, vec![2.0; 2], FILL),
    ];
    assert!(render(&frames, &RenderStyle::default(), ImageFormat::Png).is_err());
    assert!(render(&[], &RenderStyle::default(), ImageFormat::Png).is_err());
}
