//! Indexed PNG encoding.
//!
//! Every image is colour type 3 with a full 256-entry PLTE and tRNS, so the
//! palette index of each pixel survives a decode unchanged. More than one
//! frame is written as an APNG that loops forever.

use std::io::Write;

use crate::RenderError;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Animation frame delay, in milliseconds.
pub const FRAME_DELAY_MS: u16 = 150;

/// Create an indexed PNG (color type 3) from palette and indices.
///
/// `palette` holds one RGBA entry per index; its alpha values go to tRNS.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
) -> Result<Vec<u8>, RenderError> {
    check_plane(width, height, indices)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_header(&mut png, width, height, palette);

    let idat_data = deflate_idat_indexed(indices, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Create an animated indexed PNG, one plane of indices per frame.
pub fn create_apng_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    frames: &[Vec<u8>],
) -> Result<Vec<u8>, RenderError> {
    if frames.is_empty() {
        return Err(RenderError::NoFrames);
    }
    for plane in frames {
        check_plane(width, height, plane)?;
    }

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    write_chunk_ihdr(&mut png, width, height);

    // acTL: frame count, then play count (0 = forever)
    let mut actl = Vec::with_capacity(8);
    actl.extend_from_slice(&(frames.len() as u32).to_be_bytes());
    actl.extend_from_slice(&0u32.to_be_bytes());
    write_chunk(&mut png, b"acTL", &actl);

    write_palette(&mut png, palette);

    let mut sequence = 0u32;
    for (n, plane) in frames.iter().enumerate() {
        write_chunk(&mut png, b"fcTL", &frame_control(sequence, width, height));
        sequence += 1;

        let compressed = deflate_idat_indexed(plane, width, height)?;
        if n == 0 {
            write_chunk(&mut png, b"IDAT", &compressed);
        } else {
            let mut fdat = Vec::with_capacity(4 + compressed.len());
            fdat.extend_from_slice(&sequence.to_be_bytes());
            fdat.extend_from_slice(&compressed);
            write_chunk(&mut png, b"fdAT", &fdat);
            sequence += 1;
        }
    }

    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_plane(width: usize, height: usize, indices: &[u8]) -> Result<(), RenderError> {
    if width == 0 || height == 0 || indices.len() != width * height {
        return Err(RenderError::FrameSize {
            expected: width * height,
            actual: indices.len(),
        });
    }
    Ok(())
}

fn write_header(png: &mut Vec<u8>, width: usize, height: usize, palette: &[(u8, u8, u8, u8)]) {
    write_chunk_ihdr(png, width, height);
    write_palette(png, palette);
}

fn write_chunk_ihdr(png: &mut Vec<u8>, width: usize, height: usize) {
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth (8 bits per palette index)
    ihdr_data.push(3); // color type 3 = indexed
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(png, b"IHDR", &ihdr_data);
}

/// PLTE followed by tRNS, always written in full.
fn write_palette(png: &mut Vec<u8>, palette: &[(u8, u8, u8, u8)]) {
    let plte_data: Vec<u8> = palette
        .iter()
        .flat_map(|&(r, g, b, _)| [r, g, b])
        .collect();
    write_chunk(png, b"PLTE", &plte_data);

    let trns_data: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
    write_chunk(png, b"tRNS", &trns_data);
}

/// fcTL payload for a full-size frame that replaces the previous one.
fn frame_control(sequence: u32, width: usize, height: usize) -> Vec<u8> {
    let mut fctl = Vec::with_capacity(26);
    fctl.extend_from_slice(&sequence.to_be_bytes());
    fctl.extend_from_slice(&(width as u32).to_be_bytes());
    fctl.extend_from_slice(&(height as u32).to_be_bytes());
    fctl.extend_from_slice(&0u32.to_be_bytes()); // x offset
    fctl.extend_from_slice(&0u32.to_be_bytes()); // y offset
    fctl.extend_from_slice(&FRAME_DELAY_MS.to_be_bytes()); // delay numerator
    fctl.extend_from_slice(&1000u16.to_be_bytes()); // delay denominator
    fctl.push(0); // dispose op: none
    fctl.push(0); // blend op: source
    fctl
}

/// Deflate indexed image data for IDAT chunk.
fn deflate_idat_indexed(
    indices: &[u8],
    width: usize,
    height: usize,
) -> Result<Vec<u8>, RenderError> {
    // Each row is: filter_byte + width index bytes
    let mut uncompressed = Vec::with_capacity(height * (1 + width));
    for row in indices.chunks_exact(width).take(height) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    // CRC covers the type and the data
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
