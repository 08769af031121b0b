//! The fixed 256-entry rendering palette and its per-request color table.
//!
//! Index 0 marks missing data and is always fully transparent. Index 1 marks
//! values outside the colour scale. Indices 2..=255 are the colour ramp.

/// Number of palette entries.
pub const PALETTE_SIZE: usize = 256;

/// Palette slot for missing data.
pub const MISSING_INDEX: u8 = 0;

/// Palette slot for values outside the colour scale.
pub const OUT_OF_RANGE_INDEX: u8 = 1;

/// First palette slot of the colour ramp.
pub const FIRST_RAMP_INDEX: u8 = 2;

/// Rainbow palette running from dark blue (small values) to dark red (large
/// values), after the Scientific Graphics Toolkit.
#[rustfmt::skip]
pub static RAINBOW: [[u8; 3]; PALETTE_SIZE] = [
    [0, 0, 0], [0, 0, 0], [0, 0, 143], [0, 0, 146], [0, 0, 150], [0, 0, 154],
    [0, 0, 158], [0, 0, 162], [0, 0, 166], [0, 0, 170], [0, 0, 174], [0, 0, 178],
    [0, 0, 182], [0, 0, 186], [0, 0, 190], [0, 0, 193], [0, 0, 197], [0, 0, 201],
    [0, 0, 205], [0, 0, 209], [0, 0, 213], [0, 0, 217], [0, 0, 221], [0, 0, 225],
    [0, 0, 229], [0, 0, 233], [0, 0, 237], [0, 0, 241], [0, 0, 244], [0, 0, 248],
    [0, 0, 252], [0, 1, 255], [0, 3, 255], [0, 6, 255], [0, 9, 255], [0, 12, 255],
    [0, 16, 255], [0, 20, 255], [0, 24, 255], [0, 28, 255], [0, 31, 255], [0, 35, 255],
    [0, 39, 255], [0, 43, 255], [0, 47, 255], [0, 51, 255], [0, 55, 255], [0, 59, 255],
    [0, 63, 255], [0, 67, 255], [0, 71, 255], [0, 75, 255], [0, 79, 255], [0, 82, 255],
    [0, 86, 255], [0, 90, 255], [0, 94, 255], [0, 98, 255], [0, 102, 255], [0, 106, 255],
    [0, 110, 255], [0, 114, 255], [0, 118, 255], [0, 122, 255], [0, 126, 255], [0, 130, 255],
    [0, 133, 255], [0, 137, 255], [0, 141, 255], [0, 145, 255], [0, 149, 255], [0, 153, 255],
    [0, 157, 255], [0, 161, 255], [0, 165, 255], [0, 169, 255], [0, 173, 255], [0, 177, 255],
    [0, 180, 255], [0, 184, 255], [0, 188, 255], [0, 192, 255], [0, 196, 255], [0, 200, 255],
    [0, 204, 255], [0, 208, 255], [0, 212, 255], [0, 216, 255], [0, 220, 255], [0, 224, 255],
    [0, 228, 255], [0, 231, 255], [0, 235, 255], [0, 239, 255], [0, 243, 255], [0, 247, 255],
    [0, 251, 254], [1, 252, 252], [3, 253, 250], [5, 254, 248], [7, 255, 246], [11, 255, 242],
    [15, 255, 238], [19, 255, 234], [22, 255, 231], [26, 255, 227], [30, 255, 223], [34, 255, 219],
    [38, 255, 215], [42, 255, 211], [46, 255, 207], [50, 255, 203], [54, 255, 199], [58, 255, 195],
    [62, 255, 191], [66, 255, 187], [69, 255, 184], [73, 255, 180], [77, 255, 176], [81, 255, 172],
    [85, 255, 168], [89, 255, 164], [93, 255, 160], [97, 255, 156], [101, 255, 152], [105, 255, 148],
    [109, 255, 144], [113, 255, 140], [117, 255, 136], [120, 255, 133], [124, 255, 129], [128, 255, 125],
    [132, 255, 121], [136, 255, 117], [140, 255, 113], [144, 255, 109], [148, 255, 105], [152, 255, 101],
    [156, 255, 97], [160, 255, 93], [164, 255, 89], [168, 255, 85], [171, 255, 82], [175, 255, 78],
    [179, 255, 74], [183, 255, 70], [187, 255, 66], [191, 255, 62], [195, 255, 58], [199, 255, 54],
    [203, 255, 50], [207, 255, 46], [211, 255, 42], [215, 255, 38], [218, 255, 35], [222, 255, 31],
    [226, 255, 27], [230, 255, 23], [234, 255, 19], [238, 255, 15], [242, 255, 11], [246, 255, 7],
    [248, 253, 5], [250, 251, 3], [252, 249, 2], [254, 247, 0], [255, 243, 0], [255, 240, 0],
    [255, 236, 0], [255, 232, 0], [255, 228, 0], [255, 224, 0], [255, 220, 0], [255, 216, 0],
    [255, 212, 0], [255, 208, 0], [255, 204, 0], [255, 200, 0], [255, 196, 0], [255, 192, 0],
    [255, 189, 0], [255, 185, 0], [255, 181, 0], [255, 177, 0], [255, 173, 0], [255, 169, 0],
    [255, 165, 0], [255, 161, 0], [255, 157, 0], [255, 153, 0], [255, 149, 0], [255, 145, 0],
    [255, 142, 0], [255, 138, 0], [255, 134, 0], [255, 130, 0], [255, 126, 0], [255, 122, 0],
    [255, 118, 0], [255, 114, 0], [255, 110, 0], [255, 106, 0], [255, 102, 0], [255, 98, 0],
    [255, 94, 0], [255, 91, 0], [255, 87, 0], [255, 83, 0], [255, 79, 0], [255, 75, 0],
    [255, 71, 0], [255, 67, 0], [255, 63, 0], [255, 59, 0], [255, 55, 0], [255, 51, 0],
    [255, 47, 0], [255, 43, 0], [255, 40, 0], [255, 36, 0], [255, 32, 0], [255, 28, 0],
    [255, 24, 0], [255, 20, 0], [255, 16, 0], [255, 12, 0], [255, 8, 0], [253, 6, 0],
    [251, 4, 0], [249, 2, 0], [247, 0, 0], [243, 0, 0], [239, 0, 0], [235, 0, 0],
    [230, 0, 0], [226, 0, 0], [222, 0, 0], [217, 0, 0], [213, 0, 0], [209, 0, 0],
    [205, 0, 0], [200, 0, 0], [196, 0, 0], [191, 0, 0], [187, 0, 0], [183, 0, 0],
    [178, 0, 0], [174, 0, 0], [170, 0, 0], [165, 0, 0], [161, 0, 0], [157, 0, 0],
    [153, 0, 0], [148, 0, 0], [144, 0, 0], [140, 0, 0],
];

/// An RGB colour, used for BGCOLOR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse the WMS `0xRRGGBB` form. The prefix is a lowercase `0x`; the
    /// digits may be either case.
    pub fn from_wms_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix("0x")?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        Some(Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ))
    }
}

/// Build the RGBA colour table for one request.
///
/// With `transparent` set, every non-missing slot keeps its ramp colour and
/// gets alpha `round(opacity / 100 * 255)`; the background is unused.
/// Otherwise every non-missing slot is opaque, with the ramp colour blended
/// over `background` by the opacity, and the missing slot carries the
/// background colour (its alpha stays 0).
pub fn color_table(opacity: u8, transparent: bool, background: Rgb) -> Vec<(u8, u8, u8, u8)> {
    let opacity = f64::from(opacity.min(100)) / 100.0;
    let alpha = (opacity * 255.0).round() as u8;
    let blend =
        |c: u8, bg: u8| (f64::from(c) * opacity + f64::from(bg) * (1.0 - opacity)).round() as u8;

    RAINBOW
        .iter()
        .enumerate()
        .map(|(idx, &[r, g, b])| {
            if idx == MISSING_INDEX as usize {
                (background.r, background.g, background.b, 0)
            } else if transparent {
                (r, g, b, alpha)
            } else {
                (
                    blend(r, background.r),
                    blend(g, background.g),
                    blend(b, background.b),
                    255,
                )
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_endpoints() {
        assert_eq!(RAINBOW[0], [0, 0, 0]);
        assert_eq!(RAINBOW[1], [0, 0, 0]);
        assert_eq!(RAINBOW[2], [0, 0, 143]);
        assert_eq!(RAINBOW[255], [140, 0, 0]);
    }

    #[test]
    fn test_parse_bgcolor() {
        assert_eq!(Rgb::from_wms_hex("0xFFFFFF"), Some(Rgb::WHITE));
        assert_eq!(Rgb::from_wms_hex("0x10a0Ff"), Some(Rgb::new(16, 160, 255)));
        assert_eq!(Rgb::from_wms_hex("FFFFFF"), None);
        assert_eq!(Rgb::from_wms_hex("0xFFFFF"), None);
        assert_eq!(Rgb::from_wms_hex("0xGGGGGG"), None);
        assert_eq!(Rgb::from_wms_hex("0x+FFFFF"), None);
        assert_eq!(Rgb::from_wms_hex("0XFFFFFF"), None);
        assert_eq!(Rgb::from_wms_hex("0x1234567"), None);
    }

    #[test]
    fn test_transparent_table() {
        let table = color_table(50, true, Rgb::new(9, 9, 9));
        assert_eq!(table.len(), PALETTE_SIZE);
        assert_eq!(table[0].3, 0);
        assert!(table[1..].iter().all(|c| c.3 == 128));
        assert_eq!(table[2], (0, 0, 143, 128));
    }

    #[test]
    fn test_opaque_table_blends_over_background() {
        let table = color_table(100, false, Rgb::new(10, 20, 30));
        assert_eq!(table[0], (10, 20, 30, 0));
        assert_eq!(table[2], (0, 0, 143, 255));

        let table = color_table(0, false, Rgb::new(10, 20, 30));
        assert!(table[1..].iter().all(|&c| c == (10, 20, 30, 255)));

        let table = color_table(50, false, Rgb::WHITE);
        assert_eq!(table[255], (198, 128, 128, 255));
    }
}
