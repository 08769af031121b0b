//! Mapping sampled values onto palette indices.

use rayon::prelude::*;

use crate::palette::{FIRST_RAMP_INDEX, MISSING_INDEX, OUT_OF_RANGE_INDEX};

/// Rows per rayon task when indexing a frame.
const ROWS_PER_TASK: usize = 16;

/// One image plane of sampled values.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub width: usize,
    pub height: usize,
    /// Row-major, row 0 at the top.
    pub values: Vec<f32>,
    pub fill_value: f32,
    /// Label shown for this frame in an animation; may be empty.
    pub label: String,
}

impl RenderFrame {
    pub fn new(width: usize, height: usize, values: Vec<f32>, fill_value: f32) -> Self {
        Self {
            width,
            height,
            values,
            fill_value,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[inline]
    pub fn is_missing(&self, value: f32) -> bool {
        value.is_nan() || value == self.fill_value
    }

    /// Palette index for every pixel, given the scale `lo..hi`.
    pub fn to_indices(&self, lo: f64, hi: f64) -> Vec<u8> {
        let mut indices = vec![MISSING_INDEX; self.values.len()];
        let chunk = (self.width * ROWS_PER_TASK).max(1);
        indices
            .par_chunks_mut(chunk)
            .zip(self.values.par_chunks(chunk))
            .for_each(|(out, values)| {
                for (idx, &value) in out.iter_mut().zip(values) {
                    *idx = if self.is_missing(value) {
                        MISSING_INDEX
                    } else {
                        scale_to_index(f64::from(value), lo, hi)
                    };
                }
            });
        indices
    }
}

/// Map a value onto the colour ramp; values off the ramp get the
/// out-of-range slot.
pub fn scale_to_index(value: f64, lo: f64, hi: f64) -> u8 {
    let steps = f64::from(u8::MAX - FIRST_RAMP_INDEX);
    let index = ((value - lo) * steps / (hi - lo)).round() + f64::from(FIRST_RAMP_INDEX);
    if index.is_nan() || index < f64::from(FIRST_RAMP_INDEX) || index > f64::from(u8::MAX) {
        OUT_OF_RANGE_INDEX
    } else {
        index as u8
    }
}

/// Requested colour scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorScale {
    /// Fit the scale to the data (WMS `SCALE=0,0`).
    Auto,
    Fixed { min: f64, max: f64 },
}

impl ColorScale {
    /// Parse a SCALE value: `min,max` with `min < max`, or `0,0`.
    pub fn from_wms_string(s: &str) -> Option<Self> {
        let (min, max) = s.split_once(',')?;
        let min: f64 = min.trim().parse().ok()?;
        let max: f64 = max.trim().parse().ok()?;
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        if min == 0.0 && max == 0.0 {
            Some(ColorScale::Auto)
        } else if min < max {
            Some(ColorScale::Fixed { min, max })
        } else {
            None
        }
    }

    /// The concrete `(lo, hi)` bounds for a set of frames.
    pub fn resolve(&self, frames: &[RenderFrame]) -> (f64, f64) {
        match *self {
            ColorScale::Fixed { min, max } => (min, max),
            ColorScale::Auto => auto_scale(frames),
        }
    }
}

/// Min and max over the non-missing values of every frame. Falls back to a
/// unit range when there is no spread.
pub fn auto_scale(frames: &[RenderFrame]) -> (f64, f64) {
    let (lo, hi) = frames
        .iter()
        .flat_map(|frame| {
            frame
                .values
                .iter()
                .filter(move |v| !frame.is_missing(**v))
                .map(|&v| f64::from(v))
        })
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !lo.is_finite() {
        (0.0, 1.0)
    } else if hi <= lo {
        (lo, lo + 1.0)
    } else {
        (lo, hi)
    }
}
