//! TIME and ELEVATION resolution.
//!
//! Request values are resolved against a [`VariableAxis`] into an ordered
//! list of axis indices. More than one resolved TIME index means the caller
//! is asking for an animation.

use crate::time::{format_seconds, parse_time_value};
use crate::{Dimension, VariableAxis, WmsError, WmsResult};

/// Time values match when they are within a millisecond.
const TIME_TOLERANCE_SECONDS: f64 = 1e-3;

/// Relative tolerance for elevation matches.
const ELEVATION_TOLERANCE: f64 = 1e-6;

/// One resolved position along an axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionEntry {
    pub index: usize,
    /// Axis value at `index`; `None` for the synthetic entry of an absent axis.
    pub value: Option<f64>,
}

/// Result of resolving a dimension request. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionSelection {
    entries: Vec<DimensionEntry>,
}

impl DimensionSelection {
    /// The single synthetic entry used when a variable has no such axis.
    pub fn synthetic() -> Self {
        Self {
            entries: vec![DimensionEntry {
                index: 0,
                value: None,
            }],
        }
    }

    fn single(axis: &VariableAxis, index: usize) -> Self {
        Self {
            entries: vec![entry(axis, index)],
        }
    }

    pub fn entries(&self) -> &[DimensionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_synthetic(&self) -> bool {
        self.entries.len() == 1 && self.entries[0].value.is_none()
    }

    pub fn is_animation(&self) -> bool {
        self.entries.len() > 1
    }

    /// Axis indices to hand to the provider; `None` for an absent axis.
    pub fn provider_indices(&self) -> Vec<Option<usize>> {
        self.entries
            .iter()
            .map(|e| e.value.map(|_| e.index))
            .collect()
    }

    /// ISO 8601 labels for animation frames. Labels are empty unless there is
    /// more than one frame.
    pub fn time_labels(&self) -> Vec<String> {
        if !self.is_animation() {
            return vec![String::new(); self.entries.len()];
        }
        self.entries
            .iter()
            .map(|e| e.value.map(format_seconds).unwrap_or_default())
            .collect()
    }
}

fn entry(axis: &VariableAxis, index: usize) -> DimensionEntry {
    DimensionEntry {
        index,
        value: axis.values.get(index).copied(),
    }
}

/// Resolve a TIME request against an optional time axis.
pub fn resolve_time(
    axis: Option<&VariableAxis>,
    request: Option<&str>,
) -> WmsResult<DimensionSelection> {
    let axis = match axis {
        Some(axis) if !axis.is_empty() => axis,
        // The request value is ignored when there is nothing to select from.
        _ => return Ok(DimensionSelection::synthetic()),
    };
    let request = request.unwrap_or("");
    if request.is_empty() {
        return Err(WmsError::MissingDimensionValue(Dimension::Time));
    }

    let mut entries = Vec::new();
    for item in request.split(',') {
        let parts: Vec<&str> = item.split('/').collect();
        match parts.as_slice() {
            [value] => entries.push(entry(axis, find_time(axis, value)?)),
            [start, stop] => {
                let first = find_time(axis, start)?;
                let last = find_time(axis, stop)?;
                if first > last {
                    return Err(WmsError::invalid_dimension(Dimension::Time, item));
                }
                entries.extend((first..=last).map(|i| entry(axis, i)));
            }
            [_, _, _] => {
                return Err(WmsError::generic(
                    "Cannot yet handle animations with a specified period",
                ))
            }
            _ => return Err(WmsError::invalid_dimension(Dimension::Time, item)),
        }
    }
    Ok(DimensionSelection { entries })
}

/// Resolve an ELEVATION request against an optional z axis.
pub fn resolve_elevation(
    axis: Option<&VariableAxis>,
    request: Option<&str>,
) -> WmsResult<DimensionSelection> {
    let request = request.unwrap_or("");
    if request.contains(',') || request.contains('/') {
        return Err(WmsError::generic(
            "You may only request a single value of ELEVATION",
        ));
    }
    let axis = match axis {
        Some(axis) if !axis.is_empty() => axis,
        _ => return Ok(DimensionSelection::synthetic()),
    };
    if request.is_empty() {
        return Ok(DimensionSelection::single(axis, 0));
    }

    let invalid = || WmsError::invalid_dimension(Dimension::Elevation, request);
    let target: f64 = request.parse().map_err(|_| invalid())?;
    let index = axis
        .values
        .iter()
        .position(|&z| {
            let scale = z.abs().max(target.abs()).max(1.0);
            (z - target).abs() <= ELEVATION_TOLERANCE * scale
        })
        .ok_or_else(invalid)?;
    Ok(DimensionSelection::single(axis, index))
}

fn find_time(axis: &VariableAxis, value: &str) -> WmsResult<usize> {
    let invalid = || WmsError::invalid_dimension(Dimension::Time, value);
    let target = parse_time_value(value).map_err(|_| invalid())?;
    axis.values
        .iter()
        .position(|&t| (t - target).abs() <= TIME_TOLERANCE_SECONDS)
        .ok_or_else(invalid)
}
