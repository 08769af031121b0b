//! GetFeatureInfo: the data value under one pixel, for every selected time.

use tracing::instrument;
use wms_common::time::format_seconds;
use wms_common::{resolve_elevation, resolve_time, FormatKind, WmsError, WmsResult, FILL_VALUE};
use wms_protocol::exceptions::EXCEPTION_FORMAT;
use wms_protocol::{FeatureInfoResponse, KvpParams, INFO_FORMAT};

use super::common::{check_version, lookup_layer, parse_grid, provider_error, variable_metadata};
use super::wms::{WmsResponse, WmsService};

#[instrument(skip_all)]
pub(crate) fn get_feature_info(service: &WmsService, params: &KvpParams) -> WmsResult<WmsResponse> {
    check_version(params)?;

    let query_layers: Vec<&str> = params.get("query_layers")?.split(',').collect();
    if query_layers.len() != 1 {
        return Err(WmsError::generic(
            "You may only perform GetFeatureInfo on a single layer",
        ));
    }
    let layer = lookup_layer(service, query_layers[0])?;

    let info_format = params.get("info_format")?;
    if info_format != INFO_FORMAT {
        return Err(WmsError::invalid_format(FormatKind::Info, info_format));
    }
    let exceptions = params.get_or("exceptions", EXCEPTION_FORMAT);
    if exceptions != EXCEPTION_FORMAT {
        return Err(WmsError::invalid_format(FormatKind::Exception, exceptions));
    }

    let grid = parse_grid(params, service)?;
    let i = pixel_coordinate(params, "i", grid.width())?;
    let j = pixel_coordinate(params, "j", grid.height())?;

    let feature_count: i64 = params
        .get_or("feature_count", "1")
        .parse()
        .map_err(|_| WmsError::generic("Invalid integer for FEATURE_COUNT"))?;
    if feature_count != 1 {
        return Err(WmsError::generic(
            "Can only provide FeatureInfo for 1 feature per layer",
        ));
    }

    if !layer.queryable {
        return Err(WmsError::LayerNotQueryable(layer.name.to_string()));
    }

    let metadata = variable_metadata(service, &layer)?;
    let elevation = resolve_elevation(metadata.z_axis.as_ref(), params.get_opt("elevation"))?;
    let times = resolve_time(metadata.t_axis.as_ref(), params.get_opt("time"))?;
    let z_value = elevation.entries().first().and_then(|e| e.value);

    let (lon, lat) = grid.lon_lat_at(i, j)?;
    let mut response = FeatureInfoResponse::new(lon, lat);
    for entry in times.entries() {
        let samples = service
            .provider
            .read_samples(
                &layer.location,
                &layer.name.variable_id,
                entry.value.map(|_| entry.index),
                z_value,
                &[lon],
                &[lat],
                FILL_VALUE,
            )
            .map_err(provider_error)?;
        let value = samples
            .first()
            .copied()
            .filter(|v| !v.is_nan() && *v != FILL_VALUE);
        response.push(entry.value.map(format_seconds), value);
    }

    Ok(WmsResponse::xml(response.to_xml()?))
}

/// I or J as an integer inside `0..extent`.
fn pixel_coordinate(params: &KvpParams, name: &str, extent: usize) -> WmsResult<usize> {
    let raw = params.get(name)?;
    match raw.parse::<i64>() {
        Ok(v) if v >= 0 && (v as u64) < extent as u64 => Ok(v as usize),
        _ => Err(WmsError::InvalidPoint(format!(
            "{}={}",
            name.to_uppercase(),
            raw
        ))),
    }
}
