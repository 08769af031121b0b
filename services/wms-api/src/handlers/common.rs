//! Parameter parsing and collaborator calls shared by the operations.

use renderer::{ImageFormat, RenderFrame};
use tracing::error;
use wms_common::{
    BoundingBox, DimensionSelection, Grid, LayerName, LayerRef, ProviderError, VariableMetadata,
    WmsError, WmsResult, FILL_VALUE, WMS_VERSION,
};
use wms_protocol::KvpParams;

use super::wms::WmsService;

pub(crate) fn check_version(params: &KvpParams) -> WmsResult<()> {
    if params.get("version")? != WMS_VERSION {
        return Err(WmsError::generic(format!("VERSION must be {}", WMS_VERSION)));
    }
    Ok(())
}

pub(crate) fn parse_bbox(value: &str) -> WmsResult<BoundingBox> {
    BoundingBox::from_wms_string(value)
        .map_err(|_| WmsError::generic("Invalid bounding box format"))
}

/// WIDTH and HEIGHT, each within `1..=max`.
pub(crate) fn parse_image_size(
    params: &KvpParams,
    service: &WmsService,
) -> WmsResult<(usize, usize)> {
    let invalid = || WmsError::generic("Invalid integer provided for WIDTH or HEIGHT");
    let width: i64 = params.get("width")?.parse().map_err(|_| invalid())?;
    let height: i64 = params.get("height")?.parse().map_err(|_| invalid())?;

    let server = &service.config.server;
    check_extent("width", width, server.max_image_width)?;
    check_extent("height", height, server.max_image_height)?;
    Ok((width as usize, height as usize))
}

fn check_extent(name: &str, value: i64, max: usize) -> WmsResult<()> {
    if value < 1 || value > max as i64 {
        return Err(WmsError::generic(format!(
            "Image {} must be between 1 and {} pixels inclusive",
            name, max
        )));
    }
    Ok(())
}

/// Bounding box, image size and CRS, turned into a grid.
pub(crate) fn parse_grid(params: &KvpParams, service: &WmsService) -> WmsResult<Grid> {
    let bbox = parse_bbox(params.get("bbox")?)?;
    let (width, height) = parse_image_size(params, service)?;
    service.crs.create_grid(params.get("crs")?, &bbox, width, height)
}

pub(crate) fn image_formats() -> Vec<&'static str> {
    ImageFormat::ALL.iter().map(ImageFormat::mime_type).collect()
}

/// Map a provider failure onto the error taxonomy, logging the ones that
/// are the server's fault.
pub(crate) fn provider_error(err: ProviderError) -> WmsError {
    let err = WmsError::from(err);
    if !err.is_client_error() {
        error!(error = %err, "Dataset provider failed");
    }
    err
}

pub(crate) fn lookup_layer(service: &WmsService, name: &str) -> WmsResult<LayerRef> {
    let name = LayerName::parse(name)?;
    service.registry.lookup_layer(&name, service.provider.as_ref())
}

pub(crate) fn variable_metadata(
    service: &WmsService,
    layer: &LayerRef,
) -> WmsResult<VariableMetadata> {
    service
        .provider
        .variable_metadata(&layer.location, &layer.name.variable_id)
        .map_err(provider_error)
}

/// Read one frame per selected time step at a single elevation.
pub(crate) fn read_frames(
    service: &WmsService,
    layer: &LayerRef,
    grid: &Grid,
    times: &DimensionSelection,
    elevation: &DimensionSelection,
) -> WmsResult<Vec<RenderFrame>> {
    let z_value = elevation.entries().first().and_then(|e| e.value);
    let labels = times.time_labels();
    times
        .provider_indices()
        .into_iter()
        .zip(labels)
        .map(|(t_index, label)| {
            let values = service
                .provider
                .read_samples(
                    &layer.location,
                    &layer.name.variable_id,
                    t_index,
                    z_value,
                    grid.lon_values(),
                    grid.lat_values(),
                    FILL_VALUE,
                )
                .map_err(provider_error)?;
            let expected = grid.width() * grid.height();
            if values.len() != expected {
                return Err(WmsError::Internal(format!(
                    "provider returned {} samples for a {}x{} grid",
                    values.len(),
                    grid.width(),
                    grid.height()
                )));
            }
            Ok(RenderFrame::new(grid.width(), grid.height(), values, FILL_VALUE).with_label(label))
        })
        .collect()
}
