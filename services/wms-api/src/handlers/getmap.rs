//! GetMap: validate, sample, render.

use renderer::{render, ColorScale, ImageFormat, RenderStyle, Rgb};
use tracing::{debug, instrument};
use wms_common::{resolve_elevation, resolve_time, FormatKind, WmsError, WmsResult};
use wms_protocol::{KvpParams, DEFAULT_STYLE};

use super::common::{lookup_layer, parse_bbox, parse_image_size, read_frames, variable_metadata};
use super::wms::{WmsResponse, WmsService};

#[instrument(skip_all)]
pub(crate) fn get_map(service: &WmsService, params: &KvpParams) -> WmsResult<WmsResponse> {
    super::common::check_version(params)?;

    let layers: Vec<&str> = params.get("layers")?.split(',').collect();
    let limit = service.config.server.layer_limit;
    if layers.len() > limit {
        return Err(WmsError::generic(format!(
            "You may only request a maximum of {} layer(s) simultaneously from this server",
            limit
        )));
    }
    let resolved = layers
        .iter()
        .map(|name| lookup_layer(service, name))
        .collect::<WmsResult<Vec<_>>>()?;

    let styles: Vec<&str> = params.get("styles")?.split(',').collect();
    if styles.len() != layers.len() && styles != [""] {
        return Err(WmsError::generic(concat!(
            "You must request exactly one STYLE per layer, ",
            "or use the default style for each layer with STYLES="
        )));
    }
    if let Some(style) = styles.iter().find(|s| !s.is_empty() && **s != DEFAULT_STYLE) {
        return Err(WmsError::StyleNotDefined(style.to_string()));
    }

    let bbox = parse_bbox(params.get("bbox")?)?;
    let (width, height) = parse_image_size(params, service)?;

    let format_name = params.get("format")?;
    let format = ImageFormat::from_mime(format_name)
        .ok_or_else(|| WmsError::invalid_format(FormatKind::Image, format_name))?;

    let grid = service.crs.create_grid(params.get("crs")?, &bbox, width, height)?;

    let transparent = match params.get_or("transparent", "false").to_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => {
            return Err(WmsError::generic(
                "The value of TRANSPARENT must be \"TRUE\" or \"FALSE\"",
            ))
        }
    };
    let background = match params.get_opt("bgcolor") {
        Some(value) => {
            Rgb::from_wms_hex(value).ok_or_else(|| WmsError::generic("Invalid format for BGCOLOR"))?
        }
        None => Rgb::WHITE,
    };
    let requested_scale = params
        .get_opt("scale")
        .map(|value| {
            ColorScale::from_wms_string(value)
                .ok_or_else(|| WmsError::generic(format!("Invalid format for SCALE: {}", value)))
        })
        .transpose()?;
    let opacity = match params.get_opt("opacity") {
        Some(value) => match value.parse::<u8>() {
            Ok(v) if v <= 100 => v,
            _ => {
                return Err(WmsError::generic(
                    "OPACITY must be an integer between 0 and 100 inclusive",
                ))
            }
        },
        None => 100,
    };

    // Only the first layer is drawn; the rest have been validated above.
    let layer = &resolved[0];
    let metadata = variable_metadata(service, layer)?;
    let elevation = resolve_elevation(metadata.z_axis.as_ref(), params.get_opt("elevation"))?;
    let times = resolve_time(metadata.t_axis.as_ref(), params.get_opt("time"))?;

    let scale = requested_scale.unwrap_or_else(|| match metadata.valid_range() {
        Some((min, max)) => ColorScale::Fixed { min, max },
        None => ColorScale::Auto,
    });
    let style = RenderStyle {
        scale,
        opacity,
        transparent,
        background,
    };

    let frames = read_frames(service, layer, &grid, &times, &elevation)?;
    debug!(
        layer = %layer.name,
        crs = grid.crs(),
        width,
        height,
        frames = frames.len(),
        "Rendering map"
    );
    let image = render(&frames, &style, format).map_err(|e| WmsError::Internal(e.to_string()))?;
    Ok(WmsResponse::new(format.mime_type(), image))
}
