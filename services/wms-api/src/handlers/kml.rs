//! GetKML and GetKMLRegion: super-overlay documents for KML clients.

use tracing::instrument;
use wms_common::WmsResult;
use wms_protocol::{KmlDocument, KmlLayer, KmlRegion, KvpParams, KML_CONTENT_TYPE};

use super::common::{lookup_layer, parse_bbox, variable_metadata};
use super::wms::{WmsResponse, WmsService};

#[instrument(skip_all)]
pub(crate) fn get_kml(service: &WmsService, params: &KvpParams) -> WmsResult<WmsResponse> {
    let layers = params
        .get("layers")?
        .split(',')
        .map(|name| {
            let layer = lookup_layer(service, name)?;
            let metadata = variable_metadata(service, &layer)?;
            Ok(KmlLayer {
                name: layer.name.to_string(),
                title: metadata.title,
                abstract_text: metadata.abstract_text,
                bbox: metadata.bbox,
            })
        })
        .collect::<WmsResult<Vec<_>>>()?;

    let server = &service.config.server;
    let document = KmlDocument {
        title: &server.title,
        description: &server.abstract_text,
        wms_url: &server.url,
        layers: &layers,
    };
    Ok(WmsResponse::new(KML_CONTENT_TYPE, document.to_xml()?))
}

#[instrument(skip_all)]
pub(crate) fn get_kml_region(service: &WmsService, params: &KvpParams) -> WmsResult<WmsResponse> {
    let name = params.get("layer")?;
    let dbox = parse_bbox(params.get("dbox")?)?;
    let layer = lookup_layer(service, name)?;
    let layer_name = layer.name.to_string();

    let region = KmlRegion {
        wms_url: &service.config.server.url,
        layer: &layer_name,
        dbox,
        elevation: params.get_opt("elevation"),
        time: params.get_opt("time"),
    };
    Ok(WmsResponse::new(KML_CONTENT_TYPE, region.to_xml()?))
}
