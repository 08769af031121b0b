//! GetCapabilities: describe every dataset the provider can open.

use tracing::{instrument, warn};
use wms_common::{DatasetInfo, LayerName, ProviderError, WmsResult};
use wms_protocol::{
    check_update_sequence, CapabilitiesDocument, DatasetEntry, ElevationDimension, KvpParams,
    LayerEntry,
};

use super::common::image_formats;
use super::wms::{WmsResponse, WmsService};

#[instrument(skip_all)]
pub(crate) fn get_capabilities(service: &WmsService, params: &KvpParams) -> WmsResult<WmsResponse> {
    let config = &service.config;
    check_update_sequence(params.get_opt("updatesequence"), &config.last_update)?;

    let datasets: Vec<DatasetEntry> = service
        .registry
        .datasets()
        .iter()
        .filter_map(|dataset| match dataset_entry(service, dataset) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(dataset = %dataset.id, error = %err, "Leaving dataset out of capabilities");
                None
            }
        })
        .collect();

    let service_info = config.service_info();
    let formats = image_formats();
    let document = CapabilitiesDocument {
        service: &service_info,
        update_sequence: config.last_update,
        crs_codes: service.crs.identifiers(),
        image_formats: &formats,
        datasets: &datasets,
    };
    Ok(WmsResponse::xml(document.to_xml()?))
}

fn dataset_entry(
    service: &WmsService,
    dataset: &DatasetInfo,
) -> Result<DatasetEntry, ProviderError> {
    let provider = service.provider.as_ref();
    let layers = provider
        .variables(&dataset.location)?
        .into_iter()
        .map(|variable| {
            let metadata = provider.variable_metadata(&dataset.location, &variable)?;
            Ok(LayerEntry {
                name: LayerName::new(dataset.id.as_str(), variable.as_str()).to_string(),
                title: metadata.title,
                abstract_text: metadata.abstract_text,
                bbox: metadata.bbox,
                queryable: dataset.queryable,
                elevation: metadata.z_axis.map(|z| ElevationDimension {
                    units: z.units,
                    values: z.values,
                }),
                times: metadata.t_axis.map(|t| t.values).unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DatasetEntry {
        title: dataset.title.clone(),
        layers,
    })
}
