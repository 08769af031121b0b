//! GetMetadata: small documents for browser clients.

use tracing::{instrument, warn};
use wms_common::{LayerName, LayerRef, WmsError, WmsResult};
use wms_protocol::metadata::{
    calendar_xml, datasets_html, timesteps_html, variable_details_xml, variables_html, FrontPage,
    FrontPageDataset, FrontPageVariable,
};
use wms_protocol::{KvpParams, MetadataItem};

use super::common::{image_formats, provider_error, variable_metadata};
use super::wms::{WmsResponse, WmsService};

#[instrument(skip_all)]
pub(crate) fn get_metadata(service: &WmsService, params: &KvpParams) -> WmsResult<WmsResponse> {
    let item = MetadataItem::from_param(params.get_opt("item"))?;
    let body = match item {
        MetadataItem::FrontPage => front_page(service)?,
        MetadataItem::Datasets => {
            let datasets: Vec<(String, String)> = service
                .registry
                .datasets()
                .iter()
                .map(|d| (d.id.clone(), d.title.clone()))
                .collect();
            datasets_html(&datasets)?
        }
        MetadataItem::Variables => {
            let dataset_id = params.get("dataset")?;
            let dataset = service
                .registry
                .dataset(dataset_id)
                .ok_or_else(|| WmsError::LayerNotDefined(dataset_id.to_string()))?;
            let provider = service.provider.as_ref();
            let variables = provider
                .variables(&dataset.location)
                .map_err(provider_error)?
                .into_iter()
                .map(|id| {
                    let title = provider
                        .variable_metadata(&dataset.location, &id)
                        .map_err(provider_error)?
                        .title;
                    Ok((id, title))
                })
                .collect::<WmsResult<Vec<_>>>()?;
            variables_html(dataset_id, &variables)?
        }
        MetadataItem::VariableDetails => {
            let layer = variable_from_params(service, params)?;
            let metadata = variable_metadata(service, &layer)?;
            variable_details_xml(&layer.name.dataset_id, &metadata)?
        }
        MetadataItem::Calendar => {
            let layer = variable_from_params(service, params)?;
            let metadata = variable_metadata(service, &layer)?;
            let times = metadata.t_axis.map(|t| t.values).unwrap_or_default();
            calendar_xml(
                &layer.name.dataset_id,
                &layer.name.variable_id,
                &times,
                params.get("datetime")?,
            )?
        }
        MetadataItem::Timesteps => {
            let layer = variable_from_params(service, params)?;
            let t_index: usize = params
                .get("tindex")?
                .parse()
                .map_err(|_| WmsError::generic("Invalid integer for TINDEX"))?;
            let metadata = variable_metadata(service, &layer)?;
            match metadata.t_axis {
                Some(t) => timesteps_html(&t.values, t_index)?,
                None => String::new(),
            }
        }
    };
    Ok(WmsResponse::new(item.content_type(), body))
}

/// The variable named by DATASET and VARIABLE.
fn variable_from_params(service: &WmsService, params: &KvpParams) -> WmsResult<LayerRef> {
    let name = LayerName::new(params.get("dataset")?, params.get("variable")?);
    service.registry.lookup_layer(&name, service.provider.as_ref())
}

fn front_page(service: &WmsService) -> WmsResult<String> {
    let provider = service.provider.as_ref();
    let datasets: Vec<FrontPageDataset> = service
        .registry
        .datasets()
        .iter()
        .filter_map(|dataset| {
            let variables = provider
                .variables(&dataset.location)
                .and_then(|ids| {
                    ids.into_iter()
                        .map(|id| {
                            let metadata = provider.variable_metadata(&dataset.location, &id)?;
                            Ok(FrontPageVariable {
                                layer_name: LayerName::new(dataset.id.as_str(), id.as_str())
                                    .to_string(),
                                title: metadata.title,
                                bbox: metadata.bbox,
                                last_time: metadata.t_axis.and_then(|t| t.values.last().copied()),
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()
                });
            match variables {
                Ok(variables) => Some(FrontPageDataset {
                    title: dataset.title.clone(),
                    queryable: dataset.queryable,
                    variables,
                }),
                Err(err) => {
                    warn!(
                        dataset = %dataset.id,
                        error = %err,
                        "Leaving dataset off the front page"
                    );
                    None
                }
            }
        })
        .collect();

    let config = &service.config;
    let formats = image_formats();
    FrontPage {
        title: &config.server.title,
        wms_url: &config.server.url,
        image_formats: &formats,
        allow_feature_info: config.server.allow_feature_info,
        datasets: &datasets,
    }
    .to_html()
}
