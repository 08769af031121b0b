//! GetFeatureInfo `text/xml` responses.

use crate::xml::{self, text_element, XmlError};

/// The only INFO_FORMAT this server answers with.
pub const INFO_FORMAT: &str = "text/xml";

/// Value of one time step at the queried point.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureValue {
    /// ISO 8601 time; `None` when the variable has no time axis.
    pub time: Option<String>,
    /// `None` for missing data.
    pub value: Option<f32>,
}

/// The point query result: the pixel's lon/lat and one value per time step.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureInfoResponse {
    pub longitude: f64,
    pub latitude: f64,
    pub values: Vec<FeatureValue>,
}

impl FeatureInfoResponse {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            values: Vec::new(),
        }
    }

    pub fn push(&mut self, time: Option<String>, value: Option<f32>) {
        self.values.push(FeatureValue { time, value });
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = xml::document()?;
        writer
            .create_element("FeatureInfoResponse")
            .write_inner_content::<_, quick_xml::Error>(|w| {
                text_element(w, "longitude", &format!("{:.6}", self.longitude))?;
                text_element(w, "latitude", &format!("{:.6}", self.latitude))?;
                for entry in &self.values {
                    w.create_element("FeatureInfo").write_inner_content::<_, quick_xml::Error>(|w| {
                        if let Some(time) = &entry.time {
                            text_element(w, "time", time)?;
                        }
                        let value = match entry.value {
                            Some(v) => v.to_string(),
                            None => "none".to_string(),
                        };
                        text_element(w, "value", &value)
                    })?;
                }
                Ok(())
            })?;
        xml::finish(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_without_time() {
        let mut response = FeatureInfoResponse::new(-12.5, 40.0);
        response.push(None, Some(17.25));
        assert_eq!(
            response.to_xml().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><FeatureInfoResponse><longitude>-12.500000</longitude><latitude>40.000000</latitude><FeatureInfo><value>17.25</value></FeatureInfo></FeatureInfoResponse>"
        );
    }

    #[test]
    fn test_missing_value_with_time() {
        let mut response = FeatureInfoResponse::new(0.0, 0.0);
        response.push(Some("2024-01-01T00:00:00.000Z".into()), None);
        response.push(Some("2024-01-02T00:00:00.000Z".into()), Some(1.0));
        let xml = response.to_xml().unwrap();
        assert!(xml.contains(
            "<FeatureInfo><time>2024-01-01T00:00:00.000Z</time><value>none</value></FeatureInfo>"
        ));
        assert!(xml.contains(
            "<FeatureInfo><time>2024-01-02T00:00:00.000Z</time><value>1</value></FeatureInfo>"
        ));
    }
}
