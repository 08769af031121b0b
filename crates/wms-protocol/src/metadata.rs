//! Documents for the GetMetadata vendor request used by web clients.
//!
//! Items are the front page, the dataset and variable menus, variable
//! details, a month calendar of available time steps and the time steps
//! of a single day.

use chrono::{DateTime, Datelike, Months, NaiveDate, Timelike, Utc, Weekday};
use wms_common::time::{format_iso8601, from_seconds, parse_iso8601, to_seconds};
use wms_common::{BoundingBox, VariableMetadata, WmsError, WmsResult, WMS_VERSION};

use crate::params::encode_query;
use crate::xml::{self, text_element, XmlResult, XmlWriter};

/// The metadata items a client may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataItem {
    FrontPage,
    Datasets,
    Variables,
    VariableDetails,
    Calendar,
    Timesteps,
}

impl MetadataItem {
    /// Parse ITEM; absent means the front page.
    pub fn from_param(item: Option<&str>) -> WmsResult<Self> {
        match item.unwrap_or("frontpage") {
            "frontpage" => Ok(MetadataItem::FrontPage),
            "datasets" => Ok(MetadataItem::Datasets),
            "variables" => Ok(MetadataItem::Variables),
            "variableDetails" => Ok(MetadataItem::VariableDetails),
            "calendar" => Ok(MetadataItem::Calendar),
            "timesteps" => Ok(MetadataItem::Timesteps),
            other => Err(WmsError::generic(format!(
                "Invalid value for ITEM parameter: {}",
                other
            ))),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            MetadataItem::FrontPage
            | MetadataItem::Datasets
            | MetadataItem::Variables
            | MetadataItem::Timesteps => "text/html",
            MetadataItem::VariableDetails | MetadataItem::Calendar => "text/xml",
        }
    }
}

// ============================================================================
// Front page
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FrontPageVariable {
    pub layer_name: String,
    pub title: String,
    pub bbox: BoundingBox,
    /// Last time step, when the variable has a time axis.
    pub last_time: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrontPageDataset {
    pub title: String,
    pub queryable: bool,
    pub variables: Vec<FrontPageVariable>,
}

/// HTML page with a capabilities link and example GetMap and GetFeatureInfo
/// links for every variable.
#[derive(Debug, Clone)]
pub struct FrontPage<'a> {
    pub title: &'a str,
    pub wms_url: &'a str,
    pub image_formats: &'a [&'a str],
    pub allow_feature_info: bool,
    pub datasets: &'a [FrontPageDataset],
}

impl FrontPage<'_> {
    pub fn to_html(&self) -> WmsResult<String> {
        let mut w = xml::fragment();
        w.create_element("html").write_inner_content::<_, quick_xml::Error>(|w| {
            w.create_element("head")
                .write_inner_content(|w| text_element(w, "title", self.title))?;
            w.create_element("body").write_inner_content(|w| self.write_body(w))?;
            Ok(())
        })
        .map_err(xml::XmlError::from)?;
        Ok(xml::finish(w)?)
    }

    fn write_body(&self, w: &mut XmlWriter) -> XmlResult {
        text_element(w, "h1", self.title)?;
        let capabilities = format!(
            "{}?{}",
            self.wms_url,
            encode_query([("SERVICE", "WMS"), ("REQUEST", "GetCapabilities")])
        );
        w.create_element("p").write_inner_content::<_, quick_xml::Error>(|w| {
            link(w, &capabilities, "Capabilities document")
        })?;
        text_element(w, "h2", "Datasets:")?;

        w.create_element("table")
            .with_attribute(("border", "1"))
            .write_inner_content::<_, quick_xml::Error>(|w| {
                w.create_element("tbody").write_inner_content::<_, quick_xml::Error>(|w| {
                    w.create_element("tr").write_inner_content::<_, quick_xml::Error>(|w| {
                        text_element(w, "th", "Dataset")?;
                        for format in self.image_formats {
                            text_element(w, "th", format)?;
                        }
                        if self.allow_feature_info {
                            text_element(w, "th", "FeatureInfo")?;
                        }
                        Ok(())
                    })?;
                    for dataset in self.datasets {
                        w.create_element("tr")
                            .write_inner_content(|w| self.write_dataset_row(w, dataset))?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        Ok(())
    }

    fn write_dataset_row(&self, w: &mut XmlWriter, dataset: &FrontPageDataset) -> XmlResult {
        text_element(w, "th", &dataset.title)?;
        for format in self.image_formats {
            w.create_element("td").write_inner_content::<_, quick_xml::Error>(|w| {
                for variable in &dataset.variables {
                    link(w, &self.map_url(variable, format), &variable.title)?;
                    w.create_element("br").write_empty()?;
                }
                Ok(())
            })?;
        }
        if self.allow_feature_info {
            w.create_element("td").write_inner_content::<_, quick_xml::Error>(|w| {
                if !dataset.queryable {
                    w.write_event(quick_xml::events::Event::Text(xml::text(
                        "Dataset not queryable",
                    )))?;
                    return Ok(());
                }
                for variable in &dataset.variables {
                    link(w, &self.feature_info_url(variable), &variable.title)?;
                    w.create_element("br").write_empty()?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    fn map_url(&self, variable: &FrontPageVariable, format: &str) -> String {
        let bbox = variable.bbox.to_wms_string();
        let time = variable.last_time.map(wms_common::time::format_seconds);
        let mut pairs = vec![
            ("SERVICE", "WMS"),
            ("REQUEST", "GetMap"),
            ("VERSION", WMS_VERSION),
            ("LAYERS", variable.layer_name.as_str()),
            ("STYLES", ""),
            ("CRS", "CRS:84"),
            ("BBOX", bbox.as_str()),
            ("WIDTH", "256"),
            ("HEIGHT", "256"),
            ("FORMAT", format),
        ];
        if let Some(time) = &time {
            pairs.push(("TIME", time.as_str()));
        }
        format!("{}?{}", self.wms_url, encode_query(pairs))
    }

    fn feature_info_url(&self, variable: &FrontPageVariable) -> String {
        let bbox = variable.bbox.to_wms_string();
        let time = variable.last_time.map(wms_common::time::format_seconds);
        let mut pairs = vec![
            ("SERVICE", "WMS"),
            ("REQUEST", "GetFeatureInfo"),
            ("VERSION", WMS_VERSION),
            ("QUERY_LAYERS", variable.layer_name.as_str()),
            ("CRS", "CRS:84"),
            ("BBOX", bbox.as_str()),
            ("WIDTH", "256"),
            ("HEIGHT", "256"),
            ("INFO_FORMAT", crate::featureinfo::INFO_FORMAT),
            ("I", "128"),
            ("J", "128"),
        ];
        if let Some(time) = &time {
            pairs.push(("TIME", time.as_str()));
        }
        format!("{}?{}", self.wms_url, encode_query(pairs))
    }
}

fn link(w: &mut XmlWriter, href: &str, label: &str) -> XmlResult {
    w.create_element("a")
        .with_attribute(("href", href))
        .write_text_content(xml::text(label))?;
    Ok(())
}

fn script_link(w: &mut XmlWriter, onclick: &str, label: &str) -> XmlResult {
    w.create_element("a")
        .with_attribute(("href", "#"))
        .with_attribute(("onclick", onclick))
        .write_text_content(xml::text(label))?;
    Ok(())
}

// ============================================================================
// Dataset and variable menus
// ============================================================================

/// One `div` per dataset, `(id, title)`, with an empty content slot for
/// its variables.
pub fn datasets_html(datasets: &[(String, String)]) -> WmsResult<String> {
    let mut w = xml::fragment();
    for (id, title) in datasets {
        w.create_element("div")
            .with_attribute(("id", format!("{}Div", id).as_str()))
            .write_inner_content::<_, quick_xml::Error>(|w| {
                w.create_element("div")
                    .with_attribute(("id", id.as_str()))
                    .write_text_content(xml::text(title))?;
                w.create_element("div")
                    .with_attribute(("id", format!("{}Content", id).as_str()))
                    .write_text_content(xml::text(&format!(
                        "Variables in the {} dataset will appear here",
                        title
                    )))?;
                Ok(())
            })
            .map_err(xml::XmlError::from)?;
    }
    Ok(xml::finish(w)?)
}

/// Table of the variables of one dataset, `(id, title)`.
pub fn variables_html(dataset: &str, variables: &[(String, String)]) -> WmsResult<String> {
    let mut w = xml::fragment();
    w.create_element("table")
        .with_attribute(("cellspacing", "0"))
        .write_inner_content::<_, quick_xml::Error>(|w| {
            w.create_element("tbody").write_inner_content::<_, quick_xml::Error>(|w| {
                for (id, title) in variables {
                    let onclick = format!("javascript:variableSelected('{}', '{}')", dataset, id);
                    w.create_element("tr").write_inner_content::<_, quick_xml::Error>(|w| {
                        w.create_element("td")
                            .write_inner_content(|w| script_link(w, &onclick, title))?;
                        Ok(())
                    })?;
                }
                Ok(())
            })?;
            Ok(())
        })
        .map_err(xml::XmlError::from)?;
    Ok(xml::finish(w)?)
}

// ============================================================================
// Variable details
// ============================================================================

/// Units, vertical axis and valid range of one variable.
pub fn variable_details_xml(dataset: &str, metadata: &VariableMetadata) -> WmsResult<String> {
    let mut w = xml::document()?;
    w.create_element("variableDetails")
        .with_attribute(("dataset", dataset))
        .with_attribute(("variable", metadata.title.as_str()))
        .with_attribute(("units", metadata.units.as_str()))
        .write_inner_content::<_, quick_xml::Error>(|w| {
            w.create_element("axes").write_inner_content::<_, quick_xml::Error>(|w| {
                if let Some(z) = metadata.z_axis.as_ref().filter(|z| !z.is_empty()) {
                    w.create_element("axis")
                        .with_attribute(("type", "z"))
                        .with_attribute(("units", z.units.as_str()))
                        .with_attribute(("positive", if z.positive_up { "1" } else { "0" }))
                        .write_inner_content::<_, quick_xml::Error>(|w| {
                            for value in &z.values {
                                text_element(w, "value", &format!("{:.6}", value.abs()))?;
                            }
                            Ok(())
                        })?;
                }
                Ok(())
            })?;
            w.create_element("range").write_inner_content::<_, quick_xml::Error>(|w| {
                text_element(w, "min", &format!("{:.6}", metadata.valid_min))?;
                text_element(w, "max", &format!("{:.6}", metadata.valid_max))
            })?;
            Ok(())
        })
        .map_err(xml::XmlError::from)?;
    Ok(xml::finish(w)?)
}

// ============================================================================
// Calendar and time steps
// ============================================================================

fn pretty_date(dt: &DateTime<Utc>) -> String {
    dt.format("%d %b %Y").to_string()
}

fn to_datetime(seconds: f64) -> WmsResult<DateTime<Utc>> {
    from_seconds(seconds).map_err(|e| WmsError::Internal(e.to_string()))
}

/// Index of the axis value closest to `target`.
pub fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - target).abs().total_cmp(&(*b - target).abs()))
        .map(|(i, _)| i)
}

/// The month calendar around the time step nearest to `datetime`.
///
/// Days with data link to their first time step. An absent time axis yields
/// an empty body.
pub fn calendar_xml(
    dataset: &str,
    variable: &str,
    times: &[f64],
    datetime: &str,
) -> WmsResult<String> {
    let requested = parse_iso8601(datetime)
        .map_err(|_| WmsError::generic(format!("Invalid DATETIME: {}", datetime)))?;
    let Some(nearest) = nearest_index(times, to_seconds(&requested)) else {
        return Ok(String::new());
    };
    let focus = to_datetime(times[nearest])?;
    let days = times
        .iter()
        .map(|&t| to_datetime(t).map(|dt| dt.date_naive()))
        .collect::<WmsResult<Vec<NaiveDate>>>()?;

    let mut w = xml::document()?;
    w.create_element("root")
        .write_inner_content::<_, quick_xml::Error>(|w| {
            text_element(w, "nearestValue", &format_iso8601(&focus))?;
            text_element(w, "prettyNearestValue", &pretty_date(&focus))?;
            text_element(w, "nearestIndex", &nearest.to_string())?;
            w.create_element("calendar").write_inner_content::<_, quick_xml::Error>(|w| {
                w.create_element("table").write_inner_content::<_, quick_xml::Error>(|w| {
                    w.create_element("tbody").write_inner_content::<_, quick_xml::Error>(|w| {
                        write_month(w, dataset, variable, &focus, times, &days)
                    })?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })
        .map_err(xml::XmlError::from)?;
    Ok(xml::finish(w)?)
}

fn shifted(focus: &DateTime<Utc>, months: i32) -> String {
    let moved = if months < 0 {
        focus.checked_sub_months(Months::new(months.unsigned_abs()))
    } else {
        focus.checked_add_months(Months::new(months.unsigned_abs()))
    };
    format_iso8601(&moved.unwrap_or(*focus))
}

fn write_month(
    w: &mut XmlWriter,
    dataset: &str,
    variable: &str,
    focus: &DateTime<Utc>,
    times: &[f64],
    days: &[NaiveDate],
) -> XmlResult {
    let navigate = |months: i32| {
        format!(
            "javascript:setCalendar('{}','{}','{}'); return false",
            dataset,
            variable,
            shifted(focus, months)
        )
    };
    w.create_element("tr").write_inner_content::<_, quick_xml::Error>(|w| {
        w.create_element("td")
            .write_inner_content(|w| script_link(w, &navigate(-12), "<<"))?;
        w.create_element("td")
            .write_inner_content(|w| script_link(w, &navigate(-1), "<"))?;
        w.create_element("td")
            .with_attribute(("colspan", "3"))
            .write_text_content(xml::text(&focus.format("%b %Y").to_string()))?;
        w.create_element("td")
            .write_inner_content(|w| script_link(w, &navigate(1), ">"))?;
        w.create_element("td")
            .write_inner_content(|w| script_link(w, &navigate(12), ">>"))?;
        Ok(())
    })?;
    w.create_element("tr").write_inner_content::<_, quick_xml::Error>(|w| {
        for heading in ["M", "T", "W", "T", "F", "S", "S"] {
            text_element(w, "th", heading)?;
        }
        Ok(())
    })?;

    for week in month_weeks(focus.year(), focus.month()) {
        w.create_element("tr").write_inner_content::<_, quick_xml::Error>(|w| {
            for day in week {
                let Some(day) = day else {
                    w.create_element("td").write_empty()?;
                    continue;
                };
                match days.iter().position(|d| *d == day) {
                    Some(index) => {
                        let onclick = format!(
                            "javascript:getTimesteps('{}','{}','{}','{}','{}'); return false",
                            dataset,
                            variable,
                            index,
                            wms_common::time::format_seconds(times[index]),
                            day.format("%d %b %Y")
                        );
                        w.create_element("td")
                            .with_attribute(("id", format!("t{}", index).as_str()))
                            .write_inner_content::<_, quick_xml::Error>(|w| {
                                script_link(w, &onclick, &day.day().to_string())
                            })?;
                    }
                    None => text_element(w, "td", &day.day().to_string())?,
                }
            }
            Ok(())
        })?;
    }
    Ok(())
}

/// Monday-first weeks of a month; days outside the month are `None`.
pub fn month_weeks(year: i32, month: u32) -> Vec<[Option<NaiveDate>; 7]> {
    let mut weeks = Vec::new();
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return weeks;
    };
    let mut week = [None; 7];
    let mut day = first;
    while day.month() == month {
        let slot = day.weekday().num_days_from_monday() as usize;
        week[slot] = Some(day);
        if day.weekday() == Weekday::Sun {
            weeks.push(week);
            week = [None; 7];
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    if week.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}

/// A `select` of every time step on the same UTC day as `times[t_index]`.
pub fn timesteps_html(times: &[f64], t_index: usize) -> WmsResult<String> {
    let Some(&reference) = times.get(t_index) else {
        return Err(WmsError::generic(format!("Invalid TINDEX: {}", t_index)));
    };
    let day = to_datetime(reference)?.date_naive();
    let steps = times
        .iter()
        .map(|&t| to_datetime(t))
        .collect::<WmsResult<Vec<_>>>()?;

    let mut w = xml::fragment();
    w.create_element("select")
        .with_attribute(("id", "tValues"))
        .with_attribute(("onchange", "javascript:updateMap()"))
        .write_inner_content::<_, quick_xml::Error>(|w| {
            for step in steps.iter().filter(|dt| dt.date_naive() == day) {
                let label = format!("{:02}:{:02}:{:02}", step.hour(), step.minute(), step.second());
                w.create_element("option")
                    .with_attribute(("value", format_iso8601(step).as_str()))
                    .write_text_content(xml::text(&label))?;
            }
            Ok(())
        })
        .map_err(xml::XmlError::from)?;
    Ok(xml::finish(w)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn secs(y: i32, m: u32, d: u32, h: u32) -> f64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp() as f64
    }

    #[test]
    fn test_item_parsing() {
        assert_eq!(MetadataItem::from_param(None).unwrap(), MetadataItem::FrontPage);
        assert_eq!(
            MetadataItem::from_param(Some("variableDetails")).unwrap(),
            MetadataItem::VariableDetails
        );
        assert!(MetadataItem::from_param(Some("bogus")).is_err());
    }

    #[test]
    fn test_month_weeks() {
        // March 2024 starts on a Friday and has 31 days
        let weeks = month_weeks(2024, 3);
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0][4].map(|d| d.day()), Some(1));
        assert!(weeks[0][3].is_none());
        assert_eq!(weeks[4][6].map(|d| d.day()), Some(31));
    }

    #[test]
    fn test_nearest_index() {
        let times = [0.0, 10.0, 20.0];
        assert_eq!(nearest_index(&times, 14.0), Some(1));
        assert_eq!(nearest_index(&times, 16.0), Some(2));
        assert_eq!(nearest_index(&[], 16.0), None);
    }

    #[test]
    fn test_calendar_links_days_with_data() {
        let times = [secs(2024, 3, 4, 0), secs(2024, 3, 4, 12), secs(2024, 3, 9, 0)];
        let xml = calendar_xml("ocean", "sst", &times, "2024-03-08T00:00:00Z").unwrap();
        assert!(xml.contains("<nearestValue>2024-03-09T00:00:00.000Z</nearestValue>"));
        assert!(xml.contains("<prettyNearestValue>09 Mar 2024</prettyNearestValue>"));
        assert!(xml.contains("<nearestIndex>2</nearestIndex>"));
        assert!(xml.contains("<td id=\"t0\">"));
        assert!(xml.contains("<td id=\"t2\">"));
        assert!(!xml.contains("<td id=\"t1\">"));
        assert!(xml.contains("<td>5</td>"));
        assert!(xml.contains("Mar 2024"));
    }

    #[test]
    fn test_calendar_bad_datetime() {
        assert!(calendar_xml("d", "v", &[0.0], "soon").is_err());
        assert_eq!(calendar_xml("d", "v", &[], "2024-01-01").unwrap(), "");
    }

    #[test]
    fn test_timesteps_same_day() {
        let times = [
            secs(2024, 3, 3, 18),
            secs(2024, 3, 4, 0),
            secs(2024, 3, 4, 12),
            secs(2024, 3, 5, 0),
        ];
        let html = timesteps_html(&times, 2).unwrap();
        assert_eq!(
            html,
            "<select id=\"tValues\" onchange=\"javascript:updateMap()\"><option value=\"2024-03-04T00:00:00.000Z\">00:00:00</option><option value=\"2024-03-04T12:00:00.000Z\">12:00:00</option></select>"
        );
        assert!(timesteps_html(&times, 9).is_err());
    }

    #[test]
    fn test_datasets_and_variables() {
        let html = datasets_html(&[("ocean".into(), "Ocean".into())]).unwrap();
        assert!(html.starts_with(
            "<div id=\"oceanDiv\"><div id=\"ocean\">Ocean</div><div id=\"oceanContent\">"
        ));

        let html = variables_html("ocean", &[("sst".into(), "Sea temperature".into())]).unwrap();
        assert!(html.starts_with("<table cellspacing=\"0\"><tbody><tr><td><a href=\"#\""));
        assert!(html.contains(">Sea temperature</a>"));
    }
}
