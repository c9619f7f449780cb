//! GeoRSS simple points.

use std::borrow::Cow;

use crate::base::{QName, namespaces};
use crate::model::{Content, Extension, ExtensionKind, ExtensionPoint, ModelError};

/// `georss:point`: `"lat lon"` in decimal degrees.
#[derive(Clone, Debug, Default)]
pub struct GeoRssPoint {
    latitude: f64,
    longitude: f64,
    pending: String,
}

impl GeoRssPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ModelError> {
        check_range("latitude", latitude, 90.0)?;
        check_range("longitude", longitude, 180.0)?;
        Ok(Self {
            latitude,
            longitude,
            pending: String::new(),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl PartialEq for GeoRssPoint {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

fn check_range(axis: &str, value: f64, limit: f64) -> Result<(), ModelError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(ModelError::invalid_content(format!(
            "georss:point {axis} {value} is outside ±{limit}"
        )))
    }
}

impl Extension for GeoRssPoint {
    fn element_name(&self) -> QName {
        Self::qname()
    }

    fn process_text(&mut self, text: &str) -> Result<(), ModelError> {
        self.pending.push_str(text);
        Ok(())
    }

    fn content(&self) -> Vec<Content<'_>> {
        vec![Content::Text(Cow::Owned(format!(
            "{} {}",
            self.latitude, self.longitude
        )))]
    }

    fn process_end(&mut self) -> Result<(), ModelError> {
        let text = std::mem::take(&mut self.pending);
        let mut parts = text.split_whitespace();
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ModelError::invalid_content(format!(
                "georss:point needs 'lat lon', got '{}'",
                text.trim()
            )));
        };
        let parse = |axis: &str, value: &str| {
            value.parse::<f64>().map_err(|_| {
                ModelError::invalid_content(format!("georss:point {axis} '{value}' is not a number"))
            })
        };
        *self = Self::new(parse("latitude", lat)?, parse("longitude", lon)?)?;
        Ok(())
    }
}

impl ExtensionKind for GeoRssPoint {
    const NAMESPACE: &'static str = namespaces::GEORSS;
    const LOCAL_NAME: &'static str = "point";
}

/// The location stored in `point`, if any.
pub fn geo_location(point: &ExtensionPoint) -> Option<(f64, f64)> {
    point
        .extension::<GeoRssPoint>()
        .map(|geo| (geo.latitude(), geo.longitude()))
}

/// Set or clear the location stored in `point`.
///
/// Both coordinates set the point, both `None` removes it; one without the
/// other is rejected.
pub fn set_geo_location(
    point: &mut ExtensionPoint,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ModelError> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => {
            point.set_extension(GeoRssPoint::new(latitude, longitude)?)
        }
        (None, None) => point.remove_extension::<GeoRssPoint>().map(|_| ()),
        _ => Err(ModelError::invalid_content(
            "latitude and longitude must be set together",
        )),
    }
}
