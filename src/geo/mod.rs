use serde::Deserialize;
use thiserror::Error;

use crate::config;

/// Earth radius in kilometers, used to convert a linear distance into the
/// angular radius of the search sphere
pub const EARTH_RADIUS_KM: f64 = 6378.0;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Geocoder API key not configured")]
    MissingApiKey,

    #[error("No geocoding result for '{0}'")]
    NoResult(String),

    #[error("Geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid geocoder URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Convert a distance in kilometers to radians on the Earth sphere.
/// Zero distance degenerates to a radius that matches only the exact point.
pub fn angular_radius(distance_km: f64) -> f64 {
    distance_km / EARTH_RADIUS_KM
}

// MapQuest-style response shape; only the fields we read
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    locations: Vec<GeocodeLocation>,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    #[serde(rename = "latLng")]
    lat_lng: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Thin client over the configured geocoding API
pub struct Geocoder {
    client: reqwest::Client,
}

impl Geocoder {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Resolve a postal code (or free-form location) to coordinates
    pub async fn geocode(&self, location: &str) -> Result<Coordinates, GeoError> {
        let geo_config = &config::config().geocoder;
        if geo_config.api_key.is_empty() {
            return Err(GeoError::MissingApiKey);
        }

        let mut endpoint = url::Url::parse(&geo_config.base_url)?;
        endpoint
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push("address");
        endpoint
            .query_pairs_mut()
            .append_pair("key", &geo_config.api_key)
            .append_pair("location", location);

        let response: GeocodeResponse = self
            .client
            .get(endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .results
            .first()
            .and_then(|r| r.locations.first())
            .map(|loc| Coordinates {
                latitude: loc.lat_lng.lat,
                longitude: loc.lat_lng.lng,
            })
            .ok_or_else(|| GeoError::NoResult(location.to_string()))
    }
}

impl Default for Geocoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_degenerates_to_zero_radius() {
        assert_eq!(angular_radius(0.0), 0.0);
    }

    #[test]
    fn radius_is_distance_over_earth_radius() {
        assert!((angular_radius(6378.0) - 1.0).abs() < f64::EPSILON);
        assert!((angular_radius(10.0) - 10.0 / 6378.0).abs() < f64::EPSILON);
    }

    #[test]
    fn response_shape_parses() {
        let body = serde_json::json!({
            "results": [{
                "locations": [{ "latLng": { "lat": 42.35, "lng": -71.05 } }]
            }]
        });
        let parsed: GeocodeResponse = serde_json::from_value(body).unwrap();
        let loc = &parsed.results[0].locations[0].lat_lng;
        assert_eq!(loc.lat, 42.35);
        assert_eq!(loc.lng, -71.05);
    }
}
