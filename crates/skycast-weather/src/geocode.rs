//! Forward geocoding: free-text place name to coordinates.
//! Uses the Open-Meteo geocoding API - free, no API key required.

use serde::Deserialize;
use skycast_core::Transport;
use tracing::instrument;

use crate::types::{Coordinates, PlaceInfo, WeatherError};

#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

/// A place name resolved to a position
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlace {
    pub coordinates: Coordinates,
    pub place: PlaceInfo,
}

pub struct Geocoder<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> Geocoder<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolve a place name. The first candidate wins; there is no disambiguation.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve_by_name(&self, query: &str) -> Result<ResolvedPlace, WeatherError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WeatherError::EmptyInput);
        }

        let url = format!(
            "{}/v1/search?name={}&count=1",
            self.base_url,
            urlencoding::encode(query)
        );

        let body: GeocodingResponse = self.transport.get(&url).await?.error_for_status()?.json()?;

        let first = body
            .results
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::NotFound(query.to_string()))?;

        tracing::info!(
            "Geocoded '{}' to {} ({:.4}, {:.4})",
            query,
            first.name,
            first.latitude,
            first.longitude
        );

        Ok(ResolvedPlace {
            coordinates: Coordinates::new(first.latitude, first.longitude),
            place: PlaceInfo::new(first.name, first.country.unwrap_or_default()),
        })
    }
}
