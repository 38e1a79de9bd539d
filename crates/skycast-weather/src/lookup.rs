//! The two lookup chains: name -> coordinates -> forecast, and
//! device -> coordinates -> forecast. Each step waits on the previous one.

use skycast_core::{Config, Transport};

use crate::geocode::Geocoder;
use crate::location::{position_source, PositionSource};
use crate::provider::WeatherProvider;
use crate::types::{PlaceInfo, WeatherError, WeatherReport};

pub struct WeatherLookup<T> {
    geocoder: Geocoder<T>,
    provider: WeatherProvider<T>,
    position: Box<dyn PositionSource>,
}

impl<T: Transport> WeatherLookup<T> {
    pub fn new(
        geocoder: Geocoder<T>,
        provider: WeatherProvider<T>,
        position: Box<dyn PositionSource>,
    ) -> Self {
        Self {
            geocoder,
            provider,
            position,
        }
    }

    /// Resolve a place name, then fetch its forecast.
    pub async fn by_name(&self, query: &str) -> Result<WeatherReport, WeatherError> {
        let resolved = self.geocoder.resolve_by_name(query).await?;
        let forecast = self.provider.fetch(resolved.coordinates).await?;
        Ok(WeatherReport::new(
            resolved.coordinates,
            resolved.place,
            forecast,
        ))
    }

    /// Ask the device where it is, then fetch the forecast there.
    pub async fn by_device(&self) -> Result<WeatherReport, WeatherError> {
        let coordinates = self.position.current_position().await?;
        let forecast = self.provider.fetch(coordinates).await?;
        Ok(WeatherReport::new(coordinates, PlaceInfo::device(), forecast))
    }
}

impl<T: Transport + Clone> WeatherLookup<T> {
    /// Build a lookup whose requests all go through `transport`.
    pub fn from_config(config: &Config, transport: T) -> Self {
        Self::new(
            Geocoder::new(transport.clone(), &config.endpoints.geocoding_url),
            WeatherProvider::new(transport, &config.endpoints.forecast_url),
            position_source(&config.location),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::location::FixedPosition;
    use crate::types::{Coordinates, LocationError};
    use async_trait::async_trait;
    use skycast_core::HttpTransport;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct DeniedPosition;

    #[async_trait]
    impl PositionSource for DeniedPosition {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    fn lookup(
        server: &MockServer,
        position: Box<dyn PositionSource>,
    ) -> WeatherLookup<Arc<HttpTransport>> {
        let transport = Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap());
        WeatherLookup::new(
            Geocoder::new(transport.clone(), &server.uri()),
            WeatherProvider::new(transport, &server.uri()),
            position,
        )
    }

    fn forecast_body() -> serde_json::Value {
        serde_json::json!({
            "current_weather": {"temperature": 15.0, "windspeed": 8.0, "weathercode": 1},
            "daily": {
                "time": ["2024-06-01"],
                "temperature_2m_max": [20.0],
                "temperature_2m_min": [10.0],
                "weathercode": [1]
            }
        })
    }

    #[tokio::test]
    async fn test_by_name_chains_geocode_then_forecast() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"name": "Paris", "country": "France", "latitude": 48.8566, "longitude": 2.3522}]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .mount(&mock_server)
            .await;

        let report = lookup(&mock_server, Box::new(DeniedPosition))
            .by_name("Paris")
            .await
            .unwrap();

        assert_eq!(report.place.label(), "Paris, France");
        assert_eq!(report.coordinates, Coordinates::new(48.8566, 2.3522));
        assert_eq!(report.current.temperature_celsius, 15.0);
    }

    #[tokio::test]
    async fn test_not_found_skips_forecast_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = lookup(&mock_server, Box::new(DeniedPosition))
            .by_name("Atlantis")
            .await;
        assert!(matches!(result, Err(WeatherError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_by_device_uses_placeholder_place() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let position = FixedPosition(Coordinates::new(40.0, -3.7));
        let report = lookup(&mock_server, Box::new(position))
            .by_device()
            .await
            .unwrap();

        assert_eq!(report.place, PlaceInfo::device());
        assert_eq!(report.coordinates, Coordinates::new(40.0, -3.7));
    }

    #[tokio::test]
    async fn test_denied_position_makes_no_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let result = lookup(&mock_server, Box::new(DeniedPosition)).by_device().await;
        assert!(matches!(
            result,
            Err(WeatherError::Location(LocationError::PermissionDenied))
        ));
    }
}
