use serde::{Deserialize, Serialize};
use skycast_core::NetworkError;

pub use skycast_core::TemperatureUnit;

/// Place name shown when coordinates come from the device
pub const DEVICE_PLACE_NAME: &str = "Your Location";

/// Geographic position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Display name of a resolved place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub name: String,
    pub country: String,
}

impl PlaceInfo {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }

    /// Placeholder used for device positions
    pub fn device() -> Self {
        Self::new(DEVICE_PLACE_NAME, "")
    }

    /// "Name, Country", or just the name when the country is unknown
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Current conditions. Temperatures are always stored in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature_celsius: f64,
    pub wind_speed_kph: f64,
    /// WMO weather code, passed through undecoded
    pub weather_code: i32,
}

/// Daily forecast as parallel series aligned by index, in service order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub dates: Vec<String>,
    pub max_celsius: Vec<f64>,
    pub min_celsius: Vec<f64>,
    pub weather_codes: Vec<i32>,
}

/// One aligned entry of a [`DailyForecast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastDay<'a> {
    pub date: &'a str,
    pub max_celsius: f64,
    pub min_celsius: f64,
    pub weather_code: i32,
}

impl DailyForecast {
    /// Number of complete entries (length of the shortest series)
    pub fn len(&self) -> usize {
        self.dates
            .len()
            .min(self.max_celsius.len())
            .min(self.min_celsius.len())
            .min(self.weather_codes.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aligned entries in source order; never reads past the shortest series.
    pub fn days(&self) -> impl Iterator<Item = ForecastDay<'_>> + '_ {
        self.dates
            .iter()
            .zip(&self.max_celsius)
            .zip(&self.min_celsius)
            .zip(&self.weather_codes)
            .map(|(((date, max), min), code)| ForecastDay {
                date: date.as_str(),
                max_celsius: *max,
                min_celsius: *min,
                weather_code: *code,
            })
    }
}

/// Result of one successful forecast fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub current: CurrentWeather,
    pub daily: DailyForecast,
}

/// Everything a completed lookup hands to the display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub coordinates: Coordinates,
    pub place: PlaceInfo,
    pub current: CurrentWeather,
    pub daily: DailyForecast,
}

impl WeatherReport {
    pub fn new(coordinates: Coordinates, place: PlaceInfo, forecast: Forecast) -> Self {
        Self {
            coordinates,
            place,
            current: forecast.current,
            daily: forecast.daily,
        }
    }
}

/// Device location errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location service unavailable on this platform")]
    Unsupported,
    #[error("Location permission denied")]
    PermissionDenied,
}

/// Lookup errors, covering both the name and the device paths
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Empty search query")]
    EmptyInput,
    #[error("No geocoding results for '{0}'")]
    NotFound(String),
    #[error("Forecast response has no current conditions")]
    DataUnavailable,
    #[error("Network error: {0}")]
    Transport(#[from] NetworkError),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
    /// The lookup task ended without producing a result
    #[error("Lookup aborted: {0}")]
    Aborted(String),
}

impl WeatherError {
    /// Message shown in the error panel
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::EmptyInput => "Please enter a city name.",
            WeatherError::NotFound(_) => "City not found.",
            WeatherError::DataUnavailable => "Weather data unavailable.",
            WeatherError::Transport(e) => e.user_message(),
            WeatherError::Location(LocationError::Unsupported) => "Geolocation not supported.",
            WeatherError::Location(LocationError::PermissionDenied) => "Location access denied.",
            WeatherError::Aborted(_) => "Something went wrong. Please try again.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> DailyForecast {
        DailyForecast {
            dates: (0..n).map(|i| format!("2024-06-{:02}", i + 1)).collect(),
            max_celsius: (0..n).map(|i| 20.0 + i as f64).collect(),
            min_celsius: (0..n).map(|i| 10.0 + i as f64).collect(),
            weather_codes: (0..n).map(|i| i as i32).collect(),
        }
    }

    #[test]
    fn test_days_follow_source_order() {
        let daily = series(3);
        let days: Vec<_> = daily.days().collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date, "2024-06-01");
        assert_eq!(days[2].max_celsius, 22.0);
        assert_eq!(days[2].weather_code, 2);
    }

    #[test]
    fn test_len_is_shortest_series() {
        let mut daily = series(7);
        daily.weather_codes.truncate(4);
        assert_eq!(daily.len(), 4);
        assert_eq!(daily.days().count(), 4);
    }

    #[test]
    fn test_empty_forecast() {
        let daily = DailyForecast::default();
        assert!(daily.is_empty());
        assert_eq!(daily.days().count(), 0);
    }

    #[test]
    fn test_place_label() {
        assert_eq!(PlaceInfo::new("Paris", "France").label(), "Paris, France");
        assert_eq!(PlaceInfo::device().label(), "Your Location");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(WeatherError::EmptyInput.user_message(), "Please enter a city name.");
        assert_eq!(
            WeatherError::NotFound("Atlantis".into()).user_message(),
            "City not found."
        );
        assert_eq!(
            WeatherError::DataUnavailable.user_message(),
            "Weather data unavailable."
        );
        assert_eq!(
            WeatherError::from(LocationError::Unsupported).user_message(),
            "Geolocation not supported."
        );
        assert_eq!(
            WeatherError::from(LocationError::PermissionDenied).user_message(),
            "Location access denied."
        );
        assert_eq!(
            WeatherError::from(NetworkError::Timeout).user_message(),
            "The request timed out. Please try again."
        );
        assert_eq!(
            WeatherError::Aborted("panicked".into()).user_message(),
            "Something went wrong. Please try again."
        );
    }
}
