use serde::Deserialize;
use skycast_core::Transport;
use tracing::instrument;

use crate::types::{Coordinates, CurrentWeather, DailyForecast, Forecast, WeatherError};

const DAILY_SERIES: &str = "temperature_2m_max,temperature_2m_min,weathercode";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: Option<ApiCurrentWeather>,
    daily: Option<ApiDaily>,
}

#[derive(Debug, Deserialize)]
struct ApiCurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
}

#[derive(Debug, Deserialize)]
struct ApiDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    weathercode: Vec<i32>,
}

/// Open-Meteo forecast client
pub struct WeatherProvider<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> WeatherProvider<T> {
    pub fn new(transport: T, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch current conditions and the daily series for a position.
    ///
    /// The daily series are returned as the service sent them; the display
    /// decides how many days to show.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(&self, coords: Coordinates) -> Result<Forecast, WeatherError> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current_weather=true&daily={}&timezone=auto",
            self.base_url, coords.latitude, coords.longitude, DAILY_SERIES
        );

        let body: ForecastResponse = self.transport.get(&url).await?.error_for_status()?.json()?;

        let current = body.current_weather.ok_or(WeatherError::DataUnavailable)?;
        let daily = body.daily.ok_or(WeatherError::DataUnavailable)?;

        tracing::info!(
            "Fetched forecast: {:.1}°C now, {} daily entries",
            current.temperature,
            daily.time.len()
        );

        Ok(Forecast {
            current: CurrentWeather {
                temperature_celsius: current.temperature,
                wind_speed_kph: current.windspeed,
                weather_code: current.weathercode,
            },
            daily: DailyForecast {
                dates: daily.time,
                max_celsius: daily.temperature_2m_max,
                min_celsius: daily.temperature_2m_min,
                weather_codes: daily.weathercode,
            },
        })
    }
}
