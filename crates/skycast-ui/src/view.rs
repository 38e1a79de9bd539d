//! Display surface abstraction.
//!
//! The controller only talks to a [`WeatherView`]; the terminal front end and
//! the test recorder are two implementations. Formatting shared by every
//! surface lives here so they agree on what a panel says.

use skycast_weather::units::from_celsius;
use skycast_weather::{Coordinates, CurrentWeather, DailyForecast, PlaceInfo, TemperatureUnit};

/// Maximum number of forecast days rendered, whatever the service returns.
pub const FORECAST_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_dark_mode(dark: bool) -> Self {
        if dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// `15.0°C`, `59.0°F`
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    format!("{:.1}°{}", from_celsius(celsius, unit), unit.symbol())
}

/// Text of the unit toggle: it names the unit a press switches to.
pub fn unit_toggle_label(unit: TemperatureUnit) -> &'static str {
    match unit {
        TemperatureUnit::Celsius => "Switch to °F",
        TemperatureUnit::Fahrenheit => "Switch to °C",
    }
}

/// Formatted contents of the current-conditions panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPanel {
    pub title: String,
    pub temperature: String,
    pub wind: String,
    pub weather_code: i32,
}

impl CurrentPanel {
    pub fn new(place: &PlaceInfo, weather: &CurrentWeather, unit: TemperatureUnit) -> Self {
        Self {
            title: place.label(),
            temperature: format_temperature(weather.temperature_celsius, unit),
            wind: format!("{} km/h", weather.wind_speed_kph),
            weather_code: weather.weather_code,
        }
    }
}

/// One formatted forecast entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub date: String,
    pub max: String,
    pub min: String,
    pub weather_code: i32,
}

/// The first `FORECAST_WINDOW` aligned entries, in service order.
pub fn forecast_rows(daily: &DailyForecast, unit: TemperatureUnit) -> Vec<ForecastRow> {
    daily
        .days()
        .take(FORECAST_WINDOW)
        .map(|day| ForecastRow {
            date: day.date.to_string(),
            max: format_temperature(day.max_celsius, unit),
            min: format_temperature(day.min_celsius, unit),
            weather_code: day.weather_code,
        })
        .collect()
}

/// A surface the controller paints on.
///
/// Each `render_*` call replaces what the surface showed before for that
/// panel.
pub trait WeatherView {
    fn render_current(
        &mut self,
        place: &PlaceInfo,
        weather: &CurrentWeather,
        unit: TemperatureUnit,
    );

    fn render_forecast(&mut self, daily: &DailyForecast, unit: TemperatureUnit);

    /// Show `message` and hide both the current and forecast panels.
    fn render_error(&mut self, message: &str);

    fn clear_error(&mut self);

    /// Center the map on `coords` with a single marker.
    fn render_map(&mut self, coords: Coordinates);

    /// Busy indicator; action controls are disabled while it is shown.
    fn set_busy(&mut self, busy: bool);

    fn set_theme(&mut self, theme: Theme);

    fn set_unit_label(&mut self, label: &str);
}
