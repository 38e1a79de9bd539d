//! ANSI terminal implementation of [`WeatherView`].

use std::io::Write;

use skycast_weather::{Coordinates, CurrentWeather, DailyForecast, PlaceInfo, TemperatureUnit};

use crate::map::{MapView, ATTRIBUTION};
use crate::view::{forecast_rows, CurrentPanel, Theme, WeatherView};

const RESET: &str = "\x1b[0m";

/// Escape sequences for one theme
#[derive(Debug, Clone, Copy)]
struct Palette {
    title: &'static str,
    text: &'static str,
    muted: &'static str,
    error: &'static str,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                title: "\x1b[1;32m",
                text: "\x1b[30m",
                muted: "\x1b[90m",
                error: "\x1b[31m",
            },
            Theme::Dark => Self {
                title: "\x1b[1;92m",
                text: "\x1b[97m",
                muted: "\x1b[37m",
                error: "\x1b[91m",
            },
        }
    }
}

pub struct TerminalView<W: Write> {
    out: W,
    theme: Theme,
    palette: Palette,
    map: MapView,
    unit_label: String,
    busy: bool,
    current_visible: bool,
    forecast_visible: bool,
    error: Option<String>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W, tile_template: &str) -> Self {
        Self {
            out,
            theme: Theme::default(),
            palette: Palette::for_theme(Theme::default()),
            map: MapView::new(tile_template),
            unit_label: String::new(),
            busy: false,
            current_visible: false,
            forecast_visible: false,
            error: None,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_current_visible(&self) -> bool {
        self.current_visible
    }

    pub fn is_forecast_visible(&self) -> bool {
        self.forecast_visible
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn map(&self) -> &MapView {
        &self.map
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Write a line of plain text in the current palette.
    pub fn print(&mut self, text: &str) {
        let line = format!("{}{}{}", self.palette.text, text, RESET);
        self.emit(&line);
    }

    fn emit(&mut self, block: &str) {
        let result = writeln!(self.out, "{}", block).and_then(|_| self.out.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl<W: Write> WeatherView for TerminalView<W> {
    fn render_current(
        &mut self,
        place: &PlaceInfo,
        weather: &CurrentWeather,
        unit: TemperatureUnit,
    ) {
        let panel = CurrentPanel::new(place, weather, unit);
        let p = self.palette;
        let block = format!(
            "{title}{}{reset}\n{text}  Temperature:  {}\n  Wind Speed:   {}\n  Weather Code: {}{reset}",
            panel.title,
            panel.temperature,
            panel.wind,
            panel.weather_code,
            title = p.title,
            text = p.text,
            reset = RESET,
        );
        self.emit(&block);
        self.current_visible = true;
    }

    fn render_forecast(&mut self, daily: &DailyForecast, unit: TemperatureUnit) {
        let p = self.palette;
        let mut block = format!("{}Forecast{}", p.title, RESET);
        for row in forecast_rows(daily, unit) {
            block.push_str(&format!(
                "\n{}  {}  Max: {:>8}  Min: {:>8}  Code: {}{}",
                p.text, row.date, row.max, row.min, row.weather_code, RESET
            ));
        }
        self.emit(&block);
        self.forecast_visible = true;
    }

    fn render_error(&mut self, message: &str) {
        let line = format!("{}{}{}", self.palette.error, message, RESET);
        self.emit(&line);
        self.error = Some(message.to_string());
        self.current_visible = false;
        self.forecast_visible = false;
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn render_map(&mut self, coords: Coordinates) {
        self.map.center_on(coords);

        let p = self.palette;
        let mut block = format!(
            "{}Map{} {}{:.4}, {:.4} (zoom {})",
            p.title,
            RESET,
            p.text,
            coords.latitude,
            coords.longitude,
            self.map.zoom()
        );
        if let Some(marker) = self.map.marker() {
            block.push_str(&format!(" [{}]", marker.label));
        }
        if let Some(url) = self.map.center_tile_url() {
            block.push_str(&format!("\n  Tile: {}", url));
        }
        block.push_str(&format!("{}\n{}  {}{}", RESET, p.muted, ATTRIBUTION, RESET));
        self.emit(&block);
    }

    fn set_busy(&mut self, busy: bool) {
        if busy && !self.busy {
            let line = format!("{}Loading...{}", self.palette.muted, RESET);
            self.emit(&line);
        }
        self.busy = busy;
    }

    fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.palette = Palette::for_theme(theme);
    }

    fn set_unit_label(&mut self, label: &str) {
        self.unit_label = label.to_string();
    }
}
