//! Session state and the lookup state machine.
//!
//! `Idle -> Loading -> {Success, Error} -> Idle`. Each search or locate issues
//! a new [`RequestToken`]; only a result carrying the latest token is applied,
//! so when requests overlap the one started last wins.

use skycast_core::Transport;
use skycast_weather::{TemperatureUnit, WeatherError, WeatherLookup, WeatherReport};

use crate::view::{unit_toggle_label, Theme, WeatherView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Everything the session remembers between actions.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub unit: TemperatureUnit,
    pub theme: Theme,
    /// Last successful lookup; cleared when a lookup fails
    pub report: Option<WeatherReport>,
    pub latest_token: u64,
    pub busy: bool,
}

pub struct WeatherController<V> {
    view: V,
    state: AppState,
}

impl<V: WeatherView> WeatherController<V> {
    pub fn new(mut view: V, unit: TemperatureUnit, theme: Theme) -> Self {
        view.set_theme(theme);
        view.set_unit_label(unit_toggle_label(unit));
        Self {
            view,
            state: AppState {
                unit,
                theme,
                ..AppState::default()
            },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Enter `Loading`: issue a fresh token and show the busy indicator.
    pub fn begin_request(&mut self) -> RequestToken {
        self.state.latest_token += 1;
        self.state.busy = true;
        self.view.clear_error();
        self.view.set_busy(true);
        RequestToken(self.state.latest_token)
    }

    /// Apply the outcome of the request identified by `token`.
    ///
    /// Returns false when a newer request has been issued since; the result
    /// is then dropped and nothing changes.
    pub fn finish(
        &mut self,
        token: RequestToken,
        result: Result<WeatherReport, WeatherError>,
    ) -> bool {
        if token.0 != self.state.latest_token {
            tracing::debug!(
                "Dropping stale result for request {} (latest is {})",
                token.0,
                self.state.latest_token
            );
            return false;
        }

        match result {
            Ok(report) => {
                tracing::info!("Showing weather for {}", report.place.label());
                self.view
                    .render_current(&report.place, &report.current, self.state.unit);
                self.view.render_forecast(&report.daily, self.state.unit);
                self.view.render_map(report.coordinates);
                self.state.report = Some(report);
            }
            Err(e) => {
                tracing::warn!("Lookup failed: {}", e);
                self.state.report = None;
                self.view.render_error(e.user_message());
            }
        }

        self.state.busy = false;
        self.view.set_busy(false);
        true
    }

    /// Release the busy indicator for a request that will never report back.
    pub fn release(&mut self, token: RequestToken) {
        if token.0 == self.state.latest_token && self.state.busy {
            self.state.busy = false;
            self.view.set_busy(false);
        }
    }

    /// Flip the display unit and re-render whatever is stored. No fetch.
    pub fn toggle_unit(&mut self) {
        self.state.unit = self.state.unit.toggled();
        self.view.set_unit_label(unit_toggle_label(self.state.unit));

        if let Some(report) = &self.state.report {
            self.view
                .render_current(&report.place, &report.current, self.state.unit);
            self.view.render_forecast(&report.daily, self.state.unit);
        }
    }

    pub fn toggle_dark_mode(&mut self) {
        self.state.theme = self.state.theme.toggled();
        self.view.set_theme(self.state.theme);
    }

    /// Look a place up by name and apply the result.
    pub async fn search<T: Transport>(&mut self, lookup: &WeatherLookup<T>, query: &str) -> bool {
        let token = self.begin_request();
        let result = lookup.by_name(query).await;
        self.finish(token, result)
    }

    /// Look the device position up and apply the result.
    pub async fn locate<T: Transport>(&mut self, lookup: &WeatherLookup<T>) -> bool {
        let token = self.begin_request();
        let result = lookup.by_device().await;
        self.finish(token, result)
    }
}
