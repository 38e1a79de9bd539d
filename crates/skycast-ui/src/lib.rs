//! Terminal front end for Skycast: display trait, renderer, map and controller.

pub mod controller;
pub mod map;
pub mod services;
pub mod terminal;
pub mod view;

pub use controller::{AppState, RequestToken, WeatherController};
pub use map::{MapView, Tile};
pub use services::{request_weather_fetch, FetchDone, LookupRequest};
pub use terminal::TerminalView;
pub use view::{Theme, WeatherView, FORECAST_WINDOW};
