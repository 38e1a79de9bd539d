//! Weather lookup for Skycast
//!
//! Resolves place names and device positions to coordinates and fetches
//! current conditions plus a daily forecast from the Open-Meteo API.

pub mod geocode;
pub mod location;
pub mod lookup;
pub mod provider;
pub mod types;
pub mod units;

pub use geocode::{Geocoder, ResolvedPlace};
pub use location::{position_source, FixedPosition, PositionSource, SystemPosition};
pub use lookup::WeatherLookup;
pub use provider::WeatherProvider;
pub use types::*;
