pub mod weather_service;

pub use weather_service::{request_fetch as request_weather_fetch, FetchDone, LookupRequest};
