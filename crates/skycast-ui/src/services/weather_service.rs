//! Weather backend: lookups run on spawned tasks; results come back over a channel.
//!
//! Several lookups may be in flight at once. Each carries the token it was
//! issued with and the controller decides which result to apply.

use std::sync::Arc;

use skycast_core::Transport;
use skycast_weather::{WeatherError, WeatherLookup, WeatherReport};
use tokio::sync::mpsc::UnboundedSender;

use crate::controller::RequestToken;

/// What to look up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupRequest {
    ByName(String),
    ByDevice,
}

/// Sent on the channel when a lookup completes
#[derive(Debug)]
pub struct FetchDone {
    pub token: RequestToken,
    pub result: Result<WeatherReport, WeatherError>,
}

/// Spawn a lookup on the current runtime.
/// Sends `FetchDone` on the channel when complete, including when the lookup
/// panics. Returns false when no runtime is available and nothing was spawned.
pub fn request_fetch<T>(
    tx: &UnboundedSender<FetchDone>,
    lookup: Arc<WeatherLookup<T>>,
    token: RequestToken,
    request: LookupRequest,
) -> bool
where
    T: Transport + 'static,
{
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!("Cannot start weather lookup without a runtime: {}", e);
            return false;
        }
    };

    let tx = tx.clone();
    let task = runtime.spawn(async move {
        match &request {
            LookupRequest::ByName(query) => lookup.by_name(query).await,
            LookupRequest::ByDevice => lookup.by_device().await,
        }
    });
    runtime.spawn(async move {
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Lookup {} did not complete: {}", token.value(), e);
                Err(WeatherError::Aborted(e.to_string()))
            }
        };
        if tx.send(FetchDone { token, result }).is_err() {
            tracing::debug!("Lookup {} finished after the receiver closed", token.value());
        }
    });
    true
}
