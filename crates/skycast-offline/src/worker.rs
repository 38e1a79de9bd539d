//! Offline worker: a [`Transport`] interceptor with an install/activate lifecycle.
//!
//! `install` populates the current snapshot with the configured asset list,
//! `activate` deletes every other snapshot, and once active every GET is served
//! from a snapshot when one holds the URL. Misses go to the network and are
//! not written back, so a hit is never refreshed until the snapshot name
//! changes.

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use skycast_core::{AppError, HttpResponse, NetworkError, OfflineConfig, StorageError, Transport};

use crate::store::SnapshotStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Registered,
    Installed,
    Activated,
}

pub struct OfflineWorker<T> {
    inner: T,
    store: SnapshotStore,
    cache_name: String,
    origin: String,
    assets: Vec<String>,
    state: Mutex<WorkerState>,
}

impl<T: Transport> OfflineWorker<T> {
    pub fn new(inner: T, store: SnapshotStore, config: &OfflineConfig) -> Self {
        Self {
            inner,
            store,
            cache_name: config.cache_name.clone(),
            origin: config.origin.trim_end_matches('/').to_string(),
            assets: config.assets.clone(),
            state: Mutex::new(WorkerState::Registered),
        }
    }

    /// Open the snapshot store at `db_path` and wrap `inner`.
    ///
    /// Callers should fall back to `inner` on error; the outcome is logged
    /// either way.
    pub fn register(
        inner: T,
        db_path: &Path,
        config: &OfflineConfig,
    ) -> Result<Self, StorageError> {
        match SnapshotStore::open(db_path) {
            Ok(store) => {
                tracing::info!(
                    "Offline worker registered (cache '{}', store {})",
                    config.cache_name,
                    db_path.display()
                );
                Ok(Self::new(inner, store, config))
            }
            Err(e) => {
                tracing::error!("Offline worker registration failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    fn asset_url(&self, asset: &str) -> String {
        if asset.starts_with('/') {
            format!("{}{}", self.origin, asset)
        } else {
            format!("{}/{}", self.origin, asset)
        }
    }

    /// Fetch every asset and store them under the current snapshot name.
    ///
    /// All-or-nothing: if any asset fails, nothing is stored and the worker
    /// stays registered.
    #[tracing::instrument(skip(self), fields(cache = %self.cache_name))]
    pub async fn install(&self) -> Result<usize, AppError> {
        let mut entries = Vec::with_capacity(self.assets.len());
        for asset in &self.assets {
            let url = self.asset_url(asset);
            let response = self.inner.get(&url).await?.error_for_status()?;
            entries.push((url, response));
        }

        self.store.put_all(&self.cache_name, &entries)?;
        *self.state.lock() = WorkerState::Installed;

        tracing::info!("Installed {} assets into '{}'", entries.len(), self.cache_name);
        Ok(entries.len())
    }

    /// Delete every snapshot except the current one. Returns the removed names.
    pub fn activate(&self) -> Result<Vec<String>, AppError> {
        if self.state() == WorkerState::Registered {
            return Err(AppError::Service(
                "Offline worker must be installed before activation".to_string(),
            ));
        }

        let mut removed = Vec::new();
        for name in self.store.snapshot_names()? {
            if name != self.cache_name && self.store.delete_snapshot(&name)? {
                tracing::info!("Deleting old cache: {}", name);
                removed.push(name);
            }
        }

        *self.state.lock() = WorkerState::Activated;
        Ok(removed)
    }

    /// Run the whole lifecycle.
    pub async fn start(&self) -> Result<(), AppError> {
        self.install().await?;
        self.activate()?;
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Transport for OfflineWorker<T> {
    async fn get(&self, url: &str) -> Result<HttpResponse, NetworkError> {
        if self.state() == WorkerState::Activated {
            match self.store.match_url(url) {
                Ok(Some(response)) => {
                    tracing::debug!("Serving {} from snapshot", url);
                    return Ok(response);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Snapshot lookup failed for {}: {}", url, e),
            }
        }

        self.inner.get(url).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use skycast_core::HttpTransport;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, assets: &[&str]) -> OfflineConfig {
        OfflineConfig {
            enabled: true,
            cache_name: "weather-app-v2".to_string(),
            origin: server.uri(),
            assets: assets.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn worker(config: &OfflineConfig) -> OfflineWorker<HttpTransport> {
        let inner = HttpTransport::new(Duration::from_secs(5)).unwrap();
        OfflineWorker::new(inner, SnapshotStore::in_memory().unwrap(), config)
    }

    async fn mount_asset(server: &MockServer, asset: &str, body: &str, hits: u64) {
        Mock::given(method("GET"))
            .and(path(asset))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(hits)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_install_populates_current_snapshot() {
        let mock_server = MockServer::start().await;
        mount_asset(&mock_server, "/", "<html>", 1).await;
        mount_asset(&mock_server, "/style.css", "body {}", 1).await;

        let worker = worker(&config(&mock_server, &["/", "/style.css"]));
        assert_eq!(worker.state(), WorkerState::Registered);

        let count = worker.install().await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(worker.state(), WorkerState::Installed);
        assert_eq!(worker.store().entry_count("weather-app-v2").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_install_is_all_or_nothing() {
        let mock_server = MockServer::start().await;
        mount_asset(&mock_server, "/", "<html>", 1).await;
        Mock::given(method("GET"))
            .and(path("/missing.js"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let worker = worker(&config(&mock_server, &["/", "/missing.js"]));
        let result = worker.install().await;

        assert!(matches!(result, Err(AppError::Network(_))));
        assert_eq!(worker.state(), WorkerState::Registered);
        assert!(worker.store().snapshot_names().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_removes_old_versions_only() {
        let mock_server = MockServer::start().await;
        mount_asset(&mock_server, "/", "<html>", 1).await;

        let worker = worker(&config(&mock_server, &["/"]));
        let old = HttpResponse::new(200, b"old".to_vec());
        worker.store().put("weather-app-v0", "http://old/a", &old).unwrap();
        worker.store().put("weather-app-v1", "http://old/b", &old).unwrap();

        worker.install().await.unwrap();
        let mut removed = worker.activate().unwrap();
        removed.sort();

        assert_eq!(removed, vec!["weather-app-v0", "weather-app-v1"]);
        assert_eq!(worker.store().snapshot_names().unwrap(), vec!["weather-app-v2"]);
        assert_eq!(worker.store().entry_count("weather-app-v2").unwrap(), 1);
        assert_eq!(worker.state(), WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let mock_server = MockServer::start().await;
        let worker = worker(&config(&mock_server, &["/"]));

        assert!(worker.activate().is_err());
        assert_eq!(worker.state(), WorkerState::Registered);
    }

    #[tokio::test]
    async fn test_hit_is_served_without_network() {
        let mock_server = MockServer::start().await;
        // Only the install fetch reaches the server
        mount_asset(&mock_server, "/index.html", "v1 page", 1).await;

        let config = config(&mock_server, &["/index.html"]);
        let worker = worker(&config);
        worker.start().await.unwrap();

        let url = format!("{}/index.html", mock_server.uri());
        let first = worker.get(&url).await.unwrap();
        let second = worker.get(&url).await.unwrap();

        assert_eq!(first.text(), "v1 page");
        assert_eq!(second.text(), "v1 page");
    }

    #[tokio::test]
    async fn test_miss_passes_through_without_write_back() {
        let mock_server = MockServer::start().await;
        mount_asset(&mock_server, "/", "<html>", 1).await;
        mount_asset(&mock_server, "/v1/forecast", "{}", 2).await;

        let worker = worker(&config(&mock_server, &["/"]));
        worker.start().await.unwrap();

        let url = format!("{}/v1/forecast", mock_server.uri());
        worker.get(&url).await.unwrap();
        worker.get(&url).await.unwrap();

        assert!(worker.store().match_url(&url).unwrap().is_none());
        assert_eq!(worker.store().entry_count("weather-app-v2").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_inactive_worker_passes_through() {
        let mock_server = MockServer::start().await;
        mount_asset(&mock_server, "/", "<html>", 2).await;

        let worker = worker(&config(&mock_server, &["/"]));
        worker.install().await.unwrap();

        // Installed but not yet active: still hits the network
        let response = worker.get(&format!("{}/", mock_server.uri())).await.unwrap();
        assert_eq!(response.text(), "<html>");
    }

    #[tokio::test]
    async fn test_register_opens_store_on_disk() {
        let mock_server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("offline.db");

        let inner = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let worker =
            OfflineWorker::register(inner, &db_path, &config(&mock_server, &["/"])).unwrap();

        assert_eq!(worker.cache_name(), "weather-app-v2");
        assert!(db_path.exists());
    }
}
