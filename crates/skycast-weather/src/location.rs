//! Device position: a single one-shot request, never a continuous watch.

use async_trait::async_trait;
use skycast_core::LocationConfig;

use crate::types::{Coordinates, LocationError};

/// Something that can report where the device is.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Resolve the current position exactly once.
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// A position configured by the user
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

#[async_trait]
impl PositionSource for FixedPosition {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// The platform location service (GeoClue2 on Linux)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPosition;

#[async_trait]
impl PositionSource for SystemPosition {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        #[cfg(target_os = "linux")]
        {
            geoclue::current_position().await
        }
        #[cfg(not(target_os = "linux"))]
        {
            Err(LocationError::Unsupported)
        }
    }
}

/// Pick the position source for a configuration: a fixed position wins over
/// the platform service.
pub fn position_source(config: &LocationConfig) -> Box<dyn PositionSource> {
    match config.fixed_position() {
        Some((lat, lon)) => {
            tracing::info!("Using fixed position {:.4}, {:.4}", lat, lon);
            Box::new(FixedPosition(Coordinates::new(lat, lon)))
        }
        None => Box::new(SystemPosition),
    }
}

#[cfg(target_os = "linux")]
mod geoclue {
    use std::time::Duration;

    use futures::StreamExt;
    use zbus::zvariant::OwnedObjectPath;
    use zbus::Connection;

    use crate::types::{Coordinates, LocationError};

    const DESKTOP_ID: &str = "skycast";
    /// GeoClue accuracy level "city"
    const ACCURACY_CITY: u32 = 4;
    const FIX_TIMEOUT: Duration = Duration::from_secs(30);

    #[zbus::proxy(
        interface = "org.freedesktop.GeoClue2.Manager",
        default_service = "org.freedesktop.GeoClue2",
        default_path = "/org/freedesktop/GeoClue2/Manager"
    )]
    trait Manager {
        fn get_client(&self) -> zbus::Result<OwnedObjectPath>;
    }

    #[zbus::proxy(
        interface = "org.freedesktop.GeoClue2.Client",
        default_service = "org.freedesktop.GeoClue2"
    )]
    trait Client {
        fn start(&self) -> zbus::Result<()>;

        fn stop(&self) -> zbus::Result<()>;

        #[zbus(property)]
        fn set_desktop_id(&self, id: &str) -> zbus::Result<()>;

        #[zbus(property)]
        fn set_requested_accuracy_level(&self, level: u32) -> zbus::Result<()>;

        #[zbus(property)]
        fn location(&self) -> zbus::Result<OwnedObjectPath>;

        #[zbus(signal)]
        fn location_updated(
            &self,
            old: zbus::zvariant::ObjectPath<'_>,
            new: zbus::zvariant::ObjectPath<'_>,
        ) -> zbus::Result<()>;
    }

    #[zbus::proxy(
        interface = "org.freedesktop.GeoClue2.Location",
        default_service = "org.freedesktop.GeoClue2"
    )]
    trait Location {
        #[zbus(property)]
        fn latitude(&self) -> zbus::Result<f64>;

        #[zbus(property)]
        fn longitude(&self) -> zbus::Result<f64>;
    }

    const ACCESS_DENIED: &str = "org.freedesktop.DBus.Error.AccessDenied";

    /// Map a D-Bus failure to the location taxonomy. Anything that is not an
    /// explicit denial becomes `fallback`.
    pub(super) fn classify(err: zbus::Error, fallback: LocationError) -> LocationError {
        tracing::debug!("GeoClue error: {}", err);
        let denied = match &err {
            zbus::Error::MethodError(name, _, _) => name.as_str() == ACCESS_DENIED,
            zbus::Error::FDO(e) => matches!(**e, zbus::fdo::Error::AccessDenied(_)),
            _ => false,
        };
        if denied {
            LocationError::PermissionDenied
        } else {
            fallback
        }
    }

    pub(super) async fn current_position() -> Result<Coordinates, LocationError> {
        let conn = Connection::system()
            .await
            .map_err(|e| classify(e, LocationError::Unsupported))?;

        let manager = ManagerProxy::new(&conn)
            .await
            .map_err(|e| classify(e, LocationError::Unsupported))?;
        let client_path = manager
            .get_client()
            .await
            .map_err(|e| classify(e, LocationError::Unsupported))?;

        let client = ClientProxy::builder(&conn)
            .path(client_path)
            .map_err(|e| classify(e, LocationError::Unsupported))?
            .build()
            .await
            .map_err(|e| classify(e, LocationError::Unsupported))?;

        let denied = |e| classify(e, LocationError::PermissionDenied);

        client.set_desktop_id(DESKTOP_ID).await.map_err(denied)?;
        client
            .set_requested_accuracy_level(ACCURACY_CITY)
            .await
            .map_err(denied)?;

        let mut updates = client.receive_location_updated().await.map_err(denied)?;
        client.start().await.map_err(denied)?;

        let fix = tokio::time::timeout(FIX_TIMEOUT, updates.next()).await;
        let result = match fix {
            Ok(Some(_)) => read_fix(&conn, &client).await,
            Ok(None) => Err(LocationError::PermissionDenied),
            Err(_) => {
                tracing::warn!("No position fix within {:?}", FIX_TIMEOUT);
                Err(LocationError::PermissionDenied)
            }
        };

        if let Err(e) = client.stop().await {
            tracing::debug!("Failed to stop GeoClue client: {}", e);
        }

        result
    }

    async fn read_fix(
        conn: &Connection,
        client: &ClientProxy<'_>,
    ) -> Result<Coordinates, LocationError> {
        let denied = |e| classify(e, LocationError::PermissionDenied);

        let path = client.location().await.map_err(denied)?;
        let location = LocationProxy::builder(conn)
            .path(path)
            .map_err(denied)?
            .build()
            .await
            .map_err(denied)?;

        let latitude = location.latitude().await.map_err(denied)?;
        let longitude = location.longitude().await.map_err(denied)?;

        tracing::info!("Got device position: {:.4}, {:.4}", latitude, longitude);
        Ok(Coordinates::new(latitude, longitude))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[tokio::test]
    async fn test_fixed_position_resolves_once_to_its_value() {
        let source = FixedPosition(Coordinates::new(48.8566, 2.3522));
        let position = source.current_position().await.unwrap();
        assert_eq!(position, Coordinates::new(48.8566, 2.3522));
    }

    #[tokio::test]
    async fn test_configured_position_wins() {
        let config = LocationConfig {
            latitude: Some(51.5),
            longitude: Some(-0.12),
        };
        let source = position_source(&config);
        let position = source.current_position().await.unwrap();
        assert_eq!(position, Coordinates::new(51.5, -0.12));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_only_access_denied_errors_mean_denial() {
        let denied = zbus::Error::FDO(Box::new(zbus::fdo::Error::AccessDenied(
            "not permitted".into(),
        )));
        assert!(matches!(
            geoclue::classify(denied, LocationError::Unsupported),
            LocationError::PermissionDenied
        ));

        // Free text mentioning a denial is not a denial
        let failure = zbus::Error::Failure("AccessDenied".into());
        assert!(matches!(
            geoclue::classify(failure, LocationError::Unsupported),
            LocationError::Unsupported
        ));

        let unknown = zbus::Error::FDO(Box::new(zbus::fdo::Error::ServiceUnknown(
            "org.freedesktop.GeoClue2".into(),
        )));
        assert!(matches!(
            geoclue::classify(unknown, LocationError::Unsupported),
            LocationError::Unsupported
        ));
    }

    #[tokio::test]
    #[ignore] // Needs a running GeoClue2 service: cargo test -p skycast-weather -- --ignored
    async fn test_system_position() {
        let position = SystemPosition.current_position().await;
        assert!(position.is_ok());
    }
}
