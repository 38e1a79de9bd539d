//! Slippy-map state: center, zoom and a single marker.

use std::f64::consts::PI;

use skycast_weather::Coordinates;

pub const DEFAULT_ZOOM: u8 = 10;
pub const MARKER_LABEL: &str = "Selected Location";
pub const ATTRIBUTION: &str = "© OpenStreetMap contributors";

/// Web Mercator is undefined at the poles
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: Coordinates,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl Tile {
    /// The tile containing `coords` at `zoom`.
    pub fn containing(coords: Coordinates, zoom: u8) -> Self {
        let n = f64::from(1u32 << zoom);
        let lat = coords.latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let lon = coords.longitude.clamp(-180.0, 180.0);

        let x = ((lon + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n).floor();

        let max = n - 1.0;
        Self {
            x: x.clamp(0.0, max) as u32,
            y: y.clamp(0.0, max) as u32,
            zoom,
        }
    }

    /// Fill a `{s}`/`{z}`/`{x}`/`{y}` URL template.
    pub fn url(&self, template: &str) -> String {
        template
            .replace("{s}", "a")
            .replace("{z}", &self.zoom.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct MapView {
    tile_template: String,
    zoom: u8,
    center: Option<Coordinates>,
    marker: Option<Marker>,
}

impl MapView {
    pub fn new(tile_template: &str) -> Self {
        Self {
            tile_template: tile_template.to_string(),
            zoom: DEFAULT_ZOOM,
            center: None,
            marker: None,
        }
    }

    /// Recenter and replace any previous marker.
    pub fn center_on(&mut self, coords: Coordinates) {
        self.center = Some(coords);
        self.marker = Some(Marker {
            position: coords,
            label: MARKER_LABEL,
        });
    }

    pub fn center(&self) -> Option<Coordinates> {
        self.center
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn center_tile(&self) -> Option<Tile> {
        self.center.map(|c| Tile::containing(c, self.zoom))
    }

    pub fn center_tile_url(&self) -> Option<String> {
        self.center_tile().map(|t| t.url(&self.tile_template))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const OSM: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

    #[test]
    fn test_paris_tile_at_zoom_10() {
        let tile = Tile::containing(Coordinates::new(48.8566, 2.3522), 10);
        assert_eq!(tile, Tile { x: 518, y: 352, zoom: 10 });
        assert_eq!(
            tile.url(OSM),
            "https://a.tile.openstreetmap.org/10/518/352.png"
        );
    }

    #[test]
    fn test_origin_tile() {
        let tile = Tile::containing(Coordinates::new(0.0, 0.0), 1);
        assert_eq!((tile.x, tile.y), (1, 1));
    }

    #[test]
    fn test_extremes_stay_in_range() {
        let tile = Tile::containing(Coordinates::new(90.0, 180.0), 10);
        assert_eq!((tile.x, tile.y), (1023, 0));

        let tile = Tile::containing(Coordinates::new(-90.0, -180.0), 10);
        assert_eq!((tile.x, tile.y), (0, 1023));
    }

    #[test]
    fn test_center_replaces_marker() {
        let mut map = MapView::new(OSM);
        assert!(map.marker().is_none());
        assert!(map.center_tile_url().is_none());

        map.center_on(Coordinates::new(1.0, 2.0));
        map.center_on(Coordinates::new(48.8566, 2.3522));

        let marker = map.marker().unwrap();
        assert_eq!(marker.position, Coordinates::new(48.8566, 2.3522));
        assert_eq!(marker.label, "Selected Location");
        assert_eq!(map.zoom(), 10);
        assert_eq!(
            map.center_tile_url().unwrap(),
            "https://a.tile.openstreetmap.org/10/518/352.png"
        );
    }
}
