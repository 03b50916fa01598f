use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// World size in pixels at zoom 0, matching the GL map engines
const TILE_SIZE: f64 = 512.0;
const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Camera state handed to the map rendering engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            longitude: -70.6693,
            latitude: -33.4489,
            zoom: 11.5,
            pitch: 0.0,
            bearing: 0.0,
        }
    }
}

/// A view state bound to a canvas size, able to convert between lon/lat and screen pixels.
///
/// The projection is flat Web Mercator: bearing rotates the screen, pitch is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub view: ViewState,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(view: ViewState, width: f64, height: f64) -> Self {
        Self { view, width, height }
    }

    fn scale(&self) -> f64 {
        TILE_SIZE * 2.0_f64.powf(self.view.zoom)
    }

    fn world(&self, lon: f64, lat: f64) -> (f64, f64) {
        let scale = self.scale();
        let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (lon + 180.0) / 360.0 * scale;
        let y = (1.0 - (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() / PI) / 2.0 * scale;
        (x, y)
    }

    fn from_world(&self, x: f64, y: f64) -> (f64, f64) {
        let scale = self.scale();
        let lon = x / scale * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y / scale)).sinh().atan().to_degrees();
        (lon, lat)
    }

    /// Screen pixel (origin top-left) for a WGS84 coordinate.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (cx, cy) = self.world(self.view.longitude, self.view.latitude);
        let (x, y) = self.world(lon, lat);
        let (dx, dy) = rotate(x - cx, y - cy, -self.view.bearing);
        (dx + self.width / 2.0, dy + self.height / 2.0)
    }

    /// WGS84 coordinate under a screen pixel.
    pub fn unproject(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        let (cx, cy) = self.world(self.view.longitude, self.view.latitude);
        let (dx, dy) = rotate(
            screen_x - self.width / 2.0,
            screen_y - self.height / 2.0,
            self.view.bearing,
        );
        self.from_world(cx + dx, cy + dy)
    }
}

fn rotate(x: f64, y: f64, degrees: f64) -> (f64, f64) {
    if degrees == 0.0 {
        return (x, y);
    }
    let (sin, cos) = degrees.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(ViewState::default(), 1280.0, 800.0)
    }

    #[test]
    fn center_projects_to_canvas_center() {
        let vp = viewport();
        let (x, y) = vp.project(vp.view.longitude, vp.view.latitude);
        assert!((x - 640.0).abs() < 1e-6);
        assert!((y - 400.0).abs() < 1e-6);
    }

    #[test]
    fn project_unproject_round_trip() {
        let vp = viewport();
        let (x, y) = vp.project(-70.65, -33.43);
        let (lon, lat) = vp.unproject(x, y);
        assert!((lon + 70.65).abs() < 1e-9);
        assert!((lat + 33.43).abs() < 1e-9);
    }

    #[test]
    fn east_is_right_and_north_is_up() {
        let vp = viewport();
        let (x_east, _) = vp.project(vp.view.longitude + 0.01, vp.view.latitude);
        let (_, y_north) = vp.project(vp.view.longitude, vp.view.latitude + 0.01);
        assert!(x_east > 640.0);
        assert!(y_north < 400.0);
    }

    #[test]
    fn bearing_round_trip() {
        let view = ViewState {
            bearing: 30.0,
            ..ViewState::default()
        };
        let vp = Viewport::new(view, 800.0, 600.0);
        let (x, y) = vp.project(-70.70, -33.40);
        let (lon, lat) = vp.unproject(x, y);
        assert!((lon + 70.70).abs() < 1e-9);
        assert!((lat + 33.40).abs() < 1e-9);
    }
}
