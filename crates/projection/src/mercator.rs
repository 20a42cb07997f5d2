//! Spherical Web Mercator (EPSG:3857).

/// Earth radius used by Web Mercator (the WGS 84 semi-major axis).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Latitude limit that makes the projected world square.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Spherical Web Mercator projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Geographic (degrees) to metres. Latitude is clamped to the square world.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = EARTH_RADIUS * lon_deg.to_radians();
        let y = EARTH_RADIUS * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
        (x, y)
    }

    /// Metres to geographic (degrees), returned as `(lon, lat)`.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        (lon, lat)
    }
}
