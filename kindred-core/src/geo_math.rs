//! Distance and bounding-box helpers on WGS84 coordinates.
//!
//! Coordinates follow the `geo` convention: `x` is longitude and `y` is
//! latitude, both in degrees. Distances are great-circle kilometres on a
//! spherical Earth.

use std::f64::consts::PI;

use geo::{Coord, Rect};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres spanned by one degree of latitude.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * PI / 180.0;

/// Smallest cosine used when converting kilometres to longitude degrees, so
/// boxes near the poles stay finite.
const MIN_LATITUDE_COSINE: f64 = 1e-6;

/// Great-circle distance between two coordinates using the Haversine formula.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use kindred_core::geo_math::haversine_km;
///
/// let a = Coord { x: 0.0, y: 0.0 };
/// let b = Coord { x: 0.0, y: 1.0 };
/// assert!((haversine_km(a, b) - 111.19).abs() < 0.01);
/// assert_eq!(haversine_km(a, a), 0.0);
/// ```
#[expect(
    clippy::float_arithmetic,
    reason = "great-circle distance is computed in floating point"
)]
pub fn haversine_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat_a = a.y.to_radians();
    let lat_b = b.y.to_radians();
    let half_d_lat = (b.y - a.y).to_radians() / 2.0;
    let half_d_lon = (b.x - a.x).to_radians() / 2.0;
    let h = half_d_lat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_d_lon.sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Length of the diagonal between the south-west and north-east corners.
pub fn diagonal_km(bounds: &Rect<f64>) -> f64 {
    haversine_km(bounds.min(), bounds.max())
}

/// Build an axis-aligned box extending `half_width_km` from `center` in each
/// cardinal direction.
///
/// Latitudes are clamped to `[-90, 90]`. The box does not wrap across the
/// antimeridian.
#[expect(
    clippy::float_arithmetic,
    reason = "degree offsets are derived from fractional kilometres"
)]
pub fn box_around(center: Coord<f64>, half_width_km: f64) -> Rect<f64> {
    let d_lat = half_width_km / KM_PER_DEGREE;
    let cos_lat = center.y.to_radians().cos().abs().max(MIN_LATITUDE_COSINE);
    let d_lon = half_width_km / (KM_PER_DEGREE * cos_lat);
    Rect::new(
        Coord {
            x: center.x - d_lon,
            y: (center.y - d_lat).max(-90.0),
        },
        Coord {
            x: center.x + d_lon,
            y: (center.y + d_lat).min(90.0),
        },
    )
}
