// ===========================================================================
// Great-circle helpers shared by clustering, snapping and density sampling
// ===========================================================================
use geo::{Distance, Haversine, Point};

/// Mean earth radius used to turn kilometre thresholds into angles.
pub const EARTH_RADIUS_KM: f64 = 6371.000785;

/// Convert a great-circle distance in kilometres to a central angle in radians.
pub fn km_to_radians(km: f64) -> f64 {
    km / EARTH_RADIUS_KM
}

pub fn radians_to_km(angle: f64) -> f64 {
    angle * EARTH_RADIUS_KM
}

/// Position on the unit sphere for (lat, lon) in degrees.
pub fn to_unit_vector(lat: f64, lon: f64) -> [f64; 3] {
    let (lat, lon) = (lat.to_radians(), lon.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Inverse of [`to_unit_vector`]. The input does not need to be normalised.
pub fn from_unit_vector(v: [f64; 3]) -> (f64, f64) {
    let lat = v[2].atan2((v[0] * v[0] + v[1] * v[1]).sqrt());
    let lon = v[1].atan2(v[0]);
    (lat.to_degrees(), lon.to_degrees())
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Central angle in radians between two unit vectors. Stable for tiny and
/// near-antipodal separations alike.
pub fn central_angle(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(cross(a, b)).atan2(dot(a, b))
}

/// Squared chord length on the unit sphere matching a central angle.
/// The chord is monotone in the angle, so euclidean range queries over unit
/// vectors answer great-circle range queries.
pub fn chord_squared(angle: f64) -> f64 {
    let chord = 2.0 * (angle.min(std::f64::consts::PI) / 2.0).sin();
    chord * chord
}

/// Haversine length in kilometres between two (lat, lon) pairs.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // geo works in metres with (x = lon, y = lat)
    Haversine.distance(Point::new(lon1, lat1), Point::new(lon2, lat2)) / 1000.0
}

/// Point at `fraction` of the great circle from `a` to `b` (spherical
/// linear interpolation). Falls back to `a` for coincident endpoints.
pub fn interpolate(a: (f64, f64), b: (f64, f64), fraction: f64) -> (f64, f64) {
    let va = to_unit_vector(a.0, a.1);
    let vb = to_unit_vector(b.0, b.1);
    let omega = central_angle(va, vb);
    if omega < 1e-12 {
        return a;
    }
    let sin_omega = omega.sin();
    let wa = ((1.0 - fraction) * omega).sin() / sin_omega;
    let wb = (fraction * omega).sin() / sin_omega;
    from_unit_vector([
        wa * va[0] + wb * vb[0],
        wa * va[1] + wb * vb[1],
        wa * va[2] + wb * vb[2],
    ])
}

/// Normalised mean of unit vectors, or `None` when they cancel out.
pub fn spherical_centroid(vectors: &[[f64; 3]]) -> Option<[f64; 3]> {
    let mut sum = [0.0; 3];
    for v in vectors {
        sum[0] += v[0];
        sum[1] += v[1];
        sum[2] += v[2];
    }
    let len = norm(sum);
    if len < 1e-12 {
        return None;
    }
    Some([sum[0] / len, sum[1] / len, sum[2] / len])
}
