use super::{Ellipsoid, ProjectionError};

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Geocentric (earth-centred, earth-fixed) cartesian coordinates in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geocentric {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Seven-parameter shift from a local datum to WGS84, as given by proj's `+towgs84=`
///
/// Rotations use the position-vector convention, in arc seconds; scale is in ppm.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Helmert {
    pub dx: f64,
    pub dy: f64,
    pub dz: f64,
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
    pub ds: f64,
}

impl Helmert {
    /// Parse the comma separated `+towgs84` value (3 or 7 numbers)
    pub fn parse(value: &str) -> Result<Self, ProjectionError> {
        let values = value
            .split(',')
            .map(|v| {
                v.trim()
                    .parse::<f64>()
                    .map_err(|_| ProjectionError::InvalidParameter {
                        name: "towgs84".to_string(),
                        value: value.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [dx, dy, dz] => Ok(Self {
                dx: *dx,
                dy: *dy,
                dz: *dz,
                ..Default::default()
            }),
            [dx, dy, dz, rx, ry, rz, ds] => Ok(Self {
                dx: *dx,
                dy: *dy,
                dz: *dz,
                rx: *rx,
                ry: *ry,
                rz: *rz,
                ds: *ds,
            }),
            _ => Err(ProjectionError::InvalidParameter {
                name: "towgs84".to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Local datum -> WGS84
    pub fn to_wgs84(&self, p: Geocentric) -> Geocentric {
        let (rx, ry, rz) = self.rotations();
        let m = self.scale();
        Geocentric {
            x: m * (p.x - rz * p.y + ry * p.z) + self.dx,
            y: m * (rz * p.x + p.y - rx * p.z) + self.dy,
            z: m * (-ry * p.x + rx * p.y + p.z) + self.dz,
        }
    }

    /// WGS84 -> local datum, the small-angle inverse of [`Helmert::to_wgs84`]
    pub fn from_wgs84(&self, p: Geocentric) -> Geocentric {
        let (rx, ry, rz) = self.rotations();
        let m = self.scale();
        let x = (p.x - self.dx) / m;
        let y = (p.y - self.dy) / m;
        let z = (p.z - self.dz) / m;
        Geocentric {
            x: x + rz * y - ry * z,
            y: -rz * x + y + rx * z,
            z: ry * x - rx * y + z,
        }
    }

    fn rotations(&self) -> (f64, f64, f64) {
        (
            self.rx * ARCSEC_TO_RAD,
            self.ry * ARCSEC_TO_RAD,
            self.rz * ARCSEC_TO_RAD,
        )
    }

    fn scale(&self) -> f64 {
        1.0 + self.ds * 1e-6
    }
}

/// Geodetic (lon, lat in degrees, ellipsoidal height in meters) to geocentric
pub fn geodetic_to_geocentric(ellipsoid: &Ellipsoid, lon: f64, lat: f64, h: f64) -> Geocentric {
    let phi = lat.to_radians();
    let lambda = lon.to_radians();
    let n = ellipsoid.prime_vertical_radius(phi);
    Geocentric {
        x: (n + h) * phi.cos() * lambda.cos(),
        y: (n + h) * phi.cos() * lambda.sin(),
        z: (n * (1.0 - ellipsoid.es()) + h) * phi.sin(),
    }
}

/// Geocentric to geodetic (lon, lat in degrees, height in meters)
///
/// Fixed-point iteration on latitude; converges to well below 1e-12 rad in a
/// handful of steps for points near the ellipsoid surface.
pub fn geocentric_to_geodetic(ellipsoid: &Ellipsoid, p: Geocentric) -> (f64, f64, f64) {
    const MAX_ITERATIONS: usize = 10;
    const EPSILON: f64 = 1e-14;

    let es = ellipsoid.es();
    let lambda = p.y.atan2(p.x);
    let r = p.x.hypot(p.y);

    let mut phi = p.z.atan2(r * (1.0 - es));
    let mut h = 0.0;
    for _ in 0..MAX_ITERATIONS {
        let n = ellipsoid.prime_vertical_radius(phi);
        h = r / phi.cos() - n;
        let next = p.z.atan2(r * (1.0 - es * n / (n + h)));
        let done = (next - phi).abs() < EPSILON;
        phi = next;
        if done {
            break;
        }
    }

    (lambda.to_degrees(), phi.to_degrees(), h)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSGB36: &str = "446.448,-125.157,542.06,0.15,0.247,0.842,-20.489";

    #[test]
    fn test_parse_seven_params() {
        let h = Helmert::parse(OSGB36).unwrap();
        assert_eq!(h.dx, 446.448);
        assert_eq!(h.rz, 0.842);
        assert_eq!(h.ds, -20.489);
    }

    #[test]
    fn test_parse_three_params() {
        let h = Helmert::parse("-87,-98,-121").unwrap();
        assert_eq!(h.dz, -121.0);
        assert_eq!(h.rx, 0.0);
    }

    #[test]
    fn test_parse_rejects_bad_arity() {
        assert!(Helmert::parse("1,2").is_err());
        assert!(Helmert::parse("1,2,x").is_err());
    }

    #[test]
    fn test_geocentric_round_trip() {
        let p = geodetic_to_geocentric(&Ellipsoid::AIRY, -2.0, 49.0, 0.0);
        let (lon, lat, h) = geocentric_to_geodetic(&Ellipsoid::AIRY, p);
        assert!((lon + 2.0).abs() < 1e-10);
        assert!((lat - 49.0).abs() < 1e-10);
        assert!(h.abs() < 1e-5);
    }

    #[test]
    fn test_helmert_inverse_undoes_forward() {
        let h = Helmert::parse(OSGB36).unwrap();
        let p = geodetic_to_geocentric(&Ellipsoid::AIRY, -0.1277, 51.5074, 0.0);
        let back = h.from_wgs84(h.to_wgs84(p));
        assert!((back.x - p.x).abs() < 1e-3);
        assert!((back.y - p.y).abs() < 1e-3);
        assert!((back.z - p.z).abs() < 1e-3);
    }
}
