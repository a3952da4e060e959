use super::ProjectionError;

/// Reference ellipsoid described by its semi-major axis and flattening
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in meters
    pub a: f64,
    /// Flattening (not inverse)
    pub f: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid::from_inverse_flattening(6378137.0, 298.257223563);
    pub const GRS80: Ellipsoid = Ellipsoid::from_inverse_flattening(6378137.0, 298.257222101);
    /// Airy 1830, used by OSGB36 and the British National Grid
    pub const AIRY: Ellipsoid = Ellipsoid::from_inverse_flattening(6377563.396, 299.3249646);
    pub const INTERNATIONAL: Ellipsoid = Ellipsoid::from_inverse_flattening(6378388.0, 297.0);
    pub const BESSEL: Ellipsoid = Ellipsoid::from_inverse_flattening(6377397.155, 299.1528128);
    pub const CLARKE_1866: Ellipsoid = Ellipsoid::from_axes(6378206.4, 6356583.8);

    pub const fn from_inverse_flattening(a: f64, rf: f64) -> Self {
        Self { a, f: 1.0 / rf }
    }

    pub const fn from_axes(a: f64, b: f64) -> Self {
        Self { a, f: (a - b) / a }
    }

    /// Look up a named ellipsoid using proj's `+ellps=` names
    pub fn by_name(name: &str) -> Result<Self, ProjectionError> {
        match name {
            "WGS84" => Ok(Self::WGS84),
            "GRS80" => Ok(Self::GRS80),
            "airy" => Ok(Self::AIRY),
            "intl" => Ok(Self::INTERNATIONAL),
            "bessel" => Ok(Self::BESSEL),
            "clrk66" => Ok(Self::CLARKE_1866),
            other => Err(ProjectionError::UnknownEllipsoid(other.to_string())),
        }
    }

    /// First eccentricity squared
    pub fn es(&self) -> f64 {
        self.f * (2.0 - self.f)
    }

    /// Third flattening n = f / (2 - f), the expansion parameter of the Krüger series
    pub fn third_flattening(&self) -> f64 {
        self.f / (2.0 - self.f)
    }

    /// Radius of curvature in the prime vertical at latitude `phi` (radians)
    pub fn prime_vertical_radius(&self, phi: f64) -> f64 {
        let sin_phi = phi.sin();
        self.a / (1.0 - self.es() * sin_phi * sin_phi).sqrt()
    }
}
