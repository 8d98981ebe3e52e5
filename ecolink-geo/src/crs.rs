//! Spatial reference definitions and reprojection.
//!
//! Every source collection is brought into one common reference
//! ([`Crs::Geographic`], lon/lat degrees) before combination, so geometries
//! are directly comparable and unionable across collections.
//!
//! The source inventory uses exactly two projected references, both Albers
//! equal-area conic on the GRS80 ellipsoid (the CEC North America grid and
//! the EPA CONUS grid), so the inverse projection is implemented directly
//! from the standard conic formulas rather than pulling in a native PROJ
//! binding. NAD83 and WGS84 differ by well under a meter and are collapsed
//! into the single `Geographic` reference.

use crate::error::{GeoError, Result};
use geo::MapCoords;
use geo_types::{Coord, Geometry};
use serde::{Deserialize, Serialize};

/// GRS80 semi-major axis (meters).
const GRS80_A: f64 = 6_378_137.0;

/// GRS80 inverse flattening.
const GRS80_INV_F: f64 = 298.257_222_101;

/// Parameters of an Albers equal-area conic projection (GRS80 ellipsoid).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlbersParams {
    /// Central meridian, degrees.
    pub center_lon: f64,
    /// Latitude of origin, degrees.
    pub center_lat: f64,
    /// First standard parallel, degrees.
    pub std_parallel_1: f64,
    /// Second standard parallel, degrees.
    pub std_parallel_2: f64,
    /// False easting, meters.
    pub false_easting: f64,
    /// False northing, meters.
    pub false_northing: f64,
}

impl AlbersParams {
    /// The CEC North America Albers grid used by the continental
    /// ecoregion shapefiles.
    pub fn north_america() -> Self {
        Self {
            center_lon: -100.0,
            center_lat: 40.0,
            std_parallel_1: 20.0,
            std_parallel_2: 60.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }

    /// The EPA CONUS Albers grid (EPSG:5070) used by the US ecoregion
    /// shapefiles.
    pub fn conus() -> Self {
        Self {
            center_lon: -96.0,
            center_lat: 23.0,
            std_parallel_1: 29.5,
            std_parallel_2: 45.5,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }
}

/// Spatial reference of a feature collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Crs {
    /// Geographic lon/lat degrees (NAD83 and WGS84 treated as equivalent).
    Geographic,
    /// Albers equal-area conic, meters.
    Albers(AlbersParams),
    /// Reference could not be determined from the source.
    Unknown,
}

/// Precomputed conic constants for one Albers parameter set.
struct AlbersConic {
    e: f64,
    e2: f64,
    n: f64,
    c: f64,
    rho0: f64,
    lon0_rad: f64,
    false_easting: f64,
    false_northing: f64,
}

impl AlbersConic {
    fn new(p: &AlbersParams) -> Self {
        let f = 1.0 / GRS80_INV_F;
        let e2 = 2.0 * f - f * f;
        let e = e2.sqrt();

        let phi0 = p.center_lat.to_radians();
        let phi1 = p.std_parallel_1.to_radians();
        let phi2 = p.std_parallel_2.to_radians();

        let m1 = m_factor(phi1, e2);
        let m2 = m_factor(phi2, e2);
        let q0 = q_auth(phi0, e, e2);
        let q1 = q_auth(phi1, e, e2);
        let q2 = q_auth(phi2, e, e2);

        let n = if (phi1 - phi2).abs() < 1e-12 {
            phi1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = GRS80_A * (c - n * q0).sqrt() / n;

        Self {
            e,
            e2,
            n,
            c,
            rho0,
            lon0_rad: p.center_lon.to_radians(),
            false_easting: p.false_easting,
            false_northing: p.false_northing,
        }
    }

    /// Project lon/lat degrees to easting/northing meters.
    fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let q = q_auth(phi, self.e, self.e2);
        let rho = GRS80_A * (self.c - self.n * q).sqrt() / self.n;
        let theta = self.n * (lon.to_radians() - self.lon0_rad);
        (
            rho * theta.sin() + self.false_easting,
            self.rho0 - rho * theta.cos() + self.false_northing,
        )
    }

    /// Unproject easting/northing meters to lon/lat degrees.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let dx = x - self.false_easting;
        let dy = self.rho0 - (y - self.false_northing);

        let (mut rho, theta) = if self.n >= 0.0 {
            ((dx * dx + dy * dy).sqrt(), dx.atan2(dy))
        } else {
            (-(dx * dx + dy * dy).sqrt(), (-dx).atan2(-dy))
        };
        if rho == 0.0 {
            rho = f64::EPSILON; // projection center
        }

        let q = (self.c - rho * rho * self.n * self.n / (GRS80_A * GRS80_A)) / self.n;
        let lon = (self.lon0_rad + theta / self.n).to_degrees();

        // q at the pole bounds the authalic latitude domain.
        let q_pole = q_auth(std::f64::consts::FRAC_PI_2, self.e, self.e2);
        if q.abs() >= q_pole {
            return Ok((lon, 90f64.copysign(q)));
        }

        // Newton iteration for latitude (Snyder 3-16).
        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..15 {
            let sin_phi = phi.sin();
            let denom = 1.0 - self.e2 * sin_phi * sin_phi;
            let delta = denom * denom / (2.0 * phi.cos())
                * (q / (1.0 - self.e2) - sin_phi / denom
                    + (1.0 / (2.0 * self.e))
                        * ((1.0 - self.e * sin_phi) / (1.0 + self.e * sin_phi)).ln());
            phi += delta;
            if delta.abs() < 1e-12 {
                break;
            }
        }

        if !phi.is_finite() {
            return Err(GeoError::ProjectionDomain(format!(
                "latitude iteration diverged for ({}, {})",
                x, y
            )));
        }
        Ok((lon, phi.to_degrees()))
    }
}

fn m_factor(phi: f64, e2: f64) -> f64 {
    phi.cos() / (1.0 - e2 * phi.sin() * phi.sin()).sqrt()
}

fn q_auth(phi: f64, e: f64, e2: f64) -> f64 {
    let sin_phi = phi.sin();
    (1.0 - e2)
        * (sin_phi / (1.0 - e2 * sin_phi * sin_phi)
            - (1.0 / (2.0 * e)) * ((1.0 - e * sin_phi) / (1.0 + e * sin_phi)).ln())
}

/// Reproject a single geometry from one reference into another.
///
/// A source of [`Crs::Unknown`] is fatal: downstream comparison across
/// collections would be meaningless.
pub fn reproject_geometry(geom: &Geometry<f64>, from: Crs, to: Crs) -> Result<Geometry<f64>> {
    match (from, to) {
        (Crs::Unknown, _) => Err(GeoError::UnknownProjection(
            "source reference could not be determined".into(),
        )),
        (_, Crs::Unknown) => Err(GeoError::UnknownProjection(
            "target reference must be concrete".into(),
        )),
        (Crs::Geographic, Crs::Geographic) => Ok(geom.clone()),
        (Crs::Albers(a), Crs::Albers(b)) if a == b => Ok(geom.clone()),
        (Crs::Albers(p), Crs::Geographic) => {
            let conic = AlbersConic::new(&p);
            geom.try_map_coords(|Coord { x, y }| {
                let (lon, lat) = conic.inverse(x, y)?;
                Ok::<_, GeoError>(Coord { x: lon, y: lat })
            })
        }
        (Crs::Geographic, Crs::Albers(p)) => {
            let conic = AlbersConic::new(&p);
            Ok(geom.map_coords(|Coord { x, y }| {
                let (e, n) = conic.forward(x, y);
                Coord { x: e, y: n }
            }))
        }
        (Crs::Albers(p), Crs::Albers(_)) => {
            // Via geographic; the inventory never actually needs this path
            // but it keeps the operation total over concrete references.
            let geographic = reproject_geometry(geom, Crs::Albers(p), Crs::Geographic)?;
            reproject_geometry(&geographic, Crs::Geographic, to)
        }
    }
}
