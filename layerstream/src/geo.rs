//! Geographic bounds types.
//!
//! Provides the spatial bounding box exchanged between the host map surface
//! and the loading engine, along with validation and normalization. The
//! engine is agnostic to geometry semantics; bounds exist only to scope
//! network requests and to key the request cache.
//!
//! # Antimeridian Handling
//!
//! A viewport that crosses the antimeridian arrives with `west > east`
//! (e.g. a view over the Pacific spanning 170°E to 170°W). Such bounds are
//! never silently swapped, because swapping the edges selects the opposite
//! side of the planet. Instead, [`SpatialBounds::normalized`] splits them
//! into two boxes on either side of the ±180° meridian; callers fetch each
//! box and merge the results.

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors produced when validating spatial bounds.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    /// One or more edges is NaN or infinite.
    #[error("bounds contain a non-finite edge")]
    NonFinite,

    /// Latitude outside the valid range.
    #[error("latitude {0} outside [{MIN_LAT}, {MAX_LAT}]")]
    InvalidLatitude(f64),

    /// Longitude outside the valid range.
    #[error("longitude {0} outside [{MIN_LON}, {MAX_LON}]")]
    InvalidLongitude(f64),

    /// The southern edge is north of the northern edge.
    #[error("inverted latitude span: south {south} > north {north}")]
    InvertedLatitude { south: f64, north: f64 },
}

/// A geographic bounding box in degrees.
///
/// Edges follow the GeoJSON bbox convention: `west`/`east` are longitudes,
/// `south`/`north` are latitudes. `west > east` denotes an
/// antimeridian-crossing box and is resolved by [`SpatialBounds::normalized`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialBounds {
    /// Western (minimum) longitude.
    pub west: f64,
    /// Southern (minimum) latitude.
    pub south: f64,
    /// Eastern (maximum) longitude.
    pub east: f64,
    /// Northern (maximum) latitude.
    pub north: f64,
}

impl SpatialBounds {
    /// Create a new bounding box.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Whether this box crosses the antimeridian (`west > east`).
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Validate edge ranges without resolving antimeridian crossings.
    ///
    /// Checks that every edge is finite and inside the valid geographic
    /// range, and that the latitude span is not inverted. A `west > east`
    /// longitude span is allowed here; it is resolved by [`Self::normalized`].
    pub fn validate(&self) -> Result<(), BoundsError> {
        for edge in [self.west, self.south, self.east, self.north] {
            if !edge.is_finite() {
                return Err(BoundsError::NonFinite);
            }
        }
        for lat in [self.south, self.north] {
            if !(MIN_LAT..=MAX_LAT).contains(&lat) {
                return Err(BoundsError::InvalidLatitude(lat));
            }
        }
        for lon in [self.west, self.east] {
            if !(MIN_LON..=MAX_LON).contains(&lon) {
                return Err(BoundsError::InvalidLongitude(lon));
            }
        }
        if self.south > self.north {
            return Err(BoundsError::InvertedLatitude {
                south: self.south,
                north: self.north,
            });
        }
        Ok(())
    }

    /// Validate and normalize these bounds for fetching.
    ///
    /// Returns one box for an ordinary viewport, or two boxes split at the
    /// ±180° meridian for an antimeridian-crossing viewport.
    pub fn normalized(&self) -> Result<NormalizedBounds, BoundsError> {
        self.validate()?;
        if self.crosses_antimeridian() {
            let western = SpatialBounds::new(self.west, self.south, MAX_LON, self.north);
            let eastern = SpatialBounds::new(MIN_LON, self.south, self.east, self.north);
            Ok(NormalizedBounds::SplitAtAntimeridian(western, eastern))
        } else {
            Ok(NormalizedBounds::Single(*self))
        }
    }
}

impl std::fmt::Display for SpatialBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.6},{:.6},{:.6},{:.6}]",
            self.west, self.south, self.east, self.north
        )
    }
}

/// Result of normalizing a bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedBounds {
    /// An ordinary box, fetchable with a single request.
    Single(SpatialBounds),
    /// An antimeridian-crossing box split into a western and an eastern half.
    SplitAtAntimeridian(SpatialBounds, SpatialBounds),
}

impl NormalizedBounds {
    /// The boxes to fetch, in west-to-east order.
    pub fn boxes(&self) -> Vec<SpatialBounds> {
        match self {
            NormalizedBounds::Single(b) => vec![*b],
            NormalizedBounds::SplitAtAntimeridian(w, e) => vec![*w, *e],
        }
    }
}

/// Bounds quantized to microdegrees for use in hashable cache keys.
///
/// `f64` edges cannot be hashed directly; quantizing to 1e-6 degrees
/// (roughly 11 cm at the equator) gives exact equality for repeated
/// requests over the same viewport while collapsing sub-centimeter jitter
/// from the host map surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundsKey {
    west_e6: i32,
    south_e6: i32,
    east_e6: i32,
    north_e6: i32,
}

impl From<&SpatialBounds> for BoundsKey {
    fn from(bounds: &SpatialBounds) -> Self {
        let quantize = |deg: f64| -> i32 { (deg * 1_000_000.0).round() as i32 };
        Self {
            west_e6: quantize(bounds.west),
            south_e6: quantize(bounds.south),
            east_e6: quantize(bounds.east),
            north_e6: quantize(bounds.north),
        }
    }
}
