//! Coordinate reference system transformations.
//!
//! Implements the map projections used by airborne survey data from
//! scratch: ellipsoidal Transverse Mercator (UTM / MGA zones) and spherical
//! Web Mercator, with geographic coordinates as the pivot.

pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use mercator::WebMercator;
pub use transform::{
    default_projected_system, transform_bounds, transform_coords, transform_coords_3d,
    transform_flat, Transformer,
};
pub use transverse_mercator::TransverseMercator;
