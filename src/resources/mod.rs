//! Resource Definitions
//!
//! CPU-side resource data, independent of any GPU backend:
//! - [`ResourceArena`]: single owner of geometries, materials and raw buffers
//! - [`Geometry`]: procedural vertex data
//! - [`Material`]: shading description
//! - [`primitives`]: procedural shape generators
//! - [`color`]: palette helpers

pub mod arena;
pub mod color;
pub mod geometry;
pub mod material;
pub mod primitives;

pub use arena::{BufferKey, GeometryKey, MaterialKey, RawBuffer, ResourceArena, ResourceCounts};
pub use geometry::{Attribute, BoundingSphere, Geometry, GeometryGroup};
pub use material::{Blending, Material, MaterialFlags, MaterialKind, Side};
