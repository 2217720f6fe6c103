use glam::Vec3;

use crate::resources::geometry::{Attribute, Geometry};
use wgpu::{PrimitiveTopology, VertexFormat};

/// Point cloud geometry with one vertex per position.
#[must_use]
pub fn create_points(positions: &[Vec3]) -> Geometry {
    let data: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();

    let mut geo = Geometry::new("PointsGeometry").with_topology(PrimitiveTopology::PointList);
    geo.set_attribute("position", Attribute::new_planar(&data, VertexFormat::Float32x3));
    geo.compute_bounding_volume();
    geo
}
