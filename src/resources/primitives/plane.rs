use crate::resources::geometry::{Attribute, Geometry};
use wgpu::VertexFormat;

/// Single-quad plane in the XY plane facing +Z.
#[must_use]
pub fn create_plane(width: f32, height: f32) -> Geometry {
    let w = width / 2.0;
    let h = height / 2.0;

    let positions = [[-w, -h, 0.0], [w, -h, 0.0], [w, h, 0.0], [-w, h, 0.0]];
    let normals = [[0.0_f32, 0.0, 1.0]; 4];
    let uvs = [[0.0_f32, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

    let mut geo = Geometry::new("PlaneGeometry");
    geo.set_attribute("position", Attribute::new_planar(&positions, VertexFormat::Float32x3));
    geo.set_attribute("normal", Attribute::new_planar(&normals, VertexFormat::Float32x3));
    geo.set_attribute("uv", Attribute::new_planar(&uvs, VertexFormat::Float32x2));
    geo.set_indices(&[0, 1, 2, 0, 2, 3]);
    geo.compute_bounding_volume();
    geo
}
