use crate::resources::geometry::{Attribute, Geometry};
use wgpu::VertexFormat;

/// Axis-aligned box centred at the origin, 4 vertices per face.
#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> Geometry {
    let half = [width / 2.0, height / 2.0, depth / 2.0];

    // (normal axis, sign, u axis, v axis) with u x v = +normal axis
    const FACES: [(usize, f32, usize, usize); 6] = [
        (2, 1.0, 0, 1),  // +Z
        (2, -1.0, 0, 1), // -Z
        (1, 1.0, 2, 0),  // +Y
        (1, -1.0, 2, 0), // -Y
        (0, 1.0, 1, 2),  // +X
        (0, -1.0, 1, 2), // -X
    ];
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut uvs = Vec::with_capacity(24);
    let mut indices: Vec<u16> = Vec::with_capacity(36);

    for (face, &(axis, sign, u_axis, v_axis)) in FACES.iter().enumerate() {
        let mut normal = [0.0_f32; 3];
        normal[axis] = sign;

        for &(cu, cv) in &CORNERS {
            let mut p = [0.0_f32; 3];
            p[axis] = sign * half[axis];
            // Mirror u on negative faces to keep CCW winding seen from outside.
            p[u_axis] = cu * sign * half[u_axis];
            p[v_axis] = cv * half[v_axis];
            positions.push(p);
            normals.push(normal);
            uvs.push([(cu + 1.0) * 0.5, 1.0 - (cv + 1.0) * 0.5]);
        }

        let base = (face * 4) as u16;
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut geo = Geometry::new("BoxGeometry");
    geo.set_attribute("position", Attribute::new_planar(&positions, VertexFormat::Float32x3));
    geo.set_attribute("normal", Attribute::new_planar(&normals, VertexFormat::Float32x3));
    geo.set_attribute("uv", Attribute::new_planar(&uvs, VertexFormat::Float32x2));
    geo.set_indices(&indices);
    geo.compute_bounding_volume();
    geo
}
