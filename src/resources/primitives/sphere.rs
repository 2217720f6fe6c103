use crate::resources::geometry::{Attribute, Geometry};
use std::f32::consts::PI;
use wgpu::VertexFormat;

/// Keeps `(segments + 1)^2` within the `u16` index range.
const MAX_SEGMENTS: u32 = 255;

pub struct SphereOptions {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl Default for SphereOptions {
    fn default() -> Self {
        Self {
            radius: 1.0,
            width_segments: 32,
            height_segments: 16,
        }
    }
}

impl SphereOptions {
    #[must_use]
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments,
            height_segments,
        }
    }
}

/// UV sphere. Latitude rings run from the south pole up.
///
/// Segment counts are clamped to `3..=255` around and `2..=255` up.
#[must_use]
pub fn create_sphere(options: &SphereOptions) -> Geometry {
    let radius = options.radius;
    let width_segments = options.width_segments.clamp(3, MAX_SEGMENTS);
    let height_segments = options.height_segments.clamp(2, MAX_SEGMENTS);
    let stride = width_segments + 1;

    let ring_vertices = ((height_segments + 1) * stride) as usize;
    let mut positions = Vec::with_capacity(ring_vertices);
    let mut normals = Vec::with_capacity(ring_vertices);
    let mut uvs = Vec::with_capacity(ring_vertices);

    for y in 0..=height_segments {
        let v = y as f32 / height_segments as f32;
        let theta = v * PI;
        let ring = theta.sin();

        for x in 0..=width_segments {
            let u = x as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;
            let n = [-ring * phi.cos(), -theta.cos(), ring * phi.sin()];

            positions.push([n[0] * radius, n[1] * radius, n[2] * radius]);
            normals.push(n);
            uvs.push([u, 1.0 - v]);
        }
    }

    let mut indices: Vec<u16> = Vec::with_capacity((width_segments * height_segments * 6) as usize);
    for y in 0..height_segments {
        for x in 0..width_segments {
            let v0 = (y * stride + x) as u16;
            let v1 = v0 + 1;
            let v2 = ((y + 1) * stride + x) as u16;
            let v3 = v2 + 1;
            indices.extend_from_slice(&[v0, v1, v2, v1, v3, v2]);
        }
    }

    let mut geo = Geometry::new("SphereGeometry");
    geo.set_attribute("position", Attribute::new_planar(&positions, VertexFormat::Float32x3));
    geo.set_attribute("normal", Attribute::new_planar(&normals, VertexFormat::Float32x3));
    geo.set_attribute("uv", Attribute::new_planar(&uvs, VertexFormat::Float32x2));
    geo.set_indices(&indices);
    geo.compute_bounding_volume();
    geo
}
