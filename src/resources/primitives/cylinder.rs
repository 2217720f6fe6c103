use crate::resources::geometry::{Attribute, Geometry};
use std::f32::consts::TAU;
use wgpu::VertexFormat;

pub struct CylinderOptions {
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    /// Skip the top and bottom caps.
    pub open_ended: bool,
}

impl Default for CylinderOptions {
    fn default() -> Self {
        Self {
            radius_top: 1.0,
            radius_bottom: 1.0,
            height: 1.0,
            radial_segments: 32,
            height_segments: 1,
            open_ended: false,
        }
    }
}

impl CylinderOptions {
    #[must_use]
    pub fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, radial_segments: u32) -> Self {
        Self {
            radius_top,
            radius_bottom,
            height,
            radial_segments,
            ..Default::default()
        }
    }

    /// A cone is a cylinder whose top radius collapses to zero.
    #[must_use]
    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        Self::cylinder(0.0, radius, height, radial_segments)
    }

    #[must_use]
    pub fn open_ended(mut self, open: bool) -> Self {
        self.open_ended = open;
        self
    }
}

/// Cylinder or cone along the Y axis, centred at the origin.
#[must_use]
pub fn create_cylinder(options: &CylinderOptions) -> Geometry {
    let radial = options.radial_segments.max(3);
    let rows = options.height_segments.max(1);
    let half_height = options.height / 2.0;
    let slope = (options.radius_bottom - options.radius_top) / options.height.max(f32::EPSILON);

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut indices: Vec<u16> = Vec::new();

    // Torso
    for y in 0..=rows {
        let v = y as f32 / rows as f32;
        let radius = v * (options.radius_bottom - options.radius_top) + options.radius_top;
        for x in 0..=radial {
            let u = x as f32 / radial as f32;
            let theta = u * TAU;
            let (sin, cos) = theta.sin_cos();
            positions.push([radius * sin, -v * options.height + half_height, radius * cos]);
            let n = glam::Vec3::new(sin, slope, cos).normalize();
            normals.push(n.to_array());
            uvs.push([u, 1.0 - v]);
        }
    }
    let stride = radial + 1;
    for y in 0..rows {
        for x in 0..radial {
            let a = (y * stride + x) as u16;
            let b = ((y + 1) * stride + x) as u16;
            let c = b + 1;
            let d = a + 1;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    if !options.open_ended {
        if options.radius_top > 0.0 {
            push_cap(&mut positions, &mut normals, &mut uvs, &mut indices, options.radius_top, half_height, radial, true);
        }
        if options.radius_bottom > 0.0 {
            push_cap(&mut positions, &mut normals, &mut uvs, &mut indices, options.radius_bottom, -half_height, radial, false);
        }
    }

    let mut geo = Geometry::new(if options.radius_top == 0.0 {
        "ConeGeometry"
    } else {
        "CylinderGeometry"
    });
    geo.set_attribute("position", Attribute::new_planar(&positions, VertexFormat::Float32x3));
    geo.set_attribute("normal", Attribute::new_planar(&normals, VertexFormat::Float32x3));
    geo.set_attribute("uv", Attribute::new_planar(&uvs, VertexFormat::Float32x2));
    geo.set_indices(&indices);
    geo.compute_bounding_volume();
    geo
}

fn push_cap(
    positions: &mut Vec<[f32; 3]>,
    normals: &mut Vec<[f32; 3]>,
    uvs: &mut Vec<[f32; 2]>,
    indices: &mut Vec<u16>,
    radius: f32,
    y: f32,
    radial: u32,
    top: bool,
) {
    let sign = if top { 1.0 } else { -1.0 };
    let center = positions.len() as u16;
    positions.push([0.0, y, 0.0]);
    normals.push([0.0, sign, 0.0]);
    uvs.push([0.5, 0.5]);

    let first = positions.len() as u16;
    for x in 0..=radial {
        let theta = x as f32 / radial as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        positions.push([radius * sin, y, radius * cos]);
        normals.push([0.0, sign, 0.0]);
        uvs.push([cos * 0.5 + 0.5, sin * 0.5 * sign + 0.5]);
    }
    for x in 0..radial as u16 {
        let i = first + x;
        if top {
            indices.extend_from_slice(&[i, i + 1, center]);
        } else {
            indices.extend_from_slice(&[i + 1, i, center]);
        }
    }
}
