use crate::resources::geometry::{Attribute, Geometry};
use wgpu::{PrimitiveTopology, VertexFormat};

/// Material slot index of the two center lines in a grid geometry.
pub const GRID_CENTER_GROUP: usize = 0;
/// Material slot index of every other grid line.
pub const GRID_LINES_GROUP: usize = 1;

/// Square line grid on the XZ plane.
///
/// The geometry carries two draw groups so the center cross and the
/// remaining lines can use different materials.
#[must_use]
pub fn create_grid(size: f32, divisions: u32) -> Geometry {
    let divisions = divisions.max(1);
    let half = size / 2.0;
    let step = size / divisions as f32;

    let mut center: Vec<[f32; 3]> = Vec::with_capacity(4);
    let mut lines: Vec<[f32; 3]> = Vec::with_capacity(divisions as usize * 4);

    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let target = if 2 * i == divisions { &mut center } else { &mut lines };
        target.extend_from_slice(&[[-half, 0.0, k], [half, 0.0, k], [k, 0.0, -half], [k, 0.0, half]]);
    }

    let center_count = center.len() as u32;
    let lines_count = lines.len() as u32;
    let mut positions = center;
    positions.append(&mut lines);

    let mut geo = Geometry::new("GridGeometry").with_topology(PrimitiveTopology::LineList);
    geo.set_attribute("position", Attribute::new_planar(&positions, VertexFormat::Float32x3));
    geo.add_group(0, center_count, GRID_CENTER_GROUP);
    geo.add_group(center_count, lines_count, GRID_LINES_GROUP);
    geo.compute_bounding_volume();
    geo
}
