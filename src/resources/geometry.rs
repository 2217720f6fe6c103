use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;
use rustc_hash::FxHashMap;
use wgpu::{PrimitiveTopology, VertexFormat};

static NEXT_ATTR_VERSION: AtomicU64 = AtomicU64::new(1);

/// CPU-side vertex attribute data plus its GPU layout metadata.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub data: Vec<u8>,
    /// Bumped on every write so backends know when to re-upload.
    pub version: u64,
    pub format: VertexFormat,
    pub count: u32,
    pub stride: u64,
}

impl Attribute {
    /// Creates a planar (non-interleaved) attribute.
    pub fn new_planar<T: bytemuck::Pod>(data: &[T], format: VertexFormat) -> Self {
        Self {
            data: bytemuck::cast_slice(data).to_vec(),
            version: NEXT_ATTR_VERSION.fetch_add(1, Ordering::Relaxed),
            format,
            count: data.len() as u32,
            stride: std::mem::size_of::<T>() as u64,
        }
    }

    /// Overwrites the attribute contents in place.
    pub fn update_data<T: bytemuck::Pod>(&mut self, new_data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(new_data);
        if self.data.len() != bytes.len() {
            self.data.resize(bytes.len(), 0);
        }
        self.data.copy_from_slice(bytes);
        self.count = new_data.len() as u32;
        self.stride = std::mem::size_of::<T>() as u64;
        self.version = NEXT_ATTR_VERSION.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn read_vec3(&self, i: u32) -> Option<Vec3> {
        if self.format != VertexFormat::Float32x3 {
            return None;
        }
        let offset = (i as usize) * self.stride as usize;
        let bytes = self.data.get(offset..offset + 12)?;
        let vals: [f32; 3] = bytemuck::pod_read_unaligned(bytes);
        Some(Vec3::from_array(vals))
    }
}

/// A contiguous index range drawn with one entry of a multi-material slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryGroup {
    pub start: u32,
    pub count: u32,
    pub material_index: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Procedurally built geometry: named attributes, optional `u16` indices and
/// a primitive topology.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub label: Cow<'static, str>,
    pub topology: PrimitiveTopology,
    attributes: FxHashMap<Cow<'static, str>, Attribute>,
    indices: Option<Vec<u16>>,
    groups: Vec<GeometryGroup>,
    bounding_sphere: Option<BoundingSphere>,
}

impl Geometry {
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            topology: PrimitiveTopology::TriangleList,
            attributes: FxHashMap::default(),
            indices: None,
            groups: Vec::new(),
            bounding_sphere: None,
        }
    }

    #[must_use]
    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<Cow<'static, str>>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.get_mut(name)
    }

    pub fn set_indices(&mut self, indices: &[u16]) {
        self.indices = Some(indices.to_vec());
    }

    #[must_use]
    pub fn indices(&self) -> Option<&[u16]> {
        self.indices.as_deref()
    }

    /// Adds a draw group. Ranges address indices when present, vertices otherwise.
    pub fn add_group(&mut self, start: u32, count: u32, material_index: usize) {
        self.groups.push(GeometryGroup {
            start,
            count,
            material_index,
        });
    }

    #[must_use]
    pub fn groups(&self) -> &[GeometryGroup] {
        &self.groups
    }

    #[must_use]
    pub fn vertex_count(&self) -> u32 {
        self.attribute("position").map_or(0, |a| a.count)
    }

    /// Number of elements a draw call consumes (indices when present).
    #[must_use]
    pub fn draw_count(&self) -> u32 {
        self.indices
            .as_ref()
            .map_or_else(|| self.vertex_count(), |i| i.len() as u32)
    }

    /// Total CPU bytes held by attributes and indices.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        let attrs: usize = self.attributes.values().map(|a| a.data.len()).sum();
        attrs + self.indices.as_ref().map_or(0, |i| i.len() * 2)
    }

    #[must_use]
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.bounding_sphere
    }

    /// Recomputes the bounding sphere from the `position` attribute.
    pub fn compute_bounding_volume(&mut self) {
        self.bounding_sphere = self.attribute("position").and_then(bounding_sphere_of);
    }
}

fn bounding_sphere_of(position: &Attribute) -> Option<BoundingSphere> {
    let points: Vec<Vec3> = (0..position.count)
        .filter_map(|i| position.read_vec3(i))
        .collect();
    if points.is_empty() {
        return None;
    }

    let (min, max) = points.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), &p| (min.min(p), max.max(p)),
    );
    let center = (min + max) * 0.5;
    let radius = points
        .iter()
        .map(|p| center.distance_squared(*p))
        .fold(0.0_f32, f32::max)
        .sqrt();

    Some(BoundingSphere { center, radius })
}
