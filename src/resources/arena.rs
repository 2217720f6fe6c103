//! Resource Arena
//!
//! Single owner of every geometry, material and raw buffer allocated for an
//! intro sequence. Scene nodes hold only keys into the arena, so shared
//! resources (one hair material on nine meshes, one arm geometry on two arms)
//! have exactly one owner and exactly one release.
//!
//! Releasing a key removes the entry from its slot map; a second release of
//! the same key finds nothing and returns `None`. At-most-once release is a
//! property of the data structure rather than of caller discipline.

use std::borrow::Cow;

use slotmap::{SlotMap, new_key_type};

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

new_key_type! {
    pub struct GeometryKey;
    pub struct MaterialKey;
    pub struct BufferKey;
}

/// Raw `f32` storage that lives outside the scene graph (the particle
/// position buffer).
#[derive(Debug, Clone, PartialEq)]
pub struct RawBuffer {
    pub label: Cow<'static, str>,
    pub data: Vec<f32>,
}

impl RawBuffer {
    #[must_use]
    pub fn new(label: impl Into<Cow<'static, str>>, data: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }

    /// Views the buffer as packed `[x, y, z]` triples. A trailing partial
    /// triple is ignored.
    #[must_use]
    pub fn as_vec3s(&self) -> &[[f32; 3]] {
        let whole = self.data.len() / 3 * 3;
        bytemuck::cast_slice(&self.data[..whole])
    }

    pub fn as_vec3s_mut(&mut self) -> &mut [[f32; 3]] {
        let whole = self.data.len() / 3 * 3;
        bytemuck::cast_slice_mut(&mut self.data[..whole])
    }
}

/// Per-kind resource counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub geometries: usize,
    pub materials: usize,
    pub buffers: usize,
}

impl ResourceCounts {
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.geometries + self.materials + self.buffers
    }

    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

impl std::ops::AddAssign for ResourceCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.geometries += rhs.geometries;
        self.materials += rhs.materials;
        self.buffers += rhs.buffers;
    }
}

#[derive(Debug, Default)]
pub struct ResourceArena {
    geometries: SlotMap<GeometryKey, Geometry>,
    materials: SlotMap<MaterialKey, Material>,
    buffers: SlotMap<BufferKey, RawBuffer>,

    allocated: ResourceCounts,
    released: ResourceCounts,
}

impl ResourceArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryKey {
        self.allocated.geometries += 1;
        self.geometries.insert(geometry)
    }

    pub fn add_material(&mut self, material: Material) -> MaterialKey {
        self.allocated.materials += 1;
        self.materials.insert(material)
    }

    pub fn add_buffer(&mut self, buffer: RawBuffer) -> BufferKey {
        self.allocated.buffers += 1;
        self.buffers.insert(buffer)
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.get(key)
    }

    pub fn geometry_mut(&mut self, key: GeometryKey) -> Option<&mut Geometry> {
        self.geometries.get_mut(key)
    }

    #[must_use]
    pub fn material(&self, key: MaterialKey) -> Option<&Material> {
        self.materials.get(key)
    }

    pub fn material_mut(&mut self, key: MaterialKey) -> Option<&mut Material> {
        self.materials.get_mut(key)
    }

    #[must_use]
    pub fn buffer(&self, key: BufferKey) -> Option<&RawBuffer> {
        self.buffers.get(key)
    }

    pub fn buffer_mut(&mut self, key: BufferKey) -> Option<&mut RawBuffer> {
        self.buffers.get_mut(key)
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Releases a geometry. Returns `None` if it was already released.
    pub fn release_geometry(&mut self, key: GeometryKey) -> Option<Geometry> {
        let geometry = self.geometries.remove(key)?;
        self.released.geometries += 1;
        Some(geometry)
    }

    /// Releases a material. Returns `None` if it was already released.
    pub fn release_material(&mut self, key: MaterialKey) -> Option<Material> {
        let material = self.materials.remove(key)?;
        self.released.materials += 1;
        Some(material)
    }

    /// Releases a raw buffer. Returns `None` if it was already released.
    pub fn release_buffer(&mut self, key: BufferKey) -> Option<RawBuffer> {
        let buffer = self.buffers.remove(key)?;
        self.released.buffers += 1;
        Some(buffer)
    }

    /// Keys of everything still outstanding, for sweeping up resources that
    /// never made it into the scene graph.
    #[must_use]
    pub fn outstanding_keys(&self) -> (Vec<GeometryKey>, Vec<MaterialKey>, Vec<BufferKey>) {
        (
            self.geometries.keys().collect(),
            self.materials.keys().collect(),
            self.buffers.keys().collect(),
        )
    }

    // ========================================================================
    // Accounting
    // ========================================================================

    /// Resources currently alive.
    #[must_use]
    pub fn outstanding(&self) -> ResourceCounts {
        ResourceCounts {
            geometries: self.geometries.len(),
            materials: self.materials.len(),
            buffers: self.buffers.len(),
        }
    }

    /// Resources ever allocated by this arena.
    #[must_use]
    pub fn allocated(&self) -> ResourceCounts {
        self.allocated
    }

    /// Resources released so far.
    #[must_use]
    pub fn released(&self) -> ResourceCounts {
        self.released
    }
}
