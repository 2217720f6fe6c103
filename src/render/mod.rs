//! Rendering
//!
//! [`RenderBackend`] is the seam between the intro and a GPU (or no GPU):
//! - [`HeadlessRenderer`]: records allocations and frames, always available
//! - [`WgpuRenderer`](wgpu::WgpuRenderer): draws into a window surface
//!   (feature `wgpu-renderer`)
//!
//! A backend mirrors the [`ResourceArena`]: every geometry and material key
//! is announced once through `allocate_*` and returned once through
//! `release_*`. The scene and camera are passed in read-only on every frame.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec4;

use crate::errors::Result;
use crate::host::Viewport;
use crate::resources::{Geometry, GeometryKey, Material, MaterialKey, ResourceArena};
use crate::scene::{Camera, Scene};

pub mod headless;
#[cfg(feature = "wgpu-renderer")]
pub mod wgpu;

pub use headless::{HeadlessRenderer, RenderLog, SharedRenderLog};

static NEXT_SURFACE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a rendering surface, used by the host to mount and unmount it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Returns a process-unique surface id.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_SURFACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A renderer the intro can draw through.
pub trait RenderBackend {
    /// The surface this renderer presents to.
    fn surface(&self) -> SurfaceId;

    /// Uploads a geometry. Failure aborts the scene build.
    fn allocate_geometry(&mut self, key: GeometryKey, geometry: &Geometry) -> Result<()>;

    fn allocate_material(&mut self, key: MaterialKey, material: &Material) -> Result<()>;

    /// Frees the backend side of a geometry. Unknown keys are ignored.
    fn release_geometry(&mut self, key: GeometryKey);

    fn release_material(&mut self, key: MaterialKey);

    fn set_size(&mut self, viewport: Viewport);

    fn set_clear_color(&mut self, color: Vec4);

    /// Draws one frame. Failures are logged and swallowed by the backend.
    fn render(&mut self, scene: &Scene, camera: &Camera, resources: &ResourceArena);

    /// Releases the device-level state. Called once, last.
    fn dispose(&mut self);
}
