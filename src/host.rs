//! Host Bridge
//!
//! The seam between the intro and whatever hosts it (a native window, a test
//! harness). The host implements [`MountPoint`]: it reports the viewport,
//! creates the renderer and owns the place the rendering surface is mounted.

use crate::errors::Result;
use crate::render::{RenderBackend, SurfaceId};
use crate::settings::RendererOptions;

/// Drawable size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; `1.0` for an empty viewport.
    #[must_use]
    pub fn aspect(&self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Host-side mount point of an intro sequence.
pub trait MountPoint {
    type Renderer: RenderBackend;

    /// Current drawable size.
    fn viewport(&self) -> Viewport;

    /// Creates the renderer that draws into a surface for this mount.
    fn create_renderer(&mut self, options: &RendererOptions) -> Result<Self::Renderer>;

    /// Mounts the renderer's surface.
    fn attach_surface(&mut self, surface: SurfaceId);

    /// Unmounts the surface. Called only when [`contains_surface`](Self::contains_surface)
    /// reports it as mounted.
    fn detach_surface(&mut self, surface: SurfaceId);

    fn contains_surface(&self, surface: SurfaceId) -> bool;
}
