//! Resource Lifecycle
//!
//! The individual steps of an intro teardown. Each step is idempotent on its
//! own: releasing through the [`ResourceArena`] yields a resource at most
//! once, so shared geometries and materials (and a second teardown) are
//! skipped naturally.

use std::fmt;

use crate::render::RenderBackend;
use crate::resources::{BufferKey, GeometryKey, MaterialKey, ResourceArena, ResourceCounts};
use crate::scene::Scene;

/// What one teardown call released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub timers_cancelled: usize,
    pub scheduler_cancelled: bool,
    pub resize_unsubscribed: bool,
    /// Resources released by the scene graph traversal.
    pub graph: ResourceCounts,
    /// Resources released outside the graph, including the sweep of a
    /// partially built scene.
    pub detached: ResourceCounts,
    pub surface_detached: bool,
    pub renderer_disposed: bool,
}

impl TeardownReport {
    #[must_use]
    pub fn released(&self) -> ResourceCounts {
        let mut total = self.graph;
        total += self.detached;
        total
    }

    /// `true` when the call found nothing left to do.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.timers_cancelled == 0
            && !self.scheduler_cancelled
            && !self.resize_unsubscribed
            && self.released().is_zero()
            && !self.surface_detached
            && !self.renderer_disposed
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let released = self.released();
        write!(
            f,
            "timers={} scheduler={} geometries={} materials={} buffers={} surface={} renderer={}",
            self.timers_cancelled,
            self.scheduler_cancelled,
            released.geometries,
            released.materials,
            released.buffers,
            self.surface_detached,
            self.renderer_disposed,
        )
    }
}

fn release_geometry<R: RenderBackend>(
    arena: &mut ResourceArena,
    renderer: &mut Option<R>,
    key: GeometryKey,
) -> bool {
    if arena.release_geometry(key).is_none() {
        return false;
    }
    if let Some(renderer) = renderer {
        renderer.release_geometry(key);
    }
    true
}

fn release_material<R: RenderBackend>(
    arena: &mut ResourceArena,
    renderer: &mut Option<R>,
    key: MaterialKey,
) -> bool {
    if arena.release_material(key).is_none() {
        return false;
    }
    if let Some(renderer) = renderer {
        renderer.release_material(key);
    }
    true
}

/// Walks the graph depth-first and releases every renderable's geometry and
/// material(s).
pub fn release_scene_graph<R: RenderBackend>(
    scene: &Scene,
    arena: &mut ResourceArena,
    renderer: &mut Option<R>,
) -> ResourceCounts {
    let mut released = ResourceCounts::default();
    scene.traverse(|_, node| {
        let Some(renderable) = node.kind.renderable() else {
            return;
        };
        if release_geometry(arena, renderer, renderable.geometry) {
            released.geometries += 1;
        }
        for material in renderable.materials.iter() {
            if release_material(arena, renderer, material) {
                released.materials += 1;
            }
        }
    });
    released
}

/// Releases the raw buffers that live outside the graph.
pub fn release_buffers(arena: &mut ResourceArena, keys: &[BufferKey]) -> ResourceCounts {
    let buffers = keys
        .iter()
        .filter(|&&key| arena.release_buffer(key).is_some())
        .count();
    ResourceCounts {
        buffers,
        ..Default::default()
    }
}

/// Releases everything still outstanding in the arena.
pub fn sweep_arena<R: RenderBackend>(
    arena: &mut ResourceArena,
    renderer: &mut Option<R>,
) -> ResourceCounts {
    let (geometries, materials, buffers) = arena.outstanding_keys();
    let mut released = release_buffers(arena, &buffers);
    released.geometries = geometries
        .into_iter()
        .filter(|&key| release_geometry(arena, renderer, key))
        .count();
    released.materials = materials
        .into_iter()
        .filter(|&key| release_material(arena, renderer, key))
        .count();
    if !released.is_zero() {
        log::debug!(
            "swept {} resources left outside the scene graph",
            released.total()
        );
    }
    released
}
