use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec4;
use rustc_hash::FxHashSet;

use crate::errors::{LandfallError, Result};
use crate::host::Viewport;
use crate::render::{RenderBackend, SurfaceId};
use crate::resources::{Geometry, GeometryKey, Material, MaterialKey, ResourceArena};
use crate::scene::{Camera, Scene};

/// Everything a [`HeadlessRenderer`] observed.
#[derive(Debug, Default, Clone)]
pub struct RenderLog {
    pub live_geometries: FxHashSet<GeometryKey>,
    pub live_materials: FxHashSet<MaterialKey>,
    pub geometry_allocations: usize,
    pub geometry_releases: usize,
    pub material_allocations: usize,
    pub material_releases: usize,
    /// Releases of keys that were never allocated or were already released.
    pub stray_releases: usize,
    pub frames: usize,
    /// Draw items submitted by the last frame.
    pub last_draw_count: usize,
    /// Draw items whose geometry was not allocated.
    pub missing_geometries: usize,
    /// Frames that rendered a shadow map.
    pub shadow_passes: usize,
    /// Shadow casters drawn into the last frame's shadow map.
    pub last_shadow_casters: usize,
    pub viewport: Option<Viewport>,
    pub resizes: usize,
    pub clear_color: Option<Vec4>,
    pub disposed: bool,
}

impl RenderLog {
    /// Allocations not yet released.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.live_geometries.len() + self.live_materials.len()
    }
}

/// Log shared between a renderer and whoever created it.
pub type SharedRenderLog = Rc<RefCell<RenderLog>>;

/// A backend without a GPU.
///
/// Tracks every allocation, release and frame in a [`RenderLog`] that the
/// creator can keep a handle to after the renderer itself has been dropped.
#[derive(Debug)]
pub struct HeadlessRenderer {
    surface: SurfaceId,
    log: SharedRenderLog,
    geometry_budget: Option<usize>,
    shadows: bool,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        let log = SharedRenderLog::default();
        log.borrow_mut().viewport = Some(viewport);
        Self {
            surface: SurfaceId::next(),
            log,
            geometry_budget: None,
            shadows: false,
        }
    }

    /// Records a shadow pass on frames with a shadow-casting light.
    #[must_use]
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows = enabled;
        self
    }

    /// Refuses geometry allocations once `budget` geometries are live.
    #[must_use]
    pub fn with_geometry_budget(mut self, budget: usize) -> Self {
        self.geometry_budget = Some(budget);
        self
    }

    #[must_use]
    pub fn log(&self) -> SharedRenderLog {
        Rc::clone(&self.log)
    }
}

impl RenderBackend for HeadlessRenderer {
    fn surface(&self) -> SurfaceId {
        self.surface
    }

    fn allocate_geometry(&mut self, key: GeometryKey, geometry: &Geometry) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if let Some(budget) = self.geometry_budget
            && log.live_geometries.len() >= budget
        {
            return Err(LandfallError::GpuAllocation {
                label: geometry.label.to_string(),
                reason: format!("geometry budget of {budget} exhausted"),
            });
        }
        log.live_geometries.insert(key);
        log.geometry_allocations += 1;
        Ok(())
    }

    fn allocate_material(&mut self, key: MaterialKey, _material: &Material) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.live_materials.insert(key);
        log.material_allocations += 1;
        Ok(())
    }

    fn release_geometry(&mut self, key: GeometryKey) {
        let mut log = self.log.borrow_mut();
        if log.live_geometries.remove(&key) {
            log.geometry_releases += 1;
        } else {
            log.stray_releases += 1;
        }
    }

    fn release_material(&mut self, key: MaterialKey) {
        let mut log = self.log.borrow_mut();
        if log.live_materials.remove(&key) {
            log.material_releases += 1;
        } else {
            log.stray_releases += 1;
        }
    }

    fn set_size(&mut self, viewport: Viewport) {
        let mut log = self.log.borrow_mut();
        log.viewport = Some(viewport);
        log.resizes += 1;
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.log.borrow_mut().clear_color = Some(color);
    }

    fn render(&mut self, scene: &Scene, _camera: &Camera, _resources: &ResourceArena) {
        let mut log = self.log.borrow_mut();
        let items = scene.draw_items();
        let missing = items
            .iter()
            .filter(|item| !log.live_geometries.contains(&item.renderable.geometry))
            .count();
        log.missing_geometries += missing;
        log.last_draw_count = items.len();

        log.last_shadow_casters = 0;
        if self.shadows && scene.shadow_light().is_some() {
            log.shadow_passes += 1;
            log.last_shadow_casters = scene.shadow_casters().len();
        }
        log.frames += 1;
    }

    fn dispose(&mut self) {
        self.log.borrow_mut().disposed = true;
    }
}
