#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod host;
pub mod intro;
pub mod render;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod timeline;

pub use errors::{LandfallError, Result};
pub use host::{MountPoint, Viewport};
pub use intro::{IntroSequencer, SceneHandles, TeardownReport};
pub use render::{HeadlessRenderer, RenderBackend, SurfaceId};
pub use resources::{Geometry, Material, ResourceArena};
pub use scene::{Camera, Light, Node, Scene};
pub use settings::{IntroSettings, PhaseTimings, RendererOptions};
pub use timeline::{Phase, Timeline, TimelineController};

#[cfg(feature = "wgpu-renderer")]
pub use render::wgpu::WgpuRenderer;
