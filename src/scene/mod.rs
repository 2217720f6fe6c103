//! Scene Graph
//!
//! The intro's scene graph:
//! - [`Scene`]: single owning tree of [`Node`]s in a slot map
//! - [`Node`]: hierarchy, [`Transform`] and a [`NodeKind`] component
//! - [`Camera`]: perspective camera kept outside the tree
//! - [`Light`]: ambient / directional / point light components

pub mod camera;
pub mod light;
pub mod node;
pub mod scene;
pub mod transform;

pub use camera::Camera;
pub use light::{Light, LightKind, ShadowConfig};
pub use node::{MaterialSlot, Node, NodeKind, Renderable};
pub use scene::{DrawItem, Fog, Scene, ShadowLight};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeKey;
}
