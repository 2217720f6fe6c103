use glam::{Affine3A, Mat4, Vec3};
use slotmap::SlotMap;

use crate::resources::color;
use crate::scene::NodeKey;
use crate::scene::light::{Light, LightKind, ShadowConfig};
use crate::scene::node::{Node, NodeKind, Renderable};

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub near: f32,
    pub far: f32,
}

impl Fog {
    #[must_use]
    pub fn new(color: Vec3, near: f32, far: f32) -> Self {
        Self { color, near, far }
    }
}

/// A renderable node flattened for drawing.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub node: NodeKey,
    pub kind: &'a NodeKind,
    pub renderable: &'a Renderable,
    pub world_matrix: Affine3A,
}

/// The directional light whose shadow map is rendered this frame.
#[derive(Debug, Clone, Copy)]
pub struct ShadowLight<'a> {
    pub light: &'a Light,
    pub config: &'a ShadowConfig,
    pub position: Vec3,
    pub view_projection: Mat4,
}

/// Single owning scene tree.
///
/// Every node lives in one slot map and is reachable from [`Scene::root`].
/// Resources referenced by nodes live in the
/// [`ResourceArena`](crate::resources::ResourceArena), never in the tree.
#[derive(Debug)]
pub struct Scene {
    nodes: SlotMap<NodeKey, Node>,
    root: NodeKey,

    pub background: Vec3,
    pub fog: Option<Fog>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::group("Scene"));
        Self {
            nodes,
            root,
            background: color::rgb(0x000000),
            fog: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Adds a node under the scene root.
    pub fn add(&mut self, node: Node) -> NodeKey {
        self.add_to_parent(node, self.root)
    }

    /// Adds a node under `parent`. An unknown parent falls back to the root.
    pub fn add_to_parent(&mut self, mut node: Node, parent: NodeKey) -> NodeKey {
        let parent = if self.nodes.contains_key(parent) {
            parent
        } else {
            log::warn!("add_to_parent: unknown parent {parent:?}, attaching to root");
            self.root
        };
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(key);
        }
        key
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.nodes.get_mut(key)
    }

    #[must_use]
    pub fn light(&self, key: NodeKey) -> Option<&Light> {
        self.nodes.get(key).and_then(Node::light_ref)
    }

    pub fn light_mut(&mut self, key: NodeKey) -> Option<&mut Light> {
        self.nodes.get_mut(key).and_then(Node::light_mut)
    }

    /// Number of nodes including the root.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes
            .iter()
            .find_map(|(key, node)| (node.name == name).then_some(key))
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Depth-first, pre-order visit of every node reachable from the root.
    /// Children are visited in insertion order.
    pub fn traverse(&self, mut visit: impl FnMut(NodeKey, &Node)) {
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            visit(key, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Pre-order key list of every node reachable from the root.
    #[must_use]
    pub fn depth_first(&self) -> Vec<NodeKey> {
        let mut keys = Vec::with_capacity(self.nodes.len());
        self.traverse(|key, _| keys.push(key));
        keys
    }

    /// Propagates local matrices down the tree.
    pub fn update_world_matrices(&mut self) {
        let mut stack = vec![(self.root, Affine3A::IDENTITY)];
        while let Some((key, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(key) else {
                continue;
            };
            node.transform.update_local_matrix();
            let world = parent_world * node.transform.local_matrix;
            node.transform.set_world_matrix(world);
            stack.extend(node.children.iter().map(|&child| (child, world)));
        }
    }

    /// World position of a node, from the last [`update_world_matrices`](Self::update_world_matrices).
    #[must_use]
    pub fn world_position(&self, key: NodeKey) -> Option<Vec3> {
        self.nodes
            .get(key)
            .map(|n| Vec3::from(n.transform.world_matrix.translation))
    }

    /// Pre-order walk that skips hidden nodes together with their subtrees.
    fn visit_visible<'a>(&'a self, mut visit: impl FnMut(NodeKey, &'a Node)) {
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            visit(key, node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Visible renderables in draw order. A hidden node hides its subtree.
    #[must_use]
    pub fn draw_items(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        self.visit_visible(|key, node| {
            if let Some(renderable) = node.kind.renderable() {
                items.push(DrawItem {
                    node: key,
                    kind: &node.kind,
                    renderable,
                    world_matrix: node.transform.world_matrix,
                });
            }
        });
        items
    }

    /// Visible lights with their world positions.
    #[must_use]
    pub fn lights(&self) -> Vec<(&Light, Vec3)> {
        let mut lights = Vec::new();
        self.visit_visible(|_, node| {
            if let NodeKind::Light(light) = &node.kind {
                lights.push((light, Vec3::from(node.transform.world_matrix.translation)));
            }
        });
        lights
    }

    /// First visible directional light that casts shadows.
    ///
    /// Only one light gets a shadow map; further casting lights are lit
    /// without shadows.
    #[must_use]
    pub fn shadow_light(&self) -> Option<ShadowLight<'_>> {
        self.lights().into_iter().find_map(|(light, position)| {
            let LightKind::Directional { target } = light.kind else {
                return None;
            };
            let config = light.shadow.as_ref().filter(|_| light.cast_shadows)?;
            Some(ShadowLight {
                light,
                config,
                position,
                view_projection: config.view_projection(position, target),
            })
        })
    }

    /// Visible meshes flagged to cast shadows. Points and lines never do.
    #[must_use]
    pub fn shadow_casters(&self) -> Vec<DrawItem<'_>> {
        self.draw_items()
            .into_iter()
            .filter(|item| {
                matches!(item.kind, NodeKind::Mesh(_)) && item.renderable.cast_shadow
            })
            .collect()
    }
}
