use std::borrow::Cow;

use smallvec::SmallVec;

use crate::resources::{GeometryKey, MaterialKey};
use crate::scene::NodeKey;
use crate::scene::light::Light;
use crate::scene::transform::Transform;

/// One material or one per geometry group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialSlot {
    Single(MaterialKey),
    Multi(SmallVec<[MaterialKey; 2]>),
}

impl MaterialSlot {
    /// Iterates the material keys in slot order.
    pub fn iter(&self) -> impl Iterator<Item = MaterialKey> + '_ {
        let keys: &[MaterialKey] = match self {
            Self::Single(key) => std::slice::from_ref(key),
            Self::Multi(keys) => keys.as_slice(),
        };
        keys.iter().copied()
    }

    /// Material for a geometry group index; single slots serve every group.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<MaterialKey> {
        match self {
            Self::Single(key) => Some(*key),
            Self::Multi(keys) => keys.get(index).copied(),
        }
    }
}

impl From<MaterialKey> for MaterialSlot {
    fn from(key: MaterialKey) -> Self {
        Self::Single(key)
    }
}

/// Geometry + material(s) drawn by a mesh, points or line node.
#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub geometry: GeometryKey,
    pub materials: MaterialSlot,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Renderable {
    #[must_use]
    pub fn new(geometry: GeometryKey, materials: impl Into<MaterialSlot>) -> Self {
        Self {
            geometry,
            materials: materials.into(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(Renderable),
    Points(Renderable),
    LineSegments(Renderable),
    Light(Light),
}

impl NodeKind {
    #[must_use]
    pub fn renderable(&self) -> Option<&Renderable> {
        match self {
            Self::Mesh(r) | Self::Points(r) | Self::LineSegments(r) => Some(r),
            Self::Group | Self::Light(_) => None,
        }
    }
}

/// A scene graph node.
///
/// Hierarchy links are set when the node is inserted into a
/// [`Scene`](crate::scene::Scene) and are not restructured afterwards; the
/// animation only mutates transforms, visibility and component values in
/// place.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Cow<'static, str>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub transform: Transform,
    /// Hidden nodes hide their whole subtree.
    pub visible: bool,
    pub kind: NodeKind,
}

impl Node {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            kind,
        }
    }

    #[must_use]
    pub fn group(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    #[must_use]
    pub fn mesh(name: impl Into<Cow<'static, str>>, renderable: Renderable) -> Self {
        Self::new(name, NodeKind::Mesh(renderable))
    }

    #[must_use]
    pub fn light(name: impl Into<Cow<'static, str>>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn light_ref(&self) -> Option<&Light> {
        match &self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    #[inline]
    pub fn light_mut(&mut self) -> Option<&mut Light> {
        match &mut self.kind {
            NodeKind::Light(light) => Some(light),
            _ => None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.position = glam::Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.rotation = glam::Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.transform.scale = glam::Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Marks the renderable as a shadow caster. No-op for groups and lights.
    #[must_use]
    pub fn casting_shadow(mut self) -> Self {
        if let NodeKind::Mesh(r) | NodeKind::Points(r) | NodeKind::LineSegments(r) = &mut self.kind {
            r.cast_shadow = true;
        }
        self
    }

    #[must_use]
    pub fn receiving_shadow(mut self) -> Self {
        if let NodeKind::Mesh(r) | NodeKind::Points(r) | NodeKind::LineSegments(r) = &mut self.kind {
            r.receive_shadow = true;
        }
        self
    }
}
