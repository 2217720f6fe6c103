//! Material Definitions
//!
//! Materials describe how a mesh, point cloud or line set is shaded. They are
//! plain data; the renderer backend decides how to realise them on the GPU.
//!
//! | Kind     | Used for                                   |
//! |----------|--------------------------------------------|
//! | `Basic`  | Unlit surfaces (light beam, pupils)        |
//! | `Phong`  | Lit surfaces (character, weapon, ground)   |
//! | `Points` | Particle field                             |
//! | `Line`   | Grid helper                                |

use std::borrow::Cow;

use bitflags::bitflags;
use glam::Vec3;

/// Which faces are rasterised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// Color blending against what is already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

bitflags! {
    /// Per-material render state toggles.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        const TRANSPARENT = 1 << 0;
        const DEPTH_WRITE = 1 << 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MaterialKind {
    Basic,
    Phong {
        shininess: f32,
        specular: Vec3,
        emissive: Vec3,
    },
    Points {
        size: f32,
    },
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub label: Cow<'static, str>,
    pub kind: MaterialKind,
    pub color: Vec3,
    pub opacity: f32,
    pub side: Side,
    pub blending: Blending,
    pub flags: MaterialFlags,
}

impl Material {
    fn new(label: &'static str, kind: MaterialKind, color: Vec3) -> Self {
        Self {
            label: Cow::Borrowed(label),
            kind,
            color,
            opacity: 1.0,
            side: Side::Front,
            blending: Blending::Normal,
            flags: MaterialFlags::DEPTH_WRITE,
        }
    }

    #[must_use]
    pub fn new_basic(color: Vec3) -> Self {
        Self::new("MeshBasicMaterial", MaterialKind::Basic, color)
    }

    #[must_use]
    pub fn new_phong(color: Vec3) -> Self {
        Self::new(
            "MeshPhongMaterial",
            MaterialKind::Phong {
                shininess: 30.0,
                specular: Vec3::splat(0x11 as f32 / 255.0),
                emissive: Vec3::ZERO,
            },
            color,
        )
    }

    #[must_use]
    pub fn new_points(color: Vec3, size: f32) -> Self {
        Self::new("PointsMaterial", MaterialKind::Points { size }, color)
    }

    #[must_use]
    pub fn new_line(color: Vec3) -> Self {
        Self::new("LineBasicMaterial", MaterialKind::Line, color)
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the opacity and marks the material transparent.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.flags.insert(MaterialFlags::TRANSPARENT);
        self
    }

    #[must_use]
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Additive blending never writes depth.
    #[must_use]
    pub fn with_blending(mut self, blending: Blending) -> Self {
        self.blending = blending;
        if blending == Blending::Additive {
            self.flags.remove(MaterialFlags::DEPTH_WRITE);
        }
        self
    }

    #[must_use]
    pub fn with_shininess(mut self, value: f32) -> Self {
        if let MaterialKind::Phong { shininess, .. } = &mut self.kind {
            *shininess = value;
        }
        self
    }

    #[must_use]
    pub fn with_specular(mut self, value: Vec3) -> Self {
        if let MaterialKind::Phong { specular, .. } = &mut self.kind {
            *specular = value;
        }
        self
    }

    #[must_use]
    pub fn with_emissive(mut self, value: Vec3) -> Self {
        if let MaterialKind::Phong { emissive, .. } = &mut self.kind {
            *emissive = value;
        }
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: MaterialFlags) -> Self {
        self.flags.insert(flags);
        self
    }

    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.flags.contains(MaterialFlags::TRANSPARENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_marks_transparent() {
        let m = Material::new_basic(Vec3::ONE).with_opacity(0.3);
        assert!(m.is_transparent());
        assert!((m.opacity - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn additive_disables_depth_write() {
        let m = Material::new_points(Vec3::ONE, 0.1).with_blending(Blending::Additive);
        assert!(!m.flags.contains(MaterialFlags::DEPTH_WRITE));
    }

    #[test]
    fn phong_setters_ignore_other_kinds() {
        let m = Material::new_basic(Vec3::ONE).with_shininess(80.0);
        assert_eq!(m.kind, MaterialKind::Basic);
    }
}
