use glam::{Mat4, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct ShadowConfig {
    pub bias: f32,
    pub normal_bias: f32,
    pub map_size: u32,
    /// Orthographic shadow camera half extent.
    pub extent: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            bias: 0.005,
            normal_bias: 0.02,
            map_size: 1024,
            extent: 20.0,
            near: 0.1,
            far: 50.0,
        }
    }
}

impl ShadowConfig {
    /// Orthographic view-projection of a light at `position` looking at
    /// `target`. Depth maps to `0..1`.
    #[must_use]
    pub fn view_projection(&self, position: Vec3, target: Vec3) -> Mat4 {
        let direction = target - position;
        let direction = if direction.length_squared() > 1e-6 {
            direction.normalize()
        } else {
            Vec3::NEG_Y
        };
        let up = if direction.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };

        let view = Mat4::look_at_rh(position, position + direction, up);
        let e = self.extent;
        let proj = Mat4::orthographic_rh(-e, e, -e, e, self.near, self.far);
        proj * view
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightKind {
    Ambient,
    /// Shines from the node position towards `target`.
    Directional { target: Vec3 },
    Point { range: f32 },
}

/// Light component of a scene node. Position comes from the node transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
    pub cast_shadows: bool,
    pub shadow: Option<ShadowConfig>,
}

impl Light {
    fn with_kind(color: Vec3, intensity: f32, kind: LightKind) -> Self {
        Self {
            color,
            intensity,
            kind,
            cast_shadows: false,
            shadow: None,
        }
    }

    #[must_use]
    pub fn new_ambient(color: Vec3, intensity: f32) -> Self {
        Self::with_kind(color, intensity, LightKind::Ambient)
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self::with_kind(color, intensity, LightKind::Directional { target: Vec3::ZERO })
    }

    /// `range` is the distance at which the light's contribution reaches zero.
    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self::with_kind(color, intensity, LightKind::Point { range })
    }

    #[must_use]
    pub fn with_shadows(mut self, shadow: ShadowConfig) -> Self {
        self.cast_shadows = true;
        self.shadow = Some(shadow);
        self
    }
}
