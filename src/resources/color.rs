//! sRGB hex color helpers.

use glam::{Vec3, Vec4};

/// Converts a `0xRRGGBB` sRGB literal into `Vec3` components in `[0, 1]`.
#[must_use]
pub const fn rgb(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Same as [`rgb`] with an explicit alpha channel.
#[must_use]
pub const fn rgba(hex: u32, alpha: f32) -> Vec4 {
    let c = rgb(hex);
    Vec4::new(c.x, c.y, c.z, alpha)
}

/// Decodes sRGB-encoded components to linear light.
#[must_use]
pub fn srgb_to_linear(c: Vec3) -> Vec3 {
    let decode = |v: f32| {
        if v <= 0.04045 {
            v / 12.92
        } else {
            ((v + 0.055) / 1.055).powf(2.4)
        }
    };
    Vec3::new(decode(c.x), decode(c.y), decode(c.z))
}

// Palette of the intro scene.
pub const BACKGROUND: u32 = 0xfaf4ed;
pub const SURFACE: u32 = 0xfffaf3;
pub const IRIS: u32 = 0x907aa9;
pub const ROSE: u32 = 0xd7827e;
pub const GOLD: u32 = 0xea9d34;
pub const FOAM: u32 = 0x56949f;
pub const LOVE: u32 = 0xb42318;
pub const PINE: u32 = 0x286983;
pub const TEXT: u32 = 0x575279;
pub const OVERLAY: u32 = 0xf2e9e1;
pub const SUBTLE: u32 = 0x797593;
pub const MUTED: u32 = 0x9893a5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_splits_channels() {
        let c = rgb(0xff8000);
        assert!((c.x - 1.0).abs() < 1e-6);
        assert!((c.y - 128.0 / 255.0).abs() < 1e-6);
        assert!(c.z.abs() < 1e-6);
    }

    #[test]
    fn rgba_keeps_alpha() {
        assert!((rgba(BACKGROUND, 0.5).w - 0.5).abs() < 1e-6);
    }
}
