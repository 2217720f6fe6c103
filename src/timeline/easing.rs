//! Easing curves over normalized progress `p ∈ [0, 1]`.

/// Quartic ease-out: fast start, soft landing.
#[inline]
#[must_use]
pub fn ease_out_quart(p: f32) -> f32 {
    1.0 - (1.0 - p).powi(4)
}

/// Hermite smoothstep `p²(3 − 2p)`.
#[inline]
#[must_use]
pub fn smoothstep(p: f32) -> f32 {
    p * p * (3.0 - 2.0 * p)
}

/// Maps `p` from `[start, 1]` onto `[0, 1]`, clamped.
#[inline]
#[must_use]
pub fn remap_tail(p: f32, start: f32) -> f32 {
    ((p - start) / (1.0 - start)).clamp(0.0, 1.0)
}
