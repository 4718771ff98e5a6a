use crate::constants::DEGENERATE_EPSILON;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

// --- Helper Functions ---

/// Bernoulli roll that tolerates out-of-range probabilities instead of panicking.
#[inline]
pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    probability > 0.0 && rng.r#gen::<f64>() < probability
}

#[inline]
pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    rng.gen_range(0.0..TAU)
}

/// Uniform draw that collapses to `low` for empty or inverted ranges.
#[inline]
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    if angle.is_nan() {
        return 0.0;
    }
    angle.rem_euclid(TAU)
}

/// Unit vector along `v`, substituting a small random offset when `v` is
/// too short to normalize.
pub fn direction_or_jitter<R: Rng + ?Sized>(v: Vec2, rng: &mut R) -> Vec2 {
    if v.length_squared() > DEGENERATE_EPSILON * DEGENERATE_EPSILON {
        return v.normalize();
    }
    let jittered = v + Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
    jittered.try_normalize().unwrap_or(Vec2::X)
}

/// Heading (radians) pointing from `from` to `to`.
pub fn heading_towards<R: Rng + ?Sized>(from: Vec2, to: Vec2, rng: &mut R) -> f32 {
    wrap_angle(direction_or_jitter(to - from, rng).to_angle())
}

/// Heading (radians) pointing from `threat` through `from` and beyond.
pub fn heading_away<R: Rng + ?Sized>(from: Vec2, threat: Vec2, rng: &mut R) -> f32 {
    wrap_angle(direction_or_jitter(from - threat, rng).to_angle())
}

#[inline]
pub fn clamp_to_bounds(position: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(position.x.clamp(0.0, width), position.y.clamp(0.0, height))
}
