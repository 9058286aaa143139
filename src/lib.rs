//! Magic Wishing Tree - a particle tree that grants (no) wishes
//!
//! Core modules:
//! - `sim`: Deterministic choreography (wish sequence, particle animators, gesture feed)
//! - `director`: Drives the sim from a wall clock, the one object a frontend talks to
//! - `renderer`: WebGPU instanced particle pipeline and orbit camera
//! - `platform`: Browser camera access
//! - `tuning`: Data-driven timings and particle counts

pub mod director;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use director::Director;
pub use error::{Error, Result};
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec3;

/// Scene configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, the rate the motion constants were tuned at)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta accepted before clamping (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Camera defaults
    pub const CAMERA_POSITION: [f32; 3] = [0.0, 6.0, 18.0];
    pub const CAMERA_FOV_DEGREES: f32 = 40.0;
    pub const CAMERA_MIN_DISTANCE: f32 = 8.0;
    pub const CAMERA_MAX_DISTANCE: f32 = 25.0;
    pub const CAMERA_MAX_POLAR: f32 = std::f32::consts::PI / 1.7;
    /// Matches a 0.5 auto-rotate speed: one orbit every 120 seconds
    pub const AUTO_ROTATE_SPEED: f32 = 0.5;

    /// Palette (sRGB hex)
    pub const PINK: u32 = 0xFF1493;
    pub const GOLD: u32 = 0xFFD700;
    pub const WHITE: u32 = 0xFFFFFF;
}

/// Convert an sRGB hex color (0xRRGGBB) to linear RGB
pub fn srgb_hex(hex: u32) -> Vec3 {
    fn channel(c: u32) -> f32 {
        let c = c as f32 / 255.0;
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    Vec3::new(
        channel((hex >> 16) & 0xFF),
        channel((hex >> 8) & 0xFF),
        channel(hex & 0xFF),
    )
}

/// Ease-out cubic: fast start, gentle landing
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Ease-in cubic: slow start, accelerating
#[inline]
pub fn ease_in_cubic(t: f32) -> f32 {
    t.powi(3)
}

/// Ease-out quartic
#[inline]
pub fn ease_out_quart(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_hex_endpoints() {
        assert_eq!(srgb_hex(0x000000), Vec3::ZERO);
        let white = srgb_hex(0xFFFFFF);
        assert!((white - Vec3::ONE).length() < 1e-5);
        // Mid grey is darker in linear space
        assert!(srgb_hex(0x808080).x < 0.25);
    }

    #[test]
    fn test_easing_endpoints() {
        for ease in [ease_out_cubic, ease_in_cubic, ease_out_quart] {
            assert!(ease(0.0).abs() < 1e-6);
            assert!((ease(1.0) - 1.0).abs() < 1e-6);
        }
        assert!(ease_out_cubic(0.5) > 0.5);
        assert!(ease_in_cubic(0.5) < 0.5);
    }
}
