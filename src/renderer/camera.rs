//! Orbit camera
//!
//! Spherical coordinates around the origin. Drag input and auto-rotate feed
//! angular deltas that are applied with damping, one fraction per frame.

use glam::{Mat4, Vec3};
use std::f32::consts::TAU;

use crate::consts::{
    AUTO_ROTATE_SPEED, CAMERA_FOV_DEGREES, CAMERA_MAX_DISTANCE, CAMERA_MAX_POLAR,
    CAMERA_MIN_DISTANCE, CAMERA_POSITION,
};

/// Fraction of the pending rotation applied each frame
const DAMPING: f32 = 0.05;
/// Distance factor per wheel notch
const ZOOM_STEP: f32 = 0.95;
/// Keeps the camera off the pole
const MIN_POLAR: f32 = 1e-3;
const NEAR: f32 = 0.1;
const FAR: f32 = 200.0;

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    azimuth: f32,
    polar: f32,
    distance: f32,
    azimuth_delta: f32,
    polar_delta: f32,
    fov_y: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::looking_from(Vec3::from_array(CAMERA_POSITION))
    }
}

impl OrbitCamera {
    /// Camera at `eye`, looking at the origin
    pub fn looking_from(eye: Vec3) -> Self {
        let distance = eye
            .length()
            .clamp(CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE);
        let polar = (eye.y / eye.length().max(f32::EPSILON)).clamp(-1.0, 1.0).acos();
        Self {
            azimuth: eye.x.atan2(eye.z),
            polar: polar.clamp(MIN_POLAR, CAMERA_MAX_POLAR),
            distance,
            azimuth_delta: 0.0,
            polar_delta: 0.0,
            fov_y: CAMERA_FOV_DEGREES.to_radians(),
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_p, cos_p) = self.polar.sin_cos();
        let (sin_a, cos_a) = self.azimuth.sin_cos();
        Vec3::new(sin_p * sin_a, cos_p, sin_p * cos_a) * self.distance
    }

    /// Pointer drag in CSS pixels. A drag the height of the viewport is one turn.
    pub fn drag(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.azimuth_delta -= TAU * dx / h;
        self.polar_delta -= TAU * dy / h;
    }

    /// Wheel zoom; positive `delta_y` moves away
    pub fn zoom(&mut self, delta_y: f32) {
        if delta_y > 0.0 {
            self.distance /= ZOOM_STEP;
        } else if delta_y < 0.0 {
            self.distance *= ZOOM_STEP;
        }
        self.distance = self.distance.clamp(CAMERA_MIN_DISTANCE, CAMERA_MAX_DISTANCE);
    }

    /// Per-frame update. `dt` is seconds since the previous frame.
    pub fn update(&mut self, dt: f32, auto_rotate: bool) {
        if auto_rotate {
            // Under damping the applied rate converges to this rate
            self.azimuth_delta -= Self::auto_rotate_rate() * dt;
        }

        self.azimuth += self.azimuth_delta * DAMPING;
        self.polar = (self.polar + self.polar_delta * DAMPING).clamp(MIN_POLAR, CAMERA_MAX_POLAR);

        self.azimuth_delta *= 1.0 - DAMPING;
        self.polar_delta *= 1.0 - DAMPING;
        self.azimuth = self.azimuth.rem_euclid(TAU);
    }

    /// Auto-rotate speed in rad/s: 0.5 of an orbit per 60 s unit
    pub fn auto_rotate_rate() -> f32 {
        TAU / 60.0 * AUTO_ROTATE_SPEED
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), Vec3::ZERO, Vec3::Y)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), NEAR, FAR) * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_configured_eye() {
        let cam = OrbitCamera::default();
        let eye = cam.eye();
        assert!((eye - Vec3::new(0.0, 6.0, 18.0)).length() < 1e-3);
        assert!(cam.azimuth().abs() < 1e-6);
    }

    #[test]
    fn test_zoom_clamped() {
        let mut cam = OrbitCamera::default();
        for _ in 0..200 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.distance(), CAMERA_MIN_DISTANCE);
        for _ in 0..200 {
            cam.zoom(1.0);
        }
        assert_eq!(cam.distance(), CAMERA_MAX_DISTANCE);
        cam.zoom(0.0);
        assert_eq!(cam.distance(), CAMERA_MAX_DISTANCE);
    }

    #[test]
    fn test_polar_clamped() {
        let mut cam = OrbitCamera::default();
        // Drag far downward, pushing the camera under the tree
        cam.drag(0.0, -10_000.0, 800.0);
        for _ in 0..600 {
            cam.update(1.0 / 60.0, false);
        }
        assert!(cam.polar() <= CAMERA_MAX_POLAR + 1e-6);

        cam.drag(0.0, 10_000.0, 800.0);
        for _ in 0..600 {
            cam.update(1.0 / 60.0, false);
        }
        assert!(cam.polar() >= MIN_POLAR);
        assert!(cam.eye().y > 0.0);
    }

    #[test]
    fn test_drag_settles() {
        let mut cam = OrbitCamera::default();
        cam.drag(100.0, 0.0, 800.0);
        for _ in 0..1000 {
            cam.update(1.0 / 60.0, false);
        }
        let settled = cam.azimuth();
        cam.update(1.0 / 60.0, false);
        assert!((cam.azimuth() - settled).abs() < 1e-5);
        // Full drag distance is eventually applied
        let expected = (-TAU * 100.0 / 800.0).rem_euclid(TAU);
        assert!((settled - expected).abs() < 1e-3);
    }

    #[test]
    fn test_auto_rotate_rate() {
        let mut cam = OrbitCamera::default();
        let dt = 1.0 / 60.0;
        // Let damping reach steady state
        for _ in 0..1200 {
            cam.update(dt, true);
        }
        let before = cam.azimuth();
        for _ in 0..60 {
            cam.update(dt, true);
        }
        let moved = (before - cam.azimuth()).rem_euclid(TAU);
        assert!((moved - OrbitCamera::auto_rotate_rate()).abs() < 1e-3);
    }

    #[test]
    fn test_no_drift_without_auto_rotate() {
        let mut cam = OrbitCamera::default();
        for _ in 0..120 {
            cam.update(1.0 / 60.0, false);
        }
        assert!(cam.azimuth().abs() < 1e-6);
    }

    #[test]
    fn test_origin_projects_to_center() {
        let cam = OrbitCamera::default();
        let clip = cam.view_proj(16.0 / 9.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }
}
