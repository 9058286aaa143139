//! Hand gesture feed
//!
//! There is no real detector yet: `MockGestureSource` synthesises a hand that
//! sways left and right and slowly opens and closes, driven purely by wall
//! clock time. Anything implementing `GestureSource` can replace it.

use serde::{Deserialize, Serialize};

use crate::tuning::GestureTuning;

/// One hand sample. `x`/`y` are normalised to the camera frame (0-1).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandData {
    pub x: f32,
    pub y: f32,
    pub is_open: bool,
    pub is_grip: bool,
    pub is_pinch: bool,
}

impl HandData {
    /// The synthetic hand at wall-clock time `now_ms`
    pub fn mock_at(now_ms: f64) -> Self {
        let sway = (now_ms / 1000.0).sin();
        let breath = (now_ms / 2000.0).sin();
        Self {
            x: (0.5 + sway * 0.2) as f32,
            y: 0.5,
            is_open: breath > 0.0,
            is_grip: breath < -0.5,
            is_pinch: false,
        }
    }

    /// Short label for the radar overlay
    pub fn label(&self) -> &'static str {
        if self.is_grip {
            "GRIP"
        } else if self.is_pinch {
            "PINCH"
        } else if self.is_open {
            "OPEN"
        } else {
            "RELAXED"
        }
    }
}

/// Anything that produces hand samples when polled
pub trait GestureSource {
    /// Returns a new sample if one is available at `now_ms`
    fn poll(&mut self, now_ms: f64) -> Option<HandData>;
}

/// Fixed-interval synthetic hand feed
#[derive(Debug, Clone)]
pub struct MockGestureSource {
    interval_ms: f64,
    next_due_ms: Option<f64>,
}

impl MockGestureSource {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            next_due_ms: None,
        }
    }
}

impl GestureSource for MockGestureSource {
    fn poll(&mut self, now_ms: f64) -> Option<HandData> {
        // First sample arrives one interval after the first poll
        let Some(due) = self.next_due_ms else {
            self.next_due_ms = Some(now_ms + self.interval_ms);
            return None;
        };
        if now_ms < due {
            return None;
        }

        // Skip intervals missed while the tab was throttled
        let missed = ((now_ms - due) / self.interval_ms).floor();
        self.next_due_ms = Some(due + (missed + 1.0) * self.interval_ms);
        Some(HandData::mock_at(now_ms))
    }
}

/// Scale applied to the tree's spread for a hand sample.
/// Grip and pinch take precedence over an open hand.
pub fn interaction_scale(hand: Option<&HandData>, tuning: &GestureTuning) -> f32 {
    match hand {
        Some(h) if h.is_grip || h.is_pinch => tuning.shrink,
        Some(h) if h.is_open => tuning.expand,
        _ => 1.0,
    }
}

/// Rotation of the scene group about Y
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SceneRotation {
    pub y: f32,
}

impl SceneRotation {
    /// Advance one fixed step: constant spin, then ease toward the palm
    pub fn step(&mut self, hand: Option<&HandData>, tuning: &GestureTuning) {
        self.y += tuning.idle_spin;
        if let Some(hand) = hand {
            let target = (hand.x - 0.5) * tuning.rotation_range;
            self.y += (target - self.y) * tuning.rotation_smoothing;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    fn hand(is_open: bool, is_grip: bool, is_pinch: bool) -> HandData {
        HandData {
            x: 0.5,
            y: 0.5,
            is_open,
            is_grip,
            is_pinch,
        }
    }

    #[test]
    fn test_interaction_scale() {
        let tuning = GestureTuning::default();
        assert_eq!(interaction_scale(None, &tuning), 1.0);
        assert_eq!(interaction_scale(Some(&hand(false, false, false)), &tuning), 1.0);
        assert_eq!(interaction_scale(Some(&hand(true, false, false)), &tuning), 1.35);
        assert_eq!(interaction_scale(Some(&hand(false, true, false)), &tuning), 0.65);
        assert_eq!(interaction_scale(Some(&hand(false, false, true)), &tuning), 0.65);
    }

    #[test]
    fn test_grip_wins_over_open() {
        let tuning = GestureTuning::default();
        assert_eq!(interaction_scale(Some(&hand(true, true, false)), &tuning), 0.65);
        assert_eq!(interaction_scale(Some(&hand(true, false, true)), &tuning), 0.65);
    }

    #[test]
    fn test_mock_open_at_peak() {
        // sin(now / 2000) == 1
        let h = HandData::mock_at(PI * 1000.0);
        assert!(h.is_open);
        assert!(!h.is_grip);
        assert!((h.x - 0.5).abs() < 1e-4);
        assert_eq!(h.label(), "OPEN");
    }

    #[test]
    fn test_mock_grip_at_trough() {
        // sin(now / 2000) == -1
        let h = HandData::mock_at(3.0 * PI * 1000.0);
        assert!(h.is_grip);
        assert!(!h.is_open);
        assert!(!h.is_pinch);
        assert_eq!(h.label(), "GRIP");
    }

    #[test]
    fn test_mock_source_interval() {
        let mut source = MockGestureSource::new(100.0);
        assert!(source.poll(0.0).is_none());
        assert!(source.poll(50.0).is_none());
        assert!(source.poll(100.0).is_some());
        assert!(source.poll(150.0).is_none());
        assert!(source.poll(200.0).is_some());
    }

    #[test]
    fn test_mock_source_skips_missed_intervals() {
        let mut source = MockGestureSource::new(100.0);
        source.poll(0.0);
        // Long stall: one sample, not five
        assert!(source.poll(550.0).is_some());
        assert!(source.poll(560.0).is_none());
        assert!(source.poll(600.0).is_some());
    }

    #[test]
    fn test_rotation_spins_without_hand() {
        let tuning = GestureTuning::default();
        let mut rotation = SceneRotation::default();
        for _ in 0..10 {
            rotation.step(None, &tuning);
        }
        assert!((rotation.y - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_settles_near_palm() {
        let tuning = GestureTuning::default();
        let mut rotation = SceneRotation::default();
        let right = HandData { x: 1.0, ..hand(false, false, false) };
        for _ in 0..2000 {
            rotation.step(Some(&right), &tuning);
        }
        // Fixed point of y' = y + spin + (target - y - spin) * k
        let spin = tuning.idle_spin;
        let k = tuning.rotation_smoothing;
        let target = 0.25;
        let expected = (spin * (1.0 - k) + target * k) / k;
        assert!((rotation.y - expected).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_mock_never_open_and_grip(now in 0.0f64..1.0e9) {
            let h = HandData::mock_at(now);
            prop_assert!(!(h.is_open && h.is_grip));
            prop_assert!(h.x >= 0.3 - 1e-6 && h.x <= 0.7 + 1e-6);
        }
    }
}
