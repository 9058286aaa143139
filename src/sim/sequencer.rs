//! Wish sequence: wish -> burst -> punchline
//!
//! Transitions are cues on a `Timeline` owned by the sequencer. Reset cancels
//! whatever is pending, so a cue from an abandoned sequence can never land on
//! the next scene.

use super::state::{AnimationPhase, SceneEvent};
use super::timeline::{TaskId, Timeline};
use crate::error::{Error, Result};
use crate::tuning::SequenceTuning;

/// Timed transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Burst,
    Punchline,
}

#[derive(Debug, Clone)]
pub struct WishSequencer {
    tuning: SequenceTuning,
    wish: Option<String>,
    bursting: bool,
    punchline: bool,
    /// Remount identity; bumped on every reset
    scene_key: u64,
    wish_at_ms: Option<f64>,
    burst_at_ms: Option<f64>,
    punchline_at_ms: Option<f64>,
    timeline: Timeline<Cue>,
    pending: Option<TaskId>,
}

impl WishSequencer {
    pub fn new(tuning: SequenceTuning) -> Self {
        Self {
            tuning,
            wish: None,
            bursting: false,
            punchline: false,
            scene_key: 0,
            wish_at_ms: None,
            burst_at_ms: None,
            punchline_at_ms: None,
            timeline: Timeline::new(),
            pending: None,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        AnimationPhase::from_flags(self.wish.is_some(), self.bursting, self.punchline)
    }

    pub fn wish(&self) -> Option<&str> {
        self.wish.as_deref()
    }

    pub fn is_bursting(&self) -> bool {
        self.bursting
    }

    pub fn punchline_shown(&self) -> bool {
        self.punchline
    }

    pub fn scene_key(&self) -> u64 {
        self.scene_key
    }

    /// When the current phase began (ms), None while idle
    pub fn phase_started_ms(&self) -> Option<f64> {
        match self.phase() {
            AnimationPhase::Idle => None,
            AnimationPhase::Wishing => self.wish_at_ms,
            AnimationPhase::Bursting => self.burst_at_ms,
            AnimationPhase::Punchline => self.punchline_at_ms,
        }
    }

    /// Accept a wish and schedule the burst
    pub fn submit_wish(&mut self, text: &str, now_ms: f64) -> Result<SceneEvent> {
        if text.trim().is_empty() {
            return Err(Error::EmptyWish);
        }
        let phase = self.phase();
        if phase != AnimationPhase::Idle {
            return Err(Error::SequenceInProgress(phase));
        }

        self.wish = Some(text.to_string());
        self.wish_at_ms = Some(now_ms);
        let due = now_ms + self.tuning.burst_delay_ms;
        self.pending = Some(self.timeline.schedule(due, Cue::Burst));
        log::info!("Wish received, burst at +{}ms", self.tuning.burst_delay_ms);

        Ok(SceneEvent::WishSubmitted { at_ms: now_ms })
    }

    /// Fire every cue due by `now_ms`, including chained cues that fall due in
    /// the same call. Cues report their scheduled time, not `now_ms`.
    pub fn advance(&mut self, now_ms: f64) -> Vec<SceneEvent> {
        let mut events = Vec::new();
        while let Some((_, due, cue)) = self.timeline.pop_due(now_ms) {
            self.pending = None;
            match cue {
                Cue::Burst => {
                    self.bursting = true;
                    self.burst_at_ms = Some(due);
                    let next = due + self.tuning.punchline_delay_ms;
                    self.pending = Some(self.timeline.schedule(next, Cue::Punchline));
                    log::info!("Burst started");
                    events.push(SceneEvent::BurstStarted { at_ms: due });
                }
                Cue::Punchline => {
                    self.punchline = true;
                    self.punchline_at_ms = Some(due);
                    log::info!("Punchline shown");
                    events.push(SceneEvent::PunchlineShown { at_ms: due });
                }
            }
        }
        events
    }

    /// Clear everything, cancel pending cues and change the scene key
    pub fn reset(&mut self) -> SceneEvent {
        if let Some(id) = self.pending.take() {
            if self.timeline.cancel(id) {
                log::debug!("Cancelled pending cue on reset");
            }
        }
        self.wish = None;
        self.bursting = false;
        self.punchline = false;
        self.wish_at_ms = None;
        self.burst_at_ms = None;
        self.punchline_at_ms = None;
        self.scene_key = self.scene_key.wrapping_add(1);
        log::info!("Reset (scene {})", self.scene_key);

        SceneEvent::Reset {
            scene_key: self.scene_key,
        }
    }

    /// Number of cues still waiting to fire
    pub fn pending_cues(&self) -> usize {
        self.timeline.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sequencer() -> WishSequencer {
        WishSequencer::new(SequenceTuning::default())
    }

    #[test]
    fn test_full_sequence() {
        let mut seq = sequencer();
        assert_eq!(seq.phase(), AnimationPhase::Idle);

        let ev = seq.submit_wish("a pony", 1000.0).unwrap();
        assert_eq!(ev, SceneEvent::WishSubmitted { at_ms: 1000.0 });
        assert_eq!(seq.phase(), AnimationPhase::Wishing);
        assert_eq!(seq.wish(), Some("a pony"));

        assert!(seq.advance(2999.0).is_empty());
        assert!(!seq.is_bursting());

        let events = seq.advance(3000.0);
        assert_eq!(events, vec![SceneEvent::BurstStarted { at_ms: 3000.0 }]);
        assert_eq!(seq.phase(), AnimationPhase::Bursting);

        assert!(seq.advance(7499.0).is_empty());
        let events = seq.advance(7500.0);
        assert_eq!(events, vec![SceneEvent::PunchlineShown { at_ms: 7500.0 }]);
        assert_eq!(seq.phase(), AnimationPhase::Punchline);
        assert_eq!(seq.pending_cues(), 0);
    }

    #[test]
    fn test_late_frame_keeps_schedule() {
        let mut seq = sequencer();
        seq.submit_wish("snow", 0.0).unwrap();
        // A frame lands 37ms late: burst still reports its scheduled time
        assert_eq!(seq.advance(2037.0), vec![SceneEvent::BurstStarted { at_ms: 2000.0 }]);
        assert!(seq.advance(6499.0).is_empty());
        assert_eq!(seq.advance(6500.0), vec![SceneEvent::PunchlineShown { at_ms: 6500.0 }]);
    }

    #[test]
    fn test_long_stall_fires_both_cues_in_order() {
        let mut seq = sequencer();
        seq.submit_wish("snow", 0.0).unwrap();
        let events = seq.advance(60_000.0);
        assert_eq!(
            events,
            vec![
                SceneEvent::BurstStarted { at_ms: 2000.0 },
                SceneEvent::PunchlineShown { at_ms: 6500.0 },
            ]
        );
    }

    #[test]
    fn test_rejects_empty_wish() {
        let mut seq = sequencer();
        assert!(matches!(seq.submit_wish("", 0.0), Err(Error::EmptyWish)));
        assert!(matches!(seq.submit_wish("  \t\n", 0.0), Err(Error::EmptyWish)));
        assert_eq!(seq.phase(), AnimationPhase::Idle);
        assert_eq!(seq.pending_cues(), 0);
    }

    #[test]
    fn test_keeps_text_as_typed() {
        let mut seq = sequencer();
        seq.submit_wish("  a sled ", 0.0).unwrap();
        assert_eq!(seq.wish(), Some("  a sled "));
    }

    #[test]
    fn test_rejects_second_wish_in_flight() {
        let mut seq = sequencer();
        seq.submit_wish("first", 0.0).unwrap();
        let err = seq.submit_wish("second", 500.0).unwrap_err();
        assert!(matches!(err, Error::SequenceInProgress(AnimationPhase::Wishing)));
        assert_eq!(seq.wish(), Some("first"));
        assert_eq!(seq.pending_cues(), 1);
    }

    #[test]
    fn test_reset_clears_and_changes_key() {
        let mut seq = sequencer();
        seq.submit_wish("a pony", 0.0).unwrap();
        seq.advance(10_000.0);
        assert_eq!(seq.phase(), AnimationPhase::Punchline);

        let key = seq.scene_key();
        let ev = seq.reset();
        assert_eq!(ev, SceneEvent::Reset { scene_key: key + 1 });
        assert_eq!(seq.phase(), AnimationPhase::Idle);
        assert_eq!(seq.wish(), None);
        assert!(!seq.is_bursting());
        assert!(!seq.punchline_shown());
        assert_eq!(seq.phase_started_ms(), None);
    }

    #[test]
    fn test_reset_cancels_in_flight_cues() {
        let mut seq = sequencer();
        seq.submit_wish("a pony", 0.0).unwrap();
        seq.reset();
        assert_eq!(seq.pending_cues(), 0);
        assert!(seq.advance(100_000.0).is_empty());
        assert!(!seq.is_bursting());

        // Mid-burst reset cancels the punchline too
        seq.submit_wish("again", 200_000.0).unwrap();
        seq.advance(202_000.0);
        assert!(seq.is_bursting());
        seq.reset();
        assert!(seq.advance(300_000.0).is_empty());
        assert!(!seq.punchline_shown());
    }

    #[test]
    fn test_phase_started() {
        let mut seq = sequencer();
        seq.submit_wish("x", 100.0).unwrap();
        assert_eq!(seq.phase_started_ms(), Some(100.0));
        seq.advance(2100.0);
        assert_eq!(seq.phase_started_ms(), Some(2100.0));
        seq.advance(6600.0);
        assert_eq!(seq.phase_started_ms(), Some(6600.0));
    }

    proptest! {
        #[test]
        fn prop_transition_times(text in "[a-zA-Z ]{0,20}[a-zA-Z]", start in 0.0f64..1.0e12) {
            let mut seq = sequencer();
            seq.submit_wish(&text, start).unwrap();
            let events = seq.advance(start + 10_000.0);
            prop_assert_eq!(events.len(), 2);
            match (&events[0], &events[1]) {
                (SceneEvent::BurstStarted { at_ms: b }, SceneEvent::PunchlineShown { at_ms: p }) => {
                    prop_assert!((b - start - 2000.0).abs() < 1e-3);
                    prop_assert!((p - start - 6500.0).abs() < 1e-3);
                }
                other => prop_assert!(false, "unexpected events {:?}", other),
            }
        }

        #[test]
        fn prop_reset_always_clears(steps in 0u32..4, at in 0.0f64..20_000.0) {
            let mut seq = sequencer();
            for _ in 0..steps {
                let _ = seq.submit_wish("wish", 0.0);
                seq.advance(at);
            }
            let key = seq.scene_key();
            seq.reset();
            prop_assert_eq!(seq.phase(), AnimationPhase::Idle);
            prop_assert_ne!(seq.scene_key(), key);
            prop_assert_eq!(seq.pending_cues(), 0);
        }
    }
}
