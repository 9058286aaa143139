//! Show director
//!
//! Owns the sequencer, the mounted scene and the gesture feed, and turns a
//! wall clock into sequence transitions, fixed simulation steps and per-frame
//! particle buffers. Frontends (the wasm game loop, the native rehearsal)
//! only ever talk to this.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::error::Result;
use crate::sim::{
    AnimationPhase, BurstPhase, GestureSource, HandData, MockGestureSource, ParticleBuffers,
    RngState, SceneEvent, SceneState, TickInput, WishSequencer, interaction_scale, local_secs,
    tick,
};
use crate::tuning::Tuning;

pub struct Director {
    tuning: Tuning,
    /// Quality density applied to the tree on every mount
    density: f32,
    seed: u64,
    sequencer: WishSequencer,
    scene: SceneState,
    gestures: Box<dyn GestureSource>,
    hand: Option<HandData>,
    accumulator: f32,
    last_update_ms: Option<f64>,
    buffers: ParticleBuffers,
}

impl Director {
    /// Director fed by the synthetic hand
    pub fn new(seed: u64, tuning: Tuning, density: f32, now_ms: f64) -> Self {
        let source = MockGestureSource::new(tuning.gesture.sample_interval_ms);
        Self::with_source(seed, tuning, density, Box::new(source), now_ms)
    }

    pub fn with_source(
        seed: u64,
        tuning: Tuning,
        density: f32,
        gestures: Box<dyn GestureSource>,
        now_ms: f64,
    ) -> Self {
        let sequencer = WishSequencer::new(tuning.sequence.clone());
        let key = sequencer.scene_key();
        let scene = SceneState::new(&RngState::for_scene(seed, key), key, &tuning, density, now_ms);
        Self {
            tuning,
            density,
            seed,
            sequencer,
            scene,
            gestures,
            hand: None,
            accumulator: 0.0,
            last_update_ms: None,
            buffers: ParticleBuffers::new(),
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Tree particle density the scene is mounted with
    pub fn density(&self) -> f32 {
        self.density
    }

    /// Tree density for the next mount; applied by [`Director::reset`]
    pub fn set_density(&mut self, density: f32) {
        self.density = density;
    }

    pub fn phase(&self) -> AnimationPhase {
        self.sequencer.phase()
    }

    pub fn wish(&self) -> Option<&str> {
        self.sequencer.wish()
    }

    pub fn is_bursting(&self) -> bool {
        self.sequencer.is_bursting()
    }

    pub fn punchline_shown(&self) -> bool {
        self.sequencer.punchline_shown()
    }

    pub fn scene_key(&self) -> u64 {
        self.scene.scene_key
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    /// Latest hand sample
    pub fn hand(&self) -> Option<&HandData> {
        self.hand.as_ref()
    }

    /// Scene group rotation about Y (radians)
    pub fn rotation_y(&self) -> f32 {
        self.scene.rotation.y
    }

    /// The camera only drifts while nothing is happening
    pub fn auto_rotate_allowed(&self) -> bool {
        self.phase() == AnimationPhase::Idle
    }

    /// Current burst phase, if a burst is mounted
    pub fn burst_phase(&self, now_ms: f64) -> Option<BurstPhase> {
        self.scene
            .burst
            .as_ref()
            .map(|(burst, started)| burst.phase(local_secs(*started, now_ms)))
    }

    /// Accept a wish and start its particles
    pub fn submit_wish(&mut self, text: &str, now_ms: f64) -> Result<SceneEvent> {
        let event = self.sequencer.submit_wish(text, now_ms)?;
        self.scene.spawn_wish(&self.tuning, now_ms);
        Ok(event)
    }

    /// Clear the sequence and remount the scene with fresh seeds. The tree
    /// clock keeps running, so a remounted tree appears fully grown.
    pub fn reset(&mut self) -> SceneEvent {
        let event = self.sequencer.reset();
        let key = self.sequencer.scene_key();
        self.scene = SceneState::new(
            &RngState::for_scene(self.seed, key),
            key,
            &self.tuning,
            self.density,
            self.scene.clock_origin_ms,
        );
        event
    }

    /// Advance everything to `now_ms`. Returns what happened, in order.
    pub fn update(&mut self, now_ms: f64) -> Vec<SceneEvent> {
        if let Some(hand) = self.gestures.poll(now_ms) {
            self.hand = Some(hand);
        }

        let mut events = self.sequencer.advance(now_ms);
        for event in &events {
            if let SceneEvent::BurstStarted { at_ms } = event {
                self.scene.spawn_burst(&self.tuning, *at_ms);
            }
        }

        // Fixed-step accumulation
        let dt = match self.last_update_ms {
            Some(last) => ((now_ms - last) / 1000.0) as f32,
            None => SIM_DT,
        };
        self.last_update_ms = Some(now_ms);
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        let input = TickInput { hand: self.hand };
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.scene, &input, &self.tuning);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        if let Some((wish, started)) = self.scene.wish.as_mut() {
            if wish.poll_complete(local_secs(*started, now_ms)) {
                log::debug!("Wish particles converged");
                events.push(SceneEvent::WishConverged);
            }
        }

        events
    }

    /// Sample every live animator at `now_ms`
    pub fn particles(&mut self, now_ms: f64) -> &ParticleBuffers {
        self.buffers.clear();

        let scale = interaction_scale(self.hand.as_ref(), &self.tuning.gesture);
        self.scene
            .tree
            .sample(self.scene.elapsed_secs(now_ms), scale, &mut self.buffers);

        if let Some((wish, started)) = &self.scene.wish {
            wish.sample(local_secs(*started, now_ms), &mut self.buffers);
        }
        if let Some((burst, started)) = &self.scene.burst {
            burst.sample(local_secs(*started, now_ms), &mut self.buffers);
        }

        &self.buffers
    }
}
