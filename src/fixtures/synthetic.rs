//! Seeded synthetic marker traces.
//!
//! Generates a squat-like vertical trajectory for the tracked marker with
//! measurement noise, dropped detections and single-frame spikes, plus
//! unrelated markers that the session must ignore. The same parameters and seed
//! always produce the same trace.
//!
//! Each repetition is a raised-cosine dip from `standing_y` down to
//! `depth_y` and back, followed by `rest_frames` at `standing_y`. The
//! generator keeps the count recoverable: the two frames at the bottom of
//! each dip and the last rest frame are never dropped or spiked, spikes only
//! occur in the standing half of the motion, and a spike is always followed
//! by a clean frame. A dip is at least [`MIN_DIP_FRAMES`] long, which keeps
//! both bottom frames within 15% of the excursion from `depth_y`. With
//! thresholds inside the motion range (clear of that band and of the noise)
//! and `min_frames_below` of 2, replaying the trace counts exactly `reps`
//! repetitions.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::MarkerTrace;
use crate::analysis::{MarkerFrame, MarkerObservation};

/// Horizontal position of the tracked marker in generated frames.
const TRACKED_X: f64 = 320.0;

/// Shortest dip; shorter dips leave the second bottom frame near the midpoint.
pub const MIN_DIP_FRAMES: u32 = 8;

/// Declarative description of a synthetic trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticTraceSpec {
    pub name: String,
    pub reps: u32,
    /// Frames per down-and-up dip (clamped to [`MIN_DIP_FRAMES`]).
    pub frames_per_rep: u32,
    /// Standing frames after each dip (minimum 1).
    pub rest_frames: u32,
    pub standing_y: f64,
    pub depth_y: f64,
    /// Uniform noise amplitude in pixels.
    pub noise_px: f64,
    pub dropout_probability: f64,
    pub spike_probability: f64,
    pub tracked_marker_id: u32,
    /// Other markers visible in every frame, placed below `depth_y`.
    pub distractor_ids: Vec<u32>,
    pub fps: u32,
    pub seed: u64,
}

impl Default for SyntheticTraceSpec {
    fn default() -> Self {
        Self {
            name: "synthetic".to_string(),
            reps: 5,
            frames_per_rep: 40,
            rest_frames: 10,
            standing_y: 150.0,
            depth_y: 420.0,
            noise_px: 6.0,
            dropout_probability: 0.05,
            spike_probability: 0.02,
            tracked_marker_id: 0,
            distractor_ids: vec![1, 2, 3],
            fps: 30,
            seed: 7,
        }
    }
}

impl SyntheticTraceSpec {
    /// Repetitions a correctly tuned detector recovers from this trace.
    pub fn expected_reps(&self) -> u32 {
        self.reps
    }

    pub fn frame_count(&self) -> usize {
        (self.reps as usize) * (self.dip_frames() + self.rest_len()) as usize
    }

    fn dip_frames(&self) -> u32 {
        self.frames_per_rep.max(MIN_DIP_FRAMES)
    }

    fn rest_len(&self) -> u32 {
        self.rest_frames.max(1)
    }

    /// Noise-free marker position `t` frames into a dip.
    fn clean_position(&self, t: u32) -> f64 {
        let phase = 2.0 * PI * f64::from(t) / f64::from(self.dip_frames());
        self.standing_y + (self.depth_y - self.standing_y) * (1.0 - phase.cos()) / 2.0
    }

    pub fn generate(&self) -> MarkerTrace {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let dropout = probability(self.dropout_probability);
        let spike = probability(self.spike_probability);
        let midpoint = (self.standing_y + self.depth_y) / 2.0;
        let bottom = self.dip_frames() / 2;
        let rest = self.rest_len();

        let mut frames = Vec::with_capacity(self.frame_count());
        let mut force_clean = false;

        for _ in 0..self.reps {
            let dip = (0..self.dip_frames())
                .map(|t| (self.clean_position(t), t == bottom || t == bottom + 1));
            let standing = (0..rest).map(|r| (self.standing_y, r + 1 == rest));

            for (clean_y, protected) in dip.chain(standing) {
                let mut tracked = Some(clean_y + self.noise(&mut rng));
                let clean_required = std::mem::take(&mut force_clean);

                if !protected && !clean_required {
                    if rng.gen_bool(dropout) {
                        tracked = None;
                    } else if clean_y < midpoint && rng.gen_bool(spike) {
                        tracked = Some(self.depth_y);
                        force_clean = true;
                    }
                }

                frames.push(self.frame(tracked, &mut rng));
            }
        }

        MarkerTrace {
            name: self.name.clone(),
            fps: Some(self.fps),
            tracking: None,
            frames,
        }
    }

    fn noise(&self, rng: &mut StdRng) -> f64 {
        if self.noise_px > 0.0 && self.noise_px.is_finite() {
            rng.gen_range(-self.noise_px..=self.noise_px)
        } else {
            0.0
        }
    }

    fn frame(&self, tracked_y: Option<f64>, rng: &mut StdRng) -> MarkerFrame {
        let mut markers: Vec<MarkerObservation> = self
            .distractor_ids
            .iter()
            .enumerate()
            .filter(|(_, id)| **id != self.tracked_marker_id)
            .map(|(slot, id)| {
                let x = TRACKED_X + 60.0 * (slot as f64 + 1.0);
                let y = self.depth_y + 150.0 + self.noise(rng);
                MarkerObservation::new(*id, x, y)
            })
            .collect();

        if let Some(y) = tracked_y {
            markers.push(MarkerObservation::new(self.tracked_marker_id, TRACKED_X, y));
        }
        MarkerFrame::new(markers)
    }
}

/// Clamp to a valid Bernoulli probability; NaN disables the effect.
fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
