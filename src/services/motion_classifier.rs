//! Shake detection from raw accelerometer samples
//!
//! Two paths:
//! - Linear acceleration (gravity removed): shake iff the vector magnitude
//!   exceeds `acc_threshold`. Stateless, tilt-independent.
//! - Gravity-inclusive fallback: throttled to one evaluation per `throttle_ms`;
//!   shake iff `(|dx| + |dy| + |dz|) / dt * 10000` exceeds `gravity_threshold`.
//!   The first evaluation only seeds history.
//!
//! Nothing is classified during the startup guard so sensor calibration noise
//! right after construction cannot start a session.
//!
//! `classify` is a pure transition: the caller threads `ClassifierState`.

use crate::domain::types::{MotionSample, ShakeEvent};
use crate::infra::config::Config;
use tracing::debug;

/// Scale applied to the fallback speed heuristic
const SPEED_SCALE: f64 = 10_000.0;

/// Classification outcome for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    None,
    Shake,
}

/// Tunable thresholds and windows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierParams {
    pub acc_threshold: f64,
    pub gravity_threshold: f64,
    pub throttle_ms: u64,
    pub startup_guard_ms: u64,
}

impl ClassifierParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            acc_threshold: config.acc_threshold(),
            gravity_threshold: config.gravity_threshold(),
            throttle_ms: config.throttle_ms(),
            startup_guard_ms: config.startup_guard_ms(),
        }
    }
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Last gravity-inclusive sample that was evaluated
#[derive(Debug, Clone, Copy, PartialEq)]
struct Evaluated {
    x: f64,
    y: f64,
    z: f64,
    timestamp_ms: u64,
}

/// Classifier state threaded through [`classify`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierState {
    /// Samples received before this are ignored
    armed_at_ms: u64,
    last_eval: Option<Evaluated>,
}

impl ClassifierState {
    pub fn new(created_at_ms: u64, params: &ClassifierParams) -> Self {
        Self { armed_at_ms: created_at_ms.saturating_add(params.startup_guard_ms), last_eval: None }
    }

    pub fn armed_at_ms(&self) -> u64 {
        self.armed_at_ms
    }

    /// True once the fallback path has a seeded previous sample
    pub fn has_history(&self) -> bool {
        self.last_eval.is_some()
    }
}

/// Classify one sample received at `now_ms`, returning the decision and the next state
///
/// The startup guard runs on the receiver's clock (`now_ms`); the sample's own
/// timestamp only feeds the fallback path's elapsed time.
pub fn classify(
    sample: &MotionSample,
    now_ms: u64,
    state: ClassifierState,
    params: &ClassifierParams,
) -> (Decision, ClassifierState) {
    if now_ms < state.armed_at_ms {
        return (Decision::None, state);
    }

    if sample.has_linear_acceleration {
        let decision =
            if sample.magnitude() > params.acc_threshold { Decision::Shake } else { Decision::None };
        return (decision, state);
    }

    let current = Evaluated { x: sample.x, y: sample.y, z: sample.z, timestamp_ms: sample.timestamp_ms };
    let Some(prev) = state.last_eval else {
        return (Decision::None, ClassifierState { last_eval: Some(current), ..state });
    };

    let dt_ms = sample.timestamp_ms.saturating_sub(prev.timestamp_ms);
    if dt_ms == 0 || dt_ms < params.throttle_ms {
        return (Decision::None, state);
    }

    let delta = (current.x - prev.x).abs() + (current.y - prev.y).abs() + (current.z - prev.z).abs();
    let speed = delta / dt_ms as f64 * SPEED_SCALE;
    let decision = if speed > params.gravity_threshold { Decision::Shake } else { Decision::None };

    (decision, ClassifierState { last_eval: Some(current), ..state })
}

/// Owning wrapper that keeps the state between samples
#[derive(Debug, Clone)]
pub struct MotionClassifier {
    params: ClassifierParams,
    state: ClassifierState,
}

impl MotionClassifier {
    pub fn new(params: ClassifierParams, created_at_ms: u64) -> Self {
        Self { state: ClassifierState::new(created_at_ms, &params), params }
    }

    /// Feed one sample; returns a shake event when the sample crosses a threshold
    pub fn process(&mut self, sample: &MotionSample, now_ms: u64) -> Option<ShakeEvent> {
        let (decision, next) = classify(sample, now_ms, self.state, &self.params);
        self.state = next;
        match decision {
            Decision::Shake => {
                debug!(
                    timestamp_ms = %sample.timestamp_ms,
                    now_ms = %now_ms,
                    linear = %sample.has_linear_acceleration,
                    "shake_detected"
                );
                Some(ShakeEvent { timestamp_ms: now_ms })
            }
            Decision::None => None,
        }
    }

    pub fn state(&self) -> &ClassifierState {
        &self.state
    }
}
