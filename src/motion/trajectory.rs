//! Human-plausible pointer paths.
//!
//! A path is a cubic Bézier curve whose control points are pulled off the
//! straight line by random jitter, sampled at a random number of steps with
//! uneven per-step delays. The first step is always the start point and the
//! last step is always exactly the target, so a click issued after the move
//! lands where intended.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::ScreenPoint;

/// Shape of the generated path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveShape {
    #[default]
    Bezier,
    Linear,
}

/// Tunables for [`generate`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryParams {
    pub shape: CurveShape,
    /// Inclusive bounds on the number of segments.
    pub min_steps: u32,
    pub max_steps: u32,
    /// Bounds on how far control points are pushed off start/target, in pixels.
    pub min_curve_offset: i32,
    pub max_curve_offset: i32,
    /// Per-step wobble of the curve's end point; the final step never wobbles.
    pub endpoint_jitter: i32,
    pub min_step_delay_ms: u64,
    pub max_step_delay_ms: u64,
    /// Probability that a step carries an extra hesitation pause.
    pub hesitation_chance: f64,
    pub min_hesitation_ms: u64,
    pub max_hesitation_ms: u64,
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        Self {
            shape: CurveShape::Bezier,
            min_steps: 30,
            max_steps: 60,
            min_curve_offset: 15,
            max_curve_offset: 30,
            endpoint_jitter: 3,
            min_step_delay_ms: 8,
            max_step_delay_ms: 20,
            hesitation_chance: 0.05,
            min_hesitation_ms: 30,
            max_hesitation_ms: 80,
        }
    }
}

impl TrajectoryParams {
    /// Straight-line interpolation without endpoint wobble.
    pub fn linear() -> Self {
        Self {
            shape: CurveShape::Linear,
            min_steps: 20,
            max_steps: 40,
            endpoint_jitter: 0,
            ..Self::default()
        }
    }

    /// Checks that every range is well-formed.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_steps == 0 || self.min_steps > self.max_steps {
            return Err(format!(
                "step range {}..={} is empty or starts at zero",
                self.min_steps, self.max_steps
            ));
        }
        if self.min_curve_offset < 0 || self.min_curve_offset > self.max_curve_offset {
            return Err(format!(
                "curve offset range {}..={} is invalid",
                self.min_curve_offset, self.max_curve_offset
            ));
        }
        if self.endpoint_jitter < 0 {
            return Err("endpoint jitter must not be negative".to_string());
        }
        if self.min_step_delay_ms > self.max_step_delay_ms
            || self.min_hesitation_ms > self.max_hesitation_ms
        {
            return Err("delay ranges must have min <= max".to_string());
        }
        if !(0.0..=1.0).contains(&self.hesitation_chance) {
            return Err(format!(
                "hesitation chance {} is not a probability",
                self.hesitation_chance
            ));
        }
        Ok(())
    }
}

/// One pointer position and the pause to take after moving there.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrajectoryStep {
    pub point: ScreenPoint,
    /// Curve parameter in `[0, 1]`.
    pub t: f64,
    pub delay: Duration,
}

/// A finite, replayable pointer path.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    steps: Vec<TrajectoryStep>,
}

impl Trajectory {
    pub fn steps(&self) -> &[TrajectoryStep] {
        &self.steps
    }

}

impl<'a> IntoIterator for &'a Trajectory {
    type Item = &'a TrajectoryStep;
    type IntoIter = std::slice::Iter<'a, TrajectoryStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

enum Curve {
    Linear,
    Bezier {
        control1: (f64, f64),
        control2: (f64, f64),
    },
}

impl Curve {
    fn at(&self, start: ScreenPoint, end: ScreenPoint, t: f64) -> ScreenPoint {
        let (sx, sy) = (start.x as f64, start.y as f64);
        let (ex, ey) = (end.x as f64, end.y as f64);
        let (x, y) = match self {
            Curve::Linear => (sx + (ex - sx) * t, sy + (ey - sy) * t),
            Curve::Bezier { control1, control2 } => {
                let u = 1.0 - t;
                let (uuu, uut, utt, ttt) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                (
                    uuu * sx + uut * control1.0 + utt * control2.0 + ttt * ex,
                    uuu * sy + uut * control1.1 + utt * control2.1 + ttt * ey,
                )
            }
        };
        ScreenPoint::new(x.round() as i32, y.round() as i32)
    }
}

fn jittered<R: Rng + ?Sized>(point: ScreenPoint, amount: i32, rng: &mut R) -> ScreenPoint {
    point.offset(
        rng.gen_range(-amount..=amount),
        rng.gen_range(-amount..=amount),
    )
}

fn step_delay<R: Rng + ?Sized>(params: &TrajectoryParams, rng: &mut R) -> Duration {
    let mut ms = rng.gen_range(params.min_step_delay_ms..=params.max_step_delay_ms);
    if rng.gen_bool(params.hesitation_chance) {
        ms += rng.gen_range(params.min_hesitation_ms..=params.max_hesitation_ms);
    }
    Duration::from_millis(ms)
}

/// Generates a path from `start` to `target`.
///
/// `params` must have passed [`TrajectoryParams::validate`].
pub fn generate<R: Rng + ?Sized>(
    start: ScreenPoint,
    target: ScreenPoint,
    params: &TrajectoryParams,
    rng: &mut R,
) -> Trajectory {
    let segments = rng.gen_range(params.min_steps..=params.max_steps).max(1);

    let curve = match params.shape {
        CurveShape::Linear => Curve::Linear,
        CurveShape::Bezier => {
            let offset = rng.gen_range(params.min_curve_offset..=params.max_curve_offset);
            let c1 = jittered(start, offset, rng);
            let c2 = jittered(target, offset, rng);
            Curve::Bezier {
                control1: (c1.x as f64, c1.y as f64),
                control2: (c2.x as f64, c2.y as f64),
            }
        }
    };

    let mut steps = Vec::with_capacity(segments as usize + 1);
    for i in 0..=segments {
        let t = i as f64 / segments as f64;
        let point = if i == 0 {
            start
        } else if i == segments {
            target
        } else {
            let end = jittered(target, params.endpoint_jitter, rng);
            curve.at(start, end, t)
        };
        steps.push(TrajectoryStep {
            point,
            t,
            delay: step_delay(params, rng),
        });
    }

    Trajectory { steps }
}
