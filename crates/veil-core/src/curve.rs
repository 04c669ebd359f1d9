//! Fade and response curves
//!
//! `FadeCurve` shapes transition progress; `ScalarCurve` is an authored
//! keyframe table used for data-driven responses (weather masking,
//! time-of-day masking) whose values are project balance data rather
//! than code.

use serde::{Deserialize, Serialize};

/// Fade curve type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// Linear fade
    Linear,
    /// Quadratic ease-in (slow start)
    EaseInQuad,
    /// Quadratic ease-out (slow end)
    #[default]
    EaseOutQuad,
    /// Quadratic ease-in-out
    EaseInOutQuad,
    /// S-curve (sine-based)
    SCurve,
}

impl FadeCurve {
    /// Apply the curve to a linear progress value (0.0-1.0)
    #[inline]
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::EaseInQuad => t * t,
            FadeCurve::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            FadeCurve::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            FadeCurve::SCurve => (1.0 - (t * std::f32::consts::PI).cos()) / 2.0,
        }
    }
}

/// Interpolation between scalar curve keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CurveInterpolation {
    Linear,
    #[default]
    Smooth,
}

/// A single authored keyframe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub t: f32,
    pub value: f32,
}

impl CurveKey {
    pub fn new(t: f32, value: f32) -> Self {
        Self { t, value }
    }
}

/// Authored scalar response curve over [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarCurve {
    keys: Vec<CurveKey>,
    #[serde(default)]
    interpolation: CurveInterpolation,
}

impl ScalarCurve {
    /// Build from keyframes. Keys are sorted by `t`; out-of-order
    /// authored data is accepted with a warning.
    pub fn from_keys(mut keys: Vec<CurveKey>, interpolation: CurveInterpolation) -> Self {
        if keys.windows(2).any(|w| w[0].t > w[1].t) {
            log::warn!("scalar curve keys out of order, sorting");
            keys.sort_by(|a, b| a.t.total_cmp(&b.t));
        }
        Self {
            keys,
            interpolation,
        }
    }

    /// Smooth two-point curve from `(0, start)` to `(1, end)`
    pub fn ease(start: f32, end: f32) -> Self {
        Self::from_keys(
            vec![CurveKey::new(0.0, start), CurveKey::new(1.0, end)],
            CurveInterpolation::Smooth,
        )
    }

    /// Curve that returns the same value everywhere
    pub fn constant(value: f32) -> Self {
        Self::from_keys(vec![CurveKey::new(0.0, value)], CurveInterpolation::Linear)
    }

    /// Evaluate at `t`, clamping to the authored range
    pub fn evaluate(&self, t: f32) -> f32 {
        match self.keys.as_slice() {
            [] => 0.0,
            [only] => only.value,
            keys => {
                let t = t.clamp(keys[0].t, keys[keys.len() - 1].t);
                let next = keys.iter().position(|k| k.t >= t).unwrap_or(keys.len() - 1);
                if next == 0 {
                    return keys[0].value;
                }
                let (a, b) = (keys[next - 1], keys[next]);
                let span = b.t - a.t;
                if span <= f32::EPSILON {
                    return b.value;
                }
                let frac = (t - a.t) / span;
                let frac = match self.interpolation {
                    CurveInterpolation::Linear => frac,
                    CurveInterpolation::Smooth => frac * frac * (3.0 - 2.0 * frac),
                };
                a.value + (b.value - a.value) * frac
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_curve_endpoints() {
        let curves = [
            FadeCurve::Linear,
            FadeCurve::EaseInQuad,
            FadeCurve::EaseOutQuad,
            FadeCurve::EaseInOutQuad,
            FadeCurve::SCurve,
        ];

        for curve in curves {
            assert!(curve.apply(0.0).abs() < 0.01, "Curve {:?} at 0.0", curve);
            assert!(
                (curve.apply(1.0) - 1.0).abs() < 0.01,
                "Curve {:?} at 1.0",
                curve
            );
        }
    }

    #[test]
    fn test_fade_curve_clamps() {
        assert_eq!(FadeCurve::Linear.apply(-0.5), 0.0);
        assert_eq!(FadeCurve::Linear.apply(1.5), 1.0);
    }

    #[test]
    fn test_scalar_curve_ease() {
        let curve = ScalarCurve::ease(0.0, 0.8);
        assert!(curve.evaluate(0.0).abs() < 0.001);
        assert!((curve.evaluate(1.0) - 0.8).abs() < 0.001);
        // Monotone rising between endpoints
        let mid = curve.evaluate(0.5);
        assert!(mid > 0.0 && mid < 0.8);
    }

    #[test]
    fn test_scalar_curve_multi_key() {
        let curve = ScalarCurve::from_keys(
            vec![
                CurveKey::new(0.0, 0.2),
                CurveKey::new(0.5, 0.6),
                CurveKey::new(1.0, 1.0),
            ],
            CurveInterpolation::Linear,
        );
        assert!((curve.evaluate(0.25) - 0.4).abs() < 0.001);
        assert!((curve.evaluate(0.75) - 0.8).abs() < 0.001);
        // Out of range clamps to the edge keys
        assert!((curve.evaluate(-1.0) - 0.2).abs() < 0.001);
        assert!((curve.evaluate(2.0) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_scalar_curve_unsorted_keys() {
        let curve = ScalarCurve::from_keys(
            vec![CurveKey::new(1.0, 1.0), CurveKey::new(0.0, 0.0)],
            CurveInterpolation::Linear,
        );
        assert!((curve.evaluate(0.5) - 0.5).abs() < 0.001);
    }
}
