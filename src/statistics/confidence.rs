use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

/// 95% two-sided critical value
const DEFAULT_Z: f64 = 1.959_963_984_540_054;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Point estimate successes / trials; 0.0 without trials
pub fn proportion(successes: u32, trials: u32) -> f64 {
    if trials == 0 {
        0.0
    } else {
        successes as f64 / trials as f64
    }
}

/// Two-sided critical value for a confidence level, e.g. 0.95 -> 1.96
pub fn z_for_confidence(confidence_level: f64) -> f64 {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return DEFAULT_Z;
    }
    Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(1.0 - (1.0 - confidence_level) / 2.0))
        .unwrap_or(DEFAULT_Z)
}

/// Wilson score interval for a binomial proportion
///
/// Without trials the interval is the whole of [0, 1]. Bounds are clamped to
/// [0, 1] and widened, if rounding requires it, to contain the point estimate.
pub fn wilson_interval(successes: u32, trials: u32, confidence_level: f64) -> ConfidenceInterval {
    if trials == 0 {
        return ConfidenceInterval {
            lower: 0.0,
            upper: 1.0,
        };
    }

    let n = trials as f64;
    let p = proportion(successes, trials);
    let z = z_for_confidence(confidence_level);
    let z2 = z * z;

    let denominator = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denominator;
    let margin = z / denominator * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    ConfidenceInterval {
        lower: (center - margin).clamp(0.0, 1.0).min(p),
        upper: (center + margin).clamp(0.0, 1.0).max(p),
    }
}
