//! Rating-based weights
//!
//! Every side folded into the aggregates is scaled by a weight derived from
//! its player's rating. Players at or above the tier's threshold count fully;
//! below it their contribution decays along a configured curve.

use std::f64::consts::{LN_10, PI};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid weighting configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightingError {
    #[error("threshold must be finite, got {0}")]
    InvalidThreshold(f64),

    #[error("default weight must be in (0, 1], got {0}")]
    InvalidDefaultWeight(f64),

    #[error("linear decay width must be positive, got {0}")]
    InvalidWidth(f64),

    #[error("glicko deviation must be non-negative, got {0}")]
    InvalidDeviation(f64),
}

/// How weight falls off below the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecayCurve {
    /// Twice the Glicko chance of beating a threshold-rated player: 1.0 at
    /// the threshold, tending to 0 far below it
    Glicko { deviation: f64 },
    /// Straight line from 1.0 at the threshold to 0 at `threshold - width`
    Linear { width: f64 },
}

impl Default for DecayCurve {
    fn default() -> Self {
        DecayCurve::Glicko {
            deviation: default_deviation(),
        }
    }
}

fn default_threshold() -> f64 {
    1500.0
}

fn default_deviation() -> f64 {
    130.0
}

fn default_weight() -> f64 {
    0.5
}

/// Per-tier mapping from rating to weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightingPolicy {
    /// Ratings at or above this weigh 1.0
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default)]
    pub curve: DecayCurve,

    /// Weight of an unrated side
    #[serde(default = "default_weight")]
    pub default_weight: f64,
}

impl Default for WeightingPolicy {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            curve: DecayCurve::default(),
            default_weight: default_weight(),
        }
    }
}

impl WeightingPolicy {
    pub fn validate(&self) -> Result<(), WeightingError> {
        if !self.threshold.is_finite() {
            return Err(WeightingError::InvalidThreshold(self.threshold));
        }
        if !(self.default_weight > 0.0 && self.default_weight <= 1.0) {
            return Err(WeightingError::InvalidDefaultWeight(self.default_weight));
        }
        match self.curve {
            DecayCurve::Glicko { deviation } if !(deviation >= 0.0 && deviation.is_finite()) => {
                Err(WeightingError::InvalidDeviation(deviation))
            }
            DecayCurve::Linear { width } if !(width > 0.0 && width.is_finite()) => {
                Err(WeightingError::InvalidWidth(width))
            }
            _ => Ok(()),
        }
    }

    /// Weight for a side with the given rating
    ///
    /// Always within [0, 1] for a validated policy.
    pub fn weight(&self, rating: Option<i32>) -> f64 {
        let Some(rating) = rating else {
            return self.default_weight;
        };
        let rating = f64::from(rating);
        if rating >= self.threshold {
            return 1.0;
        }

        let weight = match self.curve {
            DecayCurve::Glicko { deviation } => {
                2.0 * victory_chance(rating, deviation, self.threshold, 0.0)
            }
            DecayCurve::Linear { width } => 1.0 - (self.threshold - rating) / width,
        };
        weight.clamp(0.0, 1.0)
    }
}

/// Chance that a player rated `r1 ± d1` beats one rated `r2 ± d2` under Glicko
pub fn victory_chance(r1: f64, d1: f64, r2: f64, d2: f64) -> f64 {
    let c = 3.0 * LN_10.powi(2) / (PI * 400.0).powi(2);
    let scale = (1.0 + c * (d1.powi(2) + d2.powi(2))).sqrt();
    1.0 / (1.0 + 10f64.powf((r2 - r1) / 400.0 / scale))
}

/// Glicko X-Act Estimate: expected win ratio against a 1500 player on a
/// ladder whose starting deviation is `ladder_deviation` (usually 130)
pub fn gxe(rating: f64, deviation: f64, ladder_deviation: f64) -> f64 {
    victory_chance(rating, deviation, 1500.0, ladder_deviation)
}
