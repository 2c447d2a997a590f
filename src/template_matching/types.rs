//! Template matching data types

use super::error::{MatchError, MatchResult};
use serde::Serialize;

/// Tolerance applied to the upper scale bound so `0.5 + 20 * 0.05` still reaches 1.5.
const SCALE_EPSILON: f64 = 1e-9;
/// Upper bound on the number of scales one sweep may visit.
pub const MAX_SCALE_STEPS: usize = 1000;

/// Axis-aligned rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tap point: top-left plus half the size, integer division.
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

/// A located occurrence of a template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub center_x: u32,
    pub center_y: u32,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    /// Template scale the match was found at.
    pub scale: f64,
    pub bounds: Region,
}

impl MatchCandidate {
    pub fn new(bounds: Region, confidence: f32, scale: f64) -> Self {
        let (center_x, center_y) = bounds.center();
        Self {
            center_x,
            center_y,
            confidence,
            scale,
            bounds,
        }
    }

    pub fn center(&self) -> (u32, u32) {
        (self.center_x, self.center_y)
    }
}

impl std::fmt::Display for MatchCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) confidence {:.4} at scale {:.2}",
            self.center_x, self.center_y, self.confidence, self.scale
        )
    }
}

/// Similarity measure used to build the score surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum MatchMethod {
    /// Normalized sum of squared differences. Smaller raw values are better.
    SquaredDifferenceNormalized,
    /// Normalized cross correlation.
    CrossCorrelationNormalized,
    /// Mean-subtracted normalized cross correlation.
    #[default]
    CorrelationCoefficientNormalized,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::SquaredDifferenceNormalized => "sqdiff",
            MatchMethod::CrossCorrelationNormalized => "ccorr",
            MatchMethod::CorrelationCoefficientNormalized => "ccoeff",
        }
    }

    pub fn smaller_is_better(&self) -> bool {
        matches!(self, MatchMethod::SquaredDifferenceNormalized)
    }
}

impl std::str::FromStr for MatchMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sqdiff" => Ok(MatchMethod::SquaredDifferenceNormalized),
            "ccorr" => Ok(MatchMethod::CrossCorrelationNormalized),
            "ccoeff" => Ok(MatchMethod::CorrelationCoefficientNormalized),
            other => Err(format!(
                "unknown method '{other}', expected 'ccoeff', 'ccorr' or 'sqdiff'"
            )),
        }
    }
}

/// How overlapping detections of one element are collapsed in multi-match mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suppression {
    /// Keep strong positions at least `(w + h) / 4` away from every accepted one.
    #[default]
    Distance,
    /// Repeatedly take the peak and blank a template-sized window around it.
    ZeroWindow,
}

impl std::str::FromStr for Suppression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(Suppression::Distance),
            "window" => Ok(Suppression::ZeroWindow),
            other => Err(format!(
                "unknown suppression '{other}', expected 'distance' or 'window'"
            )),
        }
    }
}

/// Inclusive arithmetic progression of template scales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 1.5,
            step: 0.05,
        }
    }
}

impl ScaleRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Only the unscaled template.
    pub fn single() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }

    /// Ascending scale values. Empty when `min > max`; more than
    /// [`MAX_SCALE_STEPS`] values is an error.
    pub fn values(&self) -> MatchResult<Vec<f64>> {
        let invalid = || MatchError::InvalidScaleRange {
            min: self.min,
            max: self.max,
            step: self.step,
        };
        if !self.step.is_finite() || self.step <= 0.0 || !self.min.is_finite() || !self.max.is_finite()
        {
            return Err(invalid());
        }
        if self.min > self.max + SCALE_EPSILON {
            return Ok(Vec::new());
        }
        let steps = ((self.max - self.min + SCALE_EPSILON) / self.step).floor();
        if !steps.is_finite() || steps >= MAX_SCALE_STEPS as f64 {
            return Err(invalid());
        }
        let count = steps as usize + 1;
        Ok((0..count)
            .map(|i| self.min + i as f64 * self.step)
            .collect())
    }
}
