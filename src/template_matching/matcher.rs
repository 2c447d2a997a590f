//! Template matching implementation
//!
//! Sweeps the configured scale range and keeps the strongest placement.

use super::config::MatchConfig;
use super::error::MatchResult;
use super::surface::{FrameSpectrum, ScoreMap, resize_template};
use super::template::Template;
use super::types::{MatchCandidate, Region};
use image::DynamicImage;

/// Score surface of the template resampled to one scale.
pub(super) struct ScaledSurface {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub map: ScoreMap,
}

/// Locates templates inside frames according to a [`MatchConfig`].
#[derive(Debug, Clone, Default)]
pub struct TemplateMatcher {
    config: MatchConfig,
}

impl TemplateMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: MatchConfig) {
        self.config = config;
    }

    /// Resample the template and score it against the prepared frame. Scales
    /// that leave no pixels or outgrow the frame yield `None`.
    pub(super) fn scan_scale(
        &self,
        frame: &FrameSpectrum,
        template: &Template,
        scale: f64,
    ) -> MatchResult<Option<ScaledSurface>> {
        let Some(resized) = resize_template(template.image(), scale)? else {
            log::debug!("Scale {scale:.2}: template '{}' shrinks to nothing, skipped", template.name);
            return Ok(None);
        };
        let (width, height) = resized.dimensions();
        let Some(map) = frame.score(&resized, self.config.method) else {
            log::debug!(
                "Scale {scale:.2}: template {width}x{height} exceeds frame {}x{}, skipped",
                frame.width(),
                frame.height()
            );
            return Ok(None);
        };
        Ok(Some(ScaledSurface {
            scale,
            width,
            height,
            map,
        }))
    }

    /// Best placement of `template` in `frame` across all scales, or `None`
    /// when nothing reaches the threshold.
    pub fn find_best(
        &self,
        template: &Template,
        frame: &DynamicImage,
    ) -> MatchResult<Option<MatchCandidate>> {
        let scales = self.config.scales.values()?;
        let start = std::time::Instant::now();
        let spectrum = FrameSpectrum::new(&frame.to_luma8());

        let mut best: Option<MatchCandidate> = None;
        for scale in scales {
            let Some(surface) = self.scan_scale(&spectrum, template, scale)? else {
                continue;
            };
            let Some((x, y, confidence)) = surface.map.peak() else {
                continue;
            };
            log::debug!("Scale {scale:.2}: peak {confidence:.4} at ({x}, {y})");
            if best.as_ref().is_none_or(|b| confidence > b.confidence) {
                let bounds = Region::new(x, y, surface.width, surface.height);
                best = Some(MatchCandidate::new(bounds, confidence, scale));
            }
        }

        let threshold = self.config.threshold;
        match best {
            Some(candidate) if candidate.confidence >= threshold => {
                log::info!(
                    "Found '{}' at {} in {}ms",
                    template.name,
                    candidate,
                    start.elapsed().as_millis()
                );
                Ok(Some(candidate))
            }
            Some(candidate) => {
                log::info!(
                    "No match for {}: best confidence {:.4} < threshold {:.4}",
                    template.describe(),
                    candidate.confidence,
                    threshold
                );
                Ok(None)
            }
            None => {
                log::info!("No match for {}: no scale fits the frame", template.describe());
                Ok(None)
            }
        }
    }
}
