//! Multiple occurrences of one template, with overlapping detections collapsed

use super::error::MatchResult;
use super::matcher::{ScaledSurface, TemplateMatcher};
use super::surface::FrameSpectrum;
use super::template::Template;
use super::types::{MatchCandidate, Region, Suppression};
use image::DynamicImage;

impl TemplateMatcher {
    /// All distinct occurrences at the best scale, strongest first, at most
    /// `max_results` of them.
    pub fn find_all(
        &self,
        template: &Template,
        frame: &DynamicImage,
    ) -> MatchResult<Vec<MatchCandidate>> {
        let config = self.config();
        if config.max_results == 0 {
            return Ok(Vec::new());
        }
        let scales = config.scales.values()?;
        let spectrum = FrameSpectrum::new(&frame.to_luma8());

        let mut best: Option<(ScaledSurface, f32)> = None;
        for scale in scales {
            let Some(surface) = self.scan_scale(&spectrum, template, scale)? else {
                continue;
            };
            let Some((_, _, peak)) = surface.map.peak() else {
                continue;
            };
            log::debug!("Scale {scale:.2}: peak {peak:.4}");
            if peak >= config.threshold && best.as_ref().is_none_or(|(_, b)| peak > *b) {
                best = Some((surface, peak));
            }
        }

        let Some((surface, _)) = best else {
            log::info!(
                "No match for {} above threshold {:.4}",
                template.describe(),
                config.threshold
            );
            return Ok(Vec::new());
        };

        let matches = match config.suppression {
            Suppression::Distance => by_distance(&surface, config.threshold, config.max_results),
            Suppression::ZeroWindow => by_window(surface, config.threshold, config.max_results),
        };
        log::info!(
            "Found {} match(es) for '{}' ({:?} suppression)",
            matches.len(),
            template.name,
            config.suppression
        );
        Ok(matches)
    }
}

fn candidate(surface: &ScaledSurface, x: u32, y: u32, confidence: f32) -> MatchCandidate {
    let bounds = Region::new(x, y, surface.width, surface.height);
    MatchCandidate::new(bounds, confidence, surface.scale)
}

/// Greedy acceptance in descending confidence; equal scores keep row-major order.
/// A position closer than `(w + h) / 4` to an accepted one is the same element.
fn by_distance(surface: &ScaledSurface, threshold: f32, max_results: usize) -> Vec<MatchCandidate> {
    let mut positions = surface.map.positions_at_or_above(threshold);
    positions.sort_by(|a, b| b.2.total_cmp(&a.2));

    let radius = f64::from(surface.width + surface.height) / 4.0;
    let mut accepted: Vec<MatchCandidate> = Vec::new();
    for (x, y, confidence) in positions {
        if accepted.len() >= max_results {
            break;
        }
        let distinct = accepted.iter().all(|m| {
            let dx = f64::from(m.bounds.x) - f64::from(x);
            let dy = f64::from(m.bounds.y) - f64::from(y);
            dx.hypot(dy) >= radius
        });
        if distinct {
            accepted.push(candidate(surface, x, y, confidence));
        }
    }
    accepted
}

/// Take the peak, blank a template-sized window around it, repeat.
fn by_window(
    mut surface: ScaledSurface,
    threshold: f32,
    max_results: usize,
) -> Vec<MatchCandidate> {
    let mut matches = Vec::new();
    while matches.len() < max_results {
        let Some((x, y, confidence)) = surface.map.peak() else {
            break;
        };
        if confidence < threshold {
            break;
        }
        matches.push(candidate(&surface, x, y, confidence));
        let (w, h) = (surface.width, surface.height);
        surface.map.suppress(x, y, w, h);
    }
    matches
}
