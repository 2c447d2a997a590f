//! Screen recognition session: cached capture, matching, and tapping
//!
//! "Not found" is never an error here. A template that cannot be read or a
//! frame that cannot be decoded is logged and reported as no match, while
//! transport failures propagate to the caller.

use crate::adb::{AdbResult, DeviceActions};
use crate::error::VisionResult;
use crate::screenshot_cache::ScreenshotCache;
use crate::template_matching::{
    MatchCandidate, MatchConfig, Template, TemplateMatcher, save_debug_image,
};
use ab_glyph::FontVec;
use image::DynamicImage;
use std::path::Path;

/// Per-call knobs for the find operations.
#[derive(Default, Clone, Copy)]
pub struct FindOptions<'a> {
    /// Capture a new frame even if the cached one is still fresh.
    pub force_refresh: bool,
    /// Write an annotated copy of the frame here.
    pub debug_output: Option<&'a Path>,
    /// Font for confidence labels in the debug image.
    pub font: Option<&'a FontVec>,
}

impl<'a> FindOptions<'a> {
    pub fn fresh() -> Self {
        Self {
            force_refresh: true,
            ..Self::default()
        }
    }

    pub fn with_debug_output(mut self, path: &'a Path) -> Self {
        self.debug_output = Some(path);
        self
    }

    pub fn with_font(mut self, font: &'a FontVec) -> Self {
        self.font = Some(font);
        self
    }
}

pub struct Vision<P: DeviceActions> {
    cache: ScreenshotCache<P>,
    matcher: TemplateMatcher,
}

impl<P: DeviceActions> Vision<P> {
    pub fn new(device: P, config: MatchConfig) -> Self {
        Self::with_cache(ScreenshotCache::new(device), TemplateMatcher::new(config))
    }

    pub fn with_cache(cache: ScreenshotCache<P>, matcher: TemplateMatcher) -> Self {
        Self { cache, matcher }
    }

    pub fn matcher(&self) -> &TemplateMatcher {
        &self.matcher
    }

    pub fn matcher_mut(&mut self) -> &mut TemplateMatcher {
        &mut self.matcher
    }

    pub fn cache(&self) -> &ScreenshotCache<P> {
        &self.cache
    }

    pub fn device(&self) -> &P {
        self.cache.device()
    }

    pub fn device_mut(&mut self) -> &mut P {
        self.cache.device_mut()
    }

    pub fn into_device(self) -> P {
        self.cache.into_device()
    }

    pub fn take_screenshot(&mut self, force_refresh: bool) -> AdbResult<&DynamicImage> {
        self.cache.get_frame(force_refresh)
    }

    /// Best match of an already loaded template in the (possibly cached) frame.
    pub fn find(
        &mut self,
        template: &Template,
        options: &FindOptions<'_>,
    ) -> VisionResult<Option<MatchCandidate>> {
        let Some(frame) = frame_or_none(&mut self.cache, options.force_refresh)? else {
            return Ok(None);
        };

        let found = self.matcher.find_best(template, frame)?;
        if let Some(path) = options.debug_output {
            let matches: Vec<MatchCandidate> = found.iter().cloned().collect();
            write_debug(frame, &matches, path, options.font);
        }
        Ok(found)
    }

    pub fn find_all(
        &mut self,
        template: &Template,
        options: &FindOptions<'_>,
    ) -> VisionResult<Vec<MatchCandidate>> {
        let Some(frame) = frame_or_none(&mut self.cache, options.force_refresh)? else {
            return Ok(Vec::new());
        };

        let matches = self.matcher.find_all(template, frame)?;
        if let Some(path) = options.debug_output {
            write_debug(frame, &matches, path, options.font);
        }
        Ok(matches)
    }

    pub fn tap_match(&mut self, found: &MatchCandidate) -> AdbResult<()> {
        self.cache.device_mut().tap(found.center_x, found.center_y)
    }

    pub fn find_template(
        &mut self,
        template_path: &Path,
        options: &FindOptions<'_>,
    ) -> VisionResult<Option<MatchCandidate>> {
        match load_template(template_path) {
            Some(template) => self.find(&template, options),
            None => Ok(None),
        }
    }

    pub fn find_all_templates(
        &mut self,
        template_path: &Path,
        options: &FindOptions<'_>,
    ) -> VisionResult<Vec<MatchCandidate>> {
        match load_template(template_path) {
            Some(template) => self.find_all(&template, options),
            None => Ok(Vec::new()),
        }
    }

    /// Find the template and tap its center. Returns the tapped match.
    pub fn find_and_tap(
        &mut self,
        template_path: &Path,
        options: &FindOptions<'_>,
    ) -> VisionResult<Option<MatchCandidate>> {
        let Some(found) = self.find_template(template_path, options)? else {
            return Ok(None);
        };
        self.tap_match(&found)?;
        Ok(Some(found))
    }
}

fn load_template(path: &Path) -> Option<Template> {
    match Template::load(path) {
        Ok(template) => Some(template),
        Err(e) => {
            log::error!("Cannot use template {}: {e}", path.display());
            None
        }
    }
}

/// Undecodable frames count as "nothing visible"; transport errors do not.
fn frame_or_none<P: DeviceActions>(
    cache: &mut ScreenshotCache<P>,
    force_refresh: bool,
) -> AdbResult<Option<&DynamicImage>> {
    match cache.get_frame(force_refresh) {
        Ok(frame) => Ok(Some(frame)),
        Err(e) if e.is_decode_failure() => {
            log::error!("Screenshot unusable, treating as no match: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn write_debug(frame: &DynamicImage, matches: &[MatchCandidate], path: &Path, font: Option<&FontVec>) {
    if let Err(e) = save_debug_image(frame, matches, path, font) {
        log::warn!("Skipping debug image: {e}");
    }
}
