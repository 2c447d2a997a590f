//! Configuration for template matching operations

use super::types::{MatchMethod, ScaleRange, Suppression};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchConfig {
    /// Minimum confidence (0.0 to 1.0) for a match to be reported
    pub threshold: f32,
    /// Template scales swept for every search
    pub scales: ScaleRange,
    pub method: MatchMethod,
    /// Upper bound on matches returned by `find_all`
    pub max_results: usize,
    pub suppression: Suppression,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            scales: ScaleRange::default(),
            method: MatchMethod::default(),
            max_results: 10,
            suppression: Suppression::default(),
        }
    }
}

impl MatchConfig {
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_scales(mut self, scales: ScaleRange) -> Self {
        self.scales = scales;
        self
    }

    pub fn with_method(mut self, method: MatchMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_suppression(mut self, suppression: Suppression) -> Self {
        self.suppression = suppression;
        self
    }
}

/// Create a default configuration for screen automation
pub fn create_default_config() -> MatchConfig {
    MatchConfig::default()
}

/// Configuration preset for UI elements (buttons, menus) rendered at a fixed size
pub fn create_ui_config() -> MatchConfig {
    MatchConfig {
        threshold: 0.9,
        scales: ScaleRange::new(0.9, 1.1, 0.05),
        max_results: 1,
        ..MatchConfig::default()
    }
}

/// Configuration preset for game objects (items, characters) that vary in size
pub fn create_game_object_config() -> MatchConfig {
    MatchConfig {
        threshold: 0.75,
        scales: ScaleRange::new(0.5, 1.5, 0.05),
        max_results: 20,
        ..MatchConfig::default()
    }
}
