//! Template matching module for locating UI elements in screenshots
//!
//! This module provides:
//! - Multi-scale matching with clamped confidence scores
//! - Best-match and multi-match search with overlap suppression
//! - Annotated debug images

pub mod config;
pub mod debug;
pub mod error;
pub mod matcher;
pub mod resolver;
pub mod surface;
pub mod template;
pub mod types;


pub use config::{MatchConfig, create_default_config, create_game_object_config, create_ui_config};
pub use debug::{annotate, load_font, save_debug_image};
pub use error::{MatchError, MatchResult};
pub use matcher::TemplateMatcher;
pub use template::Template;
pub use types::{MatchCandidate, MatchMethod, Region, ScaleRange, Suppression};
