use std::path::PathBuf;
use thiserror::Error;

pub type MatchResult<T> = Result<T, MatchError>;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Template image not found: {path:?}")]
    TemplateNotFound { path: PathBuf },

    #[error("Template image {path:?} could not be decoded: {source}")]
    TemplateDecode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Invalid scale range min={min} max={max} step={step}: step must be finite and > 0")]
    InvalidScaleRange { min: f64, max: f64, step: f64 },

    #[error("Resampling template to scale {scale:.3} failed: {description}")]
    Resize { scale: f64, description: String },

    #[error("Debug image {path:?} could not be written: {source}")]
    DebugImage {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Font {path:?} could not be loaded: {description}")]
    FontLoad { path: PathBuf, description: String },
}

impl MatchError {
    /// The template file itself is the problem (missing or unreadable).
    pub fn is_template_error(&self) -> bool {
        matches!(
            self,
            MatchError::TemplateNotFound { .. } | MatchError::TemplateDecode { .. }
        )
    }
}
