use crate::adb::AdbError;
use crate::template_matching::MatchError;
use thiserror::Error;

pub type VisionResult<T> = Result<T, VisionError>;

/// Failures surfaced by a [`crate::vision::Vision`] session.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error(transparent)]
    Device(#[from] AdbError),

    #[error(transparent)]
    Match(#[from] MatchError),
}

impl VisionError {
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, VisionError::Device(e) if e.is_connection_failure())
    }
}
