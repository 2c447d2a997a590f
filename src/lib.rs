pub mod adb;
pub mod args;
pub mod error;
pub mod screenshot_cache;
pub mod template_matching;
pub mod vision;

pub use adb::{AdbBackend, AdbError, DeviceActions};
pub use error::{VisionError, VisionResult};
pub use screenshot_cache::ScreenshotCache;
pub use template_matching::{MatchCandidate, MatchConfig, Template, TemplateMatcher};
pub use vision::{FindOptions, Vision};
