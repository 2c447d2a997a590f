//! Template images loaded from disk

use super::error::{MatchError, MatchResult};
use image::{DynamicImage, GrayImage};
use std::path::{Path, PathBuf};

/// A reference image to look for. Matching always runs on the grayscale form.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub path: Option<PathBuf>,
    image: GrayImage,
}

impl Template {
    pub fn load(path: impl AsRef<Path>) -> MatchResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(MatchError::TemplateNotFound {
                path: path.to_path_buf(),
            });
        }
        let image = image::open(path).map_err(|source| MatchError::TemplateDecode {
            path: path.to_path_buf(),
            source,
        })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        log::debug!(
            "Loaded template '{}' {}x{} from {}",
            name,
            image.width(),
            image.height(),
            path.display()
        );

        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            image: image.to_luma8(),
        })
    }

    pub fn from_image(name: impl Into<String>, image: &DynamicImage) -> Self {
        Self {
            name: name.into(),
            path: None,
            image: image.to_luma8(),
        }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Path if loaded from disk, otherwise the name.
    pub fn describe(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => self.name.clone(),
        }
    }
}
