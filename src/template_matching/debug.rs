//! Annotated screenshots for inspecting match results

use super::error::{MatchError, MatchResult};
use super::types::MatchCandidate;
use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const CENTER_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const CENTER_RADIUS: i32 = 5;
const LABEL_SCALE: f32 = 18.0;

pub fn load_font(path: &Path) -> MatchResult<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| MatchError::FontLoad {
        path: path.to_path_buf(),
        description: e.to_string(),
    })?;
    FontVec::try_from_vec(bytes).map_err(|e| MatchError::FontLoad {
        path: path.to_path_buf(),
        description: e.to_string(),
    })
}

/// Copy of `frame` with a 2 px box and a center dot per match. Labels
/// `"{index}: {confidence}"` are drawn only when a font is available.
pub fn annotate(frame: &DynamicImage, matches: &[MatchCandidate], font: Option<&FontVec>) -> RgbImage {
    let mut canvas = frame.to_rgb8();
    for (index, m) in matches.iter().enumerate() {
        let b = m.bounds;
        let (x, y) = (b.x as i32, b.y as i32);
        if b.width > 0 && b.height > 0 {
            draw_hollow_rect_mut(&mut canvas, Rect::at(x, y).of_size(b.width, b.height), BOX_COLOR);
        }
        if b.width > 2 && b.height > 2 {
            let inner = Rect::at(x + 1, y + 1).of_size(b.width - 2, b.height - 2);
            draw_hollow_rect_mut(&mut canvas, inner, BOX_COLOR);
        }
        draw_filled_circle_mut(
            &mut canvas,
            (m.center_x as i32, m.center_y as i32),
            CENTER_RADIUS,
            CENTER_COLOR,
        );
        if let Some(font) = font {
            let label = format!("{}: {:.4}", index + 1, m.confidence);
            let label_y = (y - LABEL_SCALE as i32 - 2).max(0);
            draw_text_mut(
                &mut canvas,
                BOX_COLOR,
                x,
                label_y,
                PxScale::from(LABEL_SCALE),
                font,
                &label,
            );
        }
    }
    canvas
}

pub fn save_debug_image(
    frame: &DynamicImage,
    matches: &[MatchCandidate],
    path: &Path,
    font: Option<&FontVec>,
) -> MatchResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MatchError::DebugImage {
            path: path.to_path_buf(),
            source: image::ImageError::IoError(e),
        })?;
    }
    annotate(frame, matches, font)
        .save(path)
        .map_err(|source| MatchError::DebugImage {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Debug image saved to {} ({} match(es))", path.display(), matches.len());
    Ok(())
}
