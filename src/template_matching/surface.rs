//! Per-scale confidence surfaces and template resampling
//!
//! The frame is transformed once per search; each scale then costs one
//! forward and one inverse 2D FFT of the zero-padded template plus a pass
//! over summed-area tables.

use super::error::{MatchError, MatchResult};
use super::types::MatchMethod;
use fast_image_resize as fir;
use image::GrayImage;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Variances and energies at or below this are treated as flat (featureless).
const VARIANCE_EPSILON: f64 = 1e-9;

/// Confidence of every template placement, row-major, all values in `[0, 1]`
/// except positions removed by [`ScoreMap::suppress`].
#[derive(Debug, Clone)]
pub struct ScoreMap {
    width: u32,
    height: u32,
    scores: Vec<f32>,
}

impl ScoreMap {
    /// One-off scoring of a single template. `None` when the template is empty
    /// or does not fit inside the frame.
    pub fn compute(frame: &GrayImage, template: &GrayImage, method: MatchMethod) -> Option<Self> {
        FrameSpectrum::new(frame).score(template, method)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.scores[(y as usize) * (self.width as usize) + x as usize]
    }

    /// First maximum in row-major order, ignoring suppressed positions.
    pub fn peak(&self) -> Option<(u32, u32, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &score) in self.scores.iter().enumerate() {
            if !score.is_finite() {
                continue;
            }
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, score)| self.position(idx, score))
    }

    /// Every position scoring at least `threshold`, row-major.
    pub fn positions_at_or_above(&self, threshold: f32) -> Vec<(u32, u32, f32)> {
        self.scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_finite() && **s >= threshold)
            .map(|(idx, &s)| self.position(idx, s))
            .collect()
    }

    /// Remove a `width` x `height` window centered on `(x, y)` from consideration.
    pub fn suppress(&mut self, x: u32, y: u32, width: u32, height: u32) {
        if self.scores.is_empty() {
            return;
        }
        let x0 = x.saturating_sub(width / 2);
        let y0 = y.saturating_sub(height / 2);
        let x1 = x.saturating_add(width / 2).min(self.width - 1);
        let y1 = y.saturating_add(height / 2).min(self.height - 1);
        let stride = self.width as usize;
        for yy in y0..=y1 {
            let row = yy as usize * stride;
            for xx in x0..=x1 {
                self.scores[row + xx as usize] = f32::NEG_INFINITY;
            }
        }
    }

    fn position(&self, idx: usize, score: f32) -> (u32, u32, f32) {
        let w = self.width as usize;
        ((idx % w) as u32, (idx / w) as u32, score)
    }
}

fn to_confidence(raw: f64, smaller_is_better: bool) -> f32 {
    let v = if smaller_is_better { 1.0 - raw } else { raw };
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) as f32 }
}

/// Running sums of pixel values and squared values with a zero guard row and column.
struct SummedArea {
    stride: usize,
    sums: Vec<f64>,
    squares: Vec<f64>,
}

impl SummedArea {
    fn new(image: &GrayImage) -> Self {
        let (w, h) = image.dimensions();
        let stride = w as usize + 1;
        let len = stride * (h as usize + 1);
        let mut sums = vec![0.0; len];
        let mut squares = vec![0.0; len];

        for (y, row) in image.rows().enumerate() {
            let mut row_sum = 0.0;
            let mut row_sq = 0.0;
            for (x, pixel) in row.enumerate() {
                let v = f64::from(pixel[0]);
                row_sum += v;
                row_sq += v * v;
                let i = (y + 1) * stride + x + 1;
                sums[i] = sums[i - stride] + row_sum;
                squares[i] = squares[i - stride] + row_sq;
            }
        }

        Self {
            stride,
            sums,
            squares,
        }
    }

    /// Sum and sum of squares over the `w` x `h` window at `(x, y)`.
    fn window(&self, x: u32, y: u32, w: u32, h: u32) -> (f64, f64) {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + w as usize, y0 + h as usize);
        let rect = |t: &[f64]| {
            t[y1 * self.stride + x1] - t[y0 * self.stride + x1] - t[y1 * self.stride + x0]
                + t[y0 * self.stride + x0]
        };
        (rect(&self.sums), rect(&self.squares))
    }
}

/// A frame prepared for scoring many templates: its 2D spectrum and its
/// summed-area tables. Build once per captured frame, reuse across scales.
pub struct FrameSpectrum {
    width: u32,
    height: u32,
    table: SummedArea,
    /// Column-major after the forward transform (rows, transpose, columns).
    spectrum: Vec<Complex<f64>>,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
}

impl FrameSpectrum {
    pub fn new(frame: &GrayImage) -> Self {
        let (width, height) = frame.dimensions();
        let mut planner = FftPlanner::new();
        let (w, h) = (width.max(1) as usize, height.max(1) as usize);
        let mut prepared = Self {
            width,
            height,
            table: SummedArea::new(frame),
            spectrum: Vec::new(),
            row_forward: planner.plan_fft_forward(w),
            row_inverse: planner.plan_fft_inverse(w),
            col_forward: planner.plan_fft_forward(h),
            col_inverse: planner.plan_fft_inverse(h),
        };
        if width > 0 && height > 0 {
            let pixels = frame
                .as_raw()
                .iter()
                .map(|&v| Complex::new(f64::from(v), 0.0))
                .collect();
            prepared.spectrum = prepared.forward(pixels);
        }
        prepared
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Confidence surface of `template` over this frame. `None` when the
    /// template is empty or does not fit inside the frame.
    pub fn score(&self, template: &GrayImage, method: MatchMethod) -> Option<ScoreMap> {
        let (tw, th) = template.dimensions();
        if tw == 0 || th == 0 || tw > self.width || th > self.height {
            return None;
        }

        let cross = self.cross_correlation(template);
        let n = f64::from(tw) * f64::from(th);
        let (t_sum, t_sq) = template.pixels().fold((0.0, 0.0), |(s, q), p| {
            let v = f64::from(p[0]);
            (s + v, q + v * v)
        });
        let t_var = t_sq - t_sum * t_sum / n;

        let (ow, oh) = (self.width - tw + 1, self.height - th + 1);
        let mut scores = Vec::with_capacity(ow as usize * oh as usize);
        for y in 0..oh {
            for x in 0..ow {
                let (w_sum, w_sq) = self.table.window(x, y, tw, th);
                let c = cross[y as usize * ow as usize + x as usize];
                let confidence = match method {
                    MatchMethod::SquaredDifferenceNormalized => {
                        to_confidence(squared_difference(w_sq, c, t_sq), true)
                    }
                    MatchMethod::CrossCorrelationNormalized => {
                        to_confidence(cross_correlation_normalized(w_sq, c, t_sq), false)
                    }
                    MatchMethod::CorrelationCoefficientNormalized if t_var <= VARIANCE_EPSILON => {
                        // A solid-color template has no shape to correlate;
                        // compare intensities instead.
                        to_confidence(squared_difference(w_sq, c, t_sq), true)
                    }
                    MatchMethod::CorrelationCoefficientNormalized => {
                        let w_var = w_sq - w_sum * w_sum / n;
                        let raw = if w_var <= VARIANCE_EPSILON {
                            0.0
                        } else {
                            (c - t_sum * w_sum / n) / (w_var * t_var).sqrt()
                        };
                        to_confidence(raw, false)
                    }
                };
                scores.push(confidence);
            }
        }

        Some(ScoreMap {
            width: ow,
            height: oh,
            scores,
        })
    }

    /// Raw sum of products `sum(frame[x+i, y+j] * template[i, j])` for every
    /// placement that keeps the template inside the frame, row-major.
    fn cross_correlation(&self, template: &GrayImage) -> Vec<f64> {
        let (w, h) = (self.width as usize, self.height as usize);
        let (tw, th) = (template.width() as usize, template.height() as usize);

        let mut padded = vec![Complex::new(0.0, 0.0); w * h];
        for (y, row) in template.as_raw().chunks_exact(tw).enumerate() {
            for (x, &v) in row.iter().enumerate() {
                padded[y * w + x] = Complex::new(f64::from(v), 0.0);
            }
        }

        let mut spectrum = self.forward(padded);
        for (t, f) in spectrum.iter_mut().zip(&self.spectrum) {
            *t = *f * t.conj();
        }
        let full = self.inverse(spectrum);

        // Placements that keep the template inside the frame never wrap around.
        let norm = 1.0 / (w * h) as f64;
        let (ow, oh) = (w - tw + 1, h - th + 1);
        let mut out = Vec::with_capacity(ow * oh);
        for y in 0..oh {
            out.extend(full[y * w..y * w + ow].iter().map(|c| c.re * norm));
        }
        out
    }

    fn forward(&self, mut rows: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        let (w, h) = (self.width as usize, self.height as usize);
        self.row_forward.process(&mut rows);
        let mut cols = transpose(&rows, w, h);
        self.col_forward.process(&mut cols);
        cols
    }

    fn inverse(&self, mut cols: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
        let (w, h) = (self.width as usize, self.height as usize);
        self.col_inverse.process(&mut cols);
        let mut rows = transpose(&cols, h, w);
        self.row_inverse.process(&mut rows);
        rows
    }
}

/// `src` is `w` wide and `h` tall, row-major; the result is `h` wide and `w` tall.
fn transpose(src: &[Complex<f64>], w: usize, h: usize) -> Vec<Complex<f64>> {
    let mut dst = vec![Complex::new(0.0, 0.0); src.len()];
    for (y, row) in src.chunks_exact(w).enumerate() {
        for (x, &v) in row.iter().enumerate() {
            dst[x * h + y] = v;
        }
    }
    dst
}

/// Normalized sum of squared errors, `0` for a perfect match. When either
/// side has no energy the windows are identical only if both are black.
fn squared_difference(w_sq: f64, cross: f64, t_sq: f64) -> f64 {
    let sse = (w_sq - 2.0 * cross + t_sq).max(0.0);
    let energy = (w_sq * t_sq).sqrt();
    if energy <= VARIANCE_EPSILON {
        if sse <= VARIANCE_EPSILON { 0.0 } else { 1.0 }
    } else {
        sse / energy
    }
}

fn cross_correlation_normalized(w_sq: f64, cross: f64, t_sq: f64) -> f64 {
    let energy = (w_sq * t_sq).sqrt();
    if energy <= VARIANCE_EPSILON {
        0.0
    } else {
        cross / energy
    }
}

/// Resample a template to `round(w * scale)` x `round(h * scale)`.
/// Box filtering when shrinking, bilinear when enlarging, a plain copy at 1.0.
/// `Ok(None)` when the result would have no pixels.
pub fn resize_template(template: &GrayImage, scale: f64) -> MatchResult<Option<GrayImage>> {
    let (w, h) = template.dimensions();
    if (scale - 1.0).abs() < 1e-9 {
        return Ok(Some(template.clone()));
    }

    let new_w = (f64::from(w) * scale).round();
    let new_h = (f64::from(h) * scale).round();
    if new_w < 1.0 || new_h < 1.0 || w == 0 || h == 0 {
        return Ok(None);
    }
    let (new_w, new_h) = (new_w as u32, new_h as u32);

    let resize_err = |description: String| MatchError::Resize { scale, description };

    let src = fir::images::ImageRef::new(w, h, template.as_raw(), fir::PixelType::U8)
        .map_err(|e| resize_err(e.to_string()))?;
    let mut dst = fir::images::Image::new(new_w, new_h, fir::PixelType::U8);
    let filter = if scale < 1.0 {
        fir::FilterType::Box
    } else {
        fir::FilterType::Bilinear
    };
    let options = fir::ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(filter));
    fir::Resizer::new()
        .resize(&src, &mut dst, &options)
        .map_err(|e| resize_err(e.to_string()))?;

    GrayImage::from_raw(new_w, new_h, dst.into_vec())
        .map(Some)
        .ok_or_else(|| resize_err("resized buffer has the wrong length".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 7 + y * 13) % 251) as u8]))
    }

    #[test]
    fn test_template_larger_than_frame_has_no_surface() {
        let frame = GrayImage::new(10, 10);
        let template = GrayImage::new(11, 5);
        assert!(ScoreMap::compute(&frame, &template, MatchMethod::default()).is_none());
    }

    #[test]
    fn test_surface_dimensions() {
        let frame = gradient(20, 15);
        let template = gradient(5, 4);
        let map = ScoreMap::compute(&frame, &template, MatchMethod::default()).unwrap();
        assert_eq!((map.width(), map.height()), (16, 12));
    }

    #[test]
    fn test_flat_template_falls_back_to_intensity_with_ccoeff() {
        let mut frame = GrayImage::from_pixel(20, 20, Luma([40]));
        for y in 12..16 {
            for x in 5..9 {
                frame.put_pixel(x, y, Luma([128]));
            }
        }
        let template = GrayImage::from_pixel(4, 4, Luma([128]));
        let map = ScoreMap::compute(&frame, &template, MatchMethod::default()).unwrap();
        let (x, y, score) = map.peak().unwrap();
        assert_eq!((x, y), (5, 12));
        assert!(score > 0.999, "score {score}");
        assert!(map.get(0, 0) < 0.9, "background scored {}", map.get(0, 0));
    }

    #[test]
    fn test_flat_window_scores_zero_with_ccoeff() {
        let frame = GrayImage::from_pixel(20, 20, Luma([90]));
        let template = gradient(4, 4);
        let map = ScoreMap::compute(&frame, &template, MatchMethod::default()).unwrap();
        assert_eq!(map.peak().map(|p| p.2), Some(0.0));
    }

    #[test]
    fn test_black_template_on_black_window_is_a_match() {
        let frame = GrayImage::new(10, 10);
        let template = GrayImage::new(3, 3);
        let map =
            ScoreMap::compute(&frame, &template, MatchMethod::SquaredDifferenceNormalized).unwrap();
        assert_eq!(map.peak(), Some((0, 0, 1.0)));
    }

    #[test]
    fn test_spectral_correlation_agrees_with_direct_sum() {
        let frame = gradient(37, 23);
        let template = GrayImage::from_fn(6, 5, |x, y| Luma([((x * 31 + y * 17) % 97) as u8]));
        let spectral = FrameSpectrum::new(&frame).cross_correlation(&template);
        let direct = imageproc::template_matching::match_template(
            &frame,
            &template,
            imageproc::template_matching::MatchTemplateMethod::CrossCorrelation,
        );

        assert_eq!(spectral.len(), (32 * 19) as usize);
        for (i, (s, d)) in spectral.iter().zip(direct.iter()).enumerate() {
            let d = f64::from(*d);
            assert!((s - d).abs() <= d.abs() * 1e-5 + 1e-3, "index {i}: {s} vs {d}");
        }
    }

    #[test]
    fn test_spectrum_is_reused_across_template_sizes() {
        let frame =
            GrayImage::from_fn(60, 40, |x, y| Luma([((x * x * 3 + y * y * 5 + x * y) % 253) as u8]));
        let spectrum = FrameSpectrum::new(&frame);
        for size in [4, 9, 17] {
            let template = image::imageops::crop_imm(&frame, 11, 7, size, size).to_image();
            let map = spectrum
                .score(&template, MatchMethod::SquaredDifferenceNormalized)
                .unwrap();
            assert_eq!((map.width(), map.height()), (61 - size, 41 - size));
            let (x, y, score) = map.peak().unwrap();
            assert_eq!((x, y), (11, 7), "size {size}");
            assert!(score > 0.9999, "size {size}: {score}");
        }
    }

    #[test]
    fn test_empty_frame_scores_nothing() {
        let spectrum = FrameSpectrum::new(&GrayImage::new(0, 0));
        assert!(spectrum.score(&gradient(1, 1), MatchMethod::default()).is_none());
    }

    #[test]
    fn test_peak_prefers_first_in_row_major_order() {
        let map = ScoreMap {
            width: 3,
            height: 2,
            scores: vec![0.1, 0.9, 0.2, 0.9, 0.3, 0.9],
        };
        assert_eq!(map.peak(), Some((1, 0, 0.9)));
    }

    #[test]
    fn test_suppress_blanks_window_and_clips() {
        let mut map = ScoreMap {
            width: 5,
            height: 5,
            scores: vec![0.5; 25],
        };
        map.suppress(0, 0, 4, 4);
        assert_eq!(map.get(2, 2), f32::NEG_INFINITY);
        assert_eq!(map.get(3, 0), 0.5);
        assert_eq!(map.peak(), Some((3, 0, 0.5)));
        assert_eq!(map.positions_at_or_above(0.5).len(), 25 - 9);
    }

    #[test]
    fn test_summed_area_window() {
        let image = GrayImage::from_fn(4, 3, |x, y| Luma([(x + 4 * y) as u8]));
        let table = SummedArea::new(&image);
        // Pixels 5, 6, 9, 10
        let (sum, sq) = table.window(1, 1, 2, 2);
        assert_eq!(sum, 30.0);
        assert_eq!(sq, 25.0 + 36.0 + 81.0 + 100.0);
    }

    #[test]
    fn test_resize_template_dimensions() {
        let template = gradient(40, 20);
        let half = resize_template(&template, 0.5).unwrap().unwrap();
        assert_eq!(half.dimensions(), (20, 10));
        let bigger = resize_template(&template, 1.25).unwrap().unwrap();
        assert_eq!(bigger.dimensions(), (50, 25));
        let same = resize_template(&template, 1.0).unwrap().unwrap();
        assert_eq!(same, template);
    }

    #[test]
    fn test_resize_template_to_nothing() {
        let template = gradient(3, 3);
        assert!(resize_template(&template, 0.1).unwrap().is_none());
    }
}
