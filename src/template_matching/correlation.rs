//! Normalized correlation coefficient matching over the RGB channels
//!
//! The score at `(x, y)` is the zero-mean correlation between the template
//! and the frame window under it, summed over red, green and blue:
//!
//! `sum(T' * I) / sqrt(sum(T'^2) * sum((I - mean(I))^2))`
//!
//! where `T'` is the template with each channel's mean removed. Window sums
//! and sums of squares come from integral images.
use super::matcher::MatchStrategy;
use super::types::{Location, MatchResult, Template};
use image::buffer::ConvertBuffer;
use image::{RgbImage, RgbaImage};
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};

/// Below this a window or template has no contrast to correlate against
const FLAT_VARIANCE: f64 = 0.5;

#[derive(Debug, Default, Clone, Copy)]
pub struct CorrelationMatcher;

/// Template with each channel's mean subtracted, row-major RGB triples
struct ZeroMeanTemplate {
    values: Vec<f32>,
    norm_sq: f64,
}

impl ZeroMeanTemplate {
    fn new(template: &RgbImage) -> Self {
        let n = f64::from(template.width()) * f64::from(template.height());
        let mut means = [0f64; 3];
        for pixel in template.pixels() {
            for (mean, &v) in means.iter_mut().zip(pixel.0.iter()) {
                *mean += f64::from(v);
            }
        }
        means.iter_mut().for_each(|m| *m /= n);

        let mut values = Vec::with_capacity(template.as_raw().len());
        let mut norm_sq = 0.0;
        for pixel in template.pixels() {
            for (&mean, &v) in means.iter().zip(pixel.0.iter()) {
                let centered = f64::from(v) - mean;
                norm_sq += centered * centered;
                values.push(centered as f32);
            }
        }
        Self { values, norm_sq }
    }
}

impl CorrelationMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Maximum of the correlation surface and where it sits.
    ///
    /// Ties keep the first maximum in row-major order. Flat windows, flat
    /// templates and non-finite results score zero, as do anti-correlated
    /// windows.
    pub fn best_location(frame: &RgbImage, template: &RgbImage) -> Option<(Location, f32)> {
        let (fw, fh) = frame.dimensions();
        let (tw, th) = template.dimensions();
        if tw == 0 || th == 0 || tw > fw || th > fh {
            return None;
        }

        let zero_mean = ZeroMeanTemplate::new(template);
        let sums = integral_image::<_, u64>(frame);
        let squares = integral_squared_image::<_, u64>(frame);
        let n = f64::from(tw) * f64::from(th);
        let stride = fw as usize * 3;
        let row_len = tw as usize * 3;
        let raw = frame.as_raw();

        let mut best = (Location { x: 0, y: 0 }, f32::NEG_INFINITY);
        for y in 0..=fh - th {
            for x in 0..=fw - tw {
                let sum = sum_image_pixels(&sums, x, y, x + tw - 1, y + th - 1);
                let sum_sq = sum_image_pixels(&squares, x, y, x + tw - 1, y + th - 1);
                let window_var: f64 = (0..3)
                    .map(|c| sum_sq[c] as f64 - (sum[c] as f64).powi(2) / n)
                    .sum();

                let score = if window_var < FLAT_VARIANCE || zero_mean.norm_sq < FLAT_VARIANCE {
                    0.0
                } else {
                    let mut numerator = 0f64;
                    for row in 0..th as usize {
                        let start = (y as usize + row) * stride + x as usize * 3;
                        let window = &raw[start..start + row_len];
                        let centered = &zero_mean.values[row * row_len..(row + 1) * row_len];
                        let partial: f32 = window
                            .iter()
                            .zip(centered)
                            .map(|(&i, &t)| f32::from(i) * t)
                            .sum();
                        numerator += f64::from(partial);
                    }
                    let coefficient = (numerator / (zero_mean.norm_sq * window_var).sqrt()) as f32;
                    if coefficient.is_finite() {
                        coefficient.clamp(0.0, 1.0)
                    } else {
                        0.0
                    }
                };

                if score > best.1 {
                    best = (Location { x, y }, score);
                }
            }
        }
        Some(best)
    }
}

impl MatchStrategy for CorrelationMatcher {
    fn name(&self) -> &'static str {
        "correlation"
    }

    fn find(&self, frame: &RgbaImage, template: &Template, confidence: f32) -> MatchResult {
        let frame_rgb: RgbImage = frame.convert();
        match Self::best_location(&frame_rgb, template.rgb()) {
            Some((location, score)) if score >= confidence => {
                MatchResult::hit(template.id(), location, Some(score))
            }
            Some((_, score)) => MatchResult::miss(Some(score)),
            None => {
                log::debug!(
                    "⚠️ Template {} ({}x{}) does not fit in frame {}x{}",
                    template.name(),
                    template.width(),
                    template.height(),
                    frame.width(),
                    frame.height()
                );
                MatchResult::miss(None)
            }
        }
    }
}
