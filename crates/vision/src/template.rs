//! Reference template matcher.
//!
//! Similarity is one minus the mean absolute RGB difference between the
//! template and the candidate window. Two subsampling knobs keep a full-screen
//! scan cheap: candidate positions advance on a 4-pixel grid, and only every
//! 4th template pixel in each axis is compared. Precise-enough for locating
//! buttons and icons, and fast enough to run inside a 200 ms polling loop.

use image::RgbaImage;

/// Candidate grid step in pixels.
const GRID_STEP: u32 = 4;
/// Template sampling stride in pixels.
const SAMPLE_STRIDE: u32 = 4;

/// Best-scoring placement of a template inside a larger image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    /// Top-left corner of the matched window, in image pixels.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Similarity in `0.0..=1.0`.
    pub score: f64,
}

impl TemplateMatch {
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }
}

/// Scans `image` for `template` and returns the best placement scoring at
/// least `min_confidence`, or `None` when nothing qualifies (including when
/// the template is larger than the image).
pub fn match_template_rgb(image: &RgbaImage, template: &RgbaImage, min_confidence: f64) -> Option<TemplateMatch> {
    let (image_width, image_height) = image.dimensions();
    let (template_width, template_height) = template.dimensions();
    if template_width == 0 || template_height == 0 || template_width > image_width || template_height > image_height {
        return None;
    }

    let mut best: Option<TemplateMatch> = None;
    let mut y = 0;
    while y + template_height <= image_height {
        let mut x = 0;
        while x + template_width <= image_width {
            let score = window_score(image, template, x, y);
            if score >= min_confidence && best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(TemplateMatch {
                    x,
                    y,
                    width: template_width,
                    height: template_height,
                    score,
                });
            }
            x += GRID_STEP;
        }
        y += GRID_STEP;
    }
    best
}

fn window_score(image: &RgbaImage, template: &RgbaImage, origin_x: u32, origin_y: u32) -> f64 {
    let mut total_difference = 0u64;
    let mut samples = 0u64;

    let mut ty = 0;
    while ty < template.height() {
        let mut tx = 0;
        while tx < template.width() {
            let template_pixel = template.get_pixel(tx, ty).0;
            let image_pixel = image.get_pixel(origin_x + tx, origin_y + ty).0;
            for channel in 0..3 {
                total_difference += template_pixel[channel].abs_diff(image_pixel[channel]) as u64;
            }
            samples += 3;
            tx += SAMPLE_STRIDE;
        }
        ty += SAMPLE_STRIDE;
    }

    if samples == 0 {
        return 0.0;
    }
    1.0 - (total_difference as f64 / samples as f64) / 255.0
}
