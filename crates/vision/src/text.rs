//! Text recognition result shapes.

use serde::{Deserialize, Serialize};

/// A rectangle in normalized image coordinates with a bottom-left origin,
/// all components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NormalizedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        NormalizedRect { x, y, width, height }
    }

    /// Center of the rect in pixel space, flipping y from the bottom-left
    /// origin to the top-left origin screenshots use.
    pub fn pixel_center(&self, image_width: u32, image_height: u32) -> (f64, f64) {
        let center_x = (self.x + self.width / 2.0) * image_width as f64;
        let normalized_center_y = self.y + self.height / 2.0;
        let center_y = (1.0 - normalized_center_y) * image_height as f64;
        (center_x, center_y)
    }
}

/// One recognized text region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub text: String,
    pub rect: NormalizedRect,
}

/// A located needle: the full matched text and its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMatch {
    pub text: String,
    pub rect: NormalizedRect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_center_flips_the_y_axis() {
        // A region hugging the bottom of the image in normalized space lands
        // near the bottom of the pixel image, which is high y.
        let rect = NormalizedRect::new(0.25, 0.0, 0.5, 0.1);
        let (x, y) = rect.pixel_center(200, 100);
        assert_eq!(x, 100.0);
        assert_eq!(y, 95.0);

        // And a region at the top of normalized space has low pixel y.
        let rect = NormalizedRect::new(0.0, 0.9, 0.2, 0.1);
        let (_, y) = rect.pixel_center(200, 100);
        assert_eq!(y, 5.0);
    }
}
