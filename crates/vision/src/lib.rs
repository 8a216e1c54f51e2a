//! # tapkit vision facade
//!
//! The interpreter's OCR and template-matching needs go through the
//! [`VisionEngine`] trait. The trait is synchronous on purpose: host OCR
//! engines are usually asynchronous, and implementations are expected to wrap
//! their engine behind a completion gate with a bounded internal wait (the
//! interpreter's own loops assume a call returns within roughly ten seconds).
//!
//! Text matches come back in normalized, bottom-left-origin coordinates —
//! the convention native vision frameworks use — and the engine un-normalizes
//! and flips y before tapping. Template matching has a reference
//! implementation here, [`template::match_template_rgb`], that backends can
//! reuse directly.

pub mod template;
mod text;

use image::RgbaImage;

pub use template::{TemplateMatch, match_template_rgb};
pub use text::{NormalizedRect, TextMatch, TextRegion};

/// OCR and template-matching capabilities consumed by the interpreter.
pub trait VisionEngine: Send + Sync {
    /// First recognized region whose text contains `needle`
    /// case-insensitively, or `None`.
    fn find_text(&self, image: &RgbaImage, needle: &str) -> Option<TextMatch>;

    /// Every recognized text region, in the engine's natural reading order.
    fn recognize_text(&self, image: &RgbaImage) -> Vec<TextRegion>;

    /// Best template match scoring at least `min_confidence`, or `None`.
    fn match_template(&self, image: &RgbaImage, template: &RgbaImage, min_confidence: f64) -> Option<TemplateMatch>;
}

/// Scripted vision engine for tests and the demo server: recognizes a fixed
/// table of text placements and delegates template matching to the reference
/// matcher.
#[derive(Debug, Default)]
pub struct StaticVision {
    regions: Vec<TextRegion>,
}

impl StaticVision {
    pub fn new() -> Self {
        StaticVision::default()
    }

    /// Adds a recognized region; `rect` is normalized with a bottom-left
    /// origin, matching what a real engine would report.
    pub fn with_text(mut self, text: &str, rect: NormalizedRect) -> Self {
        self.regions.push(TextRegion {
            text: text.to_string(),
            rect,
        });
        self
    }
}

impl VisionEngine for StaticVision {
    fn find_text(&self, _image: &RgbaImage, needle: &str) -> Option<TextMatch> {
        let needle = needle.to_lowercase();
        self.regions
            .iter()
            .find(|region| region.text.to_lowercase().contains(&needle))
            .map(|region| TextMatch {
                text: region.text.clone(),
                rect: region.rect,
            })
    }

    fn recognize_text(&self, _image: &RgbaImage) -> Vec<TextRegion> {
        self.regions.clone()
    }

    fn match_template(&self, image: &RgbaImage, template: &RgbaImage, min_confidence: f64) -> Option<TemplateMatch> {
        match_template_rgb(image, template, min_confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> RgbaImage {
        RgbaImage::new(4, 4)
    }

    #[test]
    fn find_text_is_a_case_insensitive_contains_match() {
        let vision = StaticVision::new().with_text("Sign In", NormalizedRect::new(0.1, 0.8, 0.2, 0.05));
        assert!(vision.find_text(&blank(), "sign").is_some());
        assert!(vision.find_text(&blank(), "SIGN IN").is_some());
        assert!(vision.find_text(&blank(), "register").is_none());
    }

    #[test]
    fn recognize_text_returns_placements_in_order() {
        let vision = StaticVision::new()
            .with_text("Hello", NormalizedRect::new(0.0, 0.9, 0.1, 0.05))
            .with_text("World", NormalizedRect::new(0.2, 0.9, 0.1, 0.05));
        let regions = vision.recognize_text(&blank());
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].text, "Hello");
        assert_eq!(regions[1].text, "World");
    }
}
