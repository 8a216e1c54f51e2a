//! Capability traits the interpreter drives the host through.
//!
//! Everything is synchronous: waiting is the caller's job (the engine runs its
//! own deadline loops), and implementations that wrap asynchronous runtimes
//! are expected to block with a bounded internal wait. Backend failures are
//! reported as `anyhow` errors; the engine wraps them into its own taxonomy.

use std::io::Cursor;
use std::time::Duration;

use anyhow::{Context, Result};
use image::RgbaImage;
use indexmap::IndexMap;

use crate::geometry::{Point, Rect, Size};
use crate::predicate::Predicate;
use crate::selector::ElementType;

/// Boxed element handle returned by queries. Handles are snapshots of a live
/// UI: never cache one across steps, re-query instead.
pub type ElementRef = Box<dyn UiElement>;

/// Application process state as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    NotRunning,
    Background,
    Foreground,
}

/// One live UI element.
pub trait UiElement: Send + Sync {
    fn exists(&self) -> bool;
    fn is_hittable(&self) -> bool;
    fn is_enabled(&self) -> bool;
    fn label(&self) -> String;
    fn value(&self) -> String;
    fn identifier(&self) -> String;
    fn placeholder_value(&self) -> String;
    fn frame(&self) -> Rect;

    fn tap(&self) -> Result<()>;
    fn double_tap(&self) -> Result<()>;
    fn press_for(&self, duration: Duration) -> Result<()>;
    fn type_text(&self, text: &str) -> Result<()>;

    /// Adjusts a picker wheel to the given textual value.
    fn adjust_picker_to(&self, value: &str) -> Result<()>;
}

/// One application on the device.
pub trait AppHandle: Send + Sync {
    fn bundle_id(&self) -> String;

    fn launch(&self, arguments: &[String], environment: &IndexMap<String, String>) -> Result<()>;
    fn terminate(&self) -> Result<()>;
    fn activate(&self) -> Result<()>;
    fn state(&self) -> AppState;

    /// Typed query: elements of `element_type` matching `predicate` (all
    /// elements of the type when `None`), truncated to `limit` when non-zero.
    fn query_type(&self, element_type: ElementType, predicate: Option<&Predicate>, limit: usize) -> Vec<ElementRef>;

    /// Class-chain query, delegated verbatim. `first_only` lets the backend
    /// stop after the first match.
    fn query_class_chain(&self, chain: &str, first_only: bool) -> Vec<ElementRef>;

    /// Match-any-descendant predicate query; the expensive fallback.
    fn query_descendants(&self, predicate: &Predicate, limit: usize) -> Vec<ElementRef>;

    /// Buttons of the frontmost alert, if an alert is showing.
    fn alert_buttons(&self) -> Vec<ElementRef>;

    /// Buttons of the frontmost action sheet, if one is showing.
    fn sheet_buttons(&self) -> Vec<ElementRef>;

    /// Picker wheels in natural order.
    fn picker_wheels(&self) -> Vec<ElementRef>;

    /// Types into whatever element currently has keyboard focus.
    fn type_text(&self, text: &str) -> Result<()>;
}

/// Device-level capabilities outside any single application.
pub trait UiDriver: Send + Sync {
    /// The foreground application, if any.
    fn active_app(&self) -> Option<Box<dyn AppHandle>>;

    /// A handle for the given bundle id; the app need not be running.
    fn app_by_bundle(&self, bundle_id: &str) -> Box<dyn AppHandle>;

    /// The system springboard, where permission alerts surface.
    fn springboard(&self) -> Box<dyn AppHandle>;

    fn screen_size(&self) -> Size;

    fn press_home(&self) -> Result<()>;
    fn lock(&self) -> Result<()>;
    fn unlock(&self) -> Result<()>;

    fn set_pasteboard(&self, text: &str) -> Result<()>;

    fn tap_at(&self, point: Point) -> Result<()>;
    fn double_tap_at(&self, point: Point) -> Result<()>;
    fn press_at(&self, point: Point, duration: Duration) -> Result<()>;
    fn press_drag(&self, from: Point, to: Point, duration: Duration) -> Result<()>;
    fn pinch_at(&self, center: Point, scale: f64, velocity: f64) -> Result<()>;

    fn capture_screenshot(&self) -> Result<Screenshot>;
}

/// A captured screen image in screen points (scale 1).
#[derive(Debug, Clone)]
pub struct Screenshot {
    pub image: RgbaImage,
}

impl Screenshot {
    pub fn new(image: RgbaImage) -> Self {
        Screenshot { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Lossless PNG encoding, used by full-quality captures.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, image::ImageFormat::Png)
            .context("encode screenshot as png")?;
        Ok(buffer.into_inner())
    }

    /// JPEG encoding at the given quality, used by the default capture mode.
    pub fn jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        let rgb = image::DynamicImage::ImageRgba8(self.image.clone()).to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
        rgb.write_with_encoder(encoder).context("encode screenshot as jpeg")?;
        Ok(buffer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshot_encodes_to_png_and_jpeg() {
        let image = RgbaImage::from_pixel(8, 8, image::Rgba([200, 40, 40, 255]));
        let shot = Screenshot::new(image);

        let png = shot.png_bytes().expect("png");
        assert_eq!(&png[1..4], b"PNG");

        let jpeg = shot.jpeg_bytes(70).expect("jpeg");
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
