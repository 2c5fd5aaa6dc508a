//! OCR engine seams and page orientation handling.

mod orientation;
mod tesseract;

pub use orientation::{OrientationCorrector, detect_rotation, parse_rotation};
pub use tesseract::Tesseract;

use std::time::Duration;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Result type for OCR operations.
pub type Result<T> = std::result::Result<T, OcrError>;

/// Clockwise rotation that must be applied to a page to make it upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Rotate180,
    Clockwise270,
}

impl Rotation {
    /// Map an engine-reported angle; anything but 0/90/180/270 is rejected.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::None),
            90 => Some(Rotation::Clockwise90),
            180 => Some(Rotation::Rotate180),
            270 => Some(Rotation::Clockwise270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// Apply the rotation, returning a new image.
    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        match self {
            Rotation::None => image.clone(),
            Rotation::Clockwise90 => image.rotate90(),
            Rotation::Rotate180 => image.rotate180(),
            Rotation::Clockwise270 => image.rotate270(),
        }
    }
}

/// Whole-page orientation detection (OSD).
pub trait OrientationDetector {
    /// Run orientation-only analysis and return the engine's structured
    /// report, which carries a `Rotate: <degrees>` line.
    fn detect_orientation(&self, image: &DynamicImage, timeout: Duration) -> Result<String>;
}

/// Text recognition on a page image.
pub trait TextRecognizer {
    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        engine_mode: u8,
        segmentation_mode: u8,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Some(Rotation::None));
        assert_eq!(Rotation::from_degrees(90), Some(Rotation::Clockwise90));
        assert_eq!(Rotation::from_degrees(180), Some(Rotation::Rotate180));
        assert_eq!(Rotation::from_degrees(270), Some(Rotation::Clockwise270));
        assert_eq!(Rotation::from_degrees(45), None);
        assert_eq!(Rotation::from_degrees(-90), None);
        assert_eq!(Rotation::from_degrees(360), None);
    }

    #[test]
    fn test_apply_swaps_dimensions() {
        let image = DynamicImage::new_rgb8(30, 20);
        assert_eq!(Rotation::Clockwise90.apply(&image).width(), 20);
        assert_eq!(Rotation::Clockwise270.apply(&image).height(), 30);
        assert_eq!(Rotation::Rotate180.apply(&image).width(), 30);
    }
}
