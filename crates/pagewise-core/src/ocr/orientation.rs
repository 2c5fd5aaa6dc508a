//! Page orientation correction driven by an orientation detector.

use std::time::Duration;

use image::DynamicImage;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use super::{OrientationDetector, Result, Rotation};
use crate::error::OcrError;

lazy_static! {
    static ref ROTATE_FIELD: Regex = Regex::new(r"Rotate:[ \t]*([^\s]*)").unwrap();
}

/// Extract the rotation from an OSD report.
///
/// Only the first `Rotate:` field is considered.
pub fn parse_rotation(report: &str) -> Result<Rotation> {
    let caps = ROTATE_FIELD
        .captures(report)
        .ok_or_else(|| OcrError::MalformedOutput("no Rotate field in OSD output".to_string()))?;

    let value = &caps[1];
    let degrees: i32 = value
        .parse()
        .map_err(|_| OcrError::MalformedOutput(format!("invalid rotation value: {:?}", value)))?;

    Rotation::from_degrees(degrees)
        .ok_or_else(|| OcrError::MalformedOutput(format!("unsupported rotation: {}", degrees)))
}

/// Ask the detector for the page orientation and parse its answer.
pub fn detect_rotation<D: OrientationDetector + ?Sized>(
    detector: &D,
    image: &DynamicImage,
    timeout: Duration,
) -> Result<Rotation> {
    let report = detector.detect_orientation(image, timeout)?;
    parse_rotation(&report)
}

/// Best-effort orientation correction.
///
/// Detection failures never abort processing: the page goes on uncorrected.
#[derive(Debug, Clone)]
pub struct OrientationCorrector {
    enabled: bool,
    timeout: Duration,
}

impl OrientationCorrector {
    /// Create a corrector with the default 10 second detector timeout.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timeout: Duration::from_secs(10),
        }
    }

    /// Set the detector timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the upright image and the rotation that was applied.
    pub fn correct<D: OrientationDetector + ?Sized>(
        &self,
        detector: &D,
        image: DynamicImage,
    ) -> (DynamicImage, Rotation) {
        if !self.enabled {
            return (image, Rotation::None);
        }

        let rotation = detect_rotation(detector, &image, self.timeout).unwrap_or_else(|e| {
            warn!("Orientation detection failed, continuing uncorrected: {}", e);
            Rotation::None
        });

        if rotation == Rotation::None {
            debug!("No rotation detected");
            return (image, rotation);
        }

        info!("Detected {}° rotation, corrected", rotation.degrees());
        (rotation.apply(&image), rotation)
    }
}

impl Default for OrientationCorrector {
    fn default() -> Self {
        Self::new(true)
    }
}
