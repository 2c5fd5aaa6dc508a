//! Tesseract command-line backend for OCR and orientation detection.

use std::io::ErrorKind;
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use image::{DynamicImage, GenericImageView};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{OrientationDetector, Result, TextRecognizer};
use crate::command;
use crate::error::OcrError;

/// OCR engine backed by the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct Tesseract {
    program: String,
}

impl Tesseract {
    /// Use the given executable name or path.
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Executable used for every invocation.
    pub fn program(&self) -> &str {
        &self.program
    }

    fn run(&self, image: &DynamicImage, args: &[String], timeout: Option<Duration>) -> Result<String> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("empty image {}x{}", width, height)));
        }

        let input = write_temp_png(image)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg(input.path()).arg("stdout").args(args);

        let output = command::run(&mut cmd, timeout)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OcrError::EngineNotFound(format!(
                    "'{}' is not installed or not in PATH",
                    self.program
                )),
                _ => OcrError::Engine(e.to_string()),
            })?
            .ok_or_else(|| OcrError::Timeout(timeout.unwrap_or_default()))?;

        check_status(&output)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl TextRecognizer for Tesseract {
    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        engine_mode: u8,
        segmentation_mode: u8,
    ) -> Result<String> {
        let start = Instant::now();
        let args = [
            "-l".to_string(),
            language.to_string(),
            "--oem".to_string(),
            engine_mode.to_string(),
            "--psm".to_string(),
            segmentation_mode.to_string(),
        ];

        let text = self.run(image, &args, None)?;

        info!(
            "OCR complete: {} characters in {}ms",
            text.chars().count(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

impl OrientationDetector for Tesseract {
    fn detect_orientation(&self, image: &DynamicImage, timeout: Duration) -> Result<String> {
        // psm 0: orientation and script detection only.
        let args = ["--psm".to_string(), "0".to_string()];
        let report = self.run(image, &args, Some(timeout))?;
        debug!("OSD report: {}", report.trim());
        Ok(report)
    }
}

fn write_temp_png(image: &DynamicImage) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("pagewise-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| OcrError::Engine(format!("failed to create temp file: {}", e)))?;

    image
        .save_with_format(file.path(), image::ImageFormat::Png)
        .map_err(|e| OcrError::InvalidImage(e.to_string()))?;

    Ok(file)
}

fn check_status(output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(OcrError::Engine(format!(
        "exited with {}: {}",
        output.status,
        stderr.trim()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_engine_is_reported() {
        let engine = Tesseract::new("pagewise-missing-tesseract");
        let image = DynamicImage::new_luma8(8, 8);

        let err = engine.recognize(&image, "eng", 3, 6).unwrap_err();
        assert!(matches!(err, OcrError::EngineNotFound(_)));

        let err = engine
            .detect_orientation(&image, Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, OcrError::EngineNotFound(_)));
    }

    #[test]
    fn test_empty_image_is_rejected() {
        let engine = Tesseract::default();
        let image = DynamicImage::new_luma8(0, 0);
        let err = engine.recognize(&image, "eng", 3, 6).unwrap_err();
        assert!(matches!(err, OcrError::InvalidImage(_)));
    }
}
