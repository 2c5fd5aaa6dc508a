//! Page rasterization through poppler's `pdftoppm`.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::process::Command;

use image::DynamicImage;
use tracing::debug;

use super::Result;
use crate::command;
use crate::error::PdfError;

/// Rasterizer that shells out to `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: String,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Render one page (0-based) of a PDF on disk.
    pub fn render_file(&self, pdf: &Path, page_index: u32, dpi: u32) -> Result<DynamicImage> {
        if dpi == 0 {
            return Err(PdfError::Render("DPI must be positive".to_string()));
        }

        let out_dir = tempfile::tempdir().map_err(|e| PdfError::Render(e.to_string()))?;
        let prefix = out_dir.path().join("page");
        let page_number = (page_index + 1).to_string();

        let mut cmd = Command::new(&self.program);
        cmd.arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-png")
            .arg("-singlefile")
            .arg(pdf)
            .arg(&prefix);

        let output = command::run(&mut cmd, None)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => PdfError::Render(format!(
                    "'{}' is not installed or not in PATH",
                    self.program
                )),
                _ => PdfError::Render(e.to_string()),
            })?
            .ok_or_else(|| PdfError::Render("rasterizer did not finish".to_string()))?;

        if !output.status.success() {
            return Err(PdfError::Render(format!(
                "page {}: {}",
                page_number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let image = image::open(prefix.with_extension("png"))
            .map_err(|e| PdfError::Render(format!("page {}: {}", page_number, e)))?;

        debug!(
            "Rendered page {} at {} dpi: {}x{}, {} channels",
            page_number,
            dpi,
            image.width(),
            image.height(),
            image.color().channel_count()
        );
        Ok(image)
    }

    /// Render one page of an in-memory PDF.
    pub fn render_bytes(&self, pdf: &[u8], page_index: u32, dpi: u32) -> Result<DynamicImage> {
        let mut file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| PdfError::Render(e.to_string()))?;
        file.write_all(pdf).map_err(|e| PdfError::Render(e.to_string()))?;
        file.flush().map_err(|e| PdfError::Render(e.to_string()))?;

        self.render_file(file.path(), page_index, dpi)
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}
