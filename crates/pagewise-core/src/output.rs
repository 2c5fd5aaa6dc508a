//! On-disk layout of a processing run.
//!
//! ```text
//! <root>/
//!   page_<n>_text.txt
//!   all_pages_text.txt
//!   report.json
//!   extracted_images/page<n>_img<i>.<ext>
//!   figures/page<n>_figure<i>.png
//!   page_images/page_<n>_original.png
//!   processed_images/page_<n>_processed.png
//! ```
//!
//! A run writes each page into a hidden staging directory next to the root
//! as soon as the page is done, and moves everything into place only when
//! the whole document succeeded.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::config::OutputConfig;
use crate::models::page::{PageContent, PageResult};
use crate::models::report::{DocumentReport, PageReport};

const BANNER_WIDTH: usize = 80;

/// Output directories for one run, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    save_page_images: bool,
    write_report: bool,
}

impl OutputLayout {
    /// Layout rooted at `root` with page images and the report enabled.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            save_page_images: true,
            write_report: true,
        }
    }

    pub fn from_config(config: &OutputConfig) -> Self {
        Self {
            root: config.dir.clone(),
            save_page_images: config.save_page_images,
            write_report: config.write_report,
        }
    }

    pub fn with_page_images(mut self, enabled: bool) -> Self {
        self.save_page_images = enabled;
        self
    }

    pub fn with_report(mut self, enabled: bool) -> Self {
        self.write_report = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extracted_images_dir(&self) -> PathBuf {
        self.root.join("extracted_images")
    }

    pub fn figures_dir(&self) -> PathBuf {
        self.root.join("figures")
    }

    pub fn page_images_dir(&self) -> PathBuf {
        self.root.join("page_images")
    }

    pub fn processed_images_dir(&self) -> PathBuf {
        self.root.join("processed_images")
    }

    pub fn page_text_path(&self, page_number: u32) -> PathBuf {
        self.root.join(format!("page_{}_text.txt", page_number))
    }

    pub fn combined_text_path(&self) -> PathBuf {
        self.root.join("all_pages_text.txt")
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join("report.json")
    }

    /// Create every output directory. Safe to call more than once.
    pub fn prepare(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(self.extracted_images_dir())?;
        fs::create_dir_all(self.figures_dir())?;
        if self.save_page_images {
            fs::create_dir_all(self.page_images_dir())?;
            fs::create_dir_all(self.processed_images_dir())?;
        }
        debug!("Prepared output directory {}", self.root.display());
        Ok(())
    }

    pub fn write_page_text(&self, page: &PageResult) -> Result<PathBuf> {
        let path = self.page_text_path(page.page_number);
        fs::write(&path, page.text())?;
        Ok(path)
    }

    /// Append one page, with its banner, to the combined text file.
    pub fn append_combined_text(&self, page: &PageResult) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.combined_text_path())?;
        file.write_all(page_banner(page).as_bytes())?;
        file.write_all(page.text().as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// Save the page's embedded images under their original encoding.
    pub fn write_embedded_images(&self, page: &PageResult) -> Result<Vec<PathBuf>> {
        let dir = self.extracted_images_dir();
        let mut written = Vec::with_capacity(page.embedded_images.len());
        for embedded in &page.embedded_images {
            let path = dir.join(embedded.file_name(page.page_number));
            fs::write(&path, &embedded.image.data)?;
            written.push(path);
        }
        Ok(written)
    }

    pub fn write_figures(&self, page: &PageResult) -> Result<Vec<PathBuf>> {
        let dir = self.figures_dir();
        let mut written = Vec::new();
        for (i, figure) in page.figures().iter().enumerate() {
            let path = dir.join(format!("page{}_figure{}.png", page.page_number, i + 1));
            figure.image.save_with_format(&path, ImageFormat::Png)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Save the rendered and OCR-ready rasters of a scanned page.
    ///
    /// Returns `None` for digital pages or when page images are disabled.
    pub fn write_page_images(&self, page: &PageResult) -> Result<Option<(PathBuf, PathBuf)>> {
        let rasters = match &page.content {
            PageContent::Ocr { rasters, .. } if self.save_page_images => rasters,
            _ => return Ok(None),
        };

        let original = self
            .page_images_dir()
            .join(format!("page_{}_original.png", page.page_number));
        let processed = self
            .processed_images_dir()
            .join(format!("page_{}_processed.png", page.page_number));

        rasters.original.save_with_format(&original, ImageFormat::Png)?;
        rasters.processed.save_with_format(&processed, ImageFormat::Png)?;
        Ok(Some((original, processed)))
    }

    pub fn write_report(&self, report: &DocumentReport) -> Result<PathBuf> {
        let path = self.report_path();
        let content = serde_json::to_string_pretty(report)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Write everything produced for one page.
    pub fn write_page(&self, page: &PageResult) -> Result<()> {
        self.write_page_text(page)?;
        self.append_combined_text(page)?;
        self.write_embedded_images(page)?;
        self.write_figures(page)?;
        self.write_page_images(page)?;
        Ok(())
    }

    /// Start a run whose files become visible under the root only on commit.
    pub fn stage(&self, source: impl Into<String>) -> Result<StagedOutput> {
        let staging = OutputLayout {
            root: self.staging_root(),
            save_page_images: self.save_page_images,
            write_report: self.write_report,
        };

        // Leftovers from an interrupted run.
        if staging.root.exists() {
            fs::remove_dir_all(&staging.root)?;
        }
        staging.prepare()?;

        Ok(StagedOutput {
            target: self.clone(),
            staging,
            source: source.into(),
            pages: Vec::new(),
            committed: false,
        })
    }

    fn staging_root(&self) -> PathBuf {
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let parent = self.root.parent().unwrap_or_else(|| Path::new(""));
        parent.join(format!(".{}.partial", name))
    }
}

/// Output of a run in progress.
///
/// Pages are written to disk as they arrive and only a [`PageReport`] is kept
/// per page. Dropping without [`commit`](StagedOutput::commit) removes
/// everything written so far.
#[derive(Debug)]
pub struct StagedOutput {
    target: OutputLayout,
    staging: OutputLayout,
    source: String,
    pages: Vec<PageReport>,
    committed: bool,
}

impl StagedOutput {
    pub fn staging_dir(&self) -> &Path {
        self.staging.root()
    }

    pub fn add_page(&mut self, page: &PageResult) -> Result<()> {
        self.staging.write_page(page)?;
        self.pages.push(PageReport::from(page));
        debug!("Staged page {}", page.page_number);
        Ok(())
    }

    /// Write the report and move the staged files under the output root.
    pub fn commit(mut self) -> Result<DocumentReport> {
        let pages = std::mem::take(&mut self.pages);
        let report = DocumentReport::from_pages(self.source.clone(), pages);

        if self.staging.write_report {
            self.staging.write_report(&report)?;
        }
        move_tree(self.staging.root(), self.target.root())?;
        self.committed = true;

        info!("Saved {} pages to {}", report.page_count, self.target.root().display());
        Ok(report)
    }
}

impl Drop for StagedOutput {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_dir_all(self.staging.root()) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Could not remove {}: {}", self.staging.root().display(), e);
            }
        }
    }
}

/// Move every file under `from` to the same relative path under `to`,
/// replacing existing files, then remove `from`.
fn move_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            move_tree(&entry.path(), &dest)?;
        } else {
            if dest.is_file() {
                fs::remove_file(&dest)?;
            }
            fs::rename(entry.path(), &dest)?;
        }
    }
    fs::remove_dir(from)
}

/// Banner written above each page in the combined text.
pub fn page_banner(page: &PageResult) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    format!(
        "\n{}\nPAGE {} ({})\n{}\n\n",
        rule,
        page.page_number,
        page.method(),
        rule
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::page::{
        BoundingBox, Classification, EmbeddedImage, FigureRegion, PageKind, PageRasters,
    };
    use crate::ocr::Rotation;
    use crate::pdf::ExtractedImage;
    use image::DynamicImage;
    use pretty_assertions::assert_eq;

    fn digital(number: u32, text: &str) -> PageResult {
        PageResult {
            page_number: number,
            classification: Classification {
                kind: PageKind::DigitalText,
                text_length: text.trim().chars().count(),
            },
            content: PageContent::Digital { text: text.to_string() },
            embedded_images: Vec::new(),
        }
    }

    fn scanned(number: u32, text: &str) -> PageResult {
        let raster = DynamicImage::new_rgb8(20, 10);
        PageResult {
            page_number: number,
            classification: Classification { kind: PageKind::Scanned, text_length: 0 },
            content: PageContent::Ocr {
                text: text.to_string(),
                figures: vec![FigureRegion {
                    bbox: BoundingBox { x: 1, y: 1, width: 5, height: 4 },
                    image: DynamicImage::new_rgb8(5, 4),
                }],
                rotation: Rotation::None,
                rasters: PageRasters {
                    original: raster.clone(),
                    processed: DynamicImage::ImageLuma8(raster.to_luma8()),
                },
            },
            embedded_images: vec![EmbeddedImage {
                sequence: 1,
                image: ExtractedImage {
                    data: vec![0xFF, 0xD8, 0xFF],
                    width: 1,
                    height: 1,
                    extension: "jpeg".to_string(),
                },
            }],
        }
    }

    fn commit_pages(layout: &OutputLayout, pages: &[PageResult]) -> DocumentReport {
        let mut staged = layout.stage("doc.pdf").unwrap();
        for page in pages {
            staged.add_page(page).unwrap();
        }
        staged.commit().unwrap()
    }

    #[test]
    fn test_combined_text_has_one_banner_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));
        commit_pages(&layout, &[digital(1, "first"), scanned(2, "second"), digital(3, "third")]);

        let combined = fs::read_to_string(layout.combined_text_path()).unwrap();
        let headers: Vec<&str> = combined.lines().filter(|l| l.starts_with("PAGE ")).collect();
        assert_eq!(
            headers,
            vec!["PAGE 1 (digital_extraction)", "PAGE 2 (ocr)", "PAGE 3 (digital_extraction)"]
        );
        let rule = "=".repeat(80);
        assert_eq!(combined.lines().filter(|l| *l == rule).count(), 6);
    }

    #[test]
    fn test_banner_format() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path());
        layout.append_combined_text(&digital(7, "body")).unwrap();

        let expected = format!("\n{0}\nPAGE 7 (digital_extraction)\n{0}\n\nbody\n", "=".repeat(80));
        assert_eq!(fs::read_to_string(layout.combined_text_path()).unwrap(), expected);
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));

        layout.prepare().unwrap();
        layout.prepare().unwrap();

        assert!(layout.figures_dir().is_dir());
        assert!(layout.extracted_images_dir().is_dir());
        assert!(layout.page_images_dir().is_dir());
        assert!(layout.processed_images_dir().is_dir());
    }

    #[test]
    fn test_commit_writes_expected_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));

        let report = commit_pages(&layout, &[digital(1, "hello"), scanned(2, "world")]);

        assert_eq!(report.page_count, 2);
        assert_eq!(fs::read_to_string(layout.page_text_path(1)).unwrap(), "hello");
        assert_eq!(fs::read_to_string(layout.page_text_path(2)).unwrap(), "world");
        assert!(layout.combined_text_path().is_file());
        assert!(layout.report_path().is_file());
        assert_eq!(
            fs::read(layout.extracted_images_dir().join("page2_img1.jpeg")).unwrap(),
            vec![0xFF, 0xD8, 0xFF]
        );
        assert!(layout.figures_dir().join("page2_figure1.png").is_file());
        assert!(layout.page_images_dir().join("page_2_original.png").is_file());
        assert!(layout.processed_images_dir().join("page_2_processed.png").is_file());
        assert!(!layout.page_images_dir().join("page_1_original.png").exists());
        assert!(!layout.staging_root().exists());
    }

    #[test]
    fn test_pages_are_written_as_they_arrive() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));
        let mut staged = layout.stage("doc.pdf").unwrap();

        staged.add_page(&scanned(1, "text")).unwrap();

        let staging = staged.staging_dir().to_path_buf();
        assert!(staging.join("page_images").join("page_1_original.png").is_file());
        assert!(staging.join("figures").join("page1_figure1.png").is_file());
        assert!(!layout.root().exists());

        staged.commit().unwrap();
        assert!(layout.page_images_dir().join("page_1_original.png").is_file());
        assert!(!staging.exists());
    }

    #[test]
    fn test_abandoned_run_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));

        let mut staged = layout.stage("doc.pdf").unwrap();
        staged.add_page(&digital(1, "first")).unwrap();
        let staging = staged.staging_dir().to_path_buf();
        drop(staged);

        assert!(!staging.exists());
        assert!(!layout.root().exists());
    }

    #[test]
    fn test_commit_merges_into_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));
        fs::create_dir_all(layout.root()).unwrap();
        fs::write(layout.root().join("notes.txt"), "keep").unwrap();
        fs::write(layout.combined_text_path(), "stale").unwrap();

        commit_pages(&layout, &[digital(1, "fresh")]);

        assert_eq!(fs::read_to_string(layout.root().join("notes.txt")).unwrap(), "keep");
        let combined = fs::read_to_string(layout.combined_text_path()).unwrap();
        assert!(combined.contains("fresh"));
        assert!(!combined.contains("stale"));
    }

    #[test]
    fn test_stale_staging_directory_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"));
        fs::create_dir_all(layout.staging_root()).unwrap();
        fs::write(layout.staging_root().join("page_9_text.txt"), "old").unwrap();

        commit_pages(&layout, &[digital(1, "new")]);

        assert!(!layout.page_text_path(9).exists());
        assert!(layout.page_text_path(1).is_file());
    }

    #[test]
    fn test_page_images_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(dir.path().join("out"))
            .with_page_images(false)
            .with_report(false);

        commit_pages(&layout, &[scanned(1, "text")]);

        assert!(!layout.page_images_dir().exists());
        assert!(!layout.report_path().exists());
        assert!(layout.figures_dir().join("page1_figure1.png").is_file());
    }
}
