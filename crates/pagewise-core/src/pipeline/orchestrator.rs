//! Per-page routing between direct text extraction and OCR.

use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use super::classifier::classify;
use crate::error::{PdfError, Result};
use crate::figures::{FigureDetector, FigureFinder};
use crate::models::config::PagewiseConfig;
use crate::models::page::{EmbeddedImage, PageContent, PageRasters, PageResult};
use crate::ocr::{OrientationCorrector, OrientationDetector, TextRecognizer};
use crate::pdf::PageSource;

/// An engine that can both detect orientation and recognise text.
pub trait OcrBackend: OrientationDetector + TextRecognizer {}

impl<T: OrientationDetector + TextRecognizer> OcrBackend for T {}

/// Knobs that apply to every page of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    pub dpi: u32,
    pub language: String,
    pub engine_mode: u8,
    pub segmentation_mode: u8,
    pub text_threshold: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &PagewiseConfig) -> Self {
        Self {
            dpi: config.pdf.render_dpi,
            language: config.ocr.language.clone(),
            engine_mode: config.ocr.engine_mode,
            segmentation_mode: config.ocr.segmentation_mode,
            text_threshold: config.pdf.text_threshold,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&PagewiseConfig::default())
    }
}

/// Drives each page through classification and the matching extraction path.
pub struct PagePipeline<E, F = FigureDetector> {
    engine: E,
    figure_finder: F,
    corrector: OrientationCorrector,
    settings: PipelineSettings,
}

impl<E: OcrBackend> PagePipeline<E> {
    /// Build a pipeline with the heuristic figure detector.
    pub fn new(engine: E, config: &PagewiseConfig) -> Self {
        Self {
            engine,
            figure_finder: FigureDetector::new(),
            corrector: OrientationCorrector::new(config.ocr.use_osd)
                .with_timeout(config.ocr.osd_timeout()),
            settings: PipelineSettings::from_config(config),
        }
    }
}

impl<E: OcrBackend, F: FigureFinder> PagePipeline<E, F> {
    /// Swap the figure finder.
    pub fn with_figure_finder<G: FigureFinder>(self, figure_finder: G) -> PagePipeline<E, G> {
        PagePipeline {
            engine: self.engine,
            figure_finder,
            corrector: self.corrector,
            settings: self.settings,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.settings.dpi = dpi;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.settings.language = language.into();
        self
    }

    pub fn with_corrector(mut self, corrector: OrientationCorrector) -> Self {
        self.corrector = corrector;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn figure_finder(&self) -> &F {
        &self.figure_finder
    }

    /// Process a single page (0-based index).
    pub fn process_page<S: PageSource + ?Sized>(
        &self,
        source: &S,
        page_index: u32,
    ) -> Result<PageResult> {
        if page_index >= source.page_count() {
            return Err(PdfError::InvalidPage(page_index).into());
        }

        let start = Instant::now();
        let page_number = page_index + 1;

        let text_layer = source.text_layer(page_index).unwrap_or_else(|e| {
            warn!("Page {}: text layer unreadable, treating as empty: {}", page_number, e);
            String::new()
        });
        let classification = classify(&text_layer, self.settings.text_threshold);
        debug!(
            "Page {}: {} characters in text layer, {:?}",
            page_number, classification.text_length, classification.kind
        );

        let content = if classification.is_digital() {
            PageContent::Digital { text: text_layer }
        } else {
            self.recognize_page(source, page_index)?
        };

        let embedded_images = self.extract_embedded_images(source, page_index);

        let result = PageResult {
            page_number,
            classification,
            content,
            embedded_images,
        };

        info!(
            "Page {}: {} ({} chars, {} figures, {} images) in {}ms",
            page_number,
            result.method(),
            result.text().chars().count(),
            result.figures().len(),
            result.embedded_images.len(),
            start.elapsed().as_millis()
        );
        Ok(result)
    }

    /// Process every page in order.
    pub fn process_document<S: PageSource + ?Sized>(&self, source: &S) -> Result<Vec<PageResult>> {
        let mut results = Vec::with_capacity(source.page_count() as usize);
        self.process_document_with(source, |page| {
            results.push(page);
            Ok(())
        })?;
        Ok(results)
    }

    /// Process every page in order, handing each result to `on_page` as soon
    /// as it is ready so rasters do not accumulate across the document.
    ///
    /// Stops at the first error from either the pipeline or `on_page`.
    pub fn process_document_with<S, C>(&self, source: &S, mut on_page: C) -> Result<()>
    where
        S: PageSource + ?Sized,
        C: FnMut(PageResult) -> Result<()>,
    {
        let page_count = source.page_count();
        info!("Processing {} pages", page_count);

        for page_index in 0..page_count {
            on_page(self.process_page(source, page_index)?)?;
        }
        Ok(())
    }

    fn recognize_page<S: PageSource + ?Sized>(&self, source: &S, page_index: u32) -> Result<PageContent> {
        let original = source.render(page_index, self.settings.dpi)?;
        let (upright, rotation) = self.corrector.correct(&self.engine, original.clone());

        let processed = DynamicImage::ImageLuma8(upright.to_luma8());
        let text = self.engine.recognize(
            &processed,
            &self.settings.language,
            self.settings.engine_mode,
            self.settings.segmentation_mode,
        )?;

        // Figures are measured on the upright colour raster, not the OCR input.
        let figures = self.figure_finder.find_figures(&upright);

        Ok(PageContent::Ocr {
            text,
            figures,
            rotation,
            rasters: PageRasters { original, processed },
        })
    }

    fn extract_embedded_images<S: PageSource + ?Sized>(
        &self,
        source: &S,
        page_index: u32,
    ) -> Vec<EmbeddedImage> {
        let page_number = page_index + 1;
        let xrefs = match source.list_images(page_index) {
            Ok(xrefs) => xrefs,
            Err(e) => {
                warn!("Page {}: could not list images: {}", page_number, e);
                return Vec::new();
            }
        };

        xrefs
            .into_iter()
            .enumerate()
            .filter_map(|(i, xref)| match source.extract_image(xref) {
                Ok(image) => Some(EmbeddedImage { sequence: i + 1, image }),
                Err(e) => {
                    warn!(
                        "Page {}: skipping image {} (object {}): {}",
                        page_number,
                        i + 1,
                        xref.object,
                        e
                    );
                    None
                }
            })
            .collect()
    }
}
