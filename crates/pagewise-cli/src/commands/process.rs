//! Process command - route every page of a PDF to text extraction or OCR.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use pagewise_core::{
    DocumentReport, OutputLayout, PagePipeline, PagewiseConfig, PdfDocument, PdftoppmRasterizer,
    Tesseract,
};

use super::{ensure_input, load_config};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory (default: from config, "output")
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Render resolution for scanned pages
    #[arg(long)]
    dpi: Option<u32>,

    /// OCR language (tesseract language code, e.g. "eng", "deu+eng")
    #[arg(short, long)]
    lang: Option<String>,

    /// Skip orientation detection
    #[arg(long)]
    no_osd: bool,

    /// Do not save rendered and processed page images
    #[arg(long)]
    no_page_images: bool,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl ProcessArgs {
    /// Fold command-line overrides into the loaded configuration.
    fn apply(&self, config: &mut PagewiseConfig) {
        if let Some(dir) = &self.output_dir {
            config.output.dir = dir.clone();
        }
        if let Some(dpi) = self.dpi {
            config.pdf.render_dpi = dpi;
        }
        if let Some(lang) = &self.lang {
            config.ocr.language = lang.clone();
        }
        if self.no_osd {
            config.ocr.use_osd = false;
        }
        if self.no_page_images {
            config.output.save_page_images = false;
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.apply(&mut config);

    if config.pdf.render_dpi == 0 {
        anyhow::bail!("DPI must be positive");
    }
    ensure_input(&args.input)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message(format!("Processing {}...", args.input.display()));

    let input = args.input.clone();
    let job_config = config.clone();
    let result = tokio::task::spawn_blocking(move || process_file(&input, &job_config)).await?;

    pb.finish_and_clear();
    let report = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &config.output.dir);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run the page pipeline over one document and persist its outputs.
///
/// Each page is written as soon as it is done, into a staging directory that
/// replaces nothing under the output root until every page has succeeded.
pub fn process_file(input: &Path, config: &PagewiseConfig) -> anyhow::Result<DocumentReport> {
    ensure_input(input)?;

    let document = PdfDocument::open(input)?
        .with_rasterizer(PdftoppmRasterizer::new(config.pdf.pdftoppm_cmd.clone()));
    let engine = Tesseract::new(config.ocr.tesseract_cmd.clone());
    let pipeline = PagePipeline::new(engine, config);

    let layout = OutputLayout::from_config(&config.output);
    let mut staged = layout.stage(input.display().to_string())?;
    pipeline.process_document_with(&document, |page| staged.add_page(&page))?;

    Ok(staged.commit()?)
}

fn print_summary(report: &DocumentReport, output_dir: &Path) {
    println!(
        "{} Processed {}",
        style("✓").green(),
        report.source
    );
    println!("   Total pages:     {}", report.page_count);
    println!("   Digital pages:   {}", style(report.digital_pages()).green());
    println!("   OCR pages:       {}", style(report.ocr_pages()).yellow());
    println!("   Embedded images: {}", report.total_embedded_images());
    println!("   Figures:         {}", report.total_figures());
    println!();
    println!(
        "{} Results saved to {}",
        style("ℹ").blue(),
        output_dir.display()
    );
}
