//! Extract command - whole-document text with a full OCR fallback.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use pagewise_core::{PdfDocument, PdftoppmRasterizer, Tesseract, extract_document_text};

use super::{ensure_input, load_config};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output text file
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// OCR language used when the text layer is too short
    #[arg(short, long)]
    lang: Option<String>,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(lang) = &args.lang {
        config.ocr.language = lang.clone();
    }
    ensure_input(&args.input)?;

    info!("Extracting text from {}", args.input.display());

    let input = args.input.clone();
    let text = tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
        let document = PdfDocument::open(&input)?
            .with_rasterizer(PdftoppmRasterizer::new(config.pdf.pdftoppm_cmd.clone()));
        let engine = Tesseract::new(config.ocr.tesseract_cmd.clone());
        Ok(extract_document_text(&document, &engine, &config)?)
    })
    .await??;

    fs::write(&args.output, &text)?;

    println!(
        "{} Wrote to {} (chars: {})",
        style("✓").green(),
        args.output.display(),
        text.chars().count()
    );

    Ok(())
}
