//! Check command - report whether pages need OCR without running it.

use std::path::PathBuf;

use clap::Args;
use console::style;

use pagewise_core::pdf::TextLayerReader;
use pagewise_core::{PdfDocument, classify};

use super::{ensure_input, load_config};

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Page to check (1-based)
    #[arg(short, long, default_value = "1", conflicts_with = "all")]
    page: u32,

    /// Check every page
    #[arg(long)]
    all: bool,

    /// Print the text layer of each checked page
    #[arg(long)]
    show_text: bool,
}

pub async fn run(args: CheckArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    ensure_input(&args.input)?;

    let document = PdfDocument::open(&args.input)?;
    let page_count = document.page_count();

    let pages: Vec<u32> = if args.all {
        (1..=page_count).collect()
    } else {
        if args.page == 0 || args.page > page_count {
            anyhow::bail!(
                "Page {} out of range (document has {} pages)",
                args.page,
                page_count
            );
        }
        vec![args.page]
    };

    for page_number in pages {
        let text = document.text_layer(page_number - 1)?;
        let classification = classify(&text, config.pdf.text_threshold);

        let verdict = if classification.is_digital() {
            style("likely contains digital text (no OCR needed)").green()
        } else {
            style("likely scanned (OCR needed)").yellow()
        };

        println!(
            "Page {}: {} ({} characters)",
            page_number, verdict, classification.text_length
        );

        if args.show_text {
            println!("{}", text);
        }
    }

    Ok(())
}
