//! Batch processing command for multiple PDF files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use pagewise_core::DocumentReport;

use super::load_config;
use super::process::process_file;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching input PDFs (e.g. "documents/*.pdf")
    #[arg(required = true)]
    input: String,

    /// Output directory; each document gets a subdirectory named after it
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    report: Option<DocumentReport>,
    error: Option<String>,
    processing_time_ms: u64,
    finished_at: DateTime<Utc>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let output_root = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output.dir.clone());

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_pdf(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    fs::create_dir_all(&output_root)?;

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();

        let mut file_config = config.clone();
        file_config.output.dir = output_root.join(document_dir_name(&path));

        let job_path = path.clone();
        let result =
            tokio::task::spawn_blocking(move || process_file(&job_path, &file_config)).await?;

        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(report) => {
                results.push(ProcessResult {
                    path,
                    report: Some(report),
                    error: None,
                    processing_time_ms,
                    finished_at: Utc::now(),
                });
            }
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        report: None,
                        error: Some(error_msg),
                        processing_time_ms,
                        finished_at: Utc::now(),
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_with_message("Complete");

    let successful = results.iter().filter(|r| r.report.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if args.summary {
        let summary_path = output_root.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn document_dir_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "pages",
        "digital_pages",
        "ocr_pages",
        "embedded_images",
        "figures",
        "processing_time_ms",
        "finished_at",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let finished_at = result.finished_at.to_rfc3339();

        if let Some(report) = &result.report {
            wtr.write_record([
                filename,
                "success",
                &report.page_count.to_string(),
                &report.digital_pages().to_string(),
                &report.ocr_pages().to_string(),
                &report.total_embedded_images().to_string(),
                &report.total_figures().to_string(),
                &result.processing_time_ms.to_string(),
                &finished_at,
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                &result.processing_time_ms.to_string(),
                &finished_at,
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_pdf() {
        assert!(is_pdf(Path::new("a/b/report.pdf")));
        assert!(is_pdf(Path::new("SCAN.PDF")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("pdf")));
    }

    #[test]
    fn test_document_dir_name() {
        assert_eq!(document_dir_name(Path::new("docs/paper.v2.pdf")), "paper.v2");
    }

    #[test]
    fn test_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let results = vec![
            ProcessResult {
                path: PathBuf::from("docs/good.pdf"),
                report: Some(DocumentReport::new("docs/good.pdf", &[])),
                error: None,
                processing_time_ms: 12,
                finished_at: Utc::now(),
            },
            ProcessResult {
                path: PathBuf::from("docs/bad.pdf"),
                report: None,
                error: Some("failed to parse PDF".to_string()),
                processing_time_ms: 3,
                finished_at: Utc::now(),
            },
        ];

        write_summary(&path, &results).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("filename,status,pages"));
        assert!(lines[1].starts_with("good.pdf,success,0,0,0,0,0,12,"));
        assert!(lines[2].starts_with("bad.pdf,error,,,,,,3,"));
        assert!(lines[2].ends_with("failed to parse PDF"));
    }
}
