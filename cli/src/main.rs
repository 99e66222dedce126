//! pdf-outline CLI - writes a JSON title and outline for every PDF in a directory

use std::path::{Path, PathBuf};
use std::thread;

use clap::Parser;
use colored::Colorize;
use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_outline::{
    process_directory, BatchEvent, BatchOptions, BatchReport, CollectOptions, DocumentOutcome,
    JsonFormat,
};

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(version)]
#[command(about = "Extract titles and H1-H3 outlines from a directory of PDFs", long_about = None)]
struct Cli {
    /// Directory containing the PDF files
    #[arg(value_name = "INPUT_DIR", env = "PDF_OUTLINE_INPUT", default_value = "/app/input")]
    input: PathBuf,

    /// Directory the JSON files are written to
    #[arg(value_name = "OUTPUT_DIR", env = "PDF_OUTLINE_OUTPUT", default_value = "/app/output")]
    output: PathBuf,

    /// Process one document at a time
    #[arg(long)]
    sequential: bool,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Only read the first N pages of each document (0 = all)
    #[arg(long, value_name = "N", default_value = "0")]
    max_pages: u32,

    /// No progress bar or summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) => {
            if !cli.quiet {
                print_summary(&report, &cli.output);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<BatchReport, Box<dyn std::error::Error>> {
    let format = if cli.compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    // Lenient: a page that fails to decode still leaves the rest of the document.
    let mut options = BatchOptions::new()
        .with_collect_options(CollectOptions::new().lenient().with_max_pages(cli.max_pages))
        .with_format(format);
    if cli.sequential {
        options = options.sequential();
    }

    let progress = if cli.quiet {
        None
    } else {
        let (tx, rx) = crossbeam_channel::unbounded();
        options = options.with_events(tx);
        Some(thread::spawn(move || show_progress(rx)))
    };

    let result = process_directory(&cli.input, &cli.output, &options);

    // Closes the channel so the progress thread can finish.
    drop(options);
    if let Some(handle) = progress {
        let _ = handle.join();
    }

    Ok(result?)
}

fn show_progress(events: Receiver<BatchEvent>) {
    let mut pb = ProgressBar::hidden();

    for event in events {
        match event {
            BatchEvent::Started { total } => {
                pb = ProgressBar::new(total as u64);
                if let Ok(style) =
                    ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                {
                    pb.set_style(style.progress_chars("#>-"));
                }
            }
            BatchEvent::Finished(report) => {
                let name = file_name(&report.input);
                if let DocumentOutcome::Skipped { reason } = &report.outcome {
                    pb.println(format!("{} {}: {}", "Skipped".yellow(), name, reason));
                }
                pb.set_message(name);
                pb.inc(1);
            }
        }
    }

    pb.finish_and_clear();
}

fn print_summary(report: &BatchReport, output: &Path) {
    if report.total() == 0 {
        println!("{}", "No PDF files found".yellow());
        return;
    }

    println!("{}", "Outline extraction".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Documents".bold(), report.total());
    println!("{}: {}", "Written".bold(), report.written().to_string().green());
    println!("{}: {}", "Degraded".bold(), report.degraded());
    println!("{}: {}", "Skipped".bold(), report.skipped());

    let failures: Vec<_> = report.failures().collect();
    for (i, failure) in failures.iter().enumerate() {
        let branch = if i + 1 == failures.len() { "└─" } else { "├─" };
        if let DocumentOutcome::Skipped { reason } = &failure.outcome {
            println!("  {} {} ({})", branch.dimmed(), file_name(&failure.input), reason);
        }
    }

    println!("{} {}", "Saved to".green(), output.display());
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
