//! Directory batch processing.
//!
//! Every `.pdf` file directly inside an input directory is turned into a
//! `name.json` outline in an output directory. Documents are independent:
//! one that cannot be read is skipped and reported, and never affects the
//! others. Only problems with the directories themselves abort a run.

use std::fs;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::detect::has_pdf_extension;
use crate::error::{Error, Result};
use crate::infer::OutlineOptions;
use crate::parser::CollectOptions;
use crate::render::{to_json, JsonFormat};
use crate::Outliner;

/// Options for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Span collection options (lenient by default)
    pub collect: CollectOptions,

    /// Structure inference options
    pub outline: OutlineOptions,

    /// Process documents in parallel
    pub parallel: bool,

    /// Output JSON format
    pub format: JsonFormat,

    /// Receives progress events
    pub events: Option<Sender<BatchEvent>>,
}

impl BatchOptions {
    /// Create batch options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set span collection options.
    pub fn with_collect_options(mut self, options: CollectOptions) -> Self {
        self.collect = options;
        self
    }

    /// Set structure inference options.
    pub fn with_outline_options(mut self, options: OutlineOptions) -> Self {
        self.outline = options;
        self
    }

    /// Process one document at a time.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the output JSON format.
    pub fn with_format(mut self, format: JsonFormat) -> Self {
        self.format = format;
        self
    }

    /// Send progress events to a channel.
    pub fn with_events(mut self, sender: Sender<BatchEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(sender) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(event);
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            collect: CollectOptions::new().lenient(),
            outline: OutlineOptions::default(),
            parallel: true,
            format: JsonFormat::Pretty,
            events: None,
        }
    }
}

/// Progress notification from a batch run.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// Discovery finished
    Started {
        /// Number of PDFs found
        total: usize,
    },
    /// One document was handled
    Finished(DocumentReport),
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentOutcome {
    /// JSON was written
    Written {
        /// Path of the JSON file
        output: PathBuf,
        /// Title or outline missing
        degraded: bool,
        /// Number of outline entries
        headings: usize,
    },
    /// The document could not be read; no JSON was written
    Skipped {
        /// Why it was skipped
        reason: String,
    },
}

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentReport {
    /// The PDF that was processed
    pub input: PathBuf,
    /// What happened to it
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    /// Whether JSON was produced.
    pub fn is_written(&self) -> bool {
        matches!(self.outcome, DocumentOutcome::Written { .. })
    }
}

/// Summary of a batch run, in file-name order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One report per discovered PDF
    pub documents: Vec<DocumentReport>,
}

impl BatchReport {
    /// Number of PDFs discovered.
    pub fn total(&self) -> usize {
        self.documents.len()
    }

    /// Number of JSON files written.
    pub fn written(&self) -> usize {
        self.documents.iter().filter(|d| d.is_written()).count()
    }

    /// Number of written results that lack a title or an outline.
    pub fn degraded(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| matches!(d.outcome, DocumentOutcome::Written { degraded: true, .. }))
            .count()
    }

    /// Number of documents skipped as unreadable.
    pub fn skipped(&self) -> usize {
        self.documents.len() - self.written()
    }

    /// Reports for skipped documents.
    pub fn failures(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| !d.is_written())
    }
}

/// List the PDF files directly inside `dir`, sorted by file name.
pub fn discover_pdfs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| Error::InvalidDirectory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut pdfs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_pdf_extension(&path) {
            pdfs.push(path);
        }
    }
    pdfs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(pdfs)
}

/// The JSON path for a PDF: same stem, `.json` extension.
pub fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push(".json");
    output_dir.join(name)
}

/// Write a file through a temporary sibling so readers never see partial content.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Extract outlines for every PDF in `input_dir` into `output_dir`.
///
/// The output directory is created if needed. Returns an error only when a
/// directory cannot be used or an output file cannot be written.
pub fn process_directory<P: AsRef<Path>, Q: AsRef<Path>>(
    input_dir: P,
    output_dir: Q,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    if !input_dir.is_dir() {
        return Err(Error::InvalidDirectory {
            path: input_dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }
    fs::create_dir_all(output_dir).map_err(|e| Error::InvalidDirectory {
        path: output_dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let inputs = discover_pdfs(input_dir)?;
    log::info!("Found {} PDF files in {}", inputs.len(), input_dir.display());
    options.emit(BatchEvent::Started {
        total: inputs.len(),
    });

    let outliner = Outliner::new()
        .with_collect_options(options.collect.clone())
        .with_outline_options(options.outline.clone());

    let process = |input: &PathBuf| -> Result<DocumentReport> {
        let report = DocumentReport {
            input: input.clone(),
            outcome: process_document(&outliner, input, output_dir, options.format)?,
        };
        options.emit(BatchEvent::Finished(report.clone()));
        Ok(report)
    };

    let documents = if options.parallel {
        inputs.par_iter().map(process).collect::<Result<Vec<_>>>()?
    } else {
        inputs.iter().map(process).collect::<Result<Vec<_>>>()?
    };

    let report = BatchReport { documents };
    log::info!(
        "Wrote {} of {} outlines ({} degraded, {} skipped)",
        report.written(),
        report.total(),
        report.degraded(),
        report.skipped()
    );
    Ok(report)
}

/// Handle one PDF. Document-level failures become `Skipped`.
fn process_document(
    outliner: &Outliner,
    input: &Path,
    output_dir: &Path,
    format: JsonFormat,
) -> Result<DocumentOutcome> {
    let extracted = panic::catch_unwind(AssertUnwindSafe(|| outliner.extract_file(input)));

    let result = match extracted {
        Ok(Ok(result)) => result,
        Ok(Err(e)) if e.is_document_failure() => {
            log::warn!("Skipping {}: {}", input.display(), e);
            return Ok(DocumentOutcome::Skipped {
                reason: e.to_string(),
            });
        }
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            log::warn!("Skipping {}: extraction panicked", input.display());
            return Ok(DocumentOutcome::Skipped {
                reason: "extraction panicked".to_string(),
            });
        }
    };

    let degraded = result.is_degraded();
    if degraded {
        log::debug!(
            "{}: degraded result (title {:?}, {} headings)",
            input.display(),
            result.title,
            result.outline.len()
        );
    }

    let output = output_path(output_dir, input);
    write_atomic(&output, &to_json(&result, format)?)?;
    log::debug!("Wrote {}", output.display());

    Ok(DocumentOutcome::Written {
        output,
        degraded,
        headings: result.outline.len(),
    })
}
