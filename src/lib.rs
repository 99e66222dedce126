//! # pdf-outline
//!
//! Title and heading outline extraction from PDF documents.
//!
//! The library reads the text of each page as styled spans (font size,
//! weight, position) and infers a document title and an H1–H3 outline from
//! the typography alone. No tagged-PDF structure or bookmarks are required.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdf_outline::extract_outline;
//!
//! fn main() -> pdf_outline::Result<()> {
//!     let result = extract_outline("document.pdf")?;
//!
//!     println!("{}", result.title);
//!     for entry in &result.outline {
//!         println!("{} {} (page {})", entry.level, entry.text, entry.page);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - [`parser::SpanCollector`] turns page content streams into [`TextSpan`]s
//! - [`infer::StructureInferrer`] ranks font styles and classifies spans
//! - [`render::to_json`] writes the `{title, outline}` result
//! - [`batch::process_directory`] runs the pipeline over a directory in parallel

pub mod batch;
pub mod detect;
pub mod error;
pub mod infer;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use batch::{process_directory, BatchEvent, BatchOptions, BatchReport, DocumentOutcome};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use infer::{CandidateLevel, HeadingCandidate, OutlineOptions, StructureInferrer};
pub use model::{DocumentResult, DocumentSpans, HeadingLevel, OutlineEntry, TextSpan};
pub use parser::{CollectOptions, ErrorMode, LopdfBackend, PdfBackend, SpanCollector};
pub use render::JsonFormat;

use std::path::Path;

/// Extract the title and outline of a PDF file.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::extract_outline;
///
/// let result = extract_outline("document.pdf").unwrap();
/// println!("{} headings", result.outline.len());
/// ```
pub fn extract_outline<P: AsRef<Path>>(path: P) -> Result<DocumentResult> {
    Outliner::new().extract_file(path)
}

/// Extract the title and outline of a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdf_outline::{extract_outline_with_options, CollectOptions, OutlineOptions};
///
/// let result = extract_outline_with_options(
///     "document.pdf",
///     CollectOptions::new().lenient(),
///     OutlineOptions::new().with_max_headings_per_page(20),
/// )
/// .unwrap();
/// ```
pub fn extract_outline_with_options<P: AsRef<Path>>(
    path: P,
    collect: CollectOptions,
    outline: OutlineOptions,
) -> Result<DocumentResult> {
    Outliner::new()
        .with_collect_options(collect)
        .with_outline_options(outline)
        .extract_file(path)
}

/// Extract the title and outline of a PDF held in memory.
pub fn extract_outline_from_bytes(data: &[u8]) -> Result<DocumentResult> {
    Outliner::new().extract_bytes(data)
}

/// Span collection and structure inference with fixed options.
///
/// Cheap to clone and safe to share between threads.
#[derive(Debug, Clone, Default)]
pub struct Outliner {
    collect: CollectOptions,
    outline: OutlineOptions,
}

impl Outliner {
    /// Create an outliner with default options.
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

    /// Skip pages whose content cannot be decoded instead of failing.
    pub fn lenient(mut self) -> Self {
        self.collect = self.collect.lenient();
        self
    }

    /// Collect the spans of a PDF file.
    pub fn collect_file<P: AsRef<Path>>(&self, path: P) -> Result<DocumentSpans> {
        let backend = LopdfBackend::load_file(path)?;
        self.collect_backend(&backend)
    }

    /// Collect the spans of a PDF held in memory.
    pub fn collect_bytes(&self, data: &[u8]) -> Result<DocumentSpans> {
        let backend = LopdfBackend::load_bytes(data)?;
        self.collect_backend(&backend)
    }

    /// Collect spans through any backend.
    pub fn collect_backend<B: PdfBackend + ?Sized>(&self, backend: &B) -> Result<DocumentSpans> {
        SpanCollector::with_options(self.collect.clone()).collect(backend)
    }

    /// Infer the structure of already collected spans.
    pub fn infer(&self, document: &DocumentSpans) -> DocumentResult {
        StructureInferrer::with_options(self.outline.clone()).infer_document(document)
    }

    /// Extract the outline of a PDF file.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<DocumentResult> {
        let path = path.as_ref();
        let document = self.collect_file(path)?;
        log::debug!(
            "{}: {} spans on {} pages",
            path.display(),
            document.spans.len(),
            document.page_count
        );
        Ok(self.infer(&document))
    }

    /// Extract the outline of a PDF held in memory.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<DocumentResult> {
        let document = self.collect_bytes(data)?;
        Ok(self.infer(&document))
    }
}
