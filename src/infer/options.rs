//! Structure inference options.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Heading numbering prefixes: "1.", "1.2.3", "Chapter 4", "IV.", "B.".
pub const DEFAULT_NUMBERING_PATTERN: &str = r"^(?:\d{1,3}(?:\.\d{1,3})*\.?|(?i:chapter|section|part|appendix)\s+[A-Z0-9]+\.?|[IVXLC]+\.|[A-Z]\.)(?:\s|$)";

fn default_numbering_regex() -> Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(DEFAULT_NUMBERING_PATTERN).expect("default numbering pattern is valid"))
        .clone()
}

/// Thresholds for title and heading detection.
#[derive(Debug, Clone)]
pub struct OutlineOptions {
    /// A title is at most this fraction of the page width
    pub title_max_line_ratio: f32,

    /// A title's top edge lies within this fraction of the page height
    pub title_top_ratio: f32,

    /// Maximum distance of a title's center from the page center, as a fraction of page width
    pub title_center_tolerance: f32,

    /// Title lines further apart than this many font sizes are not joined
    pub title_line_gap: f32,

    /// A heading counts as a short line at most this fraction of the page width
    pub heading_max_line_ratio: f32,

    /// Headings longer than this many characters are rejected
    pub heading_max_chars: usize,

    /// Maximum number of headings kept per page (0 = unlimited)
    pub max_headings_per_page: usize,

    /// Fall back to the document information title
    pub use_metadata_title: bool,

    /// Recognizes numbered headings
    pub numbering_pattern: Regex,
}

impl OutlineOptions {
    /// Create new outline options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum title width ratio.
    pub fn with_title_max_line_ratio(mut self, ratio: f32) -> Self {
        self.title_max_line_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the fraction of the page height a title must start in.
    pub fn with_title_top_ratio(mut self, ratio: f32) -> Self {
        self.title_top_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the title centering tolerance.
    pub fn with_title_center_tolerance(mut self, tolerance: f32) -> Self {
        self.title_center_tolerance = tolerance.clamp(0.0, 0.5);
        self
    }

    /// Set the gap allowed between the lines of a multi-line title.
    pub fn with_title_line_gap(mut self, gap: f32) -> Self {
        self.title_line_gap = gap.max(0.0);
        self
    }

    /// Set the maximum width ratio of a short heading line.
    pub fn with_heading_max_line_ratio(mut self, ratio: f32) -> Self {
        self.heading_max_line_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the maximum heading length in characters.
    pub fn with_heading_max_chars(mut self, chars: usize) -> Self {
        self.heading_max_chars = chars;
        self
    }

    /// Set the per-page heading cap.
    pub fn with_max_headings_per_page(mut self, max: usize) -> Self {
        self.max_headings_per_page = max;
        self
    }

    /// Enable or disable the metadata title fallback.
    pub fn with_metadata_title(mut self, enabled: bool) -> Self {
        self.use_metadata_title = enabled;
        self
    }

    /// Replace the numbering pattern.
    pub fn with_numbering_pattern(mut self, pattern: &str) -> Result<Self> {
        self.numbering_pattern = Regex::new(pattern)
            .map_err(|e| Error::InvalidOption(format!("numbering pattern: {}", e)))?;
        Ok(self)
    }

    /// Whether text starts with a numbering prefix.
    pub fn is_numbered(&self, text: &str) -> bool {
        self.numbering_pattern.is_match(text.trim_start())
    }
}

impl Default for OutlineOptions {
    fn default() -> Self {
        Self {
            title_max_line_ratio: 0.9,
            title_top_ratio: 0.33,
            title_center_tolerance: 0.15,
            title_line_gap: 1.5,
            heading_max_line_ratio: 0.6,
            heading_max_chars: 120,
            max_headings_per_page: 12,
            use_metadata_title: true,
            numbering_pattern: default_numbering_regex(),
        }
    }
}
