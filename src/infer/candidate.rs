//! Per-span classification results.

use crate::model::{HeadingLevel, TextSpan};

/// Tentative role of a span in the document structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateLevel {
    /// Part of the document title
    Title,
    /// Top-level heading
    H1,
    /// Second-level heading
    H2,
    /// Third-level heading
    H3,
    /// Not structural
    Rejected,
}

impl CandidateLevel {
    /// The outline level, for accepted headings.
    pub fn heading_level(self) -> Option<HeadingLevel> {
        match self {
            CandidateLevel::H1 => Some(HeadingLevel::H1),
            CandidateLevel::H2 => Some(HeadingLevel::H2),
            CandidateLevel::H3 => Some(HeadingLevel::H3),
            CandidateLevel::Title | CandidateLevel::Rejected => None,
        }
    }
}

impl From<HeadingLevel> for CandidateLevel {
    fn from(level: HeadingLevel) -> Self {
        match level {
            HeadingLevel::H1 => CandidateLevel::H1,
            HeadingLevel::H2 => CandidateLevel::H2,
            HeadingLevel::H3 => CandidateLevel::H3,
        }
    }
}

/// Evidence gathered for one span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Signals {
    /// Zero-based rank of the span's font size among heading sizes
    pub size_rank: Option<usize>,
    /// Set in a bold face
    pub bold: bool,
    /// Starts with a numbering prefix
    pub numbered: bool,
    /// Alone on its line and short relative to the page width
    pub isolated: bool,
}

impl Signals {
    /// Whether anything besides font size points to a heading.
    pub fn is_corroborated(&self) -> bool {
        self.bold || self.numbered || self.isolated
    }
}

/// A span together with its classification.
#[derive(Debug, Clone)]
pub struct HeadingCandidate<'a> {
    /// The classified span
    pub span: &'a TextSpan,
    /// Role assigned to the span
    pub level: CandidateLevel,
    /// Evidence the role was decided on
    pub signals: Signals,
}

impl<'a> HeadingCandidate<'a> {
    /// Classify a span.
    pub fn new(span: &'a TextSpan, level: CandidateLevel, signals: Signals) -> Self {
        Self {
            span,
            level,
            signals,
        }
    }

    /// Whether the span ended up in the outline's candidate set.
    pub fn is_heading(&self) -> bool {
        self.level.heading_level().is_some()
    }
}
