//! Text spans produced by the collector.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A run of same-styled text on one line of a page.
///
/// Coordinates are in PDF points with the origin at the top-left corner of
/// the page: `y` grows downwards, so sorting by `(page, y)` is reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Whether the font appears to be bold
    pub is_bold: bool,
    /// Whether the font appears to be italic
    pub is_italic: bool,
    /// Page number (1-indexed)
    pub page: u32,
    /// Left edge
    pub x: f32,
    /// Top edge, measured from the top of the page
    pub y: f32,
    /// Estimated advance width of the text
    pub width: f32,
    /// Width of the page the span sits on
    pub page_width: f32,
    /// Height of the page the span sits on
    pub page_height: f32,
}

impl TextSpan {
    /// Create a span, deriving bold/italic flags from the font name.
    ///
    /// The page size defaults to US Letter; see [`TextSpan::on_page`].
    pub fn new(text: impl Into<String>, font_size: f32, font_name: impl Into<String>) -> Self {
        let font_name = font_name.into();
        let (is_bold, is_italic) = style_from_font_name(&font_name);
        Self {
            text: text.into(),
            font_size,
            font_name,
            is_bold,
            is_italic,
            page: 1,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            page_width: 612.0,
            page_height: 792.0,
        }
    }

    /// Place the span on a page of the given size.
    pub fn on_page(mut self, page: u32, page_width: f32, page_height: f32) -> Self {
        self.page = page;
        self.page_width = page_width;
        self.page_height = page_height;
        self
    }

    /// Set the top-left position.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the text width.
    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Override the bold flag.
    pub fn bold(mut self, is_bold: bool) -> Self {
        self.is_bold = is_bold;
        self
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Horizontal center.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.font_size
    }

    /// Fraction of the page width covered by the span.
    pub fn width_ratio(&self) -> f32 {
        if self.page_width > 0.0 {
            self.width / self.page_width
        } else {
            1.0
        }
    }

    /// Check that the span's numeric metadata is usable.
    pub fn validate(&self) -> Result<()> {
        let reason = if !self.font_size.is_finite() || self.font_size <= 0.0 {
            Some(format!("font size {} is not a positive number", self.font_size))
        } else if self.page == 0 {
            Some("page numbers start at 1".to_string())
        } else if !(self.x.is_finite() && self.y.is_finite() && self.width.is_finite()) {
            Some("position is not finite".to_string())
        } else if !(self.page_width.is_finite() && self.page_height.is_finite())
            || self.page_width <= 0.0
            || self.page_height <= 0.0
        {
            Some("page size is not positive".to_string())
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::MalformedSpan {
                page: self.page,
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Infer `(bold, italic)` from a PostScript font name.
pub fn style_from_font_name(font_name: &str) -> (bool, bool) {
    let lower = font_name.to_lowercase();
    let is_bold = lower.contains("bold")
        || lower.contains("black")
        || lower.contains("heavy")
        || lower.contains("semibold")
        || lower.ends_with(",bd");
    let is_italic = lower.contains("italic") || lower.contains("oblique");
    (is_bold, is_italic)
}

/// Everything the collector extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSpans {
    /// Total number of pages in the source document
    pub page_count: u32,
    /// `Title` entry of the document information dictionary, if any
    pub metadata_title: Option<String>,
    /// Spans in reading order
    pub spans: Vec<TextSpan>,
}

impl DocumentSpans {
    /// Create an empty span set for a document with `page_count` pages.
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            metadata_title: None,
            spans: Vec::new(),
        }
    }

    /// Spans on one page.
    pub fn page_spans(&self, page: u32) -> impl Iterator<Item = &TextSpan> {
        self.spans.iter().filter(move |s| s.page == page)
    }

    /// Check if no text was found.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
