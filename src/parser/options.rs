//! Span collection options.

/// Options for collecting spans from a PDF.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Maximum number of pages to read (0 = all pages)
    pub max_pages: u32,

    /// Baselines closer than this fraction of the font size share a line
    pub line_tolerance: f32,

    /// Apply Unicode NFKC normalization to span text
    pub normalize_unicode: bool,
}

impl CollectOptions {
    /// Create new collect options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages whose content cannot be decoded).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Only read the first `pages` pages.
    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages;
        self
    }

    /// Set the same-line baseline tolerance.
    pub fn with_line_tolerance(mut self, tolerance: f32) -> Self {
        self.line_tolerance = tolerance.max(0.0);
        self
    }

    /// Enable or disable NFKC normalization.
    pub fn with_normalization(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }

    /// Whether a page number falls within the configured page limit.
    pub fn includes_page(&self, page: u32) -> bool {
        self.max_pages == 0 || page <= self.max_pages
    }
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            max_pages: 0,
            line_tolerance: 0.3,
            normalize_unicode: true,
        }
    }
}

/// Error handling mode during collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// A page that cannot be decoded makes the whole document unreadable
    #[default]
    Strict,
    /// A page that cannot be decoded contributes no spans
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_options_builder() {
        let options = CollectOptions::new()
            .lenient()
            .with_max_pages(5)
            .with_line_tolerance(-1.0)
            .with_normalization(false);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.max_pages, 5);
        assert_eq!(options.line_tolerance, 0.0);
        assert!(!options.normalize_unicode);
        assert!(options.includes_page(5));
        assert!(!options.includes_page(6));
    }

    #[test]
    fn test_default_options() {
        let options = CollectOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(options.includes_page(10_000));
        assert!(options.normalize_unicode);
    }
}
