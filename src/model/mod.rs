//! Document model types.
//!
//! `TextSpan`/`DocumentSpans` are what the collector hands to the inferrer;
//! `DocumentResult` is what the inferrer hands to rendering.

mod outline;
mod span;

pub use outline::{DocumentResult, HeadingLevel, OutlineEntry};
pub use span::{style_from_font_name, DocumentSpans, TextSpan};
