//! PDF span extraction.

mod backend;
mod collector;
mod options;

pub use backend::{
    decode_text_simple, BackendFontInfo, ContentOp, LopdfBackend, PageId, PdfBackend, PdfValue,
    DEFAULT_PAGE_SIZE,
};
pub use collector::SpanCollector;
pub use options::{CollectOptions, ErrorMode};
