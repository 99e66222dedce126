//! PDF backend abstraction layer.
//!
//! The collector only talks to [`PdfBackend`], so span extraction can be
//! exercised without a real PDF and the concrete library (lopdf) stays at
//! the edge.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// US Letter, used when a page declares no usable MediaBox.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Font information returned by the backend.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Build an operation.
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }
}

/// Abstract interface for PDF document access.
pub trait PdfBackend {
    /// Return all pages as (page_number → PageId).
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return `(width, height)` of a page in points.
    fn page_size(&self, page: PageId) -> (f32, f32);

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    ///
    /// A page without a content stream yields an empty buffer.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode a text byte sequence using the font's encoding on the given page.
    /// Falls back to simple decoding if the font or encoding is unavailable.
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// `Title` from the document information dictionary.
    fn metadata_title(&self) -> Option<String> {
        None
    }

    /// Number of pages.
    fn page_count(&self) -> u32 {
        self.pages().len() as u32
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // UTF-16BE with BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect_format_from_path(path).map_err(|e| unreadable(path.display(), e))?;
        let doc = LopdfDocument::load(path).map_err(|e| unreadable(path.display(), e.into()))?;
        Self::from_document(doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        detect_format_from_bytes(data).map_err(|e| unreadable("<memory>", e))?;
        let doc = LopdfDocument::load_mem(data).map_err(|e| unreadable("<memory>", e.into()))?;
        Self::from_document(doc)
    }

    fn from_document(doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        Ok(Self { doc })
    }

    /// PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Follow a reference to the object it points at.
    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    /// Look up a possibly inherited page attribute (MediaBox, Resources, ...).
    fn inherited<'a>(&'a self, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        let mut current = page;
        // Page trees are shallow; the bound stops cycles in broken files.
        for _ in 0..32 {
            if let Ok(value) = current.get(key) {
                return self.resolve(value);
            }
            let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }
}

/// Fold opening failures into `DocumentUnreadable`, keeping `Encrypted` apart.
fn unreadable(source: impl std::fmt::Display, err: Error) -> Error {
    match err {
        Error::Encrypted => Error::Encrypted,
        Error::DocumentUnreadable(reason) => {
            Error::DocumentUnreadable(format!("{}: {}", source, reason))
        }
        other => Error::DocumentUnreadable(format!("{}: {}", source, other)),
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_size(&self, page: PageId) -> (f32, f32) {
        let Ok(page_dict) = self.doc.get_dictionary(page) else {
            return DEFAULT_PAGE_SIZE;
        };
        let Some(Object::Array(media_box)) = self.inherited(page_dict, b"MediaBox") else {
            return DEFAULT_PAGE_SIZE;
        };
        let coords: Vec<f32> = media_box
            .iter()
            .filter_map(|o| self.resolve(o))
            .filter_map(|o| o.as_float().ok())
            .collect();
        if coords.len() < 4 {
            return DEFAULT_PAGE_SIZE;
        }
        let width = (coords[2] - coords[0]).abs();
        let height = (coords[3] - coords[1]).abs();
        if width > 0.0 && height > 0.0 {
            (width, height)
        } else {
            DEFAULT_PAGE_SIZE
        }
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::DocumentUnreadable(e.to_string()))?;

        Ok(lopdf_fonts
            .iter()
            .map(|(name, font_dict)| BackendFontInfo {
                name: name.clone(),
                base_font: font_dict
                    .get(b"BaseFont")
                    .ok()
                    .and_then(|o| o.as_name().ok())
                    .map(|n| String::from_utf8_lossy(n).to_string())
                    .unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::DocumentUnreadable(e.to_string()))?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        let streams: Vec<&Object> = match self.resolve(contents) {
            Some(Object::Array(arr)) => arr.iter().filter_map(|o| self.resolve(o)).collect(),
            Some(obj) => vec![obj],
            None => Vec::new(),
        };

        let mut content = Vec::new();
        for obj in streams {
            if let Object::Stream(s) = obj {
                let data = s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone());
                content.extend_from_slice(&data);
                content.push(b'\n');
            }
        }
        Ok(content)
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)
            .map_err(|e| Error::DocumentUnreadable(format!("content stream: {}", e)))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        if let Ok(lopdf_fonts) = self.doc.get_page_fonts(page) {
            if let Some(font_dict) = lopdf_fonts.get(font_name) {
                if let Ok(enc) = font_dict.get_font_encoding(&self.doc) {
                    if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                        return text;
                    }
                }
            }
        }
        decode_text_simple(bytes)
    }

    fn metadata_title(&self) -> Option<String> {
        let info = self.resolve(self.doc.trailer.get(b"Info").ok()?)?;
        let Object::Dictionary(info) = info else {
            return None;
        };
        match self.resolve(info.get(b"Title").ok()?)? {
            Object::String(bytes, _) => {
                let title = decode_text_simple(bytes);
                let title = title.trim();
                (!title.is_empty()).then(|| title.to_string())
            }
            _ => None,
        }
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        // 0xE9 = 'é' in Latin-1
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_pdf_value_as_number() {
        assert_eq!(PdfValue::Integer(42).as_number(), Some(42.0));
        assert_eq!(PdfValue::Real(2.5).as_number(), Some(2.5));
        assert_eq!(PdfValue::Other.as_number(), None);
    }

    #[test]
    fn test_load_bytes_rejects_non_pdf() {
        let result = LopdfBackend::load_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(Error::DocumentUnreadable(_))));
    }

    #[test]
    fn test_load_bytes_rejects_truncated_pdf() {
        let result = LopdfBackend::load_bytes(b"%PDF-1.4\n1 0 obj\n<<");
        assert!(matches!(result, Err(Error::DocumentUnreadable(_))));
    }
}
