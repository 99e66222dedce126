//! Span collection.
//!
//! Interprets the text operators of each page's content stream, tracking the
//! text and transformation matrices, and coalesces the resulting fragments
//! into line-level [`TextSpan`]s in reading order.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{DocumentSpans, TextSpan};

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};
use super::options::{CollectOptions, ErrorMode};

/// Average glyph advance in ems, used in place of font metrics.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Ascender height in ems.
const ASCENT: f32 = 0.8;

/// TJ adjustments (thousandths of an em) beyond this read as a word space.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Same-style fragments further apart than this many ems are not merged.
const MAX_MERGE_GAP_EMS: f32 = 3.0;

/// Collects text spans from a PDF through a [`PdfBackend`].
#[derive(Debug, Clone, Default)]
pub struct SpanCollector {
    options: CollectOptions,
}

impl SpanCollector {
    /// Create a collector with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector with custom options.
    pub fn with_options(options: CollectOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &CollectOptions {
        &self.options
    }

    /// Collect the spans of every page, in page order then reading order.
    pub fn collect<B: PdfBackend + ?Sized>(&self, backend: &B) -> Result<DocumentSpans> {
        let pages = backend.pages();
        let mut doc = DocumentSpans::new(pages.len() as u32);
        doc.metadata_title = backend.metadata_title();

        for (&page_num, &page_id) in &pages {
            if !self.options.includes_page(page_num) {
                break;
            }

            match self.collect_page(backend, page_num, page_id) {
                Ok(spans) => {
                    log::debug!("Page {}: {} spans", page_num, spans.len());
                    doc.spans.extend(spans);
                }
                Err(e) => match self.options.error_mode {
                    ErrorMode::Strict => {
                        return Err(match e {
                            Error::DocumentUnreadable(reason) => Error::DocumentUnreadable(
                                format!("page {}: {}", page_num, reason),
                            ),
                            other => other,
                        });
                    }
                    ErrorMode::Lenient => {
                        log::warn!("Skipping text on page {}: {}", page_num, e);
                    }
                },
            }
        }

        Ok(doc)
    }

    /// Collect the spans of a single page.
    pub fn collect_page<B: PdfBackend + ?Sized>(
        &self,
        backend: &B,
        page_num: u32,
        page_id: PageId,
    ) -> Result<Vec<TextSpan>> {
        let (page_width, page_height) = backend.page_size(page_id);

        let content = backend.page_content(page_id)?;
        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }

        let fonts: HashMap<Vec<u8>, String> = backend
            .page_fonts(page_id)?
            .into_iter()
            .map(|f| (f.name, f.base_font))
            .collect();
        let ops = backend.decode_content(&content)?;

        let fragments = ContentInterpreter::new(backend, page_id, &fonts).run(&ops);

        Ok(coalesce_lines(fragments, self.options.line_tolerance)
            .into_iter()
            .filter_map(|frag| self.finish_span(frag, page_num, page_width, page_height))
            .collect())
    }

    fn finish_span(
        &self,
        frag: Fragment,
        page: u32,
        page_width: f32,
        page_height: f32,
    ) -> Option<TextSpan> {
        let text = if self.options.normalize_unicode {
            frag.text.nfkc().collect::<String>()
        } else {
            frag.text
        };
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return None;
        }

        let top = page_height - (frag.baseline + frag.font_size * ASCENT);
        Some(
            TextSpan::new(text, frag.font_size, frag.font_name)
                .on_page(page, page_width, page_height)
                .at(frag.x, top)
                .with_width(frag.width),
        )
    }
}

/// Text shown by one operator, in PDF user space (y grows upwards).
#[derive(Debug, Clone)]
struct Fragment {
    text: String,
    font_name: String,
    font_size: f32,
    x: f32,
    baseline: f32,
    width: f32,
}

impl Fragment {
    fn right(&self) -> f32 {
        self.x + self.width
    }

    fn same_style(&self, other: &Fragment) -> bool {
        self.font_name == other.font_name
            && (self.font_size * 10.0).round() == (other.font_size * 10.0).round()
    }

    /// Append a fragment that follows this one on the same line.
    fn append(&mut self, next: Fragment) {
        let gap = next.x - self.right();
        let chars = next.text.chars().count().max(1) as f32;
        let avg_char_width = if next.width > 0.0 {
            next.width / chars
        } else {
            next.font_size * AVG_GLYPH_WIDTH
        };

        let prev_last = self.text.chars().last();
        let next_first = next.text.chars().next();
        let already_spaced = prev_last.map(char::is_whitespace).unwrap_or(true)
            || next_first.map(char::is_whitespace).unwrap_or(true);
        let spaceless = prev_last.map(is_spaceless_script_char).unwrap_or(false)
            && next_first.map(is_spaceless_script_char).unwrap_or(false);

        if gap > avg_char_width * 0.2 && !already_spaced && !spaceless {
            self.text.push(' ');
        }
        self.text.push_str(&next.text);
        self.width = self.right().max(next.right()) - self.x;
    }
}

/// Group fragments into lines and merge same-styled neighbours.
///
/// Lines come out top to bottom, spans within a line left to right.
fn coalesce_lines(mut fragments: Vec<Fragment>, tolerance: f32) -> Vec<Fragment> {
    fragments.sort_by(|a, b| {
        b.baseline
            .total_cmp(&a.baseline)
            .then(a.x.total_cmp(&b.x))
    });

    let mut lines: Vec<Vec<Fragment>> = Vec::new();
    let mut current: Vec<Fragment> = Vec::new();
    let mut line_baseline: Option<f32> = None;

    for frag in fragments {
        let same_line = line_baseline
            .map(|y| (frag.baseline - y).abs() <= frag.font_size * tolerance)
            .unwrap_or(false);
        if !same_line {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            line_baseline = Some(frag.baseline);
        }
        current.push(frag);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.into_iter().flat_map(merge_line).collect()
}

fn merge_line(mut line: Vec<Fragment>) -> Vec<Fragment> {
    line.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut merged: Vec<Fragment> = Vec::with_capacity(line.len());
    for frag in line {
        if let Some(last) = merged.last_mut() {
            let gap = frag.x - last.right();
            if last.same_style(&frag) && gap <= frag.font_size * MAX_MERGE_GAP_EMS {
                last.append(frag);
                continue;
            }
        }
        merged.push(frag);
    }
    merged
}

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    fn from_operands(operands: &[PdfValue]) -> Option<Self> {
        let n: Vec<f32> = operands.iter().filter_map(PdfValue::as_number).collect();
        if n.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: n[0],
            b: n[1],
            c: n[2],
            d: n[3],
            e: n[4],
            f: n[5],
        })
    }

    /// `self × other`: apply `self` first, then `other`.
    fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Walks a page's content operations, emitting a [`Fragment`] per text-showing op.
struct ContentInterpreter<'a, B: PdfBackend + ?Sized> {
    backend: &'a B,
    page_id: PageId,
    fonts: &'a HashMap<Vec<u8>, String>,
    ctm: Matrix,
    ctm_stack: Vec<Matrix>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
    in_text_block: bool,
    fragments: Vec<Fragment>,
}

impl<'a, B: PdfBackend + ?Sized> ContentInterpreter<'a, B> {
    fn new(backend: &'a B, page_id: PageId, fonts: &'a HashMap<Vec<u8>, String>) -> Self {
        Self {
            backend,
            page_id,
            fonts,
            ctm: Matrix::IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            font_resource: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
            in_text_block: false,
            fragments: Vec::new(),
        }
    }

    fn run(mut self, ops: &[ContentOp]) -> Vec<Fragment> {
        for op in ops {
            let number = |i: usize| op.operands.get(i).and_then(PdfValue::as_number);

            match op.operator.as_str() {
                "q" => self.ctm_stack.push(self.ctm),
                "Q" => {
                    if let Some(m) = self.ctm_stack.pop() {
                        self.ctm = m;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        self.ctm = m.multiply(&self.ctm);
                    }
                }
                "BT" => {
                    self.in_text_block = true;
                    self.text_matrix = Matrix::IDENTITY;
                    self.line_matrix = Matrix::IDENTITY;
                }
                "ET" => self.in_text_block = false,
                "Tf" => {
                    if let Some(PdfValue::Name(resource)) = op.operands.first() {
                        self.font_name = self
                            .fonts
                            .get(resource)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(resource).to_string());
                        self.font_resource = resource.clone();
                    }
                    if let Some(size) = number(1) {
                        self.font_size = size;
                    }
                }
                "TL" => {
                    if let Some(leading) = number(0) {
                        self.leading = leading;
                    }
                }
                "Td" => {
                    if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                        self.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (number(0), number(1)) {
                        self.leading = -ty;
                        self.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(&op.operands) {
                        self.text_matrix = m;
                        self.line_matrix = m;
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(s @ PdfValue::Str(_)) = op.operands.first() {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "TJ" => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        self.show(items);
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(s @ PdfValue::Str(_)) = op.operands.first() {
                        self.show(std::slice::from_ref(s));
                    }
                }
                "\"" => {
                    self.next_line();
                    if let Some(s @ PdfValue::Str(_)) = op.operands.get(2) {
                        self.show(std::slice::from_ref(s));
                    }
                }
                _ => {}
            }
        }
        self.fragments
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    /// Show strings (with optional TJ kerning numbers) at the current position.
    fn show(&mut self, items: &[PdfValue]) {
        if !self.in_text_block {
            return;
        }

        let mut text = String::new();
        // Advance in unscaled text space units.
        let mut advance = 0.0f32;

        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let decoded = self
                        .backend
                        .decode_text(self.page_id, &self.font_resource, bytes);
                    advance += decoded.chars().count() as f32 * AVG_GLYPH_WIDTH * self.font_size;
                    text.push_str(&decoded);
                }
                _ => {
                    if let Some(n) = item.as_number() {
                        advance -= n / 1000.0 * self.font_size;
                        let ends_spaceless =
                            text.chars().last().map(is_spaceless_script_char).unwrap_or(true);
                        if -n > TJ_SPACE_THRESHOLD
                            && !text.ends_with(char::is_whitespace)
                            && !ends_spaceless
                        {
                            text.push(' ');
                        }
                    }
                }
            }
        }

        if !text.trim().is_empty() {
            let rendering = self.text_matrix.multiply(&self.ctm);
            self.fragments.push(Fragment {
                text,
                font_name: self.font_name.clone(),
                font_size: (self.font_size * rendering.vertical_scale()).abs(),
                x: rendering.e,
                baseline: rendering.f,
                width: advance.abs() * rendering.horizontal_scale(),
            });
        }

        self.text_matrix = Matrix::translation(advance, 0.0).multiply(&self.text_matrix);
    }
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, but Korean does.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
}
