//! Title and heading inference from styled spans.
//!
//! The pipeline is a single pass over one document:
//! sanitize, rank font styles, pick the title, corroborate heading
//! candidates, then assemble the outline in reading order.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use super::candidate::{CandidateLevel, HeadingCandidate, Signals};
use super::options::OutlineOptions;
use super::profile::{key_to_size, size_key, FontSizeProfile};
use crate::model::{DocumentResult, DocumentSpans, OutlineEntry, TextSpan};

/// Infers a title and an H1–H3 outline from text spans.
#[derive(Debug, Clone, Default)]
pub struct StructureInferrer {
    options: OutlineOptions,
}

impl StructureInferrer {
    /// Create an inferrer with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inferrer with custom thresholds.
    pub fn with_options(options: OutlineOptions) -> Self {
        Self { options }
    }

    /// Get the options.
    pub fn options(&self) -> &OutlineOptions {
        &self.options
    }

    /// Infer the structure of a document from its spans.
    ///
    /// Never fails: missing structure yields an empty title and/or outline.
    pub fn infer(&self, spans: &[TextSpan]) -> DocumentResult {
        let candidates = self.classify_within(spans, None);
        self.assemble(&candidates, None)
    }

    /// Infer the structure of a collected document.
    ///
    /// Unlike [`infer`](Self::infer), this drops spans on pages past the
    /// document's page count and may fall back to the metadata title.
    pub fn infer_document(&self, document: &DocumentSpans) -> DocumentResult {
        let page_count = (document.page_count > 0).then_some(document.page_count);
        let candidates = self.classify_within(&document.spans, page_count);
        self.assemble(&candidates, document.metadata_title.as_deref())
    }

    /// Classify every usable span, in reading order.
    pub fn classify<'a>(&self, spans: &'a [TextSpan]) -> Vec<HeadingCandidate<'a>> {
        self.classify_within(spans, None)
    }

    fn classify_within<'a>(
        &self,
        spans: &'a [TextSpan],
        page_count: Option<u32>,
    ) -> Vec<HeadingCandidate<'a>> {
        let spans = sanitize(spans, page_count);
        if spans.is_empty() {
            return Vec::new();
        }

        let sole = sole_on_line(&spans);
        let profile = FontSizeProfile::from_spans(spans.iter().copied());
        let title: HashSet<usize> = self.find_title(&spans, &sole, &profile).into_iter().collect();

        let remaining = FontSizeProfile::from_spans(
            spans
                .iter()
                .enumerate()
                .filter(|(i, _)| !title.contains(i))
                .map(|(_, span)| *span),
        );
        let levels = remaining.heading_levels();
        log::debug!(
            "Body size {:?}, {} heading sizes",
            remaining.body_size(),
            levels.len()
        );

        spans
            .iter()
            .enumerate()
            .map(|(i, &span)| {
                let size = size_key(span.font_size);
                let signals = Signals {
                    size_rank: levels.iter().position(|&(key, _)| key == size),
                    bold: span.is_bold,
                    numbered: self.options.is_numbered(&span.text),
                    isolated: sole[i]
                        && span.width_ratio() <= self.options.heading_max_line_ratio,
                };

                let level = if title.contains(&i) {
                    CandidateLevel::Title
                } else {
                    match signals.size_rank {
                        Some(rank)
                            if signals.is_corroborated()
                                && span.text.chars().count() <= self.options.heading_max_chars =>
                        {
                            levels[rank].1.into()
                        }
                        _ => CandidateLevel::Rejected,
                    }
                };

                HeadingCandidate::new(span, level, signals)
            })
            .collect()
    }

    /// Indices of the spans forming the page-1 title, top line first.
    fn find_title(&self, spans: &[&TextSpan], sole: &[bool], profile: &FontSizeProfile) -> Vec<usize> {
        let first_page: Vec<usize> = (0..spans.len()).filter(|&i| spans[i].page == 1).collect();
        let Some(largest) = first_page
            .iter()
            .map(|&i| size_key(spans[i].font_size))
            .max()
        else {
            return Vec::new();
        };
        if !profile.is_above_body(key_to_size(largest)) {
            return Vec::new();
        }

        let is_title_sized = |i: usize| size_key(spans[i].font_size) == largest;
        let Some(start) = first_page.iter().position(|&i| {
            let span = spans[i];
            is_title_sized(i)
                && self.is_title_line(span, sole[i])
                && span.y <= self.options.title_top_ratio * span.page_height
        }) else {
            log::debug!("No title candidate on page 1");
            return Vec::new();
        };

        let mut lines = vec![first_page[start]];
        for &i in &first_page[start + 1..] {
            let (previous, span) = (spans[lines[lines.len() - 1]], spans[i]);
            let gap = span.y - previous.bottom();
            if !is_title_sized(i)
                || !self.is_title_line(span, sole[i])
                || gap > self.options.title_line_gap * span.font_size
            {
                break;
            }
            lines.push(i);
        }
        lines
    }

    /// Short, alone on its line and roughly centered.
    fn is_title_line(&self, span: &TextSpan, sole: bool) -> bool {
        let offset = (span.center_x() - span.page_width / 2.0).abs() / span.page_width;
        sole && span.width_ratio() <= self.options.title_max_line_ratio
            && offset <= self.options.title_center_tolerance
    }

    fn assemble(&self, candidates: &[HeadingCandidate<'_>], metadata_title: Option<&str>) -> DocumentResult {
        let mut title = candidates
            .iter()
            .filter(|c| c.level == CandidateLevel::Title)
            .map(|c| c.span.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if title.is_empty() && self.options.use_metadata_title {
            if let Some(meta) = metadata_title.map(str::trim).filter(|t| alphanumeric_count(t) >= 3) {
                log::debug!("Using metadata title {:?}", meta);
                title = meta.to_string();
            }
        }

        let entries: Vec<OutlineEntry> = candidates
            .iter()
            .filter_map(|c| {
                let level = c.level.heading_level()?;
                if c.span.page == 1 && same_text(&c.span.text, &title) {
                    return None;
                }
                Some(OutlineEntry::new(level, c.span.text.clone(), c.span.page))
            })
            .collect();

        let mut outline = collapse_duplicates(entries);
        self.cap_per_page(&mut outline);

        if title.is_empty() || outline.is_empty() {
            log::debug!(
                "Degraded extraction: title {}, {} headings",
                if title.is_empty() { "missing" } else { "found" },
                outline.len()
            );
        }

        DocumentResult::new(title, outline)
    }

    fn cap_per_page(&self, outline: &mut Vec<OutlineEntry>) {
        let max = self.options.max_headings_per_page;
        if max == 0 {
            return;
        }
        let mut per_page: BTreeMap<u32, usize> = BTreeMap::new();
        outline.retain(|entry| {
            let count = per_page.entry(entry.page).or_insert(0);
            *count += 1;
            if *count > max {
                log::debug!("Page {}: dropping heading {:?} over the cap", entry.page, entry.text);
            }
            *count <= max
        });
    }
}

/// Collapse adjacent entries with identical level, text and page.
pub fn collapse_duplicates(mut outline: Vec<OutlineEntry>) -> Vec<OutlineEntry> {
    outline.dedup();
    outline
}

/// Top-to-bottom, then left-to-right, page by page.
pub fn reading_order(a: &TextSpan, b: &TextSpan) -> Ordering {
    a.page
        .cmp(&b.page)
        .then(a.y.total_cmp(&b.y))
        .then(a.x.total_cmp(&b.x))
}

/// Drop malformed and noise spans, returning the rest in reading order.
fn sanitize(spans: &[TextSpan], page_count: Option<u32>) -> Vec<&TextSpan> {
    let mut noise = 0;
    let mut kept: Vec<&TextSpan> = spans
        .iter()
        .filter(|span| {
            if let Err(e) = span.validate() {
                log::warn!("Dropping span {:?}: {}", span.text, e);
                return false;
            }
            if let Some(count) = page_count {
                if span.page > count {
                    log::warn!(
                        "Dropping span {:?}: page {} is past the last page {}",
                        span.text,
                        span.page,
                        count
                    );
                    return false;
                }
            }
            if is_noise(&span.text) {
                noise += 1;
                return false;
            }
            true
        })
        .collect();

    if noise > 0 {
        log::debug!("Ignored {} noise spans", noise);
    }
    kept.sort_by(|a, b| reading_order(a, b));
    kept
}

/// Page numbers, bullets, rules and other fragments with too little text.
fn is_noise(text: &str) -> bool {
    alphanumeric_count(text) < 2
}

fn alphanumeric_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

fn same_text(a: &str, b: &str) -> bool {
    a.split_whitespace()
        .map(str::to_lowercase)
        .eq(b.split_whitespace().map(str::to_lowercase))
}

/// Two spans share a line when their vertical extents overlap by more than
/// half the smaller font size.
fn share_line(a: &TextSpan, b: &TextSpan) -> bool {
    let overlap = a.bottom().min(b.bottom()) - a.y.max(b.y);
    a.page == b.page && overlap > 0.5 * a.font_size.min(b.font_size)
}

/// For spans in reading order, whether each is the only span on its line.
fn sole_on_line(spans: &[&TextSpan]) -> Vec<bool> {
    let mut sole = vec![true; spans.len()];
    for i in 0..spans.len() {
        for j in i + 1..spans.len() {
            if spans[j].page != spans[i].page || spans[j].y >= spans[i].bottom() {
                break;
            }
            if share_line(spans[i], spans[j]) {
                sole[i] = false;
                sole[j] = false;
            }
        }
    }
    sole
}
