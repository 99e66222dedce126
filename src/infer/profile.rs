//! Font-size statistics for a single document.

use std::collections::BTreeMap;

use crate::model::{HeadingLevel, TextSpan};

/// Font size quantized to tenths of a point.
pub type SizeKey = i32;

/// Quantize a font size to a [`SizeKey`].
pub fn size_key(size: f32) -> SizeKey {
    (size * 10.0).round() as SizeKey
}

/// Convert a [`SizeKey`] back to points.
pub fn key_to_size(key: SizeKey) -> f32 {
    key as f32 / 10.0
}

/// Frequency of each font size in a document.
///
/// Built once per document from spans in reading order.
#[derive(Debug, Clone, Default)]
pub struct FontSizeProfile {
    counts: BTreeMap<SizeKey, usize>,
}

impl FontSizeProfile {
    /// Build a profile from spans given in reading order.
    pub fn from_spans<'a>(spans: impl IntoIterator<Item = &'a TextSpan>) -> Self {
        let mut profile = Self::default();
        for span in spans {
            profile.add(span);
        }
        profile
    }

    /// Record one span.
    pub fn add(&mut self, span: &TextSpan) {
        *self.counts.entry(size_key(span.font_size)).or_insert(0) += 1;
    }

    /// Check if no spans were recorded.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of spans seen at a size.
    pub fn count(&self, size: f32) -> usize {
        self.counts.get(&size_key(size)).copied().unwrap_or(0)
    }

    /// Distinct sizes, largest first.
    pub fn sizes_descending(&self) -> Vec<f32> {
        self.counts.keys().rev().map(|&k| key_to_size(k)).collect()
    }

    /// The body text size.
    ///
    /// This is the most frequent size; when several sizes share the highest
    /// count, the smallest of them. A document where every size occurs only
    /// once has no body size.
    pub fn body_size_key(&self) -> Option<SizeKey> {
        let mut best: Option<(SizeKey, usize)> = None;
        // Ascending keys, so a tie keeps the smaller size
        for (&key, &count) in &self.counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((key, count));
            }
        }
        best.filter(|&(_, count)| count >= 2).map(|(key, _)| key)
    }

    /// Body size in points.
    pub fn body_size(&self) -> Option<f32> {
        self.body_size_key().map(key_to_size)
    }

    /// Whether text at this size stands out from the body text.
    pub fn is_above_body(&self, size: f32) -> bool {
        match self.body_size_key() {
            Some(body) => size_key(size) > body,
            None => true,
        }
    }

    /// Sizes eligible for heading ranks, largest first.
    ///
    /// Sizes at or below the body size are excluded.
    pub fn ranked_sizes(&self) -> Vec<SizeKey> {
        let body = self.body_size_key();
        self.counts
            .keys()
            .rev()
            .copied()
            .filter(|&key| body.map_or(true, |b| key > b))
            .collect()
    }

    /// Bind the three largest ranked sizes to H1, H2 and H3.
    pub fn heading_levels(&self) -> Vec<(SizeKey, HeadingLevel)> {
        self.ranked_sizes()
            .into_iter()
            .zip(HeadingLevel::ALL)
            .collect()
    }
}
