//! Document structure inference.
//!
//! Turns the spans of one document into a title and an H1–H3 outline using
//! font-size ranking corroborated by weight, numbering and line layout.

mod candidate;
mod options;
mod profile;
mod structure;

pub use candidate::{CandidateLevel, HeadingCandidate, Signals};
pub use options::{OutlineOptions, DEFAULT_NUMBERING_PATTERN};
pub use profile::{key_to_size, size_key, FontSizeProfile, SizeKey};
pub use structure::{collapse_duplicates, reading_order, StructureInferrer};
