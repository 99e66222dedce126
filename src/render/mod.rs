//! Rendering outline results for output.

mod json;

pub use json::{from_json, to_json, JsonFormat};
