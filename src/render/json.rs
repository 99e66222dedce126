//! JSON rendering for outline results.

use crate::error::{Error, Result};
use crate::model::DocumentResult;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a result to JSON.
///
/// Keys appear in the order `title`, `outline`, and `level`, `text`, `page`
/// within each entry.
pub fn to_json(result: &DocumentResult, format: JsonFormat) -> Result<String> {
    let json = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(result),
        JsonFormat::Compact => serde_json::to_string(result),
    };

    json.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Parse a result previously written by [`to_json`].
pub fn from_json(json: &str) -> Result<DocumentResult> {
    serde_json::from_str(json).map_err(|e| Error::Render(format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HeadingLevel, OutlineEntry};

    fn sample() -> DocumentResult {
        DocumentResult::new(
            "Project Report",
            vec![
                OutlineEntry::new(HeadingLevel::H1, "1. Introduction", 1),
                OutlineEntry::new(HeadingLevel::H2, "1.1 Background", 2),
            ],
        )
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\": \"Project Report\""));
        assert!(json.contains("\"level\": \"H2\""));
        assert!(json.contains('\n')); // Pretty has newlines
        assert!(json.find("\"title\"").unwrap() < json.find("\"outline\"").unwrap());
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&DocumentResult::default(), JsonFormat::Compact).unwrap();
        assert_eq!(json, r#"{"title":"","outline":[]}"#);
    }

    #[test]
    fn test_from_json() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert_eq!(from_json(&json).unwrap(), sample());

        let err = from_json("{\"title\": 3}").unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }
}
