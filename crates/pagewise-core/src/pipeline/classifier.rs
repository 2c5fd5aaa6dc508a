//! Text-presence classification of a page's text layer.

use crate::models::{Classification, PageKind};

/// Default number of characters a trimmed text layer must exceed.
pub const DEFAULT_TEXT_THRESHOLD: usize = 100;

/// Decide whether a text layer is substantial enough to skip OCR.
///
/// The layer is trimmed first so that whitespace-only layers, or layers that
/// hold little more than a page number, classify as scanned.
pub fn classify(text_layer: &str, threshold: usize) -> Classification {
    let text_length = text_layer.trim().chars().count();
    let kind = if text_length > threshold {
        PageKind::DigitalText
    } else {
        PageKind::Scanned
    };

    Classification { kind, text_length }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_threshold_boundaries() {
        let at = "a".repeat(DEFAULT_TEXT_THRESHOLD);
        let below = "a".repeat(DEFAULT_TEXT_THRESHOLD - 1);
        let above = "a".repeat(DEFAULT_TEXT_THRESHOLD + 1);

        assert_eq!(classify(&below, DEFAULT_TEXT_THRESHOLD).kind, PageKind::Scanned);
        assert_eq!(classify(&at, DEFAULT_TEXT_THRESHOLD).kind, PageKind::Scanned);
        assert_eq!(classify(&above, DEFAULT_TEXT_THRESHOLD).kind, PageKind::DigitalText);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let padded = format!("   \n{}\n\t  ", "b".repeat(DEFAULT_TEXT_THRESHOLD));
        let result = classify(&padded, DEFAULT_TEXT_THRESHOLD);
        assert_eq!(result.kind, PageKind::Scanned);
        assert_eq!(result.text_length, DEFAULT_TEXT_THRESHOLD);
    }

    #[test]
    fn test_empty_layer_is_scanned() {
        assert_eq!(
            classify("", DEFAULT_TEXT_THRESHOLD),
            Classification { kind: PageKind::Scanned, text_length: 0 }
        );
        assert_eq!(classify(" \n 12 \n", DEFAULT_TEXT_THRESHOLD).kind, PageKind::Scanned);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 60 two-byte characters: 120 bytes but only 60 characters.
        let text = "ż".repeat(60);
        let result = classify(&text, DEFAULT_TEXT_THRESHOLD);
        assert_eq!(result.text_length, 60);
        assert!(!result.is_digital());
    }

    #[test]
    fn test_custom_threshold() {
        assert!(classify("hello world", 5).is_digital());
        assert!(!classify("hello", 5).is_digital());
    }
}
