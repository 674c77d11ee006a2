//! Free-text response classification
//!
//! Turns vision-model output into a boolean verdict by counting which of a
//! fixed set of indicator words occur in the lowercased text. Both stages
//! use the same scoring, with different indicator sets and tie-breaking.
//! The word lists and tie directions are a behavioral contract; keep them
//! byte-for-byte stable.

/// Stage-1 (edge) positive indicators.
const DETECTION_POSITIVE: &[&str] = &[
    "yes",
    "detected",
    "visible",
    "present",
    "found",
    "smoke",
    "fire",
    "fallen",
    "debris",
    "missing",
    "unattended",
    "i see",
    "there is",
];

/// Stage-1 (edge) negative indicators.
const DETECTION_NEGATIVE: &[&str] = &[
    "no",
    "not detected",
    "not visible",
    "not present",
    "not found",
    "absent",
    "clear",
    "nothing",
    "no smoke",
    "no fire",
];

/// Stage-2 (validation) positive indicators.
const VALIDATION_POSITIVE: &[&str] = &["yes", "true", "valid", "detected", "present", "found"];

/// Stage-2 (validation) negative indicators.
const VALIDATION_NEGATIVE: &[&str] =
    &["no", "false", "invalid", "not detected", "absent", "not found"];

/// Number of indicators present in the text (each counted at most once).
fn indicator_count(text: &str, indicators: &[&str]) -> usize {
    indicators
        .iter()
        .filter(|indicator| text.contains(*indicator))
        .count()
}

/// Stage-1 verdict: strictly more positive than negative indicators.
/// A tie is not a detection.
pub fn classify_detection(response: &str) -> bool {
    let text = response.to_lowercase();
    let text = text.trim();

    indicator_count(text, DETECTION_POSITIVE) > indicator_count(text, DETECTION_NEGATIVE)
}

/// Stage-2 verdict with the stage-2 indicator sets.
/// An unclear answer (tie) counts as valid.
pub fn classify_validation(response: &str) -> bool {
    let text = response.to_lowercase();
    let text = text.trim();

    let positive = indicator_count(text, VALIDATION_POSITIVE);
    let negative = indicator_count(text, VALIDATION_NEGATIVE);

    if positive > negative {
        true
    } else if negative > positive {
        false
    } else {
        // Default to valid if unclear.
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_positive_frames() {
        assert!(classify_detection("I see smoke"));
        assert!(classify_detection("smoke detected"));
        assert!(classify_detection("Yes, there is a fallen person near the door"));
    }

    #[test]
    fn detection_negative_frames() {
        // "no smoke visible" scores 2 positive ("smoke", "visible") against
        // 2 negative ("no", "no smoke") and the tie is not a detection.
        assert!(!classify_detection("no smoke visible"));
        assert!(!classify_detection("The area is clear, nothing unusual"));
        assert!(!classify_detection(""));
    }

    #[test]
    fn detection_is_case_and_whitespace_insensitive() {
        let variants = ["I see smoke", "  i SEE smoke  ", "I SEE SMOKE"];
        for text in variants {
            assert!(classify_detection(text));
            // Idempotent: same verdict on repeated calls.
            assert_eq!(classify_detection(text), classify_detection(text));
        }
    }

    #[test]
    fn validation_clear_answers() {
        assert!(classify_validation("yes"));
        assert!(classify_validation("True, the scenario is valid"));
        assert!(!classify_validation("no"));
        assert!(!classify_validation("invalid, not detected"));
    }

    #[test]
    fn validation_defaults_to_valid_when_unclear() {
        assert!(classify_validation("maybe"));
        assert!(classify_validation(""));
        // "not found" hits both "found" and two negatives; negatives win.
        assert!(!classify_validation("not found"));
    }
}
