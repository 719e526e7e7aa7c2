//! Response-shape validation for generated itineraries.
//!
//! An invalid response is treated exactly like a backend failure: the
//! attempt is recorded as failed and the retry loop continues. A response
//! that merely echoes an error page or gets truncated mid-stream must never
//! reach the caller as a success.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Minimum length of the response after trimming surrounding whitespace.
pub const MIN_TRIMMED_CHARS: usize = 200;

/// The raw response must be strictly longer than this.
pub const MIN_RAW_CHARS: usize = 500;

/// Case-insensitive markers a real itinerary is expected to contain.
static ITINERARY_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)day\s+\d+|itinerary|schedule|activities|recommendations|morning|afternoon|evening")
        .expect("static pattern")
});

/// Reasons a generated response is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("response too short: {length} characters after trimming (minimum {minimum})")]
    TooShort { length: usize, minimum: usize },

    #[error("response does not look like an itinerary (no day/schedule markers found)")]
    NoItineraryMarkers,

    #[error("response appears truncated: {length} raw characters (more than {minimum} required)")]
    Truncated { length: usize, minimum: usize },
}

/// Validate a generated response.
///
/// A response is valid iff its trimmed length is at least
/// [`MIN_TRIMMED_CHARS`], it contains at least one itinerary marker, and its
/// raw length exceeds [`MIN_RAW_CHARS`].
///
/// # Errors
///
/// Returns the first failed check, in the order trimmed-length, markers,
/// raw-length.
pub fn validate_response(text: &str) -> Result<(), ValidationError> {
    let trimmed_len = text.trim().chars().count();
    if trimmed_len < MIN_TRIMMED_CHARS {
        return Err(ValidationError::TooShort {
            length: trimmed_len,
            minimum: MIN_TRIMMED_CHARS,
        });
    }

    if !ITINERARY_MARKERS.is_match(text) {
        return Err(ValidationError::NoItineraryMarkers);
    }

    let raw_len = text.chars().count();
    if raw_len <= MIN_RAW_CHARS {
        return Err(ValidationError::Truncated {
            length: raw_len,
            minimum: MIN_RAW_CHARS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn itinerary_of_len(len: usize) -> String {
        let mut text = String::from("Day 1: explore the old town. ");
        while text.len() < len {
            text.push_str("Walk, eat, repeat. ");
        }
        text.truncate(len);
        text
    }

    #[test]
    fn accepts_long_marked_response() {
        let text = itinerary_of_len(700);
        assert_eq!(validate_response(&text), Ok(()));
    }

    #[test]
    fn rejects_short_response_regardless_of_content() {
        let text = itinerary_of_len(150);
        match validate_response(&text) {
            Err(ValidationError::TooShort { length, minimum }) => {
                assert_eq!(length, 150);
                assert_eq!(minimum, MIN_TRIMMED_CHARS);
            }
            other => panic!("expected TooShort, got {other:?}"),
        }
    }

    #[test]
    fn rejects_600_chars_without_markers() {
        let text = "x".repeat(600);
        assert_eq!(
            validate_response(&text),
            Err(ValidationError::NoItineraryMarkers)
        );
    }

    #[test]
    fn rejects_marked_response_at_exactly_500_raw_chars() {
        // Raw length must be strictly greater than 500.
        let text = itinerary_of_len(500);
        match validate_response(&text) {
            Err(ValidationError::Truncated { length, .. }) => assert_eq!(length, 500),
            other => panic!("expected Truncated, got {other:?}"),
        }

        let text = itinerary_of_len(501);
        assert_eq!(validate_response(&text), Ok(()));
    }

    #[test]
    fn whitespace_padding_does_not_satisfy_trimmed_length() {
        let text = format!("{}Day 1: short.{}", " ".repeat(400), " ".repeat(400));
        assert!(matches!(
            validate_response(&text),
            Err(ValidationError::TooShort { .. })
        ));
    }

    #[test]
    fn markers_match_case_insensitively() {
        for marker in [
            "DAY 3", "Itinerary", "SCHEDULE", "Activities", "recommendations", "MORNING",
            "afternoon", "Evening",
        ] {
            let text = format!("{} {}", marker, "filler text. ".repeat(60));
            assert_eq!(validate_response(&text), Ok(()), "marker {marker}");
        }
    }

    #[test]
    fn day_marker_requires_a_number() {
        // "day" alone (or "daylight") is not an itinerary marker.
        let text = format!("daylight everywhere. {}", "x ".repeat(300));
        assert_eq!(
            validate_response(&text),
            Err(ValidationError::NoItineraryMarkers)
        );
    }

    proptest! {
        #[test]
        fn verdict_is_invariant_under_marker_case(upper in any::<bool>(), len in 501usize..2000) {
            let marker = if upper { "ITINERARY" } else { "itinerary" };
            let mut text = String::from(marker);
            while text.chars().count() < len {
                text.push_str(" go");
            }
            prop_assert_eq!(validate_response(&text), Ok(()));
        }

        #[test]
        fn never_valid_below_trimmed_minimum(len in 0usize..MIN_TRIMMED_CHARS) {
            let text = itinerary_of_len(len);
            prop_assert!(validate_response(&text).is_err());
        }
    }
}
