//! Timestamp resolution for annotation jumps
//!
//! Annotations attached to archived recordings carry their time position in
//! whatever shape the original data entry produced: plain seconds, `MM:SS`,
//! or `HH:MM:SS`. This module normalizes all of them to seconds.
//!
//! Malformed input resolves to `0.0` rather than erroring: annotation data
//! is frequently hand-entered and must never be able to stall playback. The
//! recovery is logged at debug level so hosts can surface it if they care.
//! Output is *not* clamped to the recording duration; that is the transport
//! controller's job, which knows the duration.

use tracing::debug;

/// A timestamp as found in annotation records, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// Already in seconds
    Seconds(f64),
    /// Textual form: `SS`, `MM:SS`, or `HH:MM:SS`
    Text(String),
}

impl From<f64> for RawTimestamp {
    fn from(secs: f64) -> Self {
        RawTimestamp::Seconds(secs)
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        RawTimestamp::Text(text.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(text: String) -> Self {
        RawTimestamp::Text(text)
    }
}

/// Resolve a raw annotation timestamp to seconds.
///
/// - Numeric input is returned unchanged (already seconds).
/// - Text is split on `:`; 1 part = seconds, 2 = `MM:SS`, 3 = `HH:MM:SS`,
///   each part parsed as an integer.
/// - Empty, malformed, or non-numeric input resolves to `0.0`.
///
/// # Example
/// ```
/// use claro::timestamp::{resolve, RawTimestamp};
/// assert_eq!(resolve(&RawTimestamp::from("00:01:30")), 90.0);
/// assert_eq!(resolve(&RawTimestamp::from(12.5)), 12.5);
/// assert_eq!(resolve(&RawTimestamp::from("garbage")), 0.0);
/// ```
pub fn resolve(raw: &RawTimestamp) -> f64 {
    match raw {
        RawTimestamp::Seconds(secs) => *secs,
        RawTimestamp::Text(text) => resolve_text(text),
    }
}

fn resolve_text(text: &str) -> f64 {
    let parts: Vec<&str> = text.split(':').collect();

    let parsed: Option<Vec<i64>> = parts
        .iter()
        .map(|p| p.trim().parse::<i64>().ok())
        .collect();

    let seconds = match parsed.as_deref() {
        Some([s]) => Some(*s),
        Some([m, s]) => Some(m * 60 + s),
        Some([h, m, s]) => Some(h * 3600 + m * 60 + s),
        _ => None,
    };

    match seconds {
        Some(s) => s as f64,
        None => {
            // Hand-entered annotation data: recover, never fail playback.
            debug!(raw = text, "malformed annotation timestamp, resolving to 0");
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("90", 90.0 ; "plain seconds")]
    #[test_case("0", 0.0 ; "zero")]
    #[test_case("01:30", 90.0 ; "minutes seconds")]
    #[test_case("1:05", 65.0 ; "unpadded minutes")]
    #[test_case("00:01:30", 90.0 ; "hours minutes seconds")]
    #[test_case("02:00:00", 7200.0 ; "two hours")]
    #[test_case("1:00:05", 3605.0 ; "unpadded hours")]
    fn test_resolve_valid_text(input: &str, expected: f64) {
        assert_eq!(resolve(&RawTimestamp::from(input)), expected);
    }

    #[test_case("" ; "empty string")]
    #[test_case("garbage" ; "non numeric")]
    #[test_case("1:2:3:4" ; "too many parts")]
    #[test_case("12:xx" ; "non numeric part")]
    #[test_case("::" ; "only separators")]
    #[test_case("1.5" ; "fractional text is not integer")]
    fn test_resolve_malformed_text(input: &str) {
        assert_eq!(resolve(&RawTimestamp::from(input)), 0.0);
    }

    #[test]
    fn test_numeric_passthrough() {
        assert_eq!(resolve(&RawTimestamp::Seconds(12.5)), 12.5);
        // Not clamped here: out-of-range handling belongs to the transport
        assert_eq!(resolve(&RawTimestamp::Seconds(-3.0)), -3.0);
        assert_eq!(resolve(&RawTimestamp::Seconds(1.0e6)), 1.0e6);
    }

    #[test]
    fn test_whitespace_tolerated_in_parts() {
        assert_eq!(resolve(&RawTimestamp::from(" 01 : 30 ")), 90.0);
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(RawTimestamp::from(5.0), RawTimestamp::Seconds(5.0));
        assert_eq!(
            RawTimestamp::from("0:05"),
            RawTimestamp::Text("0:05".to_string())
        );
    }
}
