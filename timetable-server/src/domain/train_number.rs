//! Train number (train identity) type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest train number accepted.
const MAX_LEN: usize = 32;

/// Error returned when parsing an invalid train number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid train number: {reason}")]
pub struct InvalidTrainNumber {
    reason: &'static str,
}

/// A validated, unique-per-timetable train number (e.g. "RE 4711" is not
/// valid, "RE4711" and "AUTO-0001" are).
///
/// Train numbers are 1-32 characters of ASCII letters, digits, and the
/// separators `-`, `_`, `.` and `/`. Ordering is plain string ordering,
/// which is what the capacity resolver relies on when it has to pick
/// victims deterministically.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::TrainNumber;
///
/// let n = TrainNumber::parse("AUTO-0001").unwrap();
/// assert_eq!(n.as_str(), "AUTO-0001");
/// assert!(n.has_prefix("AUTO-"));
///
/// assert!(TrainNumber::parse("").is_err());
/// assert!(TrainNumber::parse("RE 4711").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrainNumber(String);

impl TrainNumber {
    /// Parse a train number from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidTrainNumber> {
        if s.is_empty() {
            return Err(InvalidTrainNumber {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_LEN {
            return Err(InvalidTrainNumber {
                reason: "must be at most 32 characters",
            });
        }

        if !s.bytes().all(is_number_byte) {
            return Err(InvalidTrainNumber {
                reason: "must be ASCII letters, digits, '-', '_', '.' or '/'",
            });
        }

        Ok(TrainNumber(s.to_string()))
    }

    /// Returns the train number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the number starts with the given naming prefix.
    ///
    /// Auto-generated trains are recognised by this convention.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix)
    }
}

/// Returns true if the prefix could begin a valid train number.
pub fn is_valid_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.len() < MAX_LEN && prefix.bytes().all(is_number_byte)
}

fn is_number_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'/')
}

impl fmt::Debug for TrainNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrainNumber({})", self.0)
    }
}

impl fmt::Display for TrainNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TrainNumber {
    type Error = InvalidTrainNumber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrainNumber> for String {
    fn from(n: TrainNumber) -> Self {
        n.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_numbers() {
        assert!(TrainNumber::parse("1").is_ok());
        assert!(TrainNumber::parse("RE4711").is_ok());
        assert!(TrainNumber::parse("AUTO-0001").is_ok());
        assert!(TrainNumber::parse("G_12.3/a").is_ok());
    }

    #[test]
    fn reject_invalid_numbers() {
        assert!(TrainNumber::parse("").is_err());
        assert!(TrainNumber::parse("RE 4711").is_err());
        assert!(TrainNumber::parse("ZÜG1").is_err());
        assert!(TrainNumber::parse(&"X".repeat(33)).is_err());
    }

    #[test]
    fn prefix_convention() {
        let n = TrainNumber::parse("AUTO-0042").unwrap();
        assert!(n.has_prefix("AUTO-"));
        assert!(n.has_prefix("AUTO"));
        assert!(!n.has_prefix("MAN-"));
        assert!(!n.has_prefix(""));
    }

    #[test]
    fn prefix_validation() {
        assert!(is_valid_prefix("AUTO-"));
        assert!(!is_valid_prefix(""));
        assert!(!is_valid_prefix("AU TO"));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = TrainNumber::parse("AUTO-0002").unwrap();
        let b = TrainNumber::parse("AUTO-0010").unwrap();
        let c = TrainNumber::parse("MAN1").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn display_and_debug() {
        let n = TrainNumber::parse("RE4711").unwrap();
        assert_eq!(n.to_string(), "RE4711");
        assert_eq!(format!("{:?}", n), "TrainNumber(RE4711)");
    }
}
