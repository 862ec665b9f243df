//! Station code types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest station code the layout database accepts.
pub const MAX_STATION_ID_LEN: usize = 8;

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// A valid short station code (1-8 uppercase ASCII letters or digits).
///
/// Station codes are assigned by the station manager and referenced, never
/// mutated, by the timetable engine. This type guarantees that any
/// `StationId` value is well-formed by construction.
///
/// # Examples
///
/// ```
/// use timetable_server::domain::StationId;
///
/// let hbf = StationId::parse("HBF").unwrap();
/// assert_eq!(hbf.as_str(), "HBF");
///
/// // Lowercase is rejected by `parse`, accepted by `parse_normalized`
/// assert!(StationId::parse("hbf").is_err());
/// assert_eq!(StationId::parse_normalized(" hbf ").unwrap(), hbf);
///
/// // Empty and over-long codes are rejected
/// assert!(StationId::parse("").is_err());
/// assert!(StationId::parse("ABCDEFGHI").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StationId {
    bytes: [u8; MAX_STATION_ID_LEN],
    len: u8,
}

impl StationId {
    /// Parse a station code from a string.
    ///
    /// The input must be 1-8 uppercase ASCII letters (A-Z) or digits.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        let input = s.as_bytes();

        if input.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }

        if input.len() > MAX_STATION_ID_LEN {
            return Err(InvalidStationId {
                reason: "must be at most 8 characters",
            });
        }

        let mut bytes = [0u8; MAX_STATION_ID_LEN];
        for (slot, &b) in bytes.iter_mut().zip(input) {
            if !(b.is_ascii_uppercase() || b.is_ascii_digit()) {
                return Err(InvalidStationId {
                    reason: "must be uppercase ASCII letters A-Z or digits",
                });
            }
            *slot = b;
        }

        Ok(StationId {
            bytes,
            len: input.len() as u8,
        })
    }

    /// Parse user input: surrounding whitespace is trimmed and letters are
    /// upper-cased before validation.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidStationId> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the station code as a string slice.
    pub fn as_str(&self) -> &str {
        // SAFETY: We only store valid ASCII uppercase letters and digits
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap()
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.as_str())
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StationId {
    type Error = InvalidStationId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StationId> for String {
    fn from(id: StationId) -> Self {
        id.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_ids() {
        assert!(StationId::parse("A").is_ok());
        assert!(StationId::parse("HBF").is_ok());
        assert!(StationId::parse("YARD2").is_ok());
        assert!(StationId::parse("ABCDEFGH").is_ok());
    }

    #[test]
    fn reject_lowercase() {
        assert!(StationId::parse("hbf").is_err());
        assert!(StationId::parse("Hbf").is_err());
    }

    #[test]
    fn reject_wrong_length() {
        assert!(StationId::parse("").is_err());
        assert!(StationId::parse("ABCDEFGHI").is_err());
    }

    #[test]
    fn reject_punctuation() {
        assert!(StationId::parse("A-B").is_err());
        assert!(StationId::parse("A B").is_err());
        assert!(StationId::parse("ÄB").is_err());
    }

    #[test]
    fn normalized_parse_trims_and_uppercases() {
        let id = StationId::parse_normalized("  yard2\n").unwrap();
        assert_eq!(id.as_str(), "YARD2");
        assert!(StationId::parse_normalized("   ").is_err());
    }

    #[test]
    fn display_and_debug() {
        let id = StationId::parse("HBF").unwrap();
        assert_eq!(format!("{}", id), "HBF");
        assert_eq!(format!("{:?}", id), "StationId(HBF)");
    }

    #[test]
    fn ordering_matches_string_order() {
        let a = StationId::parse("AB").unwrap();
        let b = StationId::parse("ABC").unwrap();
        let c = StationId::parse("B").unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn serde_roundtrip_as_string() {
        let id = StationId::parse("HBF").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"HBF\"");
        let back: StationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<StationId>("\"hbf\"").is_err());
    }
}
