//! Caller roles and the capabilities they grant.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a role name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown caller role {0:?}")]
pub struct UnknownRole(pub String);

/// Role granted to the caller by the authentication layer in front of
/// the engine. Roles are ordered: each includes the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerRole {
    /// Read-only access: routes, previews, audits, listings.
    Viewer,
    /// May create trains and run generation.
    Operator,
    /// May also delete trains and repair capacity.
    Admin,
}

/// Something a caller can be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Read,
    Schedule,
    Delete,
}

impl Capability {
    fn minimum_role(self) -> CallerRole {
        match self {
            Capability::Read => CallerRole::Viewer,
            Capability::Schedule => CallerRole::Operator,
            Capability::Delete => CallerRole::Admin,
        }
    }
}

impl CallerRole {
    /// Parse a role name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Result<Self, UnknownRole> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(CallerRole::Viewer),
            "operator" => Ok(CallerRole::Operator),
            "admin" => Ok(CallerRole::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }

    pub fn allows(self, capability: Capability) -> bool {
        self >= capability.minimum_role()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallerRole::Viewer => "viewer",
            CallerRole::Operator => "operator",
            CallerRole::Admin => "admin",
        }
    }
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(CallerRole::parse("Admin").unwrap(), CallerRole::Admin);
        assert_eq!(CallerRole::parse(" operator ").unwrap(), CallerRole::Operator);
        assert!(CallerRole::parse("root").is_err());
    }

    #[test]
    fn capabilities_nest() {
        assert!(CallerRole::Viewer.allows(Capability::Read));
        assert!(!CallerRole::Viewer.allows(Capability::Schedule));
        assert!(CallerRole::Operator.allows(Capability::Schedule));
        assert!(!CallerRole::Operator.allows(Capability::Delete));
        assert!(CallerRole::Admin.allows(Capability::Delete));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for role in [CallerRole::Viewer, CallerRole::Operator, CallerRole::Admin] {
            assert_eq!(CallerRole::parse(&role.to_string()).unwrap(), role);
        }
    }
}
