use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

//
// ─── ROLE ──────────────────────────────────────────────────────────────────────
//

/// Professional track a lesson belongs to.
///
/// The set is closed: every lesson in the catalog is assigned exactly one
/// role, and role-specific badge rules key off this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Marketing,
    Hr,
    Ops,
    Support,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Role; 4] = [Role::Marketing, Role::Hr, Role::Ops, Role::Support];

    /// Human-readable label for presentation surfaces.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Role::Marketing => "Marketing",
            Role::Hr => "HR",
            Role::Ops => "Operations",
            Role::Support => "Support",
        }
    }

    /// Stable lowercase identifier, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Marketing => "marketing",
            Role::Hr => "hr",
            Role::Ops => "ops",
            Role::Support => "support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "marketing" => Ok(Role::Marketing),
            "hr" => Ok(Role::Hr),
            "ops" => Ok(Role::Ops),
            "support" => Ok(Role::Support),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_all_roles() {
        for role in Role::ALL {
            let parsed: Role = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn parse_rejects_unknown_role() {
        let err = "finance".parse::<Role>().unwrap_err();
        assert_eq!(err, RoleParseError("finance".to_string()));
    }

    #[test]
    fn labels_are_human_readable() {
        assert_eq!(Role::Hr.label(), "HR");
        assert_eq!(Role::Ops.label(), "Operations");
    }
}
