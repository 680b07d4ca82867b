//! Session identifiers.
//!
//! A session is first known by a [`ProvisionalId`] generated locally, then by
//! the [`RealId`] its worker reports. The two are distinct types so a key from
//! one namespace cannot be used to index the other.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PROVISIONAL_PREFIX: &str = "pending_";

/// Locally generated placeholder id, valid until promotion or release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionalId(String);

impl ProvisionalId {
    /// Generate a fresh id of the form `pending_<8 hex chars>`.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("{PROVISIONAL_PREFIX}{}", &hex[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProvisionalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProvisionalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for ProvisionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-assigned id reported by the worker once it is running.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RealId(String);

impl RealId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RealId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RealId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registry key in either namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SessionKey {
    Provisional(ProvisionalId),
    Real(RealId),
}

impl SessionKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Provisional(id) => id.as_str(),
            Self::Real(id) => id.as_str(),
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }

    pub fn as_provisional(&self) -> Option<&ProvisionalId> {
        match self {
            Self::Provisional(id) => Some(id),
            Self::Real(_) => None,
        }
    }

    pub fn as_real(&self) -> Option<&RealId> {
        match self {
            Self::Real(id) => Some(id),
            Self::Provisional(_) => None,
        }
    }
}

impl From<ProvisionalId> for SessionKey {
    fn from(value: ProvisionalId) -> Self {
        Self::Provisional(value)
    }
}

impl From<RealId> for SessionKey {
    fn from(value: RealId) -> Self {
        Self::Real(value)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_prefix_and_eight_hex_chars() {
        let id = ProvisionalId::generate();
        let suffix = id.as_str().strip_prefix("pending_").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(ProvisionalId::generate(), ProvisionalId::generate());
    }

    #[test]
    fn key_accessors_follow_namespace() {
        let key = SessionKey::from(RealId::from("r1"));
        assert!(!key.is_provisional());
        assert_eq!(key.as_real(), Some(&RealId::from("r1")));
        assert_eq!(key.as_provisional(), None);
        assert_eq!(key.to_string(), "r1");
    }

    #[test]
    fn key_serializes_with_kind_tag() {
        let key = SessionKey::from(ProvisionalId::from("pending_0a1b2c3d"));
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["kind"], "provisional");
        assert_eq!(json["id"], "pending_0a1b2c3d");
    }
}
