//! Self-describing record identifiers.
//!
//! An identifier is `<rotated collection name>+<uuid v4>`. The rotation shifts
//! every letter and digit forward by [`ROTATION`] within its own class
//! (`a-z`, `A-Z`, `0-9`), so the collection that owns a record can be
//! recovered from the identifier alone. `-` and `_` are left as they are.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::TypeError;

/// Separator between the encoded collection name and the unique suffix.
pub const ID_SEPARATOR: char = '+';

/// Forward shift applied by [`encode_name`].
pub const ROTATION: u8 = 5;

/// Validate a collection or map name.
///
/// Names are non-empty and use only ASCII letters, digits, `-` and `_`.
/// Anything else would either break the identifier rotation or clash with
/// the `.` and `+` separators used by identifiers and references.
///
/// ```
/// use rune_types::validate_name;
///
/// assert!(validate_name("users").is_ok());
/// assert!(validate_name("audit_log-2").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("a.b").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), TypeError> {
    if name.is_empty() {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: "name must not be empty".into(),
        });
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(TypeError::InvalidName {
            name: name.to_string(),
            reason: format!("contains forbidden character: {ch:?}"),
        });
    }
    Ok(())
}

fn rotate(c: char, forward: bool) -> char {
    let (base, span) = match c {
        'a'..='z' => (b'a', 26u8),
        'A'..='Z' => (b'A', 26u8),
        '0'..='9' => (b'0', 10u8),
        _ => return c,
    };
    let offset = c as u8 - base;
    let shift = ROTATION % span;
    let rotated = if forward {
        (offset + shift) % span
    } else {
        (offset + span - shift) % span
    };
    (base + rotated) as char
}

/// Rotate a collection name into its identifier prefix.
pub fn encode_name(name: &str) -> String {
    name.chars().map(|c| rotate(c, true)).collect()
}

/// Inverse of [`encode_name`].
pub fn decode_name(token: &str) -> String {
    token.chars().map(|c| rotate(c, false)).collect()
}

/// Decode the owning collection from a raw identifier string.
pub fn collection_of(id: &str) -> Result<String, TypeError> {
    RecordId::parse(id).map(|id| id.collection())
}

/// Identifier assigned to every inserted record.
///
/// Unique across the whole store: the prefix pins the collection and the
/// suffix is a random UUID.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh identifier for a record in `collection`.
    pub fn generate(collection: &str) -> Result<Self, TypeError> {
        validate_name(collection)?;
        Ok(Self(format!(
            "{}{}{}",
            encode_name(collection),
            ID_SEPARATOR,
            Uuid::new_v4()
        )))
    }

    /// Parse an identifier produced by [`RecordId::generate`].
    ///
    /// The suffix is not required to be a UUID so identifiers written by
    /// other tools keep working; only the prefix must decode to a valid name.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let (prefix, suffix) = s
            .split_once(ID_SEPARATOR)
            .ok_or_else(|| TypeError::InvalidRecordId(s.to_string()))?;
        if suffix.is_empty() {
            return Err(TypeError::InvalidRecordId(s.to_string()));
        }
        validate_name(&decode_name(prefix))?;
        Ok(Self(s.to_string()))
    }

    /// Name of the collection that owns this record.
    pub fn collection(&self) -> String {
        let prefix = self
            .0
            .split_once(ID_SEPARATOR)
            .map_or(self.0.as_str(), |(prefix, _)| prefix);
        decode_name(prefix)
    }

    /// The unique part after the separator.
    pub fn suffix(&self) -> &str {
        self.0
            .split_once(ID_SEPARATOR)
            .map_or("", |(_, suffix)| suffix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
