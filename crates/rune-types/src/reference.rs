//! Cross-record references.
//!
//! On disk a reference is a tagged string:
//!
//! ```text
//! @rune.ref <collection>.<record id>[.<segment>[.<segment>...]]
//! ```
//!
//! In memory it is a [`Reference`] carried by [`Value::Reference`](crate::Value).

use std::fmt;
use std::str::FromStr;

use crate::error::TypeError;
use crate::id::{validate_name, RecordId};

/// Literal token that marks a string as a reference.
pub const REF_MARKER: &str = "@rune.ref";

/// A pointer at another record, or at a nested field inside it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Collection holding the target record.
    pub collection: String,
    /// Identifier of the target record.
    pub id: RecordId,
    /// Field path followed inside the target record. Empty means the whole record.
    pub path: Vec<String>,
}

impl Reference {
    /// Reference a whole record by id; the collection is decoded from the id.
    pub fn to_record(id: RecordId) -> Self {
        Self {
            collection: id.collection(),
            id,
            path: Vec::new(),
        }
    }

    /// Extend the path with more segments.
    pub fn with_path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Returns `true` if `s` carries the reference marker.
    pub fn is_reference(s: &str) -> bool {
        s.starts_with(REF_MARKER)
    }

    /// Parse the wire form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidReference {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let body = s
            .strip_prefix(REF_MARKER)
            .ok_or_else(|| invalid("missing reference marker"))?
            .trim();

        let mut parts = body.split('.');
        let collection = parts
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| invalid("missing collection"))?;
        validate_name(collection).map_err(|e| invalid(&e.to_string()))?;
        let id = parts
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| invalid("missing record id"))?;
        let id = RecordId::parse(id).map_err(|e| invalid(&e.to_string()))?;
        let path = parts.map(str::to_string).collect();

        Ok(Self {
            collection: collection.to_string(),
            id,
            path,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REF_MARKER} {}.{}", self.collection, self.id)?;
        for segment in &self.path {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
