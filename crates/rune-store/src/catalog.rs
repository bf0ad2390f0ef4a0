use std::collections::BTreeSet;

use rune_types::Fields;
use serde::{Deserialize, Serialize};

/// File holding the catalog.
pub const CATALOG_FILE: &str = "main.bin";

/// Extension of collection files.
pub const COLLECTION_EXT: &str = "col";

/// Extension of map files.
pub const MAP_EXT: &str = "map";

/// The two kinds of named containers a store holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Container {
    Collection,
    Map,
}

impl Container {
    /// Backing file name for a container called `name`.
    pub fn file_name(self, name: &str) -> String {
        match self {
            Self::Collection => format!("{name}.{COLLECTION_EXT}"),
            Self::Map => format!("{name}.{MAP_EXT}"),
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collection => write!(f, "collection"),
            Self::Map => write!(f, "map"),
        }
    }
}

/// Per-store index of collection and map names plus free-form metadata.
///
/// A name is listed once its backing file has been written. Dropping a
/// container removes its entry, but a listed name whose file has gone missing
/// is tolerated and reads as empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub collections: BTreeSet<String>,
    #[serde(default)]
    pub maps: BTreeSet<String>,
    #[serde(rename = "data", default)]
    pub metadata: Fields,
}

impl Catalog {
    /// Empty catalog carrying the given metadata.
    pub fn with_metadata(metadata: Fields) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    pub fn names(&self, kind: Container) -> &BTreeSet<String> {
        match kind {
            Container::Collection => &self.collections,
            Container::Map => &self.maps,
        }
    }

    pub fn contains(&self, kind: Container, name: &str) -> bool {
        self.names(kind).contains(name)
    }

    /// Add a name. Returns `true` if it was not listed before.
    pub fn register(&mut self, kind: Container, name: &str) -> bool {
        self.names_mut(kind).insert(name.to_string())
    }

    /// Remove a name. Returns `true` if it was listed.
    pub fn unregister(&mut self, kind: Container, name: &str) -> bool {
        self.names_mut(kind).remove(name)
    }

    fn names_mut(&mut self, kind: Container) -> &mut BTreeSet<String> {
        match kind {
            Container::Collection => &mut self.collections,
            Container::Map => &mut self.maps,
        }
    }
}
