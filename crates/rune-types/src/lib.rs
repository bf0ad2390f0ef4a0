//! Foundation types for the Rune store.
//!
//! Every other Rune crate depends on `rune-types`.
//!
//! # Key Types
//!
//! - [`Value`] -- Tagged field value (scalar, bytes, array, map, or reference)
//! - [`Record`] -- A document: field table plus the `@rune.id` identifier field
//! - [`RecordId`] -- Identifier that encodes its owning collection
//! - [`Reference`] -- Pointer at another record or at a field inside it

pub mod error;
pub mod id;
pub mod record;
pub mod reference;
pub mod value;

pub use error::TypeError;
pub use id::{collection_of, decode_name, encode_name, validate_name, RecordId, ID_SEPARATOR};
pub use record::{Record, ID_FIELD};
pub use reference::{Reference, REF_MARKER};
pub use value::{Fields, Value};
