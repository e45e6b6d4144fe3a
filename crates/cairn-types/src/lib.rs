//! Foundation types for Cairn.
//!
//! Every other Cairn crate depends on `cairn-types`.
//!
//! # Key Types
//!
//! - [`ObjectKey`] — Content-addressed identifier (BLAKE3 hash) of a structure element
//! - [`ObjectType`] — `(object_id, version)` type identifier carried by elements and links

pub mod error;
pub mod object;
pub mod object_type;

pub use error::TypeError;
pub use object::ObjectKey;
pub use object_type::ObjectType;
