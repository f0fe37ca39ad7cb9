//! Dynamic tables built from statically declared host structures.
//!
//! A [`Table`] is the host-side mirror of an interpreter table: string keys
//! mapping to integers or nested tables. Structures describe their own key
//! mapping, either through the [`table_struct!`] macro (which generates a
//! [`Flatten`] impl per type) or through `#[derive(Serialize)]` with
//! `#[serde(rename = "...")]` keys, flattened by [`to_table`].
//!
//! Field kinds other than integers and nested structures are rejected: at
//! compile time for [`Flatten`], and with [`FlattenError::UnsupportedField`]
//! for the serde path.

mod error;
mod flatten;
mod macros;
mod ser;
mod value;

pub use error::FlattenError;
pub use flatten::{FieldValue, Flatten};
pub use ser::{flatten_serialize_into, to_table};
pub use value::{Table, Value};

/// Result type for flattening operations.
pub type Result<T> = std::result::Result<T, FlattenError>;
