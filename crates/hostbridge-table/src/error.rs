//! Error types for table flattening.

use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur while flattening a structure into a [`Table`](crate::Table).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    /// A field holds a kind that has no table representation.
    #[error("field `{key}` has unsupported kind: {kind}")]
    UnsupportedField { key: String, kind: &'static str },

    /// An integer field does not fit the interpreter's 64-bit integer.
    #[error("field `{key}` holds {value}, which does not fit in a 64-bit signed integer")]
    IntegerOverflow { key: String, value: String },

    /// The value handed to the flattener is not a structure.
    #[error("expected a structure at the top level, found {0}")]
    NotAStructure(&'static str),

    /// An error raised by a `Serialize` implementation.
    #[error("{0}")]
    Custom(String),
}

impl serde::ser::Error for FlattenError {
    fn custom<T: Display>(msg: T) -> Self {
        FlattenError::Custom(msg.to_string())
    }
}
