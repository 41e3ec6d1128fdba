//! Custom error types for the ebml-reader crate.

use thiserror::Error;

use crate::ebml::codec::varint::Varint;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum EbmlError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying byte source ran out mid-token or mid-body.
    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    /// A bit pattern that is not a well-formed variable-length integer.
    #[error("invalid varint: {0:#x} carries no width marker")]
    InvalidVarint(u64),

    /// The value cannot be represented by any varint width.
    #[error("integer {0} does not fit in any varint encoding")]
    IntegerTooBig(u64),

    /// A non-UTF-8 byte sequence in schema source.
    #[error("invalid utf8 character")]
    InvalidUtf8,

    /// The schema source became unreadable mid-lex.
    #[error("schema source unreadable: {0}")]
    Source(String),

    /// An expected token was not found.
    #[error("expected {expected} but found '{found}'")]
    Syntax { expected: String, found: String },

    /// A declaration names neither a primitive type nor a known alias.
    #[error("unknown type: '{0}'")]
    UnknownType(String),

    /// A `define header` entry referenced an undeclared element.
    #[error("unknown element {0} in header")]
    UnknownHeaderName(String),

    /// The stream yielded an id the schema does not declare.
    #[error("unknown id: {0:x}")]
    UnknownElementId(Varint),

    /// A range expression that does not match any accepted form.
    #[error("invalid range expression '{0}'")]
    InvalidRange(String),

    /// A parameter applied to an element type that cannot carry it.
    #[error("unsupported parameter: {0}")]
    UnsupportedParam(String),

    /// Structurally invalid wire data (e.g. a 12-byte integer body).
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// A convenience `Result` type alias using the crate's `EbmlError` type.
pub type Result<T> = std::result::Result<T, EbmlError>;

/// Converts an I/O failure into the crate error, promoting clean EOF
/// into [`EbmlError::UnexpectedEof`] with the given context.
pub(crate) fn map_eof(err: std::io::Error, reading: &'static str) -> EbmlError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        EbmlError::UnexpectedEof(reading)
    } else {
        EbmlError::Io(err)
    }
}
