//! EBML stream reading annotated by EDTD schemas.
//!
//! # Module Organization
//!
//! - [`codec`]: varint framing and primitive body decoders
//! - [`reader`]: the lazy streaming element reader
//! - [`schema`]: the EDTD lexer, grammar and template table
//! - [`iter`]: the annotated iterator joining the two
//! - [`types`]: shared models and the crate error type
//!
//! # Architecture
//!
//! ```text
//! EDTD text ──> lex ──> grammar ──> Schema (template table)
//!                                      │ lookup by id
//! EBML bytes ─> EbmlReader ─> Elem ────┴──> ElemIter ─> TaggedElem
//! ```

pub mod codec;
pub mod iter;
pub mod reader;
pub mod schema;
pub mod types;

pub use codec::varint::{Varint, MAX_ENCODABLE};
pub use iter::{ElemIter, TaggedElem};
pub use reader::{EbmlReader, Elem};
pub use schema::Schema;
pub use types::error::{EbmlError, Result};
pub use types::models::{Cardinality, ElemType, RangeClause, Template};
