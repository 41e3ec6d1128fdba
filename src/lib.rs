//! Read EBML binary streams and annotate them with EDTD schemas.
//!
//! EBML frames every element as a varint id, a varint size, and a
//! body; an EDTD schema names those ids and assigns them types. This
//! crate decodes both sides and joins them: parse a schema once, then
//! iterate any conforming byte stream and receive each element with
//! its name, type and nesting level, with the body decoded per type.
//!
//! ```no_run
//! # fn main() -> ebml_reader::Result<()> {
//! use ebml_reader::{ElemType, Schema};
//!
//! let schema = Schema::parse(std::fs::File::open("matroska.edtd")?)?;
//! for result in schema.iter_elems(std::fs::File::open("video.webm")?) {
//!     let elem = result?;
//!     if elem.kind == ElemType::String {
//!         println!("{} = {}", elem.name, elem.str());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The lower layers are public as well: [`Varint`] for the
//! variable-length integer codec and [`EbmlReader`] for schema-less
//! streaming with lazy body reads and byte-exact write-back.

pub mod ebml;

pub use ebml::{
    Cardinality, EbmlError, EbmlReader, Elem, ElemIter, ElemType, RangeClause, Result, Schema,
    TaggedElem, Template, Varint, MAX_ENCODABLE,
};
