//! Schema-annotated element iteration.
//!
//! [`ElemIter`] joins the raw element stream against a parsed
//! [`Schema`](crate::ebml::Schema): each element's id selects its
//! template, the body is materialized according to the declared type,
//! and the caller receives a [`TaggedElem`] carrying name, type and
//! nesting level alongside the data.
//!
//! Iteration is flat by design. A container is yielded first and its
//! children follow in document order; the reported level tells the
//! consumer where it is in the tree.
//!
//! # Example
//! ```no_run
//! # fn main() -> ebml_reader::Result<()> {
//! use ebml_reader::Schema;
//!
//! let schema = Schema::parse(std::fs::File::open("doc.edtd")?)?;
//! for result in schema.iter_elems(std::fs::File::open("doc.webm")?) {
//!     let elem = result?;
//!     println!("{}{} ({})", "\t".repeat(elem.level as usize), elem.name, elem.kind);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::io::{Read, Write};

use chrono::{DateTime, Utc};

use crate::ebml::codec::primitives;
use crate::ebml::codec::varint::Varint;
use crate::ebml::reader::EbmlReader;
use crate::ebml::schema::Schema;
use crate::ebml::types::error::{EbmlError, Result};
use crate::ebml::types::models::ElemType;

/// Iterator over schema-annotated elements of a byte stream.
///
/// Created by [`Schema::iter_elems`](crate::ebml::Schema::iter_elems).
pub struct ElemIter<'s, R: Read> {
    schema: &'s Schema,
    reader: EbmlReader<R>,
    // Pre-queued records are served before the stream is touched.
    queued: VecDeque<TaggedElem>,
}

impl<'s, R: Read> ElemIter<'s, R> {
    pub(crate) fn new(schema: &'s Schema, source: R) -> ElemIter<'s, R> {
        ElemIter {
            schema,
            reader: EbmlReader::new(source),
            queued: VecDeque::new(),
        }
    }

    /// Inserts a record to be yielded ahead of the remaining stream.
    pub fn queue(&mut self, elem: TaggedElem) {
        self.queued.push_back(elem);
    }

    /// Reads the next annotated element, or `Ok(None)` at the end of
    /// the stream.
    ///
    /// Unlike the raw reader, the body has already been read in — the
    /// caller never has to touch an accessor before moving on.
    pub fn next_elem(&mut self) -> Result<Option<TaggedElem>> {
        if let Some(queued) = self.queued.pop_front() {
            return Ok(Some(queued));
        }

        let Some(mut elem) = self.reader.next()? else {
            return Ok(None);
        };
        let Some(tpl) = self.schema.get(elem.id()) else {
            return Err(EbmlError::UnknownElementId(elem.id()));
        };

        // Materialize the body per the declared type; container bodies
        // stay in the stream as their children.
        match tpl.kind {
            ElemType::Int => {
                elem.int()?;
            }
            ElemType::Uint => {
                elem.uint()?;
            }
            ElemType::Float => {
                elem.float()?;
            }
            ElemType::Date => {
                elem.date()?;
            }
            ElemType::String => {
                elem.str()?;
            }
            ElemType::Binary => {
                elem.bytes()?;
            }
            ElemType::Container => {}
        }

        let (id, size, data) = elem.into_parts();
        Ok(Some(TaggedElem {
            id,
            size,
            kind: tpl.kind,
            name: tpl.name.clone(),
            level: tpl.level,
            data,
        }))
    }
}

impl<R: Read> Iterator for ElemIter<'_, R> {
    type Item = Result<TaggedElem>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_elem().transpose()
    }
}

/// One element of the stream together with its schema annotations. The
/// body is already cached, so the accessors work on memory alone.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedElem {
    /// Element id in its raw varint form.
    pub id: Varint,
    /// The size varint as read from the stream.
    pub size: Varint,
    /// Declared value type.
    pub kind: ElemType,
    /// Declared element name.
    pub name: String,
    /// Nesting level of the declaration; top-level elements are 0.
    pub level: u64,
    data: Option<Vec<u8>>,
}

impl TaggedElem {
    /// The body as a signed integer.
    pub fn int(&self) -> Result<i64> {
        primitives::decode_int(self.body())
    }

    /// The body as an unsigned integer.
    pub fn uint(&self) -> Result<u64> {
        primitives::decode_uint(self.body())
    }

    /// The body as a float.
    pub fn float(&self) -> Result<f64> {
        primitives::decode_float(self.body())
    }

    /// The body as an absolute instant.
    pub fn date(&self) -> Result<DateTime<Utc>> {
        primitives::decode_date(self.body())
    }

    /// The body as text, trimmed at the first NUL.
    pub fn str(&self) -> String {
        primitives::decode_str(self.body())
    }

    /// The body verbatim; empty for containers and zero-size elements.
    pub fn bytes(&self) -> &[u8] {
        self.body()
    }

    /// Writes the element back out: id, size, and the cached body (a
    /// container writes only its header).
    pub fn write<W: Write>(&self, dst: &mut W) -> Result<()> {
        self.id.write(dst)?;
        self.size.write(dst)?;
        if let Some(body) = &self.data {
            dst.write_all(body)?;
        }
        Ok(())
    }

    fn body(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }
}
