//! Streaming element reader.
//!
//! An element on the wire is `id · size · body`, with id and size as
//! varints. [`EbmlReader`] wraps a buffered byte source and hands out
//! one [`Elem`] at a time with the header already read and the body
//! untouched. Bodies are pulled from the source only when a typed
//! accessor asks for them and are cached afterwards, so several
//! accessors on the same element are fine.
//!
//! Container bodies are concatenations of child elements and are never
//! materialized: asking for the next element after a container yields
//! the container's first child. For non-container elements, callers
//! must invoke one accessor before moving on — otherwise the unread
//! body bytes are misread as the next element header.

use std::io::{BufRead, BufReader, Read, Write};

use chrono::{DateTime, Utc};
use log::trace;

use crate::ebml::codec::primitives;
use crate::ebml::codec::varint::Varint;
use crate::ebml::types::error::{map_eof, Result};

/// The root of an element stream. Owns the buffered source; elements
/// borrow it exclusively while they are alive.
pub struct EbmlReader<R: Read> {
    src: BufReader<R>,
}

impl<R: Read> EbmlReader<R> {
    /// Wraps a byte source in a fresh reader positioned before the
    /// first element.
    pub fn new(source: R) -> EbmlReader<R> {
        EbmlReader {
            src: BufReader::new(source),
        }
    }

    /// Reads the next element header.
    ///
    /// Returns `Ok(None)` when the source is exhausted exactly at an
    /// element boundary; running out mid-header is an error.
    pub fn next(&mut self) -> Result<Option<Elem<'_, R>>> {
        if self.src.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let id = Varint::read(&mut self.src)?;
        let size = Varint::read(&mut self.src)?;
        trace!("element header: id={:x} size={}", id, size.value());

        Ok(Some(Elem {
            reader: self,
            id,
            size,
            data: None,
        }))
    }
}

/// A single element: header eagerly read, body lazily materialized.
pub struct Elem<'r, R: Read> {
    reader: &'r mut EbmlReader<R>,
    id: Varint,
    size: Varint,
    data: Option<Vec<u8>>,
}

impl<'r, R: Read> std::fmt::Debug for Elem<'r, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Elem")
            .field("id", &self.id)
            .field("size", &self.size)
            .field("data", &self.data)
            .finish()
    }
}

impl<'r, R: Read> Elem<'r, R> {
    /// The element id in its raw varint form.
    pub fn id(&self) -> Varint {
        self.id
    }

    /// The body size varint; `size().value()` is the byte count.
    pub fn size(&self) -> Varint {
        self.size
    }

    /// Consumes this element and reads the next header from the shared
    /// source. For containers this is the first child; for primitive
    /// elements the body must have been materialized first.
    pub fn next(self) -> Result<Option<Elem<'r, R>>> {
        self.reader.next()
    }

    /// The body as a signed integer.
    pub fn int(&mut self) -> Result<i64> {
        primitives::decode_int(self.fill()?)
    }

    /// The body as an unsigned integer.
    pub fn uint(&mut self) -> Result<u64> {
        primitives::decode_uint(self.fill()?)
    }

    /// The body as a float (4-byte singles widen to `f64`).
    pub fn float(&mut self) -> Result<f64> {
        primitives::decode_float(self.fill()?)
    }

    /// The body as an absolute instant.
    pub fn date(&mut self) -> Result<DateTime<Utc>> {
        primitives::decode_date(self.fill()?)
    }

    /// The body as text, trimmed at the first NUL.
    pub fn str(&mut self) -> Result<String> {
        Ok(primitives::decode_str(self.fill()?))
    }

    /// The body verbatim (empty for a zero-size element).
    pub fn bytes(&mut self) -> Result<&[u8]> {
        self.fill()
    }

    /// Writes the element back out: id, size, and the cached body. An
    /// element whose body was never materialized writes only its
    /// header.
    pub fn write<W: Write>(&self, dst: &mut W) -> Result<()> {
        self.id.write(dst)?;
        self.size.write(dst)?;
        if let Some(body) = &self.data {
            dst.write_all(body)?;
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> (Varint, Varint, Option<Vec<u8>>) {
        (self.id, self.size, self.data)
    }

    // Pulls exactly `size` bytes from the source on first use; cached
    // afterwards.
    fn fill(&mut self) -> Result<&[u8]> {
        if self.data.is_none() {
            let len = self.size.value() as usize;
            let mut body = vec![0u8; len];
            if len > 0 {
                self.reader
                    .src
                    .read_exact(&mut body)
                    .map_err(|e| map_eof(e, "element body"))?;
            }
            self.data = Some(body);
        }
        match self.data.as_deref() {
            Some(body) => Ok(body),
            None => unreachable!("body cached above"),
        }
    }
}
