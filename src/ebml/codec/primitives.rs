//! Decoders for primitive element bodies.
//!
//! Bodies arrive as length-prefixed byte strings; these helpers turn a
//! cached body into its typed value. Numeric bodies are big-endian and
//! may be narrower than 8 bytes (left-padded with zeros on decode), a
//! zero-length body decodes to the type's zero value, and strings stop
//! at the first NUL.

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use encoding_rs::UTF_8;

use crate::ebml::types::error::{EbmlError, Result};

/// 2001-01-01T00:00:00Z, the zero point of wire dates, in Unix seconds.
const DATE_EPOCH_SECS: i64 = 978_307_200;

/// Decodes a signed big-endian integer of up to 8 bytes.
pub fn decode_int(body: &[u8]) -> Result<i64> {
    if body.is_empty() {
        return Ok(0);
    }
    Ok(BigEndian::read_i64(&padded(body)?))
}

/// Decodes an unsigned big-endian integer of up to 8 bytes.
pub fn decode_uint(body: &[u8]) -> Result<u64> {
    if body.is_empty() {
        return Ok(0);
    }
    Ok(BigEndian::read_u64(&padded(body)?))
}

/// Decodes an IEEE-754 float body: 4-byte singles are widened to `f64`,
/// 8-byte doubles read natively, and an empty body is `0.0`.
pub fn decode_float(body: &[u8]) -> Result<f64> {
    match body.len() {
        0 => Ok(0.0),
        4 => Ok(f64::from(BigEndian::read_f32(body))),
        8 => Ok(BigEndian::read_f64(body)),
        n => Err(EbmlError::InvalidFormat(format!(
            "float body must be 0, 4 or 8 bytes, got {n}"
        ))),
    }
}

/// Decodes a date body: signed nanoseconds relative to
/// 2001-01-01T00:00:00Z.
pub fn decode_date(body: &[u8]) -> Result<DateTime<Utc>> {
    let nanos = decode_int(body)?;
    let secs = DATE_EPOCH_SECS + nanos.div_euclid(1_000_000_000);
    let subsec = nanos.rem_euclid(1_000_000_000) as u32;
    DateTime::from_timestamp(secs, subsec)
        .ok_or_else(|| EbmlError::InvalidFormat(format!("date offset {nanos}ns is out of range")))
}

/// Decodes a string body: UTF-8 up to the first NUL or the end of the
/// body, whichever comes first. Ill-formed sequences become replacement
/// characters rather than errors.
pub fn decode_str(body: &[u8]) -> String {
    let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
    let (text, _, _) = UTF_8.decode(&body[..end]);
    text.into_owned()
}

fn padded(body: &[u8]) -> Result<[u8; 8]> {
    if body.len() > 8 {
        return Err(EbmlError::InvalidFormat(format!(
            "numeric body of {} bytes exceeds 8",
            body.len()
        )));
    }
    let mut buf = [0u8; 8];
    buf[8 - body.len()..].copy_from_slice(body);
    Ok(buf)
}
