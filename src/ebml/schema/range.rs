//! Range expression parsing.
//!
//! A `range:` parameter carries one or more comma-separated clauses.
//! Integer clauses use `N..M` with either end open (`N..`, `..M`) or a
//! single value standing for both bounds. Float clauses use the
//! half-bounded `>V`/`>=V`/`<V`/`<=V` forms or the bracketed
//! `A<..<B` family with per-end `=` inclusivity. String and binary
//! ranges bound byte codes and reuse the signed integer form.

use super::lex::Token;
use crate::ebml::types::error::{EbmlError, Result};
use crate::ebml::types::models::{ElemType, RangeClause};

/// Parses the collected clause tokens for an element of the given type.
pub(super) fn parse_clauses(kind: ElemType, toks: &[Token]) -> Result<Vec<RangeClause>> {
    let parse_one = match kind {
        ElemType::Int | ElemType::String | ElemType::Binary => {
            parse_int_clause as fn(&str) -> Result<RangeClause>
        }
        ElemType::Uint => parse_uint_clause,
        ElemType::Float => parse_float_clause,
        ElemType::Date | ElemType::Container => {
            return Err(EbmlError::UnsupportedParam(format!(
                "range on a {kind} element"
            )))
        }
    };

    toks.iter().map(|tok| parse_one(&tok.val)).collect()
}

fn parse_int_clause(text: &str) -> Result<RangeClause> {
    let (low_text, high_text) = split_bounds(text);

    let mut lower = i64::MIN;
    let mut upper = i64::MAX;
    if !low_text.is_empty() {
        lower = low_text.parse().map_err(|_| invalid(text))?;
    }
    if !high_text.is_empty() {
        upper = high_text.parse().map_err(|_| invalid(text))?;
    }

    Ok(RangeClause::Int { lower, upper })
}

fn parse_uint_clause(text: &str) -> Result<RangeClause> {
    // A leading ".." would mean a negative lower bound.
    if text.starts_with("..") {
        return Err(invalid(text));
    }
    let (low_text, high_text) = split_bounds(text);

    let mut lower = 0u64;
    let mut upper = u64::MAX;
    if !low_text.is_empty() {
        lower = low_text.parse().map_err(|_| invalid(text))?;
    }
    if !high_text.is_empty() {
        upper = high_text.parse().map_err(|_| invalid(text))?;
    }

    Ok(RangeClause::Uint { lower, upper })
}

fn parse_float_clause(text: &str) -> Result<RangeClause> {
    let bytes = text.as_bytes();
    if bytes.is_empty() {
        return Err(invalid(text));
    }

    // Half-bounded forms: >V >=V <V <=V
    if bytes[0] == b'>' || bytes[0] == b'<' {
        let equal_to = bytes.get(1) == Some(&b'=');
        let start = if equal_to { 2 } else { 1 };
        let bound: f64 = text[start..].parse().map_err(|_| invalid(text))?;
        let (lower, upper) = if bytes[0] == b'>' {
            (bound, f64::MAX)
        } else {
            (-f64::MAX, bound)
        };
        return Ok(RangeClause::Float {
            lower,
            upper,
            exclusive_lower: !equal_to,
            exclusive_upper: !equal_to,
        });
    }

    // Bracketed forms: A<..<B with optional '=' on either side.
    let dots = text.find("..").ok_or_else(|| invalid(text))?;
    if dots == 0 {
        return Err(invalid(text));
    }

    let mut exclusive_lower = true;
    let mut left_end = dots - 1;
    if bytes[left_end] == b'=' {
        exclusive_lower = false;
        left_end = left_end.checked_sub(1).ok_or_else(|| invalid(text))?;
    }
    if bytes.get(left_end) != Some(&b'<') {
        return Err(invalid(text));
    }

    if bytes.get(dots + 2) != Some(&b'<') {
        return Err(invalid(text));
    }
    let mut exclusive_upper = true;
    let mut right_start = dots + 3;
    if bytes.get(right_start) == Some(&b'=') {
        exclusive_upper = false;
        right_start += 1;
    }

    let lower: f64 = text[..left_end].parse().map_err(|_| invalid(text))?;
    let upper: f64 = text[right_start..].parse().map_err(|_| invalid(text))?;

    Ok(RangeClause::Float {
        lower,
        upper,
        exclusive_lower,
        exclusive_upper,
    })
}

// Splits `N..M` into its two sides; a plain value is both bounds.
fn split_bounds(text: &str) -> (&str, &str) {
    match text.find("..") {
        Some(i) => (&text[..i], &text[i + 2..]),
        None => (text, text),
    }
}

fn invalid(text: &str) -> EbmlError {
    EbmlError::InvalidRange(text.to_string())
}
