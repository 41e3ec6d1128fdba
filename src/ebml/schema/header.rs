//! The `define header` block.
//!
//! Header entries pin stream values: `ExistingName := <literal>;` looks
//! up an already-declared element by name, stores the literal as its
//! default, and marks the element so that a conforming stream must
//! carry exactly that value.

use std::io::Read;

use super::element::{expect, expect_kind, parse_def, ElementMap};
use super::lex::{Lexer, TokenKind};
use crate::ebml::types::error::{EbmlError, Result};

pub(super) fn parse_header<R: Read>(lex: &mut Lexer<R>, elements: &mut ElementMap) -> Result<()> {
    loop {
        if parse_header_entry(lex, elements)? {
            return Ok(());
        }
    }
}

// Parses one `Name := literal;` entry. Returns true at the closing `}`.
fn parse_header_entry<R: Read>(lex: &mut Lexer<R>, elements: &mut ElementMap) -> Result<bool> {
    let name_tok = expect_kind(lex, &[TokenKind::AlphaNum, TokenKind::Control])?;
    if name_tok.is(TokenKind::Control, "}") {
        return Ok(true);
    }
    if name_tok.kind != TokenKind::AlphaNum {
        return Err(EbmlError::Syntax {
            expected: "element name or '}'".to_string(),
            found: name_tok.val,
        });
    }

    expect(lex, &[(TokenKind::Control, ":=")])?;

    let elem = elements
        .values_mut()
        .find(|tpl| tpl.name == name_tok.val)
        .ok_or_else(|| EbmlError::UnknownHeaderName(name_tok.val.clone()))?;

    let val_tok = expect_kind(lex, &[TokenKind::AlphaNum, TokenKind::QuotedString])?;
    parse_def(elem, &val_tok)?;
    elem.must_match_default = true;

    expect(lex, &[(TokenKind::Control, ";")])?;
    Ok(false)
}
