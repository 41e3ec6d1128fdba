//! Element declaration grammar.
//!
//! Declarations take the form
//! `Name := <hexId> <typeOrAlias> [ param; … ] { child … }` with the
//! parameter list and child block each optional. A trailing `;` closes
//! a non-container declaration, children are parsed one level deeper,
//! and a `%children;` marker inside a container body is consumed and
//! skipped.

use std::collections::BTreeMap;
use std::io::Read;

use super::lex::{Lexer, Token, TokenKind};
use super::range;
use crate::ebml::codec::varint::Varint;
use crate::ebml::types::error::{EbmlError, Result};
use crate::ebml::types::models::{Cardinality, ElemType, Template};

/// Templates keyed by the element id's raw varint form. The ordered map
/// keeps name scans deterministic.
pub(super) type ElementMap = BTreeMap<Varint, Template>;

/// Alias templates keyed by lowercased alias name.
pub(super) type TypesMap = BTreeMap<String, Template>;

/// Hands out placeholder ids for alias templates, which have no wire id
/// of their own. The counter only needs to be unique within the scratch
/// table a types block parses into.
pub(super) struct AliasIds {
    next: u64,
}

impl AliasIds {
    pub(super) fn new() -> AliasIds {
        AliasIds { next: 0 }
    }

    fn next_id(&mut self) -> Varint {
        let id = Varint::encode(self.next)
            .unwrap_or_else(|_| unreachable!("alias counter stays within varint range"));
        self.next += 1;
        id
    }
}

/// Pulls the next token and checks it against the accepted
/// (kind, text) pairs, returning the match.
pub(super) fn expect<R: Read>(lex: &mut Lexer<R>, wanted: &[(TokenKind, &str)]) -> Result<Token> {
    let tok = lex.next_token();
    if let Some(err) = tok.as_error() {
        return Err(err);
    }
    for (kind, val) in wanted {
        if tok.is(*kind, val) {
            return Ok(tok);
        }
    }
    Err(EbmlError::Syntax {
        expected: wanted
            .iter()
            .map(|(_, val)| format!("'{val}'"))
            .collect::<Vec<_>>()
            .join(" or "),
        found: tok.val,
    })
}

/// Pulls the next token and checks that it has one of the given kinds.
pub(super) fn expect_kind<R: Read>(lex: &mut Lexer<R>, kinds: &[TokenKind]) -> Result<Token> {
    let tok = lex.next_token();
    if let Some(err) = tok.as_error() {
        return Err(err);
    }
    if kinds.contains(&tok.kind) {
        return Ok(tok);
    }
    Err(EbmlError::Syntax {
        expected: kinds
            .iter()
            .map(|kind| kind.describe())
            .collect::<Vec<_>>()
            .join(" or "),
        found: tok.val,
    })
}

/// Parses element declarations until the enclosing `}`.
///
/// With `alias_ids` set, declarations carry no hex id (the types-block
/// grammar) and each template receives a generated placeholder instead.
pub(super) fn parse_elements<R: Read>(
    lex: &mut Lexer<R>,
    elements: &mut ElementMap,
    types: &mut TypesMap,
    level: u64,
    mut alias_ids: Option<&mut AliasIds>,
) -> Result<()> {
    loop {
        if parse_element(lex, elements, types, level, alias_ids.as_deref_mut())? {
            return Ok(());
        }
    }
}

// Parses a single declaration. Returns true when the closing brace of
// the surrounding block was found instead.
fn parse_element<R: Read>(
    lex: &mut Lexer<R>,
    elements: &mut ElementMap,
    types: &mut TypesMap,
    level: u64,
    mut alias_ids: Option<&mut AliasIds>,
) -> Result<bool> {
    let name_tok = lex.next_token();
    if let Some(err) = name_tok.as_error() {
        return Err(err);
    }
    if name_tok.is(TokenKind::Control, "}") {
        return Ok(true);
    }
    if name_tok.is(TokenKind::Control, "%") {
        expect(lex, &[(TokenKind::AlphaNum, "children")])?;
        expect(lex, &[(TokenKind::Control, ";")])?;
        return parse_element(lex, elements, types, level, alias_ids);
    }
    if name_tok.kind != TokenKind::AlphaNum {
        return Err(EbmlError::Syntax {
            expected: "element name".to_string(),
            found: name_tok.val,
        });
    }

    expect(lex, &[(TokenKind::Control, ":=")])?;

    let id = match alias_ids.as_deref_mut() {
        Some(ids) => ids.next_id(),
        None => {
            let id_tok = expect_kind(lex, &[TokenKind::AlphaNum])?;
            parse_id(&id_tok.val)?
        }
    };

    let type_tok = expect_kind(lex, &[TokenKind::AlphaNum])?;
    let mut elem = if let Some(kind) = ElemType::from_name(&type_tok.val) {
        Template::new(id, kind, name_tok.val, level)
    } else if let Some(alias) = types.get(&type_tok.val.to_lowercase()) {
        // An alias application copies everything but id and name.
        let mut applied = alias.clone();
        applied.id = id;
        applied.name = name_tok.val;
        applied
    } else {
        return Err(EbmlError::UnknownType(type_tok.val));
    };

    let control_tok = expect_kind(lex, &[TokenKind::Control])?;
    if control_tok.val == ";" {
        elements.insert(elem.id, elem);
        return Ok(false);
    }
    if control_tok.val == "[" {
        parse_params(lex, &mut elem)?;
    } else if elem.kind != ElemType::Container {
        return Err(EbmlError::Syntax {
            expected: "';' or '['".to_string(),
            found: control_tok.val,
        });
    }

    if elem.kind != ElemType::Container {
        elements.insert(elem.id, elem);
        return Ok(false);
    }

    // The parameter list, if any, must be followed by the child block.
    if control_tok.val != "{" {
        let open = expect_kind(lex, &[TokenKind::Control])?;
        if open.val != "{" {
            return Err(EbmlError::Syntax {
                expected: "'{'".to_string(),
                found: open.val,
            });
        }
    }

    elements.insert(elem.id, elem);
    parse_elements(lex, elements, types, level + 1, alias_ids)?;
    Ok(false)
}

fn parse_params<R: Read>(lex: &mut Lexer<R>, elem: &mut Template) -> Result<()> {
    loop {
        if parse_param(lex, elem)? {
            return Ok(());
        }
    }
}

// Parses one `name: value;` clause. Returns true once the closing `]`
// has been reached.
fn parse_param<R: Read>(lex: &mut Lexer<R>, elem: &mut Template) -> Result<bool> {
    let pname_tok = lex.next_token();
    if let Some(err) = pname_tok.as_error() {
        return Err(err);
    }
    if pname_tok.is(TokenKind::Control, "]") {
        return Ok(true);
    }
    if pname_tok.kind != TokenKind::AlphaNum {
        return Err(EbmlError::Syntax {
            expected: "parameter name or ']'".to_string(),
            found: pname_tok.val,
        });
    }

    expect(lex, &[(TokenKind::Control, ":")])?;
    let pval_tok = expect_kind(
        lex,
        &[TokenKind::AlphaNum, TokenKind::QuotedString, TokenKind::Control],
    )?;

    match pname_tok.val.as_str() {
        "card" => {
            elem.card =
                Cardinality::from_symbol(&pval_tok.val).ok_or_else(|| EbmlError::Syntax {
                    expected: "cardinality '*', '?', '1' or '+'".to_string(),
                    found: pval_tok.val.clone(),
                })?;
            expect(lex, &[(TokenKind::Control, ";")])?;
        }
        "def" => {
            parse_def(elem, &pval_tok)?;
            expect(lex, &[(TokenKind::Control, ";")])?;
        }
        "size" => {
            elem.size = pval_tok.val.parse().map_err(|_| EbmlError::Syntax {
                expected: "unsigned size".to_string(),
                found: pval_tok.val.clone(),
            })?;
            expect(lex, &[(TokenKind::Control, ";")])?;
        }
        "range" => {
            // Clauses run until ';' (more parameters follow) or ']'
            // (the parameter list ends too); commas only separate.
            let mut clause_toks = vec![pval_tok];
            let mut hit_square = false;
            loop {
                let tok = lex.next_token();
                if tok.is(TokenKind::Control, ";") {
                    break;
                }
                if tok.is(TokenKind::Control, "]") {
                    hit_square = true;
                    break;
                }
                if tok.is(TokenKind::Control, ",") {
                    continue;
                }
                if let Some(err) = tok.as_error() {
                    return Err(err);
                }
                clause_toks.push(tok);
            }
            elem.ranges = range::parse_clauses(elem.kind, &clause_toks)?;
            if hit_square {
                return Ok(true);
            }
        }
        // Unrecognized parameters (e.g. level) are consumed and skipped.
        _ => {
            expect(lex, &[(TokenKind::Control, ";")])?;
        }
    }

    Ok(false)
}

/// Parses a default-value literal into the element's wire-form default.
///
/// Numeric literals that fail to parse are references to other fields
/// and leave no default, as does a `0x…` literal that is not actually
/// hex. Shared with the `define header` grammar, which stores header
/// values through the same routine.
pub(super) fn parse_def(elem: &mut Template, pval_tok: &Token) -> Result<()> {
    match elem.kind {
        ElemType::Int => {
            if let Ok(v) = pval_tok.val.parse::<i64>() {
                elem.default = Some(v.to_be_bytes().to_vec());
            }
            Ok(())
        }
        ElemType::Uint => {
            if let Ok(v) = pval_tok.val.parse::<u64>() {
                elem.default = Some(v.to_be_bytes().to_vec());
            }
            Ok(())
        }
        ElemType::Float => {
            if let Ok(v) = pval_tok.val.parse::<f64>() {
                elem.default = Some(v.to_be_bytes().to_vec());
            }
            Ok(())
        }
        ElemType::String | ElemType::Binary => {
            if let Some(hex_text) = pval_tok.val.strip_prefix("0x") {
                if let Ok(bytes) = hex::decode(hex_text) {
                    elem.default = Some(bytes);
                }
                return Ok(());
            }
            if pval_tok.kind != TokenKind::QuotedString {
                return Ok(());
            }
            elem.default = Some(unquote(&pval_tok.val)?.into_bytes());
            Ok(())
        }
        ElemType::Date => Err(EbmlError::UnsupportedParam(
            "default on a date element".to_string(),
        )),
        ElemType::Container => Err(EbmlError::UnsupportedParam(
            "default on a container element".to_string(),
        )),
    }
}

/// Decodes a hex id string into the raw varint the stream will carry.
pub(super) fn parse_id(text: &str) -> Result<Varint> {
    let bytes = hex::decode(text).map_err(|_| EbmlError::Syntax {
        expected: "hex element id".to_string(),
        found: text.to_string(),
    })?;
    Varint::parse(&bytes)
}

// Strips the surrounding quotes and resolves backslash escapes; an
// unrecognized escape keeps the escaped character literally.
fn unquote(quoted: &str) -> Result<String> {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| EbmlError::Syntax {
            expected: "quoted string".to_string(),
            found: quoted.to_string(),
        })?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {
                return Err(EbmlError::Syntax {
                    expected: "escape sequence".to_string(),
                    found: quoted.to_string(),
                })
            }
        }
    }
    Ok(out)
}
