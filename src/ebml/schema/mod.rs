//! EDTD schema parsing and the linked template table.
//!
//! An EDTD file is a sequence of `define`/`declare` directives over
//! three block kinds:
//!
//! - `elements`: element declarations, nested for containers
//! - `types`: reusable aliases cloned into later declarations
//! - `header`: value pins for already-declared elements
//!
//! [`Schema::parse`] first seeds the declarations every document
//! carries implicitly (the EBML header machinery, CRC32 and Void),
//! then folds the user source on top — a user declaration that reuses
//! an implicit id overrides it.

pub mod lex;

mod element;
mod header;
mod range;

use std::io::Read;

use log::{debug, info};

use self::element::{expect, AliasIds, ElementMap, TypesMap};
use self::lex::{Lexer, TokenKind};
use crate::ebml::codec::varint::Varint;
use crate::ebml::iter::ElemIter;
use crate::ebml::types::error::{EbmlError, Result};
use crate::ebml::types::models::Template;

// Declarations present in every document without being spelled out.
// The stray closing brace ends the element list the same way a
// container body would.
const IMPLICIT_SOURCE: &str = r#"
    EBML := 1a45dfa3 container [ card:+; ] {
      EBMLVersion := 4286 uint [ def:1; ]
      EBMLReadVersion := 42f7 uint [ def:1; ]
      EBMLMaxIDLength := 42f2 uint [ def:4; ]
      EBMLMaxSizeLength := 42f3 uint [ def:8; ]
      DocType := 4282 string [ range:32..126; ]
      DocTypeVersion := 4287 uint [ def:1; ]
      DocTypeReadVersion := 4285 uint [ def:1; ]
    }

    CRC32 := c3 container [ level:1..; card:*; ] {
      %children;
      CRC32Value := 42fe binary [ size:4; ]
    }

    Void  := ec binary [ level:1..; card:*; ]
}
"#;

/// An indexed schema built from EDTD source. Lookups by id drive the
/// annotated iterator; lookups by name serve the header grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    elements: ElementMap,
    types: TypesMap,
}

impl Schema {
    /// Reads EDTD source until EOF and builds the template table,
    /// implicit declarations included.
    pub fn parse<R: Read>(source: R) -> Result<Schema> {
        let mut elements = ElementMap::new();
        let mut types = TypesMap::new();
        let mut alias_ids = AliasIds::new();

        debug!("seeding implicit elements");
        let mut seed_lex = Lexer::new(IMPLICIT_SOURCE.as_bytes());
        element::parse_elements(&mut seed_lex, &mut elements, &mut types, 0, None)?;

        let mut lex = Lexer::new(source);
        loop {
            let verb_tok = lex.next_token();
            if verb_tok.kind == TokenKind::Eof {
                break;
            }
            if let Some(err) = verb_tok.as_error() {
                return Err(err);
            }
            if verb_tok.val != "define" && verb_tok.val != "declare" {
                return Err(EbmlError::Syntax {
                    expected: "'define' or 'declare'".to_string(),
                    found: verb_tok.val,
                });
            }

            let what_tok = expect(
                &mut lex,
                &[
                    (TokenKind::AlphaNum, "elements"),
                    (TokenKind::AlphaNum, "header"),
                    (TokenKind::AlphaNum, "types"),
                ],
            )?;
            expect(&mut lex, &[(TokenKind::Control, "{")])?;
            debug!("parsing '{} {}' block", verb_tok.val, what_tok.val);

            match what_tok.val.as_str() {
                "elements" => {
                    element::parse_elements(&mut lex, &mut elements, &mut types, 0, None)?
                }
                "header" => header::parse_header(&mut lex, &mut elements)?,
                "types" => parse_types(&mut lex, &mut types, &mut alias_ids)?,
                _ => unreachable!("restricted by expect"),
            }
        }

        info!(
            "schema parsed: {} elements, {} type aliases",
            elements.len(),
            types.len()
        );
        Ok(Schema { elements, types })
    }

    /// Looks up the template for an element id (raw varint form).
    pub fn get(&self, id: Varint) -> Option<&Template> {
        self.elements.get(&id)
    }

    /// Looks up a template by declared name. Linear in the number of
    /// elements.
    pub fn get_by_name(&self, name: &str) -> Option<&Template> {
        self.elements.values().find(|tpl| tpl.name == name)
    }

    /// Looks up a type alias by name (case-insensitive).
    pub fn alias(&self, name: &str) -> Option<&Template> {
        self.types.get(&name.to_lowercase())
    }

    /// The number of declared elements, implicit ones included.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All element templates in id order.
    pub fn elements(&self) -> impl Iterator<Item = &Template> {
        self.elements.values()
    }

    /// Starts an annotated iteration over a byte stream conforming to
    /// this schema.
    pub fn iter_elems<R: Read>(&self, source: R) -> ElemIter<'_, R> {
        ElemIter::new(self, source)
    }
}

// A types block parses with the element grammar minus the ids; the
// scratch table is then filed into the alias map by lowercased name.
fn parse_types<R: Read>(
    lex: &mut Lexer<R>,
    types: &mut TypesMap,
    alias_ids: &mut AliasIds,
) -> Result<()> {
    let mut scratch = ElementMap::new();
    element::parse_elements(lex, &mut scratch, types, 0, Some(alias_ids))?;

    for tpl in scratch.into_values() {
        types.insert(tpl.name.to_lowercase(), tpl);
    }
    Ok(())
}
