//! Canonical order source parser.
//!
//! The canonical source is the C dispatch table. Only the region after the
//! table marker and up to the closing `};` is read, and every entry in it
//! must have the exact shape
//!
//! ```text
//! MACRO ( name ) , flag ,
//! ```
//!
//! with arbitrary whitespace (including newlines) between tokens. C comments
//! between entries are skipped, so a commented-out entry is not read.

use crate::config::GeneratorConfig;
use crate::model::{PropertyRecord, SourceError, SourceKind, is_property_name};

/// Properties in canonical order. Position is the canonical index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSource {
    records: Vec<PropertyRecord>,
}

impl CanonicalSource {
    /// Parse the dispatch table.
    pub fn parse(content: &str, config: &GeneratorConfig) -> Result<Self, SourceError> {
        let marker = config.table_marker.as_str();
        let Some(marker_at) = content.find(marker) else {
            return Err(SourceError::StructuralMismatch {
                kind: SourceKind::Canonical,
                marker: marker.to_string(),
            });
        };

        let entry_macro = config.entry_macro.as_str();
        let bytes = content.as_bytes();
        let mut records = Vec::new();
        let mut pos = marker_at + marker.len();
        while pos < bytes.len() {
            let rest = &bytes[pos..];
            if rest.starts_with(b"/*") {
                pos = find_from(content, pos + 2, "*/").map_or(bytes.len(), |at| at + 2);
            } else if rest.starts_with(b"//") {
                pos = find_from(content, pos, "\n").unwrap_or(bytes.len());
            } else if rest.starts_with(b"};") {
                break;
            } else if rest.starts_with(entry_macro.as_bytes())
                && is_macro_use(content, pos, entry_macro.len())
            {
                let mut cursor = Cursor::new(content, pos);
                records.push(parse_entry(&mut cursor, entry_macro)?);
                pos = cursor.pos;
            } else {
                pos += 1;
            }
        }

        if records.len() < config.min_properties {
            return Err(SourceError::BelowMinimumCount {
                kind: SourceKind::Canonical,
                found: records.len(),
                minimum: config.min_properties,
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[PropertyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn into_records(self) -> Vec<PropertyRecord> {
        self.records
    }
}

fn find_from(content: &str, from: usize, pattern: &str) -> Option<usize> {
    content.get(from..)?.find(pattern).map(|at| from + at)
}

/// `MACRO` at `at` is a whole identifier, not part of a longer one.
fn is_macro_use(content: &str, at: usize, len: usize) -> bool {
    let bytes = content.as_bytes();
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let before_ok = at == 0 || !is_ident(bytes[at - 1]);
    let after_ok = bytes.get(at + len).is_none_or(|&b| !is_ident(b));
    before_ok && after_ok
}

fn parse_entry(cursor: &mut Cursor<'_>, entry_macro: &str) -> Result<PropertyRecord, SourceError> {
    let line = cursor.line();
    cursor.advance(entry_macro.len());

    cursor.expect(b'(', || format!("expected '(' after {}", entry_macro))?;
    let name = cursor.take_while(|b| b.is_ascii_alphanumeric() || b == b'_');
    if !is_property_name(name) {
        let reason = if name.is_empty() {
            format!("expected property name in {}(...)", entry_macro)
        } else {
            format!("invalid property name '{}'", name)
        };
        return Err(cursor.malformed(reason));
    }
    cursor.expect(
        b')',
        || format!("expected ')' after property name '{}'", name),
    )?;
    cursor.expect(
        b',',
        || format!("expected ',' after {}({})", entry_macro, name),
    )?;

    let flag_line = {
        cursor.skip_ws();
        cursor.line()
    };
    let flag = cursor.take_while(|b| b.is_ascii_digit());
    if flag.is_empty() {
        return Err(cursor.malformed(format!(
            "expected inherited flag after {}({})",
            entry_macro, name
        )));
    }
    let inherited = match flag {
        "0" => false,
        "1" => true,
        _ => {
            return Err(SourceError::InvalidFlag {
                name: name.to_string(),
                flag: flag.to_string(),
                line: flag_line,
            });
        }
    };
    cursor.expect(
        b',',
        || format!("expected ',' after inherited flag of '{}'", name),
    )?;

    Ok(PropertyRecord {
        name: name.to_string(),
        inherited,
        line,
    })
}

/// Byte cursor over the whole source, so line numbers stay absolute.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize) -> Self {
        Self { src, pos }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.src.len());
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Skip whitespace, then consume `byte` or fail with `reason`.
    fn expect(&mut self, byte: u8, reason: impl FnOnce() -> String) -> Result<(), SourceError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.malformed(reason()))
        }
    }

    fn line(&self) -> usize {
        self.src.as_bytes()[..self.pos]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }

    fn malformed(&self, reason: String) -> SourceError {
        SourceError::MalformedRecord {
            kind: SourceKind::Canonical,
            line: self.line(),
            reason,
        }
    }
}
