//! Table synthesis.
//!
//! Four views over the validated [`Model`]:
//!
//! - enum constants, one per dispatched property with metadata, valued by
//!   canonical position (gaps where a position has no metadata)
//! - dispatch rows, with the inherited flag of the canonical source
//! - the alphabetical string table over the combined identifier set
//! - the opcode map, parallel to the string table

use std::collections::HashMap;

use propmap::{Opcode, SENTINEL_OPCODE};
use tracing::debug;

use crate::model::{Role, hyphenate};
use crate::validate::{Model, ValidateError};

/// One enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    pub symbol: String,
    /// Canonical index
    pub index: usize,
}

/// One dispatch table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRow {
    pub name: String,
    pub inherited: bool,
}

/// One string table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringEntry {
    /// Underscore spelling
    pub name: String,
    /// Hyphenated spelling; the sort key and the hash key
    pub css_name: String,
}

impl StringEntry {
    /// The identifier used in the string enum (`BORDER_TOP_COLOR`).
    pub fn constant(&self) -> String {
        self.name.to_ascii_uppercase()
    }
}

/// Combined identifiers sorted by hyphenated spelling.
///
/// Entry `i` has string index `first + i`; the emitted enum anchors entry 0
/// to the first constant and names the last entry with the last constant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringTable {
    entries: Vec<StringEntry>,
}

impl StringTable {
    pub fn entries(&self) -> &[StringEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&StringEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&StringEntry> {
        self.entries.last()
    }

    /// String index (relative to the first anchor) of `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }
}

/// One opcode map entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpcodeEntry {
    /// Dispatches to a canonical index. `symbol` is the enum constant to
    /// render it with, when one with the same value exists.
    Property {
        index: usize,
        symbol: Option<String>,
    },
    /// No dispatch entry.
    Sentinel,
}

impl OpcodeEntry {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Property { index, .. } => Some(*index),
            Self::Sentinel => None,
        }
    }

    /// Runtime opcode, [`SENTINEL_OPCODE`] when not dispatched.
    pub fn opcode(&self) -> Opcode {
        match self {
            // `validate` caps canonical indices below MAX_OPCODES.
            Self::Property { index, .. } => *index as Opcode,
            Self::Sentinel => SENTINEL_OPCODE,
        }
    }
}

/// All synthesized tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub enums: Vec<EnumEntry>,
    pub dispatch: Vec<DispatchRow>,
    pub strings: StringTable,
    pub opcodes: Vec<OpcodeEntry>,
}

/// Enum constants in canonical order, valued by canonical position.
pub fn assign_enums(model: &Model) -> Vec<EnumEntry> {
    model
        .properties()
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            model.metadata_for(&record.name).map(|meta| EnumEntry {
                symbol: meta.symbol.clone(),
                index,
            })
        })
        .collect()
}

/// Dispatch rows in canonical order. The inherited flag always comes from
/// the canonical source.
pub fn build_dispatch(model: &Model) -> Vec<DispatchRow> {
    model
        .properties()
        .iter()
        .filter(|record| model.metadata_for(&record.name).is_some())
        .map(|record| DispatchRow {
            name: record.name.clone(),
            inherited: record.inherited,
        })
        .collect()
}

/// Sort the combined identifier set by hyphenated spelling, bytewise.
pub fn build_string_table(model: &Model) -> StringTable {
    let mut entries: Vec<StringEntry> = model
        .identifiers()
        .iter()
        .map(|name| StringEntry {
            name: name.clone(),
            css_name: hyphenate(name),
        })
        .collect();
    entries.sort_by(|a, b| a.css_name.as_bytes().cmp(b.css_name.as_bytes()));
    StringTable { entries }
}

/// One opcode per string table entry, in string table order.
pub fn map_opcodes(model: &Model, enums: &[EnumEntry], strings: &StringTable) -> Vec<OpcodeEntry> {
    let symbol_index: HashMap<&str, usize> = enums
        .iter()
        .map(|e| (e.symbol.as_str(), e.index))
        .collect();

    strings
        .entries()
        .iter()
        .map(|entry| {
            let meta = model.metadata_for(&entry.name);
            let target = match (model.canonical_index(&entry.name), meta.map(|m| &m.role)) {
                (Some(index), _) => Some(index),
                (None, Some(Role::Alias { target })) => model.canonical_index(target),
                _ => None,
            };
            match target {
                Some(index) => OpcodeEntry::Property {
                    index,
                    symbol: meta
                        .map(|m| m.symbol.as_str())
                        .filter(|s| symbol_index.get(s) == Some(&index))
                        .map(str::to_string),
                },
                None => OpcodeEntry::Sentinel,
            }
        })
        .collect()
}

/// Build every table and check the string table / opcode map invariants.
pub fn synthesize(model: &Model) -> Result<Tables, ValidateError> {
    let enums = assign_enums(model);
    let dispatch = build_dispatch(model);
    let strings = build_string_table(model);
    let opcodes = map_opcodes(model, &enums, &strings);

    if strings.len() != opcodes.len() {
        return Err(ValidateError::ArrayLengthMismatch {
            strings: strings.len(),
            opcodes: opcodes.len(),
        });
    }
    let count = model.properties().len();
    for (entry, opcode) in strings.entries().iter().zip(&opcodes) {
        if let Some(index) = opcode.index()
            && index >= count
        {
            return Err(ValidateError::InvalidOpcode {
                name: entry.name.clone(),
                index,
            });
        }
    }

    debug!(
        enums = enums.len(),
        dispatch = dispatch.len(),
        strings = strings.len(),
        "tables synthesized"
    );

    Ok(Tables {
        enums,
        dispatch,
        strings,
        opcodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::tests::{example, load};

    #[test]
    fn example_tables() {
        let tables = synthesize(&example()).unwrap();

        let enums: Vec<_> = tables
            .enums
            .iter()
            .map(|e| (e.symbol.as_str(), e.index))
            .collect();
        assert_eq!(
            enums,
            [("CSS_PROP_COLOR", 0), ("CSS_PROP_WIDTH", 1), ("CSS_PROP_MARGIN", 2)]
        );

        let dispatch: Vec<_> = tables
            .dispatch
            .iter()
            .map(|r| (r.name.as_str(), r.inherited))
            .collect();
        assert_eq!(
            dispatch,
            [("color", true), ("width", false), ("margin", false)]
        );

        let strings: Vec<_> = tables
            .strings
            .entries()
            .iter()
            .map(|e| e.css_name.as_str())
            .collect();
        assert_eq!(
            strings,
            ["border", "color", "inline-size", "margin", "width"]
        );

        let opcodes: Vec<_> = tables.opcodes.iter().map(OpcodeEntry::index).collect();
        assert_eq!(opcodes, [None, Some(0), Some(1), Some(2), Some(1)]);

        let runtime: Vec<_> = tables.opcodes.iter().map(OpcodeEntry::opcode).collect();
        assert_eq!(runtime, [SENTINEL_OPCODE, 0, 1, 2, 1]);
    }

    #[test]
    fn alias_renders_through_its_own_symbol() {
        let tables = synthesize(&example()).unwrap();
        assert_eq!(
            tables.opcodes[2],
            OpcodeEntry::Property {
                index: 1,
                symbol: Some("CSS_PROP_WIDTH".into()),
            }
        );
        assert_eq!(tables.opcodes[0], OpcodeEntry::Sentinel);
    }

    #[test]
    fn gaps_keep_canonical_positions() {
        let model = load(
            &[("color", 1), ("direction", 1), ("width", 0), ("z_index", 0)],
            "color:CSS_PROP_COLOR X\nwidth:CSS_PROP_WIDTH X\nz_index:CSS_PROP_Z_INDEX X\n",
        )
        .unwrap();
        let tables = synthesize(&model).unwrap();
        let indices: Vec<_> = tables.enums.iter().map(|e| e.index).collect();
        assert_eq!(indices, [0, 2, 3]);
        assert_eq!(tables.dispatch.len(), 3);

        // Without metadata the property is still dispatched, rendered by value.
        let at = tables.strings.position("direction").unwrap();
        assert_eq!(
            tables.opcodes[at],
            OpcodeEntry::Property {
                index: 1,
                symbol: None
            }
        );
    }

    #[test]
    fn canonical_flag_wins() {
        let model = load(
            &[("color", 1), ("width", 0)],
            "color:CSS_PROP_COLOR COLOR INHERIT:0\nwidth:CSS_PROP_WIDTH LENGTH INHERIT:1\n",
        )
        .unwrap();
        let tables = synthesize(&model).unwrap();
        assert!(tables.dispatch[0].inherited);
        assert!(!tables.dispatch[1].inherited);
    }

    #[test]
    fn hyphen_sorts_before_letters() {
        let model = load(
            &[("border_top", 0), ("bordera", 0), ("border", 0)],
            "border:CSS_PROP_BORDER X\n",
        )
        .unwrap();
        let strings = build_string_table(&model);
        let names: Vec<_> = strings
            .entries()
            .iter()
            .map(|e| e.css_name.as_str())
            .collect();
        assert_eq!(names, ["border", "border-top", "bordera"]);
        assert_eq!(strings.first().unwrap().constant(), "BORDER");
        assert_eq!(strings.last().unwrap().constant(), "BORDERA");
    }

    #[test]
    fn undispatched_alias_target_is_sentinel() {
        let model = load(&[("color", 1)], "block_size:CSS_PROP_HEIGHT LENGTH\n").unwrap();
        let tables = synthesize(&model).unwrap();
        assert_eq!(tables.opcodes.len(), tables.strings.len());
        let at = tables.strings.position("block_size").unwrap();
        assert_eq!(tables.opcodes[at], OpcodeEntry::Sentinel);
    }
}
