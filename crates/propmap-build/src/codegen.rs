//! C fragment rendering.
//!
//! Pure serialization of already validated tables. Every fragment opens with
//! the same banner, uses tabs/spaces exactly as below and ends with a single
//! newline, so identical inputs give byte-identical files.

use propmap::SENTINEL_OPCODE;

use crate::config::GeneratorConfig;
use crate::phf::PerfectHash;
use crate::tables::{OpcodeEntry, Tables};

/// Name the generated files credit.
pub const TOOL_NAME: &str = "property-generator";

/// Input file names quoted in each banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNames {
    pub canonical: String,
    pub metadata: String,
    pub keywords: String,
}

impl Default for SourceNames {
    fn default() -> Self {
        Self {
            canonical: "dispatch.c".into(),
            metadata: "properties.gen".into(),
            keywords: "keywords.gen".into(),
        }
    }
}

/// The five rendered fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub enum_fragment: String,
    pub dispatch: String,
    pub propstrings: String,
    pub string_map: String,
    pub hash_table: String,
}

impl Artifacts {
    pub fn render(
        tables: &Tables,
        hash: &PerfectHash,
        config: &GeneratorConfig,
        sources: &SourceNames,
    ) -> Self {
        Self {
            enum_fragment: render_enum(tables, sources),
            dispatch: render_dispatch(tables, config, sources),
            propstrings: render_propstrings(tables, config, sources),
            string_map: render_string_map(tables, sources),
            hash_table: render_hash_table(tables, hash, config, sources),
        }
    }

    /// Fragments in output argument order.
    pub fn as_array(&self) -> [&str; 5] {
        [
            self.enum_fragment.as_str(),
            self.dispatch.as_str(),
            self.propstrings.as_str(),
            self.string_map.as_str(),
            self.hash_table.as_str(),
        ]
    }
}

fn banner(description: &str, sources: &SourceNames) -> String {
    let mut out = String::new();
    out.push_str("/*\n");
    out.push_str(" * AUTO-GENERATED FILE - DO NOT EDIT!\n");
    out.push_str(" *\n");
    out.push_str(&format!(
        " * This file was automatically generated by {}\n",
        TOOL_NAME
    ));
    out.push_str(&format!(" * {}\n", description));
    out.push_str(" *\n");
    out.push_str(" * To regenerate this file, run:\n");
    out.push_str(&format!(" *   {} \\\n", TOOL_NAME));
    out.push_str(&format!(" *     {} \\\n", sources.canonical));
    out.push_str(&format!(" *     {} \\\n", sources.metadata));
    out.push_str(&format!(" *     {} \\\n", sources.keywords));
    out.push_str(" *     <output_files>\n");
    out.push_str(" *\n");
    out.push_str(" * Source files:\n");
    out.push_str(&format!(" *   - {} (defines property order)\n", sources.canonical));
    out.push_str(&format!(" *   - {} (defines property metadata)\n", sources.metadata));
    out.push_str(&format!(" *   - {} (defines keywords)\n", sources.keywords));
    out.push_str(" */\n");
    out.push('\n');
    out
}

/// Enum constants matching canonical order, gaps included.
pub fn render_enum(tables: &Tables, sources: &SourceNames) -> String {
    let mut out = banner("Property enum values matching canonical order", sources);
    for entry in &tables.enums {
        out.push_str(&format!("\t{} = 0x{:03x},\n", entry.symbol, entry.index));
    }
    out
}

/// Dispatch rows in canonical order.
pub fn render_dispatch(tables: &Tables, config: &GeneratorConfig, sources: &SourceNames) -> String {
    let mut out = banner("Dispatch table entries in canonical order", sources);
    for row in &tables.dispatch {
        out.push_str("\t{\n");
        out.push_str(&format!("\t\t{}({}),\n", config.entry_macro, row.name));
        out.push_str(&format!("\t\t{},\n", row.inherited as u8));
        out.push_str("\t},\n");
    }
    out
}

/// Alphabetical string enum with first/last anchors.
pub fn render_propstrings(
    tables: &Tables,
    config: &GeneratorConfig,
    sources: &SourceNames,
) -> String {
    let mut out = banner(
        "Parser string identifiers (properties, alphabetical)",
        sources,
    );
    for (i, entry) in tables.strings.entries().iter().enumerate() {
        if i == 0 {
            out.push_str(&format!("\t{} = {},\n", entry.constant(), config.first_anchor));
        } else {
            out.push_str(&format!("\t{},\n", entry.constant()));
        }
    }
    if let Some(last) = tables.strings.last() {
        out.push('\n');
        out.push_str(&format!("\t{} = {},\n", config.last_anchor, last.constant()));
    }
    out
}

/// Hyphenated name literals in string table order.
pub fn render_string_map(tables: &Tables, sources: &SourceNames) -> String {
    let mut out = banner("Property string map entries", sources);
    for entry in tables.strings.entries() {
        out.push_str(&format!("\tSMAP(\"{}\"),\n", entry.css_name));
    }
    out
}

fn push_rows<T: std::fmt::Display>(out: &mut String, values: &[T]) {
    for row in values.chunks(16) {
        let row: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        out.push_str(&format!("    {},\n", row.join(", ")));
    }
}

/// Hash tables, hash and lookup functions, and the opcode map.
pub fn render_hash_table(
    tables: &Tables,
    hash: &PerfectHash,
    config: &GeneratorConfig,
    sources: &SourceNames,
) -> String {
    let size = hash.table_size();
    let mut out = banner("Perfect hash table for CSS property lookup", sources);
    out.push_str("#include <stdint.h>\n");
    out.push_str("#include <stddef.h>\n");
    out.push('\n');

    out.push_str("/* Perfect hash intermediate table G */\n");
    out.push_str(&format!("static const uint16_t G[{}] = {{\n", size));
    push_rows(&mut out, &hash.g);
    out.push_str("};\n\n");

    for (name, salt) in [("S1", &hash.s1), ("S2", &hash.s2)] {
        out.push_str(&format!("static const unsigned char {}[{}] = {{\n", name, salt.len()));
        push_rows(&mut out, salt);
        out.push_str("};\n\n");
    }

    out.push_str("/* Perfect hash function for CSS property lookup */\n");
    out.push_str("static inline unsigned int css_prop_hash(const char *key, size_t len) {\n");
    out.push_str("    unsigned int f1 = 0, f2 = 0;\n");
    out.push_str(&format!("    size_t salt_len = {};\n", hash.s1.len()));
    out.push_str("    for (size_t i = 0; i < len && i < salt_len; i++) {\n");
    out.push_str("        f1 += S1[i] * (unsigned char)key[i];\n");
    out.push_str("        f2 += S2[i] * (unsigned char)key[i];\n");
    out.push_str("    }\n");
    out.push_str(&format!("    f1 %= {};\n", size));
    out.push_str(&format!("    f2 %= {};\n", size));
    out.push_str(&format!("    return (G[f1] + G[f2]) % {};\n", size));
    out.push_str("}\n\n");

    out.push_str("/* Property lookup table entry */\n");
    out.push_str("struct css_prop_entry {\n");
    out.push_str("    const char *name;     /* Property name (hyphenated) */\n");
    out.push_str("    uint8_t name_len;     /* Length of name */\n");
    out.push_str("    css_prop_handler handler;  /* Parse handler function */\n");
    out.push_str("};\n\n");

    out.push_str(&format!("#define CSS_PROP_HASH_TABLE_SIZE {}\n\n", size));

    out.push_str(
        "static const struct css_prop_entry css_prop_hash_table[CSS_PROP_HASH_TABLE_SIZE] = {\n",
    );
    for (slot, entry) in hash.slots.iter().enumerate() {
        if let Some(entry) = entry {
            out.push_str(&format!(
                "    [{}] = {{ \"{}\", {}, {} }},\n",
                slot,
                entry.key,
                entry.key.len(),
                entry.handler
            ));
        }
    }
    out.push_str("};\n\n");

    out.push_str("/* Lookup property handler by name (case-insensitive) */\n");
    out.push_str(
        "static inline css_prop_handler css_prop_lookup(const char *name, size_t len) {\n",
    );
    out.push_str("    /* Convert to lowercase for hash lookup */\n");
    out.push_str(&format!("    char lower[{}];\n", hash.max_key_len + 1));
    out.push_str("    if (len >= sizeof(lower)) return NULL;\n");
    out.push_str("    for (size_t i = 0; i < len; i++) {\n");
    out.push_str("        char c = name[i];\n");
    out.push_str("        lower[i] = (c >= 'A' && c <= 'Z') ? c + 32 : c;\n");
    out.push_str("    }\n");
    out.push_str("    lower[len] = '\\0';\n");
    out.push('\n');
    out.push_str("    unsigned int slot = css_prop_hash(lower, len);\n");
    out.push_str("    if (slot >= CSS_PROP_HASH_TABLE_SIZE) return NULL;\n");
    out.push('\n');
    out.push_str("    const struct css_prop_entry *e = &css_prop_hash_table[slot];\n");
    out.push_str("    if (e->name == NULL || e->name_len != len) return NULL;\n");
    out.push('\n');
    out.push_str("    /* Verify exact match */\n");
    out.push_str("    for (size_t i = 0; i < len; i++) {\n");
    out.push_str("        if (lower[i] != e->name[i]) return NULL;\n");
    out.push_str("    }\n");
    out.push_str("    return e->handler;\n");
    out.push_str("}\n\n");

    out.push_str("/* Opcode of a property with no dispatch entry */\n");
    out.push_str(&format!("#define {} 0x{:03x}\n\n", config.sentinel, SENTINEL_OPCODE));
    out.push_str("/* Canonical opcode of each property string (alphabetical order) */\n");
    out.push_str(&format!(
        "static const uint16_t prop_opcode_map[{} + 1 - {}] = {{\n",
        config.last_anchor, config.first_anchor
    ));
    for (entry, opcode) in tables.strings.entries().iter().zip(&tables.opcodes) {
        let value = match opcode {
            OpcodeEntry::Property {
                symbol: Some(symbol),
                ..
            } => symbol.clone(),
            OpcodeEntry::Property { symbol: None, .. } => format!("0x{:03x}", opcode.opcode()),
            OpcodeEntry::Sentinel => config.sentinel.clone(),
        };
        out.push_str(&format!("\t{}, /* {} */\n", value, entry.css_name));
    }
    out.push_str("};\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HashConfig;
    use crate::phf::{PerfectHashBuilder, Slot};
    use crate::tables::synthesize;
    use crate::validate::tests::example;
    use pretty_assertions::assert_eq;

    fn render() -> (Tables, PerfectHash, Artifacts) {
        let config = GeneratorConfig::default();
        let tables = synthesize(&example()).unwrap();
        let slots = tables
            .strings
            .entries()
            .iter()
            .map(|e| Slot::new(&e.css_name, format!("css__parse_{}", e.name)))
            .collect();
        let hash = PerfectHashBuilder::new(HashConfig::default())
            .build(slots)
            .unwrap();
        let artifacts = Artifacts::render(&tables, &hash, &config, &SourceNames::default());
        (tables, hash, artifacts)
    }

    fn body(fragment: &str) -> &str {
        let (_, body) = fragment.split_once(" */\n\n").unwrap();
        body
    }

    #[test]
    fn banner_names_tool_and_inputs() {
        let (_, _, artifacts) = render();
        for fragment in artifacts.as_array() {
            assert!(fragment.starts_with("/*\n * AUTO-GENERATED FILE - DO NOT EDIT!\n"));
            assert!(fragment.contains("generated by property-generator\n"));
            assert!(fragment.contains(" *   - dispatch.c (defines property order)\n"));
            assert!(fragment.contains(" *   - properties.gen (defines property metadata)\n"));
            assert!(fragment.ends_with('\n') && !fragment.ends_with("\n\n"));
        }
    }

    #[test]
    fn enum_fragment() {
        let (_, _, artifacts) = render();
        assert_eq!(
            body(&artifacts.enum_fragment),
            "\tCSS_PROP_COLOR = 0x000,\n\tCSS_PROP_WIDTH = 0x001,\n\tCSS_PROP_MARGIN = 0x002,\n"
        );
    }

    #[test]
    fn dispatch_fragment() {
        let (_, _, artifacts) = render();
        assert_eq!(
            body(&artifacts.dispatch),
            "\t{\n\t\tPROPERTY_FUNCS(color),\n\t\t1,\n\t},\n\
             \t{\n\t\tPROPERTY_FUNCS(width),\n\t\t0,\n\t},\n\
             \t{\n\t\tPROPERTY_FUNCS(margin),\n\t\t0,\n\t},\n"
        );
    }

    #[test]
    fn propstrings_fragment() {
        let (_, _, artifacts) = render();
        assert_eq!(
            body(&artifacts.propstrings),
            "\tBORDER = FIRST_PROP,\n\tCOLOR,\n\tINLINE_SIZE,\n\tMARGIN,\n\tWIDTH,\n\n\tLAST_PROP = WIDTH,\n"
        );
    }

    #[test]
    fn string_map_fragment() {
        let (_, _, artifacts) = render();
        assert_eq!(
            body(&artifacts.string_map),
            "\tSMAP(\"border\"),\n\tSMAP(\"color\"),\n\tSMAP(\"inline-size\"),\n\tSMAP(\"margin\"),\n\tSMAP(\"width\"),\n"
        );
    }

    #[test]
    fn hash_fragment_tables_and_slots() {
        let (_, hash, artifacts) = render();
        let text = &artifacts.hash_table;
        assert!(text.contains("#include <stdint.h>\n#include <stddef.h>\n"));
        assert!(text.contains(&format!("static const uint16_t G[{}] = {{\n", hash.table_size())));
        assert!(text.contains("static const unsigned char S1[11] = {\n"));
        assert!(text.contains(&format!(
            "#define CSS_PROP_HASH_TABLE_SIZE {}\n",
            hash.table_size()
        )));
        assert!(text.contains("    [0] = { \"border\", 6, css__parse_border },\n"));
        assert!(text.contains("    [2] = { \"inline-size\", 11, css__parse_inline_size },\n"));
        assert!(text.contains("    char lower[64];\n"));
        assert!(text.contains(&format!("    return (G[f1] + G[f2]) % {};\n", hash.table_size())));
    }

    #[test]
    fn hash_fragment_opcode_map() {
        let (_, _, artifacts) = render();
        let (_, map) = artifacts
            .hash_table
            .split_once("#define PROP_OPCODE_NONE 0x3ff\n")
            .unwrap();
        assert!(map.contains(
            "static const uint16_t prop_opcode_map[LAST_PROP + 1 - FIRST_PROP] = {\n"
        ));
        assert!(map.ends_with(
            "\tPROP_OPCODE_NONE, /* border */\n\
             \tCSS_PROP_COLOR, /* color */\n\
             \tCSS_PROP_WIDTH, /* inline-size */\n\
             \tCSS_PROP_MARGIN, /* margin */\n\
             \tCSS_PROP_WIDTH, /* width */\n\
             };\n"
        ));
    }

    #[test]
    fn g_rows_hold_sixteen_values() {
        let mut out = String::new();
        push_rows(&mut out, &(0..20u16).collect::<Vec<_>>());
        assert_eq!(
            out,
            "    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,\n    16, 17, 18, 19,\n"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let (_, _, a) = render();
        let (_, _, b) = render();
        assert_eq!(a, b);
    }
}
