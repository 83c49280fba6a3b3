//! Metadata source parser.
//!
//! One record per line: `name:SYMBOL spec-text`. Blank lines and lines
//! starting with `#` are ignored. A line that does not have this shape is
//! skipped with a warning; only the overall count can fail the parse.

use tracing::warn;

use crate::config::GeneratorConfig;
use crate::model::{
    MetadataRecord, Role, SourceError, SourceKind, Warning, is_property_name, is_symbol,
};

/// Metadata records in file order, generic-excluded records removed.
#[derive(Debug, Clone, Default)]
pub struct MetadataSource {
    records: Vec<MetadataRecord>,
    excluded: usize,
    warnings: Vec<Warning>,
}

impl MetadataSource {
    pub fn parse(content: &str, config: &GeneratorConfig) -> Result<Self, SourceError> {
        let mut source = Self::default();

        for (idx, raw_line) in content.lines().enumerate() {
            let line_num = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line, line_num, &config.symbol_prefix) {
                Ok(record) if record.role == Role::GenericExcluded => source.excluded += 1,
                Ok(record) => source.records.push(record),
                Err(reason) => {
                    let warning = Warning::SkippedLine {
                        kind: SourceKind::Metadata,
                        line: line_num,
                        reason,
                    };
                    warn!("{}", warning);
                    source.warnings.push(warning);
                }
            }
        }

        if source.records.len() < config.min_properties {
            return Err(SourceError::BelowMinimumCount {
                kind: SourceKind::Metadata,
                found: source.records.len(),
                minimum: config.min_properties,
            });
        }

        Ok(source)
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of generic-excluded records that were dropped.
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Lines skipped while parsing.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn into_parts(self) -> (Vec<MetadataRecord>, Vec<Warning>) {
        (self.records, self.warnings)
    }
}

fn parse_line(line: &str, line_num: usize, symbol_prefix: &str) -> Result<MetadataRecord, String> {
    let Some((name, rest)) = line.split_once(':') else {
        return Err(format!("expected 'name:SYMBOL spec', got '{}'", line));
    };
    if !is_property_name(name) {
        return Err(format!("Invalid property name '{}'", name));
    }

    let (symbol, spec) = rest
        .split_once(|c: char| c.is_ascii_whitespace())
        .map(|(symbol, spec)| (symbol, spec.trim()))
        .unwrap_or((rest, ""));
    if !is_symbol(symbol) {
        return Err(format!("Invalid symbol format '{}'", symbol));
    }
    if spec.is_empty() {
        return Err(format!("missing specification after '{}:{}'", name, symbol));
    }

    Ok(MetadataRecord {
        name: name.to_string(),
        symbol: symbol.to_string(),
        role: Role::classify(name, symbol, spec, symbol_prefix),
        inherited_hint: inherited_hint(spec),
        line: line_num,
    })
}

fn inherited_hint(spec: &str) -> Option<bool> {
    spec.split_whitespace()
        .find_map(|token| token.strip_prefix("INHERIT:"))
        .and_then(|flag| match flag {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min: usize) -> GeneratorConfig {
        GeneratorConfig {
            min_properties: min,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn parses_records_and_roles() {
        let src = "\
# Property metadata
color:CSS_PROP_COLOR COLOR

width:CSS_PROP_WIDTH LENGTH_AUTO INHERIT:0
border:CSS_PROP_BORDER SHORTHAND
inline_size:CSS_PROP_WIDTH LENGTH_AUTO
top:CSS_PROP_TOP GENERIC:side
";
        let parsed = MetadataSource::parse(src, &config(1)).unwrap();
        assert_eq!(parsed.len(), 4);
        assert_eq!(parsed.excluded(), 1);
        assert!(parsed.warnings().is_empty());

        let records = parsed.records();
        assert_eq!(records[0].name, "color");
        assert_eq!(records[0].symbol, "CSS_PROP_COLOR");
        assert_eq!(records[0].line, 2);
        assert_eq!(records[0].role, Role::Longhand { manual: false });
        assert_eq!(records[1].inherited_hint, Some(false));
        assert_eq!(records[2].role, Role::Shorthand);
        assert_eq!(
            records[3].role,
            Role::Alias {
                target: "width".into()
            }
        );
    }

    #[test]
    fn bad_symbol_is_skipped_with_warning() {
        let src =
            "color:CSS_PROP_COLOR COLOR\nwidth:css_prop_width LENGTH\nmargin:CSS_PROP_MARGIN X\n";
        let parsed = MetadataSource::parse(src, &config(2)).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.warnings(),
            [Warning::SkippedLine {
                kind: SourceKind::Metadata,
                line: 2,
                reason: "Invalid symbol format 'css_prop_width'".into(),
            }]
        );
    }

    #[test]
    fn other_malformed_lines_are_skipped() {
        let src = "\
no colon here
Width:CSS_PROP_WIDTH LENGTH
color:CSS_PROP_COLOR
margin:CSS_PROP_MARGIN LENGTH
";
        let parsed = MetadataSource::parse(src, &config(1)).unwrap();
        assert_eq!(parsed.len(), 1);
        let lines: Vec<_> = parsed
            .warnings()
            .iter()
            .map(|w| match w {
                Warning::SkippedLine { line, .. } => *line,
                other => panic!("unexpected warning {:?}", other),
            })
            .collect();
        assert_eq!(lines, [1, 2, 3]);
    }

    #[test]
    fn generic_records_do_not_count() {
        let src = "a:CSS_PROP_A GENERIC\nb:CSS_PROP_B GENERIC\nc:CSS_PROP_C X\n";
        let err = MetadataSource::parse(src, &config(2)).unwrap_err();
        assert!(matches!(
            err,
            SourceError::BelowMinimumCount {
                kind: SourceKind::Metadata,
                found: 1,
                minimum: 2
            }
        ));
    }

    #[test]
    fn inherit_hint_parsing() {
        assert_eq!(inherited_hint("COLOR INHERIT:1"), Some(true));
        assert_eq!(inherited_hint("INHERIT:0 LENGTH"), Some(false));
        assert_eq!(inherited_hint("INHERIT:maybe"), None);
        assert_eq!(inherited_hint("COLOR"), None);
    }
}
