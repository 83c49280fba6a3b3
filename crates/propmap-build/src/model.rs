//! Typed records produced by the source loaders, and the diagnostics they
//! can raise.

use std::fmt;
use std::path::PathBuf;

/// Which input a record or diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Dispatch table defining canonical order and inherited-ness
    Canonical,
    /// `name:SYMBOL spec` property metadata
    Metadata,
    /// One keyword per line
    Keywords,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Canonical => "canonical order source",
            Self::Metadata => "metadata source",
            Self::Keywords => "keyword source",
        })
    }
}

/// One entry of the canonical order source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRecord {
    /// Property name in underscore spelling (e.g. `border_top_color`)
    pub name: String,
    /// Authoritative inherited flag
    pub inherited: bool,
    /// 1-based line of the entry
    pub line: usize,
}

/// Role of a metadata record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Resolved directly; `manual` marks a hand-written implementation.
    Longhand { manual: bool },
    /// Expands to other properties; never dispatched.
    Shorthand,
    /// Parses to the representation of `target`.
    Alias { target: String },
    /// Handled by a generic parser; dropped before any processing.
    GenericExcluded,
}

impl Role {
    /// Derive the role from a record's specification text.
    ///
    /// `GENERIC` wins over everything, then shorthands (`SHORTHAND` or a
    /// `WRAP:` wrapper), then aliases: a name that differs from its symbol's
    /// base (prefix stripped, lowercased).
    pub fn classify(name: &str, symbol: &str, spec: &str, symbol_prefix: &str) -> Self {
        let spec = spec.trim();
        if spec.contains("GENERIC") {
            return Self::GenericExcluded;
        }
        if spec == "SHORTHAND" || spec.contains("WRAP:") {
            return Self::Shorthand;
        }
        let base = symbol_base(symbol, symbol_prefix);
        if base != name {
            return Self::Alias { target: base };
        }
        Self::Longhand {
            manual: spec == "MANUAL",
        }
    }

    pub fn is_shorthand(&self) -> bool {
        matches!(self, Self::Shorthand)
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias { .. })
    }
}

/// One entry of the metadata source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRecord {
    pub name: String,
    /// Enum symbol (e.g. `CSS_PROP_WIDTH`)
    pub symbol: String,
    pub role: Role,
    /// Inherited-ness claimed by an `INHERIT:0|1` token, if any.
    /// Never authoritative.
    pub inherited_hint: Option<bool>,
    /// 1-based line of the record
    pub line: usize,
}

/// A recoverable condition. Processing continues after it is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A line that did not parse was skipped.
    SkippedLine {
        kind: SourceKind,
        line: usize,
        reason: String,
    },
    /// A longhand with metadata that the canonical source never dispatches.
    MetadataOnlyLonghand { name: String, line: usize },
    /// Metadata claims a different inherited flag; the canonical one is used.
    InheritedMismatch {
        name: String,
        canonical: bool,
        metadata: bool,
    },
    /// An alias whose target has no canonical index.
    AliasTargetNotDispatched { name: String, target: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedLine { kind, line, reason } => {
                write!(f, "{} line {}: {}; line skipped", kind, line, reason)
            }
            Self::MetadataOnlyLonghand { name, line } => write!(
                f,
                "metadata line {}: longhand '{}' has no entry in the canonical order source",
                line, name
            ),
            Self::InheritedMismatch {
                name,
                canonical,
                metadata,
            } => write!(
                f,
                "'{}' is inherited={} in metadata but inherited={} in the canonical order source; using the canonical flag",
                name, *metadata as u8, *canonical as u8
            ),
            Self::AliasTargetNotDispatched { name, target } => write!(
                f,
                "alias '{}' targets '{}' which has no canonical index; mapped to the sentinel opcode",
                name, target
            ),
        }
    }
}

/// Fatal problems with the input sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot read {kind} {}: {error}", .path.display())]
    MissingInput {
        kind: SourceKind,
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("cannot find '{marker}' in {kind}; the file format may have changed")]
    StructuralMismatch { kind: SourceKind, marker: String },

    #[error("{kind} line {line}: malformed record: {reason}")]
    MalformedRecord {
        kind: SourceKind,
        line: usize,
        reason: String,
    },

    #[error("invalid inherited flag '{flag}' for property {name} (line {line}); must be 0 or 1")]
    InvalidFlag {
        name: String,
        flag: String,
        line: usize,
    },

    #[error("only {found} entries in {kind}; expected at least {minimum}, file may be truncated")]
    BelowMinimumCount {
        kind: SourceKind,
        found: usize,
        minimum: usize,
    },
}

/// Whether `s` is a property name: `[a-z_][a-z0-9_]*`.
pub fn is_property_name(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_lowercase() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Whether `s` is a symbol: a leading uppercase letter followed by at least
/// one uppercase letter, digit or underscore.
pub fn is_symbol(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_uppercase()
        && bytes[1..]
            .iter()
            .all(|&b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}

/// Whether `s` is a keyword: `[A-Z_]+`.
pub fn is_keyword(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase() || b == b'_')
}

/// Symbol with the namespace prefix stripped, lowercased.
pub fn symbol_base(symbol: &str, prefix: &str) -> String {
    symbol
        .strip_prefix(prefix)
        .unwrap_or(symbol)
        .to_ascii_lowercase()
}

/// The CSS spelling of a property name.
pub fn hyphenate(name: &str) -> String {
    name.replace('_', "-")
}
