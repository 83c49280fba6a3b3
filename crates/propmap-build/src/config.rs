//! Generator configuration, optionally read from a TOML file.
//!
//! Every key is optional; the defaults describe the libcss dialect:
//!
//! ```toml
//! table_marker = "struct prop_table prop_dispatch["
//! entry_macro = "PROPERTY_FUNCS"
//! symbol_prefix = "CSS_PROP_"
//! handler_prefix = "css__parse_"
//! first_anchor = "FIRST_PROP"
//! last_anchor = "LAST_PROP"
//! sentinel = "PROP_OPCODE_NONE"
//! min_properties = 50
//! min_keywords = 10
//!
//! [hash]
//! seed = 0x5eed_0c55_0000_0001
//! max_attempts = 200
//! max_key_len = 63
//! ```

use serde::Deserialize;
use std::path::Path;

use propmap::MAX_KEY_LIMIT;

/// Default seed for salt selection. Any fixed value keeps output reproducible.
pub const DEFAULT_SEED: u64 = 0x5eed_0c55_0000_0001;

/// Parsed generator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Literal that proves the canonical source holds the dispatch table
    pub table_marker: String,
    /// Macro wrapping each property name in the canonical source
    pub entry_macro: String,
    /// Namespace prefix stripped from symbols before alias detection
    pub symbol_prefix: String,
    /// Prefix of the per-property parse handler
    pub handler_prefix: String,
    /// Constant the first string-table entry is anchored to
    pub first_anchor: String,
    /// Constant naming the last string-table entry
    pub last_anchor: String,
    /// Constant naming the sentinel opcode
    pub sentinel: String,
    /// Minimum entries in the canonical and metadata sources
    pub min_properties: usize,
    /// Minimum entries in the keyword source
    pub min_keywords: usize,
    /// Perfect hash construction parameters
    pub hash: HashConfig,
}

/// Perfect hash construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashConfig {
    /// PRNG seed for salt selection
    pub seed: u64,
    /// Salt re-selections before giving up
    pub max_attempts: usize,
    /// Longest accepted key in bytes
    pub max_key_len: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_attempts: 200,
            max_key_len: 63,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            table_marker: "struct prop_table prop_dispatch[".into(),
            entry_macro: "PROPERTY_FUNCS".into(),
            symbol_prefix: "CSS_PROP_".into(),
            handler_prefix: "css__parse_".into(),
            first_anchor: "FIRST_PROP".into(),
            last_anchor: "LAST_PROP".into(),
            sentinel: "PROP_OPCODE_NONE".into(),
            min_properties: 50,
            min_keywords: 10,
            hash: HashConfig::default(),
        }
    }
}

/// Raw TOML structure.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGeneratorConfig {
    table_marker: Option<String>,
    entry_macro: Option<String>,
    symbol_prefix: Option<String>,
    handler_prefix: Option<String>,
    first_anchor: Option<String>,
    last_anchor: Option<String>,
    sentinel: Option<String>,
    min_properties: Option<usize>,
    min_keywords: Option<usize>,
    hash: Option<RawHashConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHashConfig {
    seed: Option<u64>,
    max_attempts: Option<usize>,
    max_key_len: Option<usize>,
}

impl GeneratorConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawGeneratorConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let defaults = Self::default();
        let raw_hash = raw.hash.unwrap_or_default();

        let config = Self {
            table_marker: raw.table_marker.unwrap_or(defaults.table_marker),
            entry_macro: raw.entry_macro.unwrap_or(defaults.entry_macro),
            symbol_prefix: raw.symbol_prefix.unwrap_or(defaults.symbol_prefix),
            handler_prefix: raw.handler_prefix.unwrap_or(defaults.handler_prefix),
            first_anchor: raw.first_anchor.unwrap_or(defaults.first_anchor),
            last_anchor: raw.last_anchor.unwrap_or(defaults.last_anchor),
            sentinel: raw.sentinel.unwrap_or(defaults.sentinel),
            min_properties: raw.min_properties.unwrap_or(defaults.min_properties),
            min_keywords: raw.min_keywords.unwrap_or(defaults.min_keywords),
            hash: HashConfig {
                seed: raw_hash.seed.unwrap_or(defaults.hash.seed),
                max_attempts: raw_hash.max_attempts.unwrap_or(defaults.hash.max_attempts),
                max_key_len: raw_hash.max_key_len.unwrap_or(defaults.hash.max_key_len),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that the generated C would choke on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_marker.trim().is_empty() {
            return Err(ConfigError::Validation("table_marker must not be empty".into()));
        }
        for (key, value) in [
            ("entry_macro", &self.entry_macro),
            ("handler_prefix", &self.handler_prefix),
            ("first_anchor", &self.first_anchor),
            ("last_anchor", &self.last_anchor),
            ("sentinel", &self.sentinel),
        ] {
            check_c_identifier(key, value)?;
        }
        if !self.symbol_prefix.is_empty() {
            check_c_identifier("symbol_prefix", &self.symbol_prefix)?;
        }
        if self.first_anchor == self.last_anchor {
            return Err(ConfigError::Validation(format!(
                "first_anchor and last_anchor are both '{}'",
                self.first_anchor
            )));
        }
        if self.hash.max_attempts == 0 {
            return Err(ConfigError::Validation("hash.max_attempts must be at least 1".into()));
        }
        if self.hash.max_key_len == 0 || self.hash.max_key_len > MAX_KEY_LIMIT {
            return Err(ConfigError::Validation(format!(
                "Invalid hash.max_key_len {}: expected 1..={}",
                self.hash.max_key_len, MAX_KEY_LIMIT
            )));
        }
        Ok(())
    }
}

fn check_c_identifier(key: &str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigError::Validation(format!("{} must not be empty", key)));
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(ConfigError::Validation(format!(
            "Invalid {} '{}': must start with letter or underscore",
            key, value
        )));
    }
    if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        return Err(ConfigError::Validation(format!(
            "Invalid {} '{}': contains invalid character '{}'",
            key, value, c
        )));
    }
    Ok(())
}

/// Errors during config parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
