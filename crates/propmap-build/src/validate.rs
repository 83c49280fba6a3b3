//! Consistency checks across the loaded sources.
//!
//! Produces the [`Model`] every later stage reads: canonical records,
//! metadata, keywords and the combined identifier set. Anything that would
//! make two generated tables disagree is fatal here; soft inconsistencies
//! become [`Warning`]s.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use propmap::MAX_OPCODES;

use crate::canonical::CanonicalSource;
use crate::keywords::KeywordSource;
use crate::metadata::MetadataSource;
use crate::model::{MetadataRecord, PropertyRecord, Role, SourceKind, Warning};

/// Fatal consistency errors.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("duplicate property '{name}' in {kind}")]
    DuplicateIdentifier { name: String, kind: SourceKind },

    #[error("{count} canonical properties exceed the opcode space ({limit} opcodes)")]
    OpcodeSpaceExhausted { count: usize, limit: usize },

    #[error("string table has {strings} entries but opcode map has {opcodes}")]
    ArrayLengthMismatch { strings: usize, opcodes: usize },

    #[error("opcode map entry for '{name}' holds index {index}, which is not a canonical index")]
    InvalidOpcode { name: String, index: usize },
}

/// The validated view of all three sources.
#[derive(Debug, Clone)]
pub struct Model {
    properties: Vec<PropertyRecord>,
    metadata: Vec<MetadataRecord>,
    canonical_index: HashMap<String, usize>,
    metadata_index: HashMap<String, usize>,
    identifiers: Vec<String>,
    keywords: Vec<String>,
    warnings: Vec<Warning>,
}

impl Model {
    /// Canonical records; position is the canonical index.
    pub fn properties(&self) -> &[PropertyRecord] {
        &self.properties
    }

    /// Metadata records in file order.
    pub fn metadata(&self) -> &[MetadataRecord] {
        &self.metadata
    }

    pub fn metadata_for(&self, name: &str) -> Option<&MetadataRecord> {
        self.metadata_index.get(name).map(|&i| &self.metadata[i])
    }

    pub fn canonical_index(&self, name: &str) -> Option<usize> {
        self.canonical_index.get(name).copied()
    }

    /// Combined identifier set: canonical names, then shorthands and aliases
    /// that are not dispatched, in metadata order. Unsorted.
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Every recoverable condition seen so far, loaders first.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

/// Cross-check the loaded sources and build the combined identifier set.
pub fn validate(
    canonical: CanonicalSource,
    metadata: MetadataSource,
    keywords: KeywordSource,
) -> Result<Model, ValidateError> {
    let properties = canonical.into_records();
    let (metadata, mut warnings) = metadata.into_parts();
    let (keywords, keyword_warnings) = keywords.into_parts();
    warnings.extend(keyword_warnings);

    if properties.len() > MAX_OPCODES {
        return Err(ValidateError::OpcodeSpaceExhausted {
            count: properties.len(),
            limit: MAX_OPCODES,
        });
    }

    let mut canonical_index = HashMap::with_capacity(properties.len());
    for (index, record) in properties.iter().enumerate() {
        if canonical_index.insert(record.name.clone(), index).is_some() {
            return Err(ValidateError::DuplicateIdentifier {
                name: record.name.clone(),
                kind: SourceKind::Canonical,
            });
        }
    }

    let mut metadata_index = HashMap::with_capacity(metadata.len());
    for (i, record) in metadata.iter().enumerate() {
        if metadata_index.insert(record.name.clone(), i).is_some() {
            return Err(ValidateError::DuplicateIdentifier {
                name: record.name.clone(),
                kind: SourceKind::Metadata,
            });
        }
    }

    // Dispatched properties become enum constants; their symbols must not clash.
    let mut symbols = HashSet::new();
    for record in &properties {
        if let Some(&i) = metadata_index.get(&record.name)
            && !symbols.insert(metadata[i].symbol.as_str())
        {
            return Err(ValidateError::DuplicateIdentifier {
                name: metadata[i].symbol.clone(),
                kind: SourceKind::Metadata,
            });
        }
    }

    let mut identifiers: Vec<String> = properties.iter().map(|r| r.name.clone()).collect();
    identifiers.extend(
        metadata
            .iter()
            .filter(|m| m.role.is_shorthand() || m.role.is_alias())
            .filter(|m| !canonical_index.contains_key(&m.name))
            .map(|m| m.name.clone()),
    );

    let mut soft = Vec::new();
    for record in &metadata {
        match &record.role {
            Role::Longhand { .. } if !canonical_index.contains_key(&record.name) => {
                soft.push(Warning::MetadataOnlyLonghand {
                    name: record.name.clone(),
                    line: record.line,
                });
            }
            Role::Alias { target }
                if !canonical_index.contains_key(&record.name)
                    && !canonical_index.contains_key(target) =>
            {
                soft.push(Warning::AliasTargetNotDispatched {
                    name: record.name.clone(),
                    target: target.clone(),
                });
            }
            _ => {}
        }

        if let (Some(hint), Some(&index)) =
            (record.inherited_hint, canonical_index.get(&record.name))
            && hint != properties[index].inherited
        {
            soft.push(Warning::InheritedMismatch {
                name: record.name.clone(),
                canonical: properties[index].inherited,
                metadata: hint,
            });
        }
    }
    for warning in &soft {
        warn!("{}", warning);
    }
    warnings.extend(soft);

    info!(
        "Validation passed: {} properties, no duplicates",
        identifiers.len()
    );

    Ok(Model {
        properties,
        metadata,
        canonical_index,
        metadata_index,
        identifiers,
        keywords,
        warnings,
    })
}
