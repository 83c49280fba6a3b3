//! Build-time property metadata compiler.
//!
//! This crate turns three hand-maintained sources into five generated C
//! fragments:
//!
//! - a *canonical order source* (the dispatch table, e.g. `dispatch.c`)
//!   that fixes the order and inherited flag of every dispatched property
//! - a *metadata source* (`properties.gen`) mapping names to enum symbols
//!   and roles (longhand, shorthand, alias, generic)
//! - a *keyword source* (`keywords.gen`)
//!
//! The pipeline is linear: load, validate, synthesize tables, build the
//! perfect hash, render. Nothing is written unless every stage succeeds.
//!
//! # Usage
//!
//! ```ignore
//! use propmap_build::{GeneratorConfig, Inputs, Outputs, generate};
//!
//! let inputs = Inputs::new("src/select/dispatch.c", "properties.gen", "keywords.gen");
//! let outputs = Outputs::in_dir("build/gen");
//! let summary = generate(&inputs, &outputs, &GeneratorConfig::default())?;
//! println!("{} properties", summary.identifiers);
//! ```
//!
//! # Outputs
//!
//! | Fragment | Content |
//! |----------|---------|
//! | enum | `SYMBOL = 0xNNN,` per dispatched property, valued by canonical position |
//! | dispatch | `{ ENTRY_MACRO(name), flag, }` rows in canonical order |
//! | propstrings | alphabetical string enum anchored at `FIRST_PROP` / `LAST_PROP` |
//! | string map | `SMAP("css-name"),` in the same order |
//! | hash table | `G`, `S1`, `S2`, slot table, hash/lookup functions, opcode map |

mod canonical;
mod codegen;
mod config;
mod keywords;
mod metadata;
mod model;
mod output;
mod phf;
mod tables;
mod validate;

pub use canonical::CanonicalSource;
pub use codegen::{Artifacts, SourceNames, TOOL_NAME};
pub use config::{ConfigError, DEFAULT_SEED, GeneratorConfig, HashConfig};
pub use keywords::KeywordSource;
pub use metadata::MetadataSource;
pub use model::{MetadataRecord, PropertyRecord, Role, SourceError, SourceKind, Warning};
pub use output::{OutputError, WriteReport};
pub use phf::{HashError, PerfectHash, PerfectHashBuilder, Slot};
pub use tables::{
    DispatchRow, EnumEntry, OpcodeEntry, StringEntry, StringTable, Tables, assign_enums,
    build_dispatch, build_string_table, map_opcodes, synthesize,
};
pub use validate::{Model, ValidateError, validate};

use std::path::{Path, PathBuf};

use tracing::info;

/// Paths of the three input sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub canonical: PathBuf,
    pub metadata: PathBuf,
    pub keywords: PathBuf,
}

impl Inputs {
    pub fn new(
        canonical: impl Into<PathBuf>,
        metadata: impl Into<PathBuf>,
        keywords: impl Into<PathBuf>,
    ) -> Self {
        Self {
            canonical: canonical.into(),
            metadata: metadata.into(),
            keywords: keywords.into(),
        }
    }

    /// File names quoted in the generated banners.
    pub fn source_names(&self) -> SourceNames {
        let name = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string())
        };
        SourceNames {
            canonical: name(&self.canonical),
            metadata: name(&self.metadata),
            keywords: name(&self.keywords),
        }
    }
}

/// Paths of the five generated fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub enum_fragment: PathBuf,
    pub dispatch: PathBuf,
    pub propstrings: PathBuf,
    pub string_map: PathBuf,
    pub hash_table: PathBuf,
}

impl Outputs {
    /// Conventional file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            enum_fragment: dir.join("properties_enum.inc"),
            dispatch: dir.join("dispatch_generated.inc"),
            propstrings: dir.join("propstrings_enum.inc"),
            string_map: dir.join("propstrings_strings.inc"),
            hash_table: dir.join("property_hash_table.inc"),
        }
    }

    /// Paths in output argument order.
    pub fn paths(&self) -> [&Path; 5] {
        [
            self.enum_fragment.as_path(),
            self.dispatch.as_path(),
            self.propstrings.as_path(),
            self.string_map.as_path(),
            self.hash_table.as_path(),
        ]
    }
}

/// Everything the pipeline produced in memory.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub model: Model,
    pub tables: Tables,
    pub hash: PerfectHash,
    pub artifacts: Artifacts,
}

/// Outcome of a successful [`generate`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Entries in the canonical order source
    pub properties: usize,
    /// Metadata records kept (generic ones excluded)
    pub metadata: usize,
    pub keywords: usize,
    /// Entries in the string table
    pub identifiers: usize,
    /// `|G|`
    pub table_size: usize,
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub warnings: Vec<Warning>,
}

/// Run the pipeline on in-memory sources. Writes nothing.
pub fn compile(
    canonical: &str,
    metadata: &str,
    keywords: &str,
    config: &GeneratorConfig,
    sources: &SourceNames,
) -> Result<Compiled, GenerateError> {
    info!("Parsing {} for property order...", sources.canonical);
    let canonical = CanonicalSource::parse(canonical, config)?;
    info!(
        "  Found {} properties in {}",
        canonical.len(),
        sources.canonical
    );

    info!("Parsing {} for metadata...", sources.metadata);
    let metadata = MetadataSource::parse(metadata, config)?;
    info!(
        "  Found {} properties in {} ({} generic excluded)",
        metadata.len(),
        sources.metadata,
        metadata.excluded()
    );

    info!("Parsing {} for keywords...", sources.keywords);
    let keywords = KeywordSource::parse(keywords, config)?;
    info!(
        "  Found {} keywords in {}",
        keywords.len(),
        sources.keywords
    );

    info!("Validating property indexes...");
    let model = validate(canonical, metadata, keywords)?;
    let tables = synthesize(&model)?;

    info!("Generating perfect hash table...");
    let slots = tables
        .strings
        .entries()
        .iter()
        .map(|e| Slot::new(&e.css_name, format!("{}{}", config.handler_prefix, e.name)))
        .collect();
    let hash = PerfectHashBuilder::new(config.hash).build(slots)?;
    info!(
        "  {} keys in {} slots, salt length {}",
        hash.len(),
        hash.table_size(),
        hash.s1.len()
    );

    let artifacts = Artifacts::render(&tables, &hash, config, sources);
    Ok(Compiled {
        model,
        tables,
        hash,
        artifacts,
    })
}

/// Read the inputs, compile them and write the five fragments.
///
/// All inputs are read before any parsing; all outputs are rendered before
/// any is written.
///
/// # Errors
///
/// Returns an error if:
/// - an input cannot be read
/// - an input is structurally wrong, truncated or inconsistent
/// - no perfect hash can be constructed
/// - an output cannot be staged or persisted
pub fn generate(
    inputs: &Inputs,
    outputs: &Outputs,
    config: &GeneratorConfig,
) -> Result<Summary, GenerateError> {
    let canonical = read_source(SourceKind::Canonical, &inputs.canonical)?;
    let metadata = read_source(SourceKind::Metadata, &inputs.metadata)?;
    let keywords = read_source(SourceKind::Keywords, &inputs.keywords)?;

    let compiled = compile(
        &canonical,
        &metadata,
        &keywords,
        config,
        &inputs.source_names(),
    )?;

    let pairs: Vec<(&Path, &str)> = outputs
        .paths()
        .into_iter()
        .zip(compiled.artifacts.as_array())
        .collect();
    let report = output::write_all(&pairs)?;
    for path in &report.written {
        info!("Generated: {}", path.display());
    }
    for path in &report.unchanged {
        info!("Unchanged: {}", path.display());
    }

    Ok(Summary {
        properties: compiled.model.properties().len(),
        metadata: compiled.model.metadata().len(),
        keywords: compiled.model.keywords().len(),
        identifiers: compiled.tables.strings.len(),
        table_size: compiled.hash.table_size(),
        written: report.written,
        unchanged: report.unchanged,
        warnings: compiled.model.warnings().to_vec(),
    })
}

fn read_source(kind: SourceKind, path: &Path) -> Result<String, SourceError> {
    std::fs::read_to_string(path).map_err(|error| SourceError::MissingInput {
        kind,
        path: path.to_path_buf(),
        error,
    })
}

/// Errors that can occur during generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// Invalid generator configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Unreadable, malformed or truncated input
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Inputs disagree with each other
    #[error(transparent)]
    Validate(#[from] ValidateError),
    /// No perfect hash found
    #[error(transparent)]
    Hash(#[from] HashError),
    /// An output could not be written
    #[error(transparent)]
    Io(#[from] OutputError),
}
