//! Keyword source parser: one `[A-Z_]+` keyword per line.

use std::collections::HashSet;

use tracing::warn;

use crate::config::GeneratorConfig;
use crate::model::{SourceError, SourceKind, Warning, is_keyword};

#[derive(Debug, Clone, Default)]
pub struct KeywordSource {
    keywords: Vec<String>,
    warnings: Vec<Warning>,
}

impl KeywordSource {
    pub fn parse(content: &str, config: &GeneratorConfig) -> Result<Self, SourceError> {
        let mut source = Self::default();
        let mut seen = HashSet::new();

        for (idx, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let reason = if !is_keyword(line) {
                format!("Invalid keyword '{}'", line)
            } else if !seen.insert(line) {
                format!("Duplicate keyword '{}'", line)
            } else {
                source.keywords.push(line.to_string());
                continue;
            };

            let warning = Warning::SkippedLine {
                kind: SourceKind::Keywords,
                line: idx + 1,
                reason,
            };
            warn!("{}", warning);
            source.warnings.push(warning);
        }

        if source.keywords.len() < config.min_keywords {
            return Err(SourceError::BelowMinimumCount {
                kind: SourceKind::Keywords,
                found: source.keywords.len(),
                minimum: config.min_keywords,
            });
        }

        Ok(source)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Warning>) {
        (self.keywords, self.warnings)
    }
}
