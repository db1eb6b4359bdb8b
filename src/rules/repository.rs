use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::definition::{ArchetypeDefinition, DefinitionRecord};
use crate::errors::{MetagameError, MetagameResult};
use crate::loader::{list_json_files, read_text};

/// Definitions of one format, split into primary and fallback lists
#[derive(Debug, Clone)]
pub struct RuleSet {
    format: String,
    source: PathBuf,
    primary: Vec<ArchetypeDefinition>,
    fallback: Vec<ArchetypeDefinition>,
}

impl RuleSet {
    pub fn from_json(format: &str, json: &str, source: &Path) -> MetagameResult<Self> {
        let records: Vec<DefinitionRecord> =
            serde_json::from_str(json).map_err(|e| MetagameError::rule_load(source, e))?;
        Self::from_records(format, records, source)
    }

    pub fn from_records(
        format: &str,
        records: Vec<DefinitionRecord>,
        source: &Path,
    ) -> MetagameResult<Self> {
        let format = format.trim().to_lowercase();
        let mut definitions = Vec::new();

        for record in records {
            let flattened = record
                .flatten(&format)
                .map_err(|reason| MetagameError::rule_load(source, reason))?;
            definitions.extend(flattened);
        }

        check_unique_names(&definitions, source)?;

        let (mut primary, mut fallback): (Vec<_>, Vec<_>) =
            definitions.into_iter().partition(|d| !d.is_fallback);
        primary.sort_by(|a, b| a.precedence(b));
        fallback.sort_by(|a, b| a.precedence(b));

        Ok(Self {
            format,
            source: source.to_path_buf(),
            primary,
            fallback,
        })
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Non-fallback definitions in precedence order
    pub fn primary(&self) -> &[ArchetypeDefinition] {
        &self.primary
    }

    pub fn fallback(&self) -> &[ArchetypeDefinition] {
        &self.fallback
    }

    /// All definitions: primaries first, fallbacks last
    pub fn definitions(&self) -> impl Iterator<Item = &ArchetypeDefinition> {
        self.primary.iter().chain(self.fallback.iter())
    }

    pub fn len(&self) -> usize {
        self.primary.len() + self.fallback.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_unique_names(definitions: &[ArchetypeDefinition], source: &Path) -> MetagameResult<()> {
    let mut seen = HashSet::new();
    for definition in definitions {
        if !seen.insert(definition.name.to_lowercase()) {
            return Err(MetagameError::rule_load(
                source,
                format!("duplicate definition name {}", definition.name),
            ));
        }
    }
    Ok(())
}

/// A rule file that could not be loaded, kept so lookups for its format fail
#[derive(Debug, Clone)]
struct LoadFailure {
    path: PathBuf,
    reason: String,
}

/// Archetype rules for every known format. Immutable after loading.
#[derive(Debug, Clone, Default)]
pub struct RuleRepository {
    rules_dir: PathBuf,
    formats: HashMap<String, RuleSet>,
    failures: HashMap<String, LoadFailure>,
}

impl RuleRepository {
    /// Load `<format>.json` files from a directory
    ///
    /// A malformed file only poisons its own format: the error is kept and
    /// returned by `get_definitions` for that format. An unreadable directory
    /// fails the whole load.
    pub fn load(rules_dir: &Path) -> MetagameResult<Self> {
        let files = list_json_files(rules_dir)
            .map_err(|e| MetagameError::rule_load(rules_dir, e))?;

        let mut formats = HashMap::new();
        let mut failures = HashMap::new();
        for path in files {
            let format = match format_from_path(&path) {
                Ok(format) => format,
                Err(e) => {
                    warn!("  ⚠ Skipping rule file: {}", e);
                    continue;
                }
            };

            match Self::load_file(&path) {
                Ok(rule_set) => {
                    info!(
                        "  → Loaded {} definitions for {} from {}",
                        rule_set.len(),
                        rule_set.format(),
                        path.display()
                    );
                    formats.insert(format, rule_set);
                }
                Err(e) => {
                    warn!("  ⚠ Rules for {} unavailable: {}", format, e);
                    let failure = match e {
                        MetagameError::RuleLoad { path, reason } => LoadFailure { path, reason },
                        other => LoadFailure {
                            path: path.clone(),
                            reason: other.to_string(),
                        },
                    };
                    failures.insert(format, failure);
                }
            }
        }

        Ok(Self {
            rules_dir: rules_dir.to_path_buf(),
            formats,
            failures,
        })
    }

    pub fn load_file(path: &Path) -> MetagameResult<RuleSet> {
        let format = format_from_path(path)?;
        let json = read_text(path).map_err(|e| MetagameError::rule_load(path, e))?;
        RuleSet::from_json(&format, &json, path)
    }

    /// Ordered definitions of a format
    ///
    /// A format whose rule file is missing or failed to load is a load error.
    pub fn get_definitions(&self, format: &str) -> MetagameResult<&RuleSet> {
        let format = format.trim().to_lowercase();
        if let Some(failure) = self.failures.get(&format) {
            return Err(MetagameError::rule_load(&failure.path, &failure.reason));
        }
        self.formats.get(&format).ok_or_else(|| {
            MetagameError::rule_load(
                self.rules_dir.join(format!("{}.json", format)),
                "no rule file for this format",
            )
        })
    }

    /// Formats with usable rules
    pub fn formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.formats.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }

    /// Formats whose rule file failed to load
    pub fn failed_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.failures.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }
}

fn format_from_path(path: &Path) -> MetagameResult<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.trim().to_lowercase())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| MetagameError::rule_load(path, "cannot derive format from file name"))
}
