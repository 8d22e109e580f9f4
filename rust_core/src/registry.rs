//! Athlete registry snapshots.
//!
//! This module provides:
//! - `Registry`: an immutable, ordered snapshot of registry records
//! - CSV and JSON loaders with schema validation
//! - `RegistryHandle`: the shared current snapshot, swapped atomically on reload
//!
//! Matches hold an `Arc<Registry>` for their whole run, so a reload never
//! changes the records under an in-flight match.

use crate::error::RegistryError;
use crate::league_config::is_known_league;
use crate::matching::match_lead;
use crate::models::{Lead, MatchResult, RegistryRecord};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Required columns, each with the alternative header names accepted for it.
const REQUIRED_COLUMNS: &[&[&str]] = &[
    &["name"],
    &["league"],
    &["sport"],
    &["date_of_birth", "dob"],
    &["external_id", "league_id"],
    &["external_id_kind", "league_id_property"],
    &["proof_url", "proof_wikidata_url"],
];

#[derive(Debug, Clone)]
pub struct Registry {
    records: Vec<RegistryRecord>,
    loaded_at: DateTime<Utc>,
    source: Option<PathBuf>,
}

impl Registry {
    pub fn new(records: Vec<RegistryRecord>) -> Self {
        warn_unknown_leagues(&records);
        Self {
            records,
            loaded_at: Utc::now(),
            source: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Parse a CSV registry. The header row is validated before any row is read.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, RegistryError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(reader);

        let headers = rdr.headers()?.clone();
        validate_columns(headers.iter())?;

        let mut records = Vec::new();
        for (i, row) in rdr.deserialize::<RegistryRecord>().enumerate() {
            // +2: one-based, after the header line
            let record = row
                .map_err(|e| RegistryError::InvalidSchema(format!("row {}: {}", i + 2, e)))?;
            records.push(record);
        }

        Ok(Self::new(records))
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(content: &str) -> Result<Self, RegistryError> {
        let records: Vec<RegistryRecord> = serde_json::from_str(content).map_err(|e| {
            if e.is_data() {
                RegistryError::InvalidSchema(e.to_string())
            } else {
                RegistryError::Json(e)
            }
        })?;
        Ok(Self::new(records))
    }

    /// Load a registry file, choosing the format by extension (`.csv`, `.json`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let mut registry = match ext.as_str() {
            "csv" => Self::from_csv_reader(fs::File::open(path)?)?,
            "json" => Self::from_json_str(&fs::read_to_string(path)?)?,
            _ => return Err(RegistryError::UnsupportedFormat(path.display().to_string())),
        };
        registry.source = Some(path.to_path_buf());

        info!(
            "Loaded registry from {}: {} records",
            path.display(),
            registry.len()
        );
        Ok(registry)
    }

    pub fn records(&self) -> &[RegistryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Record count per upper-cased league code.
    pub fn league_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.league.to_uppercase()).or_insert(0) += 1;
        }
        counts
    }

    pub fn match_lead(&self, lead: &Lead, top_k: usize) -> MatchResult {
        match_lead(&self.records, lead, top_k)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

fn validate_columns<'a>(headers: impl Iterator<Item = &'a str>) -> Result<(), RegistryError> {
    // Exact names: row deserialization matches fields case-sensitively.
    let present: BTreeSet<&str> = headers.collect();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|names| !names.iter().any(|n| present.contains(*n)))
        .map(|names| names[0])
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::missing_columns(&missing))
    }
}

fn warn_unknown_leagues(records: &[RegistryRecord]) {
    let unknown: BTreeSet<&str> = records
        .iter()
        .map(|r| r.league.as_str())
        .filter(|l| !is_known_league(l))
        .collect();
    for league in unknown {
        warn!("Registry contains unknown league '{}'; rows kept", league);
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// Holder of the current registry snapshot.
///
/// Readers take a cheap `Arc` clone; reloads build the new registry outside
/// the lock and swap it in. A failed reload leaves the current snapshot.
#[derive(Debug, Default)]
pub struct RegistryHandle {
    current: RwLock<Arc<Registry>>,
}

impl RegistryHandle {
    pub fn new(registry: Registry) -> Self {
        Self {
            current: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        Ok(Self::new(Registry::load(path)?))
    }

    pub fn snapshot(&self) -> Arc<Registry> {
        self.current.read().clone()
    }

    /// Swap in `registry`, returning the previous snapshot.
    pub fn replace(&self, registry: Registry) -> Arc<Registry> {
        let next = Arc::new(registry);
        std::mem::replace(&mut *self.current.write(), next)
    }

    /// Reload from `path`, falling back to the current snapshot's source path.
    pub fn reload_from(&self, path: Option<&Path>) -> Result<Arc<Registry>, RegistryError> {
        let path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => self
                .snapshot()
                .source_path()
                .map(Path::to_path_buf)
                .ok_or_else(|| {
                    RegistryError::UnsupportedFormat("no registry path to reload from".to_string())
                })?,
        };

        let installed = Arc::new(Registry::load(&path)?);
        let previous = std::mem::replace(&mut *self.current.write(), installed.clone());
        info!(
            "Registry reloaded from {}: {} -> {} records",
            path.display(),
            previous.len(),
            installed.len()
        );
        Ok(installed)
    }
}
