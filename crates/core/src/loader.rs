//! Filesystem-backed reference table loading and snapshot store.
//!
//! Country tables map a label to a list of prefixes, city tables map a label
//! to a single prefix string (a list is accepted too). Both keep file order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::TablesConfig;
use crate::error::TableError;
use crate::prefix::{PrefixTable, ReferenceTables, TableKind};

/// Result alias for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Deserialize)]
#[serde(untagged)]
enum Prefixes {
    One(String),
    Many(Vec<String>),
}

impl Prefixes {
    fn into_vec(self) -> Vec<String> {
        match self {
            Prefixes::One(p) => vec![p],
            Prefixes::Many(ps) => ps,
        }
    }
}

/// Reads the country and city tables from their JSON files.
#[derive(Debug, Clone)]
pub struct TableLoader {
    country_path: PathBuf,
    city_path: PathBuf,
}

impl TableLoader {
    pub fn new(country_path: impl Into<PathBuf>, city_path: impl Into<PathBuf>) -> Self {
        Self {
            country_path: country_path.into(),
            city_path: city_path.into(),
        }
    }

    pub fn from_config(config: &TablesConfig) -> Self {
        Self::new(config.country_path(), config.city_path())
    }

    pub fn path(&self, kind: TableKind) -> &Path {
        match kind {
            TableKind::Country => &self.country_path,
            TableKind::City => &self.city_path,
        }
    }

    /// Load one table; a missing file is [`TableError::Missing`].
    pub fn load_table(&self, kind: TableKind) -> Result<PrefixTable> {
        let path = self.path(kind);
        if !path.exists() {
            return Err(TableError::Missing {
                kind,
                path: path.to_path_buf(),
            });
        }
        let table = parse_table_file(path)?;
        info!(
            kind = %kind,
            path = %path.display(),
            labels = table.len(),
            prefixes = table.prefix_count(),
            "loaded reference table"
        );
        Ok(table)
    }

    /// Load both tables, failing on the first one that cannot be read.
    pub fn load_strict(&self) -> Result<ReferenceTables> {
        Ok(ReferenceTables::new(
            self.load_table(TableKind::Country)?,
            self.load_table(TableKind::City)?,
        ))
    }

    /// Load both tables, leaving out any that cannot be read.
    pub fn load_lenient(&self) -> ReferenceTables {
        let load = |kind| match self.load_table(kind) {
            Ok(table) => Some(table),
            Err(e) => {
                warn!(kind = %kind, error = %e, "reference table unavailable");
                None
            }
        };
        ReferenceTables {
            country: load(TableKind::Country),
            city: load(TableKind::City),
        }
    }
}

/// Parse a `label -> prefix | [prefix, ...]` JSON file.
pub fn parse_table_file(path: &Path) -> Result<PrefixTable> {
    let text = fs::read_to_string(path).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: IndexMap<String, Prefixes> =
        serde_json::from_str(&text).map_err(|source| TableError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(PrefixTable::new(
        raw.into_iter().map(|(label, prefixes)| (label, prefixes.into_vec())),
    ))
}

/// Holds the current table snapshot and swaps it on reload.
///
/// Readers clone the inner `Arc`, so a computation that started before a
/// reload keeps working against the tables it started with.
pub struct TableStore {
    loader: TableLoader,
    strict: bool,
    current: RwLock<Arc<ReferenceTables>>,
}

impl TableStore {
    /// Load tables and build a store. In strict mode a missing table is fatal.
    pub fn open(loader: TableLoader, strict: bool) -> Result<Self> {
        let tables = Self::load(&loader, strict)?;
        Ok(Self {
            loader,
            strict,
            current: RwLock::new(Arc::new(tables)),
        })
    }

    fn load(loader: &TableLoader, strict: bool) -> Result<ReferenceTables> {
        if strict {
            loader.load_strict()
        } else {
            Ok(loader.load_lenient())
        }
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<ReferenceTables> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Re-read the table files and swap in the new snapshot.
    ///
    /// On error the previous snapshot stays in place.
    pub fn reload(&self) -> Result<Arc<ReferenceTables>> {
        let fresh = Arc::new(Self::load(&self.loader, self.strict)?);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&fresh);
        info!(missing = ?fresh.missing(), "reference tables reloaded");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const COUNTRIES: &str = r#"{"Russia": ["+7"], "Kazakhstan": ["+77", "+76"]}"#;
    const CITIES: &str = r#"{"Almaty": "727", "Astana": ["7172"]}"#;

    fn temp_loader(countries: Option<&str>, cities: Option<&str>) -> (TempDir, TableLoader) {
        let dir = TempDir::new().expect("create tempdir");
        let country_path = dir.path().join("country_codes.json");
        let city_path = dir.path().join("city_codes.json");
        if let Some(text) = countries {
            fs::write(&country_path, text).unwrap();
        }
        if let Some(text) = cities {
            fs::write(&city_path, text).unwrap();
        }
        (dir, TableLoader::new(country_path, city_path))
    }

    #[test]
    fn loads_both_table_shapes() {
        let (_dir, loader) = temp_loader(Some(COUNTRIES), Some(CITIES));
        let tables = loader.load_strict().unwrap();

        let country = tables.country.as_ref().unwrap();
        assert_eq!(country.labels().collect::<Vec<_>>(), vec!["Russia", "Kazakhstan"]);
        assert_eq!(country.label_for("+77011234567"), Some("Kazakhstan"));
        assert_eq!(country.label_for("+79161234567"), Some("Russia"));

        let city = tables.city.as_ref().unwrap();
        assert_eq!(city.label_for("7172555555"), Some("Astana"));
        assert_eq!(city.prefixes("Almaty"), Some(&["727".to_string()][..]));
    }

    #[test]
    fn strict_load_reports_missing_table() {
        let (_dir, loader) = temp_loader(Some(COUNTRIES), None);
        match loader.load_strict() {
            Err(TableError::Missing { kind, .. }) => assert_eq!(kind, TableKind::City),
            other => panic!("expected missing city table, got {:?}", other),
        }
    }

    #[test]
    fn lenient_load_keeps_available_tables() {
        let (_dir, loader) = temp_loader(None, Some(CITIES));
        let tables = loader.load_lenient();
        assert!(tables.country.is_none());
        assert!(tables.city.is_some());
        assert_eq!(tables.missing(), vec![TableKind::Country]);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let (_dir, loader) = temp_loader(Some("{not json"), Some(CITIES));
        assert!(matches!(
            loader.load_table(TableKind::Country),
            Err(TableError::Parse { .. })
        ));
    }

    #[test]
    fn reload_swaps_snapshot_without_touching_old_one() {
        let (dir, loader) = temp_loader(Some(COUNTRIES), Some(CITIES));
        let store = TableStore::open(loader, true).unwrap();
        let before = store.snapshot();

        fs::write(dir.path().join("country_codes.json"), r#"{"Other": ["+7"]}"#).unwrap();
        store.reload().unwrap();
        let after = store.snapshot();

        assert_eq!(before.country.as_ref().unwrap().label_for("+79"), Some("Russia"));
        assert_eq!(after.country.as_ref().unwrap().label_for("+79"), Some("Other"));
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let (dir, loader) = temp_loader(Some(COUNTRIES), Some(CITIES));
        let store = TableStore::open(loader, true).unwrap();

        fs::remove_file(dir.path().join("city_codes.json")).unwrap();
        assert!(store.reload().is_err());
        assert!(store.snapshot().city.is_some());
    }
}
