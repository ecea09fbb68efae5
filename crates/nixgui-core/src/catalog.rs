//! Package catalog and search.
//!
//! The mock never talks to a package manager. A [`PackageCatalog`] hands out
//! two fixed lists: what is "installed" and what search can "find". The
//! default [`StaticCatalog`] carries the demo data; a TOML file can replace
//! it via [`StaticCatalog::load`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Shortest accepted search query, in characters.
pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PackageRecord {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Read-only view over the simulated package set.
pub trait PackageCatalog: Send + Sync {
    fn installed(&self) -> &[PackageRecord];

    fn available(&self) -> &[PackageRecord];

    /// Case-insensitive substring search over [`available`](Self::available).
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidQuery`] if `query` is shorter than [`MIN_QUERY_LEN`].
    fn search(&self, query: &str) -> CoreResult<Vec<PackageRecord>> {
        search_packages(self.available(), query)
    }
}

/// Filters `records` to those whose name contains `query`, ignoring case.
pub fn search_packages(records: &[PackageRecord], query: &str) -> CoreResult<Vec<PackageRecord>> {
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(CoreError::InvalidQuery("Query too short".to_string()));
    }

    let needle = query.to_lowercase();
    Ok(records
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .cloned()
        .collect())
}

/// Catalog backed by two in-memory lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCatalog {
    #[serde(default)]
    installed: Vec<PackageRecord>,
    #[serde(default)]
    available: Vec<PackageRecord>,
}

impl Default for StaticCatalog {
    fn default() -> Self {
        Self {
            installed: vec![
                PackageRecord::new("nodejs", "20.5.0"),
                PackageRecord::new("git", "2.42.0"),
                PackageRecord::new("vim", "9.0"),
                PackageRecord::new("firefox", "120.0"),
            ],
            available: vec![
                PackageRecord::new("git", "2.42.0")
                    .with_description("Distributed version control system"),
                PackageRecord::new("git-lfs", "3.4.0").with_description("Git Large File Storage"),
                PackageRecord::new("gitui", "0.24.3").with_description("Terminal UI for git"),
            ],
        }
    }
}

impl StaticCatalog {
    pub fn new(installed: Vec<PackageRecord>, available: Vec<PackageRecord>) -> Self {
        Self {
            installed,
            available,
        }
    }

    /// Loads a catalog from a TOML file with `[[installed]]` and
    /// `[[available]]` tables.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotFound`] if the file does not exist.
    /// - [`CoreError::ConfigParse`] if the TOML is malformed.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        let catalog: Self =
            toml::from_str(&content).map_err(|e| CoreError::ConfigParse(e.to_string()))?;
        tracing::debug!(
            installed = catalog.installed.len(),
            available = catalog.available.len(),
            "Loaded package catalog from {}",
            path.display()
        );
        Ok(catalog)
    }
}

impl PackageCatalog for StaticCatalog {
    fn installed(&self) -> &[PackageRecord] {
        &self.installed
    }

    fn available(&self) -> &[PackageRecord] {
        &self.available
    }
}
