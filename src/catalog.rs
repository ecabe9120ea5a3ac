use crate::{
    error::AirportError,
    package::{self, Package},
    repository::{CacheEntry, Repository},
};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::ErrorKind,
    path::Path,
};

/// Every package known to the configured repositories. It is expensive to build,
/// so it is kept on disk between runs.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    packages: Vec<Package>,
}

impl Catalog {
    /// Build the catalog from the metadata caches of `repositories`.
    /// `progress` is told about each category as it is read.
    pub fn scan(repositories: &[Repository], mut progress: impl FnMut(&str)) -> crate::Result<Self> {
        let mut packages: BTreeMap<(String, String), Package> = BTreeMap::new();
        for repository in repositories {
            info!("Reading repository {}", repository.name);
            for entry in repository.entries(&mut progress)? {
                let CacheEntry {
                    category,
                    name,
                    version,
                } = entry;
                let package = packages
                    .entry((category.clone(), name.clone()))
                    .or_insert_with(|| Package {
                        category,
                        name,
                        versions: vec![],
                        repos: vec![],
                    });
                if !package.versions.contains(&version) {
                    package.versions.push(version);
                }
                if !package.repos.contains(&repository.name) {
                    package.repos.push(repository.name.clone());
                }
            }
        }
        let mut packages: Vec<Package> = packages.into_iter().map(|(_, package)| package).collect();
        for package in &mut packages {
            package::sort_versions(&mut package.versions);
        }
        info!("Catalog holds {} packages", packages.len());
        Ok(Self { packages })
    }

    /// Create a catalog from already known packages.
    pub fn from_packages(packages: Vec<Package>) -> Self {
        Self { packages }
    }

    /// Load the catalog from disk.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let file = File::open(&path).map_err(|error| AirportError::from_io(error, path.as_ref()))?;
        Ok(serde_cbor::from_reader(file)?)
    }

    /// Save the catalog to the disk, creating the parent directory when needed.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(serde_cbor::to_writer(file, self)?)
    }

    /// Whether the catalog saved at `path` is older than the metadata cache of any of
    /// `repositories`. A missing file is stale.
    pub fn is_stale(path: &Path, repositories: &[Repository]) -> crate::Result<bool> {
        let saved = match fs::metadata(path) {
            Ok(metadata) => metadata.modified()?,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(true),
            Err(error) => return Err(error.into()),
        };
        for repository in repositories {
            if let Some(modified) = repository.last_modified()? {
                if modified > saved {
                    debug!("Repository {} changed after the catalog was saved", repository.name);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Provide an iterator over the packages, sorted by category and name.
    pub fn iter(&self) -> impl Iterator<Item = &Package> + '_ {
        self.packages.iter()
    }

    /// The number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the catalog has no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
