use crate::{
    error::AirportError,
    package::{split_cpv, split_pf},
    useflag::FlagDescriptions,
};
use log::{debug, warn};
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};
use walkdir::WalkDir;

/// Where the metadata cache lives inside a repository.
const MD5_CACHE: &str = "metadata/md5-cache";
/// Touched by `emerge --sync` whenever the repository is updated.
const TIMESTAMP: &str = "metadata/timestamp.chk";
/// The `KEY=` of the declared-flags line in a cache entry.
const IUSE_KEY: &str = "IUSE=";

/// A version of a package found in a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// The package's category.
    pub category: String,
    /// The package's name.
    pub name: String,
    /// The version of this entry.
    pub version: String,
}

/// An ebuild repository on disk, such as `/var/db/repos/gentoo`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    /// The name from `profiles/repo_name`.
    pub name: String,
    /// The repository's root directory.
    pub location: PathBuf,
}

impl Repository {
    /// Open the repository at `location`.
    pub fn open(location: impl Into<PathBuf>) -> crate::Result<Self> {
        let location = location.into();
        if !location.is_dir() {
            return Err(AirportError::FileNotFound(location));
        }
        let name = match fs::read_to_string(location.join("profiles/repo_name")) {
            Ok(content) => content.lines().next().map(str::trim).map(String::from),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => None,
            Err(error) => return Err(error.into()),
        };
        let name = match name.filter(|name| !name.is_empty()) {
            Some(name) => name,
            None => location
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| location.display().to_string()),
        };
        Ok(Self { name, location })
    }

    /// List every version in the metadata cache. `progress` is called with each category.
    pub fn entries(&self, mut progress: impl FnMut(&str)) -> crate::Result<Vec<CacheEntry>> {
        let cache = self.location.join(MD5_CACHE);
        if !cache.is_dir() {
            warn!("Repository {} has no metadata cache", self.name);
            return Ok(vec![]);
        }
        let mut entries = Vec::new();
        let walker = WalkDir::new(&cache)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy();
            if entry.depth() == 1 {
                if entry.file_type().is_dir() {
                    progress(file_name.as_ref());
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let category = match entry.path().parent().and_then(Path::file_name) {
                Some(category) => category.to_string_lossy().into_owned(),
                None => continue,
            };
            match split_pf(&file_name) {
                Some((name, version)) => entries.push(CacheEntry {
                    category,
                    name: name.to_owned(),
                    version: version.to_owned(),
                }),
                None => debug!("Skipping cache entry {}/{}", category, file_name),
            }
        }
        debug!("Repository {} has {} cache entries", self.name, entries.len());
        Ok(entries)
    }

    /// When the metadata cache last changed: the newest of `metadata/timestamp.chk`,
    /// the cache directory and its category directories. Adding or removing a
    /// version touches its category directory.
    pub fn last_modified(&self) -> crate::Result<Option<SystemTime>> {
        let mut newest = modified(&self.location.join(TIMESTAMP))?;
        let cache = self.location.join(MD5_CACHE);
        if cache.is_dir() {
            for entry in WalkDir::new(&cache).max_depth(1) {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    newest = newest.max(Some(entry.metadata()?.modified()?));
                }
            }
        }
        Ok(newest)
    }

    /// The cache entry file of `category/name-version`.
    fn cache_entry(&self, cpv: &str) -> crate::Result<PathBuf> {
        let (category, name, version) = split_cpv(cpv)?;
        Ok(self
            .location
            .join(MD5_CACHE)
            .join(category)
            .join(format!("{}-{}", name, version)))
    }

    /// Whether the repository has a cache entry for `cpv`.
    pub fn has(&self, cpv: &str) -> bool {
        self.cache_entry(cpv).map_or(false, |path| path.is_file())
    }

    /// The raw `IUSE` of `cpv`. Entries without an `IUSE` line declare no flags.
    pub fn declared_flags(&self, cpv: &str) -> crate::Result<String> {
        let path = self.cache_entry(cpv)?;
        let content = fs::read_to_string(&path).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => AirportError::PackageNotFound(cpv.to_owned()),
            _ => AirportError::IOError(error),
        })?;
        Ok(content
            .lines()
            .find_map(|line| line.strip_prefix(IUSE_KEY))
            .unwrap_or_default()
            .to_owned())
    }

    /// Read `profiles/use.desc` and `profiles/use.local.desc`. Missing files are empty tables.
    pub fn flag_descriptions(&self) -> crate::Result<FlagDescriptions> {
        let mut descriptions = FlagDescriptions::default();
        if let Some(content) = read_optional(&self.location.join("profiles/use.desc"))? {
            descriptions.parse_global(&content);
        }
        if let Some(content) = read_optional(&self.location.join("profiles/use.local.desc"))? {
            descriptions.parse_local(&content);
        }
        Ok(descriptions)
    }
}

fn modified(path: &Path) -> crate::Result<Option<SystemTime>> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(Some(metadata.modified()?)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error.into()),
    }
}

fn read_optional(path: &Path) -> crate::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} does not exist", path.display());
            Ok(None)
        }
        Err(error) => Err(AirportError::from_io(error, path)),
    }
}

/// Find the first repository holding `cpv` and read its `IUSE`.
pub fn declared_flags(repositories: &[Repository], cpv: &str) -> crate::Result<String> {
    match repositories.iter().find(|repository| repository.has(cpv)) {
        Some(repository) => repository.declared_flags(cpv),
        None => Err(AirportError::PackageNotFound(cpv.to_owned())),
    }
}

/// Flag descriptions of every repository, earlier repositories taking precedence.
pub fn flag_descriptions(repositories: &[Repository]) -> crate::Result<FlagDescriptions> {
    let mut descriptions = FlagDescriptions::default();
    for repository in repositories {
        descriptions.merge(repository.flag_descriptions()?);
    }
    Ok(descriptions)
}
