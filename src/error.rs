use std::path::PathBuf;
use thiserror::Error;

/// Errors that can be produced by airport.
#[derive(Debug, Error)]
pub enum AirportError {
    /// No package in the catalog matched the requested atom.
    #[error("Package not found: {0}")]
    PackageNotFound(String),
    /// A bare package name matched packages in more than one category.
    #[error("Package name {0} is ambiguous, candidates: {}", .1.join(", "))]
    AmbiguousPackage(String, Vec<String>),
    /// The package has no versions, so there is no latest version to inspect.
    #[error("Package {0} has no versions")]
    NoVersions(String),
    /// The string is not a valid `category/name-version`.
    #[error("Invalid package identifier {0}")]
    InvalidCpv(String),
    /// The requested file was not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    /// A color scheme entry could not be read as `r,g,b`.
    #[error("Invalid color value {0:?}")]
    InvalidColor(String),
    /// An IOError that does not recieve special treatment occurred.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// Walking a log or metadata directory failed.
    #[error(transparent)]
    WalkError(#[from] walkdir::Error),
    /// An error when serializing or deserializing the catalog cache.
    #[error(transparent)]
    SerializationError(#[from] serde_cbor::error::Error),
    /// The configuration file failed to parse.
    #[error(transparent)]
    ConfigParseError(#[from] toml::de::Error),
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, AirportError>;

impl AirportError {
    /// Turn an io error on `path` into [`AirportError::FileNotFound`] when the file is missing.
    pub(crate) fn from_io(error: std::io::Error, path: impl Into<PathBuf>) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => AirportError::FileNotFound(path.into()),
            _ => AirportError::IOError(error),
        }
    }
}
