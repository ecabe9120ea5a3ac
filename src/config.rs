use crate::error::AirportError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Portage's log directory when `make.conf` does not set one.
pub const DEFAULT_PORTAGE_LOGDIR: &str = "/var/log/portage";
/// The make.conf variable naming the log directory.
const LOGDIR_VARIABLE: &str = "PORTAGE_LOGDIR";

/// Settings read from `airport.toml`. Every field may be left out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repositories to read packages from, in order of precedence.
    pub repositories: Vec<PathBuf>,
    /// Overrides `PORTAGE_LOGDIR`. The elog files are in its `elog` subdirectory.
    pub log_dir: Option<PathBuf>,
    /// Portage's `make.conf`, a file or a directory of files.
    pub make_conf: PathBuf,
    /// The `kdeglobals` file to take colors from.
    pub color_scheme: Option<PathBuf>,
    /// Where the package catalog is cached.
    pub catalog_cache: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repositories: vec![PathBuf::from("/var/db/repos/gentoo")],
            log_dir: None,
            make_conf: PathBuf::from("/etc/portage/make.conf"),
            color_scheme: None,
            catalog_cache: None,
        }
    }
}

impl Config {
    /// The configuration file used when none is given.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("airport")
            .join("airport.toml")
    }

    /// Load the configuration. A missing file gives the default configuration.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// The directory holding elog files: `$PORTAGE_LOGDIR/elog`.
    pub fn elog_dir(&self) -> crate::Result<PathBuf> {
        let log_dir = match &self.log_dir {
            Some(log_dir) => log_dir.clone(),
            None => read_make_conf(&self.make_conf, LOGDIR_VARIABLE)?
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PORTAGE_LOGDIR)),
        };
        Ok(log_dir.join("elog"))
    }

    /// The `kdeglobals` file colors are read from.
    pub fn color_scheme_path(&self) -> PathBuf {
        match &self.color_scheme {
            Some(path) => path.clone(),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("kdeglobals"),
        }
    }

    /// The file the package catalog is cached in.
    pub fn catalog_path(&self) -> PathBuf {
        match &self.catalog_cache {
            Some(path) => path.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("airport")
                .join("catalog.cbor"),
        }
    }
}

/// Look up `variable` in `make.conf`. A directory is read file by file in name order,
/// and later assignments override earlier ones.
pub fn read_make_conf(path: &Path, variable: &str) -> crate::Result<Option<String>> {
    let mut files = Vec::new();
    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
    } else if path.is_file() {
        files.push(path.to_owned());
    }
    let mut value = None;
    for file in files {
        let content = fs::read_to_string(&file).map_err(|error| AirportError::from_io(error, &file))?;
        if let Some(found) = find_assignment(&content, variable) {
            value = Some(found);
        }
    }
    Ok(value)
}

/// The last `variable=value` assignment in shell-like `content`.
fn find_assignment(content: &str, variable: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.strip_prefix("export ").unwrap_or(line))
        .filter_map(|line| line.split_once('='))
        .filter(|(key, _)| key.trim() == variable)
        .map(|(_, value)| unquote(strip_comment(value).trim()).to_owned())
        .last()
}

/// Cut a trailing `# comment` off a value. A `#` only starts a comment outside of
/// quotes and at the start of a word.
fn strip_comment(value: &str) -> &str {
    let mut quote = None;
    let mut previous = ' ';
    for (index, character) in value.char_indices() {
        match (quote, character) {
            (None, '"') | (None, '\'') => quote = Some(character),
            (Some(open), _) if open == character => quote = None,
            (None, '#') if previous.is_whitespace() => return &value[..index],
            _ => {}
        }
        previous = character;
    }
    value
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
