//! # airport
//! `airport` is a small companion for Portage. It lists the packages of the configured ebuild repositories, shows which USE flags a package declares and where they are described, and reads the elog notices Portage writes after a merge.
//! To get started, run
//! ```sh
//! airport --help
//! ```
//! for a list of available commands.
//! # Usage
//! Inspecting the flags of a package is a matter of finding its latest version and resolving its `IUSE`:
//! ```no_run
//! /// The repositories to read from.
//! let repositories = vec![airport::Repository::open("/var/db/repos/gentoo")?];
//! /// Building the catalog reads every metadata cache entry, so it is worth saving.
//! let catalog = airport::Catalog::scan(&repositories, |_| {})?;
//! let package = match airport::package_from_atom(&catalog, "dev-lang/python") {
//!     airport::SelectResults::Found(package) => package,
//!     _ => panic!("dev-lang/python is not in the repository"),
//! };
//! let cpv = package.latest_cpv()?;
//! let iuse = airport::repository::declared_flags(&repositories, &cpv)?;
//! let descriptions = airport::repository::flag_descriptions(&repositories)?;
//! for flag in descriptions.resolve(&package.atom(), &iuse) {
//!     println!("{} default={} global={} local={}", flag.name, flag.default_enabled, flag.is_global, flag.is_local);
//! }
//! # Ok::<(), airport::Error>(())
//! ```
//! Reading the elog notices works on the text of a log file alone:
//! ```no_run
//! let config = airport::Config::load(airport::Config::default_path())?;
//! for path in airport::elog::collect_log_files(config.elog_dir()?)? {
//!     let text = std::fs::read_to_string(&path)?;
//!     for entry in airport::classify(&text) {
//!         println!("{}: {}", entry.severity, entry.body);
//!     }
//! }
//! # Ok::<(), airport::Error>(())
//! ```

#![warn(missing_docs)] // To keep codebase familiarity possible, docs are required

/// The package catalog and its on-disk cache.
pub mod catalog;
/// Colors of the desktop color scheme.
pub mod color;
/// Settings of airport and the parts of Portage's configuration it reads.
pub mod config;
/// Portage elog files.
pub mod elog;
/// Errors that can be raised by airport.
pub mod error;
/// Packages and their versions.
pub mod package;
/// Ebuild repositories and their metadata cache.
pub mod repository;
/// Selecting packages from the catalog.
pub mod selection;
/// USE flags.
pub mod useflag;

pub use catalog::Catalog;
pub use color::{ColorRole, ColorScheme};
pub use config::Config;
pub use elog::{classify, LogEntry, Severity};
pub use error::{AirportError as Error, Result};
pub use package::{Package, Version};
pub use repository::Repository;
pub use selection::{package_from_atom, search, SelectResults};
pub use useflag::{parse_iuse, resolve_flags, FlagDescriptions, UseFlag};
