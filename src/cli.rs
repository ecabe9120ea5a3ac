use airport::{
    elog, repository, selection, Catalog, ColorRole, ColorScheme, Config, Error, Package,
    Repository, SelectResults,
};
use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::{
    fs,
    io::IsTerminal,
    path::{Path, PathBuf},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(about = "Browse Portage packages, their USE flags and elog notices.")]
struct Options {
    /// The configuration file (defaults to airport/airport.toml in the user configuration directory).
    #[structopt(short = "C", long, parse(from_os_str))]
    configuration: Option<PathBuf>,

    /// Print without colors.
    #[structopt(long)]
    no_color: bool,

    /// Log more details; repeat for even more.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    #[structopt(subcommand)]
    command: SubCommands,
}

#[derive(Debug, PartialEq, StructOpt)]
enum SubCommands {
    /// List the elog files, newest first.
    #[structopt(alias = "ls")]
    Logs {
        /// Only list files whose name contains this text.
        text: Option<String>,
    },
    /// Show the notices of one elog file.
    Log {
        /// A path, or (part of) the name of a file in the elog directory.
        target: String,
    },
    /// Search packages by name.
    #[structopt(alias = "se")]
    Search {
        /// Text the package name must contain.
        text: String,
    },
    /// Show the USE flags of the latest version of a package.
    #[structopt(alias = "fl")]
    Flags {
        /// The package, as category/name or just name.
        atom: String,
    },
    /// Rebuild the package catalog.
    #[structopt(alias = "sy")]
    Sync,
}

/// Set up logging, `-v` raising the level unless `RUST_LOG` says otherwise.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Open every configured repository, skipping the ones that are missing.
fn open_repositories(config: &Config) -> Result<Vec<Repository>> {
    let mut repositories = Vec::new();
    for location in &config.repositories {
        match Repository::open(location) {
            Ok(repository) => repositories.push(repository),
            Err(Error::FileNotFound(path)) => {
                warn!("Repository {} does not exist, skipping it", path.display())
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("Failed to open repository {}", location.display()))
            }
        }
    }
    if repositories.is_empty() {
        return Err(anyhow!(
            "None of the configured repositories exist: {:?}",
            config.repositories
        ));
    }
    Ok(repositories)
}

/// Read the repositories into a new catalog while showing which category is being read.
fn scan_catalog(repositories: &[Repository]) -> Result<Catalog> {
    let bar = ProgressBar::new_spinner()
        .with_style(ProgressStyle::default_spinner().template("{spinner} {prefix} {msg}"));
    bar.set_prefix("Reading");
    bar.enable_steady_tick(80);
    let catalog = Catalog::scan(repositories, |category| bar.set_message(category));
    bar.finish_and_clear();
    catalog.context("Failed to read the package metadata.")
}

/// Build the catalog and store it for the next run.
fn sync_catalog(config: &Config, repositories: &[Repository]) -> Result<Catalog> {
    let catalog = scan_catalog(repositories)?;
    let path = config.catalog_path();
    catalog
        .save(&path)
        .with_context(|| format!("Failed to save the catalog to {}.", path.display()))?;
    info!("Saved {} packages to {}", catalog.len(), path.display());
    Ok(catalog)
}

/// Load the cached catalog, building it when there is no usable cache or the
/// repositories changed after it was saved.
fn get_catalog(config: &Config, repositories: &[Repository]) -> Result<Catalog> {
    let path = config.catalog_path();
    match Catalog::load(&path) {
        Ok(_) if Catalog::is_stale(&path, repositories)? => {
            info!("The repositories changed since the catalog was built, rebuilding it");
            sync_catalog(config, repositories)
        }
        Ok(catalog) => Ok(catalog),
        Err(Error::FileNotFound(_)) => {
            eprintln!("No package catalog yet, building it. This can take a while.");
            sync_catalog(config, repositories)
        }
        Err(Error::SerializationError(error)) => {
            warn!("The catalog cache is unreadable ({}), rebuilding it", error);
            sync_catalog(config, repositories)
        }
        Err(error) => Err(error).context("Failed to load the package catalog."),
    }
}

/// Ask the user which of several packages they meant.
fn choose_package<'a>(name: &str, candidates: Vec<&'a Package>) -> Result<&'a Package> {
    if !(std::io::stdin().is_terminal() && std::io::stderr().is_terminal()) {
        let atoms = candidates.iter().map(|package| package.atom()).collect();
        return Err(Error::AmbiguousPackage(name.to_owned(), atoms).into());
    }
    let items: Vec<String> = candidates.iter().map(|package| package.atom()).collect();
    let index = dialoguer::Select::new()
        .with_prompt(format!("{} is in several categories, pick one", name))
        .items(&items)
        .default(0)
        .interact()
        .context("Failed to display prompt.")?;
    Ok(candidates[index])
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Print the flags of the latest version of the package named by `atom`.
fn show_flags(config: &Config, atom: &str, scheme: &ColorScheme) -> Result<()> {
    let repositories = open_repositories(config)?;
    let catalog = get_catalog(config, &repositories)?;
    let package = match selection::package_from_atom(&catalog, atom) {
        SelectResults::Found(package) => package,
        SelectResults::Ambiguous(candidates) => choose_package(atom, candidates)?,
        SelectResults::NotFound(atom) => return Err(Error::PackageNotFound(atom).into()),
    };
    let cpv = package.latest_cpv()?;
    let iuse = repository::declared_flags(&repositories, &cpv)
        .with_context(|| format!("Failed to read the flags of {}.", cpv))?;
    let descriptions = repository::flag_descriptions(&repositories)
        .context("Failed to read the flag descriptions.")?;
    let flags = descriptions.resolve(&package.atom(), &iuse);

    println!("{} ({})", cpv.bold(), package.repos.join(", "));
    if flags.is_empty() {
        println!("No USE flags.");
        return Ok(());
    }
    let width = flags
        .iter()
        .map(|flag| flag.name.len())
        .chain(std::iter::once("Flag".len()))
        .max()
        .unwrap_or_default();
    println!(
        "{:width$}  {:7}  {:6}  {:5}  {}",
        "Flag",
        "Default",
        "Global",
        "Local",
        "Description",
        width = width
    );
    for flag in &flags {
        let name = format!("{:width$}", flag.name, width = width);
        let name = if flag.default_enabled {
            scheme.paint(ColorRole::Positive, &name)
        } else {
            scheme.paint(ColorRole::Normal, &name)
        };
        println!(
            "{}  {:7}  {:6}  {:5}  {}",
            name,
            yes_no(flag.default_enabled),
            yes_no(flag.is_global),
            yes_no(flag.is_local),
            descriptions
                .describe(&package.atom(), &flag.name)
                .unwrap_or_default()
        );
    }
    Ok(())
}

/// Whether `target` names a file rather than text to look for in the elog directory.
fn looks_like_path(target: &str) -> bool {
    target.contains('/') || target.ends_with(elog::LOG_SUFFIX)
}

/// Find the elog file the user meant: an existing path, or a unique name match.
fn find_log_file(config: &Config, target: &str) -> Result<PathBuf> {
    let path = Path::new(target);
    if looks_like_path(target) && path.is_file() {
        return Ok(path.to_owned());
    }
    let files = elog::collect_log_files(config.elog_dir()?)
        .context("Failed to list the elog directory.")?;
    if let Some(exact) = files
        .iter()
        .find(|file| file.file_name().map_or(false, |name| name == target))
    {
        return Ok(exact.clone());
    }
    let matching = elog::filter_log_files(&files, target);
    match matching.as_slice() {
        [] => Err(Error::FileNotFound(PathBuf::from(target)).into()),
        [file] => Ok((*file).clone()),
        candidates => Err(anyhow!(
            "{} matches {} log files, the newest is {}",
            target,
            candidates.len(),
            candidates[0].display()
        )),
    }
}

/// Print the entries of one elog file in their severity's color.
fn show_log(path: &Path, scheme: &ColorScheme) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}.", path.display()))?;
    let entries = elog::classify(&text);
    if entries.is_empty() {
        warn!("{} contains no elog entries", path.display());
    }
    for entry in entries {
        println!("{}", scheme.paint(entry.severity.color_role(), &entry.body));
    }
    Ok(())
}

/// The entry point of the application.
pub fn run() -> Result<()> {
    let options = Options::from_args();
    init_logging(options.verbose);
    if options.no_color {
        colored::control::set_override(false);
    }
    let configuration = options
        .configuration
        .clone()
        .unwrap_or_else(Config::default_path);
    let config = Config::load(&configuration)
        .with_context(|| format!("Failed to load {}.", configuration.display()))?;
    let scheme = ColorScheme::load(config.color_scheme_path()).unwrap_or_else(|error| {
        warn!("Ignoring the color scheme: {}", error);
        ColorScheme::default()
    });

    match &options.command {
        SubCommands::Logs { text } => {
            let files = elog::collect_log_files(config.elog_dir()?)
                .context("Failed to list the elog directory.")?;
            for file in elog::filter_log_files(&files, text.as_deref().unwrap_or_default()) {
                if let Some(name) = file.file_name() {
                    println!("{}", name.to_string_lossy());
                }
            }
        }
        SubCommands::Log { target } => {
            let path = find_log_file(&config, target)?;
            show_log(&path, &scheme)?;
        }
        SubCommands::Search { text } => {
            let repositories = open_repositories(&config)?;
            let catalog = get_catalog(&config, &repositories)?;
            for package in selection::search(&catalog, text) {
                println!("{}", package);
            }
        }
        SubCommands::Flags { atom } => show_flags(&config, atom, &scheme)?,
        SubCommands::Sync => {
            let repositories = open_repositories(&config)?;
            let catalog = sync_catalog(&config, &repositories)?;
            println!("{} packages in the catalog.", catalog.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(arguments: &[&str]) -> Result<Options, structopt::clap::Error> {
        Options::from_iter_safe(arguments.iter().copied())
    }

    #[test]
    fn no_arguments_is_an_error() {
        assert!(parse(&["airport"]).is_err());
    }

    #[test]
    fn help_requested_help_displayed() {
        let error = parse(&["airport", "--help"]).unwrap_err();
        assert_eq!(error.kind, clap::ErrorKind::HelpDisplayed);
    }

    #[test]
    fn subcommands_and_aliases() -> Result<(), structopt::clap::Error> {
        assert_eq!(
            parse(&["airport", "flags", "dev-lang/python"])?.command,
            SubCommands::Flags {
                atom: "dev-lang/python".to_string()
            }
        );
        assert_eq!(
            parse(&["airport", "fl", "python"])?.command,
            SubCommands::Flags {
                atom: "python".to_string()
            }
        );
        assert_eq!(
            parse(&["airport", "logs"])?.command,
            SubCommands::Logs { text: None }
        );
        assert_eq!(
            parse(&["airport", "ls", "python"])?.command,
            SubCommands::Logs {
                text: Some("python".to_string())
            }
        );
        assert_eq!(parse(&["airport", "sy"])?.command, SubCommands::Sync);
        Ok(())
    }

    #[test]
    fn global_options() -> Result<(), structopt::clap::Error> {
        let options = parse(&["airport", "-vv", "--no-color", "-C", "/etc/airport.toml", "sync"])?;
        assert_eq!(options.verbose, 2);
        assert!(options.no_color);
        assert_eq!(options.configuration, Some(PathBuf::from("/etc/airport.toml")));
        Ok(())
    }

    #[test]
    fn required_arguments() {
        assert!(parse(&["airport", "flags"]).is_err());
        assert!(parse(&["airport", "log"]).is_err());
    }

    #[test]
    fn finds_log_files_by_name() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let elog_dir = dir.path().join("elog");
        fs::create_dir(&elog_dir)?;
        fs::write(elog_dir.join("dev-lang:python-3.11.4:20240101-000000.log"), "INFO: a")?;
        fs::write(elog_dir.join("dev-lang:python-3.12.0:20240102-000000.log"), "INFO: b")?;
        fs::write(elog_dir.join("app-misc:foo-1.0:20240103-000000.log"), "WARN: c")?;
        let config = Config {
            log_dir: Some(dir.path().to_owned()),
            ..Config::default()
        };
        assert!(find_log_file(&config, "foo")?.ends_with("app-misc:foo-1.0:20240103-000000.log"));
        assert!(find_log_file(&config, "python").is_err());
        assert!(find_log_file(&config, "missing").is_err());
        let exact = find_log_file(&config, "dev-lang:python-3.12.0:20240102-000000.log")?;
        assert!(exact.is_absolute());
        Ok(())
    }

    #[test]
    fn only_paths_bypass_the_elog_directory() -> Result<(), Box<dyn std::error::Error>> {
        assert!(!looks_like_path("python"));
        assert!(!looks_like_path("python-3.11"));
        assert!(looks_like_path("./python"));
        assert!(looks_like_path("/var/log/portage/elog/summary"));
        assert!(looks_like_path("dev-lang:python-3.11.4:20240101-000000.log"));

        let dir = tempfile::tempdir()?;
        let elog_dir = dir.path().join("elog");
        fs::create_dir(&elog_dir)?;
        fs::write(elog_dir.join("app-misc:foo-1.0:20240103-000000.log"), "WARN: c")?;
        let elsewhere = dir.path().join("saved.log");
        fs::write(&elsewhere, "INFO: kept")?;
        let config = Config {
            log_dir: Some(dir.path().to_owned()),
            ..Config::default()
        };
        let target = elsewhere.to_str().ok_or("temporary path is not UTF-8")?;
        assert_eq!(find_log_file(&config, target)?, elsewhere);
        Ok(())
    }

    /// Write a metadata cache entry declaring `iuse` to the repository at `root`.
    fn write_entry(root: &Path, category: &str, pf: &str, iuse: &str) -> std::io::Result<()> {
        let dir = root.join("metadata/md5-cache").join(category);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(pf), format!("EAPI=8\nIUSE={}\nSLOT=0\n", iuse))
    }

    #[test]
    fn rebuilds_the_catalog_when_repositories_change() -> Result<(), Box<dyn std::error::Error>> {
        let repo = tempfile::tempdir()?;
        write_entry(repo.path(), "dev-lang", "python-3.11.4", "+ssl tk")?;
        let cache = tempfile::tempdir()?;
        let config = Config {
            repositories: vec![repo.path().to_owned()],
            catalog_cache: Some(cache.path().join("catalog.cbor")),
            ..Config::default()
        };
        let repositories = vec![Repository::open(repo.path())?];

        let catalog = get_catalog(&config, &repositories)?;
        let python = selection::package_from_atom(&catalog, "dev-lang/python");
        match python {
            SelectResults::Found(package) => assert_eq!(package.latest_cpv()?, "dev-lang/python-3.11.4"),
            _ => panic!("dev-lang/python is missing from the catalog"),
        }

        // An old catalog next to a freshly synced repository.
        fs::remove_file(repo.path().join("metadata/md5-cache/dev-lang/python-3.11.4"))?;
        write_entry(repo.path(), "dev-lang", "python-3.12.1", "+ssl")?;
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(3600);
        fs::OpenOptions::new()
            .write(true)
            .open(config.catalog_path())?
            .set_modified(past)?;

        let catalog = get_catalog(&config, &repositories)?;
        let python = selection::package_from_atom(&catalog, "dev-lang/python");
        let cpv = match python {
            SelectResults::Found(package) => package.latest_cpv()?,
            _ => panic!("dev-lang/python is missing from the catalog"),
        };
        assert_eq!(cpv, "dev-lang/python-3.12.1");
        assert_eq!(repository::declared_flags(&repositories, &cpv)?, "+ssl");
        Ok(())
    }
}
