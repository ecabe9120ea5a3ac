//! Reading the notices Portage leaves behind after a merge.
//!
//! An elog file is plain text in which each notice starts with a severity
//! marker at the beginning of a line:
//! ```text
//! INFO: setup
//! Package:    dev-lang/python-3.11.4
//! WARN: postinst
//! Remember to run eselect python update.
//! ```
//! [`classify`] turns such a file into a list of [`LogEntry`] values, one per marker.

use crate::color::ColorRole;
use log::debug;
use regex::Regex;
use std::{
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};
use walkdir::WalkDir;

/// Prefix put in front of every entry body.
pub const BODY_PREFIX: &str = ">>>";

/// The file extension of elog files.
pub const LOG_SUFFIX: &str = ".log";

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?m)^(LOG:|INFO:|WARN:|ERROR:)").expect("marker pattern is valid")
    })
}

/// The severity of a log entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// `LOG:`
    Log,
    /// `INFO:`
    Info,
    /// `WARN:`
    Warning,
    /// `ERROR:`
    Error,
}

impl Severity {
    /// Map a matched marker to its severity. Anything that is not one of the
    /// three other markers is an error.
    fn from_marker(marker: &str) -> Self {
        match marker {
            "LOG:" => Severity::Log,
            "INFO:" => Severity::Info,
            "WARN:" => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// The color scheme role entries of this severity are shown in.
    pub fn color_role(self) -> ColorRole {
        match self {
            Severity::Log => ColorRole::Link,
            Severity::Info => ColorRole::Positive,
            Severity::Warning => ColorRole::Neutral,
            Severity::Error => ColorRole::Negative,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Severity::Log => "LOG",
                Severity::Info => "INFO",
                Severity::Warning => "WARN",
                Severity::Error => "ERROR",
            }
        )
    }
}

/// A single notice of an elog file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// The severity given by the entry's marker.
    pub severity: Severity,
    /// [`BODY_PREFIX`] followed by the text between this marker and the next one.
    pub body: String,
}

/// Split the text of an elog file into its entries.
///
/// Text without any marker produces no entries at all.
/// ```rust
/// # use airport::elog::{classify, Severity};
/// let entries = classify("LOG: a\nWARN: b");
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].severity, Severity::Log);
/// assert_eq!(entries[0].body, ">>> a\n");
/// assert_eq!(entries[1].severity, Severity::Warning);
/// assert_eq!(entries[1].body, ">>> b");
/// assert!(classify("no markers here").is_empty());
/// ```
pub fn classify(text: &str) -> Vec<LogEntry> {
    let markers: Vec<_> = marker_regex().find_iter(text).collect();
    markers
        .iter()
        .enumerate()
        .map(|(index, marker)| {
            let end = markers
                .get(index + 1)
                .map_or(text.len(), |next| next.start());
            LogEntry {
                severity: Severity::from_marker(marker.as_str()),
                body: format!("{}{}", BODY_PREFIX, &text[marker.end()..end]),
            }
        })
        .collect()
}

/// Collect every elog file below `root`, newest first.
pub fn collect_log_files(root: impl AsRef<Path>) -> crate::Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        return Err(crate::Error::FileNotFound(root.to_owned()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_string_lossy().ends_with(LOG_SUFFIX) {
            continue;
        }
        let modified = entry
            .metadata()?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let path = if entry.path().is_absolute() {
            entry.into_path()
        } else {
            std::env::current_dir()?.join(entry.path())
        };
        files.push((modified, path));
    }
    files.sort_by(|(a, _), (b, _)| b.cmp(a));
    debug!("Found {} log files below {}", files.len(), root.display());
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Keep the files whose file name contains `text`.
pub fn filter_log_files<'a>(files: &'a [PathBuf], text: &str) -> Vec<&'a PathBuf> {
    files
        .iter()
        .filter(|path| {
            path.file_name()
                .map_or(false, |name| name.to_string_lossy().contains(text))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{
        fs,
        time::{Duration, SystemTime},
    };

    const SAMPLE: &str = "INFO: setup\nPackage: dev-lang/python\n\nWARN: postinst\nRun eselect.\nERROR: test\nfailed\nLOG: other\ndone\n";

    #[test]
    fn text_without_markers_is_empty() {
        assert!(classify("").is_empty());
        assert!(classify("just some text\nover lines\n").is_empty());
    }

    #[test]
    fn markers_must_start_a_line() {
        assert!(classify("this is not a WARN: marker").is_empty());
        let entries = classify("prelude WARN: inline\nERROR: real");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
        assert_eq!(entries[0].body, ">>> real");
    }

    #[test]
    fn entries_follow_marker_order() {
        let severities: Vec<_> = classify(SAMPLE).iter().map(|e| e.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Info,
                Severity::Warning,
                Severity::Error,
                Severity::Log
            ]
        );
    }

    #[test]
    fn bodies_are_the_text_between_markers() {
        let entries = classify(SAMPLE);
        let bodies: Vec<_> = entries
            .iter()
            .map(|e| e.body.strip_prefix(BODY_PREFIX).unwrap())
            .collect();
        assert_eq!(
            bodies,
            vec![
                " setup\nPackage: dev-lang/python\n\n",
                " postinst\nRun eselect.\n",
                " test\nfailed\n",
                " other\ndone\n",
            ]
        );
        // Markers plus bodies rebuild the input.
        let rebuilt: String = entries
            .iter()
            .zip(["INFO:", "WARN:", "ERROR:", "LOG:"].iter())
            .map(|(e, marker)| format!("{}{}", marker, &e.body[BODY_PREFIX.len()..]))
            .collect();
        assert_eq!(rebuilt, SAMPLE);
    }

    #[test]
    fn text_before_first_marker_is_dropped() {
        let entries = classify("header line\nINFO: body");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].body, ">>> body");
    }

    #[test]
    fn adjacent_markers_give_empty_bodies() {
        let entries = classify("LOG:\nLOG:");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].body, ">>>\n");
        assert_eq!(entries[1].body, ">>>");
    }

    #[test]
    fn classify_is_repeatable() {
        assert_eq!(classify(SAMPLE), classify(SAMPLE));
    }

    #[test]
    fn severity_colors() {
        assert_eq!(Severity::Log.color_role(), ColorRole::Link);
        assert_eq!(Severity::Info.color_role(), ColorRole::Positive);
        assert_eq!(Severity::Warning.color_role(), ColorRole::Neutral);
        assert_eq!(Severity::Error.color_role(), ColorRole::Negative);
    }

    #[test]
    fn collects_log_files_recursively() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("dev-lang");
        fs::create_dir(&nested)?;
        let newer = nested.join("python-3.11:20240102-000000.log");
        fs::write(&newer, "WARN: b")?;
        let older = dir.path().join("app-misc:foo-1:20240101-000000.log");
        fs::write(&older, "INFO: a")?;
        fs::write(dir.path().join("summary.txt"), "ignored")?;
        let set_modified = |path: &PathBuf, seconds: u64| {
            fs::OpenOptions::new()
                .write(true)
                .open(path)?
                .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds))
        };
        set_modified(&older, 1_704_067_200)?;
        set_modified(&newer, 1_704_153_600)?;

        let files = collect_log_files(dir.path())?;
        assert_eq!(files, vec![newer.clone(), older.clone()]);
        assert!(files.iter().all(|path| path.is_absolute()));
        Ok(())
    }

    #[test]
    fn missing_log_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("elog");
        match collect_log_files(&missing) {
            Err(crate::Error::FileNotFound(path)) => assert_eq!(path, missing),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn filters_on_file_name_only() {
        let files = vec![
            PathBuf::from("/var/log/portage/elog/dev-lang:python-3.11.log"),
            PathBuf::from("/var/log/portage/elog/app-misc:foo-1.log"),
        ];
        assert_eq!(filter_log_files(&files, "python"), vec![&files[0]]);
        assert!(filter_log_files(&files, "portage").is_empty());
        assert_eq!(filter_log_files(&files, "").len(), 2);
    }
}
