//! USE flags declared by a package and where they are described.

use std::collections::{HashMap, HashSet};

/// Marks a flag as enabled by default in `IUSE`.
pub const DEFAULT_ENABLED_PREFIX: char = '+';

/// One flag of a package's `IUSE`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UseFlag {
    /// The flag name, without the default marker.
    pub name: String,
    /// The flag is enabled unless the user turns it off.
    pub default_enabled: bool,
    /// The flag is described in the global flag table.
    pub is_global: bool,
    /// The flag is described in the package's local flag table.
    pub is_local: bool,
}

/// A set of flag names to classify flags against.
pub trait FlagSet {
    /// Whether the flag is part of the set.
    fn contains_flag(&self, name: &str) -> bool;
}

impl FlagSet for HashSet<String> {
    fn contains_flag(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl FlagSet for HashMap<String, String> {
    fn contains_flag(&self, name: &str) -> bool {
        self.contains_key(name)
    }
}

impl<T: FlagSet> FlagSet for Option<&T> {
    fn contains_flag(&self, name: &str) -> bool {
        self.map_or(false, |set| set.contains_flag(name))
    }
}

/// Split one `IUSE` token into its name and default state.
fn parse_token(token: &str) -> (&str, bool) {
    match token.strip_prefix(DEFAULT_ENABLED_PREFIX) {
        Some(name) => (name, true),
        None => (token, false),
    }
}

/// Parse an `IUSE` string without classifying the flags.
///
/// Tokens are separated by runs of whitespace, so an empty string has no flags.
/// ```rust
/// # use airport::useflag::parse_iuse;
/// let flags = parse_iuse("foo +bar baz");
/// let names: Vec<_> = flags.iter().map(|f| (f.name.as_str(), f.default_enabled)).collect();
/// assert_eq!(names, vec![("foo", false), ("bar", true), ("baz", false)]);
/// assert!(parse_iuse("").is_empty());
/// ```
pub fn parse_iuse(declared: &str) -> Vec<UseFlag> {
    declared
        .split_whitespace()
        .map(|token| {
            let (name, default_enabled) = parse_token(token);
            UseFlag {
                name: name.to_owned(),
                default_enabled,
                is_global: false,
                is_local: false,
            }
        })
        .collect()
}

/// Parse an `IUSE` string and mark which flags are global and which are local.
pub fn resolve_flags(declared: &str, global: &impl FlagSet, local: &impl FlagSet) -> Vec<UseFlag> {
    parse_iuse(declared)
        .into_iter()
        .map(|flag| UseFlag {
            is_global: global.contains_flag(&flag.name),
            is_local: local.contains_flag(&flag.name),
            ..flag
        })
        .collect()
}

/// Flag descriptions of a repository's `use.desc` and `use.local.desc`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlagDescriptions {
    /// Flag name to description.
    pub global: HashMap<String, String>,
    /// `category/name` to flag name to description.
    pub local: HashMap<String, HashMap<String, String>>,
}

impl FlagDescriptions {
    /// Read the global table from `use.desc` content: `flag - description`.
    pub fn parse_global(&mut self, content: &str) {
        for (flag, description) in content.lines().filter_map(split_description) {
            self.global
                .entry(flag.to_owned())
                .or_insert_with(|| description.to_owned());
        }
    }

    /// Read the local table from `use.local.desc` content: `cat/pkg:flag - description`.
    pub fn parse_local(&mut self, content: &str) {
        for (key, description) in content.lines().filter_map(split_description) {
            if let Some((package, flag)) = key.split_once(':') {
                self.local
                    .entry(package.to_owned())
                    .or_default()
                    .entry(flag.to_owned())
                    .or_insert_with(|| description.to_owned());
            }
        }
    }

    /// Merge another repository's descriptions in. Existing entries win.
    pub fn merge(&mut self, other: FlagDescriptions) {
        for (flag, description) in other.global {
            self.global.entry(flag).or_insert(description);
        }
        for (package, flags) in other.local {
            let entry = self.local.entry(package).or_default();
            for (flag, description) in flags {
                entry.entry(flag).or_insert(description);
            }
        }
    }

    /// The local flags of one `category/name`.
    pub fn local_flags(&self, package: &str) -> Option<&HashMap<String, String>> {
        self.local.get(package)
    }

    /// The description shown for a flag of `package`; local descriptions take precedence.
    pub fn describe(&self, package: &str, flag: &str) -> Option<&str> {
        self.local
            .get(package)
            .and_then(|flags| flags.get(flag))
            .or_else(|| self.global.get(flag))
            .map(String::as_str)
    }

    /// Resolve the `IUSE` of `package` against these tables.
    pub fn resolve(&self, package: &str, declared: &str) -> Vec<UseFlag> {
        resolve_flags(declared, &self.global, &self.local_flags(package))
    }
}

/// Split a `name - description` line. Comments and blank lines are skipped.
fn split_description(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match line.split_once(" - ") {
        Some((name, description)) => Some((name.trim(), description.trim())),
        None => Some((line, "")),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn names(flags: &[UseFlag]) -> Vec<(&str, bool)> {
        flags
            .iter()
            .map(|flag| (flag.name.as_str(), flag.default_enabled))
            .collect()
    }

    #[test]
    fn default_marker_is_stripped() {
        let flags = parse_iuse("foo +bar baz");
        assert_eq!(names(&flags), vec![("foo", false), ("bar", true), ("baz", false)]);
        assert!(flags.iter().all(|flag| !flag.is_global && !flag.is_local));
    }

    #[test]
    fn only_leading_marker_counts() {
        let flags = parse_iuse("++odd a+b");
        assert_eq!(names(&flags), vec![("+odd", true), ("a+b", false)]);
    }

    #[test]
    fn empty_string_has_no_flags() {
        assert!(parse_iuse("").is_empty());
        assert!(parse_iuse("   \n").is_empty());
    }

    #[test]
    fn repeated_whitespace_gives_no_empty_flags() {
        let flags = parse_iuse("  foo   +bar\tbaz\n");
        assert_eq!(names(&flags), vec![("foo", false), ("bar", true), ("baz", false)]);
    }

    #[test]
    fn duplicates_are_kept() {
        let flags = parse_iuse("ssl +ssl ssl");
        assert_eq!(names(&flags), vec![("ssl", false), ("ssl", true), ("ssl", false)]);
    }

    #[test]
    fn resolve_marks_global_and_local() {
        let global: HashSet<String> = ["ssl", "doc"].iter().map(|s| s.to_string()).collect();
        let local: HashSet<String> = ["doc", "jit"].iter().map(|s| s.to_string()).collect();
        let flags = resolve_flags("+ssl doc jit other", &global, &local);
        let classes: Vec<_> = flags
            .iter()
            .map(|f| (f.name.as_str(), f.default_enabled, f.is_global, f.is_local))
            .collect();
        assert_eq!(
            classes,
            vec![
                ("ssl", true, true, false),
                ("doc", false, true, true),
                ("jit", false, false, true),
                ("other", false, false, false),
            ]
        );
        assert_eq!(flags, resolve_flags("+ssl doc jit other", &global, &local));
    }

    #[test]
    fn description_tables() {
        let mut descriptions = FlagDescriptions::default();
        descriptions.parse_global("# comment\n\nssl - Add SSL support\ndoc - Build docs\n");
        descriptions.parse_local(
            "# local\ndev-lang/python:jit - Enable the JIT\ndev-lang/python:doc - Python docs\n",
        );
        assert_eq!(descriptions.global.len(), 2);
        assert_eq!(descriptions.describe("dev-lang/python", "jit"), Some("Enable the JIT"));
        assert_eq!(descriptions.describe("dev-lang/python", "doc"), Some("Python docs"));
        assert_eq!(descriptions.describe("app-misc/foo", "doc"), Some("Build docs"));
        assert_eq!(descriptions.describe("app-misc/foo", "jit"), None);

        let flags = descriptions.resolve("dev-lang/python", "+jit ssl");
        assert!(flags[0].is_local && !flags[0].is_global);
        assert!(flags[1].is_global && !flags[1].is_local);
        let flags = descriptions.resolve("app-misc/foo", "jit");
        assert!(!flags[0].is_local);
    }

    #[test]
    fn merge_keeps_first_repository() {
        let mut first = FlagDescriptions::default();
        first.parse_global("ssl - first\n");
        let mut second = FlagDescriptions::default();
        second.parse_global("ssl - second\nqt6 - Qt 6\n");
        second.parse_local("x11-misc/bar:gtk - GTK\n");
        first.merge(second);
        assert_eq!(first.global["ssl"], "first");
        assert_eq!(first.global["qt6"], "Qt 6");
        assert_eq!(first.describe("x11-misc/bar", "gtk"), Some("GTK"));
    }
}
