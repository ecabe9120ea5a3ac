use crate::error::AirportError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, sync::OnceLock};

/// A package of the catalog: every version of one `category/name`, across repositories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// The package's category, such as `dev-lang`.
    pub category: String,
    /// The package's name, such as `python`.
    pub name: String,
    /// The available versions, oldest first.
    pub versions: Vec<String>,
    /// The repositories providing the package.
    pub repos: Vec<String>,
}

impl Package {
    /// The `category/name` of the package.
    pub fn atom(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }

    /// The `category/name-version` of the last version in the list.
    ///
    /// The versions are used in the order they are stored; nothing is sorted here.
    /// ```rust
    /// # use airport::Package;
    /// let package = Package {
    ///     category: "dev-lang".into(),
    ///     name: "python".into(),
    ///     versions: vec!["3.10".into(), "3.11".into()],
    ///     repos: vec!["gentoo".into()],
    /// };
    /// assert_eq!(package.latest_cpv()?, "dev-lang/python-3.11");
    /// # Ok::<(), airport::Error>(())
    /// ```
    pub fn latest_cpv(&self) -> crate::Result<String> {
        match self.versions.last() {
            Some(version) => Ok(format!("{}/{}-{}", self.category, self.name, version)),
            None => Err(AirportError::NoVersions(self.atom())),
        }
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}\t{}", self.category, self.name, self.repos.join(", "))
    }
}

fn version_regex() -> &'static Regex {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    VERSION.get_or_init(|| {
        Regex::new(
            r"^(?P<numbers>\d+(?:\.\d+)*)(?P<letter>[a-z])?(?P<suffixes>(?:_(?:alpha|beta|pre|rc|p)\d*)*)(?:-r(?P<revision>\d+))?$",
        )
        .expect("version pattern is valid")
    })
}

/// Split `PF` (`python-3.11.4-r1`) into the name and the version.
/// ```rust
/// # use airport::package::split_pf;
/// assert_eq!(split_pf("python-3.11.4-r1"), Some(("python", "3.11.4-r1")));
/// assert_eq!(split_pf("font-adobe-100dpi-1.0.4"), Some(("font-adobe-100dpi", "1.0.4")));
/// assert_eq!(split_pf("no-version"), None);
/// ```
pub fn split_pf(pf: &str) -> Option<(&str, &str)> {
    pf.match_indices('-')
        .map(|(index, _)| index)
        .filter(|&index| index > 0)
        .find(|&index| version_regex().is_match(&pf[index + 1..]))
        .map(|index| (&pf[..index], &pf[index + 1..]))
}

/// Split `category/name-version` into its three parts.
pub fn split_cpv(cpv: &str) -> crate::Result<(&str, &str, &str)> {
    let invalid = || AirportError::InvalidCpv(cpv.to_owned());
    let (category, pf) = cpv.split_once('/').ok_or_else(invalid)?;
    let (name, version) = split_pf(pf).ok_or_else(invalid)?;
    if category.is_empty() {
        return Err(invalid());
    }
    Ok((category, name, version))
}

/// A release suffix, in ascending order of precedence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SuffixKind {
    Alpha,
    Beta,
    Pre,
    Rc,
    Patch,
}

/// A Portage version such as `1.2.3b_rc1_p2-r3`.
/// # Examples:
/// ```rust
/// # use airport::package::Version;
/// let v = |s: &str| s.parse::<Version>().unwrap();
/// assert!(v("3.10") > v("3.9"));
/// assert!(v("1.0_rc1") < v("1.0"));
/// assert!(v("1.0_p1") > v("1.0"));
/// assert!(v("1.0-r1") > v("1.0"));
/// assert!(v("1.0a") > v("1.0"));
/// assert!(v("1.01") < v("1.1"));
/// assert_eq!(v("1.0"), v("1.0-r0"));
/// ```
#[derive(Clone, Debug)]
pub struct Version {
    numbers: Vec<String>,
    letter: Option<char>,
    suffixes: Vec<(SuffixKind, u64)>,
    revision: u64,
}

impl std::str::FromStr for Version {
    type Err = AirportError;

    fn from_str(version: &str) -> crate::Result<Self> {
        let invalid = || AirportError::InvalidCpv(version.to_owned());
        let captures = version_regex().captures(version).ok_or_else(invalid)?;
        let numbers = captures["numbers"].split('.').map(String::from).collect();
        let letter = captures
            .name("letter")
            .and_then(|letter| letter.as_str().chars().next());
        let mut suffixes = Vec::new();
        for suffix in captures["suffixes"].split('_').filter(|s| !s.is_empty()) {
            let digits = suffix.trim_start_matches(|c: char| c.is_ascii_lowercase());
            let kind = match &suffix[..suffix.len() - digits.len()] {
                "alpha" => SuffixKind::Alpha,
                "beta" => SuffixKind::Beta,
                "pre" => SuffixKind::Pre,
                "rc" => SuffixKind::Rc,
                _ => SuffixKind::Patch,
            };
            let number = if digits.is_empty() {
                0
            } else {
                digits.parse().map_err(|_| invalid())?
            };
            suffixes.push((kind, number));
        }
        let revision = match captures.name("revision") {
            Some(revision) => revision.as_str().parse().map_err(|_| invalid())?,
            None => 0,
        };
        Ok(Version {
            numbers,
            letter,
            suffixes,
            revision,
        })
    }
}

/// Compare two numeric components. The first component is always compared as an
/// integer; later components with a leading zero are compared as decimal fractions.
fn compare_component(first: bool, a: &str, b: &str) -> Ordering {
    if first || !(a.starts_with('0') || b.starts_with('0')) {
        let a = a.trim_start_matches('0');
        let b = b.trim_start_matches('0');
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    } else {
        a.trim_end_matches('0').cmp(b.trim_end_matches('0'))
    }
}

/// Compare one side's suffix against the absence of a suffix on the other side.
fn compare_to_release(kind: SuffixKind) -> Ordering {
    if kind == SuffixKind::Patch {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        for (index, pair) in self.numbers.iter().zip(other.numbers.iter()).enumerate() {
            match compare_component(index == 0, pair.0, pair.1) {
                Ordering::Equal => continue,
                order => return order,
            }
        }
        match self.numbers.len().cmp(&other.numbers.len()) {
            Ordering::Equal => {}
            order => return order,
        }
        match self.letter.cmp(&other.letter) {
            Ordering::Equal => {}
            order => return order,
        }
        for index in 0..self.suffixes.len().max(other.suffixes.len()) {
            let order = match (self.suffixes.get(index), other.suffixes.get(index)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(a), None) => compare_to_release(a.0),
                (None, Some(b)) => compare_to_release(b.0).reverse(),
                (None, None) => Ordering::Equal,
            };
            if order != Ordering::Equal {
                return order;
            }
        }
        self.revision.cmp(&other.revision)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Sort version strings oldest first. Strings that are not valid versions keep
/// their relative order and sort before every valid one.
pub fn sort_versions(versions: &mut Vec<String>) {
    versions.sort_by(|a, b| match (a.parse::<Version>(), b.parse::<Version>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => Ordering::Equal,
    });
}
