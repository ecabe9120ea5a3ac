//! Finding packages in the catalog from what the user typed.

use crate::catalog::Catalog;
use crate::package::Package;

/// The results of looking up a package atom.
#[derive(Debug, PartialEq)]
pub enum SelectResults<'a> {
    /// Exactly one package matched.
    Found(&'a Package),
    /// A bare name matched packages in several categories.
    Ambiguous(Vec<&'a Package>),
    /// Nothing matched.
    NotFound(String),
}

/// Every package whose name contains `text`.
pub fn search<'a>(catalog: &'a Catalog, text: &str) -> Vec<&'a Package> {
    catalog
        .iter()
        .filter(|package| package.name.contains(text))
        .collect()
}

/// Look up a package by `category/name`, or by its bare name.
pub fn package_from_atom<'a>(catalog: &'a Catalog, atom: &str) -> SelectResults<'a> {
    let mut matches: Vec<&Package> = match atom.split_once('/') {
        Some((category, name)) => catalog
            .iter()
            .filter(|package| package.category == category && package.name == name)
            .collect(),
        None => catalog.iter().filter(|package| package.name == atom).collect(),
    };
    match matches.len() {
        0 => SelectResults::NotFound(atom.to_owned()),
        1 => SelectResults::Found(matches.remove(0)),
        _ => SelectResults::Ambiguous(matches),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn catalog() -> Catalog {
        let package = |category: &str, name: &str| Package {
            category: category.to_string(),
            name: name.to_string(),
            versions: vec!["1.0".to_string()],
            repos: vec!["gentoo".to_string()],
        };
        Catalog::from_packages(vec![
            package("app-misc", "foo"),
            package("dev-lang", "python"),
            package("dev-python", "python-dateutil"),
            package("games-misc", "foo"),
        ])
    }

    #[test]
    fn search_matches_substrings_of_names() {
        let catalog = catalog();
        let names: Vec<_> = search(&catalog, "python").iter().map(|p| p.atom()).collect();
        assert_eq!(names, vec!["dev-lang/python", "dev-python/python-dateutil"]);
        // Categories are not searched.
        assert!(search(&catalog, "dev-").is_empty());
        assert_eq!(search(&catalog, "").len(), 4);
    }

    #[test]
    fn full_atom_is_exact() {
        let catalog = catalog();
        match package_from_atom(&catalog, "games-misc/foo") {
            SelectResults::Found(package) => assert_eq!(package.category, "games-misc"),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(
            package_from_atom(&catalog, "dev-lang/pyth"),
            SelectResults::NotFound("dev-lang/pyth".to_string())
        );
    }

    #[test]
    fn bare_names_may_be_ambiguous() {
        let catalog = catalog();
        match package_from_atom(&catalog, "foo") {
            SelectResults::Ambiguous(packages) => assert_eq!(packages.len(), 2),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(matches!(
            package_from_atom(&catalog, "python"),
            SelectResults::Found(_)
        ));
    }
}
