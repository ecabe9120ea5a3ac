//! Text colors taken from the desktop's color scheme.
//!
//! KDE stores the active scheme in `kdeglobals`, an ini file whose
//! `[Colors:View]` section holds entries such as `ForegroundNegative=218,68,83`.
//! When the file does not exist a fixed palette is used instead.

use crate::error::AirportError;
use colored::{ColoredString, Colorize};
use log::debug;
use std::{collections::HashMap, fs, path::Path};

/// The section of `kdeglobals` the colors are read from.
const VIEW_SECTION: &str = "Colors:View";

/// The purpose a color is used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorRole {
    /// Regular text.
    Normal,
    /// Good news.
    Positive,
    /// Something worth a look.
    Neutral,
    /// Something went wrong.
    Negative,
    /// Links and plain log output.
    Link,
}

impl ColorRole {
    /// The `kdeglobals` key holding this role's color.
    fn key(self) -> &'static str {
        match self {
            ColorRole::Normal => "ForegroundNormal",
            ColorRole::Positive => "ForegroundPositive",
            ColorRole::Neutral => "ForegroundNeutral",
            ColorRole::Negative => "ForegroundNegative",
            ColorRole::Link => "ForegroundLink",
        }
    }
}

/// An RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl std::str::FromStr for Rgb {
    type Err = AirportError;

    /// Parse `r,g,b`, allowing spaces after the commas.
    fn from_str(raw: &str) -> crate::Result<Self> {
        let invalid = || AirportError::InvalidColor(raw.to_owned());
        let channels = raw
            .split(',')
            .map(|channel| channel.trim().parse::<u8>().map_err(|_| invalid()))
            .collect::<crate::Result<Vec<_>>>()?;
        match channels.as_slice() {
            [r, g, b] | [r, g, b, _] => Ok(Rgb(*r, *g, *b)),
            _ => Err(invalid()),
        }
    }
}

/// The colors used to render output.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorScheme {
    normal: Rgb,
    positive: Rgb,
    neutral: Rgb,
    negative: Rgb,
    link: Rgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            normal: Rgb(255, 255, 255),
            positive: Rgb(0, 128, 0),
            neutral: Rgb(255, 255, 0),
            negative: Rgb(255, 0, 0),
            link: Rgb(0, 0, 255),
        }
    }
}

impl ColorScheme {
    /// Load the scheme from a `kdeglobals` file, falling back to the default palette
    /// when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                debug!("No color scheme at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Read the scheme from `kdeglobals` content. Missing keys keep their default.
    pub fn parse(content: &str) -> crate::Result<Self> {
        let section = read_section(content, VIEW_SECTION);
        let mut scheme = Self::default();
        for role in [
            ColorRole::Normal,
            ColorRole::Positive,
            ColorRole::Neutral,
            ColorRole::Negative,
            ColorRole::Link,
        ] {
            if let Some(value) = section.get(role.key()) {
                *scheme.slot(role) = value.parse()?;
            }
        }
        Ok(scheme)
    }

    fn slot(&mut self, role: ColorRole) -> &mut Rgb {
        match role {
            ColorRole::Normal => &mut self.normal,
            ColorRole::Positive => &mut self.positive,
            ColorRole::Neutral => &mut self.neutral,
            ColorRole::Negative => &mut self.negative,
            ColorRole::Link => &mut self.link,
        }
    }

    /// The color of a role.
    pub fn get(&self, role: ColorRole) -> Rgb {
        match role {
            ColorRole::Normal => self.normal,
            ColorRole::Positive => self.positive,
            ColorRole::Neutral => self.neutral,
            ColorRole::Negative => self.negative,
            ColorRole::Link => self.link,
        }
    }

    /// Color `text` for the terminal.
    pub fn paint(&self, role: ColorRole, text: &str) -> ColoredString {
        let Rgb(r, g, b) = self.get(role);
        text.truecolor(r, g, b)
    }
}

/// The `key=value` pairs of one `[section]` of an ini file.
fn read_section<'a>(content: &'a str, name: &str) -> HashMap<&'a str, &'a str> {
    let mut entries = HashMap::new();
    let mut inside = false;
    for line in content.lines().map(str::trim) {
        if line.starts_with('[') && line.ends_with(']') {
            inside = &line[1..line.len() - 1] == name;
            continue;
        }
        if !inside || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            entries.insert(key.trim(), value.trim());
        }
    }
    entries
}
