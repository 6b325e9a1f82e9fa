//! Key path value object
//!
//! Addresses a value inside a hierarchical map. Textual form:
//!
//! - `course` - single atom
//! - `account#name` - atom `name`, explicitly placed in section `account`
//! - `image/id` - nested atoms `image` then `id`
//!
//! A key path always holds at least one non-empty atom.

use std::fmt;
use std::str::FromStr;

use crate::error::{TesseraError, TesseraResult};

pub const SECTION_SEPARATOR: char = '#';
pub const ATOM_SEPARATOR: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    section: Option<String>,
    atoms: Vec<String>,
}

impl KeyPath {
    /// Build from raw atoms, without section or separator parsing.
    pub fn new<I, S>(atoms: I) -> TesseraResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let atoms: Vec<String> = atoms
            .into_iter()
            .map(|a| a.into().trim().to_string())
            .collect();
        Self::validate(&atoms, None)?;
        Ok(Self {
            section: None,
            atoms,
        })
    }

    /// Parse the textual `section#a/b` form.
    pub fn parse(text: &str) -> TesseraResult<Self> {
        let (section, rest) = match text.split_once(SECTION_SEPARATOR) {
            Some((section, rest)) => {
                let section = section.trim();
                if section.is_empty() {
                    return Err(invalid(text, "empty section before '#'"));
                }
                (Some(section.to_string()), rest)
            }
            None => (None, text),
        };

        let atoms: Vec<String> = rest
            .split(ATOM_SEPARATOR)
            .map(|a| a.trim().to_string())
            .collect();
        Self::validate(&atoms, Some(text))?;
        Ok(Self { section, atoms })
    }

    fn validate(atoms: &[String], text: Option<&str>) -> TesseraResult<()> {
        let shown = || text.map(str::to_string).unwrap_or_else(|| atoms.join("/"));
        if atoms.is_empty() {
            return Err(invalid(&shown(), "no atoms"));
        }
        if atoms.iter().any(String::is_empty) {
            return Err(invalid(&shown(), "empty atom"));
        }
        Ok(())
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn without_section(mut self) -> Self {
        self.section = None;
        self
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    pub fn atoms(&self) -> &[String] {
        &self.atoms
    }

    /// First atom - the attribute name metadata is keyed on.
    pub fn head(&self) -> &str {
        &self.atoms[0]
    }

    /// Atoms after the head (empty for single-atom paths).
    pub fn tail(&self) -> &[String] {
        &self.atoms[1..]
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_single(&self) -> bool {
        self.atoms.len() == 1
    }

    pub fn child(&self, atom: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.atoms.push(atom.into());
        next
    }

    /// Full path inside a store: section first when one applies.
    pub fn resolved_with(&self, section: Option<&str>) -> Vec<String> {
        match section {
            Some(section) => std::iter::once(section.to_string())
                .chain(self.atoms.iter().cloned())
                .collect(),
            None => self.atoms.clone(),
        }
    }
}

fn invalid(path: &str, reason: &str) -> TesseraError {
    TesseraError::InvalidKeyPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(section) = &self.section {
            write!(f, "{}{}", section, SECTION_SEPARATOR)?;
        }
        write!(f, "{}", self.atoms.join("/"))
    }
}

impl FromStr for KeyPath {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

/// Conversion accepted by every key-addressed API.
pub trait IntoKeyPath {
    fn into_key_path(self) -> TesseraResult<KeyPath>;
}

impl IntoKeyPath for KeyPath {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        Ok(self)
    }
}

impl IntoKeyPath for &KeyPath {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        Ok(self.clone())
    }
}

impl IntoKeyPath for &str {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        KeyPath::parse(self)
    }
}

impl IntoKeyPath for String {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        KeyPath::parse(&self)
    }
}

impl IntoKeyPath for &String {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        KeyPath::parse(self)
    }
}

impl<const N: usize> IntoKeyPath for [&str; N] {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        KeyPath::new(self)
    }
}

impl IntoKeyPath for &[&str] {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        KeyPath::new(self.iter().copied())
    }
}

impl IntoKeyPath for Vec<String> {
    fn into_key_path(self) -> TesseraResult<KeyPath> {
        KeyPath::new(self)
    }
}
