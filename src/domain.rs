use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeggError;

/// KEGG organism code such as `hsa` (Homo sapiens) or `eco` (E. coli K-12).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganismCode(String);

impl OrganismCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganismCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrganismCode {
    type Err = KeggError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        let is_valid =
            !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !is_valid {
            return Err(KeggError::InvalidOrganismCode(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Organism-prefixed pathway identifier, e.g. `hsa00010`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathwayCode(String);

impl PathwayCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathwayCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PathwayCode {
    type Err = KeggError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_valid = !trimmed.is_empty() && trimmed.chars().all(|ch| ch.is_ascii_alphanumeric());
        if !is_valid {
            return Err(KeggError::InvalidPathwayCode(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// KEGG COMPOUND identifier: `C` followed by exactly five digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompoundCode(String);

impl CompoundCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompoundCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CompoundCode {
    type Err = KeggError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let digits = value.strip_prefix('C').unwrap_or_default();
        let is_valid = digits.len() == 5 && digits.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(KeggError::InvalidCompoundCode(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

/// One pathway and the compounds found in its KGML, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathwayCompoundRow {
    pub pathway: PathwayCode,
    pub compounds: Vec<CompoundCode>,
}

impl PathwayCompoundRow {
    pub fn new(pathway: PathwayCode) -> Self {
        Self {
            pathway,
            compounds: Vec::new(),
        }
    }

    /// Number of table cells, counting the pathway cell.
    pub fn cell_count(&self) -> usize {
        self.compounds.len() + 1
    }

    pub fn into_cells(self) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.cell_count());
        cells.push(self.pathway.0);
        cells.extend(self.compounds.into_iter().map(|code| code.0));
        cells
    }
}
