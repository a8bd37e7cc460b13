use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest single path component accepted by common filesystems, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// An accession taken verbatim from a CSV cell. Only surrounding whitespace
/// is removed; case and isoform suffixes are preserved (`P05067` and
/// `P05067-4` are distinct).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Returns `None` when the trimmed cell is empty.
    pub fn from_cell(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier can be used as exactly one directory name
    /// below the dataset root.
    pub fn is_path_safe(&self) -> bool {
        let value = self.0.as_str();
        !(value == "."
            || value == ".."
            || value.len() > MAX_NAME_LEN
            || value.contains(['/', '\\', '\0']))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let delimiter = match self.delimiter {
            b'\t' => "tab".to_string(),
            other => format!("'{}'", other as char),
        };
        write!(f, "delimiter={delimiter} quote='{}'", self.quote as char)
    }
}

/// Outcome of looking up one identifier. A structure file without a sequence
/// file (or the reverse) is unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFileSet {
    Resolved {
        structure_path: String,
        sequence_path: String,
    },
    Unresolved,
}

impl ResolvedFileSet {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedFileSet::Resolved { .. })
    }
}

/// Raw-content URL prefix of the hosted dataset mirror, e.g.
/// `https://raw.githubusercontent.com/<owner>/<repository>/<branch>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBase(String);

impl RemoteBase {
    pub fn new(host: &str, owner: &str, repository: &str, branch: &str) -> Self {
        Self(format!(
            "{}/{owner}/{repository}/{branch}",
            host.trim_end_matches('/')
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn url_for(&self, relative_path: &str) -> String {
        format!("{}/{relative_path}", self.0)
    }
}

impl fmt::Display for RemoteBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_keeps_case_and_suffix() {
        let id = Identifier::from_cell("  P05067-4\t").unwrap();
        assert_eq!(id.as_str(), "P05067-4");
        let lower = Identifier::from_cell("p05067").unwrap();
        assert_ne!(lower, Identifier::from_cell("P05067").unwrap());
    }

    #[test]
    fn blank_cell_has_no_identifier() {
        assert!(Identifier::from_cell("   ").is_none());
        assert!(Identifier::from_cell("").is_none());
    }

    #[test]
    fn path_safety() {
        assert!(Identifier::from_cell("P05067").unwrap().is_path_safe());
        assert!(!Identifier::from_cell("..").unwrap().is_path_safe());
        assert!(!Identifier::from_cell("a/b").unwrap().is_path_safe());
        assert!(!Identifier::from_cell("a\\b").unwrap().is_path_safe());
        assert!(!Identifier::from_cell("P0\u{0}5067").unwrap().is_path_safe());
        assert!(!Identifier::from_cell(&"X".repeat(MAX_NAME_LEN + 1)).unwrap().is_path_safe());
        assert!(Identifier::from_cell(&"X".repeat(MAX_NAME_LEN)).unwrap().is_path_safe());
    }

    #[test]
    fn remote_base_urls() {
        let base = RemoteBase::new("https://raw.githubusercontent.com/", "BM-DB", "uniprot-data", "main");
        assert_eq!(
            base.url_for("P05067/P05067_Sequence/P05067.fasta"),
            "https://raw.githubusercontent.com/BM-DB/uniprot-data/main/P05067/P05067_Sequence/P05067.fasta"
        );
    }
}
