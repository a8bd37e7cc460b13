use std::collections::HashMap;

use crate::error::ManifestError;

/// Accepted spellings of the identifier column, in priority order.
pub const IDENTIFIER_HEADERS: [&str; 4] = ["uniprot id", "uniprot_id", "uniprot accession", "id"];

/// NBSP to space, trim, collapse inner whitespace, lowercase.
pub fn normalize_header(raw: &str) -> String {
    raw.replace('\u{00A0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized header text mapped to the header as written in the CSV.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    by_normalized: HashMap<String, String>,
}

impl HeaderMap {
    /// Empty headers are ignored. When two headers normalize to the same
    /// key, the later one wins.
    pub fn from_headers<'a, I>(headers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let by_normalized = headers
            .into_iter()
            .filter(|header| !header.is_empty())
            .map(|header| (normalize_header(header), header.to_string()))
            .collect();
        Self { by_normalized }
    }

    pub fn original(&self, normalized: &str) -> Option<&str> {
        self.by_normalized.get(normalized).map(String::as_str)
    }

    /// Original text of the identifier column.
    pub fn identifier_header(&self) -> Option<&str> {
        IDENTIFIER_HEADERS
            .iter()
            .find_map(|candidate| self.original(candidate))
    }
}

pub struct HeaderResolver;

impl HeaderResolver {
    pub fn resolve(headers: &[String]) -> Result<String, ManifestError> {
        let map = HeaderMap::from_headers(headers.iter().map(String::as_str));
        map.identifier_header()
            .map(str::to_string)
            .ok_or_else(|| ManifestError::MissingIdentifierColumn {
                seen: headers.to_vec(),
            })
    }
}
