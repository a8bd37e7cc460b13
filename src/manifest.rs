use serde::Serialize;
use tracing::info;

use crate::domain::{Identifier, RemoteBase, ResolvedFileSet};
use crate::error::ManifestError;
use crate::fs::DatasetFs;
use crate::resolver::FileResolver;

/// Number of missing identifiers shown in the console summary.
pub const MISSING_PREVIEW_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub identifier: Identifier,
    pub structure_path: String,
    pub sequence_path: String,
}

/// Resolved entries in CSV row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn to_document(&self, remote: &RemoteBase) -> ManifestDocument {
        ManifestDocument {
            count: self.count(),
            entries: self
                .entries
                .iter()
                .map(|entry| DocumentEntry {
                    uniprot_id: entry.identifier.as_str().to_string(),
                    files: DocumentFiles {
                        structure_cif: remote.url_for(&entry.structure_path),
                        sequence_fasta: remote.url_for(&entry.sequence_path),
                    },
                })
                .collect(),
        }
    }
}

/// Identifiers that did not resolve, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingList(Vec<Identifier>);

impl MissingList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.0.iter()
    }

    pub fn preview(&self, limit: usize) -> Vec<String> {
        self.0
            .iter()
            .take(limit)
            .map(|id| id.as_str().to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManifestDocument {
    pub count: usize,
    pub entries: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentEntry {
    pub uniprot_id: String,
    pub files: DocumentFiles,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentFiles {
    pub structure_cif: String,
    pub sequence_fasta: String,
}

#[derive(Debug, Default)]
pub struct ManifestBuilder {
    entries: Vec<ManifestEntry>,
    missing: Vec<Identifier>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every identifier in order. The first CSV or filesystem
    /// error aborts the build.
    pub fn build<F, I>(
        resolver: &FileResolver<F>,
        identifiers: I,
    ) -> Result<(Manifest, MissingList), ManifestError>
    where
        F: DatasetFs,
        I: IntoIterator<Item = Result<Identifier, ManifestError>>,
    {
        let mut builder = Self::new();
        for identifier in identifiers {
            let identifier = identifier?;
            let outcome = resolver.resolve(&identifier)?;
            builder.record(identifier, outcome);
        }
        let (manifest, missing) = builder.finish();
        info!(
            resolved = manifest.count(),
            missing = missing.len(),
            "manifest built"
        );
        Ok((manifest, missing))
    }

    pub fn record(&mut self, identifier: Identifier, outcome: ResolvedFileSet) {
        match outcome {
            ResolvedFileSet::Resolved {
                structure_path,
                sequence_path,
            } => self.entries.push(ManifestEntry {
                identifier,
                structure_path,
                sequence_path,
            }),
            ResolvedFileSet::Unresolved => self.missing.push(identifier),
        }
    }

    pub fn finish(self) -> (Manifest, MissingList) {
        (
            Manifest {
                entries: self.entries,
            },
            MissingList(self.missing),
        )
    }
}
