//! Identifier to file-pair resolution over the dataset layout
//!
//! ```text
//! <dataset_root>/<ID>/<ID>_Boltz-2/**/monomer_Boltz-2_<ID>*.{cif,mmcif}
//! <dataset_root>/<ID>/<ID>_Sequence/<ID>.fasta
//! ```
//!
//! Structure candidates are visited in sorted path order so that the same
//! tree always yields the same pick.

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::domain::{Identifier, ResolvedFileSet};
use crate::error::ManifestError;
use crate::fs::{DatasetFs, normalize_root};

pub const STRUCTURE_DIR_SUFFIX: &str = "_Boltz-2";
pub const SEQUENCE_DIR_SUFFIX: &str = "_Sequence";
pub const STRUCTURE_PREFIX: &str = "monomer_Boltz-2_";
pub const STRUCTURE_EXTENSIONS: [&str; 2] = ["cif", "mmcif"];
pub const SEQUENCE_EXTENSION: &str = "fasta";

// Characters allowed right after the identifier in a primary match. `-` is
// left out because it introduces isoform suffixes (`P05067-4`).
const NAME_SEPARATORS: [char; 2] = ['.', '_'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StructureRule {
    Primary,
    Fallback,
}

pub struct FileResolver<F: DatasetFs> {
    fs: F,
    dataset_root: Utf8PathBuf,
    repository_root: Utf8PathBuf,
}

impl<F: DatasetFs> FileResolver<F> {
    /// `repository_root` must equal `dataset_root` or be one of its ancestors
    /// once both are made absolute.
    pub fn new(
        fs: F,
        dataset_root: Utf8PathBuf,
        repository_root: Utf8PathBuf,
    ) -> Result<Self, ManifestError> {
        let dataset_root = normalize_root(&dataset_root)?;
        let repository_root = normalize_root(&repository_root)?;
        if !dataset_root.starts_with(&repository_root) {
            return Err(ManifestError::InvalidConfig(format!(
                "dataset root {dataset_root} is not inside repository root {repository_root}"
            )));
        }
        Ok(Self {
            fs,
            dataset_root,
            repository_root,
        })
    }

    pub fn dataset_root(&self) -> &Utf8Path {
        &self.dataset_root
    }

    pub fn resolve(&self, id: &Identifier) -> Result<ResolvedFileSet, ManifestError> {
        if !id.is_path_safe() {
            warn!(identifier = %id, "identifier is not a plain directory name; skipping lookup");
            return Ok(ResolvedFileSet::Unresolved);
        }

        let id_root = self.dataset_root.join(id.as_str());
        if !self.fs.is_dir(&id_root)? {
            debug!(identifier = %id, path = %id_root, "no dataset directory");
            return Ok(ResolvedFileSet::Unresolved);
        }

        let structure_dir = id_root.join(format!("{id}{STRUCTURE_DIR_SUFFIX}"));
        let sequence_dir = id_root.join(format!("{id}{SEQUENCE_DIR_SUFFIX}"));

        let structure = if self.fs.is_dir(&structure_dir)? {
            self.find_structure(id, &structure_dir)?
        } else {
            None
        };
        let sequence = if self.fs.is_dir(&sequence_dir)? {
            self.find_sequence(id, &sequence_dir)?
        } else {
            None
        };

        match (structure, sequence) {
            (Some(structure), Some(sequence)) => Ok(ResolvedFileSet::Resolved {
                structure_path: self.repository_relative(&structure)?,
                sequence_path: self.repository_relative(&sequence)?,
            }),
            (structure, sequence) => {
                debug!(
                    identifier = %id,
                    structure = structure.is_some(),
                    sequence = sequence.is_some(),
                    "incomplete file pair"
                );
                Ok(ResolvedFileSet::Unresolved)
            }
        }
    }

    fn find_structure(
        &self,
        id: &Identifier,
        dir: &Utf8Path,
    ) -> Result<Option<Utf8PathBuf>, ManifestError> {
        let candidates: Vec<Utf8PathBuf> = self
            .fs
            .walk_files(dir)?
            .into_iter()
            .filter(|path| has_structure_extension(path))
            .collect();

        let picked = pick_structure(id, &candidates);
        if let Some((path, rule)) = &picked {
            debug!(identifier = %id, path = %path, ?rule, "structure file selected");
        }
        Ok(picked.map(|(path, _)| path.clone()))
    }

    fn find_sequence(
        &self,
        id: &Identifier,
        dir: &Utf8Path,
    ) -> Result<Option<Utf8PathBuf>, ManifestError> {
        let expected = format!("{id}.{SEQUENCE_EXTENSION}");
        Ok(self
            .fs
            .list_files(dir)?
            .into_iter()
            .find(|path| path.file_name() == Some(expected.as_str())))
    }

    fn repository_relative(&self, path: &Utf8Path) -> Result<String, ManifestError> {
        let relative = path.strip_prefix(&self.repository_root).map_err(|_| {
            ManifestError::InvalidConfig(format!(
                "{path} is outside repository root {}",
                self.repository_root
            ))
        })?;
        Ok(relative
            .components()
            .map(|component| component.as_str())
            .collect::<Vec<_>>()
            .join("/"))
    }
}

fn has_structure_extension(path: &Utf8Path) -> bool {
    path.extension()
        .map(|ext| {
            STRUCTURE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// `monomer_Boltz-2_<ID>` followed by a separator or the extension.
fn is_primary_name(id: &Identifier, file_name: &str) -> bool {
    file_name
        .strip_prefix(STRUCTURE_PREFIX)
        .and_then(|rest| rest.strip_prefix(id.as_str()))
        .map(|rest| rest.starts_with(NAME_SEPARATORS))
        .unwrap_or(false)
}

fn pick_structure<'a>(
    id: &Identifier,
    candidates: &'a [Utf8PathBuf],
) -> Option<(&'a Utf8PathBuf, StructureRule)> {
    candidates
        .iter()
        .find(|path| is_primary_name(id, name_of(path)))
        .map(|path| (path, StructureRule::Primary))
        .or_else(|| {
            candidates
                .iter()
                .find(|path| name_of(path).contains(id.as_str()))
                .map(|path| (path, StructureRule::Fallback))
        })
}

fn name_of(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or("")
}
