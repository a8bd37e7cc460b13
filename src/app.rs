use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::config::ResolvedConfig;
use crate::dialect::{DialectSniffer, SAMPLE_SIZE};
use crate::error::ManifestError;
use crate::fs::DatasetFs;
use crate::manifest::{Manifest, ManifestBuilder, ManifestDocument, MissingList};
use crate::records::{IdentifierReader, open_identifiers};
use crate::resolver::FileResolver;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub manifest: Manifest,
    pub missing: MissingList,
    pub output: Utf8PathBuf,
    pub written: bool,
}

pub struct App<F: DatasetFs> {
    config: ResolvedConfig,
    resolver: FileResolver<F>,
}

impl<F: DatasetFs> App<F> {
    pub fn new(config: ResolvedConfig, fs: F) -> Result<Self, ManifestError> {
        let resolver = FileResolver::new(
            fs,
            config.dataset_root.clone(),
            config.repository_root.clone(),
        )?;
        Ok(Self { config, resolver })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Reads the configured CSV and resolves every identifier in it.
    pub fn build(&self) -> Result<(Manifest, MissingList), ManifestError> {
        let identifiers = open_identifiers(&self.config.csv_path)?;
        ManifestBuilder::build(&self.resolver, identifiers)
    }

    /// Same as [`App::build`] for CSV content already in memory.
    pub fn build_from_bytes(&self, csv: &[u8]) -> Result<(Manifest, MissingList), ManifestError> {
        let sample = &csv[..csv.len().min(SAMPLE_SIZE)];
        let identifiers = IdentifierReader::new(csv, DialectSniffer::sniff(sample))?;
        ManifestBuilder::build(&self.resolver, identifiers)
    }

    pub fn run(&self, options: RunOptions) -> Result<RunReport, ManifestError> {
        let (manifest, missing) = self.build()?;
        let output = self.config.output.clone();

        if options.dry_run {
            info!(path = %output, "dry run; manifest not written");
        } else {
            write_manifest(&output, &manifest.to_document(&self.config.remote))?;
            info!(path = %output, entries = manifest.count(), "manifest written");
        }

        Ok(RunReport {
            manifest,
            missing,
            output,
            written: !options.dry_run,
        })
    }
}

/// Pretty-prints `document` to `path` via a temp file in the same directory.
pub fn write_manifest(path: &Utf8Path, document: &ManifestDocument) -> Result<(), ManifestError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path()).map_err(|err| ManifestError::output(path, err))?;

    let content =
        serde_json::to_vec_pretty(document).map_err(|err| ManifestError::output(path, err))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".boltz-manifest")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| ManifestError::output(path, err))?;
    temp.write_all(&content)
        .map_err(|err| ManifestError::output(path, err))?;
    temp.persist(path.as_std_path())
        .map_err(|err| ManifestError::output(path, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RemoteBase;
    use crate::fs::MemoryFs;

    fn config() -> ResolvedConfig {
        ResolvedConfig {
            csv_path: Utf8PathBuf::from("unused.csv"),
            dataset_root: Utf8PathBuf::from("/repo/UniProt-Dataset"),
            repository_root: Utf8PathBuf::from("/repo"),
            output: Utf8PathBuf::from("unused.json"),
            remote: RemoteBase::new("https://host", "org", "data", "main"),
        }
    }

    #[test]
    fn paths_are_relative_to_repository_root() {
        let fs = MemoryFs::new()
            .with_file("/repo/UniProt-Dataset/P05067/P05067_Boltz-2/monomer_Boltz-2_P05067.cif")
            .with_file("/repo/UniProt-Dataset/P05067/P05067_Sequence/P05067.fasta");
        let app = App::new(config(), fs).unwrap();

        let (manifest, missing) = app.build_from_bytes(b"UniProt ID\nP05067\n").unwrap();
        assert!(missing.is_empty());
        assert_eq!(
            manifest.entries()[0].sequence_path,
            "UniProt-Dataset/P05067/P05067_Sequence/P05067.fasta"
        );
    }

    #[test]
    fn write_manifest_creates_parent_directories() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let output = root.join("nested/data/entries.json");
        let document = Manifest::default().to_document(&RemoteBase::new("h", "o", "r", "b"));

        write_manifest(&output, &document).unwrap();
        let content = std::fs::read_to_string(output.as_std_path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["count"], 0);
        assert!(value["entries"].as_array().unwrap().is_empty());
    }
}
