use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    #[error("could not find a UniProt ID column (case/space-insensitive)")]
    #[diagnostic(help("headers seen in the CSV: {seen:?}"))]
    MissingIdentifierColumn { seen: Vec<String> },

    #[error("missing config file boltz-manifest.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("missing required value `{0}`")]
    MissingConfigValue(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to open CSV at {path}: {message}")]
    CsvOpen { path: Utf8PathBuf, message: String },

    #[error("failed to read CSV: {0}")]
    CsvRead(String),

    #[error("filesystem error at {path}: {message}")]
    Filesystem { path: Utf8PathBuf, message: String },

    #[error("failed to write manifest to {path}: {message}")]
    OutputWrite { path: Utf8PathBuf, message: String },
}

impl ManifestError {
    pub fn filesystem(path: impl Into<Utf8PathBuf>, err: impl ToString) -> Self {
        ManifestError::Filesystem {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn output(path: impl Into<Utf8PathBuf>, err: impl ToString) -> Self {
        ManifestError::OutputWrite {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
