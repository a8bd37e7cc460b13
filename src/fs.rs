use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use tracing::warn;

use crate::error::ManifestError;

/// Read-only view of the dataset tree used by the resolver.
///
/// "Does not exist" is never an error: `is_dir` answers `false`. Anything
/// else (permission denied, I/O failure) is reported as
/// [`ManifestError::Filesystem`].
pub trait DatasetFs {
    fn is_dir(&self, path: &Utf8Path) -> Result<bool, ManifestError>;

    /// Regular files directly inside `dir`, sorted by path.
    fn list_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError>;

    /// Regular files anywhere below `dir`, sorted by path.
    fn walk_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError>;
}

impl<T: DatasetFs + ?Sized> DatasetFs for &T {
    fn is_dir(&self, path: &Utf8Path) -> Result<bool, ManifestError> {
        (**self).is_dir(path)
    }

    fn list_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError> {
        (**self).list_files(dir)
    }

    fn walk_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError> {
        (**self).walk_files(dir)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl DatasetFs for RealFs {
    fn is_dir(&self, path: &Utf8Path) -> Result<bool, ManifestError> {
        match fs::metadata(path.as_std_path()) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if is_absent(&err) => Ok(false),
            Err(err) => Err(ManifestError::filesystem(path, err)),
        }
    }

    fn list_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError> {
        let mut files = Vec::new();
        let entries =
            fs::read_dir(dir.as_std_path()).map_err(|err| ManifestError::filesystem(dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| ManifestError::filesystem(dir, err))?;
            let Some(path) = utf8_or_skip(entry.path()) else {
                continue;
            };
            if points_to_file(&path)? {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn walk_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError> {
        let mut files = Vec::new();
        let mut stack = vec![dir.to_path_buf()];
        while let Some(current) = stack.pop() {
            let entries = fs::read_dir(current.as_std_path())
                .map_err(|err| ManifestError::filesystem(&current, err))?;
            for entry in entries {
                let entry = entry.map_err(|err| ManifestError::filesystem(&current, err))?;
                let Some(path) = utf8_or_skip(entry.path()) else {
                    continue;
                };
                let file_type = entry
                    .file_type()
                    .map_err(|err| ManifestError::filesystem(&path, err))?;
                if file_type.is_dir() {
                    stack.push(path);
                } else if file_type.is_file() || (file_type.is_symlink() && points_to_file(&path)?)
                {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Makes `path` absolute against the working directory and removes `.` and
/// `..` components lexically, so roots can be compared with `starts_with`.
pub fn normalize_root(path: &Utf8Path) -> Result<Utf8PathBuf, ManifestError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|err| ManifestError::filesystem(".", err))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|cwd| {
            ManifestError::filesystem(".", format!("non UTF-8 working directory {}", cwd.display()))
        })?;
        cwd.join(path)
    };

    let mut normalized = Utf8PathBuf::new();
    for component in absolute.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_str()),
        }
    }
    Ok(normalized)
}

// Paths that cannot exist at all (over-long or NUL-bearing names) count as
// absent, like plain not-found.
fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::InvalidInput
            | io::ErrorKind::InvalidFilename
    )
}

// Follows symlinks; dangling links are not files.
fn points_to_file(path: &Utf8Path) -> Result<bool, ManifestError> {
    match fs::metadata(path.as_std_path()) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if is_absent(&err) => Ok(false),
        Err(err) => Err(ManifestError::filesystem(path, err)),
    }
}

fn utf8_or_skip(path: PathBuf) -> Option<Utf8PathBuf> {
    match Utf8PathBuf::from_path_buf(path) {
        Ok(path) => Some(path),
        Err(path) => {
            warn!(path = %path.display(), "skipping non UTF-8 file name");
            None
        }
    }
}

/// In-memory dataset tree for tests and dry runs against a fixture.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    files: BTreeSet<Utf8PathBuf>,
    dirs: BTreeSet<Utf8PathBuf>,
    denied: BTreeSet<Utf8PathBuf>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.add_file(path);
        self
    }

    pub fn with_dir(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.add_dir(path);
        self
    }

    pub fn add_file(&mut self, path: impl Into<Utf8PathBuf>) {
        let path = path.into();
        self.add_ancestors(&path);
        self.files.insert(path);
    }

    pub fn add_dir(&mut self, path: impl Into<Utf8PathBuf>) {
        let path = path.into();
        self.add_ancestors(&path);
        self.dirs.insert(path);
    }

    /// Makes every access at or below `path` fail with "permission denied".
    pub fn deny(&mut self, path: impl Into<Utf8PathBuf>) {
        self.denied.insert(path.into());
    }

    fn add_ancestors(&mut self, path: &Utf8Path) {
        for ancestor in path.ancestors().skip(1) {
            if !ancestor.as_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
    }

    fn check_access(&self, path: &Utf8Path) -> Result<(), ManifestError> {
        match self.denied.iter().find(|denied| path.starts_with(denied)) {
            Some(denied) => Err(ManifestError::filesystem(
                denied.as_path(),
                io::Error::from(io::ErrorKind::PermissionDenied),
            )),
            None => Ok(()),
        }
    }
}

impl DatasetFs for MemoryFs {
    fn is_dir(&self, path: &Utf8Path) -> Result<bool, ManifestError> {
        self.check_access(path)?;
        Ok(self.dirs.contains(path))
    }

    fn list_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError> {
        self.check_access(dir)?;
        Ok(self
            .files
            .iter()
            .filter(|file| file.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn walk_files(&self, dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ManifestError> {
        self.check_access(dir)?;
        if let Some(denied) = self.denied.iter().find(|denied| denied.starts_with(dir)) {
            return Err(ManifestError::filesystem(
                denied.as_path(),
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        Ok(self
            .files
            .iter()
            .filter(|file| file.starts_with(dir) && file.as_path() != dir)
            .cloned()
            .collect())
    }
}
