use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::RemoteBase;
use crate::error::ManifestError;
use crate::fs::normalize_root;

pub const DEFAULT_CONFIG_FILE: &str = "boltz-manifest.json";
pub const DEFAULT_HOST: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub csv_path: Option<String>,
    #[serde(default)]
    pub dataset_root: Option<String>,
    #[serde(default)]
    pub repository_root: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Command-line values; each one replaces the matching config file field.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub csv_path: Option<String>,
    pub dataset_root: Option<String>,
    pub repository_root: Option<String>,
    pub output: Option<String>,
    pub host: Option<String>,
    pub owner: Option<String>,
    pub repository: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub csv_path: Utf8PathBuf,
    pub dataset_root: Utf8PathBuf,
    pub repository_root: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub remote: RemoteBase,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `path` (or `boltz-manifest.json` when `None`) and applies the
    /// overrides. Without an explicit path a missing default file is fine
    /// as long as the overrides supply every required value.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, ManifestError> {
        let config_path = Utf8PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_FILE));

        if path.is_none() && !config_path.as_std_path().exists() {
            return Self::resolve_without_file(overrides);
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| ManifestError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ManifestError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config, overrides)
    }

    // Only an absent value means the config file was needed; other
    // validation failures are reported as they are.
    fn resolve_without_file(overrides: ConfigOverrides) -> Result<ResolvedConfig, ManifestError> {
        Self::resolve_config(Config::default(), overrides).map_err(|err| match err {
            ManifestError::MissingConfigValue(_) => ManifestError::MissingConfig,
            other => other,
        })
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, ManifestError> {
        let csv_path = required("csv_path", overrides.csv_path.or(config.csv_path))?;
        let dataset_root = required("dataset_root", overrides.dataset_root.or(config.dataset_root))?;
        let output = required("output", overrides.output.or(config.output))?;
        let repository_root = overrides
            .repository_root
            .or(config.repository_root)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| dataset_root.clone());

        let host = overrides
            .host
            .or(config.remote.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let owner = required("remote.owner", overrides.owner.or(config.remote.owner))?;
        let repository = required(
            "remote.repository",
            overrides.repository.or(config.remote.repository),
        )?;
        let branch = overrides
            .branch
            .or(config.remote.branch)
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        if host.trim().is_empty() || branch.trim().is_empty() {
            return Err(ManifestError::InvalidConfig(
                "remote host and branch must not be empty".to_string(),
            ));
        }

        let dataset_root = normalize_root(Utf8Path::new(&dataset_root))?;
        let repository_root = normalize_root(Utf8Path::new(&repository_root))?;
        if !dataset_root.starts_with(&repository_root) {
            return Err(ManifestError::InvalidConfig(format!(
                "dataset_root {dataset_root} must be inside repository_root {repository_root}"
            )));
        }

        Ok(ResolvedConfig {
            csv_path: Utf8PathBuf::from(csv_path),
            dataset_root,
            repository_root,
            output: Utf8PathBuf::from(output),
            remote: RemoteBase::new(&host, &owner, &repository, &branch),
        })
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, ManifestError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ManifestError::MissingConfigValue(name.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn base_config() -> Config {
        Config {
            csv_path: Some("ids.csv".to_string()),
            dataset_root: Some("/data/uniprot-data/UniProt-Dataset".to_string()),
            repository_root: None,
            output: Some("out/entries.json".to_string()),
            remote: RemoteConfig {
                host: None,
                owner: Some("BM-DB".to_string()),
                repository: Some("uniprot-data".to_string()),
                branch: None,
            },
        }
    }

    #[test]
    fn defaults_fill_host_branch_and_repository_root() {
        let resolved =
            ConfigLoader::resolve_config(base_config(), ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.repository_root, resolved.dataset_root);
        assert_eq!(
            resolved.remote.as_str(),
            "https://raw.githubusercontent.com/BM-DB/uniprot-data/main"
        );
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = ConfigOverrides {
            branch: Some("dev".to_string()),
            csv_path: Some("other.csv".to_string()),
            ..ConfigOverrides::default()
        };
        let resolved = ConfigLoader::resolve_config(base_config(), overrides).unwrap();
        assert_eq!(resolved.csv_path, Utf8PathBuf::from("other.csv"));
        assert!(resolved.remote.as_str().ends_with("/dev"));
    }

    #[test]
    fn dataset_root_must_sit_under_repository_root() {
        let mut config = base_config();
        config.repository_root = Some("/elsewhere".to_string());
        let err = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap_err();
        assert_matches!(err, ManifestError::InvalidConfig(_));
    }

    #[test]
    fn missing_owner_is_reported_by_name() {
        let mut config = base_config();
        config.remote.owner = None;
        let err = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap_err();
        assert_matches!(err, ManifestError::MissingConfigValue(name) if name == "remote.owner");
    }

    #[test]
    fn without_file_only_absent_values_mean_missing_config() {
        let absent = ConfigLoader::resolve_without_file(ConfigOverrides {
            csv_path: Some("ids.csv".to_string()),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
        assert_matches!(absent, ManifestError::MissingConfig);

        let outside = ConfigLoader::resolve_without_file(ConfigOverrides {
            csv_path: Some("ids.csv".to_string()),
            dataset_root: Some("/data/UniProt-Dataset".to_string()),
            repository_root: Some("/elsewhere".to_string()),
            output: Some("entries.json".to_string()),
            owner: Some("BM-DB".to_string()),
            repository: Some("uniprot-data".to_string()),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
        assert_matches!(outside, ManifestError::InvalidConfig(message) if message.contains("/elsewhere"));

        let blank_branch = ConfigLoader::resolve_without_file(ConfigOverrides {
            csv_path: Some("ids.csv".to_string()),
            dataset_root: Some("/data/UniProt-Dataset".to_string()),
            output: Some("entries.json".to_string()),
            owner: Some("BM-DB".to_string()),
            repository: Some("uniprot-data".to_string()),
            branch: Some(" ".to_string()),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
        assert_matches!(blank_branch, ManifestError::InvalidConfig(_));
    }

    #[test]
    fn current_directory_repository_root_contains_relative_dataset_root() {
        let mut config = base_config();
        config.repository_root = Some(".".to_string());
        config.dataset_root = Some("UniProt-Dataset".to_string());
        let resolved = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap();

        let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir().unwrap()).unwrap();
        assert_eq!(resolved.repository_root, cwd);
        assert_eq!(resolved.dataset_root, cwd.join("UniProt-Dataset"));
    }

    #[test]
    fn relative_dataset_root_under_absolute_repository_root() {
        let cwd = Utf8PathBuf::from_path_buf(std::env::current_dir().unwrap()).unwrap();
        let mut config = base_config();
        config.repository_root = Some(cwd.to_string());
        config.dataset_root = Some("./data/../UniProt-Dataset".to_string());
        let resolved = ConfigLoader::resolve_config(config, ConfigOverrides::default()).unwrap();
        assert_eq!(resolved.dataset_root, cwd.join("UniProt-Dataset"));

        let mut escaping = base_config();
        escaping.repository_root = Some(cwd.to_string());
        escaping.dataset_root = Some("../UniProt-Dataset".to_string());
        let err = ConfigLoader::resolve_config(escaping, ConfigOverrides::default()).unwrap_err();
        assert_matches!(err, ManifestError::InvalidConfig(_));
    }
}
