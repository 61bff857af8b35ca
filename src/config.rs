use crate::cli::Cli;
use crate::error::{Result, TfbumpError};
use crate::registry::DEFAULT_REGISTRY;
use crate::utils::path_validator::PathValidator;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".tfbump.toml";

/// Settings for one run, passed explicitly to every stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Canonicalized scan root.
    pub root: PathBuf,
    pub registry: String,
    pub file_pattern: String,
    pub exclude_dirs: Vec<String>,
    /// Provider whose identification literal tracks the repository version.
    pub tracked_provider: String,
    pub identification_attribute: String,
    pub format_on_write: bool,
    pub stable_only: bool,
    pub dry_run: bool,
}

impl Config {
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root,
            registry: DEFAULT_REGISTRY.to_string(),
            file_pattern: "*.tf".to_string(),
            exclude_dirs: vec![".terraform".to_string(), ".git".to_string()],
            tracked_provider: "awscc".to_string(),
            identification_attribute: "user_agent".to_string(),
            format_on_write: false,
            stable_only: false,
            dry_run: false,
        }
    }

    /// Builds the run configuration: defaults, then the config file, then
    /// command-line flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = PathValidator::validate_scan_root(&cli.path)?;
        let mut config = Self::with_root(root);

        let file = match &cli.config {
            Some(path) => Some(FileConfig::read(path)?),
            None => {
                let default_path = config.root.join(CONFIG_FILE_NAME);
                if default_path.is_file() {
                    Some(FileConfig::read(&default_path)?)
                } else {
                    None
                }
            }
        };
        if let Some(file) = file {
            config.apply(file);
        }

        config.stable_only |= cli.stable_only;
        config.dry_run = cli.dry_run;
        config.format_on_write |= cli.format;

        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, file: FileConfig) {
        if let Some(registry) = file.registry {
            self.registry = registry;
        }
        if let Some(pattern) = file.file_pattern {
            self.file_pattern = pattern;
        }
        if let Some(exclude) = file.exclude_dirs {
            self.exclude_dirs = exclude;
        }
        if let Some(provider) = file.tracked_provider {
            self.tracked_provider = provider;
        }
        if let Some(attribute) = file.identification_attribute {
            self.identification_attribute = attribute;
        }
        if let Some(format) = file.format_on_write {
            self.format_on_write = format;
        }
        if let Some(stable_only) = file.stable_only {
            self.stable_only = stable_only;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.file_pattern.trim().is_empty() {
            return Err(TfbumpError::Config("file_pattern may not be empty".into()));
        }
        if self.tracked_provider.trim().is_empty() {
            return Err(TfbumpError::Config(
                "tracked_provider may not be empty".into(),
            ));
        }
        if self.identification_attribute.trim().is_empty() {
            return Err(TfbumpError::Config(
                "identification_attribute may not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// On-disk form of `.tfbump.toml`; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    registry: Option<String>,
    file_pattern: Option<String>,
    exclude_dirs: Option<Vec<String>>,
    tracked_provider: Option<String>,
    identification_attribute: Option<String>,
    format_on_write: Option<bool>,
    stable_only: Option<bool>,
}

impl FileConfig {
    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            TfbumpError::Config(format!("Failed to read '{}': {e}", path.display()))
        })?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tfbump").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_without_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().to_str().unwrap();
        let config = Config::load(&cli(&["--path", path])).unwrap();
        assert_eq!(config.root, dir.path().canonicalize().unwrap());
        assert_eq!(config.registry, DEFAULT_REGISTRY);
        assert_eq!(config.file_pattern, "*.tf");
        assert_eq!(config.tracked_provider, "awscc");
        assert!(!config.format_on_write);
        assert!(!config.dry_run);
    }

    #[test]
    fn config_file_then_flags() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "registry = \"https://registry.example.com\"\ntracked_provider = \"aws\"\nformat_on_write = false\n",
        )
        .unwrap();
        let path = dir.path().to_str().unwrap();
        let config = Config::load(&cli(&["--path", path, "--format", "--dry-run"])).unwrap();
        assert_eq!(config.registry, "https://registry.example.com");
        assert_eq!(config.tracked_provider, "aws");
        assert!(config.format_on_write);
        assert!(config.dry_run);
    }

    #[test]
    fn rejects_unknown_keys() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("custom.toml");
        fs::write(&file, "registy = \"typo\"\n").unwrap();
        let path = dir.path().to_str().unwrap();
        let config_path = file.to_str().unwrap();
        let err = Config::load(&cli(&["--path", path, "--config", config_path])).unwrap_err();
        assert!(matches!(err, TfbumpError::Toml(_)));
    }

    #[test]
    fn rejects_empty_pattern() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "file_pattern = \"\"\n").unwrap();
        let path = dir.path().to_str().unwrap();
        assert!(matches!(
            Config::load(&cli(&["--path", path])),
            Err(TfbumpError::Config(_))
        ));
    }
}
