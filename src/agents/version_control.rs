use crate::error::{Result, TfbumpError};
use crate::utils::path_validator::PathValidator;
use crate::version::Version;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// VersionControlAgent reads release tags with hardened input validation.
pub struct VersionControlAgent {
    project_path: PathBuf,
}

impl VersionControlAgent {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Result<Self> {
        let project_path = Self::validate_git_path(project_path.as_ref())?;
        Ok(Self { project_path })
    }

    /// Newest version among the repository's tags, if any tag parses.
    pub fn latest_tag_version(&self) -> Result<Option<Version>> {
        let output = self.run_git(&["for-each-ref", "--format=%(refname)", "refs/tags"])?;
        Self::ensure_success(&output, "git for-each-ref")?;
        Ok(latest_version_from_refs(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    fn run_git(&self, args: &[&str]) -> Result<Output> {
        Command::new("git")
            .current_dir(&self.project_path)
            .args(args)
            .output()
            .map_err(|e| {
                TfbumpError::GitOperation(format!(
                    "Failed to execute git command '{}': {e}",
                    args.join(" ")
                ))
            })
    }

    fn ensure_success(output: &Output, command: &str) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        Err(TfbumpError::GitOperation(format!(
            "{} failed: {}",
            command,
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }

    fn validate_git_path(path: &Path) -> Result<PathBuf> {
        let dangerous = [';', '|', '&', '$', '`', '\n', '\r'];
        let path_str = path.to_string_lossy();
        if let Some(ch) = dangerous.iter().find(|c| path_str.contains(**c)) {
            return Err(TfbumpError::GitOperation(format!(
                "Path contains dangerous character: '{}'",
                ch
            )));
        }

        if !path.is_absolute() {
            return Err(TfbumpError::GitOperation(
                "Only absolute paths are allowed for Git operations".to_string(),
            ));
        }

        PathValidator::validate_scan_root(path)
            .map_err(|err| TfbumpError::GitOperation(format!("Invalid Git path: {}", err)))
    }
}

/// Picks the newest version out of `refs/tags/...` lines.
///
/// Only the segment after the last `/` is considered, so `refs/tags/v1.3.0`
/// and `refs/tags/release/1.3.0` both read as `1.3.0`. Tags that are not
/// versions are skipped.
pub fn latest_version_from_refs(refs: &str) -> Option<Version> {
    refs.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let name = line.rsplit('/').next().unwrap_or(line);
            match Version::parse(name) {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::debug!(tag = line, error = %e, "skipping non-version tag");
                    None
                }
            }
        })
        .max()
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{tempdir, tempdir_in};

    #[test]
    fn rejects_relative_paths() {
        let cwd = std::env::current_dir().unwrap();
        let temp = tempdir_in(&cwd).unwrap();
        let relative = PathBuf::from(temp.path().file_name().unwrap());
        assert!(VersionControlAgent::new(&relative).is_err());
    }

    #[test]
    fn rejects_dangerous_paths() {
        let dir = tempdir().unwrap();
        let dangerous = dir.path().join("sub;dir");
        fs::create_dir_all(&dangerous).unwrap();
        assert!(VersionControlAgent::new(dangerous).is_err());
    }

    #[test]
    fn picks_newest_tag_by_version_order() {
        let refs = "refs/tags/v1.2.0\nrefs/tags/v1.10.0\nrefs/tags/v1.3.0\n";
        assert_eq!(latest_version_from_refs(refs).unwrap().to_string(), "1.10.0");
    }

    #[test]
    fn skips_tags_that_are_not_versions() {
        let refs = "refs/tags/latest\nrefs/tags/v1.3.0\nrefs/tags/release/candidate\nrefs/tags/nightly-2024\n";
        assert_eq!(latest_version_from_refs(refs).unwrap().to_string(), "1.3.0");
        assert!(latest_version_from_refs("refs/tags/latest\n").is_none());
        assert!(latest_version_from_refs("").is_none());
    }

    #[test]
    fn reads_newest_version_tag_from_repository() {
        let dir = tempdir().unwrap();
        if !testing::init_repo(dir.path(), &["v1.2.0", "not-a-version", "v1.3.0", "release/0.9.0"]) {
            return;
        }
        let agent = VersionControlAgent::new(dir.path().canonicalize().unwrap()).unwrap();
        assert_eq!(agent.latest_tag_version().unwrap().unwrap().to_string(), "1.3.0");
    }

    #[test]
    fn repository_without_tags_has_no_version() {
        let dir = tempdir().unwrap();
        if !testing::init_repo(dir.path(), &[]) {
            return;
        }
        let agent = VersionControlAgent::new(dir.path().canonicalize().unwrap()).unwrap();
        assert_eq!(agent.latest_tag_version().unwrap(), None);
    }

    #[test]
    fn uses_final_path_segment() {
        let refs = "refs/tags/modules/vpc/2.0.0\n";
        assert_eq!(latest_version_from_refs(refs).unwrap().to_string(), "2.0.0");
    }
}
