use crate::error::{Result, TfbumpError};
use std::path::{Path, PathBuf};

/// Path hardening for the scan root and the files rewritten beneath it.
pub struct PathValidator;

impl PathValidator {
    /// Canonicalizes the scan root and refuses files and system directories.
    pub fn validate_scan_root(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            TfbumpError::ProjectValidation(format!("Invalid path '{}': {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(TfbumpError::ProjectValidation(format!(
                "Path '{}' is not a directory",
                canonical.display()
            )));
        }

        const FORBIDDEN: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

        for forbidden in FORBIDDEN {
            let forbidden_path = Path::new(forbidden);
            let canonical_forbidden = forbidden_path
                .canonicalize()
                .unwrap_or_else(|_| forbidden_path.to_path_buf());

            if canonical.starts_with(forbidden_path) || canonical.starts_with(&canonical_forbidden)
            {
                return Err(TfbumpError::ProjectValidation(format!(
                    "Access to system directory '{forbidden}' is not allowed"
                )));
            }
        }

        Ok(canonical)
    }

    /// Ensures the file resolves to a location inside `base_dir`, so a
    /// symlink cannot redirect a rewrite outside the scan root.
    pub fn validate_file_path(
        file_path: impl AsRef<Path>,
        base_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file_path = file_path.as_ref();
        let base_dir = base_dir.as_ref();

        let canonical_file = file_path.canonicalize().map_err(|e| {
            TfbumpError::ProjectValidation(format!(
                "Invalid file path '{}': {e}",
                file_path.display()
            ))
        })?;

        let canonical_base = base_dir.canonicalize().map_err(|e| {
            TfbumpError::ProjectValidation(format!(
                "Invalid base directory '{}': {e}",
                base_dir.display()
            ))
        })?;

        if !canonical_file.starts_with(&canonical_base) {
            return Err(TfbumpError::ProjectValidation(format!(
                "'{}' is outside the scan root",
                file_path.display()
            )));
        }

        Ok(canonical_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn accepts_directory() {
        let dir = tempdir().unwrap();
        assert!(PathValidator::validate_scan_root(dir.path()).is_ok());
    }

    #[test]
    fn rejects_file_as_root() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("main.tf");
        fs::write(&file_path, "").unwrap();
        let err = PathValidator::validate_scan_root(&file_path).unwrap_err();
        assert!(matches!(err, TfbumpError::ProjectValidation(_)));
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempdir().unwrap();
        assert!(PathValidator::validate_scan_root(dir.path().join("absent")).is_err());
    }

    #[test]
    fn rejects_system_directory() {
        assert!(PathValidator::validate_scan_root("/etc").is_err());
    }

    #[test]
    fn rejects_file_outside_root() {
        let root = tempdir().unwrap();
        let other = tempdir().unwrap();
        let outside = other.path().join("main.tf");
        fs::write(&outside, "").unwrap();
        assert!(PathValidator::validate_file_path(&outside, root.path()).is_err());

        let inside = root.path().join("main.tf");
        fs::write(&inside, "").unwrap();
        assert!(PathValidator::validate_file_path(&inside, root.path()).is_ok());
    }
}
