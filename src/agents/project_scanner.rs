use crate::config::Config;
use crate::error::{Result, TfbumpError};
use globset::{Glob, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// ProjectScannerAgent discovers the configuration files under the scan root
pub struct ProjectScannerAgent {
    root: PathBuf,
    matcher: GlobMatcher,
    exclude_dirs: Vec<String>,
}

impl ProjectScannerAgent {
    pub fn new(config: &Config) -> Result<Self> {
        let matcher = Glob::new(&config.file_pattern)
            .map_err(|e| {
                TfbumpError::Config(format!("Invalid file pattern '{}': {e}", config.file_pattern))
            })?
            .compile_matcher();

        Ok(Self {
            root: config.root.clone(),
            matcher,
            exclude_dirs: config.exclude_dirs.clone(),
        })
    }

    /// Walks the root and returns matching files in walk order (entries
    /// sorted by name within each directory).
    pub fn discover(&self) -> Result<ProjectInfo> {
        if !self.root.is_dir() {
            return Err(TfbumpError::ProjectValidation(format!(
                "'{}' is not a directory",
                self.root.display()
            )));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_excluded(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                TfbumpError::ProjectValidation(format!(
                    "Failed to walk '{}': {e}",
                    self.root.display()
                ))
            })?;
            if entry.file_type().is_file() && self.matcher.is_match(entry.file_name()) {
                files.push(entry.into_path());
            }
        }

        tracing::debug!(root = %self.root.display(), count = files.len(), "discovered files");
        Ok(ProjectInfo {
            root: self.root.clone(),
            files,
        })
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.exclude_dirs.iter().any(|d| d == name))
    }
}

#[derive(Debug, Clone)]
pub struct ProjectInfo {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl ProjectInfo {
    /// `path` relative to the scan root, for display.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}
