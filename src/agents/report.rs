use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Module,
    Provider,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditKind::Module => f.write_str("module"),
            EditKind::Provider => f.write_str("provider"),
        }
    }
}

/// One applied version change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub file: PathBuf,
    pub kind: EditKind,
    /// Module source or provider name.
    pub subject: String,
    pub old: String,
    pub new: String,
}

/// Something that could not be processed, with where and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub file: PathBuf,
    /// Block the issue belongs to, or `None` when the whole file is affected.
    pub block: Option<String>,
    pub reason: String,
}

/// Tracks what a run changed and what it had to leave alone.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub edits: Vec<Edit>,
    /// Errors: unreadable files, failed lookups, rejected edits.
    pub failures: Vec<Issue>,
    /// Expected non-edits such as a module with no compatible version.
    pub skipped: Vec<Issue>,
    pub files_scanned: usize,
    pub files_rewritten: Vec<PathBuf>,
}

impl UpdateReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_edit(
        &mut self,
        file: &Path,
        kind: EditKind,
        subject: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) {
        let edit = Edit {
            file: file.to_path_buf(),
            kind,
            subject: subject.into(),
            old: old.into(),
            new: new.into(),
        };
        tracing::info!(
            file = %edit.file.display(),
            block = %format!("{} {}", edit.kind, edit.subject),
            old = %edit.old,
            new = %edit.new,
            "version updated"
        );
        self.edits.push(edit);
    }

    pub fn record_failure(&mut self, file: &Path, block: Option<&str>, reason: impl fmt::Display) {
        let issue = Issue {
            file: file.to_path_buf(),
            block: block.map(str::to_string),
            reason: reason.to_string(),
        };
        tracing::warn!(
            file = %issue.file.display(),
            block = issue.block.as_deref().unwrap_or("-"),
            reason = %issue.reason,
            "update failed"
        );
        self.failures.push(issue);
    }

    pub fn record_skip(&mut self, file: &Path, block: Option<&str>, reason: impl fmt::Display) {
        let issue = Issue {
            file: file.to_path_buf(),
            block: block.map(str::to_string),
            reason: reason.to_string(),
        };
        tracing::debug!(
            file = %issue.file.display(),
            block = issue.block.as_deref().unwrap_or("-"),
            reason = %issue.reason,
            "left unchanged"
        );
        self.skipped.push(issue);
    }

    /// Check if any updates were applied
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn total_updates(&self) -> usize {
        self.edits.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_edits_failures_and_skips_separately() {
        let mut report = UpdateReport::new();
        assert!(report.is_empty());

        let file = Path::new("main.tf");
        report.record_edit(file, EditKind::Module, "terraform-aws-modules/vpc/aws", "3.4.0", "3.5.1");
        report.record_skip(file, Some("module \"legacy\""), "no 2.x release");
        assert!(!report.is_empty());
        assert!(!report.has_failures());

        report.record_failure(Path::new("broken.tf"), None, "parse error");
        assert!(report.has_failures());
        assert_eq!(report.total_updates(), 1);
        assert_eq!(report.failures[0].file, Path::new("broken.tf"));
        assert_eq!(report.skipped[0].block.as_deref(), Some("module \"legacy\""));
    }
}
