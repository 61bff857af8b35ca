use crate::error::{Result, TfbumpError};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces `path` with `contents` without ever exposing a partial file.
///
/// The data goes to a temporary file in the same directory, which takes
/// over the original's permissions, is synced, and is then renamed onto
/// `path`.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let persistence = |message: String| TfbumpError::Persistence {
        path: path.to_path_buf(),
        message,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| persistence(format!("cannot create temporary file: {e}")))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| persistence(format!("write failed: {e}")))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| persistence(format!("sync failed: {e}")))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|e| persistence(format!("cannot copy permissions: {e}")))?;
    }

    temp.persist(path)
        .map_err(|e| persistence(format!("rename failed: {}", e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn replaces_file_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.tf");
        fs::write(&path, "old").unwrap();
        atomic_write(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[cfg(unix)]
    #[test]
    fn keeps_original_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("main.tf");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        atomic_write(&path, "new").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn reports_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("main.tf");
        assert!(matches!(
            atomic_write(&path, "x"),
            Err(TfbumpError::Persistence { .. })
        ));
    }
}
