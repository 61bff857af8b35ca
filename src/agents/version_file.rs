use crate::error::{Result, TfbumpError};
use crate::version::Version;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const VERSION_FILE_NAME: &str = "VERSION";

/// Reads the single-line `VERSION` marker at the scan root.
///
/// A missing file is `Ok(None)`; unreadable or malformed content is an
/// error so the caller can decide whether another source can stand in.
pub fn read_version_marker(root: &Path) -> Result<Option<Version>> {
    let path = root.join(VERSION_FILE_NAME);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(TfbumpError::Io(e)),
    };

    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(first) = lines.next() else {
        return Err(TfbumpError::version_parse("", "VERSION file is empty"));
    };
    if lines.next().is_some() {
        return Err(TfbumpError::version_parse(
            content.trim(),
            "VERSION file must hold a single line",
        ));
    }

    Version::parse(first).map(Some)
}
