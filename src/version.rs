use crate::error::{Result, TfbumpError};
use semver::{BuildMetadata, Prerelease};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed semantic version.
///
/// Parsing is lenient in the ways module registries and git tags tend to
/// be: a leading `v` is accepted and missing minor/patch components are
/// zero. Ordering and equality follow semver precedence, so build metadata
/// never participates in either.
#[derive(Debug, Clone)]
pub struct Version {
    inner: semver::Version,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);

        if body.is_empty() {
            return Err(TfbumpError::version_parse(input, "empty version string"));
        }

        let (rest, build) = match body.split_once('+') {
            Some((rest, build)) => (rest, Some(build)),
            None => (body, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let mut numbers = [0u64; 3];
        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(TfbumpError::version_parse(
                input,
                "more than three numeric components",
            ));
        }
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(TfbumpError::version_parse(
                    input,
                    format!("'{part}' is not a numeric component"),
                ));
            }
            *slot = part
                .parse()
                .map_err(|e| TfbumpError::version_parse(input, format!("{e}")))?;
        }

        let pre = match pre {
            Some(pre) => Prerelease::new(pre)
                .map_err(|e| TfbumpError::version_parse(input, e.to_string()))?,
            None => Prerelease::EMPTY,
        };
        let build = match build {
            Some(build) => BuildMetadata::new(build)
                .map_err(|e| TfbumpError::version_parse(input, e.to_string()))?,
            None => BuildMetadata::EMPTY,
        };

        Ok(Version {
            inner: semver::Version {
                major: numbers[0],
                minor: numbers[1],
                patch: numbers[2],
                pre,
                build,
            },
        })
    }

    pub fn major(&self) -> u64 {
        self.inner.major
    }

    pub fn is_prerelease(&self) -> bool {
        !self.inner.pre.is_empty()
    }
}

impl FromStr for Version {
    type Err = TfbumpError;

    fn from_str(s: &str) -> Result<Self> {
        Version::parse(s)
    }
}

/// Canonical form: no `v` prefix, all three components.
impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = &self.inner;
        let b = &other.inner;
        a.major
            .cmp(&b.major)
            .then(a.minor.cmp(&b.minor))
            .then(a.patch.cmp(&b.patch))
            .then_with(|| a.pre.cmp(&b.pre))
    }
}
