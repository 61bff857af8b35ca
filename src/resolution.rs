use crate::version::Version;

/// Outcome of resolving one module pin against its catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The pin already equals the newest version of its major family.
    Current,
    /// The pin should move to this version.
    Retarget(Version),
    /// The catalog publishes nothing in the pin's major family.
    NoCompatibleVersion,
}

/// Decides what a pinned version should become.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionPolicy {
    /// Ignore pre-release versions when picking a module target.
    pub stable_only: bool,
}

impl ResolutionPolicy {
    pub fn new(stable_only: bool) -> Self {
        Self { stable_only }
    }

    /// Newest available version sharing `current`'s major component.
    ///
    /// In stable-only mode pre-releases are skipped, except the pinned
    /// release itself, so a pre-release pin is never moved down.
    pub fn module_target<'a>(&self, current: &Version, available: &'a [Version]) -> Option<&'a Version> {
        available
            .iter()
            .filter(|v| v.major() == current.major())
            .filter(|v| !self.stable_only || !v.is_prerelease() || *v == current)
            .max()
    }

    pub fn resolve_module(&self, current: &Version, available: &[Version]) -> Resolution {
        match self.module_target(current, available) {
            None => Resolution::NoCompatibleVersion,
            Some(target) if target == current => Resolution::Current,
            Some(target) => Resolution::Retarget(target.clone()),
        }
    }
}

/// Version to stamp into provider identification literals.
///
/// The marker file and the newest repository tag may each lag behind the
/// other, so when both exist the greater one wins.
pub fn identification_target(marker: Option<&Version>, tag: Option<&Version>) -> Option<Version> {
    match (marker, tag) {
        (Some(marker), Some(tag)) => Some(marker.max(tag).clone()),
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(list: &[&str]) -> Vec<Version> {
        list.iter().map(|v| Version::parse(v).unwrap()).collect()
    }

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    const CATALOG: &[&str] = &["3.4.0", "3.5.0", "4.0.0", "3.5.1"];

    #[test]
    fn upgrades_within_major_family() {
        let policy = ResolutionPolicy::default();
        assert_eq!(
            policy.resolve_module(&v("3.4.0"), &versions(CATALOG)),
            Resolution::Retarget(v("3.5.1"))
        );
    }

    #[test]
    fn newest_pin_stays_current() {
        let policy = ResolutionPolicy::default();
        assert_eq!(
            policy.resolve_module(&v("3.5.1"), &versions(CATALOG)),
            Resolution::Current
        );
    }

    #[test]
    fn reports_missing_family() {
        let policy = ResolutionPolicy::default();
        assert_eq!(
            policy.resolve_module(&v("2.0.0"), &versions(CATALOG)),
            Resolution::NoCompatibleVersion
        );
        assert_eq!(
            policy.resolve_module(&v("2.0.0"), &[]),
            Resolution::NoCompatibleVersion
        );
    }

    #[test]
    fn target_is_maximum_of_family_for_every_pin() {
        let available = versions(&[
            "1.0.0", "1.9.3", "1.10.0", "2.0.0-rc.1", "2.0.0", "2.3.4", "2.3.4-beta", "3.0.0",
        ]);
        let policy = ResolutionPolicy::default();
        for current in versions(&["1.0.0", "1.10.0", "2.0.0", "2.1.0", "3.0.0"]) {
            let target = policy.module_target(&current, &available).unwrap();
            assert_eq!(target.major(), current.major());
            for candidate in available.iter().filter(|c| c.major() == current.major()) {
                assert!(target >= candidate);
            }
        }
    }

    #[test]
    fn stable_only_skips_prereleases() {
        let available = versions(&["1.2.0", "1.3.0-beta.1"]);
        assert_eq!(
            ResolutionPolicy::new(false).resolve_module(&v("1.2.0"), &available),
            Resolution::Retarget(v("1.3.0-beta.1"))
        );
        assert_eq!(
            ResolutionPolicy::new(true).resolve_module(&v("1.2.0"), &available),
            Resolution::Current
        );
    }

    #[test]
    fn stable_only_keeps_a_prerelease_pin() {
        let available = versions(&["1.2.0", "1.3.0-beta.1"]);
        let policy = ResolutionPolicy::new(true);
        assert_eq!(
            policy.resolve_module(&v("1.3.0-beta.1"), &available),
            Resolution::Current
        );

        let available = versions(&["1.2.0", "1.3.0-beta.1", "1.3.0-beta.2", "1.3.0"]);
        assert_eq!(
            policy.resolve_module(&v("1.3.0-beta.1"), &available),
            Resolution::Retarget(v("1.3.0"))
        );
    }

    #[test]
    fn identification_prefers_newer_of_marker_and_tag() {
        assert_eq!(
            identification_target(Some(&v("1.2.0")), Some(&v("v1.3.0"))),
            Some(v("1.3.0"))
        );
        assert_eq!(
            identification_target(Some(&v("1.4.0")), Some(&v("v1.3.0"))),
            Some(v("1.4.0"))
        );
        assert_eq!(identification_target(None, Some(&v("0.9.0"))), Some(v("0.9.0")));
        assert_eq!(identification_target(Some(&v("0.9.0")), None), Some(v("0.9.0")));
        assert_eq!(identification_target(None, None), None);
    }

    #[test]
    fn identification_target_renders_canonically() {
        let target = identification_target(Some(&v("1.2.0")), Some(&v("v1.3.0"))).unwrap();
        assert_eq!(target.to_string(), "1.3.0");
    }
}
