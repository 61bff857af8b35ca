use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static NAME_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9A-Za-z](?:[0-9A-Za-z_-]{0,62}[0-9A-Za-z])?$").expect("valid regex")
});
static PROVIDER_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-z]{1,64}$").expect("valid regex"));

const FOREIGN_PREFIXES: &[&str] = &[
    "git@",
    "github.com/",
    "bitbucket.org/",
    "http://",
    "https://",
    "/",
];

/// A module address in a registry: `[host/]namespace/name/provider`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryAddress {
    pub host: Option<String>,
    pub namespace: String,
    pub name: String,
    pub provider: String,
}

impl RegistryAddress {
    /// `namespace/name/provider`, as used in registry API paths.
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.name, self.provider)
    }
}

impl fmt::Display for RegistryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "{host}/")?;
        }
        f.write_str(&self.path())
    }
}

/// Where a module's `source` points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleSource {
    /// A relative path inside the same repository.
    Local,
    Registry(RegistryAddress),
    /// Git, HTTP, archive and bucket sources carry no registry version.
    Other,
}

impl ModuleSource {
    pub fn classify(source: &str) -> Self {
        if source == "."
            || source == ".."
            || source.starts_with("./")
            || source.starts_with("../")
            || source.starts_with(".\\")
            || source.starts_with("..\\")
        {
            return ModuleSource::Local;
        }
        if source.contains("::") || FOREIGN_PREFIXES.iter().any(|p| source.starts_with(p)) {
            return ModuleSource::Other;
        }

        let address = source.split("//").next().unwrap_or(source);
        let address = address.split('?').next().unwrap_or(address);
        let parts: Vec<&str> = address.split('/').collect();
        let (host, rest) = match parts.as_slice() {
            [host, rest @ ..] if rest.len() == 3 && is_hostname(host) => (Some(*host), rest),
            rest if rest.len() == 3 => (None, rest),
            _ => return ModuleSource::Other,
        };

        let [namespace, name, provider] = rest else {
            return ModuleSource::Other;
        };
        if !NAME_PART.is_match(namespace)
            || !NAME_PART.is_match(name)
            || !PROVIDER_PART.is_match(provider)
        {
            return ModuleSource::Other;
        }

        ModuleSource::Registry(RegistryAddress {
            host: host.map(|h| h.to_ascii_lowercase()),
            namespace: namespace.to_string(),
            name: name.to_string(),
            provider: provider.to_string(),
        })
    }
}

fn is_hostname(part: &str) -> bool {
    (part.contains('.') || part.contains(':'))
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(source: &str) -> RegistryAddress {
        match ModuleSource::classify(source) {
            ModuleSource::Registry(address) => address,
            other => panic!("expected registry source for {source}, got {other:?}"),
        }
    }

    #[test]
    fn classifies_relative_paths_as_local() {
        assert_eq!(ModuleSource::classify("./modules/vpc"), ModuleSource::Local);
        assert_eq!(ModuleSource::classify("../shared"), ModuleSource::Local);
        assert!(matches!(
            ModuleSource::classify("terraform-aws-modules/vpc/aws"),
            ModuleSource::Registry(_)
        ));
    }

    #[test]
    fn parses_public_registry_address() {
        let address = registry("terraform-aws-modules/vpc/aws");
        assert_eq!(address.host, None);
        assert_eq!(address.path(), "terraform-aws-modules/vpc/aws");
    }

    #[test]
    fn strips_subdirectory_and_keeps_host() {
        let address = registry("app.terraform.io/Example-Corp/network/azurerm//modules/subnet");
        assert_eq!(address.host.as_deref(), Some("app.terraform.io"));
        assert_eq!(address.path(), "Example-Corp/network/azurerm");
        assert_eq!(
            address.to_string(),
            "app.terraform.io/Example-Corp/network/azurerm"
        );
    }

    #[test]
    fn other_sources_are_not_registry_modules() {
        for source in [
            "git::https://example.com/vpc.git?ref=v1.2.0",
            "github.com/hashicorp/example",
            "s3::https://s3-eu-west-1.amazonaws.com/bucket/vpc.zip",
            "https://example.com/vpc-module.zip",
            "hashicorp/consul",
            "",
        ] {
            assert_eq!(ModuleSource::classify(source), ModuleSource::Other, "{source}");
        }
    }
}
