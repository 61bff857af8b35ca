use crate::error::{Result, TfbumpError};
use crate::registry::address::RegistryAddress;
use crate::registry::CatalogClient;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REGISTRY: &str = "https://registry.terraform.io";
const MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;

/// Module registry client speaking the `/v1/modules` protocol.
pub struct RegistryClient {
    client: Client,
    default_registry: Url,
}

impl RegistryClient {
    pub fn new(default_registry: &str) -> Result<Self> {
        let default_registry = Self::validate_registry_url(default_registry)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("tfbump/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TfbumpError::CatalogNetwork(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            default_registry,
        })
    }

    pub fn versions_url(&self, address: &RegistryAddress) -> Result<Url> {
        let base = match &address.host {
            Some(host) => Self::validate_registry_url(&format!("https://{host}"))?,
            None => self.default_registry.clone(),
        };
        let path = format!("v1/modules/{}/versions", address.path());
        let mut base = base;
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(&path)
            .map_err(|e| TfbumpError::Config(format!("Invalid catalog URL for {address}: {e}")))
    }

    fn validate_registry_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url)
            .map_err(|_| TfbumpError::Config(format!("Invalid registry URL: {url}")))?;

        match parsed.scheme() {
            "https" | "http" => {}
            scheme => {
                return Err(TfbumpError::Config(format!(
                    "Unsupported registry scheme: {scheme}"
                )));
            }
        }
        if parsed.host_str().is_none() {
            return Err(TfbumpError::Config(format!(
                "Registry URL '{url}' has no host"
            )));
        }

        Ok(parsed)
    }
}

impl CatalogClient for RegistryClient {
    fn fetch_versions(&self, address: &RegistryAddress) -> Result<Vec<String>> {
        let url = self.versions_url(address)?;
        tracing::debug!(%url, "fetching module versions");

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| TfbumpError::CatalogNetwork(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TfbumpError::CatalogNetwork(format!("HTTP {status} from {url}")));
        }

        if response
            .content_length()
            .is_some_and(|len| len > MAX_RESPONSE_BYTES)
        {
            return Err(TfbumpError::CatalogFormat(format!(
                "response from {url} exceeded 10MB limit"
            )));
        }

        let body = read_capped(response, MAX_RESPONSE_BYTES).map_err(|e| match e {
            TfbumpError::Io(e) => TfbumpError::CatalogNetwork(format!("{url}: {e}")),
            other => other,
        })?;
        parse_versions_response(&body)
    }
}

/// Reads at most `limit` bytes of UTF-8 text; a longer body is an error
/// and is never buffered past `limit + 1` bytes.
fn read_capped<R: Read>(reader: R, limit: u64) -> Result<String> {
    let mut body = String::new();
    reader.take(limit + 1).read_to_string(&mut body)?;
    if body.len() as u64 > limit {
        return Err(TfbumpError::CatalogFormat(format!(
            "response exceeded {limit} byte limit"
        )));
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct ModuleVersionsResponse {
    modules: Vec<ModuleEntry>,
}

#[derive(Debug, Deserialize)]
struct ModuleEntry {
    #[serde(default)]
    source: String,
    versions: Vec<ModuleVersion>,
}

#[derive(Debug, Deserialize)]
struct ModuleVersion {
    version: String,
    #[serde(default)]
    root: Option<ModuleRoot>,
}

#[derive(Debug, Deserialize)]
struct ModuleRoot {
    #[serde(default)]
    providers: Vec<ProviderRequirement>,
}

#[derive(Debug, Deserialize)]
struct ProviderRequirement {
    name: String,
    #[serde(default)]
    version: String,
}

/// Extracts `modules[0].versions[].version` from a registry response.
pub fn parse_versions_response(body: &str) -> Result<Vec<String>> {
    let response: ModuleVersionsResponse = serde_json::from_str(body)
        .map_err(|e| TfbumpError::CatalogFormat(format!("invalid JSON: {e}")))?;

    let Some(module) = response.modules.into_iter().next() else {
        return Err(TfbumpError::CatalogFormat(
            "response lists no modules".to_string(),
        ));
    };

    Ok(module
        .versions
        .into_iter()
        .map(|entry| {
            if let Some(root) = &entry.root {
                for provider in &root.providers {
                    tracing::trace!(
                        module = %module.source,
                        version = %entry.version,
                        provider = %provider.name,
                        constraint = %provider.version,
                        "provider requirement"
                    );
                }
            }
            entry.version
        })
        .collect())
}
