use crate::error::Result;

pub mod address;
pub mod cache;
pub mod client;

pub use address::{ModuleSource, RegistryAddress};
pub use cache::CachedCatalog;
pub use client::{DEFAULT_REGISTRY, RegistryClient};

/// Source of published module versions.
pub trait CatalogClient: Send + Sync {
    /// Every version string published for the module, in no particular order.
    fn fetch_versions(&self, address: &RegistryAddress) -> Result<Vec<String>>;
}

#[cfg(test)]
pub mod testing {
    use super::{CatalogClient, RegistryAddress};
    use crate::error::{Result, TfbumpError};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory catalog keyed by `namespace/name/provider`; records every
    /// lookup it receives.
    #[derive(Default)]
    pub struct FakeCatalog {
        versions: HashMap<String, Vec<String>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeCatalog {
        pub fn with(mut self, path: &str, versions: &[&str]) -> Self {
            self.versions.insert(
                path.to_string(),
                versions.iter().map(|v| v.to_string()).collect(),
            );
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl CatalogClient for FakeCatalog {
        fn fetch_versions(&self, address: &RegistryAddress) -> Result<Vec<String>> {
            self.requests.lock().unwrap().push(address.to_string());
            self.versions
                .get(&address.path())
                .cloned()
                .ok_or_else(|| TfbumpError::CatalogNetwork(format!("HTTP 404 for {address}")))
        }
    }
}
