use crate::error::Result;
use crate::registry::{CatalogClient, RegistryAddress};
use std::collections::HashMap;
use std::sync::Mutex;

/// Memoizes successful catalog lookups for the lifetime of one run, so a
/// module referenced from many files costs a single request.
pub struct CachedCatalog<C> {
    inner: C,
    entries: Mutex<HashMap<RegistryAddress, Vec<String>>>,
}

impl<C: CatalogClient> CachedCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<C: CatalogClient> CatalogClient for CachedCatalog<C> {
    fn fetch_versions(&self, address: &RegistryAddress) -> Result<Vec<String>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(versions) = entries.get(address) {
            tracing::debug!(module = %address, "catalog cache hit");
            return Ok(versions.clone());
        }
        let versions = self.inner.fetch_versions(address)?;
        entries.insert(address.clone(), versions.clone());
        Ok(versions)
    }
}
