use crate::agents::report::{EditKind, UpdateReport};
use crate::error::{Result, TfbumpError};
use crate::hcl::Document;
use crate::registry::{CatalogClient, ModuleSource, RegistryAddress};
use crate::resolution::{Resolution, ResolutionPolicy};
use crate::version::Version;
use std::path::Path;

/// A `module` block as seen at one moment; `position` is its index among
/// the document's module blocks and must be re-resolved after any edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReference {
    pub name: String,
    pub source: String,
    pub version: Option<String>,
    pub position: usize,
}

impl ModuleReference {
    pub fn at(doc: &Document, position: usize) -> Result<Option<Self>> {
        let Some(&id) = doc.blocks("module").get(position) else {
            return Ok(None);
        };
        let labels = doc.labels(id)?;
        Ok(Some(Self {
            name: labels.into_iter().next().unwrap_or_default(),
            source: doc.attribute_value(id, "source")?.unwrap_or_default(),
            version: doc.attribute_value(id, "version")?,
            position,
        }))
    }

    pub fn label(&self) -> String {
        format!("module \"{}\"", self.name)
    }
}

/// Every module block of the document, in declaration order.
pub fn module_references(doc: &Document) -> Result<Vec<ModuleReference>> {
    let mut references = Vec::new();
    for position in 0..doc.blocks("module").len() {
        if let Some(reference) = ModuleReference::at(doc, position)? {
            references.push(reference);
        }
    }
    Ok(references)
}

/// ModuleUpdater moves registry module pins to the newest release of
/// their major family.
pub struct ModuleUpdater<'a> {
    catalog: &'a dyn CatalogClient,
    policy: ResolutionPolicy,
}

impl<'a> ModuleUpdater<'a> {
    pub fn new(catalog: &'a dyn CatalogClient, policy: ResolutionPolicy) -> Self {
        Self { catalog, policy }
    }

    /// Processes every module block of `doc`. Returns the number of edits;
    /// per-module problems go to `report` and never stop the loop.
    pub fn update_document(
        &self,
        file: &Path,
        doc: &mut Document,
        report: &mut UpdateReport,
    ) -> usize {
        let references = match module_references(doc) {
            Ok(references) => references,
            Err(e) => {
                report.record_failure(file, Some("module"), e);
                return 0;
            }
        };

        let mut applied = 0;
        for reference in references {
            match self.update_module(file, doc, &reference, report) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => report.record_failure(file, Some(&reference.label()), e),
            }
        }
        applied
    }

    fn update_module(
        &self,
        file: &Path,
        doc: &mut Document,
        reference: &ModuleReference,
        report: &mut UpdateReport,
    ) -> Result<bool> {
        let address = match ModuleSource::classify(&reference.source) {
            ModuleSource::Registry(address) => address,
            ModuleSource::Local => {
                tracing::debug!(module = %reference.name, source = %reference.source, "local module");
                return Ok(false);
            }
            ModuleSource::Other => {
                tracing::debug!(module = %reference.name, source = %reference.source, "not a registry module");
                return Ok(false);
            }
        };

        let Some(pinned) = reference.version.as_deref() else {
            report.record_skip(file, Some(&reference.label()), "no pinned version");
            return Ok(false);
        };
        let current = Version::parse(pinned)?;

        let available = self.available_versions(&address)?;
        match self.policy.resolve_module(&current, &available) {
            Resolution::Current => {
                tracing::debug!(module = %reference.name, version = %current, "already current");
                Ok(false)
            }
            Resolution::NoCompatibleVersion => {
                let reason = TfbumpError::NoCompatibleVersion {
                    module: reference.source.clone(),
                    major: current.major(),
                };
                report.record_skip(file, Some(&reference.label()), reason);
                Ok(false)
            }
            Resolution::Retarget(target) => {
                let id = doc
                    .blocks("module")
                    .get(reference.position)
                    .copied()
                    .ok_or(TfbumpError::StaleReference)?;
                doc.set_string_attribute(id, "version", &target.to_string())?;
                report.record_edit(
                    file,
                    EditKind::Module,
                    reference.source.clone(),
                    pinned,
                    target.to_string(),
                );
                Ok(true)
            }
        }
    }

    fn available_versions(&self, address: &RegistryAddress) -> Result<Vec<Version>> {
        let raw = self.catalog.fetch_versions(address)?;
        Ok(raw
            .iter()
            .filter_map(|v| match Version::parse(v) {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::warn!(module = %address, version = %v, error = %e, "ignoring catalog entry");
                    None
                }
            })
            .collect())
    }
}
