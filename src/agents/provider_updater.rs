use crate::agents::report::{EditKind, UpdateReport};
use crate::error::{Result, TfbumpError};
use crate::hcl::Document;
use crate::surgery::{IdentificationKey, IdentificationLiteral};
use crate::version::Version;
use std::path::Path;

/// A `provider` block with the tracked name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReference {
    pub name: String,
    pub alias: Option<String>,
    /// Index among the document's `provider` blocks.
    pub position: usize,
}

impl ProviderReference {
    pub fn label(&self) -> String {
        match &self.alias {
            Some(alias) => format!("provider \"{}\" ({alias})", self.name),
            None => format!("provider \"{}\"", self.name),
        }
    }
}

/// Provider blocks labeled `name`, in declaration order.
pub fn provider_references(doc: &Document, name: &str) -> Result<Vec<ProviderReference>> {
    let mut references = Vec::new();
    for (position, id) in doc.blocks("provider").into_iter().enumerate() {
        let labels = doc.labels(id)?;
        if labels.first().map(String::as_str) != Some(name) {
            continue;
        }
        references.push(ProviderReference {
            name: name.to_string(),
            alias: doc.attribute_value(id, "alias")?,
            position,
        });
    }
    Ok(references)
}

/// ProviderUpdater stamps the repository version into the
/// `product_version` of each tracked provider's identification literal.
pub struct ProviderUpdater<'a> {
    provider: &'a str,
    attribute: &'a str,
    target: &'a Version,
}

impl<'a> ProviderUpdater<'a> {
    pub fn new(provider: &'a str, attribute: &'a str, target: &'a Version) -> Self {
        Self {
            provider,
            attribute,
            target,
        }
    }

    pub fn update_document(
        &self,
        file: &Path,
        doc: &mut Document,
        report: &mut UpdateReport,
    ) -> usize {
        let references = match provider_references(doc, self.provider) {
            Ok(references) => references,
            Err(e) => {
                report.record_failure(file, Some("provider"), e);
                return 0;
            }
        };

        let mut applied = 0;
        for reference in references {
            match self.update_provider(file, doc, &reference, report) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => report.record_failure(file, Some(&reference.label()), e),
            }
        }
        applied
    }

    fn update_provider(
        &self,
        file: &Path,
        doc: &mut Document,
        reference: &ProviderReference,
        report: &mut UpdateReport,
    ) -> Result<bool> {
        let id = doc
            .blocks("provider")
            .get(reference.position)
            .copied()
            .ok_or(TfbumpError::StaleReference)?;

        let Some(tokens) = doc.attribute_tokens(id, self.attribute)? else {
            tracing::trace!(provider = %reference.label(), "no identification attribute");
            return Ok(false);
        };
        let mut literal = IdentificationLiteral::scan(&tokens);

        let Some(current) = literal
            .get(IdentificationKey::ProductVersion)
            .map(|sub| sub.value.clone())
        else {
            let reason = TfbumpError::MissingIdentification {
                provider: reference.name.clone(),
                attribute: format!("{}.{}", self.attribute, IdentificationKey::ProductVersion),
            };
            report.record_skip(file, Some(&reference.label()), reason);
            return Ok(false);
        };

        let target = self.target.to_string();
        if !literal.set(IdentificationKey::ProductVersion, &target)? {
            return Ok(false);
        }
        doc.replace_spans(literal.edits())?;
        report.record_edit(file, EditKind::Provider, reference.label(), current, target);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROVIDERS_TF: &str = r#"provider "aws" {
  region = "us-east-1"
}

provider "awscc" {
  region = "us-east-1"
  user_agent = [
    {
      product_name    = "terraform-awscc-label"
      product_version = "0.1.0"
      comment         = "V1/AWS-D69B4015/376222271"
    }
  ]
}

provider "awscc" {
  alias  = "west"
  region = "us-west-2"
}
"#;

    fn run(src: &str, target: &str) -> (Document, UpdateReport, usize) {
        let target = Version::parse(target).unwrap();
        let mut doc = Document::parse(src).unwrap();
        let mut report = UpdateReport::new();
        let applied = ProviderUpdater::new("awscc", "user_agent", &target).update_document(
            Path::new("providers.tf"),
            &mut doc,
            &mut report,
        );
        (doc, report, applied)
    }

    #[test]
    fn finds_tracked_providers_only() {
        let doc = Document::parse(PROVIDERS_TF).unwrap();
        let refs = provider_references(&doc, "awscc").unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].position, 1);
        assert_eq!(refs[1].alias.as_deref(), Some("west"));
        assert_eq!(refs[1].label(), "provider \"awscc\" (west)");
    }

    #[test]
    fn rewrites_only_the_product_version_bytes() {
        let (doc, report, applied) = run(PROVIDERS_TF, "v1.3.0");
        assert_eq!(applied, 1);
        assert_eq!(
            doc.serialize(),
            PROVIDERS_TF.replace("product_version = \"0.1.0\"", "product_version = \"1.3.0\"")
        );
        assert_eq!(report.edits[0].old, "0.1.0");
        assert_eq!(report.edits[0].new, "1.3.0");
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn matching_version_is_not_an_edit() {
        let (doc, report, applied) = run(PROVIDERS_TF, "0.1.0");
        assert_eq!(applied, 0);
        assert!(!doc.is_dirty());
        assert!(report.is_empty());
    }

    #[test]
    fn provider_without_identification_is_ignored() {
        let src = "provider \"awscc\" {\n  region = \"us-east-1\"\n}\n";
        let (doc, report, applied) = run(src, "2.0.0");
        assert_eq!(applied, 0);
        assert!(!doc.is_dirty());
        assert!(report.skipped.is_empty());
        assert!(!report.has_failures());
    }

    #[test]
    fn identification_without_version_is_skipped() {
        let src = "provider \"awscc\" {\n  user_agent = [{ product_name = \"x\" }]\n}\n";
        let (doc, report, applied) = run(src, "2.0.0");
        assert_eq!(applied, 0);
        assert!(!doc.is_dirty());
        assert_eq!(report.skipped.len(), 1);
        assert!(!report.has_failures());
    }

    #[test]
    fn every_tracked_provider_is_synced() {
        let src = r#"provider "awscc" {
  user_agent = [{ product_name = "a", product_version = "1.0.0" }]
}

provider "awscc" {
  alias      = "second"
  user_agent = [{ product_name = "b", product_version = "1.1.0" }]
}
"#;
        let (doc, report, applied) = run(src, "1.2.0");
        assert_eq!(applied, 2);
        assert_eq!(
            doc.serialize(),
            src.replace("1.0.0", "1.2.0").replace("1.1.0", "1.2.0")
        );
        assert_eq!(report.edits[1].subject, "provider \"awscc\" (second)");
    }
}
