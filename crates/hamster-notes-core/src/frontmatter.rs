use std::collections::BTreeMap;

use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::document::Document;

/// Errors produced while reading a front-matter block.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The block is not valid YAML.
    #[error("malformed front-matter: {0}")]
    Parse(#[from] serde_yaml::Error),
    /// The block parsed, but its top level is not a key/value mapping.
    #[error("front-matter is not a key/value mapping")]
    NotAMapping,
}

/// A single front-matter value: either one string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Scalar(String),
    List(Vec<String>),
}

/// Key/value metadata taken from a note's front-matter. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontmatterMetadata {
    entries: BTreeMap<String, MetadataValue>,
}

impl FrontmatterMetadata {
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The `project` key, when it holds a single string.
    pub fn project(&self) -> Option<&str> {
        match self.entries.get("project")? {
            MetadataValue::Scalar(project) => Some(project),
            MetadataValue::List(_) => None,
        }
    }

    /// The `tags` key as trimmed tag names. A scalar is read as a comma-separated list.
    pub fn tags(&self) -> Option<Vec<String>> {
        let tags = match self.entries.get("tags")? {
            MetadataValue::List(tags) => tags.iter().map(|t| t.trim().to_string()).collect(),
            MetadataValue::Scalar(joined) => {
                joined.split(',').map(|t| t.trim().to_string()).collect()
            }
        };
        Some(tags)
    }
}

impl<K: Into<String>> FromIterator<(K, MetadataValue)> for FrontmatterMetadata {
    fn from_iter<I: IntoIterator<Item = (K, MetadataValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Extract the top-level keys of a document's front-matter.
///
/// A document without front-matter yields empty metadata. Keys whose value is
/// null, an empty list, or a nested mapping are left out.
#[instrument(skip_all)]
pub fn extract_frontmatter(document: &Document) -> Result<FrontmatterMetadata, MetadataError> {
    let Some(slice) = document.frontmatter_slice() else {
        return Ok(FrontmatterMetadata::default());
    };
    parse_block(&slice)
}

fn parse_block(slice: &str) -> Result<FrontmatterMetadata, MetadataError> {
    let mapping = match serde_yaml::from_str::<Value>(slice)? {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(FrontmatterMetadata::default()),
        _ => return Err(MetadataError::NotAMapping),
    };

    let mut entries = BTreeMap::new();
    for (key, value) in &mapping {
        let Some(key) = scalar_text(key) else {
            debug!(?key, "skipping non-scalar front-matter key");
            continue;
        };
        match convert(value) {
            Some(value) => {
                entries.insert(key, value);
            }
            None => debug!(%key, "skipping empty or nested front-matter value"),
        }
    }
    Ok(FrontmatterMetadata { entries })
}

fn convert(value: &Value) -> Option<MetadataValue> {
    match value {
        Value::Sequence(items) => {
            let items: Vec<String> = items.iter().filter_map(scalar_text).collect();
            (!items.is_empty()).then_some(MetadataValue::List(items))
        }
        Value::Tagged(tagged) => convert(&tagged.value),
        other => scalar_text(other).map(MetadataValue::Scalar),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> FrontmatterMetadata {
        extract_frontmatter(&Document::parse(text)).expect("front-matter should parse")
    }

    #[test]
    fn document_without_frontmatter_is_empty() {
        let meta = extract("- [ ] Write report\n");
        assert!(meta.is_empty());
    }

    #[test]
    fn copies_every_top_level_key() {
        let meta = extract("---\nproject: Acme\ntags: [a, b]\npriority: 3\ndone: false\n---\nbody");
        assert_eq!(meta.len(), 4);
        assert_eq!(meta.project(), Some("Acme"));
        assert_eq!(meta.tags(), Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(meta.get("priority"), Some(&MetadataValue::Scalar("3".into())));
        assert_eq!(meta.get("done"), Some(&MetadataValue::Scalar("false".into())));
    }

    #[test]
    fn block_sequence_tags_are_read_as_list() {
        let meta = extract("---\ntags:\n  - writing\n  - ops\n---\n");
        assert_eq!(
            meta.get("tags"),
            Some(&MetadataValue::List(vec!["writing".into(), "ops".into()]))
        );
    }

    #[test]
    fn scalar_tags_are_split_on_commas() {
        let meta = extract("---\ntags: alpha, beta ,gamma\n---\n");
        assert_eq!(
            meta.tags(),
            Some(vec!["alpha".into(), "beta".into(), "gamma".into()])
        );
    }

    #[test]
    fn empty_tags_and_null_values_are_absent() {
        let meta = extract("---\ntags: []\nproject:\n---\n");
        assert!(meta.get("tags").is_none());
        assert!(meta.get("project").is_none());
        assert!(meta.is_empty());
    }

    #[test]
    fn list_project_is_not_a_project() {
        let meta = extract("---\nproject: [a, b]\n---\n");
        assert_eq!(meta.project(), None);
    }

    #[test]
    fn empty_block_is_empty_metadata() {
        let meta = extract("---\n---\n- [ ] Task");
        assert!(meta.is_empty());
    }

    #[test]
    fn malformed_yaml_fails() {
        let doc = Document::parse("---\nproject: [unclosed\n---\n");
        let err = extract_frontmatter(&doc).expect_err("malformed yaml should fail");
        assert!(matches!(err, MetadataError::Parse(_)));
    }

    #[test]
    fn non_mapping_block_fails() {
        let doc = Document::parse("---\n- just\n- a list\n---\n");
        let err = extract_frontmatter(&doc).expect_err("list block should fail");
        assert!(matches!(err, MetadataError::NotAMapping));
    }
}
