//! Label Filters
//!
//! Translates declarative label predicates into the `filter` query
//! fragment accepted by GCP listing APIs.

use anyhow::{anyhow, Result};
use std::str::FromStr;

/// A single `name=value` label predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPredicate {
    pub name: String,
    pub value: String,
}

impl TagPredicate {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl FromStr for TagPredicate {
    type Err = anyhow::Error;

    /// Parse the `name=value` form used by the `--label` CLI flag.
    fn from_str(s: &str) -> Result<Self> {
        let Some((name, value)) = s.split_once('=') else {
            return Err(anyhow!("invalid label predicate {:?}, expected name=value", s));
        };
        if name.is_empty() {
            return Err(anyhow!("invalid label predicate {:?}, empty name", s));
        }
        Ok(Self::new(name, value))
    }
}

/// An ordered set of label predicates.
///
/// Multiple predicates are a server-side AND. No escaping or validation
/// is applied to names or values; a malformed predicate surfaces as an
/// upstream listing failure.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    tags: Vec<TagPredicate>,
}

impl FilterSpec {
    pub fn new(tags: Vec<TagPredicate>) -> Self {
        Self { tags }
    }

    /// The neutral, match-everything spec.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[TagPredicate] {
        &self.tags
    }

    /// Compile to the provider-side filter string: one
    /// `(labels.<name>=<value>)` group per predicate, joined by single
    /// spaces in input order. The empty spec compiles to the empty
    /// string, the same neutral value unfiltered listings pass.
    pub fn compile(&self) -> String {
        let mut out = String::new();
        for tag in &self.tags {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&format!("(labels.{}={})", tag.name, tag.value));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_spec_compiles_to_empty_string() {
        assert_eq!(FilterSpec::none().compile(), "");
        assert!(FilterSpec::none().is_empty());
    }

    #[test]
    fn test_single_predicate() {
        let spec = FilterSpec::new(vec![TagPredicate::new("env", "prod")]);
        assert_eq!(spec.compile(), "(labels.env=prod)");
    }

    #[test]
    fn test_multiple_predicates_join_with_single_space_in_order() {
        let spec = FilterSpec::new(vec![
            TagPredicate::new("env", "prod"),
            TagPredicate::new("team", "infra"),
            TagPredicate::new("tier", "web"),
        ]);
        assert_eq!(
            spec.compile(),
            "(labels.env=prod) (labels.team=infra) (labels.tier=web)"
        );
    }

    #[test]
    fn test_predicate_parses_name_value() {
        let tag: TagPredicate = "env=prod".parse().unwrap();
        assert_eq!(tag, TagPredicate::new("env", "prod"));
    }

    #[test]
    fn test_predicate_value_may_contain_equals() {
        let tag: TagPredicate = "expr=a=b".parse().unwrap();
        assert_eq!(tag.name, "expr");
        assert_eq!(tag.value, "a=b");
    }

    #[test]
    fn test_predicate_rejects_missing_separator_and_empty_name() {
        assert!("noseparator".parse::<TagPredicate>().is_err());
        assert!("=value".parse::<TagPredicate>().is_err());
    }
}
