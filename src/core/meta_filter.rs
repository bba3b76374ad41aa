use crate::domain::model::{ImportCoordinates, Term, TermMeta};
use crate::domain::ports::MetaDenyPolicy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Removes every denied key, with all of its values, from `meta`.
pub fn filter_term_meta(mut meta: TermMeta, denied: &[String]) -> TermMeta {
    let denied: HashSet<&str> = denied.iter().map(String::as_str).collect();
    meta.retain(|key, _| !denied.contains(key.as_str()));
    meta
}

/// Applies an injected deny-list policy to the metadata of a source term.
#[derive(Clone)]
pub struct MetaFilter {
    policy: Arc<dyn MetaDenyPolicy>,
}

impl MetaFilter {
    pub fn new(policy: Arc<dyn MetaDenyPolicy>) -> Self {
        Self { policy }
    }

    pub fn filter(&self, meta: TermMeta, term: &Term, coordinates: &ImportCoordinates) -> TermMeta {
        let denied = self.policy.denied_keys(term, &meta, coordinates);
        if !denied.is_empty() {
            tracing::debug!("Skipping meta keys {:?} of term '{}'", denied, term.name);
        }
        filter_term_meta(meta, &denied)
    }
}

impl Default for MetaFilter {
    fn default() -> Self {
        Self::new(Arc::new(NoDenyList))
    }
}

/// Copies every metadata key.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDenyList;

impl MetaDenyPolicy for NoDenyList {
    fn denied_keys(&self, _: &Term, _: &TermMeta, _: &ImportCoordinates) -> Vec<String> {
        Vec::new()
    }
}

/// Deny list read from configuration: global keys plus keys per taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfiguredDenyList {
    #[serde(default)]
    pub deny: Vec<String>,
    #[serde(default)]
    pub taxonomies: HashMap<String, TaxonomyDenyList>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyDenyList {
    #[serde(default)]
    pub deny: Vec<String>,
}

impl ConfiguredDenyList {
    pub fn global(keys: Vec<String>) -> Self {
        Self {
            deny: keys,
            taxonomies: HashMap::new(),
        }
    }
}

impl MetaDenyPolicy for ConfiguredDenyList {
    fn denied_keys(&self, term: &Term, _: &TermMeta, _: &ImportCoordinates) -> Vec<String> {
        let mut keys = self.deny.clone();
        if let Some(per_taxonomy) = self.taxonomies.get(&term.taxonomy) {
            keys.extend(per_taxonomy.deny.iter().cloned());
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_meta() -> TermMeta {
        let mut meta = TermMeta::new();
        meta.insert("color".to_string(), vec![json!("red")]);
        meta.insert("alias".to_string(), vec![json!("a"), json!("b")]);
        meta.insert("_edit_lock".to_string(), vec![json!("123:1")]);
        meta
    }

    #[test]
    fn test_denied_keys_are_removed_completely() {
        let filtered = filter_term_meta(sample_meta(), &["_edit_lock".to_string()]);
        assert!(!filtered.contains_key("_edit_lock"));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_allowed_keys_keep_every_value() {
        let input = sample_meta();
        let filtered = filter_term_meta(input.clone(), &["color".to_string(), "absent".to_string()]);
        assert_eq!(filtered.get("alias"), input.get("alias"));
        assert_eq!(filtered.get("_edit_lock"), input.get("_edit_lock"));
        assert!(!filtered.contains_key("color"));
    }

    #[test]
    fn test_empty_deny_list_is_identity() {
        assert_eq!(filter_term_meta(sample_meta(), &[]), sample_meta());
    }

    #[test]
    fn test_configured_list_adds_taxonomy_keys() {
        let mut policy = ConfiguredDenyList::global(vec!["_edit_lock".to_string()]);
        policy.taxonomies.insert(
            "category".to_string(),
            TaxonomyDenyList {
                deny: vec!["color".to_string()],
            },
        );
        let coordinates = ImportCoordinates::new(1, 10, 20, "fr");
        let filter = MetaFilter::new(Arc::new(policy));

        let tag = filter.filter(sample_meta(), &Term::new(5, "News", "tag"), &coordinates);
        assert!(tag.contains_key("color"));
        assert!(!tag.contains_key("_edit_lock"));

        let category = filter.filter(sample_meta(), &Term::new(6, "World", "category"), &coordinates);
        assert_eq!(category.keys().collect::<Vec<_>>(), vec!["alias"]);
    }

    #[test]
    fn test_closure_policy_sees_coordinates() {
        let filter = MetaFilter::new(Arc::new(
            |_: &Term, meta: &TermMeta, coordinates: &ImportCoordinates| {
                if coordinates.dest_language == "fr" {
                    meta.keys().filter(|k| k.starts_with('_')).cloned().collect()
                } else {
                    Vec::new()
                }
            },
        ));
        let term = Term::new(5, "News", "tag");

        let fr = filter.filter(sample_meta(), &term, &ImportCoordinates::new(1, 10, 20, "fr"));
        assert!(!fr.contains_key("_edit_lock"));

        let de = filter.filter(sample_meta(), &term, &ImportCoordinates::new(1, 10, 20, "de"));
        assert!(de.contains_key("_edit_lock"));
    }
}
