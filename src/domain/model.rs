use crate::utils::error::Result;
use crate::utils::validation::{validate_language, validate_positive_id, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub type TenantId = u64;
pub type TermId = u64;
pub type ItemId = u64;
pub type Language = String;

/// Term metadata. Keys are iterated in sorted order; the values under each
/// key keep their storage order.
pub type TermMeta = BTreeMap<String, Vec<serde_json::Value>>;

/// Where one content-item replication comes from and goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCoordinates {
    pub source_tenant_id: TenantId,
    pub source_item_id: ItemId,
    /// Only informational; destination work runs in the caller's ambient tenant.
    #[serde(default)]
    pub dest_tenant_id: Option<TenantId>,
    pub dest_item_id: ItemId,
    pub dest_language: Language,
}

impl ImportCoordinates {
    pub fn new(
        source_tenant_id: TenantId,
        source_item_id: ItemId,
        dest_item_id: ItemId,
        dest_language: impl Into<Language>,
    ) -> Self {
        Self {
            source_tenant_id,
            source_item_id,
            dest_tenant_id: None,
            dest_item_id,
            dest_language: dest_language.into(),
        }
    }

    pub fn with_dest_tenant(mut self, dest_tenant_id: TenantId) -> Self {
        self.dest_tenant_id = Some(dest_tenant_id);
        self
    }
}

impl Validate for ImportCoordinates {
    fn validate(&self) -> Result<()> {
        validate_positive_id("source_tenant_id", self.source_tenant_id)?;
        validate_positive_id("source_item_id", self.source_item_id)?;
        validate_positive_id("dest_item_id", self.dest_item_id)?;
        if let Some(dest) = self.dest_tenant_id {
            validate_positive_id("dest_tenant_id", dest)?;
        }
        validate_language("dest_language", &self.dest_language)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub name: String,
    pub taxonomy: String,
}

impl Term {
    pub fn new(id: TermId, name: impl Into<String>, taxonomy: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            taxonomy: taxonomy.into(),
        }
    }
}

/// A term on one tenant. Each term belongs to at most one translation group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermKey {
    pub tenant: TenantId,
    pub term_id: TermId,
}

impl TermKey {
    pub fn new(tenant: TenantId, term_id: TermId) -> Self {
        Self { tenant, term_id }
    }
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term {}:{}", self.tenant, self.term_id)
    }
}

/// A source term and the destination term created as its translation.
/// Registering it puts both terms in the same group, so the relation can be
/// looked up from either side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationLink {
    pub source: TermKey,
    /// `None` when the source tenant's language is unknown; only the
    /// destination entry is recorded then.
    pub source_language: Option<Language>,
    pub dest: TermKey,
    pub dest_language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub id: TenantId,
    pub language: Language,
}

/// Context data attached to an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeSubject {
    Name(String),
    NamedId { name: String, id: TermId },
}

impl fmt::Display for OutcomeSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeSubject::Name(name) => write!(f, "{}", name),
            OutcomeSubject::NamedId { name, id } => write!(f, "{} => {}", name, id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub key: String,
    pub subject: OutcomeSubject,
    pub success: bool,
    pub at: DateTime<Utc>,
}

impl Outcome {
    pub fn new(key: impl Into<String>, subject: OutcomeSubject, success: bool) -> Self {
        Self {
            key: key.into(),
            subject,
            success,
            at: Utc::now(),
        }
    }
}

/// Data flowing through the import pipeline untouched by term duplication.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportPayload {
    pub data: HashMap<String, serde_json::Value>,
}

impl ImportPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(ImportCoordinates::new(1, 10, 20, "fr").validate().is_ok());
        assert!(ImportCoordinates::new(0, 10, 20, "fr").validate().is_err());
        assert!(ImportCoordinates::new(1, 10, 20, "").validate().is_err());
        assert!(ImportCoordinates::new(1, 10, 20, "fr")
            .with_dest_tenant(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_outcome_subject_serializes_untagged() {
        let named = serde_json::to_value(OutcomeSubject::NamedId {
            name: "News".to_string(),
            id: 5,
        })
        .unwrap();
        assert_eq!(named, serde_json::json!({"name": "News", "id": 5}));

        let plain = serde_json::to_value(OutcomeSubject::Name("News".to_string())).unwrap();
        assert_eq!(plain, serde_json::json!("News"));
    }
}
