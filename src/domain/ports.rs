use crate::domain::model::{
    TermKey, ImportCoordinates, ImportPayload, ItemId, Language, OutcomeSubject, TenantId,
    TenantInfo, Term, TermId, TermMeta, TranslationLink,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Switches the process-wide "current site". Calls must be paired.
pub trait TenantContext: Send + Sync {
    fn switch_to(&self, tenant: TenantId) -> Result<()>;
    fn restore_previous(&self) -> Result<()>;
    fn current_tenant(&self) -> TenantId;
}

pub trait TenantRegistry: Send + Sync {
    fn tenants(&self) -> Vec<TenantInfo>;
}

/// Term storage of whichever tenant is currently active.
#[async_trait]
pub trait TermBackend: Send + Sync {
    async fn taxonomies(&self) -> Result<Vec<String>>;
    async fn list_assigned_terms(&self, item: ItemId, taxonomies: &[String]) -> Result<Vec<Term>>;
    /// Returns the id of the existing term when one with the same name already exists.
    async fn create_term(&self, name: &str, taxonomy: &str) -> Result<TermId>;
    async fn term_meta(&self, term: TermId) -> Result<TermMeta>;
    async fn add_term_meta(&self, term: TermId, key: &str, value: serde_json::Value) -> Result<()>;
    async fn attach_term(&self, item: ItemId, term: TermId, taxonomy: &str) -> Result<()>;
    async fn list_terms(&self, taxonomy: &str) -> Result<Vec<Term>>;
}

/// Translation groups. A group maps each language to one term id and is
/// found through any member term indexed in it.
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Id mapped for `language` in the group `term` belongs to.
    async fn mapped_id(&self, term: &TermKey, language: &str) -> Result<Option<TermId>>;
    /// Fails with `MappingConflict` when `language` is already mapped in the
    /// group of `term`. The group is created on first registration.
    async fn register_id(&self, term: &TermKey, language: &str, id: TermId) -> Result<()>;
    /// Records both sides of a translation in one group and indexes both
    /// terms. Fails with `MappingConflict`, changing nothing, when either
    /// language is already mapped to a different term or the two terms sit
    /// in different groups.
    async fn link_translation(&self, link: &TranslationLink) -> Result<()>;
    async fn translations(&self, term: &TermKey) -> Result<BTreeMap<Language, TermId>>;
}

/// Sink for per-term outcomes. Implementations must not fail.
pub trait OutcomeLog: Send + Sync {
    fn log_success(&self, key: &str, subject: OutcomeSubject);
    fn log_failure(&self, key: &str, subject: OutcomeSubject);
}

/// Decides which metadata keys must not be copied to a new term.
pub trait MetaDenyPolicy: Send + Sync {
    fn denied_keys(&self, term: &Term, meta: &TermMeta, coordinates: &ImportCoordinates)
        -> Vec<String>;
}

impl<F> MetaDenyPolicy for F
where
    F: Fn(&Term, &TermMeta, &ImportCoordinates) -> Vec<String> + Send + Sync,
{
    fn denied_keys(
        &self,
        term: &Term,
        meta: &TermMeta,
        coordinates: &ImportCoordinates,
    ) -> Vec<String> {
        self(term, meta, coordinates)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImporterInfo {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// One stage of a content replication run.
#[async_trait]
pub trait ImportStage: Send + Sync {
    fn info(&self) -> ImporterInfo;
    async fn import(
        &self,
        coordinates: &ImportCoordinates,
        payload: ImportPayload,
    ) -> Result<ImportPayload>;
}
