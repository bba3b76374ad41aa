use crate::core::meta_filter::MetaFilter;
use crate::core::tenant_scope::TenantScope;
use crate::domain::model::{
    ImportCoordinates, ImportPayload, Language, OutcomeSubject, TenantId, Term, TermId, TermKey,
    TermMeta, TranslationLink,
};
use crate::domain::ports::{
    ImportStage, ImporterInfo, OutcomeLog, RelationStore, TenantContext, TenantRegistry,
    TermBackend,
};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use std::sync::Arc;

pub const SHALLOW_DUPLICATING: &str = "shallow-duplicating";

/// What the source side told us about one assigned term.
#[derive(Debug)]
enum Resolution {
    Mapped(TermId),
    Missing(TermMeta),
    LookupFailed(SyncError),
    MetaUnreadable(SyncError),
}

#[derive(Debug)]
struct SourceTerm {
    term: Term,
    key: TermKey,
    resolution: Resolution,
}

fn created_key(taxonomy: &str) -> String {
    format!("term/created/{}", taxonomy)
}

fn added_key(taxonomy: &str) -> String {
    format!("term/added/{}", taxonomy)
}

fn relation_key(taxonomy: &str) -> String {
    format!("term/relation/{}", taxonomy)
}

fn named_id(term: &Term) -> OutcomeSubject {
    OutcomeSubject::NamedId {
        name: term.name.clone(),
        id: term.id,
    }
}

/// Duplicates, when needed, the terms assigned to the source item and
/// attaches them to the destination item. One level only: parent terms of
/// hierarchical taxonomies are not followed.
pub struct ShallowDuplicator {
    tenants: Arc<dyn TenantContext>,
    registry: Arc<dyn TenantRegistry>,
    backend: Arc<dyn TermBackend>,
    relations: Arc<dyn RelationStore>,
    outcomes: Arc<dyn OutcomeLog>,
    meta_filter: MetaFilter,
}

impl ShallowDuplicator {
    pub fn new(
        tenants: Arc<dyn TenantContext>,
        registry: Arc<dyn TenantRegistry>,
        backend: Arc<dyn TermBackend>,
        relations: Arc<dyn RelationStore>,
        outcomes: Arc<dyn OutcomeLog>,
    ) -> Self {
        Self {
            tenants,
            registry,
            backend,
            relations,
            outcomes,
            meta_filter: MetaFilter::default(),
        }
    }

    pub fn with_meta_filter(mut self, meta_filter: MetaFilter) -> Self {
        self.meta_filter = meta_filter;
        self
    }

    fn language_of(&self, tenant: TenantId) -> Option<Language> {
        self.registry
            .tenants()
            .into_iter()
            .find(|info| info.id == tenant)
            .map(|info| info.language)
    }

    /// Reads everything needed from the source tenant inside one scope.
    async fn read_source_terms(&self, coordinates: &ImportCoordinates) -> Result<Vec<SourceTerm>> {
        let scope = TenantScope::enter(self.tenants.as_ref(), coordinates.source_tenant_id)?;

        let taxonomies = self.backend.taxonomies().await?;
        let terms = self
            .backend
            .list_assigned_terms(coordinates.source_item_id, &taxonomies)
            .await?;

        let mut source_terms = Vec::with_capacity(terms.len());
        for term in terms {
            let key = TermKey::new(scope.tenant(), term.id);
            let resolution = match self
                .relations
                .mapped_id(&key, &coordinates.dest_language)
                .await
            {
                Ok(Some(id)) => Resolution::Mapped(id),
                Ok(None) => match self.backend.term_meta(term.id).await {
                    Ok(meta) => Resolution::Missing(meta),
                    Err(e) => Resolution::MetaUnreadable(e),
                },
                Err(e) => Resolution::LookupFailed(e),
            };
            source_terms.push(SourceTerm {
                term,
                key,
                resolution,
            });
        }

        scope.exit();
        Ok(source_terms)
    }

    /// Creates the destination term, links it to the source term and copies
    /// metadata. Returns `None` when the term has to be skipped.
    async fn create_translation(
        &self,
        coordinates: &ImportCoordinates,
        term: &Term,
        source: TermKey,
        source_language: Option<&Language>,
        meta: TermMeta,
    ) -> Option<TermId> {
        let key = created_key(&term.taxonomy);

        let dest_id = match self.backend.create_term(&term.name, &term.taxonomy).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("⚠️ Could not create term '{}': {}", term.name, e);
                self.outcomes
                    .log_failure(&key, OutcomeSubject::Name(term.name.clone()));
                return None;
            }
        };

        let link = TranslationLink {
            source,
            source_language: source_language.cloned(),
            dest: TermKey::new(self.tenants.current_tenant(), dest_id),
            dest_language: coordinates.dest_language.clone(),
        };
        if let Err(e) = self.relations.link_translation(&link).await {
            tracing::error!(
                "❌ Created term {} for '{}' but could not register it: {}",
                dest_id,
                term.name,
                e
            );
            self.outcomes
                .log_failure(&key, OutcomeSubject::Name(term.name.clone()));
            return None;
        }

        self.outcomes.log_success(&key, named_id(term));

        let meta = self.meta_filter.filter(meta, term, coordinates);
        for (meta_key, values) in meta {
            for value in values {
                if let Err(e) = self.backend.add_term_meta(dest_id, &meta_key, value).await {
                    tracing::warn!("⚠️ Meta '{}' not copied to term {}: {}", meta_key, dest_id, e);
                }
            }
        }

        Some(dest_id)
    }

    async fn attach(&self, coordinates: &ImportCoordinates, term: &Term, dest_id: TermId) {
        let key = added_key(&term.taxonomy);
        match self
            .backend
            .attach_term(coordinates.dest_item_id, dest_id, &term.taxonomy)
            .await
        {
            Ok(()) => self.outcomes.log_success(&key, named_id(term)),
            Err(e) => {
                tracing::warn!("⚠️ Could not attach term {} ('{}'): {}", dest_id, term.name, e);
                self.outcomes.log_failure(&key, named_id(term));
            }
        }
    }
}

#[async_trait]
impl ImportStage for ShallowDuplicator {
    fn info(&self) -> ImporterInfo {
        ImporterInfo {
            slug: SHALLOW_DUPLICATING,
            name: "Shallow Duplicating",
            description: "Shallow (one level deep) duplication or assignment of the source item taxonomy terms to the destination item.",
        }
    }

    async fn import(
        &self,
        coordinates: &ImportCoordinates,
        payload: ImportPayload,
    ) -> Result<ImportPayload> {
        let source_terms = match self.read_source_terms(coordinates).await {
            Ok(terms) => terms,
            Err(e) => {
                tracing::error!(
                    "❌ Could not read terms of item {} on tenant {}: {}",
                    coordinates.source_item_id,
                    coordinates.source_tenant_id,
                    e
                );
                self.outcomes.log_failure(
                    &format!("terms/read/{}", coordinates.source_tenant_id),
                    OutcomeSubject::Name(e.to_string()),
                );
                return Ok(payload);
            }
        };

        let source_language = self.language_of(coordinates.source_tenant_id);
        tracing::info!(
            "📂 Importing {} terms of item {} into item {} ({})",
            source_terms.len(),
            coordinates.source_item_id,
            coordinates.dest_item_id,
            coordinates.dest_language
        );

        for SourceTerm {
            term,
            key,
            resolution,
        } in source_terms
        {
            let dest_id = match resolution {
                Resolution::Mapped(id) => {
                    tracing::debug!("'{}' already translated as {}", term.name, id);
                    id
                }
                Resolution::LookupFailed(e) => {
                    tracing::warn!("⚠️ Relation lookup failed for '{}': {}", term.name, e);
                    self.outcomes.log_failure(
                        &relation_key(&term.taxonomy),
                        OutcomeSubject::Name(term.name.clone()),
                    );
                    continue;
                }
                Resolution::MetaUnreadable(e) => {
                    tracing::warn!("⚠️ Metadata of '{}' could not be read: {}", term.name, e);
                    self.outcomes.log_failure(
                        &created_key(&term.taxonomy),
                        OutcomeSubject::Name(term.name.clone()),
                    );
                    continue;
                }
                Resolution::Missing(meta) => {
                    match self
                        .create_translation(coordinates, &term, key, source_language.as_ref(), meta)
                        .await
                    {
                        Some(id) => id,
                        None => continue,
                    }
                }
            };

            self.attach(coordinates, &term, dest_id).await;
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryNetwork;
    use crate::adapters::outcomes::MemoryOutcomeLog;
    use crate::adapters::relations::InMemoryRelationStore;
    use serde_json::json;

    struct Fixture {
        network: Arc<InMemoryNetwork>,
        relations: Arc<InMemoryRelationStore>,
        outcomes: Arc<MemoryOutcomeLog>,
        duplicator: ShallowDuplicator,
    }

    fn fixture() -> Fixture {
        let network = Arc::new(InMemoryNetwork::new(2));
        network.add_tenant(1, "en", &["tag", "category"]);
        network.add_tenant(2, "fr", &["tag", "category"]);
        let relations = Arc::new(InMemoryRelationStore::new());
        let outcomes = Arc::new(MemoryOutcomeLog::new());
        let duplicator = ShallowDuplicator::new(
            network.clone(),
            network.clone(),
            network.clone(),
            relations.clone(),
            outcomes.clone(),
        );
        Fixture {
            network,
            relations,
            outcomes,
            duplicator,
        }
    }

    #[tokio::test]
    async fn test_payload_passes_through() {
        let f = fixture();
        let payload = ImportPayload::new().with("title", json!("Bonjour"));
        let result = f
            .duplicator
            .import(&ImportCoordinates::new(1, 10, 20, "fr"), payload.clone())
            .await
            .unwrap();
        assert_eq!(result, payload);
    }

    #[tokio::test]
    async fn test_item_without_terms_emits_nothing() {
        let f = fixture();
        f.duplicator
            .import(&ImportCoordinates::new(1, 10, 20, "fr"), ImportPayload::new())
            .await
            .unwrap();
        assert!(f.outcomes.outcomes().is_empty());
        assert_eq!(f.network.current_tenant(), 2);
    }

    #[tokio::test]
    async fn test_creates_and_registers_missing_term() {
        let f = fixture();
        let source_id = f.network.insert_term(1, "News", "tag");
        f.network.assign(1, 10, source_id);

        f.duplicator
            .import(&ImportCoordinates::new(1, 10, 20, "fr"), ImportPayload::new())
            .await
            .unwrap();

        let dest = f.network.find_term(2, "News", "tag").unwrap();
        let source = TermKey::new(1, source_id);
        assert_eq!(f.relations.mapped_id(&source, "fr").await.unwrap(), Some(dest.id));
        assert_eq!(
            f.relations.mapped_id(&TermKey::new(2, dest.id), "en").await.unwrap(),
            Some(source_id)
        );
        assert_eq!(f.network.assigned_ids(2, 20), vec![dest.id]);
        assert_eq!(
            f.outcomes.keys(),
            vec![
                ("term/created/tag".to_string(), true),
                ("term/added/tag".to_string(), true)
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_source_read_is_reported_and_tenant_restored() {
        let f = fixture();
        f.duplicator
            .import(&ImportCoordinates::new(9, 10, 20, "fr"), ImportPayload::new())
            .await
            .unwrap();

        assert_eq!(f.outcomes.keys(), vec![("terms/read/9".to_string(), false)]);
        assert_eq!(f.network.current_tenant(), 2);
    }

    #[tokio::test]
    async fn test_importer_info() {
        let f = fixture();
        assert_eq!(f.duplicator.info().slug, "shallow-duplicating");
    }
}
