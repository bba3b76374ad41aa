//! Data behind the per-language translation selector shown when editing a term.

use crate::core::tenant_scope::TenantScope;
use crate::domain::model::{Language, TenantId, TermId, TermKey};
use crate::domain::ports::{RelationStore, TenantContext, TenantRegistry, TermBackend};
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermChoice {
    pub id: TermId,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageChoices {
    pub tenant: TenantId,
    pub language: Language,
    pub mapped: Option<TermId>,
    pub options: Vec<TermChoice>,
}

pub struct TranslationPicker {
    registry: Arc<dyn TenantRegistry>,
    tenants: Arc<dyn TenantContext>,
    backend: Arc<dyn TermBackend>,
    relations: Arc<dyn RelationStore>,
}

impl TranslationPicker {
    pub fn new(
        registry: Arc<dyn TenantRegistry>,
        tenants: Arc<dyn TenantContext>,
        backend: Arc<dyn TermBackend>,
        relations: Arc<dyn RelationStore>,
    ) -> Self {
        Self {
            registry,
            tenants,
            backend,
            relations,
        }
    }

    /// One entry per other tenant listing its `taxonomy` terms. `term` is
    /// the edited term, `None` for a term that does not exist yet.
    pub async fn choices(
        &self,
        current: TenantId,
        term: Option<&TermKey>,
        taxonomy: &str,
    ) -> Result<Vec<LanguageChoices>> {
        let translations = match term {
            Some(term) => self.relations.translations(term).await?,
            None => Default::default(),
        };

        let mut choices = Vec::new();
        for tenant in self.registry.tenants() {
            if tenant.id == current {
                continue;
            }

            let mapped = translations.get(&tenant.language).copied();
            let scope = TenantScope::enter(self.tenants.as_ref(), tenant.id)?;
            let terms = self.backend.list_terms(taxonomy).await?;
            scope.exit();

            choices.push(LanguageChoices {
                tenant: tenant.id,
                language: tenant.language,
                mapped,
                options: terms
                    .into_iter()
                    .map(|t| TermChoice {
                        selected: Some(t.id) == mapped,
                        id: t.id,
                        name: t.name,
                    })
                    .collect(),
            });
        }

        Ok(choices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryNetwork;
    use crate::adapters::relations::InMemoryRelationStore;
    use crate::domain::model::TranslationLink;

    fn picker() -> (Arc<InMemoryNetwork>, Arc<InMemoryRelationStore>, TranslationPicker) {
        let network = Arc::new(InMemoryNetwork::new(1));
        network.add_tenant(1, "en", &["tag"]);
        network.add_tenant(2, "fr", &["tag"]);
        network.add_tenant(3, "de", &["tag"]);
        let relations = Arc::new(InMemoryRelationStore::new());
        let picker = TranslationPicker::new(
            network.clone(),
            network.clone(),
            network.clone(),
            relations.clone(),
        );
        (network, relations, picker)
    }

    #[test]
    fn test_marks_mapped_term() {
        let (network, relations, picker) = picker();
        let news = network.insert_term(1, "News", "tag");
        let actu = network.insert_term(2, "Actualités", "tag");
        network.insert_term(2, "Sport", "tag");
        let term = TermKey::new(1, news);

        let choices = tokio_test::block_on(async {
            relations.register_id(&term, "fr", actu).await.unwrap();
            picker.choices(1, Some(&term), "tag").await.unwrap()
        });

        assert_eq!(choices.len(), 2);
        let fr = &choices[0];
        assert_eq!(fr.language, "fr");
        assert_eq!(fr.mapped, Some(actu));
        assert_eq!(
            fr.options.iter().filter(|o| o.selected).map(|o| o.id).collect::<Vec<_>>(),
            vec![actu]
        );
        let de = &choices[1];
        assert_eq!(de.mapped, None);
        assert!(de.options.is_empty());
        assert_eq!(network.current_tenant(), 1);
    }

    #[test]
    fn test_new_term_has_nothing_selected() {
        let (network, _, picker) = picker();
        network.insert_term(2, "Sport", "tag");

        let choices = tokio_test::block_on(picker.choices(1, None, "tag")).unwrap();
        assert!(choices.iter().all(|c| c.options.iter().all(|o| !o.selected)));
    }

    #[test]
    fn test_translated_term_sees_its_source() {
        let (network, relations, picker) = picker();
        let news = network.insert_term(1, "News", "tag");
        let actu = network.insert_term(2, "Actualités", "tag");
        let link = TranslationLink {
            source: TermKey::new(1, news),
            source_language: Some("en".to_string()),
            dest: TermKey::new(2, actu),
            dest_language: "fr".to_string(),
        };

        let choices = tokio_test::block_on(async {
            relations.link_translation(&link).await.unwrap();
            picker.choices(2, Some(&TermKey::new(2, actu)), "tag").await.unwrap()
        });

        let en = choices.iter().find(|c| c.language == "en").unwrap();
        assert_eq!(en.mapped, Some(news));
        assert!(en.options.iter().any(|o| o.id == news && o.selected));
    }
}
