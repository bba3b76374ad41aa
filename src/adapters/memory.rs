use crate::domain::model::{ItemId, Language, TenantId, TenantInfo, Term, TermId, TermMeta};
use crate::domain::ports::{TenantContext, TenantRegistry, TermBackend};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTerm {
    pub id: TermId,
    pub name: String,
    pub taxonomy: String,
    #[serde(default)]
    pub meta: TermMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub item: ItemId,
    pub term_id: TermId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantSnapshot {
    pub id: TenantId,
    pub language: Language,
    #[serde(default)]
    pub taxonomies: Vec<String>,
    #[serde(default)]
    pub terms: Vec<StoredTerm>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
}

impl TenantSnapshot {
    fn term(&self, id: TermId) -> Option<&StoredTerm> {
        self.terms.iter().find(|t| t.id == id)
    }

    fn next_term_id(&self) -> TermId {
        self.terms.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }
}

/// Serializable state of a whole network, as read from and written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Tenant active when nothing has been switched.
    pub default_tenant: TenantId,
    pub tenants: Vec<TenantSnapshot>,
}

impl NetworkSnapshot {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // 先寫暫存檔再改名，避免留下寫到一半的檔案
        let staging = staging_path(path);
        fs::write(&staging, serde_json::to_vec_pretty(self)?)?;
        fs::rename(&staging, path)?;
        Ok(())
    }
}

/// `<path>.tmp`, next to the snapshot it replaces.
fn staging_path(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    name.into()
}

/// A backend call and the tenant it ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCall {
    pub tenant: TenantId,
    pub operation: &'static str,
}

#[derive(Debug)]
struct NetworkState {
    tenants: BTreeMap<TenantId, TenantSnapshot>,
    default_tenant: TenantId,
    stack: Vec<TenantId>,
    rejected_names: HashSet<String>,
    journal: Vec<BackendCall>,
}

impl NetworkState {
    fn current(&self) -> TenantId {
        self.stack.last().copied().unwrap_or(self.default_tenant)
    }

    fn record(&mut self, operation: &'static str) -> TenantId {
        let tenant = self.current();
        self.journal.push(BackendCall { tenant, operation });
        tenant
    }

    fn tenant_mut(&mut self, id: TenantId) -> Result<&mut TenantSnapshot> {
        self.tenants.get_mut(&id).ok_or(SyncError::UnknownTenant(id))
    }

    fn active(&mut self, operation: &'static str) -> Result<&mut TenantSnapshot> {
        let tenant = self.record(operation);
        self.tenant_mut(tenant)
    }
}

/// In-process network of tenants: tenant switching, term storage and the
/// tenant registry over one shared state.
#[derive(Debug)]
pub struct InMemoryNetwork {
    state: Mutex<NetworkState>,
}

impl InMemoryNetwork {
    pub fn new(default_tenant: TenantId) -> Self {
        Self::from_snapshot(NetworkSnapshot {
            default_tenant,
            tenants: Vec::new(),
        })
    }

    pub fn from_snapshot(snapshot: NetworkSnapshot) -> Self {
        let tenants = snapshot
            .tenants
            .into_iter()
            .map(|tenant| (tenant.id, tenant))
            .collect();
        Self {
            state: Mutex::new(NetworkState {
                tenants,
                default_tenant: snapshot.default_tenant,
                stack: Vec::new(),
                rejected_names: HashSet::new(),
                journal: Vec::new(),
            }),
        }
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        let state = self.state();
        NetworkSnapshot {
            default_tenant: state.default_tenant,
            tenants: state.tenants.values().cloned().collect(),
        }
    }

    fn state(&self) -> MutexGuard<'_, NetworkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_tenant(&self, id: TenantId, language: &str, taxonomies: &[&str]) {
        self.state().tenants.insert(
            id,
            TenantSnapshot {
                id,
                language: language.to_string(),
                taxonomies: taxonomies.iter().map(|t| t.to_string()).collect(),
                terms: Vec::new(),
                assignments: Vec::new(),
            },
        );
    }

    /// Adds a term with the next free id. Panics on an unknown tenant.
    pub fn insert_term(&self, tenant: TenantId, name: &str, taxonomy: &str) -> TermId {
        let mut state = self.state();
        let snapshot = state.tenants.get_mut(&tenant).expect("tenant exists");
        let id = snapshot.next_term_id();
        snapshot.terms.push(StoredTerm {
            id,
            name: name.to_string(),
            taxonomy: taxonomy.to_string(),
            meta: TermMeta::new(),
        });
        id
    }

    pub fn insert_term_with_id(&self, tenant: TenantId, id: TermId, name: &str, taxonomy: &str) {
        let mut state = self.state();
        let snapshot = state.tenants.get_mut(&tenant).expect("tenant exists");
        snapshot.terms.push(StoredTerm {
            id,
            name: name.to_string(),
            taxonomy: taxonomy.to_string(),
            meta: TermMeta::new(),
        });
    }

    pub fn insert_meta(&self, tenant: TenantId, term: TermId, key: &str, value: serde_json::Value) {
        let mut state = self.state();
        let snapshot = state.tenants.get_mut(&tenant).expect("tenant exists");
        if let Some(stored) = snapshot.terms.iter_mut().find(|t| t.id == term) {
            stored.meta.entry(key.to_string()).or_default().push(value);
        }
    }

    pub fn assign(&self, tenant: TenantId, item: ItemId, term_id: TermId) {
        let mut state = self.state();
        let snapshot = state.tenants.get_mut(&tenant).expect("tenant exists");
        snapshot.assignments.push(Assignment { item, term_id });
    }

    /// Makes `create_term` fail for this name on every tenant.
    pub fn reject_name(&self, name: &str) {
        self.state().rejected_names.insert(name.to_string());
    }

    pub fn find_term(&self, tenant: TenantId, name: &str, taxonomy: &str) -> Option<Term> {
        let state = self.state();
        state.tenants.get(&tenant)?.terms.iter().find_map(|t| {
            (t.name == name && t.taxonomy == taxonomy).then(|| Term::new(t.id, &t.name, &t.taxonomy))
        })
    }

    pub fn term_count(&self, tenant: TenantId) -> usize {
        self.state()
            .tenants
            .get(&tenant)
            .map(|t| t.terms.len())
            .unwrap_or(0)
    }

    pub fn meta_of(&self, tenant: TenantId, term: TermId) -> TermMeta {
        let state = self.state();
        state
            .tenants
            .get(&tenant)
            .and_then(|t| t.term(term))
            .map(|t| t.meta.clone())
            .unwrap_or_default()
    }

    pub fn assigned_ids(&self, tenant: TenantId, item: ItemId) -> Vec<TermId> {
        let state = self.state();
        state
            .tenants
            .get(&tenant)
            .map(|t| {
                t.assignments
                    .iter()
                    .filter(|a| a.item == item)
                    .map(|a| a.term_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn journal(&self) -> Vec<BackendCall> {
        self.state().journal.clone()
    }
}

impl TenantContext for InMemoryNetwork {
    fn switch_to(&self, tenant: TenantId) -> Result<()> {
        let mut state = self.state();
        if !state.tenants.contains_key(&tenant) {
            return Err(SyncError::UnknownTenant(tenant));
        }
        state.stack.push(tenant);
        Ok(())
    }

    fn restore_previous(&self) -> Result<()> {
        self.state()
            .stack
            .pop()
            .map(|_| ())
            .ok_or_else(|| SyncError::TenantStack {
                message: "restore without a matching switch".to_string(),
            })
    }

    fn current_tenant(&self) -> TenantId {
        self.state().current()
    }
}

impl TenantRegistry for InMemoryNetwork {
    fn tenants(&self) -> Vec<TenantInfo> {
        self.state()
            .tenants
            .values()
            .map(|t| TenantInfo {
                id: t.id,
                language: t.language.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl TermBackend for InMemoryNetwork {
    async fn taxonomies(&self) -> Result<Vec<String>> {
        let mut state = self.state();
        Ok(state.active("taxonomies")?.taxonomies.clone())
    }

    async fn list_assigned_terms(&self, item: ItemId, taxonomies: &[String]) -> Result<Vec<Term>> {
        let mut state = self.state();
        let tenant = &*state.active("list_assigned_terms")?;
        let mut seen = HashSet::new();
        Ok(tenant
            .assignments
            .iter()
            .filter(|a| a.item == item && seen.insert(a.term_id))
            .filter_map(|a| tenant.term(a.term_id))
            .filter(|t| taxonomies.contains(&t.taxonomy))
            .map(|t| Term::new(t.id, &t.name, &t.taxonomy))
            .collect())
    }

    async fn create_term(&self, name: &str, taxonomy: &str) -> Result<TermId> {
        let mut state = self.state();
        let rejected = state.rejected_names.contains(name);
        let tenant = state.active("create_term")?;
        let failure = |reason: &str| SyncError::Creation {
            name: name.to_string(),
            taxonomy: taxonomy.to_string(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(failure("A name is required for this term"));
        }
        if !tenant.taxonomies.iter().any(|t| t == taxonomy) {
            return Err(failure("Invalid taxonomy"));
        }
        if rejected {
            return Err(failure("Rejected by backend"));
        }

        if let Some(existing) = tenant
            .terms
            .iter()
            .find(|t| t.taxonomy == taxonomy && t.name.eq_ignore_ascii_case(name))
        {
            return Ok(existing.id);
        }

        let id = tenant.next_term_id();
        tenant.terms.push(StoredTerm {
            id,
            name: name.to_string(),
            taxonomy: taxonomy.to_string(),
            meta: TermMeta::new(),
        });
        Ok(id)
    }

    async fn term_meta(&self, term: TermId) -> Result<TermMeta> {
        let mut state = self.state();
        let tenant = state.active("term_meta")?;
        let tenant_id = tenant.id;
        tenant
            .term(term)
            .map(|t| t.meta.clone())
            .ok_or(SyncError::UnknownTerm {
                tenant: tenant_id,
                term_id: term,
            })
    }

    async fn add_term_meta(&self, term: TermId, key: &str, value: serde_json::Value) -> Result<()> {
        let mut state = self.state();
        let tenant = state.active("add_term_meta")?;
        let tenant_id = tenant.id;
        let stored = tenant
            .terms
            .iter_mut()
            .find(|t| t.id == term)
            .ok_or(SyncError::UnknownTerm {
                tenant: tenant_id,
                term_id: term,
            })?;
        stored.meta.entry(key.to_string()).or_default().push(value);
        Ok(())
    }

    async fn attach_term(&self, item: ItemId, term: TermId, taxonomy: &str) -> Result<()> {
        let mut state = self.state();
        let tenant = state.active("attach_term")?;
        let matches = tenant
            .term(term)
            .map(|t| t.taxonomy == taxonomy)
            .unwrap_or(false);
        if !matches {
            return Err(SyncError::Attachment {
                item_id: item,
                term_id: term,
                taxonomy: taxonomy.to_string(),
                reason: "Term does not exist in this taxonomy".to_string(),
            });
        }

        let assignment = Assignment { item, term_id: term };
        if !tenant.assignments.contains(&assignment) {
            tenant.assignments.push(assignment);
        }
        Ok(())
    }

    async fn list_terms(&self, taxonomy: &str) -> Result<Vec<Term>> {
        let mut state = self.state();
        let tenant = state.active("list_terms")?;
        Ok(tenant
            .terms
            .iter()
            .filter(|t| t.taxonomy == taxonomy)
            .map(|t| Term::new(t.id, &t.name, &t.taxonomy))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn network() -> InMemoryNetwork {
        let network = InMemoryNetwork::new(2);
        network.add_tenant(1, "en", &["tag"]);
        network.add_tenant(2, "fr", &["tag"]);
        network
    }

    #[tokio::test]
    async fn test_operations_run_on_current_tenant() {
        let network = network();
        network.insert_term(1, "News", "tag");

        assert!(network.list_terms("tag").await.unwrap().is_empty());
        network.switch_to(1).unwrap();
        assert_eq!(network.list_terms("tag").await.unwrap().len(), 1);
        network.restore_previous().unwrap();
        assert_eq!(network.current_tenant(), 2);
    }

    #[tokio::test]
    async fn test_create_term_reuses_existing_name() {
        let network = network();
        let first = network.create_term("News", "tag").await.unwrap();
        let second = network.create_term("news", "tag").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(network.term_count(2), 1);
    }

    #[tokio::test]
    async fn test_create_term_failures() {
        let network = network();
        network.reject_name("Spam");
        assert!(matches!(
            network.create_term("", "tag").await,
            Err(SyncError::Creation { .. })
        ));
        assert!(network.create_term("News", "genre").await.is_err());
        assert!(network.create_term("Spam", "tag").await.is_err());
    }

    #[tokio::test]
    async fn test_attach_requires_existing_term() {
        let network = network();
        assert!(matches!(
            network.attach_term(20, 42, "tag").await,
            Err(SyncError::Attachment { .. })
        ));
        network.insert_term_with_id(2, 42, "Actualités", "tag");
        network.attach_term(20, 42, "tag").await.unwrap();
        network.attach_term(20, 42, "tag").await.unwrap();
        assert_eq!(network.assigned_ids(2, 20), vec![42]);
    }

    #[tokio::test]
    async fn test_meta_is_multi_valued() {
        let network = network();
        let id = network.insert_term(2, "News", "tag");
        network.add_term_meta(id, "alias", json!("a")).await.unwrap();
        network.add_term_meta(id, "alias", json!("b")).await.unwrap();
        assert_eq!(network.term_meta(id).await.unwrap()["alias"], vec![json!("a"), json!("b")]);
    }

    #[test]
    fn test_unbalanced_restore_is_an_error() {
        assert!(matches!(
            network().restore_previous(),
            Err(SyncError::TenantStack { .. })
        ));
        assert!(network().switch_to(9).is_err());
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("network.json");
        let network = network();
        let id = network.insert_term(1, "News", "tag");
        network.assign(1, 10, id);

        network.snapshot().write_file(&path).unwrap();
        let reloaded = InMemoryNetwork::from_snapshot(NetworkSnapshot::from_file(&path).unwrap());
        assert_eq!(reloaded.assigned_ids(1, 10), vec![id]);
        assert_eq!(reloaded.tenants().len(), 2);
    }
}
