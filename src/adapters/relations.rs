use crate::domain::model::{Language, TermId, TermKey, TranslationLink};
use crate::domain::ports::RelationStore;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

type GroupId = usize;
type Translations = BTreeMap<Language, TermId>;

/// Groups plus the index of member terms pointing into them.
#[derive(Debug, Clone, Default)]
struct RelationState {
    groups: Vec<Translations>,
    members: BTreeMap<TermKey, GroupId>,
}

impl RelationState {
    fn translations(&self, term: &TermKey) -> Option<&Translations> {
        self.members.get(term).map(|group| &self.groups[*group])
    }

    fn new_group(&mut self) -> GroupId {
        self.groups.push(Translations::new());
        self.groups.len() - 1
    }

    fn register(&mut self, term: &TermKey, language: &str, id: TermId) -> Result<()> {
        if let Some(existing) = self.translations(term).and_then(|t| t.get(language)) {
            return Err(SyncError::MappingConflict {
                term: *term,
                language: language.to_string(),
                existing: *existing,
            });
        }
        let group = match self.members.get(term) {
            Some(group) => *group,
            None => {
                let group = self.new_group();
                self.members.insert(*term, group);
                group
            }
        };
        self.groups[group].insert(language.to_string(), id);
        Ok(())
    }

    fn link(&mut self, link: &TranslationLink) -> Result<()> {
        let source_group = self.members.get(&link.source).copied();
        let dest_group = self.members.get(&link.dest).copied();
        if let (Some(source), Some(dest)) = (source_group, dest_group) {
            if source != dest {
                let existing = self.groups[source]
                    .get(&link.dest_language)
                    .copied()
                    .unwrap_or(link.dest.term_id);
                return Err(SyncError::MappingConflict {
                    term: link.source,
                    language: link.dest_language.clone(),
                    existing,
                });
            }
        }

        let mut entries = vec![(link.dest_language.as_str(), link.dest.term_id)];
        if let Some(language) = &link.source_language {
            if *language != link.dest_language {
                entries.push((language.as_str(), link.source.term_id));
            }
        }

        let group = match source_group.or(dest_group) {
            Some(group) => {
                for (language, id) in &entries {
                    match self.groups[group].get(*language) {
                        Some(existing) if existing != id => {
                            return Err(SyncError::MappingConflict {
                                term: link.source,
                                language: language.to_string(),
                                existing: *existing,
                            });
                        }
                        _ => {}
                    }
                }
                group
            }
            None => self.new_group(),
        };

        for (language, id) in entries {
            self.groups[group].insert(language.to_string(), id);
        }
        self.members.insert(link.source, group);
        self.members.insert(link.dest, group);
        Ok(())
    }

    fn records(&self) -> Vec<RelationRecord> {
        let mut records: Vec<RelationRecord> = self
            .groups
            .iter()
            .map(|translations| RelationRecord {
                translations: translations.clone(),
                members: Vec::new(),
            })
            .collect();
        for (term, group) in &self.members {
            records[*group].members.push(*term);
        }
        records
    }

    fn from_records(records: Vec<RelationRecord>) -> Self {
        let mut state = Self::default();
        for record in records {
            let group = state.groups.len();
            state.groups.push(record.translations);
            for term in record.members {
                state.members.insert(term, group);
            }
        }
        state
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRelationStore {
    state: Mutex<RelationState>,
}

impl InMemoryRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RelationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn group_count(&self) -> usize {
        self.state().groups.len()
    }

    /// Applies `change` to a copy of the state and keeps it only when
    /// `save` accepts the copy.
    fn commit<C, S>(&self, change: C, save: S) -> Result<()>
    where
        C: FnOnce(&mut RelationState) -> Result<()>,
        S: FnOnce(&RelationState) -> Result<()>,
    {
        let mut state = self.state();
        let mut next = state.clone();
        change(&mut next)?;
        save(&next)?;
        *state = next;
        Ok(())
    }
}

#[async_trait]
impl RelationStore for InMemoryRelationStore {
    async fn mapped_id(&self, term: &TermKey, language: &str) -> Result<Option<TermId>> {
        Ok(self
            .state()
            .translations(term)
            .and_then(|translations| translations.get(language))
            .copied())
    }

    async fn register_id(&self, term: &TermKey, language: &str, id: TermId) -> Result<()> {
        self.commit(|state| state.register(term, language, id), |_| Ok(()))
    }

    async fn link_translation(&self, link: &TranslationLink) -> Result<()> {
        self.commit(|state| state.link(link), |_| Ok(()))
    }

    async fn translations(&self, term: &TermKey) -> Result<Translations> {
        Ok(self.state().translations(term).cloned().unwrap_or_default())
    }
}

/// One group as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub translations: BTreeMap<Language, TermId>,
    /// Terms the group can be looked up by.
    pub members: Vec<TermKey>,
}

fn write_records(path: &Path, state: &RelationState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let data = serde_json::to_vec_pretty(&state.records())?;
    fs::write(path, data)?;
    Ok(())
}

/// JSON-file backed store. By default the whole file is rewritten on every
/// registration and a registration that cannot be written is not kept.
/// With deferred writes nothing touches the file until `flush`.
#[derive(Debug)]
pub struct FileRelationStore {
    path: PathBuf,
    deferred: bool,
    inner: InMemoryRelationStore,
}

impl FileRelationStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let records: Vec<RelationRecord> = serde_json::from_str(&content)?;
            tracing::debug!("Loaded {} relation groups from {}", records.len(), path.display());
            RelationState::from_records(records)
        } else {
            RelationState::default()
        };
        Ok(Self {
            path,
            deferred: false,
            inner: InMemoryRelationStore {
                state: Mutex::new(state),
            },
        })
    }

    /// Keeps registrations in memory until `flush` is called.
    pub fn with_deferred_writes(mut self) -> Self {
        self.deferred = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current state to the file.
    pub fn flush(&self) -> Result<()> {
        write_records(&self.path, &self.inner.state())?;
        tracing::debug!("💾 Relations saved to {}", self.path.display());
        Ok(())
    }

    fn save(&self, state: &RelationState) -> Result<()> {
        if self.deferred {
            return Ok(());
        }
        write_records(&self.path, state)
    }
}

#[async_trait]
impl RelationStore for FileRelationStore {
    async fn mapped_id(&self, term: &TermKey, language: &str) -> Result<Option<TermId>> {
        self.inner.mapped_id(term, language).await
    }

    async fn register_id(&self, term: &TermKey, language: &str, id: TermId) -> Result<()> {
        self.inner
            .commit(|state| state.register(term, language, id), |next| self.save(next))
    }

    async fn link_translation(&self, link: &TranslationLink) -> Result<()> {
        self.inner
            .commit(|state| state.link(link), |next| self.save(next))
    }

    async fn translations(&self, term: &TermKey) -> Result<Translations> {
        self.inner.translations(term).await
    }
}
