pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::memory::{InMemoryNetwork, NetworkSnapshot};
pub use adapters::outcomes::{MemoryOutcomeLog, TracingOutcomeLog};
pub use adapters::relations::{FileRelationStore, InMemoryRelationStore};
pub use app::{run_file_sync, SyncReport};
pub use config::SyncConfig;
pub use crate::core::{duplicator::ShallowDuplicator, import_pipeline::ImportPipeline};
pub use domain::model::{
    ImportCoordinates, ImportPayload, Outcome, OutcomeSubject, Term, TermKey, TranslationLink,
};
pub use utils::error::{Result, SyncError};
