use crate::adapters::memory::{InMemoryNetwork, NetworkSnapshot};
use crate::adapters::outcomes::{FanoutOutcomeLog, MemoryOutcomeLog, OutcomeSummary, TracingOutcomeLog};
use crate::adapters::relations::FileRelationStore;
use crate::config::SyncConfig;
use crate::core::duplicator::ShallowDuplicator;
use crate::core::import_pipeline::ImportPipeline;
use crate::core::meta_filter::MetaFilter;
use crate::domain::model::{ImportCoordinates, ImportPayload, Outcome};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// What one file-backed sync run did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub coordinates: ImportCoordinates,
    pub summary: OutcomeSummary,
    pub outcomes: Vec<Outcome>,
}

impl SyncReport {
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// Loads the network snapshot and relations named by `config`, runs the
/// term import, then writes the updated snapshot back. Relations are only
/// written once the snapshot is saved, so a failed save never leaves
/// relations pointing at terms the saved network does not have.
pub async fn run_file_sync(config: &SyncConfig) -> Result<SyncReport> {
    config.validate()?;
    let coordinates = config.import.coordinates()?;
    let network_path = config.network_path()?;

    let network = Arc::new(InMemoryNetwork::from_snapshot(NetworkSnapshot::from_file(
        network_path,
    )?));
    let relations =
        Arc::new(FileRelationStore::open(config.relations_path()?)?.with_deferred_writes());
    let memory_log = Arc::new(MemoryOutcomeLog::new());
    let outcomes = Arc::new(FanoutOutcomeLog::new(vec![
        memory_log.clone(),
        Arc::new(TracingOutcomeLog),
    ]));

    let duplicator = ShallowDuplicator::new(
        network.clone(),
        network.clone(),
        network.clone(),
        relations.clone(),
        outcomes,
    )
    .with_meta_filter(MetaFilter::new(Arc::new(config.meta.clone())));
    let pipeline = ImportPipeline::new().with_stage(duplicator);

    pipeline.run(&coordinates, ImportPayload::new()).await?;

    network.snapshot().write_file(network_path)?;
    tracing::info!("📁 Network saved to: {}", network_path);
    relations.flush()?;

    Ok(SyncReport {
        coordinates,
        summary: memory_log.summary(),
        outcomes: memory_log.outcomes(),
    })
}
