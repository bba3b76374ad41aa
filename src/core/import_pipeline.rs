use crate::domain::model::{ImportCoordinates, ImportPayload};
use crate::domain::ports::ImportStage;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use std::time::Instant;

/// Runs import stages in registration order, threading the payload.
#[derive(Default)]
pub struct ImportPipeline {
    stages: Vec<Box<dyn ImportStage>>,
}

impl ImportPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, stage: Box<dyn ImportStage>) {
        self.stages.push(stage);
    }

    pub fn with_stage(mut self, stage: impl ImportStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_slugs(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.info().slug).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Validates the coordinates, then runs every stage. A stage error stops
    /// the run and is returned.
    pub async fn run(
        &self,
        coordinates: &ImportCoordinates,
        payload: ImportPayload,
    ) -> Result<ImportPayload> {
        coordinates.validate()?;
        let start = Instant::now();
        tracing::info!(
            "🚀 Import {}:{} -> item {} ({}) with {} stages",
            coordinates.source_tenant_id,
            coordinates.source_item_id,
            coordinates.dest_item_id,
            coordinates.dest_language,
            self.stages.len()
        );

        let mut payload = payload;
        for (index, stage) in self.stages.iter().enumerate() {
            let info = stage.info();
            tracing::debug!("▶️ Stage {}/{}: {}", index + 1, self.stages.len(), info.slug);
            payload = stage.import(coordinates, payload).await.map_err(|e| {
                tracing::error!("❌ Stage '{}' failed: {}", info.slug, e);
                e
            })?;
        }

        tracing::info!("✅ Import finished in {:?}", start.elapsed());
        Ok(payload)
    }
}
