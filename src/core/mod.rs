pub mod duplicator;
pub mod import_pipeline;
pub mod meta_filter;
pub mod picker;
pub mod tenant_scope;

pub use crate::domain::model::{ImportCoordinates, ImportPayload, Term, TermMeta};
pub use crate::domain::ports::{
    ImportStage, MetaDenyPolicy, OutcomeLog, RelationStore, TenantContext, TermBackend,
};
pub use crate::utils::error::Result;
