use crate::domain::model::{TermKey, TenantId, TermId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Term '{name}' could not be created in taxonomy '{taxonomy}': {reason}")]
    Creation {
        name: String,
        taxonomy: String,
        reason: String,
    },

    #[error("Term {term_id} could not be attached to item {item_id} ({taxonomy}): {reason}")]
    Attachment {
        item_id: u64,
        term_id: TermId,
        taxonomy: String,
        reason: String,
    },

    #[error("Language '{language}' in the group of {term} is already mapped to term {existing}")]
    MappingConflict {
        term: TermKey,
        language: String,
        existing: TermId,
    },

    #[error("Unknown tenant: {0}")]
    UnknownTenant(TenantId),

    #[error("Unknown term {term_id} on tenant {tenant}")]
    UnknownTerm { tenant: TenantId, term_id: TermId },

    #[error("Tenant context error: {message}")]
    TenantStack { message: String },

    #[error("Backend error: {message}")]
    Backend { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Term,
    Relation,
    Tenant,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Creation { .. } | SyncError::Attachment { .. } => ErrorCategory::Term,
            SyncError::MappingConflict { .. } => ErrorCategory::Relation,
            SyncError::UnknownTenant(_)
            | SyncError::UnknownTerm { .. }
            | SyncError::TenantStack { .. } => ErrorCategory::Tenant,
            SyncError::Backend { .. }
            | SyncError::IoError(_)
            | SyncError::SerializationError(_) => ErrorCategory::Storage,
            SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一 term 的失敗不影響整體匯入
            SyncError::Creation { .. } | SyncError::Attachment { .. } => ErrorSeverity::Low,
            SyncError::UnknownTerm { .. } | SyncError::Backend { .. } => ErrorSeverity::Medium,
            SyncError::UnknownTenant(_)
            | SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::SerializationError(_) => ErrorSeverity::High,
            SyncError::MappingConflict { .. }
            | SyncError::TenantStack { .. }
            | SyncError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Term => "Check the term name and taxonomy on the destination site",
            ErrorCategory::Relation => {
                "Inspect the relations file; an existing translation must not be overwritten"
            }
            ErrorCategory::Tenant => "Verify the site ids against the network snapshot",
            ErrorCategory::Storage => "Check that the network and relations files are readable JSON",
            ErrorCategory::Configuration => "Review the TOML configuration and CLI arguments",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::UnknownTenant(id) => format!("Site {} does not exist in this network", id),
            SyncError::MissingConfigError { field } => {
                format!("'{}' is required but was not provided", field)
            }
            SyncError::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
