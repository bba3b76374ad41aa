use crate::utils::error::{SyncError, Result};
use regex::Regex;
use std::sync::OnceLock;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn language_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // "fr", "us", "de_DE", "pt_BR", "de_DE_formal"
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]{2,3}(_[A-Z]{2})?(_[a-z]+)?$").expect("language pattern is valid")
    })
}

pub fn validate_language(field_name: &str, language: &str) -> Result<()> {
    if !language_pattern().is_match(language) {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: language.to_string(),
            reason: "Expected a language code such as 'fr' or 'de_DE'".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_id(field_name: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Id must be greater than 0".to_string(),
        });
    }
    Ok(())
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| SyncError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_language() {
        assert!(validate_language("dest_language", "fr").is_ok());
        assert!(validate_language("dest_language", "de_DE").is_ok());
        assert!(validate_language("dest_language", "de_DE_formal").is_ok());
        assert!(validate_language("dest_language", "").is_err());
        assert!(validate_language("dest_language", "French").is_err());
        assert!(validate_language("dest_language", "fr-FR").is_err());
    }

    #[test]
    fn test_validate_positive_id() {
        assert!(validate_positive_id("source_tenant_id", 1).is_ok());
        assert!(validate_positive_id("source_tenant_id", 0).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3u64);
        let missing: Option<u64> = None;
        assert_eq!(*validate_required_field("import.dest_item_id", &present).unwrap(), 3);
        assert!(matches!(
            validate_required_field("import.dest_item_id", &missing),
            Err(SyncError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_validate_path_and_strings() {
        assert!(validate_path("storage.network", "network.json").is_ok());
        assert!(validate_path("storage.network", "").is_err());
        assert!(validate_non_empty_string("meta.deny", "  ").is_err());
    }
}
