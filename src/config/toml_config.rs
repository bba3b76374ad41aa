use crate::core::meta_filter::ConfiguredDenyList;
use crate::domain::model::ImportCoordinates;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{
    validate_language, validate_non_empty_string, validate_path, validate_positive_id,
    validate_required_field, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub import: ImportSection,
    #[serde(default)]
    pub meta: ConfiguredDenyList,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Coordinates may come from the file, the command line, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSection {
    pub source_tenant_id: Option<u64>,
    pub source_item_id: Option<u64>,
    pub dest_tenant_id: Option<u64>,
    pub dest_item_id: Option<u64>,
    pub dest_language: Option<String>,
}

impl ImportSection {
    pub fn coordinates(&self) -> Result<ImportCoordinates> {
        let coordinates = ImportCoordinates {
            source_tenant_id: *validate_required_field("import.source_tenant_id", &self.source_tenant_id)?,
            source_item_id: *validate_required_field("import.source_item_id", &self.source_item_id)?,
            dest_tenant_id: self.dest_tenant_id,
            dest_item_id: *validate_required_field("import.dest_item_id", &self.dest_item_id)?,
            dest_language: validate_required_field("import.dest_language", &self.dest_language)?
                .clone(),
        };
        coordinates.validate()?;
        Ok(coordinates)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON network snapshot.
    pub network: Option<String>,
    /// JSON file holding the translation relations.
    pub relations: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    #[serde(default)]
    pub format: LogFormat,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RELATIONS_PATH})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let re = PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn network_path(&self) -> Result<&str> {
        validate_required_field("storage.network", &self.storage.network).map(String::as_str)
    }

    pub fn relations_path(&self) -> Result<&str> {
        validate_required_field("storage.relations", &self.storage.relations).map(String::as_str)
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        if let Some(network) = &self.storage.network {
            validate_path("storage.network", network)?;
        }
        if let Some(relations) = &self.storage.relations {
            validate_path("storage.relations", relations)?;
        }

        for (field, id) in [
            ("import.source_tenant_id", self.import.source_tenant_id),
            ("import.source_item_id", self.import.source_item_id),
            ("import.dest_tenant_id", self.import.dest_tenant_id),
            ("import.dest_item_id", self.import.dest_item_id),
        ] {
            if let Some(id) = id {
                validate_positive_id(field, id)?;
            }
        }
        if let Some(language) = &self.import.dest_language {
            validate_language("import.dest_language", language)?;
        }

        for key in &self.meta.deny {
            validate_non_empty_string("meta.deny", key)?;
        }
        for (taxonomy, list) in &self.meta.taxonomies {
            for key in &list.deny {
                validate_non_empty_string(&format!("meta.taxonomies.{}.deny", taxonomy), key)?;
            }
        }

        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(SyncError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[import]
source_tenant_id = 1
source_item_id = 10
dest_item_id = 20
dest_language = "fr"

[meta]
deny = ["_edit_lock"]

[meta.taxonomies.category]
deny = ["color"]

[storage]
network = "network.json"
relations = "relations.json"

[logging]
level = "debug"
format = "json"
"#;

    #[test]
    fn test_parse_full_config() {
        let config = SyncConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.meta.deny, vec!["_edit_lock".to_string()]);
        assert_eq!(config.meta.taxonomies["category"].deny, vec!["color".to_string()]);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.network_path().unwrap(), "network.json");

        let coordinates = config.import.coordinates().unwrap();
        assert_eq!(coordinates, ImportCoordinates::new(1, 10, 20, "fr"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = SyncConfig::from_toml_str("").unwrap();
        assert!(config.validate().is_ok());
        assert!(config.meta.deny.is_empty());
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(matches!(
            config.import.coordinates(),
            Err(SyncError::MissingConfigError { .. })
        ));
        assert!(config.relations_path().is_err());
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("TERM_SYNC_TEST_RELATIONS", "/tmp/relations.json");
        let config = SyncConfig::from_toml_str(
            "[storage]\nrelations = \"${TERM_SYNC_TEST_RELATIONS}\"\n",
        )
        .unwrap();
        assert_eq!(config.relations_path().unwrap(), "/tmp/relations.json");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let bad_level = SyncConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(bad_level.validate().is_err());

        let bad_language =
            SyncConfig::from_toml_str("[import]\ndest_language = \"Français\"\n").unwrap();
        assert!(bad_language.validate().is_err());

        assert!(SyncConfig::from_toml_str("[import\n").is_err());
    }
}
