pub mod toml_config;

pub use toml_config::{LogFormat, SyncConfig};

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "term-sync")]
#[command(about = "Duplicate the terms of a content item onto a translated copy")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long, help = "JSON network snapshot, updated in place")]
    pub network: Option<String>,

    #[arg(long, help = "JSON translation relations file")]
    pub relations: Option<String>,

    #[arg(long)]
    pub source_tenant: Option<u64>,

    #[arg(long)]
    pub source_item: Option<u64>,

    #[arg(long)]
    pub dest_tenant: Option<u64>,

    #[arg(long)]
    pub dest_item: Option<u64>,

    #[arg(long)]
    pub dest_lang: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Meta keys never copied")]
    pub deny_meta: Vec<String>,

    #[arg(long, help = "Write the outcomes as JSON to this file")]
    pub report: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Loads the TOML file when given, then lets command line values win.
    pub fn resolve(&self) -> crate::Result<SyncConfig> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::from_file(path)?,
            None => SyncConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut SyncConfig) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut config.storage.network, &self.network);
        set(&mut config.storage.relations, &self.relations);
        set(&mut config.import.source_tenant_id, &self.source_tenant);
        set(&mut config.import.source_item_id, &self.source_item);
        set(&mut config.import.dest_tenant_id, &self.dest_tenant);
        set(&mut config.import.dest_item_id, &self.dest_item);
        set(&mut config.import.dest_language, &self.dest_lang);

        for key in &self.deny_meta {
            if !config.meta.deny.contains(key) {
                config.meta.deny.push(key.clone());
            }
        }
    }
}
