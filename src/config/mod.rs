//! Configuration for the completion handler.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::error::{
    ConfigError, EmptyCatalogUriSnafu, EmptyComponentSnafu, EmptyTrackerUriSnafu, ReadFileSnafu,
    YamlParseSnafu,
};

fn default_component() -> String {
    "Postupdate".to_string()
}

/// Handler configuration, loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Storage URI of the metadata catalog (e.g., "s3://catalog-bucket/objects").
    pub catalog_uri: String,
    /// Storage URI of the execution-history store (e.g., "s3://catalog-bucket/executions").
    pub tracker_uri: String,
    /// Fixed per-deployment component label recorded in execution history.
    #[serde(default = "default_component")]
    pub component: String,
}

impl Config {
    /// Load and validate configuration from a YAML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).context(ReadFileSnafu)?;
        let config: Config = serde_yaml::from_str(&content).context(YamlParseSnafu)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate that required fields are present and non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(!self.catalog_uri.trim().is_empty(), EmptyCatalogUriSnafu);
        ensure!(!self.tracker_uri.trim().is_empty(), EmptyTrackerUriSnafu);
        ensure!(!self.component.trim().is_empty(), EmptyComponentSnafu);
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Data-lake stage-completion handler")]
pub struct CliArgs {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the stage-completion event JSON
    #[arg(short, long)]
    pub event: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r#"
catalog_uri: "s3://catalog-bucket/objects"
tracker_uri: "s3://catalog-bucket/executions"
component: "Postupdate"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.catalog_uri, "s3://catalog-bucket/objects");
        assert_eq!(config.component, "Postupdate");
        config.validate().unwrap();
    }

    #[test]
    fn test_component_default() {
        let yaml = r#"
catalog_uri: "/var/lib/stagehand/catalog"
tracker_uri: "/var/lib/stagehand/executions"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.component, "Postupdate");
    }

    #[test]
    fn test_empty_catalog_uri_rejected() {
        let config = Config {
            catalog_uri: " ".to_string(),
            tracker_uri: "/executions".to_string(),
            component: "Postupdate".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyCatalogUri)
        ));
    }

    #[test]
    fn test_empty_tracker_uri_rejected() {
        let config = Config {
            catalog_uri: "/catalog".to_string(),
            tracker_uri: "".to_string(),
            component: "Postupdate".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTrackerUri)
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let yaml = r#"
catalog_uri: "/catalog"
tracker_uri: "/executions"
queue_uri: "/next-stage"
"#;
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }
}
