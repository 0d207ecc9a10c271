//! Routing configuration loaded from JSON
//!
//! ```json
//! {
//!   "contraction": { "witness": { "max_settles": 500 }, "progress_interval": 0 },
//!   "profiles": { "factors": { "1": { "direction": "both", "value": 0.036 } } }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::contracted::ContractionConfig;
use crate::error::Result;
use crate::profile::FactorTable;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub contraction: ContractionConfig,
    pub profiles: FactorTable,
}

impl RoutingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            profiles = config.profiles.len(),
            "Loaded routing config"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::RoutingError;
    use crate::profile::{FactorDirection, Profile};

    #[test]
    fn empty_object_gives_defaults() {
        let config = RoutingConfig::from_json_str("{}").unwrap();
        assert_eq!(config, RoutingConfig::default());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RoutingConfig::from_json_str(
            r#"{
                "contraction": {
                    "witness": { "max_settles": 50 },
                    "priority": { "difference": 1, "contracted": 1, "depth": 2 }
                },
                "profiles": {
                    "factors": { "3": { "direction": "forward", "value": 0.1 } }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.contraction.witness.max_settles, 50);
        assert_eq!(config.contraction.witness.hop_limit, 16);
        assert_eq!(config.contraction.progress_interval, 10_000);
        assert_eq!(config.contraction.priority.depth, 2);

        let factor = config.profiles.factor(3);
        assert_eq!(factor.direction, FactorDirection::Forward);
        assert!(!config.profiles.factor(4).is_passable());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"contraction": {{"progress_interval": 7}}}}"#).unwrap();
        let config = RoutingConfig::load(file.path()).unwrap();
        assert_eq!(config.contraction.progress_interval, 7);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        assert!(matches!(
            RoutingConfig::from_json_str("{ nope"),
            Err(RoutingError::Config(_))
        ));
        assert!(matches!(
            RoutingConfig::load("/definitely/not/here.json"),
            Err(RoutingError::Config(_))
        ));
    }
}
