use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::index::DerivationRule;

/// Rejected draws allowed per generation call before giving up.
pub const DEFAULT_RETRY_BUDGET: usize = 20_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub retry_budget: usize,
    pub derivation_rule: DerivationRule,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            retry_budget: DEFAULT_RETRY_BUDGET,
            derivation_rule: DerivationRule::Corrected,
        }
    }
}

impl SamplerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {:?}", path))?;
        let config: SamplerConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SamplerConfig::default();
        assert_eq!(config.retry_budget, 20_000);
        assert_eq!(config.derivation_rule, DerivationRule::Corrected);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"derivation_rule": "legacy"}}"#).unwrap();

        let config = SamplerConfig::load(file.path()).unwrap();
        assert_eq!(config.derivation_rule, DerivationRule::Legacy);
        assert_eq!(config.retry_budget, DEFAULT_RETRY_BUDGET);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SamplerConfig::load(&dir.path().join("absent.json")).is_err());
    }
}
