//! Engine configuration model and defaults.
//!
//! The consuming shell owns the config file's location and persistence; only
//! the model and TOML parsing live here.

/// Root engine configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EngineConfig {
    /// Batch synchronization behavior.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Remote catalog lookup behavior.
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Batch synchronization preferences.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub rename_policy: RenamePolicy,
}

/// Remote catalog lookup preferences.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct LookupConfig {
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// How renaming treats records missing artist or title.
#[derive(Debug, Clone, Copy, serde::Deserialize, serde::Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenamePolicy {
    /// Exclude the record from renaming and count it as skipped.
    #[default]
    Strict,
    /// Substitute "Unknown"/"Untitled" for the missing parts.
    Lenient,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Parses a TOML document. Missing sections and fields take defaults.
    pub fn from_toml_str(document: &str) -> Result<EngineConfig, String> {
        toml::from_str(document).map_err(|error| format!("Failed to parse engine config: {error}"))
    }
}

fn default_search_limit() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config.sync.rename_policy, RenamePolicy::Strict);
        assert_eq!(config.lookup.search_limit, 10);
        assert_eq!(config.lookup.request_timeout_secs, 8);
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            "[sync]\nrename_policy = \"lenient\"\n\n[lookup]\nsearch_limit = 3\n",
        )
        .expect("config should parse");
        assert_eq!(config.sync.rename_policy, RenamePolicy::Lenient);
        assert_eq!(config.lookup.search_limit, 3);
        assert_eq!(config.lookup.request_timeout_secs, 8);
    }

    #[test]
    fn test_malformed_document_is_an_error() {
        let parsed = EngineConfig::from_toml_str("[sync\nrename_policy = yes");
        assert!(parsed.is_err());
    }
}
