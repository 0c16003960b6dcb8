//! Configuration loading and typed config structures for the tracker.
//!
//! The canonical configuration lives in `stoplight-config.yaml` at the
//! project root. Every field has a default, so an empty or missing file
//! yields a working tracker.

use std::path::Path;

use serde::Deserialize;
use stoplight_types::Disposition;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level tracker configuration.
///
/// Mirrors the structure of `stoplight-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackerConfig {
    /// Storage keys, eligibility, and presentation defaults.
    #[serde(default)]
    pub tracker: TrackerSettings,

    /// Automatic zone changes driven by encounter events.
    #[serde(default)]
    pub automation: AutomationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Which participants the tracker follows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityPolicy {
    /// Only participants whose token is friendly.
    #[default]
    Friendly,
    /// Every participant in the encounter.
    All,
}

impl EligibilityPolicy {
    /// Whether a participant with this disposition is tracked.
    pub const fn admits(self, disposition: Disposition) -> bool {
        match self {
            Self::Friendly => matches!(disposition, Disposition::Friendly),
            Self::All => true,
        }
    }
}

/// Storage keys, eligibility, and presentation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackerSettings {
    /// Namespace for every flag the tracker reads or writes.
    #[serde(default = "default_flag_scope")]
    pub flag_scope: String,

    /// Encounter flag holding the zone snapshot.
    #[serde(default = "default_snapshot_key")]
    pub snapshot_key: String,

    /// Participant flag holding the readiness tag.
    #[serde(default = "default_readiness_key")]
    pub readiness_key: String,

    /// Which participants are tracked.
    #[serde(default)]
    pub eligibility: EligibilityPolicy,

    /// Image used when the host provides none.
    #[serde(default = "default_image")]
    pub default_image: String,
}

impl TrackerSettings {
    /// Fully-qualified flag path (`<scope>.<key>`).
    pub fn flag_path(&self, key: &str) -> String {
        format!("{}.{key}", self.flag_scope)
    }

    /// Flag path of the zone snapshot.
    pub fn snapshot_path(&self) -> String {
        self.flag_path(&self.snapshot_key)
    }

    /// Flag path of the readiness tag.
    pub fn readiness_path(&self) -> String {
        self.flag_path(&self.readiness_key)
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            flag_scope: default_flag_scope(),
            snapshot_key: default_snapshot_key(),
            readiness_key: default_readiness_key(),
            eligibility: EligibilityPolicy::default(),
            default_image: default_image(),
        }
    }
}

/// Automatic zone changes driven by encounter events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct AutomationConfig {
    /// Move the departing participant to red when the turn advances.
    #[serde(default = "default_true")]
    pub red_on_turn_advance: bool,

    /// Return everyone to yellow when a new round starts.
    #[serde(default = "default_true")]
    pub reset_on_new_round: bool,

    /// Move a participant to red when its resource counter runs out.
    #[serde(default = "default_true")]
    pub red_on_exhaustion: bool,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            red_on_turn_advance: true,
            reset_on_new_round: true,
            red_on_exhaustion: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

fn default_flag_scope() -> String {
    "stoplight-initiative".to_owned()
}

fn default_snapshot_key() -> String {
    "zones".to_owned()
}

fn default_readiness_key() -> String {
    "wantsToGo".to_owned()
}

fn default_image() -> String {
    "icons/svg/mystery-man.svg".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = TrackerConfig::default();
        assert_eq!(config.tracker.snapshot_path(), "stoplight-initiative.zones");
        assert_eq!(config.tracker.readiness_path(), "stoplight-initiative.wantsToGo");
        assert_eq!(config.tracker.eligibility, EligibilityPolicy::Friendly);
        assert!(config.automation.red_on_turn_advance);
        assert!(config.automation.reset_on_new_round);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
tracker:
  flag_scope: "my-module"
  snapshot_key: "arrangement"
  readiness_key: "eager"
  eligibility: all
  default_image: "icons/blank.png"

automation:
  red_on_turn_advance: false
  reset_on_new_round: true
  red_on_exhaustion: false

logging:
  level: "debug"
"#;

        let config = TrackerConfig::parse(yaml);
        assert!(config.is_ok(), "parse failed: {config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.tracker.snapshot_path(), "my-module.arrangement");
        assert_eq!(config.tracker.readiness_path(), "my-module.eager");
        assert_eq!(config.tracker.eligibility, EligibilityPolicy::All);
        assert_eq!(config.tracker.default_image, "icons/blank.png");
        assert!(!config.automation.red_on_turn_advance);
        assert!(!config.automation.red_on_exhaustion);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = TrackerConfig::parse("automation:\n  reset_on_new_round: false\n");
        let config = config.ok().unwrap_or_default();

        assert!(!config.automation.reset_on_new_round);
        // Everything else uses defaults
        assert!(config.automation.red_on_turn_advance);
        assert_eq!(config.tracker.flag_scope, "stoplight-initiative");
    }

    #[test]
    fn parse_empty_yaml() {
        let config = TrackerConfig::parse("");
        assert!(config.is_ok());
    }

    #[test]
    fn parse_rejects_bad_policy() {
        let config = TrackerConfig::parse("tracker:\n  eligibility: hostile_only\n");
        assert!(matches!(config, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn eligibility_policy() {
        assert!(EligibilityPolicy::Friendly.admits(Disposition::Friendly));
        assert!(!EligibilityPolicy::Friendly.admits(Disposition::Neutral));
        assert!(!EligibilityPolicy::Friendly.admits(Disposition::Hostile));
        assert!(EligibilityPolicy::All.admits(Disposition::Secret));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("stoplight-config.yaml");
        if path.exists() {
            let config = TrackerConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
