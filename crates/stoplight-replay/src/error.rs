//! Error types for scenario replay.

use stoplight_core::ConfigError;
use stoplight_types::ParticipantId;

/// Errors that stop a replay.
///
/// Failed encounter writes are not errors: they are reported on the step
/// and the replay carries on.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The scenario file could not be read.
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// The scenario is not valid YAML or does not match the format.
    #[error("invalid scenario: {0}")]
    Scenario(#[from] serde_yml::Error),

    /// The tracker configuration could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A step names a participant the encounter does not have.
    #[error("step {step}: unknown participant {participant}")]
    UnknownParticipant {
        /// One-based step number.
        step: usize,
        /// The id the step referred to.
        participant: ParticipantId,
    },

    /// A value could not be encoded as JSON.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
