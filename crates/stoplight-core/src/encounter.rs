//! The capability interface the tracker needs from an encounter host.
//!
//! [`Encounter`] extends the engine's [`ParticipantLookup`] with the
//! encounter-wide reads (participant list, round, turn holder, stored
//! snapshot) and the asynchronous writes that carry out side effects.
//! Hosts implement it over whatever encounter objects they have; the
//! tracker never sees those objects directly.

use async_trait::async_trait;
use stoplight_types::{Participant, ParticipantId, Round, ZoneSnapshot};
use stoplight_zones::ParticipantLookup;

/// Errors an encounter host can report for a write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncounterError {
    /// The participant is no longer part of the encounter.
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// The participant has no resource counter to write.
    #[error("participant {0} has no resource counter")]
    NoResourceCounter(ParticipantId),

    /// A flag value could not be encoded for storage.
    #[error("failed to encode flag {path}: {message}")]
    Encode {
        /// Fully-qualified flag path.
        path: String,
        /// Description of the encoding failure.
        message: String,
    },

    /// The host refused or failed the write.
    #[error("write rejected: {reason}")]
    Rejected {
        /// Host-provided reason.
        reason: String,
    },
}

/// An encounter the tracker can read from and write to.
///
/// Reads are synchronous and reflect the host's current state. Writes may
/// hit storage or the network and can fail independently of each other.
#[async_trait]
pub trait Encounter: ParticipantLookup + Send + Sync {
    /// Participants in the host's stable iteration order.
    fn participants(&self) -> Vec<Participant>;

    /// The participant whose turn it is, if any.
    fn current_turn_holder(&self) -> Option<ParticipantId>;

    /// The current round number.
    fn current_round(&self) -> Round;

    /// The stored zone snapshot, if one exists and can be read.
    fn load_snapshot(&self) -> Option<ZoneSnapshot>;

    /// Set a participant's resource counter.
    async fn set_resource(
        &self,
        participant: &ParticipantId,
        value: u32,
    ) -> Result<(), EncounterError>;

    /// Tag a participant's readiness flag with `round`, or clear it.
    async fn set_readiness(
        &self,
        participant: &ParticipantId,
        round: Option<Round>,
    ) -> Result<(), EncounterError>;

    /// Store the zone snapshot on the encounter.
    async fn save_snapshot(&self, snapshot: &ZoneSnapshot) -> Result<(), EncounterError>;
}
