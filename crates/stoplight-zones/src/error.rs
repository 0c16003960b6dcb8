//! Error types for the zone engine.
//!
//! The reconciler and the operators never fail. These variants describe
//! partition invariant violations, which indicate a bug in the engine or a
//! hand-built [`ZoneState`] that was never valid.
//!
//! [`ZoneState`]: crate::state::ZoneState

use stoplight_types::{ParticipantId, Zone};

/// A zone arrangement broke the partition invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ZoneError {
    /// The same participant appears in two places.
    #[error("participant {participant} appears in both {first} and {second}")]
    DuplicateParticipant {
        /// The repeated participant.
        participant: ParticipantId,
        /// Zone of the first occurrence.
        first: Zone,
        /// Zone of the repeated occurrence.
        second: Zone,
    },

    /// An expected participant is not in any zone.
    #[error("participant {0} is not in any zone")]
    MissingParticipant(ParticipantId),

    /// A zone holds a participant that is not expected.
    #[error("participant {participant} in {zone} is not part of the encounter")]
    UnexpectedParticipant {
        /// The stray participant.
        participant: ParticipantId,
        /// The zone holding it.
        zone: Zone,
    },
}
