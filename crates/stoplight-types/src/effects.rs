//! Side-effect requests emitted by the zone engine and the failure record
//! returned when the host could not carry one out.
//!
//! The engine never writes to the encounter itself. Each operator returns
//! the writes it needs as [`SideEffect`] values and the host performs them
//! in order. A write that fails becomes a [`SideEffectFailure`], which the
//! view can show as a transient warning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::ParticipantId;
use crate::structs::{Round, ZoneSnapshot};

/// A write the host must perform against the encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SideEffect {
    /// Set the participant's resource counter to `value`.
    SetResource {
        /// Target participant.
        participant: ParticipantId,
        /// New value for `current`.
        value: u32,
    },
    /// Set or clear the participant's readiness flag.
    SetReadiness {
        /// Target participant.
        participant: ParticipantId,
        /// Round to tag the flag with, or `None` to clear it.
        round: Option<Round>,
    },
    /// Persist the zone arrangement on the encounter.
    SaveSnapshot {
        /// The arrangement to store.
        snapshot: ZoneSnapshot,
    },
}

impl SideEffect {
    /// The participant this write targets, if it targets one.
    pub const fn participant(&self) -> Option<&ParticipantId> {
        match self {
            Self::SetResource { participant, .. } | Self::SetReadiness { participant, .. } => {
                Some(participant)
            }
            Self::SaveSnapshot { .. } => None,
        }
    }
}

impl core::fmt::Display for SideEffect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SetResource { participant, value } => {
                write!(f, "set resource of {participant} to {value}")
            }
            Self::SetReadiness {
                participant,
                round: Some(round),
            } => write!(f, "flag {participant} ready for round {round}"),
            Self::SetReadiness {
                participant,
                round: None,
            } => write!(f, "clear readiness of {participant}"),
            Self::SaveSnapshot { .. } => f.write_str("save zone snapshot"),
        }
    }
}

/// A side effect the host attempted and could not complete.
///
/// The in-memory zone arrangement keeps the optimistic update; the tracker
/// re-derives zones from encounter state on the next change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SideEffectFailure {
    /// The write that failed.
    pub effect: SideEffect,
    /// Human-readable reason reported by the host.
    pub message: String,
    /// When the failure was observed.
    pub failed_at: DateTime<Utc>,
}
