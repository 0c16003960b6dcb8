//! Core entity structs: participants, resource counters, readiness flags
//! and the persisted zone snapshot.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Zone;
use crate::ids::{ActorRef, ParticipantId, TokenRef};

/// Encounter round number as reported by the host (1-based).
pub type Round = u32;

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// One combat entity tracked by the widget.
///
/// Only `id` carries meaning for the tracker. The remaining fields are
/// presentation data or foreign keys that are re-read from the encounter on
/// every reconciliation and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Participant {
    /// Stable identifier for the lifetime of the encounter.
    pub id: ParticipantId,
    /// Name shown in the tracker.
    pub display_name: String,
    /// Portrait or token image path.
    pub image_ref: String,
    /// Actor document behind this participant, if any.
    pub actor_ref: Option<ActorRef>,
    /// Token on the scene, if any.
    pub token_ref: Option<TokenRef>,
}

impl Participant {
    /// Create a participant with no image and no foreign references.
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            image_ref: String::new(),
            actor_ref: None,
            token_ref: None,
        }
    }

    /// Set the image path.
    #[must_use]
    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = image_ref.into();
        self
    }

    /// Set the actor and token references.
    #[must_use]
    pub fn with_refs(mut self, actor_ref: Option<ActorRef>, token_ref: Option<TokenRef>) -> Self {
        self.actor_ref = actor_ref;
        self.token_ref = token_ref;
        self
    }
}

// ---------------------------------------------------------------------------
// Resource counter
// ---------------------------------------------------------------------------

/// Per-round action budget ("activations") owned by the encounter host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ResourceCounter {
    /// Units left this round.
    pub current: u32,
    /// Units granted at the start of a round. Always at least 1.
    pub max: u32,
}

impl ResourceCounter {
    /// Create a counter. A `max` of zero is raised to one.
    pub const fn new(current: u32, max: u32) -> Self {
        let max = if max == 0 { 1 } else { max };
        Self { current, max }
    }

    /// Whether no units are left.
    pub const fn is_exhausted(self) -> bool {
        self.current == 0
    }
}

// ---------------------------------------------------------------------------
// Readiness flag
// ---------------------------------------------------------------------------

/// The stored "wants to go" flag for a participant.
///
/// Current writers always store the round the flag was raised in. Older
/// revisions stored a bare boolean that was never cleared between rounds;
/// those values still deserialize but never count as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export, export_to = "bindings/")]
pub enum ReadinessFlag {
    /// Raised for the given round.
    Round(Round),
    /// Untagged flag from an older revision.
    Legacy(bool),
}

impl ReadinessFlag {
    /// Whether this flag marks the participant as wanting to act in `round`.
    pub const fn wants_to_go(self, round: Round) -> bool {
        match self {
            Self::Round(tagged) => tagged == round,
            Self::Legacy(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Persisted, id-only copy of a zone arrangement.
///
/// Stored on the encounter so a rebuilt tracker can restore manual
/// placements. Display data is never stored; it is re-read from the live
/// participant list when the snapshot is merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ZoneSnapshot {
    /// Ids in the green zone, front to back.
    #[serde(default)]
    pub green: Vec<ParticipantId>,
    /// Ids in the yellow zone, front to back.
    #[serde(default)]
    pub yellow: Vec<ParticipantId>,
    /// Ids in the red zone, front to back.
    #[serde(default)]
    pub red: Vec<ParticipantId>,
}

impl ZoneSnapshot {
    /// Ids recorded for one zone.
    pub fn ids(&self, zone: Zone) -> &[ParticipantId] {
        match zone {
            Zone::Green => &self.green,
            Zone::Yellow => &self.yellow,
            Zone::Red => &self.red,
        }
    }

    /// Whether no ids are recorded in any zone.
    pub fn is_empty(&self) -> bool {
        self.green.is_empty() && self.yellow.is_empty() && self.red.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_max_is_raised_to_one() {
        let counter = ResourceCounter::new(0, 0);
        assert_eq!(counter.max, 1);
        assert!(counter.is_exhausted());
    }

    #[test]
    fn readiness_requires_matching_round() {
        assert!(ReadinessFlag::Round(3).wants_to_go(3));
        assert!(!ReadinessFlag::Round(3).wants_to_go(4));
        assert!(!ReadinessFlag::Legacy(true).wants_to_go(1));
    }

    #[test]
    fn readiness_reads_both_stored_forms() {
        let tagged: Result<ReadinessFlag, _> = serde_json::from_str("5");
        assert_eq!(tagged.ok(), Some(ReadinessFlag::Round(5)));

        let legacy: Result<ReadinessFlag, _> = serde_json::from_str("true");
        assert_eq!(legacy.ok(), Some(ReadinessFlag::Legacy(true)));
    }

    #[test]
    fn snapshot_layout_has_three_keys() {
        let snapshot = ZoneSnapshot {
            green: vec![ParticipantId::from("b"), ParticipantId::from("a")],
            yellow: vec![ParticipantId::from("c")],
            red: Vec::new(),
        };
        let json = serde_json::to_value(&snapshot).ok();
        assert_eq!(
            json,
            Some(serde_json::json!({ "green": ["b", "a"], "yellow": ["c"], "red": [] }))
        );
    }

    #[test]
    fn snapshot_tolerates_missing_keys() {
        let parsed: Result<ZoneSnapshot, _> = serde_json::from_str(r#"{ "red": ["x"] }"#);
        let parsed = parsed.ok().unwrap_or_default();
        assert!(parsed.green.is_empty());
        assert_eq!(parsed.ids(Zone::Red), &[ParticipantId::from("x")]);
        assert!(!parsed.is_empty());
    }

    #[test]
    fn participant_builder() {
        let p = Participant::new("p1", "Aria")
            .with_image("tokens/aria.webp")
            .with_refs(Some(ActorRef::from("act")), None);
        assert_eq!(p.id, ParticipantId::from("p1"));
        assert_eq!(p.image_ref, "tokens/aria.webp");
        assert_eq!(p.actor_ref, Some(ActorRef::from("act")));
        assert!(p.token_ref.is_none());
    }
}
