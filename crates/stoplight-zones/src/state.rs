//! The three-way partition of tracked participants.
//!
//! A [`ZoneState`] holds the green, yellow and red sequences. Every
//! operator in this crate keeps two invariants:
//!
//! - **Partition**: a participant id appears in at most one zone, at most
//!   once.
//! - **Coverage**: after a reconciliation, the ids across all zones are
//!   exactly the eligible ids reported by the encounter.
//!
//! [`ZoneState::verify_partition`] and [`ZoneState::verify_covers`] check
//! these and are meant for tests.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use stoplight_types::{Participant, ParticipantId, Zone, ZoneSnapshot};
use ts_rs::TS;

use crate::error::ZoneError;

/// Current zone arrangement, front to back within each zone.
///
/// Owned by a single tracker. The view only ever sees a shared reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ZoneState {
    pub(crate) green: Vec<Participant>,
    pub(crate) yellow: Vec<Participant>,
    pub(crate) red: Vec<Participant>,
}

impl ZoneState {
    /// Create an empty arrangement.
    pub const fn new() -> Self {
        Self {
            green: Vec::new(),
            yellow: Vec::new(),
            red: Vec::new(),
        }
    }

    /// Build an arrangement from explicit zone contents.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::DuplicateParticipant`] if any id repeats.
    pub fn from_parts(
        green: Vec<Participant>,
        yellow: Vec<Participant>,
        red: Vec<Participant>,
    ) -> Result<Self, ZoneError> {
        let state = Self { green, yellow, red };
        state.verify_partition()?;
        Ok(state)
    }

    /// Participants in one zone.
    pub fn zone(&self, zone: Zone) -> &[Participant] {
        match zone {
            Zone::Green => &self.green,
            Zone::Yellow => &self.yellow,
            Zone::Red => &self.red,
        }
    }

    pub(crate) const fn zone_mut(&mut self, zone: Zone) -> &mut Vec<Participant> {
        match zone {
            Zone::Green => &mut self.green,
            Zone::Yellow => &mut self.yellow,
            Zone::Red => &mut self.red,
        }
    }

    /// Participants who want to act next.
    pub fn green(&self) -> &[Participant] {
        &self.green
    }

    /// Participants in the neutral zone.
    pub fn yellow(&self) -> &[Participant] {
        &self.yellow
    }

    /// Participants who have acted or are out of resources.
    pub fn red(&self) -> &[Participant] {
        &self.red
    }

    /// The zone currently holding `id`, if any.
    pub fn member_of(&self, id: &ParticipantId) -> Option<Zone> {
        Zone::ALL
            .into_iter()
            .find(|zone| self.zone(*zone).iter().any(|p| p.id == *id))
    }

    /// Whether `id` is tracked in any zone.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.member_of(id).is_some()
    }

    /// All tracked ids.
    pub fn all_ids(&self) -> BTreeSet<ParticipantId> {
        self.iter().map(|(_, p)| p.id.clone()).collect()
    }

    /// Iterate every tracked participant with its zone, green first.
    pub fn iter(&self) -> impl Iterator<Item = (Zone, &Participant)> {
        Zone::ALL
            .into_iter()
            .flat_map(move |zone| self.zone(zone).iter().map(move |p| (zone, p)))
    }

    /// Number of tracked participants.
    pub fn len(&self) -> usize {
        self.green
            .len()
            .saturating_add(self.yellow.len())
            .saturating_add(self.red.len())
    }

    /// Whether no participant is tracked.
    pub fn is_empty(&self) -> bool {
        self.green.is_empty() && self.yellow.is_empty() && self.red.is_empty()
    }

    /// Id-only copy suitable for persisting on the encounter.
    pub fn snapshot(&self) -> ZoneSnapshot {
        let ids = |zone: &[Participant]| zone.iter().map(|p| p.id.clone()).collect();
        ZoneSnapshot {
            green: ids(&self.green),
            yellow: ids(&self.yellow),
            red: ids(&self.red),
        }
    }

    /// Remove `id` from its zone and append it to the back of `target`.
    ///
    /// Returns the zone it came from, or `None` if it is not tracked.
    pub(crate) fn relocate(&mut self, id: &ParticipantId, target: Zone) -> Option<Zone> {
        let source = self.member_of(id)?;
        let from = self.zone_mut(source);
        let index = from.iter().position(|p| p.id == *id)?;
        let participant = from.remove(index);
        self.zone_mut(target).push(participant);
        Some(source)
    }

    /// Check that no id appears more than once.
    ///
    /// # Errors
    ///
    /// Returns [`ZoneError::DuplicateParticipant`] for the first repeat found.
    pub fn verify_partition(&self) -> Result<(), ZoneError> {
        let mut seen: BTreeMap<&ParticipantId, Zone> = BTreeMap::new();
        for (zone, participant) in self.iter() {
            if let Some(first) = seen.insert(&participant.id, zone) {
                return Err(ZoneError::DuplicateParticipant {
                    participant: participant.id.clone(),
                    first,
                    second: zone,
                });
            }
        }
        Ok(())
    }

    /// Check the partition and that the tracked ids are exactly `expected`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ZoneError`] found.
    pub fn verify_covers(&self, expected: &BTreeSet<ParticipantId>) -> Result<(), ZoneError> {
        self.verify_partition()?;
        if let Some((zone, stray)) = self.iter().find(|(_, p)| !expected.contains(&p.id)) {
            return Err(ZoneError::UnexpectedParticipant {
                participant: stray.id.clone(),
                zone,
            });
        }
        if let Some(missing) = expected.iter().find(|id| !self.contains(id)) {
            return Err(ZoneError::MissingParticipant(missing.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(id: &str) -> Participant {
        Participant::new(id, id.to_uppercase())
    }

    fn ids(zone: &[Participant]) -> Vec<&str> {
        zone.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn member_of_finds_each_zone() {
        let state = ZoneState::from_parts(vec![p("a")], vec![p("b")], vec![p("c")]).unwrap();
        assert_eq!(state.member_of(&"a".into()), Some(Zone::Green));
        assert_eq!(state.member_of(&"b".into()), Some(Zone::Yellow));
        assert_eq!(state.member_of(&"c".into()), Some(Zone::Red));
        assert_eq!(state.member_of(&"z".into()), None);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn from_parts_rejects_duplicates() {
        let err = ZoneState::from_parts(vec![p("a")], Vec::new(), vec![p("a")]).unwrap_err();
        assert_eq!(
            err,
            ZoneError::DuplicateParticipant {
                participant: "a".into(),
                first: Zone::Green,
                second: Zone::Red,
            }
        );
    }

    #[test]
    fn snapshot_keeps_order() {
        let state =
            ZoneState::from_parts(vec![p("b"), p("a")], vec![p("c")], Vec::new()).unwrap();
        let snapshot = state.snapshot();
        assert_eq!(
            snapshot.green,
            vec![ParticipantId::from("b"), ParticipantId::from("a")]
        );
        assert_eq!(snapshot.yellow, vec![ParticipantId::from("c")]);
        assert!(snapshot.red.is_empty());
    }

    #[test]
    fn relocate_appends_to_back() {
        let mut state =
            ZoneState::from_parts(vec![p("a")], vec![p("b"), p("c")], vec![p("d")]).unwrap();
        assert_eq!(state.relocate(&"b".into(), Zone::Red), Some(Zone::Yellow));
        assert_eq!(ids(state.yellow()), vec!["c"]);
        assert_eq!(ids(state.red()), vec!["d", "b"]);
        assert_eq!(state.relocate(&"zz".into(), Zone::Red), None);
    }

    #[test]
    fn verify_covers_reports_missing_and_stray() {
        let state = ZoneState::from_parts(vec![p("a")], Vec::new(), Vec::new()).unwrap();

        let expected: BTreeSet<ParticipantId> = ["a", "b"].into_iter().map(Into::into).collect();
        assert_eq!(
            state.verify_covers(&expected),
            Err(ZoneError::MissingParticipant("b".into()))
        );

        let expected = BTreeSet::new();
        assert_eq!(
            state.verify_covers(&expected),
            Err(ZoneError::UnexpectedParticipant {
                participant: "a".into(),
                zone: Zone::Green,
            })
        );
    }

    #[test]
    fn serializes_for_the_view() {
        let state = ZoneState::from_parts(Vec::new(), vec![p("a")], Vec::new()).unwrap();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["yellow"][0]["id"], "a");
        assert_eq!(json["green"].as_array().map(Vec::len), Some(0));
    }
}
