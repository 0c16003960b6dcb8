//! Read access to per-participant encounter state.
//!
//! The engine never touches encounter objects directly. It asks a
//! [`ParticipantLookup`] three questions per participant: is it tracked at
//! all, how many resource units does it have, and has it asked to go.
//! [`LookupTable`] is a plain in-memory answer sheet for hosts that gather
//! this data up front, and for tests.

use std::collections::{BTreeMap, BTreeSet};

use stoplight_types::{Participant, ParticipantId, ReadinessFlag, ResourceCounter};

/// Per-participant reads the reconciler and operators depend on.
pub trait ParticipantLookup {
    /// Whether the participant should be tracked at all.
    fn is_eligible(&self, participant: &Participant) -> bool;

    /// The participant's resource counter, if it has one.
    fn resource_of(&self, participant: &ParticipantId) -> Option<ResourceCounter>;

    /// The participant's stored readiness flag, if set.
    fn readiness_of(&self, participant: &ParticipantId) -> Option<ReadinessFlag>;
}

impl<T: ParticipantLookup + ?Sized> ParticipantLookup for &T {
    fn is_eligible(&self, participant: &Participant) -> bool {
        (**self).is_eligible(participant)
    }

    fn resource_of(&self, participant: &ParticipantId) -> Option<ResourceCounter> {
        (**self).resource_of(participant)
    }

    fn readiness_of(&self, participant: &ParticipantId) -> Option<ReadinessFlag> {
        (**self).readiness_of(participant)
    }
}

/// Map-backed [`ParticipantLookup`].
///
/// Every participant is eligible unless excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    excluded: BTreeSet<ParticipantId>,
    resources: BTreeMap<ParticipantId, ResourceCounter>,
    readiness: BTreeMap<ParticipantId, ReadinessFlag>,
}

impl LookupTable {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            excluded: BTreeSet::new(),
            resources: BTreeMap::new(),
            readiness: BTreeMap::new(),
        }
    }

    /// Record a resource counter.
    #[must_use]
    pub fn with_resource(mut self, id: impl Into<ParticipantId>, current: u32, max: u32) -> Self {
        self.set_resource(id, ResourceCounter::new(current, max));
        self
    }

    /// Record a readiness flag.
    #[must_use]
    pub fn with_readiness(mut self, id: impl Into<ParticipantId>, flag: ReadinessFlag) -> Self {
        self.set_readiness(id, Some(flag));
        self
    }

    /// Mark a participant as not tracked.
    #[must_use]
    pub fn excluding(mut self, id: impl Into<ParticipantId>) -> Self {
        self.excluded.insert(id.into());
        self
    }

    /// Replace a resource counter.
    pub fn set_resource(&mut self, id: impl Into<ParticipantId>, counter: ResourceCounter) {
        self.resources.insert(id.into(), counter);
    }

    /// Replace or clear a readiness flag.
    pub fn set_readiness(&mut self, id: impl Into<ParticipantId>, flag: Option<ReadinessFlag>) {
        let id = id.into();
        match flag {
            Some(flag) => {
                self.readiness.insert(id, flag);
            }
            None => {
                self.readiness.remove(&id);
            }
        }
    }
}

impl ParticipantLookup for LookupTable {
    fn is_eligible(&self, participant: &Participant) -> bool {
        !self.excluded.contains(&participant.id)
    }

    fn resource_of(&self, participant: &ParticipantId) -> Option<ResourceCounter> {
        self.resources.get(participant).copied()
    }

    fn readiness_of(&self, participant: &ParticipantId) -> Option<ReadinessFlag> {
        self.readiness.get(participant).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_defaults_to_eligible_without_state() {
        let table = LookupTable::new();
        let p = Participant::new("a", "A");
        assert!(table.is_eligible(&p));
        assert_eq!(table.resource_of(&p.id), None);
        assert_eq!(table.readiness_of(&p.id), None);
    }

    #[test]
    fn table_records_and_clears() {
        let mut table = LookupTable::new()
            .with_resource("a", 0, 2)
            .with_readiness("a", ReadinessFlag::Round(4))
            .excluding("b");

        let a = ParticipantId::from("a");
        assert_eq!(table.resource_of(&a), Some(ResourceCounter::new(0, 2)));
        assert_eq!(table.readiness_of(&a), Some(ReadinessFlag::Round(4)));
        assert!(!table.is_eligible(&Participant::new("b", "B")));

        table.set_readiness("a", None);
        assert_eq!(table.readiness_of(&a), None);
    }
}
