//! Deriving a [`ZoneState`] from encounter truth.
//!
//! Two entry points cover the two moments a tracker needs a fresh
//! arrangement:
//!
//! - [`classify`] builds zones from scratch out of resource counters,
//!   readiness flags and the current turn holder. Used when no snapshot
//!   exists or when the arrangement has to be rebuilt.
//! - [`merge`] restores a persisted [`ZoneSnapshot`] against the live
//!   participant list, keeping manual placements and relative order.
//!   Joiners land at the back of yellow; leavers are dropped.
//!
//! Both filter through [`ParticipantLookup::is_eligible`] and keep only the
//! first occurrence of a repeated id, so the result always partitions the
//! eligible participants.

use std::collections::{BTreeMap, BTreeSet};

use stoplight_types::{Participant, ParticipantId, Round, Zone, ZoneSnapshot};
use tracing::debug;

use crate::lookup::ParticipantLookup;
use crate::state::ZoneState;

/// Eligible participants in encounter order, first occurrence of each id.
pub fn eligible<'a, L>(participants: &'a [Participant], lookup: &L) -> Vec<&'a Participant>
where
    L: ParticipantLookup + ?Sized,
{
    let mut seen: BTreeSet<&ParticipantId> = BTreeSet::new();
    participants
        .iter()
        .filter(|p| lookup.is_eligible(p))
        .filter(|p| seen.insert(&p.id))
        .collect()
}

/// Zone a single participant belongs in, ignoring any prior placement.
///
/// Precedence, first match wins:
///
/// 1. **Red** when the resource counter reads zero and the participant is
///    not the current turn holder. A turn holder mid-turn is never red.
/// 2. **Green** when the readiness flag is tagged with `current_round`.
/// 3. **Yellow** otherwise.
pub fn zone_for<L>(
    participant: &ParticipantId,
    lookup: &L,
    current_turn: Option<&ParticipantId>,
    current_round: Round,
) -> Zone
where
    L: ParticipantLookup + ?Sized,
{
    let exhausted = lookup
        .resource_of(participant)
        .is_some_and(|counter| counter.is_exhausted());
    if exhausted && current_turn != Some(participant) {
        return Zone::Red;
    }

    let ready = lookup
        .readiness_of(participant)
        .is_some_and(|flag| flag.wants_to_go(current_round));
    if ready {
        return Zone::Green;
    }

    Zone::Yellow
}

/// Build an arrangement from scratch.
///
/// Participants keep encounter order within each zone.
pub fn classify<L>(
    participants: &[Participant],
    lookup: &L,
    current_turn: Option<&ParticipantId>,
    current_round: Round,
) -> ZoneState
where
    L: ParticipantLookup + ?Sized,
{
    let mut state = ZoneState::new();
    for participant in eligible(participants, lookup) {
        let zone = zone_for(&participant.id, lookup, current_turn, current_round);
        state.zone_mut(zone).push(participant.clone());
    }

    debug!(
        round = current_round,
        green = state.green.len(),
        yellow = state.yellow.len(),
        red = state.red.len(),
        "Classified participants"
    );
    state
}

/// Restore a persisted arrangement against the live participant list.
///
/// Zones are visited green, yellow, red. Each snapshot id that is still an
/// eligible participant is placed with its current display data, in
/// snapshot order. Remaining participants are appended to yellow in
/// encounter order. Snapshot ids no longer present are dropped.
pub fn merge<L>(snapshot: &ZoneSnapshot, participants: &[Participant], lookup: &L) -> ZoneState
where
    L: ParticipantLookup + ?Sized,
{
    let current = eligible(participants, lookup);
    let by_id: BTreeMap<&ParticipantId, &Participant> =
        current.iter().map(|p| (&p.id, *p)).collect();

    let mut state = ZoneState::new();
    let mut consumed: BTreeSet<&ParticipantId> = BTreeSet::new();
    let mut dropped: usize = 0;

    for zone in Zone::ALL {
        for id in snapshot.ids(zone) {
            let Some(participant) = by_id.get(id) else {
                dropped = dropped.saturating_add(1);
                continue;
            };
            // A corrupt snapshot may list an id twice; the first placement wins.
            if consumed.insert(&participant.id) {
                state.zone_mut(zone).push((*participant).clone());
            }
        }
    }

    let mut joined: usize = 0;
    for participant in current {
        if !consumed.contains(&participant.id) {
            state.yellow.push(participant.clone());
            joined = joined.saturating_add(1);
        }
    }

    debug!(
        kept = consumed.len(),
        joined, dropped, "Merged zone snapshot with participants"
    );
    state
}
