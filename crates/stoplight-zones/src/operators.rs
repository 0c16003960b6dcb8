//! Move and transition operators.
//!
//! Each operator consumes a [`ZoneState`] and returns the next one. Writes
//! the encounter needs to stay consistent with the new placement come back
//! as [`SideEffect`] values on a [`Transition`]; the caller performs them.
//!
//! A participant that changes zone is always appended to the back of its
//! target zone. Everyone else keeps their relative order.

use stoplight_types::{ParticipantId, ResourceCounter, Round, SideEffect, Zone};
use tracing::debug;

use crate::lookup::ParticipantLookup;
use crate::state::ZoneState;

/// Why an operator left the arrangement untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    /// The id is not tracked. The participant list may have changed
    /// between the intent and its dispatch.
    UnknownParticipant,
    /// The participant is already in the requested zone.
    AlreadyInZone(Zone),
    /// The participant holds the current turn and cannot be exhausted.
    TurnHolder,
    /// The participant still has resource units left.
    NotExhausted,
}

/// Result of an operator: the next arrangement plus required writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The arrangement after the operator ran.
    pub state: ZoneState,
    /// Writes the caller must perform, in order.
    pub effects: Vec<SideEffect>,
    /// Set when the operator did nothing.
    pub skipped: Option<NoOpReason>,
}

impl Transition {
    const fn applied(state: ZoneState, effects: Vec<SideEffect>) -> Self {
        Self {
            state,
            effects,
            skipped: None,
        }
    }

    const fn unchanged(state: ZoneState, reason: NoOpReason) -> Self {
        Self {
            state,
            effects: Vec::new(),
            skipped: Some(reason),
        }
    }

    /// Whether the operator left the arrangement untouched.
    pub const fn is_noop(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Move a participant to `target` on request from the view.
///
/// The caller is assumed to have authorised the move already.
///
/// - **Red**: zero the resource counter if it has units left, then clear
///   the readiness flag.
/// - **Green**: tag the readiness flag with `current_round`, then refill an
///   empty counter to its maximum.
/// - **Yellow**: clear the readiness flag, then refill an empty counter.
///
/// Untracked ids and moves into the current zone are no-ops.
pub fn request_move<L>(
    mut state: ZoneState,
    participant: &ParticipantId,
    target: Zone,
    lookup: &L,
    current_round: Round,
) -> Transition
where
    L: ParticipantLookup + ?Sized,
{
    let Some(source) = state.member_of(participant) else {
        debug!(%participant, %target, "Move ignored: participant not tracked");
        return Transition::unchanged(state, NoOpReason::UnknownParticipant);
    };
    if source == target {
        debug!(%participant, %target, "Move ignored: already in zone");
        return Transition::unchanged(state, NoOpReason::AlreadyInZone(target));
    }

    let effects = move_effects(
        participant,
        target,
        lookup.resource_of(participant),
        current_round,
    );
    state.relocate(participant, target);

    debug!(%participant, from = %source, to = %target, effects = effects.len(), "Participant moved");
    Transition::applied(state, effects)
}

/// Writes that keep the encounter consistent with a move into `target`.
fn move_effects(
    participant: &ParticipantId,
    target: Zone,
    counter: Option<ResourceCounter>,
    current_round: Round,
) -> Vec<SideEffect> {
    let mut effects = Vec::with_capacity(2);
    match target {
        Zone::Red => {
            if counter.is_some_and(|c| !c.is_exhausted()) {
                effects.push(SideEffect::SetResource {
                    participant: participant.clone(),
                    value: 0,
                });
            }
            effects.push(SideEffect::SetReadiness {
                participant: participant.clone(),
                round: None,
            });
        }
        Zone::Green | Zone::Yellow => {
            effects.push(SideEffect::SetReadiness {
                participant: participant.clone(),
                round: (target == Zone::Green).then_some(current_round),
            });
            // Acting requires at least one unit.
            if let Some(empty) = counter.filter(|c| c.is_exhausted()) {
                effects.push(SideEffect::SetResource {
                    participant: participant.clone(),
                    value: empty.max,
                });
            }
        }
    }
    effects
}

/// Start a new round: everyone returns to yellow.
///
/// The new yellow zone is the old green zone followed by the old yellow
/// and red zones, each keeping its internal order. The caller should
/// persist the resulting snapshot.
pub fn advance_round(state: ZoneState) -> ZoneState {
    let ZoneState {
        green,
        mut yellow,
        red,
    } = state;

    let mut merged = green;
    merged.reserve(yellow.len().saturating_add(red.len()));
    merged.append(&mut yellow);
    merged.extend(red);

    debug!(participants = merged.len(), "Round advanced, zones reset");
    ZoneState {
        green: Vec::new(),
        yellow: merged,
        red: Vec::new(),
    }
}

/// The turn moved on: the departing participant goes to the back of red.
///
/// No resource write is requested; hosts that spend activations on turn
/// change do so on their own. Untracked or already-red ids are no-ops.
pub fn advance_turn(mut state: ZoneState, departing: &ParticipantId) -> Transition {
    match state.member_of(departing) {
        None => {
            debug!(participant = %departing, "Turn advance ignored: participant not tracked");
            Transition::unchanged(state, NoOpReason::UnknownParticipant)
        }
        Some(Zone::Red) => Transition::unchanged(state, NoOpReason::AlreadyInZone(Zone::Red)),
        Some(source) => {
            state.relocate(departing, Zone::Red);
            debug!(participant = %departing, from = %source, "Departing participant moved to red");
            Transition::applied(state, Vec::new())
        }
    }
}

/// React to an external resource change for one participant.
///
/// A tracked participant outside red whose counter has reached zero moves
/// to the back of red, unless it holds the current turn. The units are
/// already spent on the encounter, so no write is requested.
pub fn exhaust<L>(
    mut state: ZoneState,
    participant: &ParticipantId,
    lookup: &L,
    current_turn: Option<&ParticipantId>,
) -> Transition
where
    L: ParticipantLookup + ?Sized,
{
    match state.member_of(participant) {
        None => Transition::unchanged(state, NoOpReason::UnknownParticipant),
        Some(Zone::Red) => Transition::unchanged(state, NoOpReason::AlreadyInZone(Zone::Red)),
        Some(_) if current_turn == Some(participant) => {
            Transition::unchanged(state, NoOpReason::TurnHolder)
        }
        Some(source) => {
            let spent = lookup
                .resource_of(participant)
                .is_some_and(|c| c.is_exhausted());
            if !spent {
                return Transition::unchanged(state, NoOpReason::NotExhausted);
            }
            state.relocate(participant, Zone::Red);
            debug!(%participant, from = %source, "Exhausted participant moved to red");
            Transition::applied(state, Vec::new())
        }
    }
}
