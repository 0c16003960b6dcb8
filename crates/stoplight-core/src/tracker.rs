//! The tracker controller: encounter events in, side effects out.
//!
//! A [`Tracker`] owns the zone arrangement for one encounter. The host
//! feeds it [`TrackerEvent`]s as things happen and performs the returned
//! [`SideEffect`]s, either itself (after [`Tracker::handle`]) or through
//! [`Tracker::dispatch`], which awaits every write before returning.
//!
//! The arrangement is updated optimistically. When any write fails the
//! tracker keeps the new arrangement but marks itself for resync, and the
//! next external change event rebuilds the zones from encounter state
//! instead of patching them.

use serde::{Deserialize, Serialize};
use stoplight_types::{ParticipantId, SideEffect, SideEffectFailure, Zone};
use stoplight_zones::{
    NoOpReason, Transition, ZoneState, advance_round, advance_turn, classify, exhaust, merge,
    request_move,
};
use tracing::{debug, info, warn};

use crate::config::{AutomationConfig, TrackerConfig};
use crate::effects;
use crate::encounter::Encounter;

/// Something that happened to the encounter, or a request from the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrackerEvent {
    /// The tracker is attached to an encounter.
    Started,
    /// Participants were added, removed, or changed eligibility.
    ParticipantsChanged,
    /// A participant's resource counter changed on the encounter.
    ResourceChanged {
        /// Whose counter changed.
        participant: ParticipantId,
    },
    /// Rebuild every zone from current encounter state.
    Resync,
    /// A new round started.
    RoundAdvanced,
    /// The turn moved on from `departing`.
    TurnAdvanced {
        /// Who just finished their turn.
        departing: ParticipantId,
    },
    /// The view asked to move a participant.
    MoveRequested {
        /// Who to move.
        participant: ParticipantId,
        /// Where to.
        zone: Zone,
    },
    /// The encounter is over.
    EncounterEnded,
}

impl TrackerEvent {
    /// Whether the event reports a change made outside the tracker.
    pub const fn is_external_change(&self) -> bool {
        matches!(self, Self::ParticipantsChanged | Self::ResourceChanged { .. })
    }

    /// Whether the event patches an arrangement that must already be loaded.
    const fn needs_arrangement(&self) -> bool {
        !matches!(self, Self::Started | Self::Resync | Self::EncounterEnded)
    }
}

/// Why an event left the arrangement untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skipped {
    /// The zone operator declined.
    Engine(NoOpReason),
    /// The automation for this event is switched off in config.
    AutomationDisabled,
}

/// What handling an event produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Writes to perform, in order.
    pub effects: Vec<SideEffect>,
    /// Set when the event changed nothing.
    pub skipped: Option<Skipped>,
}

impl Outcome {
    const fn skipped(reason: Skipped) -> Self {
        Self {
            effects: Vec::new(),
            skipped: Some(reason),
        }
    }

    /// Whether the event left the arrangement untouched.
    pub const fn is_noop(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Result of [`Tracker::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// What the event produced.
    pub outcome: Outcome,
    /// Writes that failed. Empty when everything was written.
    pub failures: Vec<SideEffectFailure>,
}

impl DispatchReport {
    /// Whether every write succeeded.
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn failed writes into an error.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::SideEffectsFailed`] if any write failed.
    pub fn into_result(self) -> Result<Outcome, TrackerError> {
        if self.failures.is_empty() {
            Ok(self.outcome)
        } else {
            Err(TrackerError::SideEffectsFailed {
                attempted: self.outcome.effects.len(),
                failures: self.failures,
            })
        }
    }
}

/// Errors surfaced by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// One or more side effects could not be written.
    #[error("{} of {attempted} side effects failed", .failures.len())]
    SideEffectsFailed {
        /// Number of writes attempted.
        attempted: usize,
        /// The writes that failed.
        failures: Vec<SideEffectFailure>,
    },
}

/// Zone arrangement for one encounter plus the rules that drive it.
#[derive(Debug, Clone)]
pub struct Tracker {
    state: ZoneState,
    automation: AutomationConfig,
    needs_resync: bool,
    started: bool,
}

impl Tracker {
    /// Create a tracker with an empty arrangement.
    ///
    /// Send [`TrackerEvent::Started`] to populate it.
    pub const fn new(automation: AutomationConfig) -> Self {
        Self {
            state: ZoneState::new(),
            automation,
            needs_resync: false,
            started: false,
        }
    }

    /// Create a tracker from loaded configuration.
    pub const fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.automation)
    }

    /// The current arrangement.
    pub const fn current_state(&self) -> &ZoneState {
        &self.state
    }

    /// Whether the arrangement has been loaded from the encounter.
    pub const fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the next external change rebuilds every zone.
    pub const fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    /// Rebuild every zone on the next external change.
    pub const fn mark_for_resync(&mut self) {
        self.needs_resync = true;
    }

    /// Apply an event to the arrangement and return the writes it needs.
    ///
    /// The caller must perform the returned effects in order before
    /// handling the next event.
    ///
    /// An event that arrives before [`TrackerEvent::Started`] first loads
    /// the stored arrangement, so a rebuilt tracker never writes over it.
    pub fn handle<E>(&mut self, event: &TrackerEvent, encounter: &E) -> Outcome
    where
        E: Encounter + ?Sized,
    {
        if !self.started && event.needs_arrangement() {
            debug!(?event, "Tracker not started, loading stored arrangement first");
            let loaded = self.start(encounter);
            if matches!(event, TrackerEvent::ParticipantsChanged) {
                return loaded;
            }
            let outcome = self.handle(event, encounter);
            return if outcome.effects.is_empty() {
                Outcome {
                    effects: loaded.effects,
                    skipped: outcome.skipped,
                }
            } else {
                outcome
            };
        }

        if self.needs_resync && event.is_external_change() {
            debug!(?event, "Tracker marked for resync, rebuilding zones");
            return self.resync(encounter);
        }

        match event {
            TrackerEvent::Started => self.start(encounter),
            TrackerEvent::ParticipantsChanged => {
                let before = self.state.snapshot();
                let participants = encounter.participants();
                self.state = merge(&before, &participants, encounter);
                if self.state.snapshot() == before {
                    Outcome::default()
                } else {
                    self.persist(Vec::new())
                }
            }
            TrackerEvent::ResourceChanged { participant } => {
                if !self.automation.red_on_exhaustion {
                    return Outcome::skipped(Skipped::AutomationDisabled);
                }
                let turn = encounter.current_turn_holder();
                let state = self.take_state();
                let transition = exhaust(state, participant, encounter, turn.as_ref());
                self.apply(transition)
            }
            TrackerEvent::Resync => self.resync(encounter),
            TrackerEvent::RoundAdvanced => {
                if !self.automation.reset_on_new_round {
                    return Outcome::skipped(Skipped::AutomationDisabled);
                }
                self.state = advance_round(self.take_state());
                info!(round = encounter.current_round(), "New round, zones reset");
                self.persist(Vec::new())
            }
            TrackerEvent::TurnAdvanced { departing } => {
                if !self.automation.red_on_turn_advance {
                    return Outcome::skipped(Skipped::AutomationDisabled);
                }
                let transition = advance_turn(self.take_state(), departing);
                self.apply(transition)
            }
            TrackerEvent::MoveRequested { participant, zone } => {
                let round = encounter.current_round();
                let state = self.take_state();
                let transition = request_move(state, participant, *zone, encounter, round);
                self.apply(transition)
            }
            TrackerEvent::EncounterEnded => {
                self.state = ZoneState::new();
                self.needs_resync = false;
                self.started = false;
                info!("Encounter ended, zones cleared");
                Outcome::default()
            }
        }
    }

    /// Handle an event and perform its writes against `encounter`.
    ///
    /// Writes run sequentially. If any fails, the arrangement is kept and
    /// the tracker is marked for resync.
    pub async fn dispatch<E>(&mut self, event: &TrackerEvent, encounter: &E) -> DispatchReport
    where
        E: Encounter + ?Sized,
    {
        let outcome = self.handle(event, encounter);
        let failures = effects::execute(encounter, &outcome.effects).await;
        if !failures.is_empty() {
            warn!(
                ?event,
                failed = failures.len(),
                attempted = outcome.effects.len(),
                "Side effects failed, tracker will resync"
            );
            self.needs_resync = true;
        }
        DispatchReport { outcome, failures }
    }

    fn start<E>(&mut self, encounter: &E) -> Outcome
    where
        E: Encounter + ?Sized,
    {
        let participants = encounter.participants();
        self.state = match encounter.load_snapshot() {
            Some(snapshot) => merge(&snapshot, &participants, encounter),
            None => {
                let turn = encounter.current_turn_holder();
                classify(&participants, encounter, turn.as_ref(), encounter.current_round())
            }
        };
        self.needs_resync = false;
        self.started = true;
        info!(
            participants = self.state.len(),
            round = encounter.current_round(),
            "Tracker started"
        );
        self.persist(Vec::new())
    }

    fn resync<E>(&mut self, encounter: &E) -> Outcome
    where
        E: Encounter + ?Sized,
    {
        let participants = encounter.participants();
        let turn = encounter.current_turn_holder();
        self.state = classify(&participants, encounter, turn.as_ref(), encounter.current_round());
        self.needs_resync = false;
        self.started = true;
        info!(participants = self.state.len(), "Zones rebuilt from encounter state");
        self.persist(Vec::new())
    }

    fn apply(&mut self, transition: Transition) -> Outcome {
        let Transition {
            state,
            effects,
            skipped,
        } = transition;
        self.state = state;
        match skipped {
            Some(reason) => Outcome::skipped(Skipped::Engine(reason)),
            None => self.persist(effects),
        }
    }

    /// Append a snapshot write to `effects`.
    fn persist(&self, mut effects: Vec<SideEffect>) -> Outcome {
        effects.push(SideEffect::SaveSnapshot {
            snapshot: self.state.snapshot(),
        });
        Outcome {
            effects,
            skipped: None,
        }
    }

    fn take_state(&mut self) -> ZoneState {
        std::mem::take(&mut self.state)
    }
}
