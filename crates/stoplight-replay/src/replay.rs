//! Drives a [`Scenario`] through a tracker and an in-memory encounter.
//!
//! Each step first changes the encounter the way the host would (spend a
//! counter, pass the turn, add a participant), then dispatches the event
//! the host would send. The resulting arrangement is captured in a
//! [`StepReport`].

use serde::Serialize;
use stoplight_core::{
    Encounter, FailureInjection, InMemoryEncounter, Outcome, Skipped, Tracker, TrackerConfig,
    TrackerEvent,
};
use stoplight_types::{ParticipantId, SideEffect, SideEffectFailure, ZoneSnapshot};
use tracing::{debug, info};

use crate::error::ReplayError;
use crate::scenario::{Scenario, Step};

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// One-based step number.
    pub index: usize,
    /// Human-readable step label.
    pub step: String,
    /// Why nothing changed, if nothing did.
    pub skipped: Option<String>,
    /// Writes the tracker requested.
    pub effects: Vec<SideEffect>,
    /// Writes that failed.
    pub failures: Vec<SideEffectFailure>,
    /// Arrangement after the step.
    pub zones: ZoneSnapshot,
}

/// A tracker attached to an in-memory encounter.
#[derive(Debug)]
pub struct Replay {
    config: TrackerConfig,
    encounter: InMemoryEncounter,
    tracker: Tracker,
}

impl Replay {
    /// Set up the encounter described by `scenario`. The tracker is not
    /// started until a `start` step runs.
    pub fn new(config: TrackerConfig, scenario: &Scenario) -> Result<Self, ReplayError> {
        let encounter = InMemoryEncounter::new(config.tracker.clone());
        let readiness_path = config.tracker.readiness_path();
        for spec in &scenario.participants {
            encounter.add_participant(spec.to_record(&readiness_path)?);
        }
        encounter.set_round(scenario.round);
        encounter.set_turn(scenario.turn.clone());
        if let Some(snapshot) = &scenario.snapshot {
            encounter.set_encounter_flag(
                config.tracker.snapshot_path(),
                serde_json::to_value(snapshot)?,
            );
        }

        let tracker = Tracker::from_config(&config);
        Ok(Self {
            config,
            encounter,
            tracker,
        })
    }

    /// The tracker being driven.
    pub const fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// The encounter being driven.
    pub const fn encounter(&self) -> &InMemoryEncounter {
        &self.encounter
    }

    /// Run every step of `scenario`, calling `on_step` after each.
    pub async fn run<F>(&mut self, scenario: &Scenario, mut on_step: F) -> Result<(), ReplayError>
    where
        F: FnMut(&StepReport) -> Result<(), ReplayError>,
    {
        info!(
            participants = scenario.participants.len(),
            steps = scenario.steps.len(),
            round = scenario.round,
            "Replaying scenario"
        );
        for (offset, step) in scenario.steps.iter().enumerate() {
            let index = offset.saturating_add(1);
            let report = self.step(index, step).await?;
            on_step(&report)?;
        }
        Ok(())
    }

    /// Run one step.
    pub async fn step(&mut self, index: usize, step: &Step) -> Result<StepReport, ReplayError> {
        debug!(index, %step, "Running step");
        let (outcome, failures) = match step {
            Step::Start => self.dispatch(TrackerEvent::Started).await,
            Step::Move { participant, zone } => {
                self.dispatch(TrackerEvent::MoveRequested {
                    participant: participant.clone(),
                    zone: *zone,
                })
                .await
            }
            Step::NextTurn { to } => {
                let departing = self.encounter.current_turn_holder();
                self.encounter.set_turn(to.clone());
                match departing {
                    Some(departing) => {
                        self.dispatch(TrackerEvent::TurnAdvanced { departing }).await
                    }
                    None => (Outcome::default(), Vec::new()),
                }
            }
            Step::NextRound => {
                let round = self.encounter.begin_next_round();
                info!(round, "Round started");
                self.dispatch(TrackerEvent::RoundAdvanced).await
            }
            Step::Spend {
                participant,
                amount,
            } => {
                self.require(index, participant)?;
                self.encounter.spend(participant, *amount);
                self.dispatch(TrackerEvent::ResourceChanged {
                    participant: participant.clone(),
                })
                .await
            }
            Step::Join { participant } => {
                let record = participant.to_record(&self.config.tracker.readiness_path())?;
                self.encounter.add_participant(record);
                self.dispatch(TrackerEvent::ParticipantsChanged).await
            }
            Step::Leave { participant } => {
                self.require(index, participant)?;
                self.encounter.remove_participant(participant);
                self.dispatch(TrackerEvent::ParticipantsChanged).await
            }
            Step::Resync => self.dispatch(TrackerEvent::Resync).await,
            Step::Fail {
                set_resource,
                set_readiness,
                save_snapshot,
            } => {
                self.encounter.inject_failures(FailureInjection {
                    set_resource: *set_resource,
                    set_readiness: *set_readiness,
                    save_snapshot: *save_snapshot,
                });
                (Outcome::default(), Vec::new())
            }
            Step::Rebuild => {
                self.tracker = Tracker::from_config(&self.config);
                self.dispatch(TrackerEvent::Started).await
            }
            Step::End => self.dispatch(TrackerEvent::EncounterEnded).await,
        };

        Ok(StepReport {
            index,
            step: step.to_string(),
            skipped: outcome.skipped.map(describe_skip),
            effects: outcome.effects,
            failures,
            zones: self.tracker.current_state().snapshot(),
        })
    }

    async fn dispatch(&mut self, event: TrackerEvent) -> (Outcome, Vec<SideEffectFailure>) {
        let report = self.tracker.dispatch(&event, &self.encounter).await;
        (report.outcome, report.failures)
    }

    fn require(&self, step: usize, participant: &ParticipantId) -> Result<(), ReplayError> {
        let known = self
            .encounter
            .participants()
            .iter()
            .any(|p| p.id == *participant);
        if known {
            Ok(())
        } else {
            Err(ReplayError::UnknownParticipant {
                step,
                participant: participant.clone(),
            })
        }
    }
}

fn describe_skip(skipped: Skipped) -> String {
    match skipped {
        Skipped::Engine(reason) => format!("{reason:?}"),
        Skipped::AutomationDisabled => "automation disabled".to_owned(),
    }
}
