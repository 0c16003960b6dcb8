//! Scenario files: an encounter's starting state plus a script of steps.
//!
//! ```yaml
//! round: 2
//! turn: a
//! participants:
//!   - id: a
//!     name: Aria
//!     resource: { current: 1, max: 1 }
//!   - id: c
//!     name: Cato
//!     ready: 2
//! steps:
//!   - step: start
//!   - step: move
//!     participant: a
//!     zone: red
//! ```

use std::path::Path;

use serde::{Deserialize, Deserializer};
use stoplight_core::ParticipantRecord;
use stoplight_types::{
    Disposition, Participant, ParticipantId, ReadinessFlag, Round, Zone, ZoneSnapshot,
};

use crate::error::ReplayError;

/// A scripted encounter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Scenario {
    /// Round the encounter starts in.
    #[serde(default = "default_round")]
    pub round: Round,

    /// Initial turn holder.
    #[serde(default)]
    pub turn: Option<ParticipantId>,

    /// Participants in encounter order.
    #[serde(default)]
    pub participants: Vec<ParticipantSpec>,

    /// Zone snapshot already stored on the encounter.
    #[serde(default)]
    pub snapshot: Option<ZoneSnapshot>,

    /// The script.
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Load a scenario from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a scenario from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ReplayError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// One participant as written in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParticipantSpec {
    /// Host id.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Image path. Empty means the configured default.
    #[serde(default)]
    pub image: String,
    /// Token side, by name or as the host's numeric level.
    #[serde(
        default = "default_disposition",
        deserialize_with = "disposition_or_level"
    )]
    pub disposition: Disposition,
    /// Resource counter, if any.
    #[serde(default)]
    pub resource: Option<CounterSpec>,
    /// Stored readiness flag: a round number, or a legacy boolean.
    #[serde(default)]
    pub ready: Option<ReadinessFlag>,
}

impl ParticipantSpec {
    /// Build the encounter record, storing readiness under `readiness_path`.
    pub fn to_record(&self, readiness_path: &str) -> Result<ParticipantRecord, ReplayError> {
        let participant = Participant::new(self.id.clone(), self.name.clone())
            .with_image(self.image.clone());
        let mut record = ParticipantRecord::new(participant).with_disposition(self.disposition);
        if let Some(counter) = self.resource {
            record = record.with_resource(counter.current, counter.max);
        }
        if let Some(flag) = self.ready {
            record = record.with_flag(readiness_path, serde_json::to_value(flag)?);
        }
        Ok(record)
    }
}

/// A resource counter as written in a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CounterSpec {
    /// Units left.
    pub current: u32,
    /// Units per round.
    pub max: u32,
}

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Attach the tracker.
    Start,
    /// The view drags a participant to a zone.
    Move {
        /// Who.
        participant: ParticipantId,
        /// Where to.
        zone: Zone,
    },
    /// The turn passes from the current holder to `to`.
    NextTurn {
        /// The next turn holder, if any.
        #[serde(default)]
        to: Option<ParticipantId>,
    },
    /// The round ends: counters refill and the round number goes up.
    NextRound,
    /// A participant spends resource units outside the tracker.
    Spend {
        /// Who.
        participant: ParticipantId,
        /// How many units.
        #[serde(default = "default_amount")]
        amount: u32,
    },
    /// A participant joins the encounter.
    Join {
        /// The newcomer.
        participant: ParticipantSpec,
    },
    /// A participant leaves the encounter.
    Leave {
        /// Who.
        participant: ParticipantId,
    },
    /// Rebuild every zone from encounter state.
    Resync,
    /// Choose which encounter writes fail from now on.
    Fail {
        /// Fail resource writes.
        #[serde(default)]
        set_resource: bool,
        /// Fail readiness writes.
        #[serde(default)]
        set_readiness: bool,
        /// Fail snapshot writes.
        #[serde(default)]
        save_snapshot: bool,
    },
    /// Replace the tracker with a fresh one started from stored state.
    Rebuild,
    /// The encounter ends.
    End,
}

impl core::fmt::Display for Step {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Move { participant, zone } => write!(f, "move {participant} to {zone}"),
            Self::NextTurn { to: Some(to) } => write!(f, "next turn: {to}"),
            Self::NextTurn { to: None } => f.write_str("next turn: nobody"),
            Self::NextRound => f.write_str("next round"),
            Self::Spend {
                participant,
                amount,
            } => write!(f, "{participant} spends {amount}"),
            Self::Join { participant } => write!(f, "{} joins", participant.id),
            Self::Leave { participant } => write!(f, "{participant} leaves"),
            Self::Resync => f.write_str("resync"),
            Self::Fail {
                set_resource,
                set_readiness,
                save_snapshot,
            } => write!(
                f,
                "fail writes (resource={set_resource}, readiness={set_readiness}, snapshot={save_snapshot})"
            ),
            Self::Rebuild => f.write_str("rebuild tracker"),
            Self::End => f.write_str("end encounter"),
        }
    }
}

const fn default_round() -> Round {
    1
}

const fn default_amount() -> u32 {
    1
}

const fn default_disposition() -> Disposition {
    Disposition::Friendly
}

fn disposition_or_level<'de, D>(deserializer: D) -> Result<Disposition, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Written {
        Named(Disposition),
        Level(i8),
    }

    Ok(match Written::deserialize(deserializer)? {
        Written::Named(disposition) => disposition,
        Written::Level(level) => Disposition::from_level(level),
    })
}
