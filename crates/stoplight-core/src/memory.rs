//! In-memory [`Encounter`] implementation.
//!
//! Holds participants, resource counters, round and turn state, and a
//! flag store keyed by `<scope>.<key>` paths, the way an encounter
//! document would. Flag values are stored as JSON so that snapshots and
//! readiness tags go through the same encode/decode path a real host uses,
//! including values written by older revisions or corrupted in storage.
//!
//! Writes can be made to fail on demand with [`FailureInjection`], and
//! every successful write is recorded for inspection.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use stoplight_types::{
    Disposition, Participant, ParticipantId, ReadinessFlag, ResourceCounter, Round, SideEffect,
    ZoneSnapshot,
};
use stoplight_zones::ParticipantLookup;
use tracing::{debug, warn};

use crate::config::TrackerSettings;
use crate::encounter::{Encounter, EncounterError};

/// One participant as the host stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRecord {
    /// Identity and presentation data. An empty `image_ref` falls back to
    /// the configured default image when read.
    pub participant: Participant,
    /// Token side.
    pub disposition: Disposition,
    /// Resource counter, if the participant has one.
    pub resource: Option<ResourceCounter>,
    /// Participant flags keyed by `<scope>.<key>`.
    pub flags: BTreeMap<String, Value>,
}

impl ParticipantRecord {
    /// A friendly participant with no counter and no flags.
    pub fn new(participant: Participant) -> Self {
        Self {
            participant,
            disposition: Disposition::Friendly,
            resource: None,
            flags: BTreeMap::new(),
        }
    }

    /// Set the token side.
    #[must_use]
    pub const fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Set the resource counter.
    #[must_use]
    pub const fn with_resource(mut self, current: u32, max: u32) -> Self {
        self.resource = Some(ResourceCounter::new(current, max));
        self
    }

    /// Store a raw flag value.
    #[must_use]
    pub fn with_flag(mut self, path: impl Into<String>, value: Value) -> Self {
        self.flags.insert(path.into(), value);
        self
    }
}

/// Which writes should fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct FailureInjection {
    /// Fail `set_resource`.
    pub set_resource: bool,
    /// Fail `set_readiness`.
    pub set_readiness: bool,
    /// Fail `save_snapshot`.
    pub save_snapshot: bool,
}

impl FailureInjection {
    /// Every write fails.
    pub const ALL: Self = Self {
        set_resource: true,
        set_readiness: true,
        save_snapshot: true,
    };

    /// No write fails.
    pub const NONE: Self = Self {
        set_resource: false,
        set_readiness: false,
        save_snapshot: false,
    };
}

#[derive(Debug, Default)]
struct EncounterData {
    records: Vec<ParticipantRecord>,
    round: Round,
    turn: Option<ParticipantId>,
    flags: BTreeMap<String, Value>,
}

impl EncounterData {
    fn record(&self, id: &ParticipantId) -> Option<&ParticipantRecord> {
        self.records.iter().find(|r| r.participant.id == *id)
    }

    fn record_mut(&mut self, id: &ParticipantId) -> Result<&mut ParticipantRecord, EncounterError> {
        self.records
            .iter_mut()
            .find(|r| r.participant.id == *id)
            .ok_or_else(|| EncounterError::ParticipantNotFound(id.clone()))
    }
}

/// An encounter held entirely in memory.
#[derive(Debug)]
pub struct InMemoryEncounter {
    settings: TrackerSettings,
    data: RwLock<EncounterData>,
    failures: Mutex<FailureInjection>,
    writes: Mutex<Vec<SideEffect>>,
}

impl InMemoryEncounter {
    /// Create an empty encounter at round 1.
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            data: RwLock::new(EncounterData {
                round: 1,
                ..EncounterData::default()
            }),
            failures: Mutex::new(FailureInjection::NONE),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// The storage settings this encounter was created with.
    pub const fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    // =========================================================================
    // Host-side mutation
    // =========================================================================

    /// Add a participant at the end of the iteration order.
    ///
    /// Replaces an existing record with the same id in place.
    pub fn add_participant(&self, record: ParticipantRecord) {
        let mut data = self.data.write();
        if let Some(existing) = data
            .records
            .iter_mut()
            .find(|r| r.participant.id == record.participant.id)
        {
            *existing = record;
        } else {
            data.records.push(record);
        }
    }

    /// Remove a participant. Returns whether it was present.
    pub fn remove_participant(&self, id: &ParticipantId) -> bool {
        let mut data = self.data.write();
        let before = data.records.len();
        data.records.retain(|r| r.participant.id != *id);
        if data.turn.as_ref() == Some(id) {
            data.turn = None;
        }
        data.records.len() != before
    }

    /// Set the round number.
    pub fn set_round(&self, round: Round) {
        self.data.write().round = round;
    }

    /// Set the turn holder.
    pub fn set_turn(&self, holder: Option<ParticipantId>) {
        self.data.write().turn = holder;
    }

    /// Start the next round: bump the round, clear the turn holder, and
    /// refill every resource counter. Returns the new round number.
    pub fn begin_next_round(&self) -> Round {
        let mut data = self.data.write();
        data.round = data.round.saturating_add(1);
        data.turn = None;
        for record in &mut data.records {
            if let Some(counter) = record.resource.as_mut() {
                counter.current = counter.max;
            }
        }
        data.round
    }

    /// Spend `amount` resource units, saturating at zero.
    ///
    /// Returns the new counter, or `None` if the participant has none.
    pub fn spend(&self, id: &ParticipantId, amount: u32) -> Option<ResourceCounter> {
        let mut data = self.data.write();
        let record = data.record_mut(id).ok()?;
        let counter = record.resource.as_mut()?;
        counter.current = counter.current.saturating_sub(amount);
        Some(*counter)
    }

    /// Store a raw participant flag, bypassing encoding.
    ///
    /// # Errors
    ///
    /// Returns [`EncounterError::ParticipantNotFound`] for unknown ids.
    pub fn set_participant_flag(
        &self,
        id: &ParticipantId,
        path: impl Into<String>,
        value: Value,
    ) -> Result<(), EncounterError> {
        let mut data = self.data.write();
        data.record_mut(id)?.flags.insert(path.into(), value);
        Ok(())
    }

    /// Store a raw encounter flag, bypassing encoding.
    pub fn set_encounter_flag(&self, path: impl Into<String>, value: Value) {
        self.data.write().flags.insert(path.into(), value);
    }

    /// Read a raw encounter flag.
    pub fn encounter_flag(&self, path: &str) -> Option<Value> {
        self.data.read().flags.get(path).cloned()
    }

    /// Choose which writes fail from now on.
    pub fn inject_failures(&self, failures: FailureInjection) {
        *self.failures.lock() = failures;
    }

    /// Every write that succeeded, in order.
    pub fn write_log(&self) -> Vec<SideEffect> {
        self.writes.lock().clone()
    }

    /// Forget recorded writes.
    pub fn clear_write_log(&self) {
        self.writes.lock().clear();
    }

    fn injected(&self) -> FailureInjection {
        *self.failures.lock()
    }

    fn record_write(&self, effect: SideEffect) {
        self.writes.lock().push(effect);
    }

    fn rejected(operation: &str) -> EncounterError {
        EncounterError::Rejected {
            reason: format!("{operation} unavailable"),
        }
    }
}

impl ParticipantLookup for InMemoryEncounter {
    fn is_eligible(&self, participant: &Participant) -> bool {
        self.data
            .read()
            .record(&participant.id)
            .is_some_and(|r| self.settings.eligibility.admits(r.disposition))
    }

    fn resource_of(&self, participant: &ParticipantId) -> Option<ResourceCounter> {
        self.data.read().record(participant)?.resource
    }

    fn readiness_of(&self, participant: &ParticipantId) -> Option<ReadinessFlag> {
        let path = self.settings.readiness_path();
        let data = self.data.read();
        let value = data.record(participant)?.flags.get(&path)?;
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value.clone()) {
            Ok(flag) => Some(flag),
            Err(e) => {
                warn!(
                    %participant,
                    path = %path,
                    error = %e,
                    "Unreadable readiness flag ignored"
                );
                None
            }
        }
    }
}

#[async_trait]
impl Encounter for InMemoryEncounter {
    fn participants(&self) -> Vec<Participant> {
        self.data
            .read()
            .records
            .iter()
            .map(|r| {
                let mut participant = r.participant.clone();
                if participant.image_ref.is_empty() {
                    participant.image_ref.clone_from(&self.settings.default_image);
                }
                participant
            })
            .collect()
    }

    fn current_turn_holder(&self) -> Option<ParticipantId> {
        self.data.read().turn.clone()
    }

    fn current_round(&self) -> Round {
        self.data.read().round
    }

    fn load_snapshot(&self) -> Option<ZoneSnapshot> {
        let path = self.settings.snapshot_path();
        let value = self.data.read().flags.get(&path)?.clone();
        match serde_json::from_value(value) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %path, error = %e, "Stored zone snapshot is unreadable, ignoring it");
                None
            }
        }
    }

    async fn set_resource(
        &self,
        participant: &ParticipantId,
        value: u32,
    ) -> Result<(), EncounterError> {
        if self.injected().set_resource {
            return Err(Self::rejected("set_resource"));
        }
        {
            let mut data = self.data.write();
            let record = data.record_mut(participant)?;
            let counter = record
                .resource
                .as_mut()
                .ok_or_else(|| EncounterError::NoResourceCounter(participant.clone()))?;
            counter.current = value;
        }
        debug!(%participant, value, "Resource counter written");
        self.record_write(SideEffect::SetResource {
            participant: participant.clone(),
            value,
        });
        Ok(())
    }

    async fn set_readiness(
        &self,
        participant: &ParticipantId,
        round: Option<Round>,
    ) -> Result<(), EncounterError> {
        if self.injected().set_readiness {
            return Err(Self::rejected("set_readiness"));
        }
        let path = self.settings.readiness_path();
        {
            let mut data = self.data.write();
            let flags = &mut data.record_mut(participant)?.flags;
            match round {
                Some(round) => {
                    flags.insert(path, Value::from(round));
                }
                None => {
                    flags.remove(&path);
                }
            }
        }
        self.record_write(SideEffect::SetReadiness {
            participant: participant.clone(),
            round,
        });
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: &ZoneSnapshot) -> Result<(), EncounterError> {
        if self.injected().save_snapshot {
            return Err(Self::rejected("save_snapshot"));
        }
        let path = self.settings.snapshot_path();
        let value = serde_json::to_value(snapshot).map_err(|e| EncounterError::Encode {
            path: path.clone(),
            message: e.to_string(),
        })?;
        self.data.write().flags.insert(path, value);
        self.record_write(SideEffect::SaveSnapshot {
            snapshot: snapshot.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn encounter() -> InMemoryEncounter {
        let encounter = InMemoryEncounter::new(TrackerSettings::default());
        encounter.add_participant(
            ParticipantRecord::new(Participant::new("a", "Aria").with_image("aria.png"))
                .with_resource(1, 2),
        );
        encounter.add_participant(
            ParticipantRecord::new(Participant::new("orc", "Orc"))
                .with_disposition(Disposition::Hostile),
        );
        encounter
    }

    #[test]
    fn friendly_policy_filters_hostiles() {
        let encounter = encounter();
        let participants = encounter.participants();
        assert!(encounter.is_eligible(participants.first().unwrap()));
        assert!(!encounter.is_eligible(participants.last().unwrap()));
        assert!(!encounter.is_eligible(&Participant::new("ghost", "Ghost")));
    }

    #[test]
    fn missing_image_falls_back_to_default() {
        let images: Vec<String> = encounter()
            .participants()
            .into_iter()
            .map(|p| p.image_ref)
            .collect();
        assert_eq!(images, ["aria.png", "icons/svg/mystery-man.svg"]);
    }

    #[test]
    fn readiness_decodes_tagged_legacy_and_garbage() {
        let encounter = encounter();
        let a = ParticipantId::from("a");
        let path = encounter.settings().readiness_path();

        encounter.set_participant_flag(&a, path.clone(), json!(3)).unwrap();
        assert_eq!(encounter.readiness_of(&a), Some(ReadinessFlag::Round(3)));

        encounter.set_participant_flag(&a, path.clone(), json!(true)).unwrap();
        assert_eq!(encounter.readiness_of(&a), Some(ReadinessFlag::Legacy(true)));

        encounter.set_participant_flag(&a, path.clone(), json!("soon")).unwrap();
        assert_eq!(encounter.readiness_of(&a), None);

        encounter.set_participant_flag(&a, path, Value::Null).unwrap();
        assert_eq!(encounter.readiness_of(&a), None);
    }

    #[test]
    fn corrupt_snapshot_reads_as_absent() {
        let encounter = encounter();
        let path = encounter.settings().snapshot_path();
        encounter.set_encounter_flag(path, json!({ "green": "not-a-list" }));
        assert!(encounter.load_snapshot().is_none());
    }

    #[test]
    fn spend_saturates_and_next_round_refills() {
        let encounter = encounter();
        let a = ParticipantId::from("a");
        assert_eq!(encounter.spend(&a, 5), Some(ResourceCounter::new(0, 2)));
        assert_eq!(encounter.spend(&"orc".into(), 1), None);

        encounter.set_turn(Some(a.clone()));
        assert_eq!(encounter.begin_next_round(), 2);
        assert_eq!(encounter.resource_of(&a), Some(ResourceCounter::new(2, 2)));
        assert_eq!(encounter.current_turn_holder(), None);
    }

    #[test]
    fn removing_turn_holder_clears_turn() {
        let encounter = encounter();
        let a = ParticipantId::from("a");
        encounter.set_turn(Some(a.clone()));
        assert!(encounter.remove_participant(&a));
        assert!(!encounter.remove_participant(&a));
        assert_eq!(encounter.current_turn_holder(), None);
    }

    #[tokio::test]
    async fn writes_round_trip_through_flags() {
        let encounter = encounter();
        let a = ParticipantId::from("a");

        encounter.set_readiness(&a, Some(4)).await.unwrap();
        assert_eq!(encounter.readiness_of(&a), Some(ReadinessFlag::Round(4)));
        encounter.set_readiness(&a, None).await.unwrap();
        assert_eq!(encounter.readiness_of(&a), None);

        encounter.set_resource(&a, 0).await.unwrap();
        assert_eq!(encounter.resource_of(&a).map(|c| c.current), Some(0));

        let snapshot = ZoneSnapshot {
            green: vec![a.clone()],
            ..ZoneSnapshot::default()
        };
        encounter.save_snapshot(&snapshot).await.unwrap();
        assert_eq!(encounter.load_snapshot(), Some(snapshot));
        assert_eq!(
            encounter.encounter_flag("stoplight-initiative.zones"),
            Some(json!({ "green": ["a"], "yellow": [], "red": [] }))
        );
        assert_eq!(encounter.write_log().len(), 4);
    }

    #[tokio::test]
    async fn write_errors() {
        let encounter = encounter();
        let err = encounter.set_resource(&"orc".into(), 1).await.unwrap_err();
        assert_eq!(err, EncounterError::NoResourceCounter("orc".into()));

        let err = encounter.set_readiness(&"nobody".into(), None).await.unwrap_err();
        assert_eq!(err, EncounterError::ParticipantNotFound("nobody".into()));

        encounter.inject_failures(FailureInjection {
            save_snapshot: true,
            ..FailureInjection::NONE
        });
        let err = encounter.save_snapshot(&ZoneSnapshot::default()).await;
        assert!(matches!(err, Err(EncounterError::Rejected { .. })));
        assert!(encounter.write_log().is_empty());
    }
}
