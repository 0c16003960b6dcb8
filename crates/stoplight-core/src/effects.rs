//! Carrying out engine side effects against an [`Encounter`].
//!
//! Effects run strictly in order, one at a time. A failed write does not
//! stop the remaining ones: each effect is independent, and the caller
//! gets the full list of what went wrong.

use chrono::Utc;
use stoplight_types::{ParticipantId, SideEffect, SideEffectFailure};
use tracing::{debug, warn};

use crate::encounter::{Encounter, EncounterError};

/// Perform a single side effect.
///
/// # Errors
///
/// Returns the host's [`EncounterError`] if the write fails.
pub async fn apply<E>(encounter: &E, effect: &SideEffect) -> Result<(), EncounterError>
where
    E: Encounter + ?Sized,
{
    match effect {
        SideEffect::SetResource { participant, value } => {
            encounter.set_resource(participant, *value).await
        }
        SideEffect::SetReadiness { participant, round } => {
            encounter.set_readiness(participant, *round).await
        }
        SideEffect::SaveSnapshot { snapshot } => encounter.save_snapshot(snapshot).await,
    }
}

/// Perform every effect in order and collect the failures.
///
/// An empty result means everything was written.
pub async fn execute<E>(encounter: &E, effects: &[SideEffect]) -> Vec<SideEffectFailure>
where
    E: Encounter + ?Sized,
{
    let mut failures = Vec::new();
    for effect in effects {
        match apply(encounter, effect).await {
            Ok(()) => debug!(%effect, "Side effect applied"),
            Err(e) => {
                warn!(
                    %effect,
                    participant = effect.participant().map_or("-", ParticipantId::as_str),
                    error = %e,
                    "Side effect failed"
                );
                failures.push(SideEffectFailure {
                    effect: effect.clone(),
                    message: e.to_string(),
                    failed_at: Utc::now(),
                });
            }
        }
    }
    failures
}
