//! Zone reconciliation engine for the Stoplight Initiative tracker.
//!
//! This crate decides which stoplight zone each participant belongs to and
//! keeps that decision consistent as the encounter changes. It performs no
//! I/O: operators take a [`ZoneState`] and return the next one together
//! with the encounter writes the host has to carry out.
//!
//! # Modules
//!
//! - [`state`] -- [`ZoneState`], the green/yellow/red partition
//! - [`lookup`] -- [`ParticipantLookup`], the read interface onto the
//!   encounter, and the map-backed [`LookupTable`]
//! - [`reconcile`] -- [`classify`] from encounter truth and [`merge`] with a
//!   persisted snapshot
//! - [`operators`] -- [`request_move`], [`advance_round`], [`advance_turn`]
//!   and [`exhaust`]
//! - [`error`] -- [`ZoneError`] for partition invariant violations

pub mod error;
pub mod lookup;
pub mod operators;
pub mod reconcile;
pub mod state;

// Re-export primary types at crate root.
pub use error::ZoneError;
pub use lookup::{LookupTable, ParticipantLookup};
pub use operators::{
    NoOpReason, Transition, advance_round, advance_turn, exhaust, request_move,
};
pub use reconcile::{classify, eligible, merge, zone_for};
pub use state::ZoneState;

#[cfg(test)]
mod tests {
    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::state::ZoneState::export_all();
    }
}
