//! Shared type definitions for the Stoplight Initiative tracker.
//!
//! This crate is the single source of truth for the data exchanged between
//! the zone engine, the host integration and the view. View-facing types
//! flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Newtype wrappers for host-issued identifiers
//! - [`enums`] -- [`Zone`] and token [`Disposition`]
//! - [`structs`] -- Participants, resource counters, readiness flags, snapshots
//! - [`effects`] -- Side-effect requests and failure records

pub mod effects;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use effects::{SideEffect, SideEffectFailure};
pub use enums::{Disposition, Zone};
pub use ids::{ActorRef, ParticipantId, TokenRef};
pub use structs::{Participant, ReadinessFlag, ResourceCounter, Round, ZoneSnapshot};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the view.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::ParticipantId::export_all();
        let _ = crate::ids::ActorRef::export_all();
        let _ = crate::ids::TokenRef::export_all();

        // Enums
        let _ = crate::enums::Zone::export_all();
        let _ = crate::enums::Disposition::export_all();

        // Structs
        let _ = crate::structs::Participant::export_all();
        let _ = crate::structs::ResourceCounter::export_all();
        let _ = crate::structs::ReadinessFlag::export_all();
        let _ = crate::structs::ZoneSnapshot::export_all();

        // Effects
        let _ = crate::effects::SideEffect::export_all();
        let _ = crate::effects::SideEffectFailure::export_all();
    }
}
