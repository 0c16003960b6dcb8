//! Host-side orchestration for the Stoplight Initiative tracker.
//!
//! Ties the zone engine to an encounter: configuration loading, the
//! [`Encounter`] capability interface, side-effect execution, and the
//! [`Tracker`] controller that turns encounter events into zone changes.
//!
//! # Modules
//!
//! - [`config`] -- `stoplight-config.yaml` loading and typed settings
//! - [`encounter`] -- [`Encounter`], the reads and writes a host provides
//! - [`effects`] -- performing [`SideEffect`](stoplight_types::SideEffect)s
//!   in order
//! - [`tracker`] -- [`Tracker`], [`TrackerEvent`] and dispatch reports
//! - [`memory`] -- [`InMemoryEncounter`] for tests, demos, and replay

pub mod config;
pub mod effects;
pub mod encounter;
pub mod memory;
pub mod tracker;

pub use config::{
    AutomationConfig, ConfigError, EligibilityPolicy, LoggingConfig, TrackerConfig,
    TrackerSettings,
};
pub use encounter::{Encounter, EncounterError};
pub use memory::{FailureInjection, InMemoryEncounter, ParticipantRecord};
pub use tracker::{DispatchReport, Outcome, Skipped, Tracker, TrackerError, TrackerEvent};
