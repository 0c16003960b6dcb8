//! Enumeration types for the Stoplight Initiative tracker.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// One of the three stoplight zones a participant can occupy.
///
/// The declaration order is also the canonical iteration order used when
/// zones are concatenated or merged: green, then yellow, then red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Zone {
    /// Wants to act next.
    Green,
    /// Neutral: still has resources and has not asked to go.
    Yellow,
    /// Already acted this round, or out of resources.
    Red,
}

impl Zone {
    /// All zones in canonical order.
    pub const ALL: [Self; 3] = [Self::Green, Self::Yellow, Self::Red];

    /// Lowercase name, matching the persisted snapshot keys.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl core::fmt::Display for Zone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Token disposition
// ---------------------------------------------------------------------------

/// The side a participant's token is on, as reported by the host.
///
/// Only [`Disposition::Friendly`] participants are tracked under the default
/// eligibility policy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Disposition {
    /// Hidden from players entirely.
    Secret,
    /// Opposes the party.
    Hostile,
    /// Neither side.
    #[default]
    Neutral,
    /// Allied with the party.
    Friendly,
}

impl Disposition {
    /// Map the host's numeric disposition level (`-2..=1`).
    ///
    /// Unknown levels map to [`Disposition::Neutral`].
    pub const fn from_level(level: i8) -> Self {
        match level {
            -2 => Self::Secret,
            -1 => Self::Hostile,
            1 => Self::Friendly,
            _ => Self::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_serializes_lowercase() {
        let json = serde_json::to_string(&Zone::Yellow).ok();
        assert_eq!(json.as_deref(), Some("\"yellow\""));
        assert_eq!(Zone::Red.to_string(), "red");
    }

    #[test]
    fn zone_order_is_green_yellow_red() {
        let mut zones = vec![Zone::Red, Zone::Green, Zone::Yellow];
        zones.sort();
        assert_eq!(zones, Zone::ALL.to_vec());
    }

    #[test]
    fn disposition_levels() {
        assert_eq!(Disposition::from_level(1), Disposition::Friendly);
        assert_eq!(Disposition::from_level(-1), Disposition::Hostile);
        assert_eq!(Disposition::from_level(-2), Disposition::Secret);
        assert_eq!(Disposition::from_level(0), Disposition::Neutral);
        assert_eq!(Disposition::from_level(7), Disposition::Neutral);
    }
}
