//! Printing step reports as text or JSON lines.

use std::io::Write;

use stoplight_types::{ParticipantId, Zone};

use crate::error::ReplayError;
use crate::replay::StepReport;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Aligned zone listing per step.
    Text,
    /// One JSON object per step.
    Json,
}

/// Write one report to `out`.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &StepReport,
    format: Format,
) -> Result<(), ReplayError> {
    match format {
        Format::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)?;
        }
        Format::Text => {
            writeln!(out, "[{}] {}", report.index, report.step)?;
            for zone in Zone::ALL {
                writeln!(
                    out,
                    "  {:<7} {}",
                    format!("{zone}:"),
                    join(report.zones.ids(zone))
                )?;
            }
            if let Some(reason) = &report.skipped {
                writeln!(out, "  - skipped: {reason}")?;
            }
            for failure in &report.failures {
                writeln!(out, "  ! {}: {}", failure.effect, failure.message)?;
            }
        }
    }
    Ok(())
}

fn join(ids: &[ParticipantId]) -> String {
    if ids.is_empty() {
        return "-".to_owned();
    }
    ids.iter()
        .map(ParticipantId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stoplight_types::ZoneSnapshot;

    use super::*;

    fn report() -> StepReport {
        StepReport {
            index: 2,
            step: "move a to red".to_owned(),
            skipped: None,
            effects: Vec::new(),
            failures: Vec::new(),
            zones: ZoneSnapshot {
                green: vec!["c".into()],
                yellow: Vec::new(),
                red: vec!["b".into(), "a".into()],
            },
        }
    }

    #[test]
    fn text_lists_every_zone() {
        let mut out = Vec::new();
        write_report(&mut out, &report(), Format::Text).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "[2] move a to red\n  green:  c\n  yellow: -\n  red:    b, a\n"
        );
    }

    #[test]
    fn json_is_one_line_per_step() {
        let mut out = Vec::new();
        write_report(&mut out, &report(), Format::Json).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["zones"]["red"], serde_json::json!(["b", "a"]));
        assert_eq!(value["index"], 2);
    }
}
