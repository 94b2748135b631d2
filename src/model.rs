use chrono::{DateTime, NaiveDate, NaiveDateTime};
use egui::Color32;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};

/// One row of the timeline. Position in the list is the row index; records
/// carry no other identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub code: String,
    pub name: String,
    #[serde(alias = "start_date")]
    pub start_date: String,
    #[serde(alias = "target_completion_date")]
    pub target_completion_date: String,
    #[serde(alias = "completion_percentage", default)]
    pub completion_percentage: f64,
    #[serde(alias = "current_phase", default = "default_phase_name")]
    pub current_phase: String,
}

fn default_phase_name() -> String {
    Phase::Planning.to_string()
}

impl ProjectRecord {
    pub fn start_ms(&self) -> f64 {
        parse_timestamp(&self.start_date)
    }

    pub fn end_ms(&self) -> f64 {
        parse_timestamp(&self.target_completion_date)
    }

    /// Completion as a 0..=1 fraction. Out-of-range percentages are clamped
    /// so the fill never overruns its bar.
    pub fn completion_fraction(&self) -> f32 {
        (self.completion_percentage / 100.0).clamp(0.0, 1.0) as f32
    }

    pub fn phase(&self) -> Phase {
        Phase::lookup(&self.current_phase)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumIter,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Phase {
    Planning,
    Design,
    Development,
    Testing,
    Review,
    Deployment,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseColors {
    pub primary: Color32,
    pub secondary: Color32,
}

impl Phase {
    /// Unknown or misspelled phase names render as `Planning`.
    pub fn lookup(name: &str) -> Self {
        Phase::from_str(name.trim()).unwrap_or(Phase::Planning)
    }

    pub fn colors(self) -> PhaseColors {
        let (primary, secondary) = match self {
            Phase::Planning => (Color32::from_rgb(99, 102, 241), Color32::from_rgb(139, 92, 246)),
            Phase::Design => (Color32::from_rgb(236, 72, 153), Color32::from_rgb(244, 114, 182)),
            Phase::Development => {
                (Color32::from_rgb(59, 130, 246), Color32::from_rgb(6, 182, 212))
            }
            Phase::Testing => (Color32::from_rgb(245, 158, 11), Color32::from_rgb(251, 191, 36)),
            Phase::Review => (Color32::from_rgb(168, 85, 247), Color32::from_rgb(192, 132, 252)),
            Phase::Deployment => {
                (Color32::from_rgb(20, 184, 166), Color32::from_rgb(45, 212, 191))
            }
            Phase::Complete => (Color32::from_rgb(16, 185, 129), Color32::from_rgb(52, 211, 153)),
        };
        PhaseColors { primary, secondary }
    }
}

/// Parses a date string to epoch milliseconds. Unparseable input yields NaN.
pub fn parse_timestamp(raw: &str) -> f64 {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis() as f64)
            .unwrap_or(f64::NAN);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_millis() as f64;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return dt.and_utc().timestamp_millis() as f64;
    }
    f64::NAN
}

/// Converts epoch milliseconds back to a calendar date, when representable.
pub fn date_from_ms(ms: f64) -> Option<NaiveDate> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(ms as i64).map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn phase_lookup_is_case_insensitive() {
        assert_eq!(Phase::lookup("testing"), Phase::Testing);
        assert_eq!(Phase::lookup(" Complete "), Phase::Complete);
    }

    #[test]
    fn unknown_phase_falls_back_to_planning_colors() {
        assert_eq!(Phase::lookup("Procurement"), Phase::Planning);
        assert_eq!(Phase::lookup("").colors(), Phase::Planning.colors());
    }

    #[test]
    fn every_phase_has_distinct_primary() {
        let primaries: Vec<_> = Phase::iter().map(|p| p.colors().primary).collect();
        for (i, a) in primaries.iter().enumerate() {
            for b in &primaries[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn parses_plain_dates_and_rfc3339() {
        let plain = parse_timestamp("2024-01-01");
        let rfc = parse_timestamp("2024-01-01T00:00:00Z");
        let naive = parse_timestamp("2024-01-01T00:00:00");
        assert_eq!(plain, 1_704_067_200_000.0);
        assert_eq!(plain, rfc);
        assert_eq!(plain, naive);
    }

    #[test]
    fn garbage_dates_become_nan() {
        assert!(parse_timestamp("soon").is_nan());
        assert!(parse_timestamp("2024-13-40").is_nan());
        assert!(date_from_ms(f64::NAN).is_none());
    }

    #[test]
    fn completion_fraction_is_clamped() {
        let mut record = ProjectRecord {
            code: "P1".into(),
            name: "Alpha".into(),
            start_date: "2024-01-01".into(),
            target_completion_date: "2024-02-01".into(),
            completion_percentage: 140.0,
            current_phase: "Design".into(),
        };
        assert_eq!(record.completion_fraction(), 1.0);
        record.completion_percentage = -5.0;
        assert_eq!(record.completion_fraction(), 0.0);
    }
}
