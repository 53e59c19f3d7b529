//! Dashboard projections
//!
//! UI-shaped views derived from one raw [`HealthMetricRecord`]:
//! - [`OuraMetrics`]: sleep, readiness and activity scores
//! - [`NutritionMetrics`]: daily macros, plus progress against goals
//! - [`QuickVitals`]: heart rate, steps, stress, HRV, meditation
//!
//! Projections never fail. Absent or non-numeric columns become 0, and
//! metrics the store does not carry yet are reported as
//! [`Reading::Unavailable`] unless a simulation is explicitly requested.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::store::{FieldValue, HealthMetricRecord};

// ============================================
// Parsing
// ============================================

/// Parse a column as a base-10 integer, 0 when absent or non-numeric
///
/// Text is read as a leading integer: surrounding whitespace and trailing
/// garbage are ignored (`" 42kg"` is 42), anything without leading digits
/// is 0. Numbers are truncated toward zero.
pub fn parse_int(value: Option<&FieldValue>) -> i64 {
    match value {
        Some(FieldValue::Text(s)) => parse_leading_int(s),
        Some(FieldValue::Number(n)) if n.is_finite() => n.trunc() as i64,
        _ => 0,
    }
}

fn parse_leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut seen = false;
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        seen = true;
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }

    match (seen, negative) {
        (false, _) => 0,
        (true, true) => -value,
        (true, false) => value,
    }
}

/// Parse a column as a timestamp
///
/// Accepts RFC 3339, naive date-times (local time), bare dates (UTC
/// midnight) and Unix milliseconds.
pub fn parse_date(value: Option<&FieldValue>) -> Option<DateTime<Utc>> {
    match value? {
        FieldValue::Number(ms) if ms.is_finite() => DateTime::from_timestamp_millis(*ms as i64),
        FieldValue::Number(_) => None,
        FieldValue::Text(s) => parse_date_str(s.trim()),
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// ============================================
// Placeholders
// ============================================

/// A metric value that the store may not provide yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Value(i64),
    /// Not wired to the store; serialized as `null`
    Unavailable,
}

impl Reading {
    pub fn value(&self) -> Option<i64> {
        match self {
            Reading::Value(v) => Some(*v),
            Reading::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Reading::Value(_))
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Unavailable => write!(f, "--"),
        }
    }
}

/// How to fill metrics the store does not carry (activity, heart rate, steps)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaceholderPolicy {
    /// Report [`Reading::Unavailable`]
    #[default]
    Unavailable,
    /// Draw uniformly from the metric's plausible range
    ///
    /// With a seed, every projection of the same record yields the same
    /// values. Without one, values come from OS entropy.
    Simulated { seed: Option<u64> },
}

impl PlaceholderPolicy {
    fn sampler(&self) -> Sampler {
        match self {
            PlaceholderPolicy::Unavailable => Sampler(None),
            PlaceholderPolicy::Simulated { seed: Some(seed) } => {
                Sampler(Some(StdRng::seed_from_u64(*seed)))
            }
            PlaceholderPolicy::Simulated { seed: None } => Sampler(Some(StdRng::from_entropy())),
        }
    }
}

struct Sampler(Option<StdRng>);

impl Sampler {
    fn reading(&mut self, range: Range<i64>) -> Reading {
        match self.0.as_mut() {
            Some(rng) => Reading::Value(rng.gen_range(range)),
            None => Reading::Unavailable,
        }
    }
}

/// Activity score range, `[0, 100)`
pub const ACTIVITY_RANGE: Range<i64> = 0..100;
/// Heart rate range in bpm, `[60, 90)`
pub const HEART_RATE_RANGE: Range<i64> = 60..90;
/// Daily step range, `[0, 10000)`
pub const STEPS_RANGE: Range<i64> = 0..10_000;

// ============================================
// Projections
// ============================================

/// Oura-style daily scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OuraMetrics {
    pub sleep_score: i64,
    pub readiness_score: i64,
    pub activity_score: Reading,
    pub last_updated: DateTime<Utc>,
}

impl OuraMetrics {
    pub fn from_record(record: &HealthMetricRecord, placeholders: PlaceholderPolicy) -> Self {
        let mut sampler = placeholders.sampler();
        Self {
            sleep_score: parse_int(record.sleep_score.as_ref()),
            readiness_score: parse_int(record.readiness_score.as_ref()),
            activity_score: sampler.reading(ACTIVITY_RANGE),
            last_updated: parse_date(record.date.as_ref()).unwrap_or_else(Utc::now),
        }
    }
}

/// Daily nutrition totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionMetrics {
    pub calories: i64,
    pub protein: i64,
    pub carbs: i64,
    pub fats: i64,
    pub date: DateTime<Utc>,
}

impl NutritionMetrics {
    pub fn from_record(record: &HealthMetricRecord) -> Self {
        Self {
            calories: parse_int(record.calories.as_ref()),
            protein: parse_int(record.protein.as_ref()),
            carbs: parse_int(record.carbs.as_ref()),
            fats: parse_int(record.fat.as_ref()),
            date: parse_date(record.date.as_ref()).unwrap_or_else(Utc::now),
        }
    }

    /// Progress of each macro against its daily goal
    pub fn progress(&self, goals: &NutritionGoals) -> [MacroProgress; 4] {
        [
            MacroProgress::new("Calories", "kcal", self.calories, goals.calories),
            MacroProgress::new("Protein", "g", self.protein, goals.protein),
            MacroProgress::new("Carbs", "g", self.carbs, goals.carbs),
            MacroProgress::new("Fats", "g", self.fats, goals.fats),
        ]
    }
}

/// Coarse stress label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Normal,
    Elevated,
    High,
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StressLevel::Low => write!(f, "Low"),
            StressLevel::Normal => write!(f, "Normal"),
            StressLevel::Elevated => write!(f, "Elevated"),
            StressLevel::High => write!(f, "High"),
        }
    }
}

/// At-a-glance vitals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickVitals {
    pub heart_rate: Reading,
    pub steps: Reading,
    pub stress_level: StressLevel,
    pub hrv: i64,
    pub meditation_minutes: i64,
}

impl QuickVitals {
    pub fn from_record(record: &HealthMetricRecord, placeholders: PlaceholderPolicy) -> Self {
        let mut sampler = placeholders.sampler();
        Self {
            heart_rate: sampler.reading(HEART_RATE_RANGE),
            steps: sampler.reading(STEPS_RANGE),
            // No stress column exists yet
            stress_level: StressLevel::Normal,
            hrv: parse_int(record.hrv.as_ref()),
            meditation_minutes: parse_int(record.meditation_minutes.as_ref()),
        }
    }
}

// ============================================
// Nutrition goals
// ============================================

/// Daily macro targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionGoals {
    #[serde(default = "default_calorie_goal")]
    pub calories: i64,
    #[serde(default = "default_protein_goal")]
    pub protein: i64,
    #[serde(default = "default_carbs_goal")]
    pub carbs: i64,
    #[serde(default = "default_fats_goal")]
    pub fats: i64,
}

fn default_calorie_goal() -> i64 {
    2200
}

fn default_protein_goal() -> i64 {
    160
}

fn default_carbs_goal() -> i64 {
    275
}

fn default_fats_goal() -> i64 {
    73
}

impl Default for NutritionGoals {
    fn default() -> Self {
        Self {
            calories: default_calorie_goal(),
            protein: default_protein_goal(),
            carbs: default_carbs_goal(),
            fats: default_fats_goal(),
        }
    }
}

/// One macro's progress toward its goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroProgress {
    pub label: String,
    pub unit: String,
    pub current: i64,
    pub goal: i64,
    /// Percentage of goal reached, unclamped
    pub percent: f64,
    /// Amount left before the goal, 0 once reached
    pub remaining: i64,
    /// Amount past the goal, 0 until exceeded
    pub over: i64,
}

impl MacroProgress {
    pub fn new(label: &str, unit: &str, current: i64, goal: i64) -> Self {
        let percent = if goal > 0 {
            current as f64 / goal as f64 * 100.0
        } else {
            0.0
        };

        Self {
            label: label.to_string(),
            unit: unit.to_string(),
            current,
            goal,
            percent,
            remaining: goal.saturating_sub(current).max(0),
            over: current.saturating_sub(goal).max(0),
        }
    }

    /// Percentage clamped to `[0, 100]` for progress bars
    pub fn display_percent(&self) -> f64 {
        self.percent.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldValue {
        FieldValue::from(s)
    }

    #[test]
    fn test_parse_int_digit_strings() {
        assert_eq!(parse_int(Some(&text("87"))), 87);
        assert_eq!(parse_int(Some(&text("  42kg"))), 42);
        assert_eq!(parse_int(Some(&text("-5"))), -5);
        assert_eq!(parse_int(Some(&text("+12"))), 12);
        assert_eq!(parse_int(Some(&text("3.9"))), 3);
    }

    #[test]
    fn test_parse_int_fallbacks() {
        assert_eq!(parse_int(None), 0);
        assert_eq!(parse_int(Some(&text("n/a"))), 0);
        assert_eq!(parse_int(Some(&text(""))), 0);
        assert_eq!(parse_int(Some(&text("-"))), 0);
        assert_eq!(parse_int(Some(&FieldValue::Number(f64::NAN))), 0);
    }

    #[test]
    fn test_parse_int_numbers() {
        assert_eq!(parse_int(Some(&FieldValue::Number(87.9))), 87);
        assert_eq!(parse_int(Some(&FieldValue::Number(-2.5))), -2);
    }

    #[test]
    fn test_parse_int_saturates() {
        assert_eq!(parse_int(Some(&text("99999999999999999999999"))), i64::MAX);
    }

    #[test]
    fn test_parse_date_formats() {
        let rfc = parse_date(Some(&text("2026-10-16T07:30:00+02:00"))).unwrap();
        assert_eq!(rfc.to_rfc3339(), "2026-10-16T05:30:00+00:00");

        let day = parse_date(Some(&text("2026-10-16"))).unwrap();
        assert_eq!(day.to_rfc3339(), "2026-10-16T00:00:00+00:00");

        let millis = parse_date(Some(&FieldValue::Number(0.0))).unwrap();
        assert_eq!(millis.timestamp(), 0);

        assert!(parse_date(Some(&text("2026-10-16T07:30:00"))).is_some());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(None).is_none());
        assert!(parse_date(Some(&text("yesterday"))).is_none());
        assert!(parse_date(Some(&FieldValue::Number(f64::INFINITY))).is_none());
    }

    #[test]
    fn test_empty_record_projects_to_zero() {
        let record = HealthMetricRecord::new();

        let oura = OuraMetrics::from_record(&record, PlaceholderPolicy::Unavailable);
        assert_eq!(oura.sleep_score, 0);
        assert_eq!(oura.readiness_score, 0);
        assert_eq!(oura.activity_score, Reading::Unavailable);

        let nutrition = NutritionMetrics::from_record(&record);
        assert_eq!(
            (nutrition.calories, nutrition.protein, nutrition.carbs, nutrition.fats),
            (0, 0, 0, 0)
        );

        let vitals = QuickVitals::from_record(&record, PlaceholderPolicy::Unavailable);
        assert_eq!(vitals.hrv, 0);
        assert_eq!(vitals.meditation_minutes, 0);
        assert_eq!(vitals.stress_level, StressLevel::Normal);
        assert!(!vitals.heart_rate.is_available());
    }

    #[test]
    fn test_missing_date_defaults_to_now() {
        let before = Utc::now();
        let oura = OuraMetrics::from_record(&HealthMetricRecord::new(), PlaceholderPolicy::Unavailable);
        assert!(oura.last_updated >= before);
    }

    #[test]
    fn test_oura_scores() {
        let record = HealthMetricRecord::new()
            .date("2026-10-16T06:00:00Z")
            .sleep_score("87")
            .readiness_score("n/a");

        let oura = OuraMetrics::from_record(&record, PlaceholderPolicy::Unavailable);
        assert_eq!(oura.sleep_score, 87);
        assert_eq!(oura.readiness_score, 0);
        assert_eq!(oura.last_updated.to_rfc3339(), "2026-10-16T06:00:00+00:00");
    }

    #[test]
    fn test_seeded_placeholders_are_reproducible() {
        let record = HealthMetricRecord::new().hrv("50");
        let policy = PlaceholderPolicy::Simulated { seed: Some(7) };

        let a = QuickVitals::from_record(&record, policy);
        let b = QuickVitals::from_record(&record, policy);
        assert_eq!(a, b);

        let hr = a.heart_rate.value().unwrap();
        assert!(HEART_RATE_RANGE.contains(&hr));
        let steps = a.steps.value().unwrap();
        assert!(STEPS_RANGE.contains(&steps));
        assert_eq!(a.hrv, 50);

        let activity = OuraMetrics::from_record(&record, policy)
            .activity_score
            .value()
            .unwrap();
        assert!(ACTIVITY_RANGE.contains(&activity));
    }

    #[test]
    fn test_reading_serializes_as_number_or_null() {
        assert_eq!(serde_json::to_string(&Reading::Value(72)).unwrap(), "72");
        assert_eq!(serde_json::to_string(&Reading::Unavailable).unwrap(), "null");
    }

    #[test]
    fn test_nutrition_progress() {
        let record = HealthMetricRecord::new()
            .calories("1850")
            .protein("170")
            .carbs("0")
            .fat("73");
        let progress = NutritionMetrics::from_record(&record).progress(&NutritionGoals::default());

        assert_eq!(progress[0].label, "Calories");
        assert_eq!(progress[0].remaining, 350);
        assert_eq!(progress[0].over, 0);

        assert_eq!(progress[1].over, 10);
        assert_eq!(progress[1].remaining, 0);
        assert_eq!(progress[1].display_percent(), 100.0);
        assert!(progress[1].percent > 100.0);

        assert_eq!(progress[2].percent, 0.0);
        assert_eq!(progress[3].percent, 100.0);
    }

    #[test]
    fn test_progress_with_extreme_values() {
        let record = HealthMetricRecord::new()
            .calories(FieldValue::Number(-1e30))
            .protein(FieldValue::Number(1e30));
        let progress = NutritionMetrics::from_record(&record).progress(&NutritionGoals::default());

        assert_eq!(progress[0].current, i64::MIN);
        assert_eq!(progress[0].remaining, i64::MAX);
        assert_eq!(progress[0].over, 0);
        assert_eq!(progress[0].display_percent(), 0.0);

        assert_eq!(progress[1].current, i64::MAX);
        assert_eq!(progress[1].remaining, 0);
        assert_eq!(progress[1].over, i64::MAX - 160);
    }

    #[test]
    fn test_zero_goal() {
        let progress = MacroProgress::new("Fats", "g", 10, 0);
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.over, 10);
    }
}
