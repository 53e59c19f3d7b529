//! Health metric record types
//!
//! This module defines the raw record shape owned by the remote store:
//! - `HealthMetricRecord`: One daily row, every column optional
//! - `FieldValue`: A column value, sent by the platform as text or number
//! - `Field`: The selectable columns and their wire names

use serde::{Deserialize, Serialize};

/// A raw column value as delivered by the record store
///
/// The platform is inconsistent about numeric columns: some tenants send
/// `"87"`, others send `87`. Both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Borrow the value as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

/// A single daily health metric row
///
/// Serialized with the store's logical column names (no tenant prefix).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthMetricRecord {
    /// Primary key assigned by the store
    #[serde(rename = "healthmetricid", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<FieldValue>,

    #[serde(rename = "sleepscore", default, skip_serializing_if = "Option::is_none")]
    pub sleep_score: Option<FieldValue>,

    #[serde(rename = "readinessscore", default, skip_serializing_if = "Option::is_none")]
    pub readiness_score: Option<FieldValue>,

    #[serde(rename = "calorie", default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<FieldValue>,

    /// Heart-rate variability (ms)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hrv: Option<FieldValue>,

    #[serde(rename = "meditationminutes", default, skip_serializing_if = "Option::is_none")]
    pub meditation_minutes: Option<FieldValue>,

    #[serde(rename = "metricname", default, skip_serializing_if = "Option::is_none")]
    pub metric_name: Option<FieldValue>,
}

impl HealthMetricRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the record id
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder method: set the record date
    pub fn date(mut self, date: impl Into<FieldValue>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Builder method: set the sleep score
    pub fn sleep_score(mut self, value: impl Into<FieldValue>) -> Self {
        self.sleep_score = Some(value.into());
        self
    }

    /// Builder method: set the readiness score
    pub fn readiness_score(mut self, value: impl Into<FieldValue>) -> Self {
        self.readiness_score = Some(value.into());
        self
    }

    /// Builder method: set calories
    pub fn calories(mut self, value: impl Into<FieldValue>) -> Self {
        self.calories = Some(value.into());
        self
    }

    /// Builder method: set protein grams
    pub fn protein(mut self, value: impl Into<FieldValue>) -> Self {
        self.protein = Some(value.into());
        self
    }

    /// Builder method: set carbohydrate grams
    pub fn carbs(mut self, value: impl Into<FieldValue>) -> Self {
        self.carbs = Some(value.into());
        self
    }

    /// Builder method: set fat grams
    pub fn fat(mut self, value: impl Into<FieldValue>) -> Self {
        self.fat = Some(value.into());
        self
    }

    /// Builder method: set heart-rate variability
    pub fn hrv(mut self, value: impl Into<FieldValue>) -> Self {
        self.hrv = Some(value.into());
        self
    }

    /// Builder method: set meditation minutes
    pub fn meditation_minutes(mut self, value: impl Into<FieldValue>) -> Self {
        self.meditation_minutes = Some(value.into());
        self
    }

    /// Builder method: set the metric name
    pub fn metric_name(mut self, name: impl Into<FieldValue>) -> Self {
        self.metric_name = Some(name.into());
        self
    }

    /// True when no column besides the id carries a value
    pub fn is_empty(&self) -> bool {
        Field::ALL
            .iter()
            .filter(|f| **f != Field::Id)
            .all(|f| !self.has(*f))
    }

    /// Check whether a column carries a value
    pub fn has(&self, field: Field) -> bool {
        match field {
            Field::Id => self.id.is_some(),
            Field::Date => self.date.is_some(),
            Field::SleepScore => self.sleep_score.is_some(),
            Field::ReadinessScore => self.readiness_score.is_some(),
            Field::Calories => self.calories.is_some(),
            Field::Protein => self.protein.is_some(),
            Field::Carbs => self.carbs.is_some(),
            Field::Fat => self.fat.is_some(),
            Field::Hrv => self.hrv.is_some(),
            Field::MeditationMinutes => self.meditation_minutes.is_some(),
            Field::MetricName => self.metric_name.is_some(),
        }
    }

    /// Copy of this record restricted to the selected columns
    ///
    /// The id always survives, matching how the store returns the primary
    /// key regardless of `$select`.
    pub fn project(&self, fields: &[Field]) -> Self {
        let keep = |f: Field| fields.contains(&f);
        Self {
            id: self.id.clone(),
            date: self.date.clone().filter(|_| keep(Field::Date)),
            sleep_score: self.sleep_score.clone().filter(|_| keep(Field::SleepScore)),
            readiness_score: self
                .readiness_score
                .clone()
                .filter(|_| keep(Field::ReadinessScore)),
            calories: self.calories.clone().filter(|_| keep(Field::Calories)),
            protein: self.protein.clone().filter(|_| keep(Field::Protein)),
            carbs: self.carbs.clone().filter(|_| keep(Field::Carbs)),
            fat: self.fat.clone().filter(|_| keep(Field::Fat)),
            hrv: self.hrv.clone().filter(|_| keep(Field::Hrv)),
            meditation_minutes: self
                .meditation_minutes
                .clone()
                .filter(|_| keep(Field::MeditationMinutes)),
            metric_name: self.metric_name.clone().filter(|_| keep(Field::MetricName)),
        }
    }

    /// Overwrite columns with every value present in `partial`
    pub fn merge(&mut self, partial: &HealthMetricRecord) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(
                    if let Some(v) = &partial.$field {
                        self.$field = Some(v.clone());
                    }
                )*
            };
        }
        take!(
            date,
            sleep_score,
            readiness_score,
            calories,
            protein,
            carbs,
            fat,
            hrv,
            meditation_minutes,
            metric_name
        );
    }
}

/// A selectable column of the health metrics table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Date,
    SleepScore,
    ReadinessScore,
    Calories,
    Protein,
    Carbs,
    Fat,
    Hrv,
    MeditationMinutes,
    MetricName,
}

impl Field {
    /// Every column, in table order
    pub const ALL: [Field; 11] = [
        Field::Id,
        Field::Date,
        Field::SleepScore,
        Field::ReadinessScore,
        Field::Calories,
        Field::Protein,
        Field::Carbs,
        Field::Fat,
        Field::Hrv,
        Field::MeditationMinutes,
        Field::MetricName,
    ];

    /// Logical column name, before any tenant prefix
    pub fn wire_name(&self) -> &'static str {
        match self {
            Field::Id => "healthmetricid",
            Field::Date => "date",
            Field::SleepScore => "sleepscore",
            Field::ReadinessScore => "readinessscore",
            Field::Calories => "calorie",
            Field::Protein => "protein",
            Field::Carbs => "carbs",
            Field::Fat => "fat",
            Field::Hrv => "hrv",
            Field::MeditationMinutes => "meditationminutes",
            Field::MetricName => "metricname",
        }
    }

    /// Look up a column by its logical name
    pub fn from_wire_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.wire_name() == name)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Columns requested when looking for today's record
pub const TODAY_FIELDS: [Field; 10] = [
    Field::Date,
    Field::SleepScore,
    Field::ReadinessScore,
    Field::Calories,
    Field::Protein,
    Field::Carbs,
    Field::Fat,
    Field::Hrv,
    Field::MeditationMinutes,
    Field::MetricName,
];

/// Columns requested for historical charts
pub const HISTORY_FIELDS: [Field; 4] = [
    Field::Date,
    Field::Calories,
    Field::SleepScore,
    Field::ReadinessScore,
];
