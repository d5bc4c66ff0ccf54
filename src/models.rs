use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub days: Vec<DayObservation>,
}

impl CycleRecord {
    pub fn is_completed(&self) -> bool {
        self.end_date.is_some()
    }
}

/// One day's log inside a cycle. Every field but the date is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayObservation {
    pub date: NaiveDate,
    /// Basal body temperature in °F.
    pub temperature_f: Option<f64>,
    pub mucus: Option<MucusCategory>,
    pub ovulation_test: Option<OvulationTest>,
    pub flow: Option<FlowIntensity>,
}

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant { kind: $kind, value: other.to_string() }),
                }
            }
        }
    };
}

text_enum!(MucusCategory, "mucus category", {
    Dry => "dry",
    Sticky => "sticky",
    Creamy => "creamy",
    Watery => "watery",
    EggWhite => "egg_white",
});

text_enum!(OvulationTest, "ovulation test result", {
    Negative => "negative",
    Positive => "positive",
});

text_enum!(FlowIntensity, "flow intensity", {
    Spotting => "spotting",
    Light => "light",
    Medium => "medium",
    Heavy => "heavy",
});

#[derive(Debug, Deserialize)]
pub struct NewCycle {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct CloseCycleRequest {
    pub end_date: NaiveDate,
}

/// Raw semen analysis values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpermMeasurements {
    /// million/ml
    pub count: f64,
    /// % progressive + non-progressive
    pub motility: f64,
    /// % normal forms
    pub morphology: f64,
    /// ml
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpermTestRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub measurements: SpermMeasurements,
}

#[derive(Debug, Deserialize)]
pub struct NewSpermTest {
    pub user_id: Uuid,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub measurements: SpermMeasurements,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FertilityStatus {
    Peak,
    High,
    Medium,
    Low,
    Unknown,
}

/// Outcome of the ovulation estimator. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Prediction {
    /// Fewer than two completed cycles on record.
    Insufficient,
    Predicted(CyclePrediction),
}

impl Prediction {
    pub fn fertility_status(&self) -> FertilityStatus {
        match self {
            Prediction::Insufficient => FertilityStatus::Unknown,
            Prediction::Predicted(p) => p.fertility_status,
        }
    }

    pub fn predicted(&self) -> Option<&CyclePrediction> {
        match self {
            Prediction::Insufficient => None,
            Prediction::Predicted(p) => Some(p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CyclePrediction {
    pub predicted_ovulation_date: NaiveDate,
    pub predicted_period_date: NaiveDate,
    pub average_cycle_length: i64,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
    pub fertility_status: FertilityStatus,
}

#[derive(Debug, Serialize)]
pub struct CycleSummary {
    pub cycle_day: i64,
    pub start_date: NaiveDate,
    pub fertility_status: FertilityStatus,
    pub in_fertile_window: bool,
    pub period_expected_in_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct BleedingEpisode {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<BleedingDay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BleedingDay {
    pub date: NaiveDate,
    pub intensity: FlowIntensity,
}

#[derive(Debug, Serialize)]
pub struct CycleStat {
    pub cycle_number: usize,
    pub start_date: NaiveDate,
    pub period_length: Option<i64>,
    pub cycle_length: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CycleStatsReport {
    pub average_period_length: f64,
    pub average_cycle_length: f64,
    pub cycle_stats: Vec<CycleStat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpermHealthBand {
    Poor,
    Fair,
    Normal,
    Excellent,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredSpermTest {
    #[serde(flatten)]
    pub test: SpermTestRecord,
    pub score: u8,
    pub band: SpermHealthBand,
}
