use crate::error::DatasetError;
use chrono::Duration;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Signals that end up in the feature matrix, in row order
pub const FEATURE_SIGNALS: [SignalName; 4] = [
    SignalName::SaO2,
    SignalName::Abd,
    SignalName::Chest,
    SignalName::Airflow,
];

/// Number of rows in every feature matrix
pub const NUM_FEATURE_SIGNALS: usize = FEATURE_SIGNALS.len();

/// Required polysomnography channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalName {
    #[serde(rename = "SaO2")]
    SaO2,
    #[serde(rename = "ABD")]
    Abd,
    #[serde(rename = "CHEST")]
    Chest,
    #[serde(rename = "AIRFLOW")]
    Airflow,
}

impl SignalName {
    /// Channel name as it appears in recordings
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::SaO2 => "SaO2",
            SignalName::Abd => "ABD",
            SignalName::Chest => "CHEST",
            SignalName::Airflow => "AIRFLOW",
        }
    }

    /// Row of this signal in the feature matrix
    pub fn row(&self) -> usize {
        match self {
            SignalName::SaO2 => 0,
            SignalName::Abd => 1,
            SignalName::Chest => 2,
            SignalName::Airflow => 3,
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalName {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FEATURE_SIGNALS
            .iter()
            .copied()
            .find(|signal| signal.as_str() == s)
            .ok_or_else(|| {
                DatasetError::Configuration(format!(
                    "'{}' is not one of the feature signals {:?}",
                    s,
                    FEATURE_SIGNALS.map(|s| s.as_str())
                ))
            })
    }
}

/// Number of ground-truth classes
pub const NUM_CLASSES: usize = 5;

/// Per-sample respiratory event annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GroundTruthClass {
    NoEvent = 0,
    CentralApnea = 1,
    ObstructiveApnea = 2,
    MixedApnea = 3,
    Hypopnea = 4,
}

impl GroundTruthClass {
    pub const ALL: [GroundTruthClass; NUM_CLASSES] = [
        GroundTruthClass::NoEvent,
        GroundTruthClass::CentralApnea,
        GroundTruthClass::ObstructiveApnea,
        GroundTruthClass::MixedApnea,
        GroundTruthClass::Hypopnea,
    ];

    /// Class index as emitted in ground-truth tensors
    pub fn index(&self) -> i64 {
        *self as i64
    }
}

impl TryFrom<i64> for GroundTruthClass {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        GroundTruthClass::ALL
            .iter()
            .copied()
            .find(|class| class.index() == value)
            .ok_or_else(|| format!("Unknown ground truth class index {}", value))
    }
}

/// Occurrence count per ground-truth class
pub type ClassHistogram = BTreeMap<GroundTruthClass, usize>;

/// Histogram with every known class present and set to zero
pub fn empty_histogram() -> ClassHistogram {
    GroundTruthClass::ALL.iter().map(|&class| (class, 0)).collect()
}

/// Time axes of one sliding window, as offsets from recording start
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTimestamps {
    pub center_point: Duration,
    pub features: Vec<Duration>,
    pub ground_truth: Vec<Duration>,
}

/// One training sample: feature matrix [signals × window length] and
/// class-index ground truth
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub features: Array2<f32>,
    pub ground_truth: Array1<i64>,
}
