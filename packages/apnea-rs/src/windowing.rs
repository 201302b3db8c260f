//! Sliding-window view over one recording
//!
//! A recording is a set of equally long named channels sampled at the
//! downsample frequency plus one ground-truth class per sample. Windows are
//! fixed-length, fixed-stride excerpts; each carries the ground-truth labels
//! centred on the window.

use crate::error::{DatasetError, Result};
use crate::types::{empty_histogram, ClassHistogram, GroundTruthClass, WindowTimestamps, NUM_CLASSES};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

pub const SIGNALS_FILE: &str = "signals.csv";
pub const METADATA_FILE: &str = "recording.json";
pub const LABEL_COLUMN: &str = "label";

/// Window geometry shared by every recording of a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidingWindowConfig {
    /// Rate the recordings are decimated to before windowing (Hz)
    pub downsample_frequency_hz: f64,
    /// Window duration in seconds
    pub time_window_size_secs: f64,
    /// Step between consecutive windows, in samples
    pub time_window_stride: usize,
    /// Number of ground-truth labels per window
    pub ground_truth_vector_width: usize,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            downsample_frequency_hz: 5.0,
            time_window_size_secs: 300.0,
            time_window_stride: 11,
            ground_truth_vector_width: 11,
        }
    }
}

impl SlidingWindowConfig {
    /// Window length in samples
    pub fn window_len(&self) -> usize {
        (self.time_window_size_secs * self.downsample_frequency_hz).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !self.downsample_frequency_hz.is_finite() || self.downsample_frequency_hz <= 0.0 {
            return Err(DatasetError::Configuration(format!(
                "downsample_frequency_hz must be positive, got {}",
                self.downsample_frequency_hz
            )));
        }
        if !self.time_window_size_secs.is_finite() || self.window_len() == 0 {
            return Err(DatasetError::Configuration(format!(
                "time_window_size_secs ({}) yields an empty window at {} Hz",
                self.time_window_size_secs, self.downsample_frequency_hz
            )));
        }
        if self.time_window_stride == 0 {
            return Err(DatasetError::Configuration(
                "time_window_stride must be at least 1".to_string(),
            ));
        }
        if self.ground_truth_vector_width == 0 || self.ground_truth_vector_width > self.window_len() {
            return Err(DatasetError::Configuration(format!(
                "ground_truth_vector_width must be in 1..={}, got {}",
                self.window_len(),
                self.ground_truth_vector_width
            )));
        }
        Ok(())
    }
}

/// Sample ranges of one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpan {
    pub start: usize,
    pub len: usize,
    pub gt_start: usize,
    pub gt_len: usize,
}

impl WindowSpan {
    pub fn center(&self) -> usize {
        self.start + self.len / 2
    }
}

/// Recording as read from storage, before decimation
#[derive(Debug, Clone, Default)]
pub struct RawRecording {
    pub sample_rate_hz: f64,
    pub channels: BTreeMap<String, Vec<f64>>,
    pub labels: Vec<GroundTruthClass>,
}

impl RawRecording {
    /// Keep every n-th sample so the result is at `target_hz`
    fn decimate(self, name: &str, target_hz: f64) -> Result<Self> {
        let ratio = self.sample_rate_hz / target_hz;
        let factor = ratio.round();
        if !ratio.is_finite() || factor < 1.0 || (ratio - factor).abs() > 1e-9 {
            return Err(DatasetError::malformed(
                name,
                format!(
                    "sample rate {} Hz is not an integer multiple of {} Hz",
                    self.sample_rate_hz, target_hz
                ),
            ));
        }
        let factor = factor as usize;
        if factor == 1 {
            return Ok(self);
        }

        let channels = self
            .channels
            .into_iter()
            .map(|(name, series)| (name, series.into_iter().step_by(factor).collect()))
            .collect();
        let labels = self.labels.into_iter().step_by(factor).collect();

        Ok(Self {
            sample_rate_hz: target_hz,
            channels,
            labels,
        })
    }
}

/// Windowed, random-access view over one recording
#[derive(Debug, Clone)]
pub struct SlidingWindowRecording {
    name: String,
    config: SlidingWindowConfig,
    channels: BTreeMap<String, Vec<f64>>,
    labels: Vec<GroundTruthClass>,
    gt_histogram: ClassHistogram,
}

impl SlidingWindowRecording {
    pub fn from_raw(
        name: impl Into<String>,
        raw: RawRecording,
        config: &SlidingWindowConfig,
    ) -> Result<Self> {
        let name = name.into();
        config.validate()?;
        let raw = raw.decimate(&name, config.downsample_frequency_hz)?;

        let num_samples = raw.labels.len();
        if let Some((channel, series)) = raw
            .channels
            .iter()
            .find(|(_, series)| series.len() != num_samples)
        {
            return Err(DatasetError::malformed(
                &name,
                format!(
                    "channel '{}' has {} samples but there are {} labels",
                    channel,
                    series.len(),
                    num_samples
                ),
            ));
        }

        let mut recording = Self {
            name,
            config: config.clone(),
            channels: raw.channels,
            labels: raw.labels,
            gt_histogram: empty_histogram(),
        };
        recording.gt_histogram = recording.count_gt_classes();
        Ok(recording)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SlidingWindowConfig {
        &self.config
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.config.downsample_frequency_hz
    }

    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn channel(&self, name: &str) -> Option<&[f64]> {
        self.channels.get(name).map(Vec::as_slice)
    }

    /// Swap in a processed version of a channel; the length must not change
    pub fn replace_channel(&mut self, name: &str, series: Vec<f64>) -> Result<()> {
        let num_samples = self.num_samples();
        let slot = self.channels.get_mut(name).ok_or_else(|| DatasetError::MissingChannel {
            recording: self.name.clone(),
            channel: name.to_string(),
        })?;
        if series.len() != num_samples {
            return Err(DatasetError::malformed(
                &self.name,
                format!(
                    "replacement for channel '{}' has {} samples, expected {}",
                    name,
                    series.len(),
                    num_samples
                ),
            ));
        }
        *slot = series;
        Ok(())
    }

    pub fn window_count(&self) -> usize {
        let window_len = self.config.window_len();
        if self.num_samples() < window_len {
            return 0;
        }
        (self.num_samples() - window_len) / self.config.time_window_stride + 1
    }

    pub fn window_span(&self, index: usize) -> Option<WindowSpan> {
        if index >= self.window_count() {
            return None;
        }
        let len = self.config.window_len();
        let start = index * self.config.time_window_stride;
        let gt_len = self.config.ground_truth_vector_width;
        let gt_start = start + len / 2 - gt_len / 2;
        Some(WindowSpan {
            start,
            len,
            gt_start,
            gt_len,
        })
    }

    pub fn ground_truth(&self, span: &WindowSpan) -> &[GroundTruthClass] {
        &self.labels[span.gt_start..span.gt_start + span.gt_len]
    }

    pub fn timestamps(&self, span: &WindowSpan) -> WindowTimestamps {
        WindowTimestamps {
            center_point: self.offset(span.center()),
            features: (span.start..span.start + span.len)
                .map(|i| self.offset(i))
                .collect(),
            ground_truth: (span.gt_start..span.gt_start + span.gt_len)
                .map(|i| self.offset(i))
                .collect(),
        }
    }

    /// Label counts over the ground-truth vectors of all windows
    pub fn gt_class_occurrences(&self) -> ClassHistogram {
        self.gt_histogram.clone()
    }

    fn count_gt_classes(&self) -> ClassHistogram {
        // Prefix counts per class, so each window costs O(classes)
        let mut prefix = vec![[0usize; NUM_CLASSES]; self.labels.len() + 1];
        for (i, label) in self.labels.iter().enumerate() {
            prefix[i + 1] = prefix[i];
            prefix[i + 1][label.index() as usize] += 1;
        }

        let mut totals = [0usize; NUM_CLASSES];
        for index in 0..self.window_count() {
            if let Some(span) = self.window_span(index) {
                let (lo, hi) = (span.gt_start, span.gt_start + span.gt_len);
                for class in 0..NUM_CLASSES {
                    totals[class] += prefix[hi][class] - prefix[lo][class];
                }
            }
        }

        let mut histogram = empty_histogram();
        for class in GroundTruthClass::ALL {
            histogram.insert(class, totals[class.index() as usize]);
        }
        histogram
    }

    fn offset(&self, sample: usize) -> Duration {
        let micros = (sample as f64 / self.sample_rate_hz() * 1e6).round() as i64;
        Duration::microseconds(micros)
    }
}

/// Provider of windowed recordings, addressed by location
pub trait RecordingSource: Send + Sync {
    fn open(&self, location: &Path, config: &SlidingWindowConfig) -> Result<SlidingWindowRecording>;
}

/// Display name of a recording location
pub fn recording_name(location: &Path) -> String {
    location
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| location.display().to_string())
}

/// Recordings held in memory, keyed by location
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    recordings: HashMap<PathBuf, RawRecording>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, location: impl Into<PathBuf>, recording: RawRecording) {
        self.recordings.insert(location.into(), recording);
    }

    pub fn with_recording(mut self, location: impl Into<PathBuf>, recording: RawRecording) -> Self {
        self.insert(location, recording);
        self
    }
}

impl RecordingSource for InMemorySource {
    fn open(&self, location: &Path, config: &SlidingWindowConfig) -> Result<SlidingWindowRecording> {
        let raw = self.recordings.get(location).cloned().ok_or_else(|| {
            DatasetError::IoError(io::Error::new(
                io::ErrorKind::NotFound,
                format!("No recording registered at {}", location.display()),
            ))
        })?;
        SlidingWindowRecording::from_raw(recording_name(location), raw, config)
    }
}

#[derive(Debug, Deserialize)]
struct RecordingMetadata {
    sample_rate_hz: f64,
}

/// Recording folders holding `signals.csv` and an optional `recording.json`
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRecordingSource;

impl CsvRecordingSource {
    fn read_raw(&self, location: &Path, config: &SlidingWindowConfig) -> Result<RawRecording> {
        let name = recording_name(location);

        let metadata_path = location.join(METADATA_FILE);
        let sample_rate_hz = if metadata_path.is_file() {
            let text = std::fs::read_to_string(&metadata_path)?;
            let metadata: RecordingMetadata = serde_json::from_str(&text)?;
            metadata.sample_rate_hz
        } else {
            config.downsample_frequency_hz
        };

        let mut reader = csv::Reader::from_path(location.join(SIGNALS_FILE))?;
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let label_column = headers
            .iter()
            .position(|h| h == LABEL_COLUMN)
            .ok_or_else(|| {
                DatasetError::malformed(&name, format!("{} has no '{}' column", SIGNALS_FILE, LABEL_COLUMN))
            })?;

        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];
        let mut labels = Vec::new();

        for (row_idx, record) in reader.records().enumerate() {
            let record = record?;
            // Header is line 1
            let line = row_idx + 2;
            for (col_idx, field) in record.iter().enumerate() {
                let field = field.trim();
                if col_idx == label_column {
                    let class = field
                        .parse::<i64>()
                        .map_err(|_| format!("invalid label '{}'", field))
                        .and_then(GroundTruthClass::try_from)
                        .map_err(|e| DatasetError::malformed(&name, format!("line {}: {}", line, e)))?;
                    labels.push(class);
                } else {
                    let value = field.parse::<f64>().map_err(|_| {
                        DatasetError::malformed(
                            &name,
                            format!(
                                "line {}: invalid numeric value '{}' in column '{}'",
                                line, field, headers[col_idx]
                            ),
                        )
                    })?;
                    columns[col_idx].push(value);
                }
            }
        }

        let channels = headers
            .into_iter()
            .zip(columns)
            .enumerate()
            .filter(|(idx, _)| *idx != label_column)
            .map(|(_, pair)| pair)
            .collect();

        Ok(RawRecording {
            sample_rate_hz,
            channels,
            labels,
        })
    }
}

impl RecordingSource for CsvRecordingSource {
    fn open(&self, location: &Path, config: &SlidingWindowConfig) -> Result<SlidingWindowRecording> {
        let raw = self.read_raw(location, config)?;
        SlidingWindowRecording::from_raw(recording_name(location), raw, config)
    }
}
