//! Aggregated, randomly indexable dataset over many recordings
//!
//! Construction loads every recording in parallel and freezes the sub-dataset
//! list together with its index resolver. Afterwards the dataset is
//! read-only: sample access only reads immutable state, so it can be shared
//! across threads without locking.

use crate::conditioning::{
    normalize_robust, validate_filter_order, validate_lowpass, NORMALIZED_SAMPLE_RATE,
};
use crate::error::{DatasetError, Result};
use crate::loader::{load_all, resolve_worker_count, ConditioningPlan, ProgressFn};
use crate::profiling::ProfileScope;
use crate::resolver::{IndexResolver, ResolvedIndex};
use crate::subdataset::SubDataset;
use crate::types::{
    empty_histogram, ClassHistogram, GroundTruthClass, Sample, SignalName, WindowTimestamps,
    FEATURE_SIGNALS, NUM_FEATURE_SIGNALS,
};
use crate::windowing::{CsvRecordingSource, RecordingSource, SlidingWindowConfig};
use ndarray::{Array1, Array2};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Gaussian input noise added on every access
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseConfig {
    pub mean: f64,
    pub std: f64,
}

impl NoiseConfig {
    pub fn distribution(&self) -> Result<Normal<f32>> {
        // Samples are drawn in f32, so both values must survive the narrowing
        let (mean, std) = (self.mean as f32, self.std as f32);
        if !mean.is_finite() || !std.is_finite() || std < 0.0 {
            return Err(DatasetError::Configuration(format!(
                "Noise needs a finite mean and a finite, non-negative std in f32 range; got mean={}, std={}",
                self.mean, self.std
            )));
        }
        Normal::new(mean, std)
            .map_err(|e| DatasetError::Configuration(format!("Invalid noise parameters: {}", e)))
    }
}

/// Configuration of an [`AggregatedDataset`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub sliding_window: SlidingWindowConfig,

    /// Recording locations, in flat-index order
    pub recordings: Vec<PathBuf>,

    /// Input noise augmentation; disabled when absent
    #[serde(default)]
    pub noise: Option<NoiseConfig>,

    /// Low-pass cutoff factor (relative to the sample rate) per signal.
    /// Missing or null entries leave the signal unfiltered.
    #[serde(default = "default_lowpass_cutoff_factors")]
    pub lowpass_cutoff_factors: BTreeMap<SignalName, Option<f64>>,

    /// Signals that are robust-normalized per window
    #[serde(default = "default_normalize_signals")]
    pub normalize_signals: Vec<SignalName>,

    #[serde(default = "default_filter_order")]
    pub filter_order: usize,

    /// Loader worker count; all CPUs but one when absent
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_lowpass_cutoff_factors() -> BTreeMap<SignalName, Option<f64>> {
    BTreeMap::from([
        (SignalName::SaO2, None),
        (SignalName::Abd, Some(0.2)),
        (SignalName::Chest, Some(0.2)),
        (SignalName::Airflow, Some(0.1)),
    ])
}

fn default_normalize_signals() -> Vec<SignalName> {
    vec![SignalName::Airflow, SignalName::Abd, SignalName::Chest]
}

fn default_filter_order() -> usize {
    crate::conditioning::DEFAULT_FILTER_ORDER
}

impl DatasetConfig {
    pub fn new(sliding_window: SlidingWindowConfig, recordings: Vec<PathBuf>) -> Self {
        Self {
            sliding_window,
            recordings,
            noise: None,
            lowpass_cutoff_factors: default_lowpass_cutoff_factors(),
            normalize_signals: default_normalize_signals(),
            filter_order: default_filter_order(),
            workers: None,
        }
    }

    pub fn with_noise(mut self, mean: f64, std: f64) -> Self {
        self.noise = Some(NoiseConfig { mean, std });
        self
    }

    /// Parse a JSON config. Relative recording paths are kept as written.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DatasetError::Configuration(format!("Invalid dataset config: {}", e)))
    }

    /// Load a JSON config; relative recording paths resolve against the
    /// config file's directory
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json_str(&text)?;
        if let Some(base) = path.parent() {
            for location in &mut config.recordings {
                if location.is_relative() {
                    *location = base.join(&*location);
                }
            }
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.sliding_window.validate()?;

        if self.recordings.is_empty() {
            return Err(DatasetError::Configuration(
                "At least one recording location is required".to_string(),
            ));
        }

        validate_filter_order(self.filter_order)?;
        for cutoff in self.lowpass_cutoff_factors.values().flatten() {
            validate_lowpass(*cutoff, NORMALIZED_SAMPLE_RATE, self.filter_order)?;
        }

        if let Some(noise) = &self.noise {
            noise.distribution()?;
        }
        resolve_worker_count(self.workers)?;
        Ok(())
    }

    pub fn conditioning_plan(&self) -> ConditioningPlan {
        ConditioningPlan {
            cutoff_factors: FEATURE_SIGNALS
                .map(|signal| self.lowpass_cutoff_factors.get(&signal).copied().flatten()),
            filter_order: self.filter_order,
        }
    }
}

/// Dataset abstraction consumed by training and inference loops
pub trait SampleDataset: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `index`; negative indices count from the end
    fn get_item(&self, index: i64) -> Result<Sample>;

    fn gt_class_occurrences(&self) -> ClassHistogram;
}

/// Map a possibly negative index into `[0, len)`
pub fn normalize_index(index: i64, len: usize) -> Result<usize> {
    let signed_len = len as i64;
    let normalized = if index < 0 { index + signed_len } else { index };
    if normalized < 0 || normalized >= signed_len {
        return Err(DatasetError::IndexOutOfRange { index, len });
    }
    Ok(normalized as usize)
}

/// Sub-datasets of many recordings behind one flat index
#[derive(Debug)]
pub struct AggregatedDataset {
    config: DatasetConfig,
    datasets: Vec<SubDataset>,
    resolver: IndexResolver,
    normalize_rows: [bool; NUM_FEATURE_SIGNALS],
    noise: Option<Normal<f32>>,
}

impl AggregatedDataset {
    /// Load recordings from CSV recording folders
    pub fn new(config: DatasetConfig) -> Result<Self> {
        Self::with_source(config, &CsvRecordingSource)
    }

    pub fn with_source(config: DatasetConfig, source: &dyn RecordingSource) -> Result<Self> {
        Self::with_progress(config, source, &|done, total| {
            log::debug!("Loaded {}/{} recordings", done, total);
        })
    }

    pub fn with_progress(
        config: DatasetConfig,
        source: &dyn RecordingSource,
        progress: ProgressFn<'_>,
    ) -> Result<Self> {
        config.validate()?;
        let _profile = ProfileScope::new("dataset construction", config.recordings.len());

        let workers = resolve_worker_count(config.workers)?;
        let noise = config.noise.as_ref().map(NoiseConfig::distribution).transpose()?;

        let datasets = load_all(
            source,
            &config.recordings,
            &config.sliding_window,
            &config.conditioning_plan(),
            workers,
            progress,
        )?;

        let lengths = datasets.iter().map(SubDataset::len).collect();
        let resolver = IndexResolver::build(lengths)?;

        let mut normalize_rows = [false; NUM_FEATURE_SIGNALS];
        for signal in &config.normalize_signals {
            normalize_rows[signal.row()] = true;
        }

        log::info!(
            "Dataset ready: {} windows from {} recordings",
            resolver.total(),
            datasets.len()
        );

        Ok(Self {
            config,
            datasets,
            resolver,
            normalize_rows,
            noise,
        })
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Total number of windows
    pub fn len(&self) -> usize {
        self.resolver.total()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sub_datasets(&self) -> &[SubDataset] {
        &self.datasets
    }

    /// Window count per sub-dataset, in load order
    pub fn lengths(&self) -> &[usize] {
        self.resolver.lengths()
    }

    /// (signals, samples per window) of every feature matrix
    pub fn feature_shape(&self) -> (usize, usize) {
        (NUM_FEATURE_SIGNALS, self.config.sliding_window.window_len())
    }

    /// Labels per ground-truth vector
    pub fn ground_truth_len(&self) -> usize {
        self.config.sliding_window.ground_truth_vector_width
    }

    /// Sub-dataset and local position behind a (possibly negative) index
    pub fn resolve(&self, index: i64) -> Result<ResolvedIndex> {
        let global = normalize_index(index, self.len())?;
        self.resolver.resolve(global)
    }

    pub fn get_item(&self, index: i64) -> Result<Sample> {
        let resolved = self.resolve(index)?;
        let dataset = &self.datasets[resolved.ordinal];
        let window = dataset.get_window(resolved.local)?;

        let mut features = Array2::<f32>::zeros((NUM_FEATURE_SIGNALS, window.len()));
        for (row, signal) in window.signals.iter().enumerate() {
            let mut target = features.row_mut(row);
            if self.normalize_rows[row] {
                for (t, v) in target.iter_mut().zip(normalize_robust(signal)) {
                    *t = v as f32;
                }
            } else {
                for (t, &v) in target.iter_mut().zip(signal.iter()) {
                    *t = v as f32;
                }
            }
        }

        let ground_truth: Array1<i64> = window
            .ground_truth
            .iter()
            .map(GroundTruthClass::index)
            .collect();

        if let Some(noise) = &self.noise {
            let mut rng = rand::rng();
            features.mapv_inplace(|v| v + noise.sample(&mut rng));
        }

        if let Some(position) = features.iter().position(|v| !v.is_finite()) {
            let width = window.len();
            return Err(DatasetError::NumericIntegrity {
                recording: dataset.name().to_string(),
                detail: format!(
                    "feature {}[{}] is not finite; index={}, dataset_index={}, dataset_internal_index={}, location={}",
                    FEATURE_SIGNALS[position / width],
                    position % width,
                    index,
                    resolved.ordinal,
                    resolved.local,
                    dataset.location().display()
                ),
            });
        }

        Ok(Sample {
            features,
            ground_truth,
        })
    }

    /// Time axes of the window behind `index`
    pub fn get_window_timestamps(&self, index: i64) -> Result<WindowTimestamps> {
        let resolved = self.resolve(index)?;
        let window = self.datasets[resolved.ordinal].get_window(resolved.local)?;
        Ok(window.timestamps())
    }

    /// Label counts summed over all sub-datasets; every class is present
    pub fn gt_class_occurrences(&self) -> ClassHistogram {
        let mut total = empty_histogram();
        for dataset in &self.datasets {
            for (class, count) in dataset.gt_class_occurrences() {
                *total.entry(class).or_insert(0) += count;
            }
        }
        total
    }

    /// Inverse class frequencies in class-index order; absent classes get 0
    pub fn class_weights(&self) -> Vec<f32> {
        let occurrences = self.gt_class_occurrences();
        GroundTruthClass::ALL
            .iter()
            .map(|class| match occurrences.get(class).copied().unwrap_or(0) {
                0 => 0.0,
                count => 1.0 / count as f32,
            })
            .collect()
    }
}

impl SampleDataset for AggregatedDataset {
    fn len(&self) -> usize {
        AggregatedDataset::len(self)
    }

    fn get_item(&self, index: i64) -> Result<Sample> {
        AggregatedDataset::get_item(self, index)
    }

    fn gt_class_occurrences(&self) -> ClassHistogram {
        AggregatedDataset::gt_class_occurrences(self)
    }
}
