//! Parallel loading of sub-datasets
//!
//! One task per recording location runs on a dedicated, bounded rayon pool.
//! Results are gathered in input order, and the first failing task aborts
//! the whole load.

use crate::error::{DatasetError, Result};
use crate::subdataset::SubDataset;
use crate::types::{FEATURE_SIGNALS, NUM_FEATURE_SIGNALS};
use crate::windowing::{RecordingSource, SlidingWindowConfig};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Load-time conditioning for the feature signals
#[derive(Debug, Clone, PartialEq)]
pub struct ConditioningPlan {
    /// Low-pass cutoff factor per feature signal, indexed by `SignalName::row()`
    pub cutoff_factors: [Option<f64>; NUM_FEATURE_SIGNALS],
    pub filter_order: usize,
}

/// Callback receiving (completed, total) after every finished task
pub type ProgressFn<'a> = &'a (dyn Fn(usize, usize) + Sync);

/// Logical CPUs available to this process
pub fn available_parallelism() -> usize {
    num_cpus::get().max(1)
}

/// Worker count for loading: all CPUs but one by default, never below one
/// and never above the available parallelism
pub fn resolve_worker_count(requested: Option<usize>) -> Result<usize> {
    let available = available_parallelism();
    match requested {
        None => Ok(available.saturating_sub(1).max(1)),
        Some(count) if count >= 1 && count <= available => Ok(count),
        Some(count) => Err(DatasetError::Configuration(format!(
            "Worker count must be in 1..={}, got {}",
            available, count
        ))),
    }
}

/// Open, validate and condition a single recording
pub fn load_one(
    source: &dyn RecordingSource,
    location: &Path,
    windowing: &SlidingWindowConfig,
    plan: &ConditioningPlan,
) -> Result<SubDataset> {
    let mut dataset = SubDataset::open(source, location, windowing)?;
    dataset.validate_channels(&FEATURE_SIGNALS)?;

    for signal in FEATURE_SIGNALS {
        dataset.apply_conditioning(signal, plan.cutoff_factors[signal.row()], plan.filter_order)?;
    }
    dataset.ensure_finite()?;

    if dataset.is_empty() {
        log::warn!(
            "Recording '{}' is shorter than one window and contributes no samples",
            dataset.name()
        );
    }
    Ok(dataset)
}

/// Load every location on `worker_count` threads, preserving input order
pub fn load_all(
    source: &dyn RecordingSource,
    locations: &[PathBuf],
    windowing: &SlidingWindowConfig,
    plan: &ConditioningPlan,
    worker_count: usize,
    progress: ProgressFn<'_>,
) -> Result<Vec<SubDataset>> {
    if worker_count == 0 {
        return Err(DatasetError::Configuration(
            "Worker count must be at least 1".to_string(),
        ));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .thread_name(|i| format!("apnea-loader-{}", i))
        .build()
        .map_err(|e| DatasetError::WorkerPool(e.to_string()))?;

    let total = locations.len();
    let completed = AtomicUsize::new(0);
    crate::profile_scope!("parallel load", total);

    log::info!(
        "Loading {} recording(s) with {} worker(s)",
        total,
        worker_count
    );

    pool.install(|| {
        locations
            .par_iter()
            .map(|location| {
                let result = load_one(source, location, windowing, plan);
                if let Err(ref e) = result {
                    log::error!("Failed to load {}: {}", location.display(), e);
                }
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                progress(done, total);
                result
            })
            .collect::<Result<Vec<SubDataset>>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroundTruthClass, SignalName};
    use crate::windowing::{InMemorySource, RawRecording};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn windowing() -> SlidingWindowConfig {
        SlidingWindowConfig {
            downsample_frequency_hz: 1.0,
            time_window_size_secs: 4.0,
            time_window_stride: 1,
            ground_truth_vector_width: 2,
        }
    }

    fn plan() -> ConditioningPlan {
        ConditioningPlan {
            cutoff_factors: [None, Some(0.2), Some(0.2), Some(0.1)],
            filter_order: 5,
        }
    }

    fn raw(num_samples: usize, signals: &[SignalName]) -> RawRecording {
        let channels: BTreeMap<String, Vec<f64>> = signals
            .iter()
            .map(|s| (s.as_str().to_string(), (0..num_samples).map(|i| (i as f64).sin()).collect()))
            .collect();
        RawRecording {
            sample_rate_hz: 1.0,
            channels,
            labels: vec![GroundTruthClass::NoEvent; num_samples],
        }
    }

    fn locations(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("rec-{:02}", i))).collect()
    }

    #[test]
    fn test_default_worker_count_is_bounded() {
        let workers = resolve_worker_count(None).unwrap();
        assert!(workers >= 1);
        assert!(workers <= available_parallelism());
    }

    #[test]
    fn test_worker_count_out_of_bounds() {
        assert!(matches!(
            resolve_worker_count(Some(0)),
            Err(DatasetError::Configuration(_))
        ));
        assert!(resolve_worker_count(Some(available_parallelism() + 1)).is_err());
        assert_eq!(resolve_worker_count(Some(1)).unwrap(), 1);
    }

    #[test]
    fn test_load_all_preserves_input_order() {
        let locations = locations(12);
        let mut source = InMemorySource::new();
        for (i, location) in locations.iter().enumerate() {
            // Distinct lengths identify each recording
            source.insert(location.clone(), raw(10 + i, &FEATURE_SIGNALS));
        }

        let workers = available_parallelism().min(4);
        let datasets = load_all(&source, &locations, &windowing(), &plan(), workers, &|_, _| {}).unwrap();

        assert_eq!(datasets.len(), locations.len());
        for (i, dataset) in datasets.iter().enumerate() {
            assert_eq!(dataset.location(), locations[i].as_path());
            assert_eq!(dataset.len(), 10 + i - 4 + 1);
        }
    }

    #[test]
    fn test_load_all_reports_progress() {
        let locations = locations(5);
        let mut source = InMemorySource::new();
        for location in &locations {
            source.insert(location.clone(), raw(8, &FEATURE_SIGNALS));
        }

        let seen = Mutex::new(Vec::new());
        load_all(&source, &locations, &windowing(), &plan(), 2, &|done, total| {
            seen.lock().unwrap().push((done, total));
        })
        .unwrap();

        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen, (1..=5).map(|done| (done, 5)).collect::<Vec<_>>());
    }

    #[test]
    fn test_missing_channel_aborts_load() {
        let locations = locations(4);
        let mut source = InMemorySource::new();
        for (i, location) in locations.iter().enumerate() {
            let signals: &[SignalName] = if i == 2 {
                &[SignalName::SaO2, SignalName::Abd, SignalName::Airflow]
            } else {
                &FEATURE_SIGNALS
            };
            source.insert(location.clone(), raw(16, signals));
        }

        let result = load_all(&source, &locations, &windowing(), &plan(), 2, &|_, _| {});
        match result {
            Err(DatasetError::MissingChannel { recording, channel }) => {
                assert_eq!(recording, "rec-02");
                assert_eq!(channel, "CHEST");
            }
            other => panic!("expected MissingChannel, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_non_finite_input_aborts_load() {
        let locations = locations(1);
        let mut recording = raw(16, &FEATURE_SIGNALS);
        recording.channels.get_mut("SaO2").unwrap()[5] = f64::INFINITY;
        let source = InMemorySource::new().with_recording(locations[0].clone(), recording);

        let result = load_all(&source, &locations, &windowing(), &plan(), 1, &|_, _| {});
        assert!(matches!(result, Err(DatasetError::NumericIntegrity { .. })));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let source = InMemorySource::new();
        let result = load_all(&source, &[], &windowing(), &plan(), 0, &|_, _| {});
        assert!(matches!(result, Err(DatasetError::Configuration(_))));
    }
}
