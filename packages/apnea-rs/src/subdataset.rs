use crate::conditioning::{first_non_finite, lowpass, NORMALIZED_SAMPLE_RATE};
use crate::error::{DatasetError, Result};
use crate::types::{
    ClassHistogram, GroundTruthClass, SignalName, WindowTimestamps, FEATURE_SIGNALS,
    NUM_FEATURE_SIGNALS,
};
use crate::windowing::{RecordingSource, SlidingWindowConfig, SlidingWindowRecording, WindowSpan};
use std::path::{Path, PathBuf};

/// One window of a sub-dataset, borrowed from its channel data
#[derive(Debug, Clone)]
pub struct WindowSample<'a> {
    /// Feature signal excerpts, indexed by `SignalName::row()`
    pub signals: [&'a [f64]; NUM_FEATURE_SIGNALS],
    pub ground_truth: &'a [GroundTruthClass],
    span: WindowSpan,
    recording: &'a SlidingWindowRecording,
}

impl WindowSample<'_> {
    /// Number of samples per signal
    pub fn len(&self) -> usize {
        self.span.len
    }

    pub fn is_empty(&self) -> bool {
        self.span.len == 0
    }

    pub fn span(&self) -> WindowSpan {
        self.span
    }

    pub fn timestamps(&self) -> WindowTimestamps {
        self.recording.timestamps(&self.span)
    }
}

/// A loaded, conditioned recording exposing its windows by local index
#[derive(Debug, Clone)]
pub struct SubDataset {
    location: PathBuf,
    recording: SlidingWindowRecording,
}

impl SubDataset {
    pub fn open(
        source: &dyn RecordingSource,
        location: &Path,
        config: &SlidingWindowConfig,
    ) -> Result<Self> {
        let recording = source.open(location, config)?;
        Ok(Self::from_recording(location, recording))
    }

    pub fn from_recording(location: impl Into<PathBuf>, recording: SlidingWindowRecording) -> Self {
        Self {
            location: location.into(),
            recording,
        }
    }

    pub fn name(&self) -> &str {
        self.recording.name()
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn recording(&self) -> &SlidingWindowRecording {
        &self.recording
    }

    /// Every required signal must be present as a channel
    pub fn validate_channels(&self, required: &[SignalName]) -> Result<()> {
        match required
            .iter()
            .find(|signal| self.recording.channel(signal.as_str()).is_none())
        {
            Some(missing) => Err(DatasetError::MissingChannel {
                recording: self.name().to_string(),
                channel: missing.as_str().to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Low-pass one channel in place; `None` keeps it as loaded
    pub fn apply_conditioning(
        &mut self,
        signal: SignalName,
        cutoff_factor: Option<f64>,
        order: usize,
    ) -> Result<()> {
        if cutoff_factor.is_none() {
            return Ok(());
        }
        let series = self.channel(signal)?;
        let filtered = lowpass(series, cutoff_factor, NORMALIZED_SAMPLE_RATE, order)?;
        log::debug!(
            "{}: low-pass {} with cutoff factor {:?}",
            self.name(),
            signal,
            cutoff_factor
        );
        self.recording.replace_channel(signal.as_str(), filtered)
    }

    /// Post-conditioning check over all feature signals
    pub fn ensure_finite(&self) -> Result<()> {
        for signal in FEATURE_SIGNALS {
            let series = self.channel(signal)?;
            if let Some(position) = first_non_finite(series.iter().copied()) {
                return Err(DatasetError::NumericIntegrity {
                    recording: self.name().to_string(),
                    detail: format!(
                        "channel {} holds {} at sample {} after conditioning",
                        signal, series[position], position
                    ),
                });
            }
        }
        Ok(())
    }

    /// Number of windows
    pub fn len(&self) -> usize {
        self.recording.window_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_window(&self, local_index: usize) -> Result<WindowSample<'_>> {
        let span = self
            .recording
            .window_span(local_index)
            .ok_or(DatasetError::IndexOutOfRange {
                index: local_index as i64,
                len: self.len(),
            })?;

        let empty: &[f64] = &[];
        let mut signals = [empty; NUM_FEATURE_SIGNALS];
        for signal in FEATURE_SIGNALS {
            signals[signal.row()] = &self.channel(signal)?[span.start..span.start + span.len];
        }

        Ok(WindowSample {
            signals,
            ground_truth: self.recording.ground_truth(&span),
            span,
            recording: &self.recording,
        })
    }

    pub fn gt_class_occurrences(&self) -> ClassHistogram {
        self.recording.gt_class_occurrences()
    }

    fn channel(&self, signal: SignalName) -> Result<&[f64]> {
        self.recording
            .channel(signal.as_str())
            .ok_or_else(|| DatasetError::MissingChannel {
                recording: self.name().to_string(),
                channel: signal.as_str().to_string(),
            })
    }
}
