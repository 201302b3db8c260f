pub mod conditioning;
pub mod dataset;
pub mod error;
pub mod filters;
pub mod loader;
pub mod profiling;
pub mod resolver;
pub mod split;
pub mod subdataset;
pub mod types;
pub mod windowing;

pub use chrono;
pub use ndarray;

pub use dataset::{AggregatedDataset, DatasetConfig, NoiseConfig, SampleDataset};
pub use error::{DatasetError, Result};
pub use loader::ProgressFn;
pub use resolver::{IndexResolver, ResolvedIndex};
pub use split::{split_recording_folders, FolderSplit};
pub use subdataset::{SubDataset, WindowSample};
pub use types::*;
pub use windowing::{
    CsvRecordingSource, InMemorySource, RawRecording, RecordingSource, SlidingWindowConfig,
    SlidingWindowRecording,
};
