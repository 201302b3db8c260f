pub mod bench;
pub mod info;
pub mod sample;
pub mod split;
pub mod validate;

use crate::cli::DatasetArgs;
use crate::exit_codes;
use apnea_rs::{AggregatedDataset, CsvRecordingSource, DatasetConfig, DatasetError};
use std::path::Path;

/// Exit code for a library error
pub fn exit_code_for(error: &DatasetError) -> i32 {
    match error {
        DatasetError::Configuration(_)
        | DatasetError::IndexOutOfRange { .. }
        | DatasetError::JsonError(_)
        | DatasetError::IoError(_) => exit_codes::INPUT_ERROR,
        _ => exit_codes::DATA_ERROR,
    }
}

pub fn read_config(path: &str, workers: Option<usize>) -> Result<DatasetConfig, i32> {
    let mut config = DatasetConfig::from_json_file(Path::new(path)).map_err(|e| {
        eprintln!("Error: Failed to read config '{}': {}", path, e);
        exit_code_for(&e)
    })?;
    if workers.is_some() {
        config.workers = workers;
    }
    Ok(config)
}

/// Read the config and load every recording, printing `[k/n]` progress
pub fn load_dataset(args: &DatasetArgs) -> Result<AggregatedDataset, i32> {
    let config = read_config(&args.config, args.workers)?;
    let quiet = args.quiet;
    let progress = move |done: usize, total: usize| {
        if !quiet {
            eprintln!("[{}/{}] Loading recordings...", done, total);
        }
    };

    AggregatedDataset::with_progress(config, &CsvRecordingSource, &progress).map_err(|e| {
        eprintln!("Error: {}", e);
        exit_code_for(&e)
    })
}
