use super::load_dataset;
use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;
use apnea_rs::{ClassHistogram, GroundTruthClass};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct RecordingInfo {
    name: String,
    location: String,
    windows: usize,
    first_index: usize,
}

#[derive(Serialize)]
struct InfoOutput {
    total_windows: usize,
    recordings: Vec<RecordingInfo>,
    feature_shape: [usize; 2],
    ground_truth_len: usize,
    class_occurrences: ClassHistogram,
    class_weights: BTreeMap<GroundTruthClass, f32>,
}

pub fn execute(args: InfoArgs) -> i32 {
    let dataset = match load_dataset(&args.dataset) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let mut first_index = 0;
    let recordings = dataset
        .sub_datasets()
        .iter()
        .map(|sub| {
            let info = RecordingInfo {
                name: sub.name().to_string(),
                location: sub.location().display().to_string(),
                windows: sub.len(),
                first_index,
            };
            first_index += sub.len();
            info
        })
        .collect();

    let (rows, cols) = dataset.feature_shape();
    let info = InfoOutput {
        total_windows: dataset.len(),
        recordings,
        feature_shape: [rows, cols],
        ground_truth_len: dataset.ground_truth_len(),
        class_occurrences: dataset.gt_class_occurrences(),
        class_weights: GroundTruthClass::ALL
            .into_iter()
            .zip(dataset.class_weights())
            .collect(),
    };

    if args.json {
        return output::print_json(&info, false);
    }

    println!("Windows: {}", info.total_windows);
    println!("Feature shape: {} x {}", rows, cols);
    println!("Ground truth length: {}", info.ground_truth_len);
    println!();
    println!("Recordings ({}):", info.recordings.len());
    for rec in &info.recordings {
        println!(
            "  {:<24} {:>8} windows  (from index {})",
            rec.name, rec.windows, rec.first_index
        );
    }
    println!();
    println!("Ground truth classes:");
    for class in GroundTruthClass::ALL {
        println!(
            "  {:<18} {:>10}  weight {:.3e}",
            format!("{:?}", class),
            info.class_occurrences.get(&class).copied().unwrap_or(0),
            info.class_weights.get(&class).copied().unwrap_or(0.0)
        );
    }

    exit_codes::SUCCESS
}
