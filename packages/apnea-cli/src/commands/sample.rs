use super::{exit_code_for, load_dataset};
use crate::cli::SampleArgs;
use crate::output;
use serde::Serialize;

#[derive(Serialize)]
struct TimestampsOutput {
    center_point_secs: f64,
    features_secs: Vec<f64>,
    ground_truth_secs: Vec<f64>,
}

#[derive(Serialize)]
struct SampleOutput {
    index: i64,
    recording: String,
    dataset_index: usize,
    dataset_internal_index: usize,
    features: Vec<Vec<f32>>,
    ground_truth: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamps: Option<TimestampsOutput>,
}

pub fn execute(args: SampleArgs) -> i32 {
    let dataset = match load_dataset(&args.dataset) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let fetched = dataset.resolve(args.index).and_then(|resolved| {
        let sample = dataset.get_item(args.index)?;
        let timestamps = if args.timestamps {
            Some(dataset.get_window_timestamps(args.index)?)
        } else {
            None
        };
        Ok((resolved, sample, timestamps))
    });

    let (resolved, sample, timestamps) = match fetched {
        Ok(parts) => parts,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code_for(&e);
        }
    };

    let out = SampleOutput {
        index: args.index,
        recording: dataset.sub_datasets()[resolved.ordinal].name().to_string(),
        dataset_index: resolved.ordinal,
        dataset_internal_index: resolved.local,
        features: sample.features.rows().into_iter().map(|row| row.to_vec()).collect(),
        ground_truth: sample.ground_truth.to_vec(),
        timestamps: timestamps.map(|ts| TimestampsOutput {
            center_point_secs: output::seconds(&ts.center_point),
            features_secs: ts.features.iter().map(output::seconds).collect(),
            ground_truth_secs: ts.ground_truth.iter().map(output::seconds).collect(),
        }),
    };

    output::emit_json(&out, args.compact, args.output.as_deref())
}
