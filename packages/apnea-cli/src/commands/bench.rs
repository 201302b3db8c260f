use super::{exit_code_for, load_dataset};
use crate::cli::BenchArgs;
use crate::exit_codes;
use crate::output;
use serde::Serialize;
use std::time::Instant;

#[derive(Serialize)]
struct BenchOutput {
    windows: usize,
    cycles: usize,
    load_secs: f64,
    access_secs: f64,
    per_cycle_secs: f64,
    per_index_us: f64,
    samples_per_sec: f64,
}

pub fn execute(args: BenchArgs) -> i32 {
    if args.cycles == 0 {
        eprintln!("Error: --cycles must be at least 1");
        return exit_codes::INPUT_ERROR;
    }

    let load_start = Instant::now();
    let dataset = match load_dataset(&args.dataset) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let load_secs = load_start.elapsed().as_secs_f64();

    let access_start = Instant::now();
    for cycle in 0..args.cycles {
        for index in 0..dataset.len() as i64 {
            if let Err(e) = dataset.get_item(index) {
                eprintln!("Error: cycle {}: {}", cycle + 1, e);
                return exit_code_for(&e);
            }
        }
        log::info!("Finished cycle {}/{}", cycle + 1, args.cycles);
    }
    let access_secs = access_start.elapsed().as_secs_f64();

    let accessed = (dataset.len() * args.cycles) as f64;
    let out = BenchOutput {
        windows: dataset.len(),
        cycles: args.cycles,
        load_secs,
        access_secs,
        per_cycle_secs: access_secs / args.cycles as f64,
        per_index_us: if accessed > 0.0 {
            access_secs * 1e6 / accessed
        } else {
            0.0
        },
        samples_per_sec: if access_secs > 0.0 {
            accessed / access_secs
        } else {
            0.0
        },
    };

    if args.json {
        return output::print_json(&out, false);
    }

    println!("Loaded {} windows in {:.3}s", out.windows, out.load_secs);
    println!(
        "{} cycle(s) in {:.3}s ({:.3}s per cycle)",
        out.cycles, out.access_secs, out.per_cycle_secs
    );
    println!(
        "{:.1}us per index ({:.1} samples/s)",
        out.per_index_us, out.samples_per_sec
    );
    exit_codes::SUCCESS
}
