use super::exit_code_for;
use crate::cli::SplitArgs;
use crate::exit_codes;
use crate::output;
use apnea_rs::split_recording_folders;
use std::path::Path;

pub fn execute(args: SplitArgs) -> i32 {
    let split = match split_recording_folders(Path::new(&args.folder), args.ratio) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code_for(&e);
        }
    };

    if args.json {
        return output::print_json(&split, false);
    }

    println!("train ({}):", split.train.len());
    for path in &split.train {
        println!("  {}", path.display());
    }
    println!("test ({}):", split.test.len());
    for path in &split.test {
        println!("  {}", path.display());
    }
    exit_codes::SUCCESS
}
