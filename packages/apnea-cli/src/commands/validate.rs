use super::read_config;
use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use serde::Serialize;

#[derive(Serialize)]
struct ValidateOutput {
    valid: bool,
    recordings: usize,
    window_len: usize,
    missing_recordings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let config = match read_config(&args.config, None) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let error = config.validate().err().map(|e| e.to_string());
    let missing_recordings: Vec<String> = config
        .recordings
        .iter()
        .filter(|path| !path.is_dir())
        .map(|path| path.display().to_string())
        .collect();

    let out = ValidateOutput {
        valid: error.is_none() && missing_recordings.is_empty(),
        recordings: config.recordings.len(),
        window_len: config.sliding_window.window_len(),
        missing_recordings,
        error,
    };

    if args.json {
        let code = output::print_json(&out, false);
        if code != exit_codes::SUCCESS {
            return code;
        }
    } else if out.valid {
        println!(
            "OK: {} recording(s), window length {} samples",
            out.recordings, out.window_len
        );
    } else {
        if let Some(ref e) = out.error {
            eprintln!("Invalid config: {}", e);
        }
        for path in &out.missing_recordings {
            eprintln!("Missing recording folder: {}", path);
        }
    }

    if out.valid {
        exit_codes::SUCCESS
    } else {
        exit_codes::INPUT_ERROR
    }
}
