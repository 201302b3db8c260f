use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "apnea",
    version,
    about = "Aggregated sliding-window datasets over respiratory recordings",
    long_about = "Load many windowed polysomnography recordings as one indexable dataset.\n\
                  Recordings are folders with signals.csv (and optionally recording.json);\n\
                  datasets are described by a JSON config file."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load a dataset and summarize its size and class balance
    Info(InfoArgs),
    /// Print one sample (features and ground truth)
    Sample(SampleArgs),
    /// Time sequential access over the whole dataset
    Bench(BenchArgs),
    /// Split the recording folders of a data directory into train/test
    Split(SplitArgs),
    /// Check a dataset config without loading recordings
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct DatasetArgs {
    /// Dataset config file (JSON)
    #[arg(long, env = "APNEA_DATASET_CONFIG")]
    pub config: String,

    /// Override the loader worker count
    #[arg(long)]
    pub workers: Option<usize>,

    /// Suppress load progress on stderr
    #[arg(long, short)]
    pub quiet: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SampleArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Sample index; negative values count from the end
    #[arg(long, allow_negative_numbers = true)]
    pub index: i64,

    /// Include the window time axes
    #[arg(long)]
    pub timestamps: bool,

    /// Compact JSON output
    #[arg(long)]
    pub compact: bool,

    /// Write the sample to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<String>,
}

#[derive(Args)]
pub struct BenchArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Full passes over the dataset
    #[arg(long, default_value_t = 1)]
    pub cycles: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Directory whose sub-folders are recordings
    #[arg(long)]
    pub folder: String,

    /// Fraction of recordings assigned to training
    #[arg(long, default_value_t = 0.7)]
    pub ratio: f64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Dataset config file (JSON)
    #[arg(long)]
    pub config: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
