use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "revenue-forecast")]
#[command(about = "Forecast weekly billing revenue and explain over/under performance")]
pub struct Args {
    /// Weekly billing sheet exported as .csv, or a JSON array of rows (.json).
    ///
    /// The first row must hold the column headers.
    #[arg(long)]
    pub input: PathBuf,

    /// Directory for weekly_insights.csv, model_comparison.csv and analysis.json.
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Optional JSON file with pipeline settings; omitted keys keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fraction of the most recent weeks held out for model testing.
    #[arg(long)]
    pub test_size: Option<f64>,

    /// Relative deviation (e.g. 0.025 for 2.5%) beyond which a week is over/under performing.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Minimum number of weekly groups required to run the analysis.
    #[arg(long)]
    pub min_weeks: Option<usize>,

    /// Also print the analysis JSON to stdout.
    #[arg(long, default_value_t = false)]
    pub print_json: bool,
}
