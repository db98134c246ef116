mod args;

use anyhow::{Context, Result};
use clap::Parser;

use args::Args;
use revenue_forecast::{PipelineConfig, cells::load_cells, report::write_reports, run_pipeline};

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(test_size) = args.test_size {
        config.test_size = test_size;
    }
    if let Some(threshold) = args.threshold {
        config.classification_threshold = threshold;
    }
    if let Some(min_weeks) = args.min_weeks {
        config.min_weeks = min_weeks;
    }
    config.validate().context("Invalid pipeline settings")?;
    Ok(config)
}

fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    tracing::info!("Reading {}", args.input.display());
    let rows = load_cells(&args.input)
        .with_context(|| format!("Failed loading {}", args.input.display()))?;
    let t0 = std::time::Instant::now();
    let result = run_pipeline(&rows, &config).context("analysis failed")?;
    tracing::info!("Analysis finished in {:.2}s", t0.elapsed().as_secs_f64());

    let written = write_reports(&args.output_dir, &result)?;
    for path in &written {
        tracing::info!("Wrote {}", path.display());
    }

    if args.print_json {
        let json = serde_json::to_string_pretty(&result).context("Failed serializing analysis")?;
        println!("{json}");
    }

    let dist = &result.distribution;
    println!(
        "Best model: {} (test MAE ${:.2}, R² {:.4})",
        result.best_model.model_name, result.best_model.mae, result.best_model.r_squared
    );
    println!(
        "Weeks: {} | avg accuracy {:.1}% | over {} / average {} / under {}",
        result.benchmarks.total_weeks,
        result.benchmarks.avg_accuracy,
        dist.over,
        dist.average,
        dist.under
    );
    Ok(())
}
