//! The `lumen convert` command: intake, run, live progress, summary.

use clap::{Args, ValueEnum};
use std::path::PathBuf;

use lumen_core::{Config, JobStatus, Lumen, OutputFormat, RunEvent, RunSummary};

/// Arguments for the `convert` command.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Image files or directories to convert
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Destination directory (defaults to `general.destination_dir`)
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    /// Target format (defaults to `general.default_format`)
    #[arg(short, long, value_enum)]
    pub format: Option<TargetFormat>,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    pub json_summary: bool,
}

/// Target formats accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TargetFormat {
    /// Lossy JPEG
    Jpeg,
    /// Lossless PNG
    Png,
    /// Lossless TIFF
    Tiff,
    /// Lossy AVIF
    Avif,
}

impl From<TargetFormat> for OutputFormat {
    fn from(value: TargetFormat) -> Self {
        match value {
            TargetFormat::Jpeg => OutputFormat::Jpeg,
            TargetFormat::Png => OutputFormat::Png,
            TargetFormat::Tiff => OutputFormat::Tiff,
            TargetFormat::Avif => OutputFormat::Avif,
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&OutputFormat::from(*self), f)
    }
}

/// Execute the convert command.
pub async fn execute(args: ConvertArgs, config: Config) -> anyhow::Result<()> {
    let format: OutputFormat = match args.format {
        Some(f) => f.into(),
        None => OutputFormat::from_name(&config.general.default_format).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown default_format {:?} in config",
                config.general.default_format
            )
        })?,
    };

    let dest_dir = match &args.dest {
        Some(dir) => {
            let expanded = shellexpand::tilde(&dir.to_string_lossy()).into_owned();
            PathBuf::from(expanded)
        }
        None => config.destination_dir(),
    };

    let lumen = Lumen::new(config);
    let report = lumen.add_inputs(&args.inputs)?;
    if report.total == 0 {
        tracing::warn!("No supported image files found in the given inputs");
        return Ok(());
    }
    tracing::info!("Queued {} file(s) for conversion to {}", report.total, format);

    std::fs::create_dir_all(&dest_dir)?;

    let start_time = std::time::Instant::now();
    let mut run = lumen.start_run(&dest_dir, format)?;

    let progress = create_progress_bar(report.total as u64);
    let mut final_summary = None;
    while let Some(event) = run.recv().await {
        match event {
            RunEvent::Progress(p) => {
                progress.set_message(p.file_name.clone());
                if p.status.is_terminal() {
                    progress.set_position(p.completed as u64);
                }
                if p.status == JobStatus::Failed {
                    progress.println(format!("  failed: {}", p.file_name));
                }
            }
            RunEvent::Completed(summary) => final_summary = Some(summary),
        }
    }
    progress.finish_and_clear();

    let summary = final_summary
        .ok_or_else(|| anyhow::anyhow!("run ended without emitting a summary"))?;

    if args.json_summary {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        print_summary(&summary, start_time.elapsed());
    }

    Ok(())
}

/// Create a progress bar for the conversion run.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )
            .unwrap()
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after the run.
fn print_summary(summary: &RunSummary, elapsed: std::time::Duration) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        summary.total as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", summary.succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
