use clap::Parser;
use reflectgen_core::{pipeline, GeneratorConfig};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "reflection generator for Component() annotated records", long_about = None)]
struct Cli {
    /// Root directory scanned recursively for annotated sources
    source_dir: PathBuf,

    /// Directory receiving the generated module and its cache
    output_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let summary = pipeline::run(&cli.source_dir, &cli.output_dir, &GeneratorConfig::default())?;
    if !summary.failed_files.is_empty() {
        warn!(
            "{} files were skipped and will be retried next run",
            summary.failed_files.len()
        );
    }
    Ok(())
}
