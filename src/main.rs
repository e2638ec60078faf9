use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use zonegen::{Generator, GeneratorConfig};

/// Generate BIND9 forward/reverse zone files and named.conf.local from
/// per-domain record dumps.
#[derive(Parser, Debug)]
#[command(name = "zonegen", version, about)]
struct Cli {
    /// TOML file overriding the default naming parameters and paths
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Zone list file
    #[arg(long, value_name = "FILE")]
    zone_list: Option<PathBuf>,

    /// Directory holding <zone>.txt inputs
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Root directory for generated files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_toml_file(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(zone_list) = cli.zone_list {
        config.zone_list = zone_list;
    }
    if let Some(input_dir) = cli.input_dir {
        config.input_dir = input_dir;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let generator = Generator::new(config)?;
    info!(
        "Generating zones for {} into {}",
        generator.config().zone_list.display(),
        generator.config().output_dir.display()
    );
    let report = generator.run()?;

    for conflict in &report.ptr_conflicts {
        warn!("Review PTR conflict: {}", conflict);
    }
    if report.is_clean() {
        info!("All {} zones generated", report.zones_parsed);
    } else {
        warn!(
            "Completed with {} skipped zones and {} failed writes",
            report.zones_skipped.len(),
            report.write_failures.len()
        );
    }

    Ok(())
}
