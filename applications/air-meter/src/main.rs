/// air-meter - loudness measurement and compliance check for WAV files
use air_core::LoudnessStandard;
use air_meter::{measure_file, MeterConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "air-meter")]
#[command(about = "ITU-R BS.1770 / EBU R128 loudness meter", long_about = None, version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure a WAV file and check it against a loudness standard
    Measure {
        /// WAV file to measure
        file: PathBuf,
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Standard to check against (ebu_r128, atsc_a85, streaming, podcast)
        #[arg(short, long)]
        standard: Option<String>,
        /// Frame length fed to the meter, in milliseconds
        #[arg(long)]
        chunk_ms: Option<u32>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the built-in loudness standards
    Standards {
        /// Print the list as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "air_meter=info,air_loudness=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Measure {
            file,
            config,
            standard,
            chunk_ms,
            json,
        } => measure(file, config, standard, chunk_ms, json)?,
        Commands::Standards { json } => list_standards(json)?,
    }

    Ok(())
}

fn measure(
    file: PathBuf,
    config_path: Option<PathBuf>,
    standard: Option<String>,
    chunk_ms: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = MeterConfig::load(config_path.as_deref())?;
    if let Some(name) = standard {
        config.alerts.standard = LoudnessStandard::parse(&name)?;
    }
    if let Some(chunk_ms) = chunk_ms {
        config.meter.chunk_ms = chunk_ms;
    }
    config.validate()?;

    tracing::info!("Checking {} against {}", file.display(), config.alerts.standard.label());

    let report = measure_file(&file, &config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}

fn list_standards(json: bool) -> anyhow::Result<()> {
    let standards = LoudnessStandard::all();

    if json {
        let entries: Vec<serde_json::Value> = standards
            .iter()
            .map(|standard| {
                serde_json::json!({
                    "name": standard.as_str(),
                    "label": standard.label(),
                    "target_lufs": standard.target_lufs(),
                    "true_peak_limit_dbtp": standard.true_peak_limit_dbtp(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:<12} {:<18} {:>12} {:>12}", "NAME", "STANDARD", "TARGET", "CEILING");
    for standard in standards {
        println!(
            "{:<12} {:<18} {:>7.1} LUFS {:>7.1} dBTP",
            standard.as_str(),
            standard.label(),
            standard.target_lufs(),
            standard.true_peak_limit_dbtp()
        );
    }

    Ok(())
}
