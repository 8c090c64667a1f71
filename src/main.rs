use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use plantdoc::analysis::{mime_from_path, sniff_image_mime};
use plantdoc::{normalize, AnalysisOrchestrator, PlantDocConfig, PlantDocError};

#[derive(Parser, Debug)]
#[command(name = "plantdoc")]
#[command(about = "Plant health diagnosis from photos and short videos")]
#[command(version)]
#[command(long_about = "Diagnoses plant health from a photo or a short video. Videos are reduced \
to their sharpest frame, the image is sent to a vision language model, and the reply is \
normalized into a fixed JSON record printed on stdout.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "plantdoc.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diagnose a plant photo or video
    Analyze {
        /// Image or video file
        file: PathBuf,

        /// Media type, when the file extension is missing or misleading
        #[arg(long)]
        mime_type: Option<String>,

        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },

    /// Write the sharpest frame of a video as JPEG
    BestFrame {
        /// Video file
        file: PathBuf,

        /// Destination JPEG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Normalize a raw model reply from a file (or stdin) without calling the model
    Normalize {
        /// File holding the reply text; stdin when omitted
        file: Option<PathBuf>,
    },

    /// Report whether the model credential and video decoder are available
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config();
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting plantdoc v{}", env!("CARGO_PKG_VERSION"));

    let config = match PlantDocConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }
    config.validate()?;

    let Some(command) = args.command else {
        eprintln!("No command given, see --help");
        std::process::exit(2);
    };

    // Normalize works offline, so only the other commands build the model client
    let orchestrator = || AnalysisOrchestrator::new(&config);

    match command {
        Command::Analyze {
            file,
            mime_type,
            pretty,
        } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let mime_type = match mime_type {
                Some(mime) => mime,
                None => detect_mime(&file, &bytes)?,
            };
            info!("Analysing {} as {}", file.display(), mime_type);

            let result = orchestrator()?
                .diagnose(bytes, &mime_type)
                .await
                .unwrap_or_else(|e| fail(e));

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{}", json);
        }
        Command::BestFrame { file, output } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let jpeg = orchestrator()?
                .best_frame(bytes)
                .await
                .unwrap_or_else(|e| fail(e));

            tokio::fs::write(&output, &jpeg)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("✓ Wrote {} byte frame to {}", jpeg.len(), output.display());
        }
        Command::Check => {
            let readiness = orchestrator()?.readiness();
            println!("{}", serde_json::to_string_pretty(&readiness)?);
            if !readiness.model_configured {
                std::process::exit(1);
            }
        }
        Command::Normalize { file } => {
            let raw = read_reply(file.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&normalize(&raw))?);
        }
    }

    Ok(())
}

/// Report a request failure with its remedy and exit
fn fail(e: PlantDocError) -> ! {
    error!("Request failed: {}", e);
    eprintln!("✗ {}", e);
    eprintln!("  {}", e.remedy());
    std::process::exit(1);
}

fn detect_mime(path: &Path, bytes: &[u8]) -> Result<String> {
    mime_from_path(path)
        .or_else(|| sniff_image_mime(bytes))
        .map(str::to_string)
        .with_context(|| {
            format!(
                "Cannot tell the media type of {}, pass --mime-type",
                path.display()
            )
        })
}

async fn read_reply(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plantdoc={}", log_level)));

    // stdout carries the result, so logs go to stderr
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        Some("pretty") => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        None => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() {
    println!("# Plantdoc Configuration File");
    println!("# This is the default configuration with all available options");
    println!();

    let default_config = r#"[model]
# API key for the vision model (or set GEMINI_API_KEY)
api_key = ""
# Model identifier
model_name = "gemini-2.5-flash"
# generateContent REST endpoint base
base_url = "https://generativelanguage.googleapis.com/v1beta"
# Sampling temperature
temperature = 0.1
# Maximum tokens in the model reply
max_output_tokens = 1500
# Request timeout in seconds
timeout_seconds = 60

[limits]
# Largest accepted upload in bytes (20 MiB)
max_upload_bytes = 20971520

[frames]
# Frame positions sampled per video
max_samples = 10
# JPEG quality of the selected frame
jpeg_quality = 90
# Directory for temporary video files (defaults to the system temp dir)
# scratch_dir = "/var/tmp/plantdoc"
"#;

    println!("{}", default_config);
}
