use anyhow::Result;
use clap::{Parser, ValueEnum};
use codescan::camera::{MockCamera, MockFrameSource};
use codescan::decode::DecodeEngine;
use codescan::geometry::ViewSize;
use codescan::{ScannerConfig, ScannerService};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "codescan")]
#[command(about = "Live-camera barcode scan pipeline")]
#[command(version)]
#[command(long_about = "Drives a camera preview through a scan rectangle, normalizing each \
frame for device rotation and handing the cropped luminance to a decode engine until a code \
is found. Without camera hardware it runs a soak against a synthetic camera and reports \
pipeline statistics.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "codescan.toml", help = "Path to TOML configuration file")]
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
    #[arg(long, help = "Validate configuration file and exit without scanning")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// How long to run against the synthetic camera
    #[arg(long, default_value_t = 10, help = "Soak duration in seconds")]
    soak_seconds: u64,

    /// Synthetic camera frame rate
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Host view width in pixels
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Host view height in pixels
    #[arg(long, default_value_t = 1920)]
    height: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting codescan v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match ScannerConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
        return Err(e.into());
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    run_soak(&args, &config).await
}

/// Scan against a synthetic camera and print the pipeline counters
async fn run_soak(args: &Args, config: &ScannerConfig) -> Result<()> {
    let (results_tx, mut results) = mpsc::unbounded_channel();
    let (handle, task) = ScannerService::spawn(config, decode_engine()?, Box::new(results_tx));

    handle.on_view_resized(ViewSize::new(args.width, args.height));
    handle.on_surface_changed(true)?;

    let camera =
        MockCamera::with_default_parameters().with_frame_source(MockFrameSource::new(args.fps));
    handle.start(Box::new(camera)).await.map_err(|e| {
        error!("Failed to start scanning: {}", e);
        e
    })?;

    info!(
        "Soak running for {}s at {} fps, view {}x{}",
        args.soak_seconds, args.fps, args.width, args.height
    );

    tokio::select! {
        result = results.recv() => {
            if let Some(result) = result {
                info!("Decoded {}: {}", result.format, result.text);
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        _ = tokio::time::sleep(Duration::from_secs(args.soak_seconds)) => {
            info!("Soak period elapsed");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }

    handle.stop().await?;
    let stats = handle.stats();
    info!(
        "{} frames decoded, hit rate {:.3}",
        stats.decode_attempts,
        stats.hit_rate()
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    handle.shutdown();
    task.await?;
    Ok(())
}

#[cfg(feature = "qr")]
fn decode_engine() -> Result<Box<dyn DecodeEngine>> {
    Ok(Box::new(codescan::decode::QrDecodeEngine::new()))
}

#[cfg(not(feature = "qr"))]
fn decode_engine() -> Result<Box<dyn DecodeEngine>> {
    anyhow::bail!("built without a decode engine; enable the `qr` feature")
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
        .unwrap_or_else(|_| EnvFilter::new(format!("codescan={}", log_level)));

    // source locations only help when debugging
    let base = fmt::layer()
        .with_file(args.debug)
        .with_line_number(args.debug);
    let fmt_layer = match args.log_format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().with_target(false).boxed(),
        LogFormat::Json => base.json().boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# codescan configuration file");
    println!("# Every key is optional; values shown are the defaults.");
    println!("# Environment overrides use CODESCAN_<SECTION>__<KEY>, e.g. CODESCAN_AUTOFOCUS__COOLDOWN_MS");
    println!("# decode.formats lists symbologies such as \"QR_CODE\" or \"EAN_13\"; empty enables all");
    println!();
    println!("{}", toml::to_string_pretty(&ScannerConfig::default())?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        let args = Args::try_parse_from(["codescan"]).unwrap();
        assert_eq!(args.log_format, LogFormat::Pretty);

        let args = Args::try_parse_from(["codescan", "--log-format", "json"]).unwrap();
        assert_eq!(args.log_format, LogFormat::Json);

        assert!(Args::try_parse_from(["codescan", "--log-format", "xml"]).is_err());
    }
}
