use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facegate_core::CascadeDetector;
use facegate_engine::{Config, Engine, OperationResult};
use facegate_hw::{Camera, FrameSource};
use facegate_store::{remove_reference, Registry};

mod progress;
use progress::TermProgress;

#[derive(Parser)]
#[command(name = "facegate", about = "facegate face identification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan and match against the registered gallery
    Identify,
    /// Scan and register the captured face under an identity
    Register {
        /// Identity label to store (e.g. a username)
        #[arg(short, long)]
        identity: String,
    },
    /// List registered identities
    List,
    /// Remove a registered identity and its reference image
    Remove {
        /// Identity label to remove
        identity: String,
    },
    /// List available capture devices
    Devices,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Identify => {
            let result = run_scan_op(&config, |engine, camera, observer| {
                engine.identify(camera, observer)
            })?;
            emit(&result)
        }
        Commands::Register { identity } => {
            let result = run_scan_op(&config, |engine, camera, observer| {
                engine.register(camera, observer, &identity)
            })?;
            emit(&result)
        }
        Commands::List => list_gallery(&config),
        Commands::Remove { identity } => remove_identity(&config, &identity),
        Commands::Devices => list_devices(),
    }
}

/// Open camera, detector, and registry, then run one scan operation.
/// The camera is dropped (and released) on every path out of here.
fn run_scan_op(
    config: &Config,
    op: impl FnOnce(&mut Engine, &mut dyn FrameSource, &mut TermProgress) -> OperationResult,
) -> Result<OperationResult> {
    let mut camera = Camera::open(&config.camera_device)
        .with_context(|| format!("opening camera {}", config.camera_device))?;
    camera.discard_warmup(config.warmup_frames);

    let detector = CascadeDetector::load(&config.model_path.to_string_lossy())
        .context("loading detection model")?;
    let registry = Registry::open(&config.db_path).context("opening gallery registry")?;

    let mut engine = Engine::new(config.clone(), Box::new(detector), registry);
    let mut observer = TermProgress::new();
    let result = op(&mut engine, &mut camera, &mut observer);
    observer.finish();
    Ok(result)
}

/// Print the boundary result as JSON; exit nonzero on failure so shell
/// callers can branch on the outcome.
fn emit(result: &OperationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.success {
        std::process::exit(1);
    }
    Ok(())
}

fn list_gallery(config: &Config) -> Result<()> {
    let registry = Registry::open(&config.db_path).context("opening gallery registry")?;
    let entries = registry.list_all()?;

    if entries.is_empty() {
        println!("no identities registered");
        return Ok(());
    }

    println!("{:<20} {:<26} {:<26} {}", "IDENTITY", "REGISTERED", "LAST MATCHED", "ENABLED");
    for entry in entries {
        let last = entry
            .last_matched_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<20} {:<26} {:<26} {}",
            entry.identity,
            entry.registered_at.to_rfc3339(),
            last,
            if entry.enabled { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn remove_identity(config: &Config, identity: &str) -> Result<()> {
    let registry = Registry::open(&config.db_path).context("opening gallery registry")?;
    let entry = registry.remove(identity)?;
    remove_reference(&entry.image_path);
    println!("removed {identity}");
    Ok(())
}

fn list_devices() -> Result<()> {
    let devices = Camera::list_devices();
    if devices.is_empty() {
        println!("no video capture devices found");
        return Ok(());
    }
    for dev in devices {
        println!("{:<14} {:<32} {}", dev.path, dev.name, dev.driver);
    }
    Ok(())
}
