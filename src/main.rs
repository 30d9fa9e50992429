//! Exam Proctor Agent CLI
//!
//! Runs simulated proctoring sessions and manages stored configuration.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;
use exam_proctor_agent::{
    config::{Config, Preset},
    sampler::{SimulatedConfig, SimulatedSampler},
    session::{ChannelSink, SessionController, SessionEvent},
    store::{self, ConfigStore},
    transparency::create_shared_log,
    MONITORING_DISCLOSURE, VERSION,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "exam-proctor")]
#[command(version = VERSION)]
#[command(about = "Risk aggregation and alerting for simulated exam proctoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulated proctoring session
    Run {
        /// Preset to use instead of the stored configuration
        #[arg(long)]
        preset: Option<String>,

        /// Stop after this many seconds (runs until Ctrl+C if omitted)
        #[arg(long)]
        duration: Option<u64>,

        /// Override the tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Enable the simulated surveillance model
        #[arg(long)]
        surveillance: bool,

        /// Seed for reproducible simulated signals
        #[arg(long)]
        seed: Option<u64>,

        /// Probability per tick of a simulated incident (0-1)
        #[arg(long, default_value = "0.08")]
        incident_rate: f64,

        /// Simulate a denied camera permission
        #[arg(long)]
        deny_camera: bool,

        /// Print alerts and the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List configuration presets
    Presets,

    /// Show or change stored configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Display the monitoring disclosure
    Disclosure,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the stored configuration
    Show,
    /// Set one option (tick_interval_ms, alert_capacity, surveillance_enabled, repeat_policy, preset)
    Set { key: String, value: String },
    /// Remove the stored configuration
    Reset,
}

struct RunOptions {
    preset: Option<String>,
    duration: Option<u64>,
    tick_ms: Option<u64>,
    surveillance: bool,
    seed: Option<u64>,
    incident_rate: f64,
    deny_camera: bool,
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Backend is decided once for the whole process
    let store = store::open_default();

    match cli.command {
        Commands::Run {
            preset,
            duration,
            tick_ms,
            surveillance,
            seed,
            incident_rate,
            deny_camera,
            json,
        } => cmd_run(
            store.as_ref(),
            RunOptions {
                preset,
                duration,
                tick_ms,
                surveillance,
                seed,
                incident_rate,
                deny_camera,
                json,
            },
        ),
        Commands::Presets => {
            cmd_presets();
            Ok(())
        }
        Commands::Config { action } => cmd_config(store.as_ref(), action.unwrap_or(ConfigAction::Show)),
        Commands::Disclosure => {
            println!("{MONITORING_DISCLOSURE}");
            Ok(())
        }
    }
}

fn cmd_run(store: &dyn ConfigStore, opts: RunOptions) -> anyhow::Result<()> {
    let mut config = match opts.preset {
        Some(ref name) => Config::from_preset(name.parse()?),
        None => Config::load(store).context("Could not load stored configuration")?,
    };
    if let Some(ms) = opts.tick_ms {
        config.set_option("tick_interval_ms", &ms.to_string())?;
    }
    if opts.surveillance {
        config.set_option("surveillance_enabled", "true")?;
    }
    if !(0.0..=1.0).contains(&opts.incident_rate) {
        bail!("--incident-rate must be between 0 and 1");
    }

    let session_config = config.session.clone();
    let sampler = SimulatedSampler::new(SimulatedConfig {
        surveillance: session_config.surveillance_enabled,
        camera_available: !opts.deny_camera,
        incident_rate: opts.incident_rate,
        seed: opts.seed,
    });

    let monitoring = create_shared_log();
    let (sink, events) = ChannelSink::channel();
    let mut session = SessionController::new(session_config.clone(), sampler)?
        .with_sink(Arc::new(sink))
        .with_sink(monitoring.clone());

    if !opts.json {
        println!("Exam Proctor Agent v{VERSION}");
        println!();
        println!("Session: {}", session.session_id());
        println!(
            "  Preset: {}",
            config
                .preset
                .map(|p| p.to_string())
                .unwrap_or_else(|| "custom".to_string())
        );
        println!("  Tick interval: {}ms", session_config.tick_interval_ms);
        println!("  Alert capacity: {}", session_config.alert_capacity);
        println!(
            "  Surveillance model: {}",
            if session_config.surveillance_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!();
        println!("Press Ctrl+C to stop");
        println!();
    }

    session
        .start()
        .context("Could not start the session (is the camera available?)")?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    let deadline = opts
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    while running.load(Ordering::SeqCst) {
        if deadline.map(|d| Instant::now() >= d).unwrap_or(false) {
            break;
        }
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => print_event(&event, opts.json)?,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let summary = session.stop()?;

    // Alerts raised by the final ticks are still queued
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::Alert { .. }) {
            print_event(&event, opts.json)?;
        }
    }

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        println!("{}", summary.display());
        println!();
        println!("{}", monitoring.summary());
    }
    Ok(())
}

fn print_event(event: &SessionEvent, json: bool) -> anyhow::Result<()> {
    if let SessionEvent::Alert { alert, .. } = event {
        if json {
            println!("{}", serde_json::to_string(alert)?);
        } else {
            println!(
                "[{}] {:<8} {:<28} {}",
                alert.timestamp.format("%H:%M:%S"),
                alert.severity.as_str().to_uppercase(),
                alert.alert_type,
                alert.message
            );
        }
    }
    Ok(())
}

fn cmd_presets() {
    println!("Presets");
    println!("=======");
    println!();
    for preset in Preset::ALL {
        println!("  {:<10} {}", preset.as_str(), preset.description());
    }
}

fn cmd_config(store: &dyn ConfigStore, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load(store)?;
            println!("Configuration ({} store)", store.backend());
            println!("=============");
            println!();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load(store)?;
            config.set_option(&key, &value)?;
            config.save(store)?;
            println!("Set {key} = {value}");
        }
        ConfigAction::Reset => {
            store.clear(exam_proctor_agent::config::CONFIG_KEY)?;
            println!("Configuration reset to defaults.");
        }
    }
    Ok(())
}
