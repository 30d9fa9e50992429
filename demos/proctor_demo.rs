//! Demonstration of the Exam Proctor Agent pipeline.
//!
//! This example shows how to:
//! 1. Check camera availability before a session
//! 2. Create a session from a preset
//! 3. Fan alerts out to a feed, the log and the monitoring counters
//! 4. Stop the session and read its summary
//!
//! Run with: cargo run --example proctor_demo
//!
//! Note: every signal is simulated. No camera or microphone is opened.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use exam_proctor_agent::{
    config::Preset,
    sampler::{SamplerError, SimulatedConfig, SimulatedSampler},
    session::{AlertFeed, SessionController, SessionError, TracingSink},
    transparency::MonitoringLog,
    MONITORING_DISCLOSURE,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    println!("Exam Proctor Agent - Session Demo");
    println!("=================================");
    println!();

    // Display monitoring disclosure
    println!("{MONITORING_DISCLOSURE}");
    println!();

    // A denied camera keeps the session idle
    print!("Checking camera permission... ");
    let denied = SimulatedSampler::new(SimulatedConfig {
        camera_available: false,
        ..SimulatedConfig::default()
    });
    let mut probe_session = match SessionController::new(Preset::Standard.session_config(), denied) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return;
        }
    };
    match probe_session.start() {
        Err(SessionError::SamplerUnavailable(SamplerError::PermissionDenied(device))) => {
            println!("denied ({device}), session stays {}", probe_session.state());
        }
        Err(e) => println!("unexpected error: {e}"),
        Ok(()) => println!("OK ✓"),
    }
    println!();

    // Create components
    let mut config = Preset::Secure.session_config();
    config.tick_interval_ms = 200;

    let sampler = SimulatedSampler::new(SimulatedConfig {
        surveillance: true,
        incident_rate: 0.25,
        seed: Some(7),
        ..SimulatedConfig::default()
    });
    let feed = AlertFeed::shared(config.alert_capacity);
    let monitoring = Arc::new(MonitoringLog::new());

    let mut session = match SessionController::new(config, sampler) {
        Ok(session) => session
            .with_sink(feed.clone())
            .with_sink(monitoring.clone())
            .with_sink(Arc::new(TracingSink)),
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return;
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Error setting Ctrl+C handler: {e}");
        return;
    }

    if let Err(e) = session.start() {
        eprintln!("Failed to start session: {e}");
        return;
    }
    let session_id = session.session_id();
    println!("Session {session_id} running for 5 seconds (Ctrl+C to end early)");
    println!();

    let deadline = Instant::now() + Duration::from_secs(5);
    while running.load(Ordering::SeqCst) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_secs(1));
        if let Some(assessment) = session.assessment() {
            println!(
                "  t={:>3}s  score {:>3}  {:<8}  violations {}",
                session.elapsed_seconds(),
                assessment.suspicion_score,
                assessment.threat_level,
                session.violation_count()
            );
        }
    }

    let summary = match session.stop() {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Failed to stop session: {e}");
            return;
        }
    };

    println!();
    println!("Latest alerts:");
    for alert in feed.recent(&session_id, 5) {
        println!("  [{}] {} - {}", alert.severity, alert.alert_type, alert.message);
    }
    if feed.recent(&session_id, 1).is_empty() {
        println!("  (none)");
    }

    println!();
    println!("{}", summary.display());
    println!();
    println!("{}", monitoring.summary());
}
