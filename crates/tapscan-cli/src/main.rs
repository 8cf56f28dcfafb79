//! tapscan command-line entry point.

mod cli;

use anyhow::bail;
use clap::Parser;
use tapscan_controller::{ControllerConfig, PhaseTransition, ScanController, StartOutcome};
use tapscan_core::{ScanPhase, ScanState};
use tapscan_hardware::mock::{MockNfc, MockSupport};
use tapscan_hardware::{AnyNfcHardware, RawTagRecord};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Args, Command, SimulateArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for --json.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let args = Args::parse();
    let config = args.controller_config();

    match args.command {
        Command::Simulate(simulate) => run_simulation(simulate, config).await,
        #[cfg(feature = "hardware-pcsc")]
        Command::Read(read) => run_reader(read, config).await,
    }
}

async fn run_simulation(args: SimulateArgs, config: ControllerConfig) -> anyhow::Result<()> {
    let support = if args.unsupported {
        MockSupport::NotSupported
    } else {
        MockSupport::Supported
    };
    let (radio, tags) = MockNfc::builder()
        .name("Simulated NFC")
        .support(support)
        .build();

    let controller = spawn_controller(radio.into(), config)?;
    let printer = print_transitions(controller.subscribe_transitions(), !args.json);

    let ready = controller
        .wait_for(|s| matches!(s.phase(), ScanPhase::Idle | ScanPhase::Unsupported))
        .await;
    if ready.phase() == ScanPhase::Unsupported {
        finish(controller, printer).await;
        bail!("contactless scanning is not supported on this device");
    }

    if controller.start().await != StartOutcome::Started {
        finish(controller, printer).await;
        bail!("scan could not be started");
    }

    match &args.fail {
        Some(reason) => tags.fail_next_request(reason.clone()).await?,
        None => tags.present_tag(simulated_tag(&args)).await?,
    }

    let outcome = wait_for_outcome(&controller).await;
    finish(controller, printer).await;
    report(&outcome, args.json)
}

#[cfg(feature = "hardware-pcsc")]
async fn run_reader(args: cli::ReadArgs, config: ControllerConfig) -> anyhow::Result<()> {
    use anyhow::Context;
    use tapscan_hardware::pcsc::PcscNfc;

    let radio = match args.reader {
        Some(name) => PcscNfc::with_reader(name),
        None => PcscNfc::new(),
    };

    let controller = spawn_controller(radio.into(), config)?;
    let printer = print_transitions(controller.subscribe_transitions(), !args.json);

    let ready = controller
        .wait_for(|s| matches!(s.phase(), ScanPhase::Idle | ScanPhase::Unsupported))
        .await;
    if ready.phase() == ScanPhase::Unsupported {
        finish(controller, printer).await;
        bail!("no PC/SC contactless reader available");
    }

    controller.start().await;
    if !args.json {
        println!("Hold a tag against the reader...");
    }

    let outcome = tokio::select! {
        state = wait_for_outcome(&controller) => state,
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            controller.cancel().await;
            controller.state()
        }
    };

    finish(controller, printer).await;
    report(&outcome, args.json)
}

fn spawn_controller(
    radio: AnyNfcHardware,
    config: ControllerConfig,
) -> anyhow::Result<ScanController> {
    info!(driver = radio.name(), technology = %config.technology, "Starting scan controller");
    Ok(ScanController::spawn(radio, config)?)
}

fn simulated_tag(args: &SimulateArgs) -> RawTagRecord {
    let mut raw = RawTagRecord::new();
    if let Some(uid) = &args.uid {
        raw = raw.with_id(uid.clone());
    }
    if !args.technologies.is_empty() {
        raw = raw.with_tech_types(args.technologies.iter().cloned());
    }
    if let Some(tag_type) = &args.tag_type {
        raw = raw.with_tag_type(tag_type.clone());
    }
    raw
}

async fn wait_for_outcome(controller: &ScanController) -> ScanState {
    controller
        .wait_for(|s| s.phase() != ScanPhase::Scanning)
        .await
}

fn print_transitions(
    mut transitions: broadcast::Receiver<PhaseTransition>,
    enabled: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Ok(transition) = transitions.recv().await {
            if enabled {
                println!("  {} -> {}", transition.from, transition.to);
            }
        }
    })
}

/// Tear the controller down and let the transition printer drain.
async fn finish(controller: ScanController, printer: JoinHandle<()>) {
    controller.teardown().await;
    drop(controller);
    let _ = printer.await;
}

fn report(state: &ScanState, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
        return Ok(());
    }

    match (state.result(), state.error()) {
        (Some(summary), _) => {
            println!("Card:         {}", summary.masked_number);
            println!("Type:         {}", summary.tag_type);
            if !summary.technologies.is_empty() {
                println!("Technologies: {}", summary.technologies.join(", "));
            }
            println!("Scanned at:   {}", summary.scanned_at.to_rfc3339());
            Ok(())
        }
        (None, Some(reason)) => bail!("{reason}"),
        (None, None) => {
            println!("Scan cancelled");
            Ok(())
        }
    }
}
