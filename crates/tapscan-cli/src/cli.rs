//! Command-line argument parsing.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tapscan_controller::ControllerConfig;
use tapscan_core::TechnologyKind;

#[derive(Parser, Debug)]
#[command(name = "tapscan")]
#[command(version, about = "Contactless tag scanner", long_about = None)]
pub struct Args {
    /// Technology to request when reserving the radio
    #[arg(long, global = true, env = "TAPSCAN_TECHNOLOGY", default_value = "IsoDep")]
    pub technology: TechnologyKind,

    /// Give up on an attempt after this many milliseconds
    #[arg(long = "timeout-ms", global = true, env = "TAPSCAN_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scan against a simulated radio
    Simulate(SimulateArgs),

    /// Scan one tag from a PC/SC contactless reader (Ctrl-C cancels)
    #[cfg(feature = "hardware-pcsc")]
    Read(ReadArgs),
}

#[derive(clap::Args, Debug)]
pub struct SimulateArgs {
    /// Tag identifier as hex; omit to simulate a tag without one
    #[arg(long, value_name = "HEX")]
    pub uid: Option<String>,

    /// Technology reported by the tag (repeatable)
    #[arg(long = "tech", value_name = "NAME")]
    pub technologies: Vec<String>,

    /// Tag type label reported by the tag
    #[arg(long = "type", value_name = "LABEL")]
    pub tag_type: Option<String>,

    /// Simulate a device without contactless hardware
    #[arg(long)]
    pub unsupported: bool,

    /// Fail the attempt with this hardware error instead of reading a tag
    #[arg(long, value_name = "REASON", conflicts_with = "unsupported")]
    pub fail: Option<String>,

    /// Print the final state as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(feature = "hardware-pcsc")]
#[derive(clap::Args, Debug)]
pub struct ReadArgs {
    /// Use the first reader whose name contains this text
    #[arg(long, value_name = "NAME")]
    pub reader: Option<String>,

    /// Print the final state as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Controller configuration from the global flags.
    pub fn controller_config(&self) -> ControllerConfig {
        let config = ControllerConfig::default().with_technology(self.technology);
        match self.timeout_ms {
            Some(ms) => config.with_attempt_timeout(Duration::from_millis(ms)),
            None => config,
        }
    }
}
