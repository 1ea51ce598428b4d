mod detect;

use clap::{Parser, Subcommand};

pub use self::detect::{DetectArgs, detect};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    /// Log debug messages.
    #[clap(long, short, env = "VERBOSE")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: detect charging sessions in household load series.
    #[clap(name = "detect")]
    Detect(Box<DetectArgs>),

    /// Print the default detection parameters as TOML.
    #[clap(name = "defaults")]
    Defaults,
}
