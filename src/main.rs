#![doc = include_str!("../README.md")]

mod cli;
mod prelude;

use clap::{Parser, crate_version};
use ev_sessions::parameters::Parameters;

use crate::{
    cli::{Args, Command, detect},
    prelude::*,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();
    info!(version = crate_version!(), "starting…");

    match args.command {
        Command::Detect(args) => detect(&args),
        Command::Defaults => {
            print!("{}", toml::to_string_pretty(&Parameters::default())?);
            Ok(())
        }
    }
}
