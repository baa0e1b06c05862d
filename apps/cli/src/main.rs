#![allow(clippy::print_stdout)]

use anyhow::Context;
use clap::Parser;
use confkit::Value;
use confkit_cli::{Cli, render, resolve};
use confkit_logger::Logger;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logger = Logger::builder()
        .name(env!("CARGO_BIN_NAME"))
        .configure(Value::from_iter([("level", cli.log_level.as_str())]));
    if let Some(dir) = &cli.log_dir {
        logger = logger.directory(dir);
    }
    let _log = logger.init().context("Failed to initialize logging")?;

    let configuration = resolve(&cli)?;
    print!("{}", render(&configuration, cli.format)?);

    Ok(())
}
