use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod flags;
mod paths;
mod probe;
mod script;
mod steps;

use cli::{Command, RootArgs, StatusArgs};
use config::ConfigStore;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = RootArgs::parse();
    match args.command {
        Command::Setup(args) => steps::setup::run(&args),
        Command::Reprocess(args) => steps::reprocess::run(&args),
        Command::Deflare(args) => steps::deflare::run(&args),
        Command::Merge(args) => steps::merge::run(&args),
        Command::Fluxmap(args) => steps::fluxmap::run(&args),
        Command::Crop(args) => steps::crop::run(&args),
        Command::Contbin(args) => steps::contbin::run(&args),
        Command::Regions(args) => steps::regions::run(&args),
        Command::Spectra(args) => steps::spectra::run(&args),
        Command::Flag(args) => flags::run(&args),
        Command::Status(args) => cmd_status(&args),
    }
}

fn cmd_status(args: &StatusArgs) -> Result<()> {
    let store = ConfigStore::new(&args.root);
    let config = store.load()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!(
        "{}: {} observations, sn={} smoothness={}",
        config.info.name,
        config.info.obs_ids.len(),
        config.info.sn_per_region,
        config.info.reg_smoothness
    );
    for name in flags::STAGE_FLAGS {
        let done = config.flags.get(name).copied().unwrap_or(false);
        let state = if done { "done" } else { "pending" };
        println!("  {name:<28} {state}");
    }
    Ok(())
}
