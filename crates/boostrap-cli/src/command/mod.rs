use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{generate_snapshots::GenerateSnapshotsArg, observe::ObserveArg, play::PlayArg};

mod generate_snapshots;
mod observe;
mod play;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Drive the agent with recorded snapshots and write its commands
    Play(#[clap(flatten)] PlayArg),
    /// Dump the observation vector of each snapshot
    Observe(#[clap(flatten)] ObserveArg),
    /// Generate synthetic snapshots within the trained observation ranges
    GenerateSnapshots(#[clap(flatten)] GenerateSnapshotsArg),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing();
    match args.mode {
        Mode::Play(arg) => play::run(&arg)?,
        Mode::Observe(arg) => observe::run(&arg)?,
        Mode::GenerateSnapshots(arg) => generate_snapshots::run(&arg)?,
    }
    Ok(())
}
