//! flowmon - turn open-channel flow monitor exports into flow reports.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "flowmon",
    version,
    about = "Open-channel flow monitor report toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: flowmon_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    log::debug!("flowmon {}", env!("CARGO_PKG_VERSION"));
    flowmon_cmd::run(cli.command)
}
