use std::path::PathBuf;
use anyhow::Context;
use clap::{Parser, ValueEnum};

use uci_arbiter::arbiter::config::MatchConfig;

/// This executable checks that one configured engine comes up: it launches the
/// engine from its console, verifies the identity line, runs the UCI handshake
/// and quits again. Nothing is played.

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Side {
    White,
    Black,
}

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Brings up one configured engine and shuts it down again.")]
struct ProbeArgs {
    /// The path of the JSON match configuration.
    #[arg(short, long, default_value = "match.json")]
    config: PathBuf,

    /// Which of the configured engines to probe.
    #[arg(short, long, value_enum, default_value = "white")]
    side: Side,
}

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = ProbeArgs::parse();

    let config = MatchConfig::load(&args.config)?;
    let seat = match args.side {
        Side::White => &config.white,
        Side::Black => &config.black,
    };

    let mut session = seat.connect(config.session)
        .with_context(|| format!("Probing {} failed", seat.identity.display_name))?;

    println!(
        "{} answered '{}' on {}",
        seat.identity.display_name,
        session.identity_line().unwrap_or_default(),
        seat.transport.describe(),
    );

    session.shutdown();
    Ok(())
}
