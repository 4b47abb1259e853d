use anyhow::Context;
use chrono::Local;
use clap::Parser;
use log::{error, info};

use uci_arbiter::arbiter::args::Args;
use uci_arbiter::arbiter::config::MatchConfig;
use uci_arbiter::arbiter::match_orchestration::MatchArbiter;
use uci_arbiter::arbiter::record::{GameRecord, RecordHeaders};
use uci_arbiter::core::clock::MatchClock;
use uci_arbiter::rules::ChessRules;

fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();

    // Engines are shut down by the time `run` returns, whichever way it returns
    run(&args).map_err(|e| {
        error!("{e:#}");
        e
    })
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut config = MatchConfig::load(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    let rules = ChessRules::from_fen(&config.start_fen)?;
    let clock = MatchClock::new(config.initial_seconds, config.increment_seconds);

    let white = config.white.connect(config.session)
        .context("Could not bring up the white engine")?;
    let black = config.black.connect(config.session)
        .context("Could not bring up the black engine")?;

    let mut arbiter = MatchArbiter::new(white, black, clock, rules);
    if !args.quiet {
        arbiter = arbiter.with_scoreboard(&config.title());
    }

    let played = arbiter.play();
    arbiter.shutdown();
    let outcome = played.context("Match aborted")?;

    println!("{outcome}");

    let headers = RecordHeaders {
        event: config.event.clone(),
        site: config.site.clone(),
        round: config.round.clone(),
        white: config.white.identity.display_name.clone(),
        black: config.black.identity.display_name.clone(),
    };
    let record = GameRecord::from_game(headers, Local::now().date_naive(), arbiter.rules(), &outcome);
    println!("{record}");

    if !config.tracked_event {
        let path = record.append_to_dated_file(&config.record_dir)
            .with_context(|| format!("Could not write the game record to {:?}", config.record_dir))?;
        info!("Game record appended to {path:?}");
    }

    Ok(())
}
