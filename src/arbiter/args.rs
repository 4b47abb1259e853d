use std::path::PathBuf;
use clap::Parser;

use crate::arbiter::config::MatchConfig;

#[derive(Parser, Debug)]
#[command(author, version)]
#[command(about = "Arbitrates a timed match between two UCI engines on serial consoles.")]
pub struct Args {
    /// The path of the JSON match configuration.
    #[arg(short, long, default_value = "match.json")]
    pub config: PathBuf,

    /// Starting position as FEN, instead of the configured one.
    #[arg(long)]
    pub fen: Option<String>,

    /// Clock for each side, in seconds.
    #[arg(long)]
    pub initial_seconds: Option<f64>,

    /// Time credited after every move, in seconds.
    #[arg(long)]
    pub increment_seconds: Option<f64>,

    /// Directory for the dated game record files.
    #[arg(long)]
    pub record_dir: Option<PathBuf>,

    /// Print the game record but do not append it to the dated file.
    #[arg(long, default_value_t = false)]
    pub tracked_event: bool,

    /// Do not print the scoreboard before every move.
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}

impl Args {
    /// Lets command line flags win over the configuration file.
    pub fn apply(&self, config: &mut MatchConfig) {
        if let Some(fen) = &self.fen {
            config.start_fen = fen.clone();
        }
        if let Some(seconds) = self.initial_seconds {
            config.initial_seconds = seconds;
        }
        if let Some(seconds) = self.increment_seconds {
            config.increment_seconds = seconds;
        }
        if let Some(dir) = &self.record_dir {
            config.record_dir = dir.clone();
        }
        if self.tracked_event {
            config.tracked_event = true;
        }
    }
}

#[test]
fn check_flags_override_config() {
    let mut config = MatchConfig::from_json(r#"{
        "increment_seconds": 1.0,
        "white": { "display_name": "A", "launch": "a", "expected_name": "A",
                   "transport": { "kind": "shell" } },
        "black": { "display_name": "B", "launch": "b", "expected_name": "B",
                   "transport": { "kind": "shell" } }
    }"#).unwrap();

    let args = Args::parse_from([
        "uci_arbiter",
        "--initial-seconds", "60",
        "--record-dir", "/tmp/games",
        "--tracked-event",
    ]);
    args.apply(&mut config);

    assert_eq!(config.initial_seconds, 60.0);
    assert_eq!(config.increment_seconds, 1.0);
    assert_eq!(config.record_dir, PathBuf::from("/tmp/games"));
    assert!(config.tracked_event);
    assert!(!args.quiet);
}
