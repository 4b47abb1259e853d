use std::fmt::{Display, Formatter};
use std::str::FromStr;
use chess::ChessMove;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const HASH_SIZE_MB: u32 = 768;

/// Clock report sent with every `go`, in centiseconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeControl {
    pub white_time: i64,
    pub white_increment: i64,
    pub black_time: i64,
    pub black_increment: i64,
}

impl Display for TimeControl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "wtime {} winc {} btime {} binc {}",
            self.white_time, self.white_increment, self.black_time, self.black_increment,
        )
    }
}

/// Driver to engine commands, in the subset this arbiter speaks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GuiCommand {
    Launch(String),  // typed at the console prompt, not UCI
    Uci,
    SetHash(u32),
    IsReady,
    Position {
        fen: String,
        moves: Vec<ChessMove>,
    },
    Go(TimeControl),
    GoPonder(TimeControl),
    PonderHit,
    Stop,
    Quit,
}

impl GuiCommand {
    pub fn is_position(&self) -> bool {
        matches!(self, GuiCommand::Position { .. })
    }
}

impl Display for GuiCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GuiCommand::Launch(launch) => write!(f, "{launch}"),
            GuiCommand::Uci => write!(f, "uci"),
            GuiCommand::SetHash(megabytes) => write!(f, "setoption name Hash value {megabytes}"),
            GuiCommand::IsReady => write!(f, "isready"),
            GuiCommand::Position { fen, moves } => match moves.is_empty() {
                true => write!(f, "position fen {fen}"),
                false => write!(f, "position fen {fen} moves {}", moves.iter().join(" ")),
            },
            GuiCommand::Go(time_control) => write!(f, "go {time_control}"),
            GuiCommand::GoPonder(time_control) => write!(f, "go ponder {time_control}"),
            GuiCommand::PonderHit => write!(f, "ponderhit"),
            GuiCommand::Stop => write!(f, "stop"),
            GuiCommand::Quit => write!(f, "quit"),
        }
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum UciParseError {
    #[error("Line is not a bestmove response: '{0}'")]
    NotBestMove(String),
    #[error("Best move '{0}' is not a move")]
    InvalidBestMove(String),
}

/// Engine's answer to a search: `bestmove <move> [ponder <move>]`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BestMove {
    pub best: ChessMove,
    pub ponder: Option<ChessMove>,
}

lazy_static! {
    // Whitespace between tokens is not always a single space on a serial console
    static ref BESTMOVE: Regex = Regex::new(r"bestmove\s+(\S+)(?:\s+ponder\s+(\S+))?").unwrap();
}

impl FromStr for BestMove {
    type Err = UciParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let captures = BESTMOVE.captures(line)
            .ok_or_else(|| UciParseError::NotBestMove(line.to_string()))?;

        let best_token = &captures[1];
        let best = ChessMove::from_str(best_token)
            .map_err(|_| UciParseError::InvalidBestMove(best_token.to_string()))?;

        // An unreadable ponder suggestion only costs the ponder, not the move
        let ponder = captures.get(2)
            .and_then(|token| ChessMove::from_str(token.as_str()).ok());

        Ok(Self { best, ponder })
    }
}

#[cfg(test)]
fn mv(text: &str) -> ChessMove {
    ChessMove::from_str(text).unwrap()
}

#[test]
fn check_bestmove_with_ponder() {
    let parsed = BestMove::from_str("bestmove e2e4 ponder e7e5").unwrap();

    assert_eq!(parsed.best, mv("e2e4"));
    assert_eq!(parsed.ponder, Some(mv("e7e5")));
}

#[test]
fn check_bestmove_without_ponder() {
    let parsed = BestMove::from_str("bestmove g1f3").unwrap();

    assert_eq!(parsed, BestMove { best: mv("g1f3"), ponder: None });
}

#[test]
fn check_bestmove_irregular_whitespace() {
    let parsed = BestMove::from_str("  bestmove\te7e8q   ponder  a2a1\r").unwrap();

    assert_eq!(parsed.best, mv("e7e8q"));
    assert_eq!(parsed.ponder, Some(mv("a2a1")));
}

#[test]
fn check_bestmove_none_is_rejected() {
    assert_eq!(
        BestMove::from_str("bestmove (none)"),
        Err(UciParseError::InvalidBestMove("(none)".to_string())),
    );
    assert!(matches!(BestMove::from_str("info depth 3"), Err(UciParseError::NotBestMove(_))));
}

#[test]
fn check_command_rendering() {
    let time_control = TimeControl {
        white_time: 30000,
        white_increment: 0,
        black_time: 28760,
        black_increment: 0,
    };
    let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".to_string();

    assert_eq!(GuiCommand::SetHash(HASH_SIZE_MB).to_string(), "setoption name Hash value 768");
    assert_eq!(
        GuiCommand::Go(time_control).to_string(),
        "go wtime 30000 winc 0 btime 28760 binc 0",
    );
    assert_eq!(
        GuiCommand::GoPonder(time_control).to_string(),
        "go ponder wtime 30000 winc 0 btime 28760 binc 0",
    );
    assert_eq!(
        GuiCommand::Position { fen: fen.clone(), moves: vec![] }.to_string(),
        format!("position fen {fen}"),
    );
    assert_eq!(
        GuiCommand::Position { fen: fen.clone(), moves: vec![mv("e7e5")] }.to_string(),
        format!("position fen {fen} moves e7e5"),
    );
    assert_eq!(GuiCommand::Launch("./stockfish".to_string()).to_string(), "./stockfish");
}
