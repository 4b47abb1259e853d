// The chess side of a match: legality, positions, outcomes and the move record.
// The arbiter only ever talks to the `Rules` trait.

use std::fmt::{Display, Formatter};
use chess::{ChessMove, Color};
use thiserror::Error;

pub mod chess_rules;
pub mod san;

pub use chess_rules::ChessRules;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Termination {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    FivefoldRepetition,
    SeventyFiveMoves,
}

impl Termination {
    pub fn is_over(&self) -> bool {
        *self != Termination::Ongoing
    }
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Ongoing => write!(f, "ongoing"),
            Termination::Checkmate => write!(f, "checkmate"),
            Termination::Stalemate => write!(f, "stalemate"),
            Termination::InsufficientMaterial => write!(f, "insufficient material"),
            Termination::FivefoldRepetition => write!(f, "fivefold repetition"),
            Termination::SeventyFiveMoves => write!(f, "75 moves without pawn movement or capture"),
        }
    }
}

#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
#[error("Illegal move {0}")]
pub struct IllegalMove(pub ChessMove);

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum RulesError {
    #[error("Invalid FEN: '{0}'")]
    InvalidFen(String),
}

/// Everything the scoreboard shows about the current position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionSummary {
    pub fullmove_number: u32,
    pub halfmove_clock: u32,
    pub legal_moves: usize,
    pub in_check: bool,
    /// Pieces taken by white, then by black, as FEN letters.
    pub captures: [String; 2],
    pub diagram: String,
}

pub trait Rules {
    fn side_to_move(&self) -> Color;

    fn push(&mut self, chess_move: ChessMove) -> Result<(), IllegalMove>;

    fn is_legal(&self, chess_move: ChessMove) -> bool;

    /// FEN of the current position.
    fn position_string(&self) -> String;

    fn termination(&self) -> Termination;

    fn move_history(&self) -> &[ChessMove];

    /// The same moves as `move_history`, in SAN.
    fn san_history(&self) -> &[String];

    fn summary(&self) -> PositionSummary;
}
