use std::str::FromStr;
use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, ALL_SQUARES, EMPTY};

use crate::rules::san::{piece_letter, to_san};
use crate::rules::{IllegalMove, PositionSummary, Rules, RulesError, Termination};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const FIVEFOLD: usize = 5;
const SEVENTY_FIVE_MOVES_IN_PLIES: u32 = 150;

/// A game on top of the `chess` crate, keeping what the crate's `Board` does
/// not: move counters, repetition history, captures and the SAN record.
#[derive(Clone, Debug)]
pub struct ChessRules {
    board: Board,
    start_fen: String,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<ChessMove>,
    san_history: Vec<String>,
    visited_boards: Vec<u64>,  // List of board hashes, starting position included
    captured: Vec<(Color, Piece)>,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self::from_fen(STARTING_FEN).expect("starting position is valid")
    }
}

impl ChessRules {
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let board = Board::from_str(fen).map_err(|_| RulesError::InvalidFen(fen.to_string()))?;

        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove_clock = fields.get(4).and_then(|x| x.parse().ok()).unwrap_or(0);
        let fullmove_number = fields.get(5).and_then(|x| x.parse().ok()).unwrap_or(1);

        Ok(Self {
            board,
            start_fen: fen.trim().to_string(),
            halfmove_clock,
            fullmove_number,
            history: Vec::new(),
            san_history: Vec::new(),
            visited_boards: vec![board.get_hash()],
            captured: Vec::new(),
        })
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn starts_from_standard_position(&self) -> bool {
        self.start_fen == STARTING_FEN
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    fn repetitions(&self) -> usize {
        match self.visited_boards.last() {
            None => 0,
            Some(current) => self.visited_boards.iter().filter(|x| *x == current).count(),
        }
    }

    /// The piece a move takes, if any, including en passant.
    fn captured_by(&self, chess_move: ChessMove) -> Option<(Color, Piece)> {
        let dest = chess_move.get_dest();
        if let (Some(piece), Some(color)) = (self.board.piece_on(dest), self.board.color_on(dest)) {
            return Some((color, piece));
        }

        let source = chess_move.get_source();
        let is_pawn_move = self.board.piece_on(source) == Some(Piece::Pawn);
        if is_pawn_move && source.get_file() != dest.get_file() {
            return Some((!self.board.side_to_move(), Piece::Pawn));
        }

        None
    }

    fn captures_string(&self, taker: Color) -> String {
        self.captured.iter()
            .filter(|(color, _)| *color != taker)
            .map(|(color, piece)| match color {
                Color::White => piece_letter(*piece),
                Color::Black => piece_letter(*piece).to_ascii_lowercase(),
            })
            .collect()
    }

    fn diagram(&self) -> String {
        let mut rows = Vec::with_capacity(8);

        for rank in (0..8).rev() {
            let row: Vec<String> = (0..8)
                .map(|file| {
                    let square = ALL_SQUARES[rank * 8 + file];
                    match (self.board.piece_on(square), self.board.color_on(square)) {
                        (Some(piece), Some(Color::White)) => piece_letter(piece).to_string(),
                        (Some(piece), Some(Color::Black)) => piece_letter(piece).to_ascii_lowercase().to_string(),
                        _ => ".".to_string(),
                    }
                })
                .collect();
            rows.push(row.join(" "));
        }

        rows.join("\n")
    }
}

impl Rules for ChessRules {
    fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    fn push(&mut self, chess_move: ChessMove) -> Result<(), IllegalMove> {
        if !self.board.legal(chess_move) {
            return Err(IllegalMove(chess_move));
        }

        let san = to_san(&self.board, chess_move);
        let captured = self.captured_by(chess_move);
        let is_pawn_move = self.board.piece_on(chess_move.get_source()) == Some(Piece::Pawn);
        let mover = self.board.side_to_move();

        self.board = self.board.make_move_new(chess_move);

        match is_pawn_move || captured.is_some() {
            true => self.halfmove_clock = 0,
            false => self.halfmove_clock += 1,
        }
        if mover == Color::Black {
            self.fullmove_number += 1;
        }
        if let Some(taken) = captured {
            self.captured.push(taken);
        }

        self.history.push(chess_move);
        self.san_history.push(san);
        self.visited_boards.push(self.board.get_hash());

        Ok(())
    }

    fn is_legal(&self, chess_move: ChessMove) -> bool {
        self.board.legal(chess_move)
    }

    fn position_string(&self) -> String {
        // The crate's FEN does not know the move counters
        let placement: Vec<String> = self.board.to_string()
            .split_whitespace()
            .take(4)
            .map(|x| x.to_string())
            .collect();

        format!("{} {} {}", placement.join(" "), self.halfmove_clock, self.fullmove_number)
    }

    fn termination(&self) -> Termination {
        match self.board.status() {
            BoardStatus::Checkmate => return Termination::Checkmate,
            BoardStatus::Stalemate => return Termination::Stalemate,
            BoardStatus::Ongoing => (),
        }

        if has_insufficient_material(&self.board) {
            Termination::InsufficientMaterial
        } else if self.halfmove_clock >= SEVENTY_FIVE_MOVES_IN_PLIES {
            Termination::SeventyFiveMoves
        } else if self.repetitions() >= FIVEFOLD {
            Termination::FivefoldRepetition
        } else {
            Termination::Ongoing
        }
    }

    fn move_history(&self) -> &[ChessMove] {
        &self.history
    }

    fn san_history(&self) -> &[String] {
        &self.san_history
    }

    fn summary(&self) -> PositionSummary {
        PositionSummary {
            fullmove_number: self.fullmove_number,
            halfmove_clock: self.halfmove_clock,
            legal_moves: MoveGen::new_legal(&self.board).len(),
            in_check: *self.board.checkers() != EMPTY,
            captures: [self.captures_string(Color::White), self.captures_string(Color::Black)],
            diagram: self.diagram(),
        }
    }
}

fn is_light_square(square: Square) -> bool {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 1
}

/// Neither side can mate with any sequence of legal moves: bare kings, a
/// single minor piece, or only bishops that all stand on one square colour.
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy != EMPTY {
        return false;
    }

    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    if (knights | bishops).popcnt() <= 1 {
        return true;
    }
    if knights != EMPTY {
        return false;
    }

    let light_bishops = bishops.filter(|square| is_light_square(*square)).count() as u32;
    light_bishops == 0 || light_bishops == bishops.popcnt()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use chess::{ChessMove, Color};

    use super::{ChessRules, STARTING_FEN};
    use crate::rules::{IllegalMove, Rules, Termination};

    fn play(rules: &mut ChessRules, moves: &[&str]) {
        for text in moves {
            rules.push(ChessMove::from_str(text).unwrap()).unwrap();
        }
    }

    #[test]
    fn check_fools_mate() {
        let mut rules = ChessRules::default();
        play(&mut rules, &["f2f3", "e7e5", "g2g4"]);
        assert_eq!(rules.termination(), Termination::Ongoing);

        play(&mut rules, &["d8h4"]);
        assert_eq!(rules.termination(), Termination::Checkmate);
        assert_eq!(rules.side_to_move(), Color::White);
        assert_eq!(rules.san_history(), &["f3", "e5", "g4", "Qh4#"]);
    }

    #[test]
    fn check_illegal_move_rejected() {
        let mut rules = ChessRules::default();
        let bogus = ChessMove::from_str("e2e5").unwrap();

        assert_eq!(rules.push(bogus), Err(IllegalMove(bogus)));
        assert!(rules.move_history().is_empty());
        assert_eq!(rules.side_to_move(), Color::White);
    }

    #[test]
    fn check_position_string_counters() {
        let mut rules = ChessRules::default();
        assert_eq!(rules.position_string(), STARTING_FEN);

        play(&mut rules, &["e2e4"]);
        let fen = rules.position_string();
        assert!(fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq"));
        assert!(fen.ends_with(" 0 1"));

        play(&mut rules, &["e7e5", "g1f3"]);
        assert!(rules.position_string().ends_with(" 1 2"));
    }

    #[test]
    fn check_stalemate() {
        let rules = ChessRules::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(rules.termination(), Termination::Stalemate);
    }

    #[test]
    fn check_insufficient_material() {
        let bare_kings = ChessRules::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(bare_kings.termination(), Termination::InsufficientMaterial);

        let lone_knight = ChessRules::from_fen("8/8/8/4k3/8/8/8/4KN2 w - - 0 1").unwrap();
        assert_eq!(lone_knight.termination(), Termination::InsufficientMaterial);

        // c1 and f8 are both dark squares
        let same_shade_bishops = ChessRules::from_fen("5b2/8/8/4k3/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(same_shade_bishops.termination(), Termination::InsufficientMaterial);

        let opposite_bishops = ChessRules::from_fen("2b5/8/8/4k3/8/8/8/2B1K3 w - - 0 1").unwrap();
        assert_eq!(opposite_bishops.termination(), Termination::Ongoing);

        let rook = ChessRules::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 0 1").unwrap();
        assert_eq!(rook.termination(), Termination::Ongoing);
    }

    #[test]
    fn check_fivefold_repetition() {
        let mut rules = ChessRules::default();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];

        for _ in 0..3 {
            play(&mut rules, &shuffle);
        }
        play(&mut rules, &shuffle[..3]);
        assert_eq!(rules.termination(), Termination::Ongoing);

        play(&mut rules, &shuffle[3..]);
        assert_eq!(rules.termination(), Termination::FivefoldRepetition);
    }

    #[test]
    fn check_seventy_five_moves() {
        let mut rules = ChessRules::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 149 80").unwrap();
        assert_eq!(rules.termination(), Termination::Ongoing);

        play(&mut rules, &["a1a2"]);
        assert_eq!(rules.halfmove_clock(), 150);
        assert_eq!(rules.termination(), Termination::SeventyFiveMoves);
    }

    #[test]
    fn check_captures_are_tracked() {
        let mut rules = ChessRules::default();
        play(&mut rules, &["e2e4", "d7d5", "e4d5", "d8d5"]);

        let summary = rules.summary();
        assert_eq!(summary.captures, ["p".to_string(), "P".to_string()]);
        assert_eq!(summary.halfmove_clock, 0);
        assert_eq!(summary.fullmove_number, 3);
        assert!(!summary.in_check);
        assert!(summary.diagram.starts_with("r n b . k b n r"));
    }

    #[test]
    fn check_en_passant_capture_is_recorded() {
        let mut rules = ChessRules::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        play(&mut rules, &["e5d6"]);

        assert_eq!(rules.san_history(), &["exd6"]);
        assert_eq!(rules.summary().captures[0], "p");
    }
}
