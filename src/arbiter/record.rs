use std::fmt::{Display, Formatter};
use std::fs::{create_dir_all, OpenOptions};
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use itertools::Itertools;

use crate::arbiter::match_orchestration::{Conclusion, MatchOutcome, MatchResult};
use crate::rules::{ChessRules, Rules};

const MOVETEXT_WIDTH: usize = 80;

/// Header fields that come from the match configuration rather than the game.
#[derive(Clone, Debug)]
pub struct RecordHeaders {
    pub event: String,
    pub site: String,
    pub round: String,
    pub white: String,
    pub black: String,
}

/// A finished game in PGN.
#[derive(Clone, Debug)]
pub struct GameRecord {
    pub headers: RecordHeaders,
    pub date: NaiveDate,
    pub result: MatchResult,
    pub termination: &'static str,
    /// Only set when the game did not start from the standard position.
    pub start_fen: Option<String>,
    pub moves: Vec<String>,
}

impl GameRecord {
    pub fn from_game(headers: RecordHeaders, date: NaiveDate, rules: &ChessRules, outcome: &MatchOutcome) -> Self {
        let termination = match outcome.conclusion {
            Conclusion::Board(_) => "normal",
            Conclusion::TimeForfeit(_) => "time forfeit",
        };

        Self {
            headers,
            date,
            result: outcome.result,
            termination,
            start_fen: match rules.starts_from_standard_position() {
                true => None,
                false => Some(rules.start_fen().to_string()),
            },
            moves: rules.san_history().to_vec(),
        }
    }

    /// Move numbers and SAN, wrapped, ending with the result token.
    fn movetext(&self) -> String {
        let (mut number, mut white_to_move) = match &self.start_fen {
            Some(fen) => start_of(fen),
            None => (1, true),
        };

        let mut tokens = Vec::with_capacity(self.moves.len() * 3 / 2 + 1);
        for (index, san) in self.moves.iter().enumerate() {
            if white_to_move {
                tokens.push(format!("{number}."));
            } else if index == 0 {
                tokens.push(format!("{number}..."));
            }
            tokens.push(san.clone());

            if !white_to_move {
                number += 1;
            }
            white_to_move = !white_to_move;
        }
        tokens.push(self.result.pgn_token().to_string());

        let mut text = String::new();
        let mut width = 0;
        for token in tokens {
            if width > 0 && width + 1 + token.len() > MOVETEXT_WIDTH {
                text.push('\n');
                width = 0;
            } else if width > 0 {
                text.push(' ');
                width += 1;
            }
            text.push_str(&token);
            width += token.len();
        }

        text
    }

    /// Appends the record to `<dir>/<date>.pgn`, creating both if needed.
    pub fn append_to_dated_file(&self, dir: &Path) -> io::Result<PathBuf> {
        create_dir_all(dir)?;
        let path = dir.join(format!("{}.pgn", self.date.format("%Y-%m-%d")));

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{self}")?;

        Ok(path)
    }
}

/// Fullmove number and whether white moves first, from a FEN's last fields.
fn start_of(fen: &str) -> (u32, bool) {
    let fields = fen.split_whitespace().collect_vec();
    let white_to_move = fields.get(1).map(|x| *x != "b").unwrap_or(true);
    let number = fields.get(5).and_then(|x| x.parse().ok()).unwrap_or(1);

    (number, white_to_move)
}

impl Display for GameRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let headers = &self.headers;
        let mut tags = vec![
            ("Event", headers.event.clone()),
            ("Site", headers.site.clone()),
            ("Date", self.date.format("%Y.%m.%d").to_string()),
            ("Round", headers.round.clone()),
            ("White", headers.white.clone()),
            ("Black", headers.black.clone()),
            ("Result", self.result.pgn_token().to_string()),
            ("Termination", self.termination.to_string()),
        ];
        if let Some(fen) = &self.start_fen {
            tags.push(("SetUp", "1".to_string()));
            tags.push(("FEN", fen.clone()));
        }

        for (name, value) in tags {
            writeln!(f, "[{name} \"{}\"]", value.replace('\\', "\\\\").replace('"', "\\\""))?;
        }
        writeln!(f)?;
        writeln!(f, "{}", self.movetext())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use chess::{ChessMove, Color};
    use chrono::NaiveDate;

    use super::{GameRecord, RecordHeaders};
    use crate::arbiter::match_orchestration::MatchOutcome;
    use crate::rules::{ChessRules, Rules, Termination};

    fn headers() -> RecordHeaders {
        RecordHeaders {
            event: "Computer Chess Championship Series".to_string(),
            site: "Houston, Texas".to_string(),
            round: "-".to_string(),
            white: "Stockfish #1".to_string(),
            black: "Stockfish #2".to_string(),
        }
    }

    fn play(rules: &mut ChessRules, moves: &[&str]) {
        for text in moves {
            rules.push(ChessMove::from_str(text).unwrap()).unwrap();
        }
    }

    #[test]
    fn check_fools_mate_record() {
        let mut rules = ChessRules::default();
        play(&mut rules, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        let outcome = MatchOutcome::from_board(Termination::Checkmate, Color::White);
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let text = GameRecord::from_game(headers(), date, &rules, &outcome).to_string();

        assert!(text.contains("[Date \"2026.10.19\"]"));
        assert!(text.contains("[White \"Stockfish #1\"]"));
        assert!(text.contains("[Result \"0-1\"]"));
        assert!(!text.contains("[FEN"));
        assert!(text.ends_with("\n\n1. f3 e5 2. g4 Qh4# 0-1\n"));
    }

    #[test]
    fn check_custom_start_with_black_to_move() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4PP2/8/PPPP2PP/RNBQKBNR b KQkq - 0 2";
        let mut rules = ChessRules::from_fen(fen).unwrap();
        play(&mut rules, &["e5f4", "g1f3"]);
        let outcome = MatchOutcome::time_forfeit(Color::Black);
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let text = GameRecord::from_game(headers(), date, &rules, &outcome).to_string();

        assert!(text.contains("[SetUp \"1\"]"));
        assert!(text.contains(&format!("[FEN \"{fen}\"]")));
        assert!(text.contains("[Termination \"time forfeit\"]"));
        assert!(text.ends_with("2... exf4 3. Nf3 1-0\n"));
    }

    #[test]
    fn check_long_games_wrap() {
        let mut rules = ChessRules::default();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        for _ in 0..4 {
            play(&mut rules, &shuffle);
        }
        let outcome = MatchOutcome::from_board(Termination::FivefoldRepetition, Color::White);
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();

        let text = GameRecord::from_game(headers(), date, &rules, &outcome).to_string();
        let movetext = text.split("\n\n").nth(1).unwrap();

        assert!(movetext.lines().count() > 1);
        assert!(movetext.lines().all(|line| line.len() <= 80));
        assert!(movetext.trim_end().ends_with("1/2-1/2"));
    }

    #[test]
    fn check_append_to_dated_file() {
        let dir = std::env::temp_dir().join(format!("uci_arbiter_record_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let mut rules = ChessRules::default();
        play(&mut rules, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        let outcome = MatchOutcome::from_board(Termination::Checkmate, Color::White);
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let record = GameRecord::from_game(headers(), date, &rules, &outcome);

        let path = record.append_to_dated_file(&dir).unwrap();
        record.append_to_dated_file(&dir).unwrap();

        assert_eq!(path, dir.join("2026-10-19.pgn"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.matches("[Event ").count(), 2);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
