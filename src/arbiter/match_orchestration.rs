use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::{Duration, Instant};
use chess::Color;
use log::{debug, info};

use crate::arbiter::scoreboard;
use crate::core::clock::MatchClock;
use crate::core::ponder::{PonderAction, PonderCoordinator};
use crate::core::side_name;
use crate::engine::uci::{BestMove, GuiCommand, UciParseError};
use crate::engine::{EngineSession, WaitBudget};
use crate::error::{ArbiterError, ArbiterResult};
use crate::link::Channel;
use crate::rules::{Rules, Termination};

/// Slack on top of the mover's remaining time before a silent engine is given up on.
pub const BESTMOVE_MARGIN: Duration = Duration::from_secs(1);

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum MatchResult {
    WhiteWon,
    BlackWon,
    Draw,
}

impl MatchResult {
    pub fn win_for(side: Color) -> Self {
        match side {
            Color::White => MatchResult::WhiteWon,
            Color::Black => MatchResult::BlackWon,
        }
    }

    pub fn pgn_token(&self) -> &'static str {
        match self {
            MatchResult::WhiteWon => "1-0",
            MatchResult::BlackWon => "0-1",
            MatchResult::Draw => "1/2-1/2",
        }
    }
}

/// Why the match ended.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Conclusion {
    Board(Termination),
    TimeForfeit(Color),  // the side whose clock ran out
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MatchOutcome {
    pub conclusion: Conclusion,
    pub result: MatchResult,
}

impl MatchOutcome {
    /// `side_to_move` is the side that would move next, i.e. the mated side on checkmate.
    pub fn from_board(termination: Termination, side_to_move: Color) -> Self {
        let result = match termination {
            Termination::Checkmate => MatchResult::win_for(!side_to_move),
            _ => MatchResult::Draw,
        };

        Self {
            conclusion: Conclusion::Board(termination),
            result,
        }
    }

    pub fn time_forfeit(flagged: Color) -> Self {
        Self {
            conclusion: Conclusion::TimeForfeit(flagged),
            result: MatchResult::win_for(!flagged),
        }
    }
}

impl Display for MatchOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (self.conclusion, self.result) {
            (Conclusion::Board(Termination::Checkmate), MatchResult::WhiteWon) => {
                write!(f, "Game ended due to checkmate! Victory goes to White.")
            },
            (Conclusion::Board(Termination::Checkmate), _) => {
                write!(f, "Game ended due to checkmate! Victory goes to Black.")
            },
            (Conclusion::Board(termination), _) => write!(f, "Game ended due to {termination}. DRAW."),
            (Conclusion::TimeForfeit(flagged), _) => {
                let winner = match flagged {
                    Color::White => "Black",
                    Color::Black => "White",
                };
                write!(f, "The {} clock ran out. Victory goes to {winner}.", side_name(flagged))
            },
        }
    }
}

/// One engine and the reply it is pondering on.
pub struct Seat<C: Channel> {
    pub session: EngineSession<C>,
    pub ponder: PonderCoordinator,
}

impl<C: Channel> Seat<C> {
    pub fn new(session: EngineSession<C>) -> Self {
        Self {
            session,
            ponder: PonderCoordinator::new(),
        }
    }
}

/// Drives a timed match between two initialized engine sessions.
pub struct MatchArbiter<C: Channel, R: Rules> {
    seats: [Seat<C>; 2],  // Indexed by `Color::to_index`
    clock: MatchClock,
    rules: R,
    title: String,
    verbose: bool,
}

impl<C: Channel, R: Rules> MatchArbiter<C, R> {
    pub fn new(white: EngineSession<C>, black: EngineSession<C>, clock: MatchClock, rules: R) -> Self {
        Self {
            seats: [Seat::new(white), Seat::new(black)],
            clock,
            rules,
            title: String::new(),
            verbose: false,
        }
    }

    /// Prints a scoreboard headed by `title` before every turn.
    pub fn with_scoreboard(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self.verbose = true;
        self
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    pub fn seat(&self, side: Color) -> &Seat<C> {
        &self.seats[side.to_index()]
    }

    /// Plays turns until the board or a clock ends the match.
    pub fn play(&mut self) -> ArbiterResult<MatchOutcome> {
        loop {
            if let Some(outcome) = self.play_turn()? {
                info!("{outcome}");
                return Ok(outcome);
            }
        }
    }

    /// Plays one move, or reports the outcome if the game is already over.
    pub fn play_turn(&mut self) -> ArbiterResult<Option<MatchOutcome>> {
        let side = self.rules.side_to_move();
        let termination = self.rules.termination();

        if self.verbose {
            self.print_scoreboard(side);
        }

        if termination.is_over() {
            return Ok(Some(MatchOutcome::from_board(termination, side)));
        }

        self.start_search(side)?;

        let budget = self.clock.thinking_budget(side) + BESTMOVE_MARGIN;
        let search_start = Instant::now();
        let line = self.seats[side.to_index()].session
            .wait_for_token("bestmove", WaitBudget::Until(search_start + budget))?;
        let elapsed = search_start.elapsed().as_secs_f64();

        self.clock.charge_elapsed(side, elapsed);
        if self.clock.flagged(side) {
            return Ok(Some(MatchOutcome::time_forfeit(side)));
        }

        let best_move = BestMove::from_str(&line).map_err(|e| ArbiterError::IllegalEngineMove {
            side,
            token: match e {
                UciParseError::NotBestMove(line) => line,
                UciParseError::InvalidBestMove(token) => token,
            },
        })?;

        self.rules.push(best_move.best).map_err(|_| ArbiterError::IllegalEngineMove {
            side,
            token: best_move.best.to_string(),
        })?;

        info!(
            "{} played {} in {:.1}s ({:.1}s left)",
            self.seats[side.to_index()].session.identity().display_name,
            self.rules.san_history().last().map(|x| x.as_str()).unwrap_or("?"),
            elapsed,
            self.clock.remaining(side),
        );

        self.start_pondering(side, best_move.ponder)?;

        Ok(None)
    }

    /// Best effort teardown of both engines.
    pub fn shutdown(&mut self) {
        for seat in self.seats.iter_mut() {
            seat.session.shutdown();
        }
    }

    /// Gets `side`'s engine searching the current position, reusing its
    /// ponder search if the opponent played into it.
    fn start_search(&mut self, side: Color) -> ArbiterResult<()> {
        let opponent_move = self.rules.move_history().last().copied();
        let seat = &mut self.seats[side.to_index()];

        match seat.ponder.resolve(opponent_move) {
            PonderAction::Hit => {
                debug!("Ponder hit for {}", side_name(side));
                seat.session.send_acked(&GuiCommand::PonderHit)?;
            },
            PonderAction::Reposition => {
                // Just in case it is pondering
                seat.session.stop()?;
                seat.session.send_acked(&GuiCommand::Position {
                    fen: self.rules.position_string(),
                    moves: vec![],
                })?;
                seat.session.send_acked(&GuiCommand::Go(self.clock.time_control()))?;
            },
        }

        Ok(())
    }

    /// Keeps the mover's engine searching on its predicted reply while the
    /// opponent thinks. Nothing is awaited.
    fn start_pondering(&mut self, side: Color, suggestion: Option<chess::ChessMove>) -> ArbiterResult<()> {
        let prediction = suggestion.filter(|predicted| self.rules.is_legal(*predicted));
        let seat = &mut self.seats[side.to_index()];

        seat.ponder.arm(prediction);

        if let Some(predicted) = prediction {
            seat.session.send_acked(&GuiCommand::Position {
                fen: self.rules.position_string(),
                moves: vec![predicted],
            })?;
            seat.session.send_unacked(&GuiCommand::GoPonder(self.clock.time_control()))?;
        }

        Ok(())
    }

    fn print_scoreboard(&self, side: Color) {
        scoreboard::print_turn(
            &self.title,
            &self.seats[Color::White.to_index()].session.identity().display_name,
            &self.seats[Color::Black.to_index()].session.identity().display_name,
            &self.clock,
            side,
            &self.rules.summary(),
        );
    }
}
