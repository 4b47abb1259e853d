use chess::ChessMove;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PonderState {
    Idle,
    Pondering(ChessMove),  // the reply the engine is searching on
}

impl Default for PonderState {
    fn default() -> Self {
        PonderState::Idle
    }
}

/// What to tell an engine before its turn.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PonderAction {
    /// The opponent played the predicted move: `ponderhit`.
    Hit,
    /// Anything else: `stop`, then a fresh `position` and `go`.
    Reposition,
}

/// One side's ponder prediction.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PonderCoordinator {
    state: PonderState,
}

impl PonderCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PonderState {
        self.state
    }

    pub fn prediction(&self) -> Option<ChessMove> {
        match self.state {
            PonderState::Idle => None,
            PonderState::Pondering(predicted) => Some(predicted),
        }
    }

    /// Called once this side's move is committed, with the engine's ponder suggestion.
    pub fn arm(&mut self, prediction: Option<ChessMove>) {
        self.state = match prediction {
            Some(predicted) => PonderState::Pondering(predicted),
            None => PonderState::Idle,
        };
    }

    /// Compares the opponent's actual move with the stored prediction and
    /// returns to `Idle` either way.
    pub fn resolve(&mut self, opponent_move: Option<ChessMove>) -> PonderAction {
        let action = match (self.state, opponent_move) {
            (PonderState::Pondering(predicted), Some(actual)) if predicted == actual => PonderAction::Hit,
            _ => PonderAction::Reposition,
        };

        self.state = PonderState::Idle;
        action
    }
}
