use std::io;
use chess::Color;
use thiserror::Error;

/// Everything that can end a match abnormally. None of these are retried.
#[derive(Error, Debug)]
pub enum ArbiterError {
    #[error("Channel fault: {0}")]
    ChannelFault(#[from] io::Error),
    #[error("Chess engine not responding with expected name (expected '{expected}', got '{received}')")]
    EngineIdentityMismatch {
        expected: String,
        received: String,
    },
    #[error("Was waiting to see '{token}' but it never showed up ({consulted} lines consulted)")]
    ProtocolTimeout {
        token: String,
        consulted: u32,
    },
    #[error("Attempted command '{command}' but got invalid response '{response}'")]
    ProtocolViolation {
        command: String,
        response: String,
    },
    #[error("{side:?} engine proposed an illegal move: '{token}'")]
    IllegalEngineMove {
        side: Color,
        token: String,
    },
}

pub type ArbiterResult<T> = Result<T, ArbiterError>;
