use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::Deserialize;
use thiserror::Error;

use crate::core::clock::MAX_CLOCK_SECONDS;
use crate::engine::{EngineIdentity, EngineSession, SessionSettings};
use crate::error::ArbiterResult;
use crate::link::{Channel, SerialChannel, ShellChannel};
use crate::rules::chess_rules::STARTING_FEN;
use crate::rules::{ChessRules, RulesError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read match configuration {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        source: io::Error,
    },
    #[error("Malformed match configuration: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid clock setting: {0}")]
    InvalidClock(String),
    #[error(transparent)]
    InvalidStart(#[from] RulesError),
}

/// How to reach the console an engine runs on.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    Serial {
        port: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
    },
    Shell {
        #[serde(default = "default_shell")]
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl TransportConfig {
    pub fn open(&self, read_timeout: Duration) -> io::Result<Box<dyn Channel>> {
        match self {
            TransportConfig::Serial { port, baud_rate } => {
                Ok(Box::new(SerialChannel::open(port, *baud_rate, read_timeout)?))
            },
            TransportConfig::Shell { program, args } => Ok(Box::new(ShellChannel::spawn(program, args)?)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TransportConfig::Serial { port, baud_rate } => format!("{port} @ {baud_rate}"),
            TransportConfig::Shell { program, .. } => format!("console '{program}'"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SeatConfig {
    #[serde(flatten)]
    pub identity: EngineIdentity,
    pub transport: TransportConfig,
}

impl SeatConfig {
    /// Opens the console and brings the engine through its handshake.
    pub fn connect(&self, settings: SessionSettings) -> ArbiterResult<EngineSession<Box<dyn Channel>>> {
        let channel = self.transport.open(settings.read_timeout())?;
        let session = EngineSession::initialize(self.identity.clone(), channel, settings)?;

        log::info!(
            "Chess engine on {} initialized with {} engine.",
            self.transport.describe(),
            self.identity.launch,
        );

        Ok(session)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_event")]
    pub event: String,
    #[serde(default = "default_site")]
    pub site: String,
    #[serde(default = "default_round")]
    pub round: String,
    /// Tracked events keep their own records; only the others go to the dated file.
    #[serde(default)]
    pub tracked_event: bool,
    #[serde(default = "default_record_dir")]
    pub record_dir: PathBuf,
    #[serde(default = "default_start_fen")]
    pub start_fen: String,
    #[serde(default = "default_initial_seconds")]
    pub initial_seconds: f64,
    #[serde(default)]
    pub increment_seconds: f64,
    #[serde(default)]
    pub session: SessionSettings,
    pub white: SeatConfig,
    pub black: SeatConfig,
}

fn default_event() -> String {
    "Computer Chess Championship Series".to_string()
}

fn default_site() -> String {
    "?".to_string()
}

fn default_round() -> String {
    "-".to_string()
}

fn default_record_dir() -> PathBuf {
    PathBuf::from("games")
}

fn default_start_fen() -> String {
    STARTING_FEN.to_string()
}

fn default_initial_seconds() -> f64 {
    300.0
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_shell() -> String {
    "sh".to_string()
}

impl MatchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_seconds > 0.0 && self.initial_seconds <= MAX_CLOCK_SECONDS) {
            return Err(ConfigError::InvalidClock(format!(
                "initial time must be positive and at most {MAX_CLOCK_SECONDS} s, got {}",
                self.initial_seconds,
            )));
        }
        if !(self.increment_seconds >= 0.0 && self.increment_seconds <= MAX_CLOCK_SECONDS) {
            return Err(ConfigError::InvalidClock(format!(
                "increment must be between 0 and {MAX_CLOCK_SECONDS} s, got {}",
                self.increment_seconds,
            )));
        }
        ChessRules::from_fen(&self.start_fen)?;

        Ok(())
    }

    pub fn title(&self) -> String {
        match self.site.as_str() {
            "?" => self.event.clone(),
            site => format!("{} ({site})", self.event),
        }
    }
}
