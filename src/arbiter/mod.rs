// Everything above a single engine: the match loop, its configuration and its record.

pub mod args;
pub mod config;
pub mod match_orchestration;
pub mod record;
pub mod scoreboard;
