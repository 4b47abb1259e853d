use std::collections::VecDeque;
use std::io;
use std::thread::sleep;
use std::time::Duration;

use crate::engine::{EngineIdentity, EngineSession, SessionSettings};
use crate::link::Channel;


/// What a read from a `ScriptedChannel` produces next.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Incoming {
    Line(String),
    /// A read that sleeps this long and then times out.
    Silence(Duration),
}

pub fn line(text: &str) -> Incoming {
    Incoming::Line(text.to_string())
}

/// Produces console output in reaction to a written line.
pub trait Respond {
    fn respond(&mut self, command: &str) -> Vec<Incoming>;
}

impl<F: FnMut(&str) -> Vec<Incoming>> Respond for F {
    fn respond(&mut self, command: &str) -> Vec<Incoming> {
        self(command)
    }
}

/// In-memory console. Reads pop a queue that tests feed directly or that a
/// responder fills whenever a line is written.
pub struct ScriptedChannel {
    incoming: VecDeque<Incoming>,
    written: Vec<String>,
    reads: usize,
    resets: usize,
    responder: Option<Box<dyn Respond>>,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self {
            incoming: VecDeque::new(),
            written: Vec::new(),
            reads: 0,
            resets: 0,
            responder: None,
        }
    }

    pub fn with_responder(responder: impl Respond + 'static) -> Self {
        let mut channel = Self::new();
        channel.responder = Some(Box::new(responder));
        channel
    }

    pub fn feed(&mut self, lines: &[&str]) {
        self.incoming.extend(lines.iter().map(|x| line(x)));
    }

    pub fn feed_silence(&mut self, duration: Duration) {
        self.incoming.push_back(Incoming::Silence(duration));
    }

    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn resets(&self) -> usize {
        self.resets
    }

    pub fn pending(&self) -> usize {
        self.incoming.len()
    }
}

impl Channel for ScriptedChannel {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.written.push(text.to_string());

        if let Some(responder) = self.responder.as_mut() {
            let output = responder.respond(text);
            self.incoming.extend(output);
        }

        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        self.reads += 1;

        match self.incoming.pop_front() {
            Some(Incoming::Line(text)) => Ok(Some(text)),
            Some(Incoming::Silence(duration)) => {
                sleep(duration);
                Ok(None)
            },
            None => {
                sleep(timeout);
                Ok(None)
            },
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        self.resets += 1;
        self.incoming.clear();

        Ok(())
    }
}

/// A UCI engine behind an echoing console, playing moves from a script.
pub struct FakeEngine {
    launch: String,
    banner: String,
    answers_uci: bool,
    /// One entry per search: the `bestmove` line to send when it finishes.
    searches: VecDeque<String>,
    /// Time each search takes before its `bestmove`.
    think: Duration,
    pondering: bool,
}

impl FakeEngine {
    pub fn new(launch: &str, banner: &str) -> Self {
        Self {
            launch: launch.to_string(),
            banner: banner.to_string(),
            answers_uci: true,
            searches: VecDeque::new(),
            think: Duration::ZERO,
            pondering: false,
        }
    }

    pub fn stockfish() -> Self {
        Self::new("stockfish", "Stockfish 15 by the Stockfish developers (see AUTHORS file)")
    }

    pub fn playing(mut self, searches: &[&str]) -> Self {
        self.searches = searches.iter().map(|x| x.to_string()).collect();
        self
    }

    pub fn thinking_for(mut self, think: Duration) -> Self {
        self.think = think;
        self
    }

    pub fn without_uciok(mut self) -> Self {
        self.answers_uci = false;
        self
    }

    fn finish_search(&mut self, output: &mut Vec<Incoming>) {
        if !self.think.is_zero() {
            output.push(Incoming::Silence(self.think));
        }
        output.push(line("info depth 1 seldepth 1 multipv 1 score cp 20 nodes 20 nps 20000 pv e2e4"));
        output.push(line("info depth 2 seldepth 2 multipv 1 score cp 31 nodes 72 nps 72000 pv e2e4 e7e5"));
        if let Some(best) = self.searches.pop_front() {
            output.push(Incoming::Line(best));
        }
    }
}

impl Respond for FakeEngine {
    fn respond(&mut self, command: &str) -> Vec<Incoming> {
        // the console echoes everything typed at it
        let mut output = vec![line(command)];

        if command == self.launch {
            output.push(Incoming::Line(self.banner.clone()));
        } else if command == "uci" {
            output.push(line("id name Stockfish 15"));
            output.push(line("id author the Stockfish developers (see AUTHORS file)"));
            output.push(line(""));
            for option in 0..25 {
                output.push(Incoming::Line(format!("option name Option{option} type check default false")));
            }
            if self.answers_uci {
                output.push(line("uciok"));
            }
        } else if command == "isready" {
            output.push(line("readyok"));
        } else if command.starts_with("go ponder") {
            self.pondering = true;
            output.push(line("info depth 1 seldepth 1 multipv 1 score cp 15 nodes 30 nps 30000 pv g1f3"));
        } else if command.starts_with("go ") {
            self.finish_search(&mut output);
        } else if command == "ponderhit" {
            self.pondering = false;
            self.finish_search(&mut output);
        } else if command == "stop" && self.pondering {
            self.pondering = false;
            // the abandoned ponder search still reports a move
            output.push(line("bestmove a7a6 ponder a2a3"));
        }

        output
    }
}

pub fn test_settings() -> SessionSettings {
    SessionSettings {
        read_timeout_ms: 5,
        drain_timeout_ms: 1,
        settle_ms: 0,
        handshake_lines: 60,
    }
}

pub fn identity(display_name: &str, expected_name: &str) -> EngineIdentity {
    EngineIdentity {
        launch: "stockfish".to_string(),
        expected_name: expected_name.to_string(),
        display_name: display_name.to_string(),
    }
}

/// A session on an engine that is already past its handshake.
pub fn attached(display_name: &str, engine: FakeEngine) -> EngineSession<ScriptedChannel> {
    EngineSession::attach(
        identity(display_name, "Stockfish"),
        ScriptedChannel::with_responder(engine),
        test_settings(),
    )
}
