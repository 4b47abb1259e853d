//! One engine behind one console.
//!
//! Matching is by substring throughout: a line is asynchronous output if it
//! contains `info` anywhere, an acknowledgement is good if it contains the
//! command text, and an awaited token only has to appear somewhere in the
//! line. Engines behind a serial console do not agree on whitespace, so
//! nothing here tokenizes strictly.

use std::thread::sleep;
use std::time::{Duration, Instant};
use log::{debug, warn};
use serde::Deserialize;

use crate::engine::uci::{GuiCommand, HASH_SIZE_MB};
use crate::error::{ArbiterError, ArbiterResult};
use crate::link::Channel;

pub mod uci;

pub const ASYNC_MARKER: &str = "info";

/// Who we expect to find at the other end of a channel.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct EngineIdentity {
    /// What to type at the console prompt to start the engine.
    pub launch: String,
    /// Must appear in the first line the engine prints.
    pub expected_name: String,
    pub display_name: String,
}

/// Timing knobs for a session. The defaults suit a 115200 baud console.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// How long one read waits before reporting silence.
    pub read_timeout_ms: u64,
    /// How long to wait for stragglers when clearing output before a send.
    pub drain_timeout_ms: u64,
    /// Pause before discarding output after `stop` or ahead of `position`.
    pub settle_ms: u64,
    /// Line budget for `uciok`, `readyok` and the identity line.
    pub handshake_lines: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: 1000,
            drain_timeout_ms: 100,
            settle_ms: 100,
            handshake_lines: 60,
        }
    }
}

impl SessionSettings {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// How long `wait_for_token` may keep reading.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WaitBudget {
    /// At most this many reads; a read that times out still counts.
    Lines(u32),
    /// Keep reading until this instant has passed.
    Until(Instant),
}

pub struct EngineSession<C: Channel> {
    identity: EngineIdentity,
    channel: C,
    settings: SessionSettings,
    last_sent: Option<String>,
    identity_line: Option<String>,
    live: bool,
}

impl<C: Channel> EngineSession<C> {
    /// Launches the engine from the console prompt, checks who answered and
    /// runs the UCI handshake.
    pub fn initialize(identity: EngineIdentity, channel: C, settings: SessionSettings) -> ArbiterResult<Self> {
        let mut session = Self::attach(identity, channel, settings);

        let launch = GuiCommand::Launch(session.identity.launch.clone());
        session.send_acked(&launch)?;

        let identity_line = session.read_identity_line()?;
        if !identity_line.contains(&session.identity.expected_name) {
            return Err(ArbiterError::EngineIdentityMismatch {
                expected: session.identity.expected_name.clone(),
                received: identity_line,
            });
        }
        session.identity_line = Some(identity_line);

        let handshake = WaitBudget::Lines(session.settings.handshake_lines);

        session.send_acked(&GuiCommand::Uci)?;
        session.wait_for_token("uciok", handshake)?;

        session.send_acked(&GuiCommand::SetHash(HASH_SIZE_MB))?;
        session.send_acked(&GuiCommand::IsReady)?;
        session.wait_for_token("readyok", handshake)?;

        Ok(session)
    }

    /// Wraps a channel whose engine is already running and past its handshake.
    pub fn attach(identity: EngineIdentity, channel: C, settings: SessionSettings) -> Self {
        Self {
            identity,
            channel,
            settings,
            last_sent: None,
            identity_line: None,
            live: true,
        }
    }

    pub fn identity(&self) -> &EngineIdentity {
        &self.identity
    }

    pub fn identity_line(&self) -> Option<&str> {
        self.identity_line.as_deref()
    }

    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Sends a command and insists on seeing it echoed back.
    ///
    /// Never use this for `stop`: see [`EngineSession::stop`].
    pub fn send_acked(&mut self, command: &GuiCommand) -> ArbiterResult<()> {
        let text = command.to_string();

        self.discard_pending()?;
        if command.is_position() {
            // A `bestmove` answering an earlier stop may still be on its way
            self.settle()?;
        }

        self.write(&text)?;

        let echo = self.gobble_async()?.unwrap_or_default();
        if !echo.contains(&text) {
            return Err(ArbiterError::ProtocolViolation {
                command: text,
                response: echo,
            });
        }

        debug!("[{}] Sent: {text}", self.identity.display_name);
        Ok(())
    }

    /// Sends a command without reading any acknowledgement.
    pub fn send_unacked(&mut self, command: &GuiCommand) -> ArbiterResult<()> {
        let text = command.to_string();

        self.discard_pending()?;
        self.write(&text)?;

        debug!("[{}] Sent (unacknowledged): {text}", self.identity.display_name);
        Ok(())
    }

    /// Halts any search in flight. The engine may answer with a `bestmove` at
    /// any point, so whatever it says next is thrown away.
    pub fn stop(&mut self) -> ArbiterResult<()> {
        self.send_unacked(&GuiCommand::Stop)?;
        self.settle()
    }

    /// Reads past blank lines and `info` lines. Returns the first other line,
    /// or `None` once a read times out.
    pub fn gobble_async(&mut self) -> ArbiterResult<Option<String>> {
        self.gobble_async_within(self.settings.read_timeout())
    }

    /// Reads until a line contains `token` or the budget runs out.
    pub fn wait_for_token(&mut self, token: &str, budget: WaitBudget) -> ArbiterResult<String> {
        let mut consulted = 0u32;

        loop {
            let timeout = match budget {
                WaitBudget::Lines(lines) => {
                    if consulted >= lines {
                        break;
                    }
                    self.settings.read_timeout()
                },
                WaitBudget::Until(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    self.settings.read_timeout().min(deadline - now)
                },
            };

            consulted += 1;
            match self.channel.read_line(timeout)? {
                Some(line) => {
                    debug!("[{}] Waiting for '{token}' saw: {line}", self.identity.display_name);
                    if line.contains(token) {
                        return Ok(line);
                    }
                },
                None => debug!("[{}] Waiting for '{token}': silence", self.identity.display_name),
            }
        }

        Err(ArbiterError::ProtocolTimeout {
            token: token.to_string(),
            consulted,
        })
    }

    /// Best effort `quit`. Safe to call more than once; errors are only logged.
    pub fn shutdown(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;

        let name = &self.identity.display_name;
        if let Err(e) = self.channel.reset() {
            warn!("[{name}] Could not reset channel before quit: {e}");
        }
        if let Err(e) = self.channel.write_line(&GuiCommand::Quit.to_string()) {
            warn!("[{name}] Could not send quit: {e}");
        }
        // let the line drain before the output buffer is cleared
        sleep(self.settings.settle());
        if let Err(e) = self.channel.reset() {
            warn!("[{name}] Could not reset channel after quit: {e}");
        }

        debug!("[{name}] Shut down");
    }

    fn gobble_async_within(&mut self, timeout: Duration) -> ArbiterResult<Option<String>> {
        loop {
            match self.channel.read_line(timeout)? {
                None => return Ok(None),
                Some(line) => {
                    debug!("[{}] Gobble saw: {line}", self.identity.display_name);
                    if is_async_output(&line) {
                        continue;
                    }
                    return Ok(Some(line));
                },
            }
        }
    }

    /// Clears whatever the engine said since we last listened.
    fn discard_pending(&mut self) -> ArbiterResult<()> {
        if let Some(line) = self.gobble_async_within(self.settings.drain_timeout())? {
            debug!("[{}] Discarding stale output: {line}", self.identity.display_name);
        }

        Ok(())
    }

    fn settle(&mut self) -> ArbiterResult<()> {
        sleep(self.settings.settle());
        self.channel.reset()?;

        Ok(())
    }

    fn write(&mut self, text: &str) -> ArbiterResult<()> {
        self.channel.write_line(text)?;
        self.last_sent = Some(text.to_string());

        Ok(())
    }

    /// First non-blank line after the launch echo.
    fn read_identity_line(&mut self) -> ArbiterResult<String> {
        for _ in 0..self.settings.handshake_lines {
            if let Some(line) = self.channel.read_line(self.settings.read_timeout())? {
                if !line.trim().is_empty() {
                    return Ok(line);
                }
            }
        }

        Err(ArbiterError::ProtocolTimeout {
            token: self.identity.expected_name.clone(),
            consulted: self.settings.handshake_lines,
        })
    }
}

impl<C: Channel> Drop for EngineSession<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn is_async_output(line: &str) -> bool {
    line.trim().is_empty() || line.contains(ASYNC_MARKER)
}

#[test]
fn check_async_output_classification() {
    assert!(is_async_output(""));
    assert!(is_async_output("   \r"));
    assert!(is_async_output("info depth 12 seldepth 18 score cp 31 pv e2e4"));
    assert!(is_async_output("string info from the console"));

    assert!(!is_async_output("bestmove e2e4 ponder e7e5"));
    assert!(!is_async_output("readyok"));
}
