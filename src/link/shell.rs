use std::io;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use log::debug;

use super::{strip_terminator, Channel};

/// A locally spawned console (e.g. `sh`) standing in for a serial login.
///
/// Written lines are echoed back into the incoming queue before they reach the
/// console, the way a terminal's line discipline echoes typed input. Engines
/// launched from the console inherit its stdin and stdout.
pub struct ShellChannel {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    echo: Sender<String>,
}

impl ShellChannel {
    pub fn spawn(program: &str, args: &[String]) -> io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "console stdin unavailable"))?;
        let stdout = child.stdout.take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "console stdout unavailable"))?;

        let (line_tx, line_rx) = channel::<String>();
        let echo = line_tx.clone();

        // The thread that forwards console output
        thread::spawn(move || {
            forward_lines(stdout, line_tx);
        });

        debug!("Spawned console '{program}' (pid {})", child.id());

        Ok(Self {
            child,
            stdin,
            lines: line_rx,
            echo,
        })
    }
}

fn forward_lines(stdout: ChildStdout, line_tx: Sender<String>) {
    let mut reader = BufReader::new(stdout);

    loop {
        let mut buffer = String::new();
        match reader.read_line(&mut buffer) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if line_tx.send(strip_terminator(&buffer).to_string()).is_err() {
                    break;
                }
            },
        }
    }
}

impl Channel for ShellChannel {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        // Receiver lives in self, so the echo cannot fail to send
        let _ = self.echo.send(text.to_string());

        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(b'\n');

        self.stdin.write_all(&bytes)
    }

    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => Ok(Some(line)),
            Err(RecvTimeoutError::Timeout) => match self.child.try_wait()? {
                Some(status) => Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    format!("console exited ({status})"),
                )),
                None => Ok(None),
            },
            Err(RecvTimeoutError::Disconnected) => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "console output closed",
            )),
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        while self.lines.try_recv().is_ok() {}

        Ok(())
    }
}

impl Drop for ShellChannel {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
