use std::io;
use std::time::Duration;

pub mod serial;
pub mod shell;

pub use serial::SerialChannel;
pub use shell::ShellChannel;

/// A half-duplex, line-oriented text link to a console running a chess engine.
///
/// A read that runs out of time is not an error: it is reported as `Ok(None)`
/// and the caller decides what silence means. Anything returned as `Err` is a
/// fault of the link itself and ends the match.
pub trait Channel {
    /// Writes `text` followed by a newline. Does not flush.
    fn write_line(&mut self, text: &str) -> io::Result<()>;

    /// Returns one line with its terminator stripped, or `None` if nothing
    /// complete arrived within `timeout`.
    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>>;

    /// Drops buffered unread input (including a partial line) and unsent output.
    fn reset(&mut self) -> io::Result<()>;
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        (**self).write_line(text)
    }

    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        (**self).read_line(timeout)
    }

    fn reset(&mut self) -> io::Result<()> {
        (**self).reset()
    }
}

/// Splits the first complete line off the front of `pending`.
pub(crate) fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let end = pending.iter().position(|&byte| byte == b'\n')?;
    let raw: Vec<u8> = pending.drain(..=end).collect();

    Some(strip_terminator(&String::from_utf8_lossy(&raw)).to_string())
}

pub(crate) fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(|c| c == '\n' || c == '\r')
}

#[test]
fn take_line_keeps_partial_tail() {
    let mut pending = b"uciok\r\nreadyo".to_vec();

    assert_eq!(take_line(&mut pending), Some("uciok".to_string()));
    assert_eq!(take_line(&mut pending), None);
    assert_eq!(pending, b"readyo".to_vec());

    pending.extend_from_slice(b"k\n");
    assert_eq!(take_line(&mut pending), Some("readyok".to_string()));
    assert!(pending.is_empty());
}

#[test]
fn take_line_returns_blank_lines() {
    let mut pending = b"\n\nbestmove e2e4\n".to_vec();

    assert_eq!(take_line(&mut pending), Some(String::new()));
    assert_eq!(take_line(&mut pending), Some(String::new()));
    assert_eq!(take_line(&mut pending), Some("bestmove e2e4".to_string()));
}
