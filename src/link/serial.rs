use std::io;
use std::io::{Read, Write};
use std::time::{Duration, Instant};
use log::debug;
use serialport::{ClearBuffer, SerialPort};

use super::{take_line, Channel};

const READ_CHUNK: usize = 256;

/// A serial link to a console that is already logged in.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    // bytes received but not yet terminated by a newline
    pending: Vec<u8>,
}

impl SerialChannel {
    pub fn open(port_name: &str, baud_rate: u32, read_timeout: Duration) -> io::Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(read_timeout)
            .open()?;

        debug!("Opened serial port {port_name} at {baud_rate} baud");

        Ok(Self {
            port,
            pending: Vec::new(),
        })
    }
}

impl Channel for SerialChannel {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(b'\n');

        self.port.write_all(&bytes)
    }

    fn read_line(&mut self, timeout: Duration) -> io::Result<Option<String>> {
        let deadline = Instant::now() + timeout;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(line) = take_line(&mut self.pending) {
                return Ok(Some(line));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }

            self.port.set_timeout(deadline - now)?;
            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(read) => self.pending.extend_from_slice(&chunk[..read]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn reset(&mut self) -> io::Result<()> {
        self.pending.clear();
        self.port.clear(ClearBuffer::All)?;

        Ok(())
    }
}
