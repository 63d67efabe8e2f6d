//! `serialport`-backed transport for the sensor MCU (USB CDC-ACM).

use super::Transport;
use serialport::{ClearBuffer, SerialPort};
use std::io::{self, Read, Write};
use std::time::Duration;

pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open the port and throw away whatever the MCU sent before we were up.
    pub fn open(path: &str, baud: u32, timeout_ms: u64) -> Result<Self, serialport::Error> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_millis(timeout_ms))
            .open()?;
        port.clear(ClearBuffer::Input)?;
        Ok(Self { port })
    }

    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

impl Transport for SerialLink {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read_available(&mut self, out: &mut Vec<u8>) -> io::Result<usize> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 {
            return Ok(0);
        }
        let start = out.len();
        out.resize(start + pending, 0);
        // The driver already holds `pending` bytes, so this read returns at once.
        match self.port.read(&mut out[start..]) {
            Ok(n) => {
                out.truncate(start + n);
                Ok(n)
            }
            Err(e) => {
                out.truncate(start);
                Err(e)
            }
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}
