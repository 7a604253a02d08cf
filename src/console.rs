//! Byte-level I/O used by the `.` and `,` commands.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

/// The interpreter's view of the outside world.
pub trait Console {
    /// Read one byte. `Ok(None)` means the input is exhausted.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Write one byte.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Push buffered output to its destination.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console backed by the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct StdConsole {
    pending_output: bool,
}

impl StdConsole {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for StdConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        // Anything the program printed before asking for input must be visible.
        if self.pending_output {
            self.flush()?;
        }

        let mut buf = [0u8; 1];
        loop {
            match io::stdin().lock().read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        match io::stdout().lock().write(&[byte])? {
            0 => Err(io::Error::new(
                io::ErrorKind::WriteZero,
                "stdout did not accept the byte",
            )),
            _ => {
                self.pending_output = true;
                Ok(())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.pending_output = false;
        Ok(())
    }
}

/// In-memory console: input is served from a queue, output is collected.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Console whose reads are served from `input`, in order.
    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: Vec::new(),
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Bytes not yet consumed by `,`.
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte);
        Ok(())
    }
}

impl<C: Console + ?Sized> Console for &mut C {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_console_serves_input_in_order_then_eof() {
        let mut console = BufferConsole::with_input(b"ab");
        assert_eq!(console.read_byte().unwrap(), Some(b'a'));
        assert_eq!(console.remaining_input(), 1);
        assert_eq!(console.read_byte().unwrap(), Some(b'b'));
        assert_eq!(console.read_byte().unwrap(), None);
    }

    #[test]
    fn buffer_console_collects_output() {
        let mut console = BufferConsole::new();
        console.write_byte(b'h').unwrap();
        console.write_byte(b'i').unwrap();
        console.flush().unwrap();
        assert_eq!(console.output(), b"hi");
    }

    fn echo_once<C: Console>(mut console: C) {
        if let Some(byte) = console.read_byte().unwrap() {
            console.write_byte(byte).unwrap();
        }
    }

    #[test]
    fn mutable_reference_forwards_to_the_console() {
        let mut console = BufferConsole::with_input([7u8]);
        echo_once(&mut console);
        assert_eq!(console.output(), [7u8]);
        assert_eq!(console.remaining_input(), 0);
    }
}
