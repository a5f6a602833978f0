//! The byte-channel seam between the editor and the host.
//!
//! Implement [`Terminal`] to use the editor with any I/O system: a Unix
//! tty, a UART, a USB-CDC endpoint or a network socket. Only the byte
//! channel, a flush and a millisecond clock are required; polling, width
//! reporting and output locking are optional capabilities with safe
//! defaults.

use crate::{Error, Result};

/// Longest DSR reply the query helpers will buffer.
const QUERY_MAX: usize = 32;

/// Byte-oriented terminal channel plus the few host services the editor
/// needs.
///
/// # Example
///
/// ```
/// use rawline::{Terminal, Result, Error};
///
/// struct MockTerminal {
///     input: Vec<u8>,
///     output: Vec<u8>,
/// }
///
/// impl Terminal for MockTerminal {
///     fn read_byte(&mut self) -> Result<u8> {
///         if self.input.is_empty() {
///             return Err(Error::Eof);
///         }
///         Ok(self.input.remove(0))
///     }
///
///     fn write(&mut self, data: &[u8]) -> Result<()> {
///         self.output.extend_from_slice(data);
///         Ok(())
///     }
///
///     fn flush(&mut self) -> Result<()> { Ok(()) }
///     fn enter_raw_mode(&mut self) -> Result<()> { Ok(()) }
///     fn exit_raw_mode(&mut self) -> Result<()> { Ok(()) }
///     fn now_millis(&mut self) -> u64 { 0 }
/// }
/// ```
pub trait Terminal {
    /// Blocking read of one input byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Read one byte, giving up after `timeout_ms`; `Ok(None)` on timeout.
    ///
    /// Channels that cannot poll return [`Error::Unsupported`] (the
    /// default), which [`probe`] reports as [`ProbeOutcome::Unknown`].
    fn read_byte_timeout(&mut self, _timeout_ms: u32) -> Result<Option<u8>> {
        Err(Error::Unsupported)
    }

    /// Write raw bytes to the output channel.
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Flush buffered output all the way to the device. USB-CDC style
    /// channels hold data until drained.
    fn flush(&mut self) -> Result<()>;

    /// Disable line buffering and echo for byte-at-a-time input.
    fn enter_raw_mode(&mut self) -> Result<()>;

    /// Restore the channel's normal input mode.
    fn exit_raw_mode(&mut self) -> Result<()>;

    /// Monotonic milliseconds; drives paste-burst detection.
    fn now_millis(&mut self) -> u64;

    /// Terminal width when the host can report it without asking the
    /// terminal itself (an ioctl, a USB descriptor). `None` makes the
    /// editor fall back to the DSR probe.
    fn window_columns(&mut self) -> Option<usize> {
        None
    }

    /// Serialize the output that follows against other writers sharing
    /// this channel. Held for at most one refresh; the default is a no-op
    /// for single-writer hosts and tests.
    fn lock_output(&mut self) {}

    /// Release [`Terminal::lock_output`].
    fn unlock_output(&mut self) {}
}

/// Query the cursor position as `(row, column)` with `ESC[6n`.
pub fn cursor_position<T: Terminal>(term: &mut T) -> Result<(usize, usize)> {
    term.write(b"\x1b[6n")?;
    term.flush()?;

    // The reply is ESC [ rows ; cols R, read byte-wise since we cannot
    // know its length up front. Some UARTs inject newlines; skip them.
    let mut buf = [0u8; QUERY_MAX];
    let mut n = 0;
    while n < buf.len() {
        let c = term.read_byte()?;
        if c == b'R' {
            break;
        }
        if c != b'\n' {
            buf[n] = c;
            n += 1;
        }
    }

    let reply = &buf[..n];
    if reply.len() < 5 || reply[0] != 0x1b || reply[1] != b'[' {
        return Err(Error::Io("malformed cursor report"));
    }
    let body = core::str::from_utf8(&reply[2..]).map_err(|_| Error::Io("malformed cursor report"))?;
    let (rows, cols) = body.split_once(';').ok_or(Error::Io("malformed cursor report"))?;
    let rows = rows.parse().map_err(|_| Error::Io("malformed cursor report"))?;
    let cols = cols.parse().map_err(|_| Error::Io("malformed cursor report"))?;
    Ok((rows, cols))
}

/// Terminal width in columns: the host report if there is one, else the
/// two-step DSR probe, else 80.
pub fn columns<T: Terminal>(term: &mut T) -> usize {
    if let Some(cols) = term.window_columns() {
        if cols > 0 {
            return cols;
        }
    }
    dsr_columns(term).unwrap_or(80)
}

fn dsr_columns<T: Terminal>(term: &mut T) -> Result<usize> {
    let (_, start) = cursor_position(term)?;

    // Ask for the far right; the cursor clips at the margin, so a second
    // position query reveals the width.
    term.write(b"\x1b[999C")?;
    term.flush()?;
    let (_, cols) = cursor_position(term)?;

    if cols > start {
        let restore = alloc::format!("\x1b[{}D", cols - start);
        term.write(restore.as_bytes())?;
        term.flush()?;
    }
    Ok(cols)
}

/// What [`probe`] learned about the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeOutcome {
    /// The terminal answered the status query; full editing will work.
    Supported,
    /// Nothing came back within the timeout; assume a dumb terminal.
    NoResponse,
    /// The channel cannot poll, so nothing can be concluded.
    Unknown,
}

/// Ask the terminal for a device status report (`ESC[5n`), waiting up to
/// 500 ms for the 4-byte reply. Hosts use this once at startup to choose
/// between full editing and dumb mode.
pub fn probe<T: Terminal>(term: &mut T) -> Result<ProbeOutcome> {
    term.write(b"\x1b[5n")?;
    term.flush()?;

    // Reply is ESC [ 0 n (ready) or ESC [ 3 n (malfunction); either will do.
    let deadline = term.now_millis() + 500;
    let mut seen = 0usize;
    while seen < 4 && term.now_millis() < deadline {
        match term.read_byte_timeout(10) {
            Ok(Some(c)) => {
                if seen == 0 && c != 0x1b {
                    break;
                }
                seen += 1;
            }
            Ok(None) => {}
            Err(Error::Unsupported) => return Ok(ProbeOutcome::Unknown),
            Err(e) => return Err(e),
        }
    }
    Ok(if seen >= 4 { ProbeOutcome::Supported } else { ProbeOutcome::NoResponse })
}

/// Home the cursor and clear the whole screen.
pub fn clear_screen<T: Terminal>(term: &mut T) -> Result<()> {
    term.write(b"\x1b[H\x1b[2J")?;
    term.flush()
}

/// Terminal bell, used when completion has nothing to offer.
pub fn beep<T: Terminal>(term: &mut T) -> Result<()> {
    term.write(b"\x07")?;
    term.flush()
}
