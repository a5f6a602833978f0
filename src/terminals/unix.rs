// Unix terminal implementation using termios and ANSI escape codes

use crate::{Error, Result, Terminal};
use std::io::{self, Read, StdoutLock, Write};
use std::os::unix::io::AsRawFd;
use std::time::Instant;

/// Unix terminal on stdin/stdout with termios raw mode.
///
/// While [`Terminal::lock_output`] is engaged, writes go through a held
/// global stdout lock, so `println!` from other threads cannot interleave
/// with a refresh.
pub struct StdioTerminal {
    stdin: io::Stdin,
    locked: Option<StdoutLock<'static>>,
    original_termios: Option<libc::termios>,
    started: Instant,
}

impl StdioTerminal {
    pub fn new() -> Self {
        Self {
            stdin: io::stdin(),
            locked: None,
            original_termios: None,
            started: Instant::now(),
        }
    }
}

impl Default for StdioTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdioTerminal {
    fn read_byte(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.stdin.read_exact(&mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::Eof
            } else {
                Error::Io("stdin read failed")
            }
        })?;
        Ok(buf[0])
    }

    fn read_byte_timeout(&mut self, timeout_ms: u32) -> Result<Option<u8>> {
        let mut pfd = libc::pollfd {
            fd: self.stdin.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms as libc::c_int) };
        if ready < 0 {
            return Err(Error::Io("stdin poll failed"));
        }
        if ready == 0 || pfd.revents & libc::POLLIN == 0 {
            return Ok(None);
        }
        self.read_byte().map(Some)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let result = match &mut self.locked {
            Some(out) => out.write_all(data),
            None => io::stdout().write_all(data),
        };
        result.map_err(|_| Error::Io("stdout write failed"))
    }

    fn flush(&mut self) -> Result<()> {
        let result = match &mut self.locked {
            Some(out) => out.flush(),
            None => io::stdout().flush(),
        };
        result.map_err(|_| Error::Io("stdout flush failed"))?;
        // Best-effort drain for USB-CDC style devices; EINVAL on a regular
        // tty is fine.
        unsafe {
            libc::fsync(libc::STDOUT_FILENO);
        }
        Ok(())
    }

    fn enter_raw_mode(&mut self) -> Result<()> {
        let fd = self.stdin.as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();

            if libc::tcgetattr(fd, &mut termios) != 0 {
                return Err(Error::Io("tcgetattr failed"));
            }

            // Save original settings
            self.original_termios = Some(termios);

            // Disable canonical mode and echo. ICRNL stays on, so Enter
            // still arrives as 0x0a.
            termios.c_lflag &= !(libc::ECHO | libc::ICANON);

            // One byte at a time, no read timeout
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &termios) != 0 {
                return Err(Error::Io("tcsetattr failed"));
            }
        }

        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<()> {
        if let Some(original) = self.original_termios {
            let fd = self.stdin.as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, &original) != 0 {
                    return Err(Error::Io("tcsetattr failed"));
                }
            }

            self.original_termios = None;
        }

        Ok(())
    }

    fn now_millis(&mut self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn window_columns(&mut self) -> Option<usize> {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
        if ret == 0 && ws.ws_col > 0 {
            Some(ws.ws_col as usize)
        } else {
            None
        }
    }

    fn lock_output(&mut self) {
        if self.locked.is_none() {
            self.locked = Some(io::stdout().lock());
        }
    }

    fn unlock_output(&mut self) {
        self.locked = None;
    }
}

impl Drop for StdioTerminal {
    fn drop(&mut self) {
        let _ = self.exit_raw_mode();
    }
}
