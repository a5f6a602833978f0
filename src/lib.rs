// Single-line editor for terminals that speak a small ANSI/VT subset
//
// Design: complete separation of I/O from editing logic via the Terminal
// byte-channel trait. One Editor owns history, options and callbacks; one
// Session carries the state of the line currently being edited. The core
// only needs `alloc`, so it runs against a UART on a microcontroller as
// well as a Unix tty.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod buffer;
mod completion;
mod editor;
mod history;
mod render;
mod terminal;

pub mod terminals;

pub use buffer::LineBuffer;
pub use completion::{Completer, Hint, Hinter};
pub use editor::{Editor, Feed, Session, DEFAULT_MAX_LINE, MINIMAL_MAX_LINE};
pub use history::History;
pub use terminal::{beep, clear_screen, columns, cursor_position, probe, ProbeOutcome, Terminal};

use core::fmt;

/// Errors reported to the host program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The user pressed Ctrl-C.
    Interrupted,
    /// The user pressed Ctrl-D on an empty line, or the input channel ended.
    Eof,
    /// An I/O operation on the terminal channel failed.
    Io(&'static str),
    /// The accepted line is not valid UTF-8.
    InvalidUtf8,
    /// A requested line capacity is below [`MINIMAL_MAX_LINE`].
    TooShort(usize),
    /// The terminal channel does not support the requested operation.
    Unsupported,
}

pub type Result<T> = core::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Interrupted => write!(f, "interrupted"),
            Error::Eof => write!(f, "end of input"),
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
            Error::InvalidUtf8 => write!(f, "line is not valid UTF-8"),
            Error::TooShort(n) => {
                write!(f, "line capacity {} is below the minimum of {}", n, MINIMAL_MAX_LINE)
            }
            Error::Unsupported => write!(f, "operation not supported by this terminal"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
