//! The editing engine: owning context, per-line sessions, key dispatch.
//!
//! An [`Editor`] holds everything that outlives a single line: options,
//! history and the host callbacks. Each line is edited through a
//! [`Session`], either via the blocking [`Editor::read_line`] or the
//! event-driven [`Editor::start`] / [`Editor::feed`] / [`Editor::stop`]
//! triple for hosts with their own event loop.

use alloc::boxed::Box;
use alloc::string::{String, ToString};

use crate::buffer::LineBuffer;
use crate::completion::{Completer, CompletionCycle, Hinter};
use crate::history::History;
use crate::render::{self, Refresh, RenderOpts};
use crate::terminal::{self, Terminal};
use crate::{Error, Result};

/// Default line capacity in bytes.
pub const DEFAULT_MAX_LINE: usize = 4096;
/// Smallest line capacity a host may configure.
pub const MINIMAL_MAX_LINE: usize = 64;

const DEFAULT_PASTE_DELAY_MS: u64 = 30;

mod key {
    pub const CTRL_A: u8 = 1;
    pub const CTRL_B: u8 = 2;
    pub const CTRL_C: u8 = 3;
    pub const CTRL_D: u8 = 4;
    pub const CTRL_E: u8 = 5;
    pub const CTRL_F: u8 = 6;
    pub const CTRL_H: u8 = 8;
    pub const TAB: u8 = 9;
    pub const ENTER: u8 = 10;
    pub const CTRL_K: u8 = 11;
    pub const CTRL_L: u8 = 12;
    pub const CTRL_N: u8 = 14;
    pub const CTRL_P: u8 = 16;
    pub const CTRL_T: u8 = 20;
    pub const CTRL_U: u8 = 21;
    pub const CTRL_W: u8 = 23;
    pub const ESC: u8 = 27;
    pub const BACKSPACE: u8 = 127;
}

/// Outcome of feeding one input event into a session.
#[derive(Debug, PartialEq, Eq)]
pub enum Feed {
    /// More input is needed before a line is available.
    More,
    /// The user accepted the line with Enter.
    Line(String),
}

/// What a completion keystroke did with the byte it was handed.
enum CompletionAction {
    /// The byte navigated the cycle; read the next one.
    Consumed,
    /// The byte ended the cycle and must be dispatched normally.
    Passthrough(u8),
}

enum HistoryDir {
    Prev,
    Next,
}

/// State of one line being edited, created by [`Editor::start`].
pub struct Session {
    pub(crate) prompt: String,
    pub(crate) prompt_width: usize,
    pub(crate) buf: LineBuffer,
    pub(crate) cols: usize,
    pub(crate) old_pos: usize,
    pub(crate) old_rows: usize,
    pub(crate) completion: Option<CompletionCycle>,
    pub(crate) history_index: usize,
    pub(crate) working_slot: bool,
    pub(crate) dumb: bool,
}

impl Session {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The bytes typed so far.
    pub fn line(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    /// Cursor offset into [`Session::line`].
    pub fn cursor(&self) -> usize {
        self.buf.pos()
    }

    /// Terminal width measured when the session started.
    pub fn columns(&self) -> usize {
        self.cols
    }

    /// Rows the last refresh drew (multi-line mode).
    pub fn rows(&self) -> usize {
        self.old_rows
    }

    fn pop_working(&mut self, history: &mut History) {
        if self.working_slot {
            history.pop_working();
            self.working_slot = false;
        }
    }
}

/// The editor context: options, history and host callbacks, shared by
/// every session it starts.
///
/// # Examples
///
/// ```no_run
/// use rawline::{Editor, terminals::StdioTerminal};
///
/// let mut editor = Editor::new();
/// let mut terminal = StdioTerminal::new();
///
/// match editor.read_line(&mut terminal, "> ") {
///     Ok(line) => println!("got: {}", line),
///     Err(e) => eprintln!("error: {}", e),
/// }
/// ```
pub struct Editor {
    history: History,
    completer: Option<Box<dyn Completer>>,
    hinter: Option<Box<dyn Hinter>>,
    mask_mode: bool,
    multi_line: bool,
    dumb_mode: bool,
    max_line_len: usize,
    paste_delay_ms: u64,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            history: History::new(),
            completer: None,
            hinter: None,
            mask_mode: false,
            multi_line: false,
            dumb_mode: false,
            max_line_len: DEFAULT_MAX_LINE,
            paste_delay_ms: DEFAULT_PASTE_DELAY_MS,
        }
    }

    /// Draw `*` instead of the typed bytes, for passwords and other secrets.
    pub fn set_mask_mode(&mut self, on: bool) {
        self.mask_mode = on;
    }

    /// Let long lines wrap over several rows instead of scrolling
    /// horizontally.
    pub fn set_multi_line(&mut self, on: bool) {
        self.multi_line = on;
    }

    /// Degrade to echo-and-collect for terminals that do not process ANSI
    /// sequences.
    pub fn set_dumb_mode(&mut self, on: bool) {
        self.dumb_mode = on;
    }

    pub fn is_dumb_mode(&self) -> bool {
        self.dumb_mode
    }

    /// Line capacity for sessions started after this call. Values below
    /// [`MINIMAL_MAX_LINE`] are rejected.
    pub fn set_max_line_len(&mut self, len: usize) -> Result<()> {
        if len < MINIMAL_MAX_LINE {
            return Err(Error::TooShort(len));
        }
        self.max_line_len = len;
        Ok(())
    }

    /// Bytes arriving closer together than this are treated as pasted
    /// rather than typed. Held-down keys can repeat faster than this
    /// threshold and defeat the heuristic.
    pub fn set_paste_delay_ms(&mut self, ms: u64) {
        self.paste_delay_ms = ms;
    }

    /// Resize the history, keeping the newest entries. A zero length is
    /// rejected.
    pub fn set_history_max_len(&mut self, len: usize) -> bool {
        self.history.set_max_len(len)
    }

    /// Register the tab-completion callback; completion is off until one is
    /// set.
    pub fn set_completer<C: Completer + 'static>(&mut self, completer: C) {
        self.completer = Some(Box::new(completer));
    }

    /// Register the hint callback; hints are off until one is set.
    pub fn set_hinter<H: Hinter + 'static>(&mut self, hinter: H) {
        self.hinter = Some(Box::new(hinter));
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    /// Read one line, blocking until the user accepts or aborts it.
    pub fn read_line<T: Terminal>(&mut self, term: &mut T, prompt: &str) -> Result<String> {
        let mut session = self.start(term, prompt)?;
        let result = loop {
            match self.feed(term, &mut session) {
                Ok(Feed::More) => continue,
                Ok(Feed::Line(line)) => break Ok(line),
                Err(e) => break Err(e),
            }
        };
        let stopped = self.stop(term, session);
        let line = result?;
        stopped?;
        Ok(line)
    }

    /// Arm a session: enter raw mode, measure the terminal width, register
    /// the scratch history slot and print the prompt.
    ///
    /// A failed prompt write aborts the session so the host does not end up
    /// editing on a dead channel.
    pub fn start<T: Terminal>(&mut self, term: &mut T, prompt: &str) -> Result<Session> {
        let mut session = Session {
            prompt: prompt.to_string(),
            prompt_width: prompt.len(),
            buf: LineBuffer::new(self.max_line_len),
            cols: 0,
            old_pos: 0,
            old_rows: 0,
            completion: None,
            history_index: 0,
            working_slot: false,
            dumb: self.dumb_mode,
        };

        term.enter_raw_mode()?;
        // A dumb terminal will not answer the DSR width probe; the width is
        // unused on that path anyway.
        session.cols = if session.dumb { 80 } else { terminal::columns(term) };

        if !session.dumb {
            // The newest history entry mirrors the line under edit, so
            // navigation can come back to it.
            session.working_slot = self.history.push_working();
        }

        term.lock_output();
        let written = term.write(prompt.as_bytes()).and_then(|_| term.flush());
        term.unlock_output();
        if let Err(e) = written {
            session.pop_working(&mut self.history);
            let _ = term.exit_raw_mode();
            return Err(e);
        }
        Ok(session)
    }

    /// Process one input event. Call whenever at least one byte is
    /// available; escape sequences consume their few extra bytes
    /// synchronously.
    pub fn feed<T: Terminal>(&mut self, term: &mut T, session: &mut Session) -> Result<Feed> {
        if session.dumb {
            return self.feed_dumb(term, session);
        }

        let t1 = term.now_millis();
        let c = term.read_byte()?;
        let t2 = term.now_millis();

        term.lock_output();
        let result = self.feed_byte(term, session, c, t2.saturating_sub(t1));
        term.unlock_output();
        result
    }

    /// Release the session: trailing newline, raw mode off. Any scratch
    /// history slot an aborted session left behind is dropped here.
    pub fn stop<T: Terminal>(&mut self, term: &mut T, mut session: Session) -> Result<()> {
        session.pop_working(&mut self.history);
        term.lock_output();
        let written = term.write(b"\n").and_then(|_| term.flush());
        term.unlock_output();
        term.exit_raw_mode()?;
        written
    }

    /// Erase the prompt and line so another producer can write to the
    /// terminal; pair with [`Editor::show`].
    pub fn hide<T: Terminal>(&self, term: &mut T, session: &mut Session) -> Result<()> {
        term.lock_output();
        let result = render::refresh_session(term, session, Refresh::Clean, &self.render_opts());
        term.unlock_output();
        result
    }

    /// Redraw the prompt and line after [`Editor::hide`]. An active
    /// completion cycle is re-rendered as the user last saw it.
    pub fn show<T: Terminal>(&self, term: &mut T, session: &mut Session) -> Result<()> {
        term.lock_output();
        let result = render::refresh_session(term, session, Refresh::Write, &self.render_opts());
        term.unlock_output();
        result
    }

    fn render_opts(&self) -> RenderOpts<'_> {
        RenderOpts {
            mask: self.mask_mode,
            multi_line: self.multi_line,
            hinter: self.hinter.as_deref(),
        }
    }

    // A failed repaint is absorbed: the user loses one refresh and the next
    // keystroke redraws. Only the prompt write in start() and the one-byte
    // echo paths report output failures.
    fn refresh<T: Terminal>(&self, term: &mut T, session: &mut Session) {
        let _ = render::refresh_session(term, session, Refresh::All, &self.render_opts());
    }

    fn refresh_without_hints<T: Terminal>(&self, term: &mut T, session: &mut Session) {
        let opts = RenderOpts { hinter: None, ..self.render_opts() };
        let _ = render::refresh_session(term, session, Refresh::All, &opts);
    }

    fn feed_byte<T: Terminal>(
        &mut self,
        term: &mut T,
        session: &mut Session,
        mut c: u8,
        gap_ms: u64,
    ) -> Result<Feed> {
        // Bytes arriving faster than a human can type are a paste burst;
        // when appending at the end of the line they can be echoed raw
        // without a refresh.
        if gap_ms < self.paste_delay_ms
            && c != key::ENTER
            && session.buf.at_end()
            && !session.buf.is_full()
        {
            session.buf.insert(c);
            term.write(&[c])?;
            term.flush()?;
            return Ok(Feed::More);
        }

        if (session.completion.is_some() || c == key::TAB) && self.completer.is_some() {
            match self.complete_line(term, session, c)? {
                CompletionAction::Consumed => return Ok(Feed::More),
                CompletionAction::Passthrough(byte) => c = byte,
            }
        }

        match c {
            key::ENTER => {
                session.pop_working(&mut self.history);
                if self.multi_line && session.buf.move_end() {
                    self.refresh(term, session);
                }
                if self.hinter.is_some() {
                    // Leave the accepted line in its natural appearance:
                    // one last refresh with hints suppressed.
                    self.refresh_without_hints(term, session);
                }
                let line = String::from_utf8(session.buf.as_bytes().to_vec())
                    .map_err(|_| Error::InvalidUtf8)?;
                self.history.add(&line);
                return Ok(Feed::Line(line));
            }
            key::CTRL_C => {
                session.pop_working(&mut self.history);
                return Err(Error::Interrupted);
            }
            key::BACKSPACE | key::CTRL_H => {
                if session.buf.backspace() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_D => {
                // Delete forward, or signal end-of-input on an empty line.
                if session.buf.len() > 0 {
                    if session.buf.delete() {
                        self.refresh(term, session);
                    }
                } else {
                    session.pop_working(&mut self.history);
                    return Err(Error::Eof);
                }
            }
            key::CTRL_T => {
                if session.buf.transpose() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_B => {
                if session.buf.move_left() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_F => {
                if session.buf.move_right() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_P => self.history_step(term, session, HistoryDir::Prev)?,
            key::CTRL_N => self.history_step(term, session, HistoryDir::Next)?,
            key::ESC => self.escape_sequence(term, session)?,
            key::CTRL_U => {
                if session.buf.kill_line() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_K => {
                if session.buf.kill_to_end() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_A => {
                if session.buf.move_home() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_E => {
                if session.buf.move_end() {
                    self.refresh(term, session);
                }
            }
            key::CTRL_L => {
                let _ = terminal::clear_screen(term);
                self.refresh(term, session);
            }
            key::CTRL_W => {
                if session.buf.kill_prev_word() > 0 {
                    self.refresh(term, session);
                }
            }
            _ => self.insert(term, session, c)?,
        }
        Ok(Feed::More)
    }

    fn insert<T: Terminal>(&mut self, term: &mut T, session: &mut Session, c: u8) -> Result<()> {
        if session.buf.is_full() {
            return Ok(());
        }
        let appending = session.buf.at_end();
        session.buf.insert(c);
        let fast = appending
            && !self.multi_line
            && session.prompt_width + session.buf.len() < session.cols
            && self.hinter.is_none();
        if fast {
            // Trivial case: echo the one character instead of redrawing the
            // whole line.
            let echo = if self.mask_mode { b'*' } else { c };
            term.write(&[echo])?;
            term.flush()?;
        } else {
            self.refresh(term, session);
        }
        Ok(())
    }

    /// Read the rest of an ESC-prefixed sequence and dispatch it. Unknown
    /// sequences are drained and ignored.
    fn escape_sequence<T: Terminal>(&mut self, term: &mut T, session: &mut Session) -> Result<()> {
        let s1 = term.read_byte()?;
        let s2 = term.read_byte()?;

        if s1 == b'[' {
            if s2.is_ascii_digit() {
                // Extended sequence: one more byte.
                let s3 = term.read_byte()?;
                if s3 == b'~' && s2 == b'3' {
                    if session.buf.delete() {
                        self.refresh(term, session);
                    }
                }
            } else {
                match s2 {
                    b'A' => self.history_step(term, session, HistoryDir::Prev)?,
                    b'B' => self.history_step(term, session, HistoryDir::Next)?,
                    b'C' => {
                        if session.buf.move_right() {
                            self.refresh(term, session);
                        }
                    }
                    b'D' => {
                        if session.buf.move_left() {
                            self.refresh(term, session);
                        }
                    }
                    b'H' => {
                        if session.buf.move_home() {
                            self.refresh(term, session);
                        }
                    }
                    b'F' => {
                        if session.buf.move_end() {
                            self.refresh(term, session);
                        }
                    }
                    _ => {}
                }
            }
        } else if s1 == b'O' {
            match s2 {
                b'H' => {
                    if session.buf.move_home() {
                        self.refresh(term, session);
                    }
                }
                b'F' => {
                    if session.buf.move_end() {
                        self.refresh(term, session);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Step through history, writing the session's edits back into the
    /// entry being left so they survive within the session.
    fn history_step<T: Terminal>(
        &mut self,
        term: &mut T,
        session: &mut Session,
        dir: HistoryDir,
    ) -> Result<()> {
        if self.history.len() <= 1 {
            return Ok(());
        }

        let current = self.history.len() - 1 - session.history_index;
        let edited = String::from_utf8_lossy(session.buf.as_bytes()).into_owned();
        self.history.replace(current, &edited);

        match dir {
            HistoryDir::Prev => {
                if session.history_index + 1 >= self.history.len() {
                    return Ok(());
                }
                session.history_index += 1;
            }
            HistoryDir::Next => {
                if session.history_index == 0 {
                    return Ok(());
                }
                session.history_index -= 1;
            }
        }

        let target = self.history.len() - 1 - session.history_index;
        if let Some(entry) = self.history.get(target) {
            session.buf.load(entry.as_bytes());
        }
        self.refresh(term, session);
        Ok(())
    }

    /// Run the completion protocol for one keystroke: TAB cycles, ESC
    /// cancels, anything else commits the shown candidate and is handed
    /// back for normal dispatch.
    fn complete_line<T: Terminal>(
        &mut self,
        term: &mut T,
        session: &mut Session,
        c: u8,
    ) -> Result<CompletionAction> {
        if session.completion.is_none() {
            let Some(completer) = self.completer.as_deref() else {
                return Ok(CompletionAction::Passthrough(c));
            };
            let Ok(line) = core::str::from_utf8(session.buf.as_bytes()) else {
                return Ok(CompletionAction::Passthrough(c));
            };
            let candidates = completer.complete(line);
            if candidates.is_empty() {
                let _ = terminal::beep(term);
                return Ok(CompletionAction::Passthrough(c));
            }
            // The list is cached for the whole cycle; the refresh below
            // shows candidate 0 while the real buffer stays untouched.
            session.completion = Some(CompletionCycle::new(candidates));
            self.refresh(term, session);
            return Ok(CompletionAction::Consumed);
        }

        match c {
            key::TAB => {
                if let Some(cycle) = session.completion.as_mut() {
                    if cycle.advance() {
                        // Wrapped onto the original-buffer slot.
                        let _ = terminal::beep(term);
                    }
                }
                self.refresh(term, session);
                Ok(CompletionAction::Consumed)
            }
            key::ESC => {
                session.completion = None;
                self.refresh(term, session);
                Ok(CompletionAction::Consumed)
            }
            _ => {
                if let Some(cycle) = session.completion.take() {
                    if let Some(candidate) = cycle.current() {
                        session.buf.load(candidate.as_bytes());
                    }
                }
                self.refresh(term, session);
                Ok(CompletionAction::Passthrough(c))
            }
        }
    }

    /// Echo-and-collect editing for terminals that do not process ANSI
    /// sequences: no refresh, no escape parsing, no completion.
    fn feed_dumb<T: Terminal>(&mut self, term: &mut T, session: &mut Session) -> Result<Feed> {
        let c = term.read_byte()?;
        term.lock_output();
        let result = (|| {
            match c {
                key::ENTER => {
                    term.write(b"\n")?;
                    term.flush()?;
                    return self.finish_dumb(session);
                }
                0x1c..=0x1f => {
                    // Arrow-key noise on terminals without escape handling.
                }
                key::BACKSPACE | key::CTRL_H => {
                    if session.buf.backspace() {
                        term.write(b"\x08 \x08")?;
                        term.flush()?;
                    }
                }
                _ => {
                    session.buf.insert(c);
                    term.write(&[c])?;
                    term.flush()?;
                    if session.buf.is_full() {
                        term.write(b"\n")?;
                        term.flush()?;
                        return self.finish_dumb(session);
                    }
                }
            }
            Ok(Feed::More)
        })();
        term.unlock_output();
        result
    }

    fn finish_dumb(&mut self, session: &mut Session) -> Result<Feed> {
        let line =
            String::from_utf8(session.buf.as_bytes().to_vec()).map_err(|_| Error::InvalidUtf8)?;
        self.history.add(&line);
        Ok(Feed::Line(line))
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
