//! Screen refresh: assemble one redraw into a single terminal write.

use core::fmt::Write as _;

use alloc::vec::Vec;

use crate::completion::Hinter;
use crate::editor::Session;
use crate::terminal::Terminal;
use crate::Result;

/// Append-only byte buffer. A whole refresh is collected here and flushed
/// with one write, so slow channels repaint without flicker.
pub(crate) struct OutBuf {
    bytes: Vec<u8>,
}

impl OutBuf {
    pub(crate) fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    pub(crate) fn append(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl core::fmt::Write for OutBuf {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.bytes.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// Which halves of a redraw to perform: erase what was drawn, draw the
/// current state, or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refresh {
    Clean,
    Write,
    All,
}

impl Refresh {
    fn has_clean(self) -> bool {
        matches!(self, Refresh::Clean | Refresh::All)
    }

    fn has_write(self) -> bool {
        matches!(self, Refresh::Write | Refresh::All)
    }
}

/// The projection being drawn: normally the edit buffer, but during a TAB
/// cycle the current candidate stands in for it without touching the real
/// state.
struct LineView<'a> {
    bytes: &'a [u8],
    pos: usize,
}

pub(crate) struct RenderOpts<'a> {
    pub mask: bool,
    pub multi_line: bool,
    pub hinter: Option<&'a dyn Hinter>,
}

/// Redraw the session's line on the terminal in one write.
pub(crate) fn refresh_session<T: Terminal>(
    term: &mut T,
    session: &mut Session,
    mode: Refresh,
    opts: &RenderOpts<'_>,
) -> Result<()> {
    let Session { prompt, prompt_width, buf, cols, old_pos, old_rows, completion, .. } = session;
    let view = match completion.as_ref().and_then(|c| c.current()) {
        Some(candidate) => LineView { bytes: candidate.as_bytes(), pos: candidate.len() },
        None => LineView { bytes: buf.as_bytes(), pos: buf.pos() },
    };

    let mut out = OutBuf::new();
    if opts.multi_line {
        render_multi(&mut out, prompt, *prompt_width, *cols, &view, old_pos, old_rows, mode, opts);
    } else {
        render_single(&mut out, prompt, *prompt_width, *cols, &view, mode, opts);
    }
    term.write(out.as_bytes())?;
    term.flush()
}

#[allow(clippy::too_many_arguments)]
fn render_single(
    out: &mut OutBuf,
    prompt: &str,
    prompt_width: usize,
    cols: usize,
    view: &LineView<'_>,
    mode: Refresh,
    opts: &RenderOpts<'_>,
) {
    // Scroll the visible window horizontally so the cursor stays on screen,
    // then clip whatever still overflows on the right.
    let mut start = 0;
    let mut len = view.bytes.len();
    let mut pos = view.pos;
    while prompt_width + pos >= cols {
        start += 1;
        len -= 1;
        pos -= 1;
    }
    while prompt_width + len > cols {
        len -= 1;
    }

    out.append(b"\r");
    if mode.has_write() {
        out.append(prompt.as_bytes());
        if opts.mask {
            for _ in 0..len {
                out.append(b"*");
            }
        } else {
            out.append(&view.bytes[start..start + len]);
        }
        show_hints(out, view.bytes, prompt_width, cols, opts);
    }
    out.append(b"\x1b[0K");
    if mode.has_write() {
        let _ = write!(out, "\r\x1b[{}C", pos + prompt_width);
    }
}

#[allow(clippy::too_many_arguments)]
fn render_multi(
    out: &mut OutBuf,
    prompt: &str,
    prompt_width: usize,
    cols: usize,
    view: &LineView<'_>,
    old_pos: &mut usize,
    old_rows: &mut usize,
    mode: Refresh,
    opts: &RenderOpts<'_>,
) {
    let len = view.bytes.len();
    let pos = view.pos;
    let mut rows = ((prompt_width + len + cols - 1) / cols).max(1);
    // Relative row of the cursor as last drawn; the +cols biases past the
    // wrap so the top row counts as 1.
    let rpos = (prompt_width + *old_pos + cols) / cols;
    let prev_rows = *old_rows;
    *old_rows = rows;

    if mode.has_clean() {
        // Walk down to the last drawn row, then erase each row on the way
        // back up.
        if prev_rows > rpos {
            let _ = write!(out, "\x1b[{}B", prev_rows - rpos);
        }
        for _ in 1..prev_rows {
            out.append(b"\r\x1b[0K\x1b[1A");
        }
    }

    // The top row is cleaned for every mode.
    out.append(b"\r\x1b[0K");

    if mode.has_write() {
        out.append(prompt.as_bytes());
        if opts.mask {
            for _ in 0..len {
                out.append(b"*");
            }
        } else {
            out.append(view.bytes);
        }
        show_hints(out, view.bytes, prompt_width, cols, opts);

        // A cursor exactly on the right margin would sit invisibly past it;
        // force the wrap so the next row exists.
        if pos > 0 && pos == len && (pos + prompt_width) % cols == 0 {
            out.append(b"\n\r");
            rows += 1;
            if rows > *old_rows {
                *old_rows = rows;
            }
        }

        let rpos2 = (prompt_width + pos + cols) / cols;
        if rows > rpos2 {
            let _ = write!(out, "\x1b[{}A", rows - rpos2);
        }
        let col = (prompt_width + pos) % cols;
        if col != 0 {
            let _ = write!(out, "\r\x1b[{}C", col);
        } else {
            out.append(b"\r");
        }
    }

    *old_pos = pos;
}

/// Draw the host-supplied hint after the line, clipped to the remaining
/// columns and wrapped in its SGR style.
fn show_hints(
    out: &mut OutBuf,
    line: &[u8],
    prompt_width: usize,
    cols: usize,
    opts: &RenderOpts<'_>,
) {
    let Some(hinter) = opts.hinter else {
        return;
    };
    if prompt_width + line.len() >= cols {
        return;
    }
    let Ok(line) = core::str::from_utf8(line) else {
        return;
    };
    let Some(hint) = hinter.hint(line) else {
        return;
    };

    let max_len = cols - (prompt_width + line.len());
    let text = &hint.text.as_bytes()[..hint.text.len().min(max_len)];

    let mut color = hint.color;
    if hint.bold && color.is_none() {
        color = Some(37);
    }
    let styled = color.is_some();
    if let Some(color) = color {
        let _ = write!(out, "\x1b[{};{}m", hint.bold as u8, color);
    }
    out.append(text);
    if styled {
        out.append(b"\x1b[0m");
    }
}
