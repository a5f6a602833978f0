// End-to-end editing scenarios driven through a scripted terminal.

use std::collections::VecDeque;

use rawline::{probe, Editor, Error, Feed, Hint, ProbeOutcome, Terminal};

/// Scripted terminal: bytes in, captured bytes out, hand-cranked clock.
struct MockTerminal {
    input: VecDeque<u8>,
    output: Vec<u8>,
    clock: u64,
    /// Milliseconds the clock advances per byte read; per-byte overrides
    /// can be scheduled to simulate paste bursts.
    tick: u64,
    ticks: VecDeque<u64>,
    cols: Option<usize>,
}

impl MockTerminal {
    fn new(script: &[u8]) -> Self {
        Self {
            input: script.iter().copied().collect(),
            output: Vec::new(),
            clock: 0,
            tick: 100,
            ticks: VecDeque::new(),
            cols: Some(80),
        }
    }

    fn with_cols(script: &[u8], cols: usize) -> Self {
        let mut term = Self::new(script);
        term.cols = Some(cols);
        term
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl Terminal for MockTerminal {
    fn read_byte(&mut self) -> Result<u8, Error> {
        self.clock += self.ticks.pop_front().unwrap_or(self.tick);
        self.input.pop_front().ok_or(Error::Eof)
    }

    fn read_byte_timeout(&mut self, timeout_ms: u32) -> Result<Option<u8>, Error> {
        match self.input.pop_front() {
            Some(c) => Ok(Some(c)),
            None => {
                self.clock += u64::from(timeout_ms);
                Ok(None)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn enter_raw_mode(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn now_millis(&mut self) -> u64 {
        self.clock
    }

    fn window_columns(&mut self) -> Option<usize> {
        self.cols
    }
}

/// Terminal without polling support, for the probe fallback.
struct NoPollTerminal {
    output: Vec<u8>,
}

impl Terminal for NoPollTerminal {
    fn read_byte(&mut self) -> Result<u8, Error> {
        Err(Error::Eof)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        self.output.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn enter_raw_mode(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn exit_raw_mode(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn now_millis(&mut self) -> u64 {
        0
    }
}

#[test]
fn plain_line_is_returned_and_recorded() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"hello\n");
    let line = editor.read_line(&mut term, "> ").unwrap();
    assert_eq!(line, "hello");
    assert_eq!(editor.history().iter().collect::<Vec<_>>(), ["hello"]);
}

#[test]
fn home_and_end_do_not_change_the_buffer() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"hi\x01\x05\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "hi");
}

#[test]
fn backspace_removes_typed_bytes() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"abc\x7f\x7f\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "a");
}

#[test]
fn left_arrow_then_insert_edits_mid_line() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"foo\x1b[Dx\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "foxo");
}

#[test]
fn history_suppresses_adjacent_duplicates_across_sessions() {
    let mut editor = Editor::new();
    for script in [b"a\n".as_slice(), b"b\n", b"b\n"] {
        let mut term = MockTerminal::new(script);
        editor.read_line(&mut term, "> ").unwrap();
    }
    assert_eq!(editor.history().iter().collect::<Vec<_>>(), ["a", "b"]);
}

#[test]
fn multi_line_wrap_fixup_grows_rows() {
    let mut editor = Editor::new();
    editor.set_multi_line(true);
    let mut term = MockTerminal::with_cols(b"abcdefghij\n", 10);

    let mut session = editor.start(&mut term, "> ").unwrap();
    let line = loop {
        match editor.feed(&mut term, &mut session).unwrap() {
            Feed::More => continue,
            Feed::Line(line) => break line,
        }
    };
    assert_eq!(line, "abcdefghij");
    // prompt (2) + 8 bytes hit the right margin exactly: the forced wrap
    // must have been emitted and the drawn area is two rows
    assert_eq!(session.rows(), 2);
    assert!(term.output.windows(2).any(|w| w == b"\n\r"));
    editor.stop(&mut term, session).unwrap();
}

#[test]
fn paste_burst_is_appended_without_refresh() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"abc\n");
    term.tick = 1;
    let line = editor.read_line(&mut term, "> ").unwrap();
    assert_eq!(line, "abc");
    // raw echoes only: no erase-to-right sequences between the letters
    let out = term.output_str();
    let body = &out["> ".len()..];
    assert!(body.starts_with("abc"));
}

#[test]
fn paste_byte_mid_line_is_not_lost() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"ab\x1b[Dx\n");
    // everything typed slowly except the 'x', which arrives paste-fast
    term.ticks = [100, 100, 100, 100, 100, 1, 100].into_iter().collect();
    let line = editor.read_line(&mut term, "> ").unwrap();
    assert_eq!(line, "axb");
}

#[test]
fn interrupt_reports_and_leaves_history_clean() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"abc\x03");
    assert_eq!(editor.read_line(&mut term, "> "), Err(Error::Interrupted));
    assert!(editor.history().is_empty());
}

#[test]
fn ctrl_d_on_empty_line_is_eof() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"\x04");
    assert_eq!(editor.read_line(&mut term, "> "), Err(Error::Eof));
    assert!(editor.history().is_empty());
}

#[test]
fn ctrl_d_with_content_deletes_forward() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"ab\x01\x04\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "b");
}

#[test]
fn empty_enter_does_not_grow_history() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "");
    assert!(editor.history().is_empty());
}

#[test]
fn kill_ops_edit_the_line() {
    let mut editor = Editor::new();

    let mut term = MockTerminal::new(b"hello world\x17\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "hello ");

    let mut term = MockTerminal::new(b"hello\x01\x0b\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "");

    let mut term = MockTerminal::new(b"hello\x15\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "");
}

#[test]
fn transpose_swaps_previous_byte() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"abc\x1b[D\x14\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "acb");
}

#[test]
fn history_navigation_recalls_and_persists_edits() {
    let mut editor = Editor::new();
    editor.history_mut().add("first");
    editor.history_mut().add("second");

    // up to "second", append '!', up to "first", accept
    let mut term = MockTerminal::new(b"\x10!\x10\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "first");
    assert_eq!(
        editor.history().iter().collect::<Vec<_>>(),
        ["first", "second!", "first"]
    );
}

#[test]
fn history_navigation_clamps_at_the_oldest_entry() {
    let mut editor = Editor::new();
    editor.history_mut().add("only");

    // two ups: the second one has nowhere to go
    let mut term = MockTerminal::new(b"\x1b[A\x1b[A\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "only");
}

#[test]
fn history_down_returns_to_the_working_line() {
    let mut editor = Editor::new();
    editor.history_mut().add("old");

    // type, go up, come back down with Ctrl-N
    let mut term = MockTerminal::new(b"draft\x10\x0e\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "draft");
}

#[test]
fn completion_cycles_and_falls_back_to_the_original() {
    let mut editor = Editor::new();
    editor.set_completer(|line: &str| {
        ["hello", "help"]
            .iter()
            .filter(|c| !line.is_empty() && c.starts_with(line))
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
    });

    // three TABs walk hello -> help -> original (with a beep), Enter keeps
    // the original text
    let mut term = MockTerminal::new(b"he\t\t\t\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "he");
    assert!(term.output.contains(&0x07));
    assert!(term.output_str().contains("hello"));
    assert!(term.output_str().contains("help"));
}

#[test]
fn completion_commits_on_any_other_key() {
    let mut editor = Editor::new();
    editor.set_completer(|line: &str| {
        if line == "he" {
            vec!["hello".to_string()]
        } else {
            Vec::new()
        }
    });

    let mut term = MockTerminal::new(b"he\t \n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "hello ");
}

#[test]
fn completion_cancels_on_escape() {
    let mut editor = Editor::new();
    editor.set_completer(|line: &str| {
        if line == "he" {
            vec!["hello".to_string()]
        } else {
            Vec::new()
        }
    });

    let mut term = MockTerminal::new(b"he\t\x1bllo\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "hello");
}

#[test]
fn completion_with_no_candidates_beeps_and_passes_the_tab() {
    let mut editor = Editor::new();
    editor.set_completer(|_: &str| Vec::new());

    let mut term = MockTerminal::new(b"x\t\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "x\t");
    assert!(term.output.contains(&0x07));
}

#[test]
fn mask_mode_never_echoes_the_secret() {
    let mut editor = Editor::new();
    editor.set_mask_mode(true);
    let mut term = MockTerminal::new(b"ab\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "ab");
    assert!(!term.output.contains(&b'a'));
    assert!(!term.output.contains(&b'b'));
    assert_eq!(term.output.iter().filter(|&&c| c == b'*').count(), 2);
}

#[test]
fn dumb_mode_echoes_and_collects() {
    let mut editor = Editor::new();
    editor.set_dumb_mode(true);
    let mut term = MockTerminal::new(b"ab\x7fc\x1d\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "ac");
    // primitive erase for the backspace, 0x1c-0x1f noise ignored
    assert!(term.output_str().contains("\x08 \x08"));
    assert_eq!(editor.history().iter().collect::<Vec<_>>(), ["ac"]);
}

#[test]
fn hints_are_suppressed_on_the_final_refresh() {
    let mut editor = Editor::new();
    editor.set_hinter(|line: &str| {
        if line == "hello" {
            Some(Hint::new(" there").color(35))
        } else {
            None
        }
    });

    let mut term = MockTerminal::new(b"hello\n");
    assert_eq!(editor.read_line(&mut term, "> ").unwrap(), "hello");
    let out = term.output_str();
    assert!(out.contains(" there"));
    // after the last styled hint reset, the accepted line is drawn bare
    let tail = &out[out.rfind("\x1b[0m").unwrap()..];
    assert!(tail.contains("> hello"));
    assert!(!tail.contains(" there"));
}

#[test]
fn hide_then_show_erases_and_redraws() {
    let mut editor = Editor::new();
    let mut term = MockTerminal::new(b"ab");
    let mut session = editor.start(&mut term, "> ").unwrap();
    for _ in 0..2 {
        assert_eq!(editor.feed(&mut term, &mut session).unwrap(), Feed::More);
    }

    term.output.clear();
    editor.hide(&mut term, &mut session).unwrap();
    assert_eq!(term.output, b"\r\x1b[0K");

    term.output.clear();
    editor.show(&mut term, &mut session).unwrap();
    assert_eq!(term.output, b"\r> ab\x1b[0K\r\x1b[4C");

    term.input.push_back(b'\n');
    loop {
        match editor.feed(&mut term, &mut session).unwrap() {
            Feed::More => continue,
            Feed::Line(line) => {
                assert_eq!(line, "ab");
                break;
            }
        }
    }
    editor.stop(&mut term, session).unwrap();
}

#[test]
fn max_line_len_floor_is_enforced() {
    let mut editor = Editor::new();
    assert_eq!(editor.set_max_line_len(10), Err(Error::TooShort(10)));
    assert!(editor.set_max_line_len(64).is_ok());
}

#[test]
fn full_buffer_rejects_further_input() {
    let mut editor = Editor::new();
    editor.set_max_line_len(64).unwrap();

    let mut script = vec![b'x'; 70];
    script.push(b'\n');
    let mut term = MockTerminal::new(&script);
    let line = editor.read_line(&mut term, "> ").unwrap();
    assert_eq!(line.len(), 63);
}

#[test]
fn probe_reports_an_answering_terminal() {
    let mut term = MockTerminal::new(b"\x1b[0n");
    assert_eq!(probe(&mut term).unwrap(), ProbeOutcome::Supported);
    assert!(term.output.ends_with(b"\x1b[5n"));
}

#[test]
fn probe_times_out_on_a_silent_terminal() {
    let mut term = MockTerminal::new(b"");
    assert_eq!(probe(&mut term).unwrap(), ProbeOutcome::NoResponse);
}

#[test]
fn probe_rejects_a_garbage_reply() {
    let mut term = MockTerminal::new(b"junk");
    assert_eq!(probe(&mut term).unwrap(), ProbeOutcome::NoResponse);
}

#[test]
fn probe_is_unknown_when_the_channel_cannot_poll() {
    let mut term = NoPollTerminal { output: Vec::new() };
    assert_eq!(probe(&mut term).unwrap(), ProbeOutcome::Unknown);
}

#[test]
fn columns_prefers_the_host_report() {
    let mut term = MockTerminal::new(b"");
    term.cols = Some(40);
    assert_eq!(rawline::columns(&mut term), 40);
    // no DSR traffic when the host already knows
    assert!(term.output.is_empty());
}

#[test]
fn columns_falls_back_to_the_cursor_probe() {
    let mut term = MockTerminal::new(b"\x1b[1;5R\x1b[1;40R");
    term.cols = None;
    assert_eq!(rawline::columns(&mut term), 40);
    let out = term.output_str();
    assert!(out.contains("\x1b[999C"));
    assert!(out.contains("\x1b[35D"));
}

#[test]
fn columns_defaults_to_80_on_garbage() {
    let mut term = MockTerminal::new(b"nonsense");
    term.cols = None;
    assert_eq!(rawline::columns(&mut term), 80);
}
