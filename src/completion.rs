//! Tab-completion and hint callbacks supplied by the host.

use alloc::string::String;
use alloc::vec::Vec;

/// Supplies completion candidates for the line typed so far.
///
/// Implemented for plain closures, so a host can write
/// `editor.set_completer(|line: &str| ...)`.
pub trait Completer {
    fn complete(&self, line: &str) -> Vec<String>;
}

impl<F> Completer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn complete(&self, line: &str) -> Vec<String> {
        self(line)
    }
}

/// Advisory text drawn to the right of the cursor, never part of the
/// returned line.
pub struct Hint {
    pub text: String,
    /// SGR color code; `None` renders unstyled (or the default 37 when
    /// combined with bold).
    pub color: Option<u8>,
    pub bold: bool,
}

impl Hint {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self { text: text.into(), color: None, bold: false }
    }

    pub fn color(mut self, color: u8) -> Self {
        self.color = Some(color);
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Supplies the hint for the line typed so far, if any.
pub trait Hinter {
    fn hint(&self, line: &str) -> Option<Hint>;
}

impl<F> Hinter for F
where
    F: Fn(&str) -> Option<Hint>,
{
    fn hint(&self, line: &str) -> Option<Hint> {
        self(line)
    }
}

/// One TAB cycle: the candidate list is fetched once when the cycle starts
/// and reused until a keystroke commits or cancels it.
///
/// The slot at `candidates.len()` is the "original buffer" position; while
/// the cursor is there the real line is shown instead of a candidate.
pub(crate) struct CompletionCycle {
    candidates: Vec<String>,
    idx: usize,
}

impl CompletionCycle {
    pub(crate) fn new(candidates: Vec<String>) -> Self {
        Self { candidates, idx: 0 }
    }

    /// The candidate currently shown, or `None` on the original-buffer slot.
    pub(crate) fn current(&self) -> Option<&str> {
        self.candidates.get(self.idx).map(String::as_str)
    }

    /// Step to the next slot, wrapping. Returns `true` when landing on the
    /// original-buffer slot (the caller beeps).
    pub(crate) fn advance(&mut self) -> bool {
        self.idx = (self.idx + 1) % (self.candidates.len() + 1);
        self.idx == self.candidates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use alloc::vec;

    #[test]
    fn cycle_wraps_through_original_slot() {
        let mut cycle = CompletionCycle::new(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(cycle.current(), Some("one"));
        assert!(!cycle.advance());
        assert_eq!(cycle.current(), Some("two"));
        // landing on the original slot reports true and shows no candidate
        assert!(cycle.advance());
        assert_eq!(cycle.current(), None);
        assert!(!cycle.advance());
        assert_eq!(cycle.current(), Some("one"));
    }

    #[test]
    fn closure_completer_and_hinter() {
        let completer = |line: &str| {
            ["alpha", "beta"]
                .iter()
                .filter(|c| c.starts_with(line))
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(completer.complete("al"), ["alpha"]);

        let hinter = |line: &str| {
            if line == "al" {
                Some(Hint::new("pha").color(35).bold())
            } else {
                None
            }
        };
        let hint = hinter.hint("al").unwrap();
        assert_eq!(hint.text, "pha");
        assert_eq!(hint.color, Some(35));
        assert!(hint.bold);
        assert!(hinter.hint("x").is_none());
    }
}
