//! Bounded command history with optional file persistence.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

pub(crate) const DEFAULT_HISTORY_MAX_LEN: usize = 100;

/// Ordered history of accepted lines, oldest first.
///
/// Empty lines and lines equal to the most recent entry are not recorded;
/// when the configured capacity is exceeded the oldest entry is dropped.
pub struct History {
    entries: Vec<String>,
    max_len: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_HISTORY_MAX_LEN)
    }

    /// A history bounded to `max_len` entries; `0` disables recording.
    pub fn with_max_len(max_len: usize) -> Self {
        Self { entries: Vec::new(), max_len }
    }

    /// Record `line`. Returns whether an entry was actually added.
    pub fn add(&mut self, line: &str) -> bool {
        if self.max_len == 0 || line.is_empty() {
            return false;
        }
        if self.entries.last().map(String::as_str) == Some(line) {
            return false;
        }
        if self.entries.len() == self.max_len {
            self.entries.remove(0);
        }
        self.entries.push(line.to_string());
        true
    }

    /// Shrink or grow the capacity, keeping the newest entries. A zero
    /// length is rejected; use [`History::clear`] to drop everything.
    pub fn set_max_len(&mut self, max_len: usize) -> bool {
        if max_len == 0 {
            return false;
        }
        if self.entries.len() > max_len {
            let excess = self.entries.len() - max_len;
            self.entries.drain(..excess);
        }
        self.max_len = max_len;
        true
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Append the mutable scratch entry a session edits in place. Unlike
    /// [`History::add`] this always appends, so navigation can treat the
    /// newest slot as the line under edit.
    pub(crate) fn push_working(&mut self) -> bool {
        if self.max_len == 0 {
            return false;
        }
        if self.entries.len() == self.max_len {
            self.entries.remove(0);
        }
        self.entries.push(String::new());
        true
    }

    pub(crate) fn pop_working(&mut self) {
        self.entries.pop();
    }

    pub(crate) fn replace(&mut self, index: usize, line: &str) {
        if let Some(entry) = self.entries.get_mut(index) {
            *entry = line.to_string();
        }
    }

    /// Write one entry per line, LF-terminated, truncating any existing
    /// file.
    #[cfg(feature = "std")]
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> crate::Result<()> {
        use std::io::Write;

        let mut file =
            std::fs::File::create(path).map_err(|_| crate::Error::Io("history create failed"))?;
        for entry in &self.entries {
            file.write_all(entry.as_bytes())
                .and_then(|_| file.write_all(b"\n"))
                .map_err(|_| crate::Error::Io("history write failed"))?;
        }
        Ok(())
    }

    /// Append every line of the file through [`History::add`], stripping
    /// trailing CR/LF. A missing file is an error; an empty file succeeds.
    #[cfg(feature = "std")]
    pub fn load<P: AsRef<std::path::Path>>(&mut self, path: P) -> crate::Result<()> {
        use std::io::BufRead;

        let file =
            std::fs::File::open(path).map_err(|_| crate::Error::Io("history open failed"))?;
        for line in std::io::BufReader::new(file).lines() {
            let line = line.map_err(|_| crate::Error::Io("history read failed"))?;
            self.add(&line);
        }
        Ok(())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_records_in_order() {
        let mut h = History::new();
        assert!(h.add("a"));
        assert!(h.add("b"));
        assert_eq!(h.iter().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn adjacent_duplicates_are_suppressed() {
        let mut h = History::new();
        h.add("a");
        h.add("b");
        assert!(!h.add("b"));
        assert!(h.add("a"));
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn empty_lines_are_not_recorded() {
        let mut h = History::new();
        assert!(!h.add(""));
        assert!(h.is_empty());
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut h = History::with_max_len(3);
        for line in ["a", "b", "c", "d"] {
            h.add(line);
        }
        assert_eq!(h.iter().collect::<Vec<_>>(), ["b", "c", "d"]);
    }

    #[test]
    fn zero_capacity_disables_recording() {
        let mut h = History::with_max_len(0);
        assert!(!h.add("a"));
        assert!(!h.push_working());
        assert!(h.is_empty());
    }

    #[test]
    fn set_max_len_keeps_newest() {
        let mut h = History::new();
        for line in ["a", "b", "c", "d"] {
            h.add(line);
        }
        assert!(h.set_max_len(2));
        assert_eq!(h.iter().collect::<Vec<_>>(), ["c", "d"]);
        assert!(!h.set_max_len(0));
        assert_eq!(h.max_len(), 2);
    }

    #[test]
    fn working_slot_appends_and_pops() {
        let mut h = History::new();
        h.add("a");
        assert!(h.push_working());
        assert_eq!(h.last(), Some(""));
        h.replace(h.len() - 1, "draft");
        assert_eq!(h.last(), Some("draft"));
        h.pop_working();
        assert_eq!(h.last(), Some("a"));
    }

    #[cfg(feature = "std")]
    #[test]
    fn save_then_load_round_trips() {
        let path = std::env::temp_dir().join("rawline_history_roundtrip");
        let mut h = History::new();
        h.add("first");
        h.add("second");
        h.save(&path).unwrap();

        let mut reloaded = History::new();
        reloaded.load(&path).unwrap();
        assert_eq!(reloaded.iter().collect::<Vec<_>>(), ["first", "second"]);

        h.clear();
        h.save(&path).unwrap();
        let mut empty = History::new();
        empty.load(&path).unwrap();
        assert!(empty.is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[cfg(feature = "std")]
    #[test]
    fn load_missing_file_is_an_error() {
        let mut h = History::new();
        assert!(h.load("/nonexistent/rawline_history").is_err());
    }

    #[cfg(feature = "std")]
    #[test]
    fn load_strips_carriage_returns() {
        use std::io::Write;

        let path = std::env::temp_dir().join("rawline_history_crlf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"one\r\ntwo\n").unwrap();
        drop(file);

        let mut h = History::new();
        h.load(&path).unwrap();
        assert_eq!(h.iter().collect::<Vec<_>>(), ["one", "two"]);
        let _ = std::fs::remove_file(&path);
    }
}
