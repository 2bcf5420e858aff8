//! Result builder: after all commands are applied, recomputes the hash
//! for each surviving line and assembles the final annotated record.
//!
//! This is the presentation layer the core spec calls out of scope for
//! its *exact formatting*, but its shape — `lines`/`hashes`/`modified`/
//! `deleted`, plus `text()`/`view()` convenience rendering — is part of
//! the public contract every caller of [`crate::exhash`] relies on.

use crate::hash::lnhash;

/// The outcome of an [`crate::exhash`] call: the final document, one
/// hash per line, and the two bookkeeping sets the evaluator maintained
/// while applying commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub lines: Vec<String>,
    pub hashes: Vec<String>,
    /// Current-buffer line numbers (1-based) produced or changed by a
    /// command, ascending.
    pub modified: Vec<usize>,
    /// Original-document line numbers (1-based) no longer present in the
    /// result, ascending.
    pub deleted: Vec<usize>,
}

impl EditResult {
    pub(crate) fn build(lines: Vec<String>, modified: Vec<usize>, deleted: Vec<usize>) -> Self {
        let hashes = lines
            .iter()
            .enumerate()
            .map(|(i, line)| lnhash(i + 1, line))
            .collect();
        Self { lines, hashes, modified, deleted }
    }

    /// Rejoins the final document with `\n`, without a trailing newline.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// `"hash  line"` for every output line, one per line, joined by `\n`.
    pub fn view(&self) -> String {
        self.hashes
            .iter()
            .zip(self.lines.iter())
            .map(|(h, l)| format!("{}  {}", h, l))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `"hash  line"` for only the lines flagged modified, in ascending
    /// line-number order. Mirrors the original implementation's `repr`,
    /// which surfaces just the edited lines.
    pub fn modified_view(&self) -> String {
        self.modified
            .iter()
            .filter_map(|&lineno| {
                let idx = lineno.checked_sub(1)?;
                let hash = self.hashes.get(idx)?;
                let line = self.lines.get(idx)?;
                Some(format!("{}  {}", hash, line))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Display for EditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.modified_view())
    }
}
