//! `hashline` — a verified line-addressed text editor.
//!
//! Every editing command names its target line(s) by both a 1-based line
//! number and a 4-hex content hash of the line the caller last saw. If the
//! hash no longer matches the live buffer, the whole call fails instead of
//! silently editing the wrong line.
//!
//! The primary entry point is [`exhash`]. See `src/main.rs` for a CLI
//! that applies this to files on disk.

pub mod address;
pub mod buffer;
pub mod command;
pub mod eval;
pub mod hash;
pub mod result;

pub use anyhow::{Error, Result};
pub use hash::{line_hash, lnhash, lnhashview};
pub use result::EditResult;

use buffer::Buffer;

/// Splits `text` on `\n`. A trailing newline produces one exclusively-
/// empty trailing split element, which is discarded; interior empty
/// lines are preserved. Empty input yields zero lines.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut parts: Vec<&str> = text.split('\n').collect();
    if text.ends_with('\n') {
        parts.pop();
    }
    parts.into_iter().map(|s| s.to_string()).collect()
}

/// Applies `cmds` in order to `text` and returns the annotated result.
///
/// Each command string begins with one or two `lineno|hash|` addresses
/// (see [`address`]) naming the line(s) it targets, followed by a tail
/// classified by [`command::parse_command`] into one of the primitive
/// operations. Commands are applied strictly in order; an address is
/// always verified against the buffer as mutated by every prior command.
/// The first failure aborts the whole call — no partial result is ever
/// returned.
pub fn exhash<S: AsRef<str>>(text: &str, cmds: &[S]) -> Result<EditResult> {
    let mut buf = Buffer::new(text);
    let cmds: Vec<String> = cmds.iter().map(|s| s.as_ref().to_string()).collect();
    eval::run(&mut buf, &cmds)?;
    let (lines, modified, deleted) = buf.into_parts();
    Ok(EditResult::build(lines, modified, deleted))
}
