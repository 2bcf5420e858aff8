//! Address and range parsing: the `N|HHHH|` grammar at the head of every
//! command string, plus verification against a live buffer.

use anyhow::{anyhow, bail, Result};

use crate::hash::line_hash;

/// The sentinel line number — denotes the position before line 1.
pub const SENTINEL_LINE: usize = 0;
/// The sentinel hash — paired with [`SENTINEL_LINE`] it forms `0|0000|`.
pub const SENTINEL_HASH: &str = "0000";

/// A single parsed address: `(lineno, hash)`.
///
/// Addresses are kept as values, never re-parsed from strings once
/// produced — the textual form is reconstructed only for output (see
/// [`crate::hash::lnhash`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Addr {
    pub lineno: usize,
    pub hash: String,
}

impl Addr {
    pub fn is_sentinel(&self) -> bool {
        self.lineno == SENTINEL_LINE && self.hash == SENTINEL_HASH
    }
}

/// A verified target: either a single line or an inclusive range of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Range {
    Single(Addr),
    Span(Addr, Addr),
}

impl Range {
    /// Lower bound, 1-based, inclusive.
    pub fn start(&self) -> usize {
        match self {
            Range::Single(a) => a.lineno,
            Range::Span(a, _) => a.lineno,
        }
    }

    /// Upper bound, 1-based, inclusive.
    pub fn end(&self) -> usize {
        match self {
            Range::Single(a) => a.lineno,
            Range::Span(_, b) => b.lineno,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, Range::Single(a) if a.is_sentinel())
    }
}

/// Parses one `DIGITS "|" HEX4 "|"` address from the head of `s`.
///
/// Returns the parsed address and the remainder of `s` after the closing
/// `|`.
fn parse_one(s: &str) -> Result<(Addr, &str)> {
    let bar1 = s
        .find('|')
        .ok_or_else(|| anyhow!("malformed address (missing '|' after line number): {:?}", s))?;
    let (digits, rest) = s.split_at(bar1);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        bail!("malformed address (expected decimal line number): {:?}", digits);
    }
    let lineno: usize = digits
        .parse()
        .map_err(|_| anyhow!("malformed address (line number out of range): {:?}", digits))?;

    let rest = &rest[1..]; // drop leading '|'
    let bar2 = rest
        .find('|')
        .ok_or_else(|| anyhow!("malformed address (missing closing '|' after hash): {:?}", s))?;
    let (hash, tail) = rest.split_at(bar2);
    if hash.len() != 4 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) || hash.to_ascii_lowercase() != hash {
        bail!("malformed address (expected 4 lowercase hex digits): {:?}", hash);
    }
    let tail = &tail[1..]; // drop closing '|'

    Ok((
        Addr {
            lineno,
            hash: hash.to_string(),
        },
        tail,
    ))
}

/// Parses a single address or a comma-separated range from the head of
/// `s`, returning the parsed [`Range`] and the remaining command tail.
pub fn parse_range(s: &str) -> Result<(Range, &str)> {
    let (first, rest) = parse_one(s)?;
    if let Some(after_comma) = rest.strip_prefix(',') {
        let (second, tail) = parse_one(after_comma)?;
        if first.lineno > second.lineno {
            bail!(
                "invalid range: start line {} is after end line {}",
                first.lineno,
                second.lineno
            );
        }
        Ok((Range::Span(first, second), tail))
    } else {
        Ok((Range::Single(first), rest))
    }
}

/// Anything that can answer "how many lines, and what is line N" — lets
/// verification run against either a plain `&[String]` (tests) or a live
/// [`crate::buffer::Buffer`] without cloning its content.
pub trait LineSource {
    fn line_count(&self) -> usize;
    fn line_at(&self, lineno: usize) -> &str;
}

impl LineSource for [String] {
    fn line_count(&self) -> usize {
        self.len()
    }
    fn line_at(&self, lineno: usize) -> &str {
        &self[lineno - 1]
    }
}

/// Verifies a single address against `src`. The sentinel passes
/// unconditionally.
pub fn verify_addr<L: LineSource + ?Sized>(addr: &Addr, src: &L) -> Result<()> {
    if addr.is_sentinel() {
        return Ok(());
    }
    let len = src.line_count();
    if addr.lineno == 0 || addr.lineno > len {
        bail!("line {} out of range (buffer has {} lines)", addr.lineno, len);
    }
    let actual = line_hash(src.line_at(addr.lineno));
    if actual != addr.hash {
        bail!(
            "hash mismatch at line {}: supplied {}, actual {}",
            addr.lineno,
            addr.hash,
            actual
        );
    }
    Ok(())
}

/// Verifies every address in `range` against `src`.
pub fn verify_range<L: LineSource + ?Sized>(range: &Range, src: &L) -> Result<()> {
    match range {
        Range::Single(a) => verify_addr(a, src),
        Range::Span(a, b) => {
            verify_addr(a, src)?;
            verify_addr(b, src)
        }
    }
}
