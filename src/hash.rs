//! Line hashing: a 4-hex-digit fingerprint of a line's raw bytes.
//!
//! The fingerprint is deliberately small (16 bits) — addresses also carry
//! the line number, so a hash collision alone never causes a wrong line to
//! be edited, only a spurious mismatch that the caller must re-derive.

use xxhash_rust::xxh32::xxh32;

/// A 4-character lowercase hex digest of a line's bytes.
pub type LineHash = String;

/// Deterministic 4-hex digest of `line`'s bytes.
///
/// Unlike some hashline dialects, this hashes the line verbatim: it does
/// not strip whitespace. `indent`/`dedent` rely on whitespace-only edits
/// changing the hash.
pub fn line_hash(line: &str) -> LineHash {
    let h = xxh32(line.as_bytes(), 0) & 0xffff;
    format!("{:04x}", h)
}

/// Canonical address string `"N|HHHH|"` for `lineno` pointing at `line`.
pub fn lnhash(lineno: usize, line: &str) -> String {
    format!("{}|{}|", lineno, line_hash(line))
}

/// Splits `text` the way the evaluator does (see [`crate::split_lines`]) and
/// formats each line as `"N|HHHH|  LINE"`.
pub fn lnhashview(text: &str) -> Vec<String> {
    crate::split_lines(text)
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}  {}", lnhash(i + 1, line), line))
        .collect()
}
