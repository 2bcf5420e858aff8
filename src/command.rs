//! Command-tail parsing: classifies the text after an address/range into
//! one of the primitive operations and extracts its arguments.

use anyhow::{bail, Result};

use crate::address::Addr;

/// A fully parsed primitive operation, independent of the address/range it
/// targets (the evaluator pairs this with a [`crate::address::Range`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Substitute { pattern: String, replacement: String, global: bool, ignore_case: bool },
    Delete,
    Append { text: Vec<String> },
    Insert { text: Vec<String> },
    Change { text: Vec<String> },
    Join,
    Move { dest: Addr },
    Copy { dest: Addr },
    Indent { levels: usize },
    Dedent { levels: usize },
    Sort,
    Print,
    Global { pattern: String, inverted: bool, sub_cmd: String },
}

/// Reads one `/`-delimited field starting at `s` (which must begin with
/// `/`), honoring `\/` as an escaped literal slash. Returns the field's
/// content and the remainder of `s` after the closing `/`.
fn read_delimited_field(s: &str) -> Result<(String, &str)> {
    if !s.starts_with('/') {
        bail!("expected '/' delimiter, found {:?}", s);
    }
    let mut field = String::new();
    let mut escaped = false;
    let mut iter = s.char_indices();
    iter.next(); // skip opening '/'
    for (i, c) in iter {
        if escaped {
            if c != '/' {
                field.push('\\');
            }
            field.push(c);
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
            continue;
        }
        if c == '/' {
            let rest = &s[i + c.len_utf8()..];
            return Ok((field, rest));
        }
        field.push(c);
    }
    bail!("unterminated pattern, expected closing '/': {:?}", s)
}

/// Parses a single destination address (`"N|HHHH|"`) with nothing left
/// over afterwards.
fn parse_dest(s: &str) -> Result<Addr> {
    let s = s.trim_start();
    let (range, tail) = crate::address::parse_range(s)?;
    if !tail.is_empty() {
        bail!("trailing text after destination address: {:?}", tail);
    }
    match range {
        crate::address::Range::Single(a) => Ok(a),
        crate::address::Range::Span(..) => bail!("destination must be a single address, not a range"),
    }
}

/// Splits a text-block body (the content following the command letter's
/// newline) into its inserted lines. Unlike top-level document splitting,
/// a trailing newline produces a trailing empty line (§4.3).
fn split_text_block(body: &str) -> Vec<String> {
    body.split('\n').map(|s| s.to_string()).collect()
}

/// Parses the text-block convention shared by `a`, `i`, `c`: the command
/// letter must be followed by either nothing (empty block) or a newline
/// and the verbatim block body.
fn parse_text_block(after_letter: &str) -> Result<Vec<String>> {
    if after_letter.is_empty() {
        return Ok(Vec::new());
    }
    let body = after_letter
        .strip_prefix('\n')
        .ok_or_else(|| bail_text_block_err(after_letter))?;
    Ok(split_text_block(body))
}

fn bail_text_block_err(after_letter: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "expected a newline before the text block, found: {:?}",
        after_letter
    )
}

fn require_empty(tail: &str, op: &str) -> Result<()> {
    if !tail.is_empty() {
        bail!("'{}' takes no arguments; unexpected trailing text: {:?}", op, tail);
    }
    Ok(())
}

fn parse_level_count(tail: &str) -> Result<usize> {
    if tail.is_empty() {
        return Ok(1);
    }
    tail.parse::<usize>()
        .map_err(|_| anyhow::anyhow!("expected a level count, found: {:?}", tail))
}

/// Classifies `tail` (the command string remaining after its address(es))
/// into a [`Command`].
pub fn parse_command(tail: &str) -> Result<Command> {
    if tail == "sort" {
        return Ok(Command::Sort);
    }
    if let Some(rest) = tail.strip_prefix("sort") {
        // "sort" followed by anything else is not the sort command; it
        // falls through to the generic "unknown command" error below,
        // since no other primitive starts with "sort".
        bail!("'sort' takes no arguments; unexpected trailing text: {:?}", rest);
    }

    let mut chars = tail.chars();
    let first = chars.next().ok_or_else(|| anyhow::anyhow!("empty command"))?;
    let rest = chars.as_str();

    match first {
        's' => parse_substitute(rest),
        'd' => {
            require_empty(rest, "d")?;
            Ok(Command::Delete)
        }
        'a' => Ok(Command::Append { text: parse_text_block(rest)? }),
        'i' => Ok(Command::Insert { text: parse_text_block(rest)? }),
        'c' => Ok(Command::Change { text: parse_text_block(rest)? }),
        'j' => {
            require_empty(rest, "j")?;
            Ok(Command::Join)
        }
        'm' => Ok(Command::Move { dest: parse_dest(rest)? }),
        't' => Ok(Command::Copy { dest: parse_dest(rest)? }),
        '>' => Ok(Command::Indent { levels: parse_level_count(rest)? }),
        '<' => Ok(Command::Dedent { levels: parse_level_count(rest)? }),
        'p' => {
            require_empty(rest, "p")?;
            Ok(Command::Print)
        }
        'g' => {
            if let Some(after_bang) = rest.strip_prefix('!') {
                parse_global(after_bang, true)
            } else {
                parse_global(rest, false)
            }
        }
        'v' => parse_global(rest, true),
        other => bail!("unknown command letter {:?} in {:?}", other, tail),
    }
}

fn parse_substitute(rest: &str) -> Result<Command> {
    let (pattern, rest) = read_delimited_field(rest)?;
    let (replacement, flags) = read_delimited_field(rest)?;
    let mut global = false;
    let mut ignore_case = false;
    for f in flags.chars() {
        match f {
            'g' => global = true,
            'i' => ignore_case = true,
            other => bail!("unknown substitute flag {:?}", other),
        }
    }
    Ok(Command::Substitute { pattern, replacement, global, ignore_case })
}

fn parse_global(rest: &str, inverted: bool) -> Result<Command> {
    let (pattern, sub_cmd) = read_delimited_field(rest)?;
    if sub_cmd.is_empty() {
        bail!("global command requires a sub-command after the pattern");
    }
    Ok(Command::Global { pattern, inverted, sub_cmd: sub_cmd.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_substitute_with_flags() {
        let c = parse_command("s/foo/bar/gi").unwrap();
        assert_eq!(
            c,
            Command::Substitute {
                pattern: "foo".into(),
                replacement: "bar".into(),
                global: true,
                ignore_case: true,
            }
        );
    }

    #[test]
    fn parses_delete() {
        assert_eq!(parse_command("d").unwrap(), Command::Delete);
        assert!(parse_command("d\nextra").is_err());
    }

    #[test]
    fn parses_append_block() {
        let c = parse_command("a\nx\ny").unwrap();
        assert_eq!(c, Command::Append { text: vec!["x".into(), "y".into()] });
    }

    #[test]
    fn parses_append_trailing_newline() {
        let c = parse_command("a\nx\n").unwrap();
        assert_eq!(c, Command::Append { text: vec!["x".into(), "".into()] });
    }

    #[test]
    fn rejects_text_without_newline() {
        assert!(parse_command("aX").is_err());
    }

    #[test]
    fn parses_sort_and_rejects_args() {
        assert_eq!(parse_command("sort").unwrap(), Command::Sort);
        assert!(parse_command("sort foo").is_err());
    }

    #[test]
    fn parses_indent_dedent_levels() {
        assert_eq!(parse_command(">").unwrap(), Command::Indent { levels: 1 });
        assert_eq!(parse_command(">3").unwrap(), Command::Indent { levels: 3 });
        assert_eq!(parse_command("<2").unwrap(), Command::Dedent { levels: 2 });
    }

    #[test]
    fn parses_global_and_inverted() {
        let c = parse_command("g/foo/d").unwrap();
        assert_eq!(c, Command::Global { pattern: "foo".into(), inverted: false, sub_cmd: "d".into() });
        let c = parse_command("g!/foo/d").unwrap();
        assert_eq!(c, Command::Global { pattern: "foo".into(), inverted: true, sub_cmd: "d".into() });
        let c = parse_command("v/foo/d").unwrap();
        assert_eq!(c, Command::Global { pattern: "foo".into(), inverted: true, sub_cmd: "d".into() });
    }

    #[test]
    fn parses_move_copy_dest() {
        let c = parse_command("m3|abcd|").unwrap();
        assert_eq!(c, Command::Move { dest: Addr { lineno: 3, hash: "abcd".into() } });
        let c = parse_command("t3|abcd|").unwrap();
        assert_eq!(c, Command::Copy { dest: Addr { lineno: 3, hash: "abcd".into() } });
    }
}
