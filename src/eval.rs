//! The evaluator: dispatches parsed commands against a [`Buffer`] in
//! submission order, mediating snapshot-before-mutation for move/copy/
//! global and expanding `global` into its per-line sub-commands.

use anyhow::{bail, Context, Result};
use regex::{Regex, RegexBuilder};

use crate::address::{self, Addr, Range};
use crate::buffer::{BufLine, Buffer};
use crate::command::{self, Command};
use crate::hash::line_hash;

const INDENT_UNIT: &str = "    ";

/// Runs every command string in order against `buf`. Each command is
/// parsed, verified, and applied before the next is even parsed — later
/// addresses are resolved against the buffer as mutated by earlier
/// commands.
pub fn run(buf: &mut Buffer, cmds: &[String]) -> Result<()> {
    for (idx, cmd) in cmds.iter().enumerate() {
        apply_one(buf, cmd).with_context(|| format!("command {} ({:?})", idx + 1, cmd))?;
    }
    Ok(())
}

/// Parses, verifies, and applies a single `lineno|hash|cmd` command
/// string against the live buffer. Used both for top-level commands and
/// for the synthetic per-line commands `global` expands into.
fn apply_one(buf: &mut Buffer, cmd: &str) -> Result<()> {
    let (range, tail) = address::parse_range(cmd)?;
    address::verify_range(&range, buf)?;
    let command = command::parse_command(tail)?;
    validate_sentinel_usage(&range, &command)?;
    execute(buf, &range, &command)
}

/// Sentinel addresses are only legal in front of `a` (append) and `i`
/// (insert); everything else must name a real line.
fn validate_sentinel_usage(range: &Range, command: &Command) -> Result<()> {
    if !range.is_sentinel() {
        return Ok(());
    }
    match command {
        Command::Append { .. } | Command::Insert { .. } => Ok(()),
        _ => bail!("sentinel address 0|0000| is only legal before 'a' or 'i'"),
    }
}

fn execute(buf: &mut Buffer, range: &Range, command: &Command) -> Result<()> {
    match command {
        Command::Substitute { pattern, replacement, global, ignore_case } => {
            let re = RegexBuilder::new(pattern).case_insensitive(*ignore_case).build()?;
            substitute_range(buf, range.start(), range.end(), &re, replacement, *global);
            Ok(())
        }
        Command::Delete => {
            delete_range(buf, range.start(), range.end());
            Ok(())
        }
        Command::Append { text } => {
            let pos0 = if range.is_sentinel() { 0 } else { range.end() };
            insert_new_lines(buf, pos0, text);
            Ok(())
        }
        Command::Insert { text } => {
            let pos0 = if range.is_sentinel() { 0 } else { range.start() - 1 };
            insert_new_lines(buf, pos0, text);
            Ok(())
        }
        Command::Change { text } => {
            change_range(buf, range.start(), range.end(), text);
            Ok(())
        }
        Command::Join => join(buf, range),
        Command::Move { dest } => move_range(buf, range.start(), range.end(), dest),
        Command::Copy { dest } => copy_range(buf, range.start(), range.end(), dest),
        Command::Indent { levels } => {
            indent_range(buf, range.start(), range.end(), *levels, true);
            Ok(())
        }
        Command::Dedent { levels } => {
            indent_range(buf, range.start(), range.end(), *levels, false);
            Ok(())
        }
        Command::Sort => {
            sort_range(buf, range.start(), range.end());
            Ok(())
        }
        Command::Print => Ok(()),
        Command::Global { pattern, inverted, sub_cmd } => {
            run_global(buf, range.start(), range.end(), pattern, *inverted, sub_cmd)
        }
    }
}

fn substitute_range(buf: &mut Buffer, start: usize, end: usize, re: &Regex, replacement: &str, global: bool) {
    for i in start..=end {
        let content = buf.content(i);
        if !re.is_match(content) {
            continue;
        }
        let new_content = if global {
            re.replace_all(content, replacement).into_owned()
        } else {
            re.replace(content, replacement).into_owned()
        };
        buf.line_mut(i).content = new_content;
        buf.set_modified(i);
    }
}

fn delete_range(buf: &mut Buffer, start: usize, end: usize) {
    let removed = buf.splice(start - 1, end, vec![]);
    buf.mark_deleted(&removed);
}

fn insert_new_lines(buf: &mut Buffer, pos0: usize, text: &[String]) {
    if text.is_empty() {
        return;
    }
    let new_lines: Vec<BufLine> = text.iter().map(|s| BufLine::new_line(s.clone())).collect();
    buf.splice(pos0, pos0, new_lines);
}

fn change_range(buf: &mut Buffer, start: usize, end: usize, text: &[String]) {
    let new_lines: Vec<BufLine> = text.iter().map(|s| BufLine::new_line(s.clone())).collect();
    let removed = buf.splice(start - 1, end, new_lines);
    buf.mark_deleted(&removed);
}

fn join(buf: &mut Buffer, range: &Range) -> Result<()> {
    let (start, end) = match range {
        Range::Single(a) => {
            if a.lineno == buf.len() {
                bail!("join: line {} is the last line", a.lineno);
            }
            (a.lineno, a.lineno + 1)
        }
        Range::Span(a, b) => (a.lineno, b.lineno),
    };
    let removed = buf.splice(start - 1, end, vec![]);
    let joined_content: String = removed.iter().map(|l| l.content.as_str()).collect();
    let origin = removed[0].origin;
    if removed.len() > 1 {
        buf.mark_deleted(&removed[1..]);
    }
    let joined = BufLine { content: joined_content, origin, modified: true };
    buf.splice(start - 1, start - 1, vec![joined]);
    Ok(())
}

/// `m`/`t` destinations name an existing line to splice after; the
/// sentinel denotes the position before line 1 and is legal only in
/// front of `a`/`i` (§3), never as a move/copy destination.
fn reject_sentinel_dest(dest: &Addr) -> Result<()> {
    if dest.is_sentinel() {
        bail!("sentinel address 0|0000| is not a legal move/copy destination");
    }
    Ok(())
}

fn move_range(buf: &mut Buffer, start: usize, end: usize, dest: &Addr) -> Result<()> {
    reject_sentinel_dest(dest)?;
    address::verify_addr(dest, buf)?;
    if dest.lineno >= start && dest.lineno <= end {
        bail!("move destination falls inside the source range");
    }
    let removed = buf.splice(start - 1, end, vec![]);
    let removed_count = end - start + 1;
    let new_dest_pos = if dest.lineno < start {
        dest.lineno
    } else {
        dest.lineno - removed_count
    };
    let moved: Vec<BufLine> = removed
        .into_iter()
        .map(|mut l| {
            l.modified = true;
            l
        })
        .collect();
    buf.splice(new_dest_pos, new_dest_pos, moved);
    Ok(())
}

fn copy_range(buf: &mut Buffer, start: usize, end: usize, dest: &Addr) -> Result<()> {
    reject_sentinel_dest(dest)?;
    address::verify_addr(dest, buf)?;
    if dest.lineno >= start && dest.lineno <= end {
        bail!("copy destination falls inside the source range");
    }
    let copies: Vec<BufLine> = buf
        .slice(start, end)
        .iter()
        .map(|l| BufLine::new_line(l.content.clone()))
        .collect();
    buf.splice(dest.lineno, dest.lineno, copies);
    Ok(())
}

fn indent_range(buf: &mut Buffer, start: usize, end: usize, levels: usize, indent: bool) {
    for i in start..=end {
        let content = buf.content(i);
        let new_content = if indent {
            format!("{}{}", INDENT_UNIT.repeat(levels), content)
        } else {
            dedent_line(content, levels)
        };
        if new_content != content {
            buf.line_mut(i).content = new_content;
            buf.set_modified(i);
        }
    }
}

fn dedent_line(content: &str, levels: usize) -> String {
    let leading = content.chars().take_while(|&c| c == ' ').count();
    let remove = leading.min(levels * 4);
    content[remove..].to_string()
}

fn sort_range(buf: &mut Buffer, start: usize, end: usize) {
    let mut slice = buf.splice(start - 1, end, vec![]);
    let before: Vec<String> = slice.iter().map(|l| l.content.clone()).collect();
    slice.sort_by(|a, b| a.content.as_bytes().cmp(b.content.as_bytes()));
    for (i, l) in slice.iter_mut().enumerate() {
        if l.content != before[i] {
            l.modified = true;
        }
    }
    buf.splice(start - 1, start - 1, slice);
}

fn run_global(
    buf: &mut Buffer,
    start: usize,
    end: usize,
    pattern: &str,
    inverted: bool,
    sub_cmd: &str,
) -> Result<()> {
    let match_re = Regex::new(pattern)?;
    let mut snapshot = Vec::new();
    for i in start..=end {
        let content = buf.content(i);
        let is_match = match_re.is_match(content);
        if is_match != inverted {
            snapshot.push(Addr { lineno: i, hash: line_hash(content) });
        }
    }

    let sub_command = command::parse_command(sub_cmd)?;
    // Substitute is the only sub-command whose cost scales with snapshot
    // size via regex work; compile it once and reuse across every match
    // instead of rebuilding a Regex per line.
    let cached_substitute = match &sub_command {
        Command::Substitute { pattern, replacement, global, ignore_case } => {
            let re = RegexBuilder::new(pattern).case_insensitive(*ignore_case).build()?;
            Some((re, replacement.clone(), *global))
        }
        _ => None,
    };

    for addr in snapshot {
        address::verify_addr(&addr, buf)?;
        let sub_range = Range::Single(addr.clone());
        validate_sentinel_usage(&sub_range, &sub_command)?;
        if let Some((re, replacement, is_global)) = &cached_substitute {
            substitute_range(buf, addr.lineno, addr.lineno, re, replacement, *is_global);
        } else {
            execute(buf, &sub_range, &sub_command)?;
        }
    }
    Ok(())
}
