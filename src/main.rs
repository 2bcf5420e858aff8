use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use hashline::{exhash, lnhashview};

#[derive(Parser, Debug)]
#[command(name = "hashline")]
#[command(about = "Verified line-addressed text editing (LINE|HASH| anchors)")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a file as hash-addressed lines: N|HHHH|  content
    View { path: PathBuf },

    /// Read a file, printing hash-addressed lines within an optional window
    Read {
        path: PathBuf,
        /// Start line (1-indexed)
        #[arg(long)]
        offset: Option<usize>,
        /// Max lines
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Apply one or more `lineno|hash|cmd` edits to a file
    Edit {
        path: PathBuf,
        /// One `lineno|hash|cmd` command per occurrence, applied in order
        #[arg(required = true)]
        cmds: Vec<String>,
        /// Print a basic before/after diff before writing
        #[arg(long)]
        preview: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::View { path } => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("view: failed to read {}", path.display()))?;
            for line in lnhashview(&content) {
                println!("{}", line);
            }
        }

        Command::Read { path, offset, limit } => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("read: failed to read {}", path.display()))?;
            let view = lnhashview(&content);

            let start = offset.unwrap_or(1);
            if start == 0 {
                bail!("--offset is 1-indexed (must be >= 1)");
            }
            if start > view.len().max(1) {
                bail!("offset {} out of range (file has {} lines)", start, view.len());
            }

            let max_lines = limit.unwrap_or(view.len());
            for (i, entry) in view.iter().enumerate() {
                let line_no = i + 1;
                if line_no < start {
                    continue;
                }
                if line_no - start >= max_lines {
                    break;
                }
                println!("{}", entry);
            }
        }

        Command::Edit { path, cmds, preview } => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("edit: failed to read {}", path.display()))?;
            let line_ending = detect_line_ending(&raw);
            let had_final_newline = raw.ends_with('\n');
            let normalized = normalize_to_lf(&raw);

            let result = exhash(&normalized, &cmds)
                .with_context(|| format!("edit: failed to apply edits to {}", path.display()))?;

            if preview {
                eprintln!("--- {}\n+++ {}\n", path.display(), path.display());
                render_basic_diff(&hashline::split_lines(&normalized), &result.lines);
            }

            let old_lines = hashline::split_lines(&normalized);
            if old_lines == result.lines {
                bail!("no changes made (edits produced identical content)");
            }

            let mut out = result.text();
            if had_final_newline {
                out.push('\n');
            }
            out = restore_line_endings(&out, line_ending);

            fs::write(&path, out).with_context(|| format!("edit: failed to write {}", path.display()))?;
            eprintln!("wrote {} line(s) to {}", result.lines.len(), path.display());
            if !result.modified.is_empty() {
                eprintln!("{}", result);
            }
        }
    }

    Ok(())
}

fn detect_line_ending(s: &str) -> &'static str {
    if s.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

fn normalize_to_lf(s: &str) -> String {
    s.replace("\r\n", "\n")
}

fn restore_line_endings(s: &str, ending: &str) -> String {
    if ending == "\n" {
        s.to_string()
    } else {
        s.replace('\n', ending)
    }
}

fn render_basic_diff(old_lines: &[String], new_lines: &[String]) {
    let max = old_lines.len().max(new_lines.len());
    for i in 0..max {
        match (old_lines.get(i), new_lines.get(i)) {
            (Some(x), Some(y)) if x == y => {}
            (Some(x), Some(y)) => {
                eprintln!("-{}", x);
                eprintln!("+{}", y);
            }
            (Some(x), None) => eprintln!("-{}", x),
            (None, Some(y)) => eprintln!("+{}", y),
            (None, None) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_lf_by_default() {
        assert_eq!(detect_line_ending("a\nb\n"), "\n");
        assert_eq!(detect_line_ending("a"), "\n");
    }

    #[test]
    fn detects_crlf_when_present() {
        assert_eq!(detect_line_ending("a\r\nb\r\n"), "\r\n");
    }

    #[test]
    fn normalize_and_restore_crlf_round_trip() {
        let original = "fn main() {\r\n    x\r\n}\r\n";
        let ending = detect_line_ending(original);
        let normalized = normalize_to_lf(original);
        assert_eq!(normalized, "fn main() {\n    x\n}\n");
        assert_eq!(restore_line_endings(&normalized, ending), original);
    }

    #[test]
    fn restore_is_a_no_op_for_lf() {
        let normalized = "a\nb\n";
        assert_eq!(restore_line_endings(normalized, "\n"), normalized);
    }

    #[test]
    fn edit_round_trip_preserves_trailing_newline_and_crlf() {
        // Mirrors the `edit` subcommand's pipeline without touching the
        // filesystem: detect the line ending and trailing-newline
        // presence up front, normalize to LF for `exhash`, then restore
        // both on the way back out.
        let raw = "one\r\ntwo\r\n";
        let line_ending = detect_line_ending(raw);
        let had_final_newline = raw.ends_with('\n');
        let normalized = normalize_to_lf(raw);

        let a1 = hashline::lnhash(1, "one");
        let result = hashline::exhash(&normalized, &[format!("{}s/one/ONE/", a1)]).unwrap();

        let mut out = result.text();
        if had_final_newline {
            out.push('\n');
        }
        out = restore_line_endings(&out, line_ending);

        assert_eq!(out, "ONE\r\ntwo\r\n");
    }
}
