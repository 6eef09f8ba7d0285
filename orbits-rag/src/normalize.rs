//! Cleaning of raw extracted page text.
//!
//! PDF extraction leaves line breaks mid-paragraph, hyphenation at line ends,
//! and running headers/footers repeated on every page. [`normalize`] undoes
//! all of that, producing paragraphs separated by blank lines so the
//! chunker's coarsest separator still has structure to work with.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Runs of two or more newlines, possibly with horizontal whitespace between.
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*(?:\n[ \t]*)+").expect("valid regex"));

/// A hyphen at a line break, followed by the continuation character.
static HYPHEN_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\n([^\n])").expect("valid regex"));

/// Runs of horizontal whitespace.
static HSPACE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));

/// Clean raw extracted text.
///
/// Operations, in order:
/// 1. unify `\r\n`/`\r` line endings to `\n`;
/// 2. collapse runs of blank lines to a single blank line;
/// 3. remove hyphenation at line breaks (`word-\nword` becomes `wordword`);
/// 4. join intra-paragraph line breaks (a lone `\n` not adjacent to another
///    `\n`) into spaces;
/// 5. collapse runs of horizontal whitespace to one space;
/// 6. drop lines that repeat verbatim elsewhere in the document (running
///    headers/footers), keeping the first occurrence in order.
///
/// The surviving paragraphs are re-joined with `\n\n`. Never fails: malformed
/// input degrades to a less-clean string.
pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = HYPHEN_BREAK.replace_all(&text, "$1");
    let text = join_intra_paragraph_breaks(&text);
    let text = HSPACE_RUNS.replace_all(&text, " ");
    dedup_lines(&text)
}

/// Replace every newline that is not adjacent to another newline with a space.
fn join_intra_paragraph_breaks(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    for (i, ch) in text.char_indices() {
        if ch == '\n' {
            let prev_is_newline = i > 0 && bytes[i - 1] == b'\n';
            let next_is_newline = bytes.get(i + 1) == Some(&b'\n');
            if !prev_is_newline && !next_is_newline {
                out.push(' ');
                continue;
            }
        }
        out.push(ch);
    }
    out
}

/// Trim every line, drop blanks and verbatim repeats, and re-join the
/// survivors with blank-line separators.
fn dedup_lines(text: &str) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if seen.insert(line) {
            kept.push(line);
        }
    }
    kept.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unifies_line_endings() {
        assert_eq!(normalize("alpha\r\nbeta\rgamma"), "alpha beta gamma");
    }

    #[test]
    fn dehyphenates_across_line_breaks() {
        assert_eq!(normalize("exam-\nple text"), "example text");
    }

    #[test]
    fn hyphen_before_blank_line_is_kept() {
        // Only a hyphen directly continuing onto the next line is joined.
        assert_eq!(normalize("ends with dash-\n\nnew paragraph"), "ends with dash-\n\nnew paragraph");
    }

    #[test]
    fn joins_intra_paragraph_breaks_and_keeps_paragraphs() {
        let raw = "first line\nsame paragraph\n\nsecond paragraph";
        assert_eq!(normalize(raw), "first line same paragraph\n\nsecond paragraph");
    }

    #[test]
    fn collapses_blank_line_runs() {
        let raw = "one\n\n\n\ntwo";
        assert_eq!(normalize(raw), "one\n\ntwo");
    }

    #[test]
    fn collapses_repeated_whitespace() {
        assert_eq!(normalize("too   many\tspaces"), "too many spaces");
    }

    #[test]
    fn drops_repeated_headers_keeping_first_occurrence() {
        let raw = "Journal of Results\n\nreal content one\n\nJournal of Results\n\nreal content two";
        assert_eq!(
            normalize(raw),
            "Journal of Results\n\nreal content one\n\nreal content two"
        );
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\n\n \n"), "");
    }
}
