//! Whole-file scans for spellings and whitespace we don't want.

use std::sync::OnceLock;

use regex::RegexSet;

use crate::language::*;
use crate::problem::{Location, Problems};

/// Each pattern marks the offending text with its first capture group.
const MATCHERS: &[(&str, &str)] = &[
    (
        r"(\*this\* object)",
        "prefer \"*this* value\"",
    ),
    (
        r"\b([12]'s complement)",
        "prefer \"one's complement\" or \"two's complement\"",
    ),
    (
        r"\b([Bb]ehaviour)",
        "\"behavior\" is the preferred spelling",
    ),
    (
        r"(the empty string)",
        "prefer \"the empty String\"",
    ),
    (
        r"\b(IIF)\b",
        "prefer \"iff\"",
    ),
    (
        r"(?m)([ \t]+)\r?$",
        "trailing whitespace",
    ),
    (
        r"(?:^|[^\n])\n\n(\n+)",
        "no more than one blank line is allowed",
    ),
    (
        r"(\r)",
        "only Unix-style (LF) linebreaks are allowed",
    ),
    (
        r"\b[Ss]teps? (\d)",
        "prefer using labeled steps and <emu-xref> tags over hardcoding step numbers",
    ),
    (
        r"\b[Cc]lauses? (\d)",
        "clauses should be referenced using <emu-xref> tags rather than hardcoding clause numbers",
    ),
];

fn composed() -> &'static RegexSet {
    static SET: OnceLock<RegexSet> = OnceLock::new();
    SET.get_or_init(|| {
        RegexSet::new(
            MATCHERS
                .iter()
                .map(|(pattern, _)| *pattern),
        )
        .unwrap_or_else(|e| panic!("{}", e))
    })
}

fn matchers() -> &'static [::regex::Regex] {
    static EACH: OnceLock<Vec<::regex::Regex>> = OnceLock::new();
    EACH.get_or_init(|| {
        MATCHERS
            .iter()
            .map(|(pattern, _)| ::regex::Regex::new(pattern).unwrap_or_else(|e| panic!("{}", e)))
            .collect()
    })
}

/// Scan every source of the document, including imported ones.
pub(crate) fn check(document: &Document, problems: &mut Problems) {
    for (id, source) in document.sources() {
        check_source(document, id, &source.text, problems);
    }
}

fn check_source(document: &Document, source: SourceId, text: &str, problems: &mut Problems) {
    let hits = composed().matches(text);
    if !hits.matched_any() {
        return;
    }

    for i in hits.iter() {
        let message = MATCHERS[i].1;
        for cap in matchers()[i].captures_iter(text) {
            let m = match cap.get(1) {
                Some(m) => m,
                None => continue,
            };
            let (line, column) = document.line_column(source, m.start());
            problems.report(
                "spelling",
                message,
                Location::Raw {
                    source,
                    line,
                    column,
                },
            );
        }
    }
}
