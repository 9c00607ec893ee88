// Copyright (C) 2026 the toad-db authors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.

//! C4: the lexical primitives the parser is built from — whitespace skipping,
//! statement/identifier slicing, and the `ariadne`-backed diagnostic renderer shared
//! by every [`crate::error::ParseError`] (grounded in the teacher's
//! `moor-compiler/src/diagnostics.rs`).
//!
//! Every slicing function is pure: it takes a `&str` and returns `(consumed, rest)`
//! rather than mutating a cursor in place, so the parser can track source offsets
//! itself by comparing slice lengths.

use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

/// Skip leading space, tab, CR, and LF characters.
pub fn trim_left(s: &str) -> &str {
    s.trim_start_matches([' ', '\t', '\r', '\n'])
}

/// Split `s` at the first occurrence of `sep`, returning `(prefix_including_sep, rest)`.
/// If `sep` does not occur, the whole of `s` is the prefix and `rest` is empty.
pub fn read_until(s: &str, sep: char) -> (&str, &str) {
    match s.find(sep) {
        Some(idx) => (&s[..idx + sep.len_utf8()], &s[idx + sep.len_utf8()..]),
        None => (s, ""),
    }
}

/// A single `;`-terminated statement: `read_until(trim_left(s), ';')`.
pub fn read_stmt(s: &str) -> (&str, &str) {
    read_until(trim_left(s), ';')
}

/// Whether `c` may appear in an identifier. The grammar does not require the first
/// character to be non-numeric (`SPEC_FULL.md` §9 Open Questions) — `read_name` is
/// deliberately permissive to match.
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Trim left, then consume a maximal run of [`is_name_char`]. Returns `("", rest)`
/// unchanged if no such character is present at the front.
pub fn read_name(s: &str) -> (&str, &str) {
    let trimmed = trim_left(s);
    let end = trimmed
        .find(|c: char| !is_name_char(c))
        .unwrap_or(trimmed.len());
    (&trimmed[..end], &trimmed[end..])
}

/// Whether `c` is one of the three table-field rule markers.
pub fn is_rule_type(c: char) -> bool {
    matches!(c, '?' | '@' | '!')
}

/// Render a multi-line, caret-underlined diagnostic pointing at `span` within
/// `source`, with `message` as both the headline and the label text. Plain text: no
/// ANSI color, since this crate has no terminal surface of its own to assume one.
pub fn error_help(source: &str, span: Range<usize>, message: &str) -> String {
    let offset = span.start.min(source.len());
    let mut buf = Vec::new();
    let report = Report::build(ReportKind::Error, (), offset)
        .with_config(Config::default().with_color(false))
        .with_message(message)
        .with_label(Label::new(span).with_message(message))
        .finish();
    let _ = report.write(Source::from(source), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
