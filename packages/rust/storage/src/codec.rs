//! Comma-separated value codec.
//!
//! Standard quoting: a field containing a comma, quote, CR or LF is wrapped in
//! double quotes and embedded quotes are doubled. Two framings are supported:
//! - [`Framing::Line`]: every physical line is one row; an unterminated quote
//!   is closed at the end of the line.
//! - [`Framing::Record`]: a row may span several physical lines while a quote
//!   is open (article bodies contain newlines).

use std::borrow::Cow;

/// Field delimiter.
const DELIMITER: char = ',';

/// Row terminator used when writing.
pub(crate) const LINE_END: &str = "\n";

/// How rows are delimited when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Line,
    Record,
}

/// Parse CSV text into rows of unescaped fields. Blank lines are skipped.
pub(crate) fn parse(content: &str, framing: Framing) -> Vec<Vec<String>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\r' | '\n' if framing == Framing::Line => {
                    in_quotes = false;
                    if c == '\r' && chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    finish_row(&mut rows, &mut row, &mut field);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            DELIMITER => row.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_row(&mut rows, &mut row, &mut field);
            }
            '\n' => finish_row(&mut rows, &mut row, &mut field),
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() || in_quotes {
        finish_row(&mut rows, &mut row, &mut field);
    }

    rows
}

fn finish_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut String) {
    row.push(std::mem::take(field));
    let fields = std::mem::take(row);
    if fields.len() == 1 && fields[0].is_empty() {
        return;
    }
    rows.push(fields);
}

/// Quote a field if it contains a delimiter, quote, or line break.
pub(crate) fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([DELIMITER, '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Encode one row, including the trailing line terminator.
pub(crate) fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str(LINE_END);
    line
}
