//! Escape sequences of char and string literals.
//!
//! The emitter re-escapes `\n`, `\t`, `\r`, `\\` and the enclosing quote;
//! the parser additionally accepts the other quote escaped.

use std::fmt::{self, Write};

/// Write `c` as the body of a char literal, without the quotes.
pub fn write_escaped_char(f: &mut impl Write, c: char) -> fmt::Result {
    match c {
        '\'' => f.write_str("\\'"),
        other => write_common(f, other),
    }
}

/// Write `s` as the body of a string literal, without the quotes.
pub fn write_escaped_str(f: &mut impl Write, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            other => write_common(f, other)?,
        }
    }
    Ok(())
}

fn write_common(f: &mut impl Write, c: char) -> fmt::Result {
    match c {
        '\\' => f.write_str("\\\\"),
        '\n' => f.write_str("\\n"),
        '\t' => f.write_str("\\t"),
        '\r' => f.write_str("\\r"),
        other => f.write_char(other),
    }
}

/// Decode a char literal token, quotes included.
///
/// Returns `None` for an unknown escape or a literal that does not hold
/// exactly one character.
pub fn unescape_char(token: &str) -> Option<char> {
    let body = token.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = unescape(body)?.into_iter();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Decode a string literal token, quotes included.
pub fn unescape_str(token: &str) -> Option<String> {
    let body = token.strip_prefix('"')?.strip_suffix('"')?;
    Some(unescape(body)?.into_iter().collect())
}

fn unescape(body: &str) -> Option<Vec<char>> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

#[cfg(test)]
mod test {
    use super::*;

    fn escaped_char(c: char) -> String {
        let mut s = String::new();
        write_escaped_char(&mut s, c).unwrap();
        s
    }

    fn escaped_str(v: &str) -> String {
        let mut s = String::new();
        write_escaped_str(&mut s, v).unwrap();
        s
    }

    #[test]
    fn escapes_char_quote_only() {
        assert_eq!(escaped_char('\''), "\\'");
        assert_eq!(escaped_char('"'), "\"");
        assert_eq!(escaped_char('\n'), "\\n");
        assert_eq!(escaped_char('\\'), "\\\\");
        assert_eq!(escaped_char('a'), "a");
    }

    #[test]
    fn escapes_string_quote_only() {
        assert_eq!(escaped_str("it's \"x\"\t\r\n\\"), "it's \\\"x\\\"\\t\\r\\n\\\\");
    }

    #[test]
    fn unescapes_literals() {
        assert_eq!(unescape_char("'a'"), Some('a'));
        assert_eq!(unescape_char("'\\n'"), Some('\n'));
        assert_eq!(unescape_char("'\\''"), Some('\''));
        assert_eq!(unescape_char("'\\\\'"), Some('\\'));
        assert_eq!(unescape_str("\"a\\tb\\\"\""), Some("a\tb\"".to_string()));
    }

    #[test]
    fn rejects_unknown_escapes() {
        assert_eq!(unescape_char("'\\q'"), None);
        assert_eq!(unescape_str("\"\\x41\""), None);
        assert_eq!(unescape_char("'ab'"), None);
    }
}
