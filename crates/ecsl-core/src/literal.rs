//! Decoding and encoding of quoted string literals.

use std::iter::Peekable;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("literal is not enclosed in matching quotes")]
    MissingQuotes,
    #[error("unescaped quote inside literal at char {0}")]
    StrayQuote(usize),
    #[error("unescaped line break inside literal at char {0}")]
    UnescapedNewline(usize),
    #[error("literal ends with a dangling backslash")]
    DanglingEscape,
    #[error("truncated \\{escape} escape, expected {digits} hex digits")]
    TruncatedEscape { escape: char, digits: usize },
    #[error("escape value {0:#x} is not a valid character")]
    InvalidCodePoint(u32),
    #[error("escape sequence \\{0} is not supported")]
    UnsupportedEscape(char),
}

/// Decode a quoted literal (`"..."` or `'...'`) into its string value.
///
/// Escapes follow Python string literals: `\\ \' \" \a \b \f \n \r \t \v`,
/// one to three octal digits, `\xHH`, `\uHHHH` and `\UHHHHHHHH`. A backslash
/// before a line break joins the lines. Any other escape is kept as written,
/// backslash included. `\N{...}` is rejected.
pub fn decode(raw: &str) -> Result<String, DecodeError> {
    let quote = match raw.chars().next() {
        Some(q @ ('"' | '\'')) => q,
        _ => return Err(DecodeError::MissingQuotes),
    };
    if raw.len() < 2 || !raw.ends_with(quote) {
        return Err(DecodeError::MissingQuotes);
    }
    let body = &raw[1..raw.len() - 1];

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().enumerate().peekable();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            return Err(DecodeError::StrayQuote(i + 1));
        }
        if c == '\n' {
            return Err(DecodeError::UnescapedNewline(i + 1));
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let (_, esc) = chars.next().ok_or(DecodeError::DanglingEscape)?;
        match esc {
            '\n' => {}
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut value = esc as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&(_, d @ '0'..='7')) => {
                            value = value * 8 + (d as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(code_point(value)?);
            }
            'x' => out.push(hex_escape(&mut chars, 'x', 2)?),
            'u' => out.push(hex_escape(&mut chars, 'u', 4)?),
            'U' => out.push(hex_escape(&mut chars, 'U', 8)?),
            'N' => return Err(DecodeError::UnsupportedEscape('N')),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

/// Read exactly `digits` hex digits following `\<escape>`.
fn hex_escape<I>(chars: &mut Peekable<I>, escape: char, digits: usize) -> Result<char, DecodeError>
where
    I: Iterator<Item = (usize, char)>,
{
    let mut value: u32 = 0;
    for _ in 0..digits {
        let digit = chars
            .peek()
            .and_then(|&(_, c)| c.to_digit(16))
            .ok_or(DecodeError::TruncatedEscape { escape, digits })?;
        chars.next();
        value = value * 16 + digit;
    }
    code_point(value)
}

fn code_point(value: u32) -> Result<char, DecodeError> {
    char::from_u32(value).ok_or(DecodeError::InvalidCodePoint(value))
}

/// Encode a value as a double-quoted literal that `decode` reads back.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            // `\x00` rather than `\0`, which would swallow a following octal digit
            '\0' => out.push_str("\\x00"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain() {
        assert_eq!(decode(r#""hello""#).unwrap(), "hello");
        assert_eq!(decode("'single'").unwrap(), "single");
        assert_eq!(decode(r#""""#).unwrap(), "");
    }

    #[test]
    fn test_decode_escapes() {
        assert_eq!(decode(r#""a\"b\\c\nd""#).unwrap(), "a\"b\\c\nd");
        assert_eq!(decode(r#"'it\'s'"#).unwrap(), "it's");
        assert_eq!(decode(r#""\x41\u00e9\U0001F600""#).unwrap(), "Aé\u{1f600}");
        assert_eq!(decode(r#""caf\u00e9""#).unwrap(), "café");
        assert_eq!(decode(r#""\a\b\f\v""#).unwrap(), "\u{07}\u{08}\u{0c}\u{0b}");
    }

    #[test]
    fn test_octal_escapes() {
        assert_eq!(decode(r#""\a\101\q""#).unwrap(), "\u{07}A\\q");
        assert_eq!(decode(r#""\0""#).unwrap(), "\0");
        assert_eq!(decode(r#""\7""#).unwrap(), "\u{07}");
        // at most three digits; an 8 ends the escape
        assert_eq!(decode(r#""\1011\18""#).unwrap(), "A1\u{01}8");
        assert_eq!(decode(r#""\777""#).unwrap(), "\u{1ff}");
    }

    #[test]
    fn test_unknown_escape_kept_verbatim() {
        assert_eq!(decode(r#""\q\d\8""#).unwrap(), "\\q\\d\\8");
        assert_eq!(decode(r#""\u{e9}""#), Err(DecodeError::TruncatedEscape { escape: 'u', digits: 4 }));
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(decode("\"one \\\ntwo\"").unwrap(), "one two");
        assert_eq!(decode("\"one\ntwo\""), Err(DecodeError::UnescapedNewline(4)));
    }

    #[test]
    fn test_other_quote_needs_no_escape() {
        assert_eq!(decode(r#"'say "hi"'"#).unwrap(), "say \"hi\"");
    }

    #[test]
    fn test_decode_failures() {
        assert_eq!(decode("bare"), Err(DecodeError::MissingQuotes));
        assert_eq!(decode("\""), Err(DecodeError::MissingQuotes));
        assert_eq!(decode(r#""mixed'"#), Err(DecodeError::MissingQuotes));
        assert_eq!(decode(r#""a"b""#), Err(DecodeError::StrayQuote(2)));
        assert_eq!(decode(r#""\N{DASH}""#), Err(DecodeError::UnsupportedEscape('N')));
        assert_eq!(decode(r#""\xZZ""#), Err(DecodeError::TruncatedEscape { escape: 'x', digits: 2 }));
        assert_eq!(decode(r#""\x4""#), Err(DecodeError::TruncatedEscape { escape: 'x', digits: 2 }));
        assert_eq!(decode(r#""\U00110000""#), Err(DecodeError::InvalidCodePoint(0x110000)));
        assert_eq!(decode(r#""\ud800""#), Err(DecodeError::InvalidCodePoint(0xd800)));
    }

    #[test]
    fn test_sign_is_not_a_hex_digit() {
        assert_eq!(decode(r#""\x+1""#), Err(DecodeError::TruncatedEscape { escape: 'x', digits: 2 }));
        assert_eq!(decode(r#""\u+0041""#), Err(DecodeError::TruncatedEscape { escape: 'u', digits: 4 }));
    }

    #[test]
    fn test_encode_is_read_back() {
        let value = "tab\tquote\"slash\\line\n";
        assert_eq!(decode(&encode(value)).unwrap(), value);
        assert_eq!(decode(&encode("\u{0}1")).unwrap(), "\u{0}1");
        assert_eq!(encode("plain"), r#""plain""#);
    }
}
