#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<`
    TagOpen,
    /// `>`
    TagClose,
    /// `/`
    Slash,
    Name,
    /// `=`
    Equals,
    /// Quoted literal, quotes and escapes kept verbatim.
    StringLiteral,
    /// Unquoted scalar written as `v"..."`; text is the content between the quotes.
    RawScalar,
    /// `{`
    MacroOpen,
    /// `}`
    MacroClose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Byte offset of the token in the source text.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            offset,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unexpected character {ch:?} at byte {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },
}

impl TokenizeError {
    pub fn offset(&self) -> usize {
        match self {
            TokenizeError::UnexpectedChar { offset, .. } => *offset,
            TokenizeError::UnterminatedString { offset } => *offset,
        }
    }
}

/// Split ECSL source text into tokens.
///
/// `:` is skipped like whitespace so that serialized section headers
/// (`label:`) read back as plain names. `v"..."` is the raw-scalar form the
/// renderer writes for unquoted attribute values and comes back as a
/// `RawScalar`.
pub fn tokenize(input: &str) -> Result<Vec<Token>, TokenizeError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];

        if b.is_ascii_whitespace() || b == b':' {
            pos += 1;
            continue;
        }

        let single = match b {
            b'<' => Some(TokenKind::TagOpen),
            b'>' => Some(TokenKind::TagClose),
            b'/' => Some(TokenKind::Slash),
            b'=' => Some(TokenKind::Equals),
            b'{' => Some(TokenKind::MacroOpen),
            b'}' => Some(TokenKind::MacroClose),
            _ => None,
        };
        if let Some(kind) = single {
            tokens.push(Token::new(kind, &input[pos..pos + 1], pos));
            pos += 1;
            continue;
        }

        if b == b'"' || b == b'\'' {
            let end = scan_quoted(bytes, pos, true)?;
            tokens.push(Token::new(TokenKind::StringLiteral, &input[pos..end], pos));
            pos = end;
            continue;
        }

        // Raw scalar marker: `v"42"`
        if b == b'v' && matches!(bytes.get(pos + 1), Some(b'"') | Some(b'\'')) {
            let end = scan_quoted(bytes, pos + 1, false)?;
            tokens.push(Token::new(TokenKind::RawScalar, &input[pos + 2..end - 1], pos));
            pos = end;
            continue;
        }

        let start = pos;
        while let Some(c) = input[pos..].chars().next() {
            if !is_name_char(c) {
                break;
            }
            pos += c.len_utf8();
        }
        if pos == start {
            // Not a name character; report it whole (safe for multi-byte UTF-8)
            let ch = input[pos..].chars().next().unwrap_or('\u{fffd}');
            return Err(TokenizeError::UnexpectedChar { ch, offset: pos });
        }
        tokens.push(Token::new(TokenKind::Name, &input[start..pos], start));
    }

    Ok(tokens)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '+')
}

/// Find the end (exclusive) of a quoted run starting at `start`.
/// Backslash escapes are honoured only when `escapes` is set.
fn scan_quoted(bytes: &[u8], start: usize, escapes: bool) -> Result<usize, TokenizeError> {
    let quote = bytes[start];
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' if escapes => pos += 2,
            b if b == quote => return Ok(pos + 1),
            _ => pos += 1,
        }
    }
    Err(TokenizeError::UnterminatedString { offset: start })
}

/// 1-based (line, column) of a byte offset. Columns count characters.
pub fn location(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
