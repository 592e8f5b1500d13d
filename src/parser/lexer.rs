use std::fmt;

use tracing::debug;

use crate::error::LexError;

/// Token categories produced by the lexer.
///
/// Protobuf keywords are not a category of their own: `message`, `enum`,
/// `import` and friends are plain identifiers and the grammar recognizes
/// them by lexeme at each decision point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenKind {
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `-`
    Minus,
    /// `+`
    Plus,
    /// `;`
    Semicolon,
    /// `/`
    Slash,
    /// `*`
    Star,
    /// `?`
    QuestionMark,
    /// `:`
    Colon,
    /// `!`
    Bang,
    /// `!=`
    BangEqual,
    /// `=`
    Equal,
    /// `==`
    EqualEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// A quoted string literal.
    String,
    /// A numeric literal.
    Number,
    /// Any name, keywords included.
    Identifier,
    /// One of the 13 scalar type names.
    PrimitiveType,
    /// A `//` or `/* */` comment.
    Comment,
    /// End of input
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::LeftParen => "'('",
            TokenKind::RightParen => "')'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Minus => "'-'",
            TokenKind::Plus => "'+'",
            TokenKind::Semicolon => "';'",
            TokenKind::Slash => "'/'",
            TokenKind::Star => "'*'",
            TokenKind::QuestionMark => "'?'",
            TokenKind::Colon => "':'",
            TokenKind::Bang => "'!'",
            TokenKind::BangEqual => "'!='",
            TokenKind::Equal => "'='",
            TokenKind::EqualEqual => "'=='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::String => "string literal",
            TokenKind::Number => "number",
            TokenKind::Identifier => "identifier",
            TokenKind::PrimitiveType => "primitive type",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// The scalar type names of the protobuf language.
pub const PRIMITIVE_TYPES: [&str; 13] = [
    "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32", "fixed64", "sfixed32",
    "sfixed64", "bool", "string", "bytes",
];

pub fn is_primitive_type(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

/// A decoded numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Number {
    /// Hexadecimal, octal or plain decimal integer.
    Int(u64),
    /// A literal with a fractional part or an exponent.
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

/// The decoded value carried by string, number and comment tokens.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TokenValue {
    /// Inner text of a string literal or comment. Escapes are kept verbatim.
    Str(String),
    Number(Number),
}

/// A line/column pair. Lines are 1-based, columns are 0-based byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// A half-open byte range `[start, end)` with resolved endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub start_pos: Position,
    pub end_pos: Position,
}

impl Span {
    /// The span running from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
            start_pos: self.start_pos,
            end_pos: other.end_pos,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A token with its source location.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source slice.
    pub lexeme: String,
    pub value: Option<TokenValue>,
    pub span: Span,
}

impl Token {
    pub fn line(&self) -> usize {
        self.span.start_pos.line
    }

    pub fn column(&self) -> usize {
        self.span.start_pos.column
    }

    /// True if this is an identifier spelled exactly `keyword`.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Identifier && self.lexeme == keyword
    }

    /// Identifiers and primitive type words can both stand as names.
    pub fn is_name(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::PrimitiveType)
    }

    pub fn str_value(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn number_value(&self) -> Option<Number> {
        match self.value {
            Some(TokenValue::Number(n)) => Some(n),
            _ => None,
        }
    }
}

/// Byte offsets where each source line begins.
///
/// Built once per scan; offsets resolve to positions by binary search.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        Position {
            line,
            column: offset - line_start,
        }
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        Span {
            start,
            end,
            start_pos: self.position(start),
            end_pos: self.position(end),
        }
    }
}

/// Tokenizer for protobuf schema text.
pub struct Lexer<'a> {
    source: &'a str,
    input: &'a [u8],
    start: usize,
    pos: usize,
    lines: LineIndex,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source,
            input: source.as_bytes(),
            start: 0,
            pos: 0,
            lines: LineIndex::new(source),
            tokens: Vec::new(),
        }
    }

    /// Scan the whole input, ending with an `Eof` token spanning `[len, len)`.
    pub fn scan_tokens(mut self) -> Result<Vec<Token>, LexError> {
        while !self.is_at_end() {
            self.start = self.pos;
            self.scan_token()?;
        }

        let len = self.input.len();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            value: None,
            span: self.lines.span(len, len),
        });

        debug!(
            tokens = self.tokens.len(),
            lines = self.lines.line_count(),
            "scanned source"
        );
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        let Some(b) = self.advance() else {
            return Ok(());
        };

        match b {
            b'(' => self.add_token(TokenKind::LeftParen, None),
            b')' => self.add_token(TokenKind::RightParen, None),
            b'{' => self.add_token(TokenKind::LeftBrace, None),
            b'}' => self.add_token(TokenKind::RightBrace, None),
            b'[' => self.add_token(TokenKind::LeftBracket, None),
            b']' => self.add_token(TokenKind::RightBracket, None),
            b',' => self.add_token(TokenKind::Comma, None),
            b'.' => self.add_token(TokenKind::Dot, None),
            b'-' => self.add_token(TokenKind::Minus, None),
            b'+' => self.add_token(TokenKind::Plus, None),
            b';' => self.add_token(TokenKind::Semicolon, None),
            b'*' => self.add_token(TokenKind::Star, None),
            b'?' => self.add_token(TokenKind::QuestionMark, None),
            b':' => self.add_token(TokenKind::Colon, None),
            b'!' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind, None);
            }
            b'=' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind, None);
            }
            b'<' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind, None);
            }
            b'>' => {
                let kind = if self.match_byte(b'=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind, None);
            }
            b'/' => {
                if self.match_byte(b'/') {
                    self.line_comment();
                } else if self.match_byte(b'*') {
                    self.block_comment()?;
                } else {
                    self.add_token(TokenKind::Slash, None);
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' => {}
            b'"' | b'\'' => self.string(b)?,
            b if b.is_ascii_digit() => self.number()?,
            b if b.is_ascii_alphabetic() || b == b'_' => self.identifier(),
            _ => {
                let ch = self.source[self.start..].chars().next().unwrap_or('\u{fffd}');
                let at = self.lines.position(self.start);
                return Err(LexError::UnexpectedCharacter {
                    ch,
                    line: at.line,
                    column: at.column,
                });
            }
        }
        Ok(())
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek_byte()?;
        self.pos += 1;
        Some(b)
    }

    fn match_byte(&mut self, expected: u8) -> bool {
        if self.peek_byte() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, kind: TokenKind, value: Option<TokenValue>) {
        self.tokens.push(Token {
            kind,
            lexeme: self.source[self.start..self.pos].to_string(),
            value,
            span: self.lines.span(self.start, self.pos),
        });
    }

    fn line_comment(&mut self) {
        while let Some(b) = self.peek_byte() {
            if b == b'\n' {
                break;
            }
            self.pos += 1;
        }
        let text = self.source[self.start + 2..self.pos].to_string();
        self.add_token(TokenKind::Comment, Some(TokenValue::Str(text)));
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek_byte() {
                None => {
                    let at = self.lines.position(self.start);
                    return Err(LexError::UnterminatedComment {
                        line: at.line,
                        column: at.column,
                    });
                }
                Some(b'*') if self.peek_byte_at(1) == Some(b'/') => {
                    self.pos += 2;
                    break;
                }
                Some(_) => self.pos += 1,
            }
        }
        let text = self.source[self.start + 2..self.pos - 2].to_string();
        self.add_token(TokenKind::Comment, Some(TokenValue::Str(text)));
        Ok(())
    }

    fn string(&mut self, quote: u8) -> Result<(), LexError> {
        loop {
            match self.peek_byte() {
                None | Some(b'\n') => {
                    let at = self.lines.position(self.start);
                    return Err(LexError::UnterminatedString {
                        line: at.line,
                        column: at.column,
                    });
                }
                Some(b) if b == quote => break,
                Some(b'\\') => {
                    self.pos += 1;
                    if matches!(self.peek_byte(), Some(b) if b != b'\n') {
                        self.pos += 1;
                    }
                }
                Some(_) => self.pos += 1,
            }
        }

        // The closing quote.
        self.pos += 1;

        let text = self.source[self.start + 1..self.pos - 1].to_string();
        self.add_token(TokenKind::String, Some(TokenValue::Str(text)));
        Ok(())
    }

    fn eat_while(&mut self, pred: impl Fn(u8) -> bool) -> usize {
        let from = self.pos;
        while matches!(self.peek_byte(), Some(b) if pred(b)) {
            self.pos += 1;
        }
        self.pos - from
    }

    /// Number literals, tried in order: hexadecimal, octal, then decimal
    /// with optional fraction and exponent.
    fn number(&mut self) -> Result<(), LexError> {
        let source = self.source;
        let first = self.input[self.start];

        if first == b'0'
            && matches!(self.peek_byte(), Some(b'x') | Some(b'X'))
            && matches!(self.peek_byte_at(1), Some(b) if b.is_ascii_hexdigit())
        {
            self.pos += 1;
            self.eat_while(|b| b.is_ascii_hexdigit());
            let digits = &source[self.start + 2..self.pos];
            let value = u64::from_str_radix(digits, 16).map_err(|_| self.out_of_range())?;
            self.add_token(TokenKind::Number, Some(TokenValue::Number(Number::Int(value))));
            return Ok(());
        }

        if first == b'0' {
            let octal_len = self.eat_while(|b| (b'0'..=b'7').contains(&b));
            let continues = matches!(
                self.peek_byte(),
                Some(b'.') | Some(b'e') | Some(b'E') | Some(b'8') | Some(b'9')
            );
            if octal_len > 0 && !continues {
                let digits = &source[self.start + 1..self.pos];
                let value = u64::from_str_radix(digits, 8).map_err(|_| self.out_of_range())?;
                self.add_token(TokenKind::Number, Some(TokenValue::Number(Number::Int(value))));
                return Ok(());
            }
            self.pos = self.start + 1;
        }

        self.eat_while(|b| b.is_ascii_digit());
        let int_end = self.pos;

        let mut fraction = None;
        if self.peek_byte() == Some(b'.') {
            self.pos += 1;
            let frac_start = self.pos;
            self.eat_while(|b| b.is_ascii_digit());
            fraction = Some(&source[frac_start..self.pos]);
        }

        let mut exponent = None;
        if matches!(self.peek_byte(), Some(b'e') | Some(b'E')) {
            let sign_len = usize::from(matches!(self.peek_byte_at(1), Some(b'+') | Some(b'-')));
            if matches!(self.peek_byte_at(1 + sign_len), Some(b) if b.is_ascii_digit()) {
                self.pos += 1;
                let exp_start = self.pos;
                self.pos += sign_len;
                self.eat_while(|b| b.is_ascii_digit());
                exponent = Some(&source[exp_start..self.pos]);
            }
        }

        let integer = &source[self.start..int_end];
        let value = if fraction.is_none() && exponent.is_none() {
            Number::Int(integer.parse().map_err(|_| self.out_of_range())?)
        } else {
            let normalized = format!(
                "{}.{}e{}",
                integer,
                fraction.filter(|f| !f.is_empty()).unwrap_or("0"),
                exponent.unwrap_or("0")
            );
            Number::Float(normalized.parse().map_err(|_| self.out_of_range())?)
        };
        self.add_token(TokenKind::Number, Some(TokenValue::Number(value)));
        Ok(())
    }

    fn out_of_range(&self) -> LexError {
        let at = self.lines.position(self.start);
        LexError::NumberOutOfRange {
            lexeme: self.source[self.start..self.pos].to_string(),
            line: at.line,
            column: at.column,
        }
    }

    fn identifier(&mut self) {
        self.eat_while(|b| b.is_ascii_alphanumeric() || b == b'_');
        let kind = if is_primitive_type(&self.source[self.start..self.pos]) {
            TokenKind::PrimitiveType
        } else {
            TokenKind::Identifier
        };
        self.add_token(kind, None);
    }
}

/// Scan `source` into a complete token buffer.
pub fn scan_tokens(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).scan_tokens()
}
