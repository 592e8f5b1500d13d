use crate::parser::lexer::TokenKind;

/// Errors from the lexer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("lexical error at line {line}:{column}: unterminated string")]
    UnterminatedString { line: usize, column: usize },

    #[error("lexical error at line {line}:{column}: unterminated block comment")]
    UnterminatedComment { line: usize, column: usize },

    #[error("lexical error at line {line}:{column}: unexpected character '{ch}'")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },

    #[error("lexical error at line {line}:{column}: number '{lexeme}' is out of range")]
    NumberOutOfRange {
        lexeme: String,
        line: usize,
        column: usize,
    },
}

impl LexError {
    /// The 1-based source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            LexError::UnterminatedString { line, .. }
            | LexError::UnterminatedComment { line, .. }
            | LexError::UnexpectedCharacter { line, .. }
            | LexError::NumberOutOfRange { line, .. } => *line,
        }
    }
}

/// Errors from the grammar layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("syntax error at line {line}:{column}: expected {expected}, found {found} '{lexeme}'")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        lexeme: String,
        line: usize,
        column: usize,
    },

    #[error("syntax error at line {line}: unknown syntax '{value}', expected \"proto2\" or \"proto3\"")]
    UnknownSyntax { value: String, line: usize },

    #[error("syntax error at line {line}: negative field number {number}")]
    NegativeFieldNumber { number: i64, line: usize },

    #[error("syntax error at line {line}: integer '{lexeme}' is out of range")]
    IntegerOutOfRange { lexeme: String, line: usize },

    #[error("syntax error at line {line}: nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize, line: usize },
}

impl ParseError {
    /// The 1-based source line the error points at.
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnknownSyntax { line, .. }
            | ParseError::NegativeFieldNumber { line, .. }
            | ParseError::IntegerOutOfRange { line, .. }
            | ParseError::NestingTooDeep { line, .. } => *line,
        }
    }
}

/// Top-level error type that wraps all sub-errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtoError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ProtoError {
    pub fn line(&self) -> usize {
        match self {
            ProtoError::Lex(e) => e.line(),
            ProtoError::Parse(e) => e.line(),
        }
    }
}

/// Result type alias for protoparse operations.
pub type Result<T> = std::result::Result<T, ProtoError>;
