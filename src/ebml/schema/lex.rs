//! State-machine tokenizer for EDTD source.
//!
//! The lexer splits schema text into four token classes and does not
//! care about grammar: alphanumeric words (which include range glyphs
//! like `0..1` and `>=0.0`), single control characters (with `:=` fused
//! into one token), quoted strings with backslash pass-through, and the
//! terminal `Err`/`Eof` tokens. Whitespace and `//` comments vanish
//! between tokens.
//!
//! The machine state lives in a field and advances on each
//! [`Lexer::next_token`] call until one token can be emitted, so a
//! consumer sees exactly one token per call. After an `Err` or `Eof`
//! token the stream is over and must not be polled again.

use std::io::{BufReader, ErrorKind, Read};

use crate::ebml::types::error::EbmlError;

const INVALID_UTF8: &str = "invalid utf8 character";

/// The lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    AlphaNum,
    Control,
    QuotedString,
    Err,
    Eof,
}

impl TokenKind {
    /// Human-readable class name for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::AlphaNum => "alphanumeric token",
            TokenKind::Control => "control token",
            TokenKind::QuotedString => "quoted string",
            TokenKind::Err => "error",
            TokenKind::Eof => "end of input",
        }
    }
}

/// A single run of characters that could be a valid token of its kind.
/// Quoted strings keep their surrounding quotes and escapes verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub val: String,
}

impl Token {
    /// True when the token has exactly this kind and text.
    pub fn is(&self, kind: TokenKind, val: &str) -> bool {
        self.kind == kind && self.val == val
    }

    /// The error this token stands for, if it is a terminal token. An
    /// `Eof` token means the source ended where the grammar still
    /// expected input.
    pub fn as_error(&self) -> Option<EbmlError> {
        match self.kind {
            TokenKind::Eof => Some(EbmlError::UnexpectedEof("schema source")),
            TokenKind::Err if self.val == INVALID_UTF8 => Some(EbmlError::InvalidUtf8),
            TokenKind::Err => Some(EbmlError::Source(self.val.clone())),
            _ => None,
        }
    }

    fn eof() -> Token {
        Token {
            kind: TokenKind::Eof,
            val: String::new(),
        }
    }

    fn fail(message: String) -> Token {
        Token {
            kind: TokenKind::Err,
            val: message,
        }
    }
}

#[derive(Clone, Copy)]
enum State {
    Whitespace,
    Comment,
    CommentRest,
    Word,
    Colon,
    Quoted,
    Finished,
}

/// Reads through a byte source and emits [`Token`]s from it.
pub struct Lexer<R: Read> {
    src: BufReader<R>,
    pending: Option<char>,
    buf: String,
    state: State,
    // A terminal token to deliver on the next poll, set when a partial
    // token had to be flushed first.
    terminal: Option<Token>,
}

impl<R: Read> Lexer<R> {
    pub fn new(source: R) -> Lexer<R> {
        Lexer {
            src: BufReader::new(source),
            pending: None,
            buf: String::new(),
            state: State::Whitespace,
            terminal: None,
        }
    }

    /// Returns the next available token.
    pub fn next_token(&mut self) -> Token {
        if let Some(tok) = self.terminal.take() {
            self.state = State::Finished;
            return tok;
        }

        loop {
            match self.state {
                State::Whitespace => {
                    let c = match self.read_rune() {
                        Ok(c) => c,
                        Err(stop) => return self.finish(stop),
                    };
                    if c.is_whitespace() {
                        continue;
                    }
                    if c == '/' {
                        self.state = State::Comment;
                        continue;
                    }
                    self.buf.push(c);
                    if c == ':' {
                        self.state = State::Colon;
                    } else if c == '"' {
                        self.state = State::Quoted;
                    } else if is_word_char(c) {
                        self.state = State::Word;
                    } else {
                        return self.emit(TokenKind::Control);
                    }
                }
                State::Comment => match self.peek_rune() {
                    Ok('/') => {
                        self.skip_pending();
                        self.state = State::CommentRest;
                    }
                    Ok(_) => {
                        self.buf.push('/');
                        self.state = State::Whitespace;
                        return self.emit(TokenKind::Control);
                    }
                    Err(stop) => {
                        self.buf.push('/');
                        self.terminal = Some(stop);
                        return self.emit(TokenKind::Control);
                    }
                },
                State::CommentRest => {
                    let c = match self.read_rune() {
                        Ok(c) => c,
                        Err(stop) => return self.finish(stop),
                    };
                    if c == '\n' {
                        self.state = State::Whitespace;
                    }
                }
                State::Word => match self.peek_rune() {
                    Ok(c) if is_word_char(c) => {
                        self.skip_pending();
                        self.buf.push(c);
                    }
                    Ok(_) => {
                        self.state = State::Whitespace;
                        return self.emit(TokenKind::AlphaNum);
                    }
                    Err(stop) => {
                        self.terminal = Some(stop);
                        return self.emit(TokenKind::AlphaNum);
                    }
                },
                State::Colon => match self.peek_rune() {
                    Ok('=') => {
                        self.skip_pending();
                        self.buf.push('=');
                        self.state = State::Whitespace;
                        return self.emit(TokenKind::Control);
                    }
                    Ok(_) => {
                        self.state = State::Whitespace;
                        return self.emit(TokenKind::Control);
                    }
                    Err(stop) => {
                        self.terminal = Some(stop);
                        return self.emit(TokenKind::Control);
                    }
                },
                State::Quoted => {
                    let c = match self.read_rune() {
                        Ok(c) => c,
                        Err(stop) => {
                            self.terminal = Some(stop);
                            return self.emit(TokenKind::QuotedString);
                        }
                    };
                    self.buf.push(c);
                    if c == '\\' {
                        match self.read_rune() {
                            Ok(escaped) => self.buf.push(escaped),
                            Err(stop) => {
                                self.terminal = Some(stop);
                                return self.emit(TokenKind::QuotedString);
                            }
                        }
                    } else if c == '"' {
                        self.state = State::Whitespace;
                        return self.emit(TokenKind::QuotedString);
                    }
                }
                State::Finished => return Token::eof(),
            }
        }
    }

    fn emit(&mut self, kind: TokenKind) -> Token {
        Token {
            kind,
            val: std::mem::take(&mut self.buf),
        }
    }

    fn finish(&mut self, stop: Token) -> Token {
        self.state = State::Finished;
        stop
    }

    // Drops the rune stashed by the last peek.
    fn skip_pending(&mut self) {
        self.pending = None;
    }

    fn peek_rune(&mut self) -> std::result::Result<char, Token> {
        let c = self.read_rune()?;
        self.pending = Some(c);
        Ok(c)
    }

    // Decodes one UTF-8 rune from the source. Errors are reported as
    // the terminal token they should surface as.
    fn read_rune(&mut self) -> std::result::Result<char, Token> {
        if let Some(c) = self.pending.take() {
            return Ok(c);
        }

        let mut first = [0u8; 1];
        if let Err(e) = self.src.read_exact(&mut first) {
            return Err(if e.kind() == ErrorKind::UnexpectedEof {
                Token::eof()
            } else {
                Token::fail(e.to_string())
            });
        }

        let len = match utf8_len(first[0]) {
            Some(len) => len,
            None => return Err(Token::fail(INVALID_UTF8.to_string())),
        };
        let mut seq = [0u8; 4];
        seq[0] = first[0];
        if len > 1 {
            if let Err(e) = self.src.read_exact(&mut seq[1..len]) {
                return Err(if e.kind() == ErrorKind::UnexpectedEof {
                    // A sequence truncated by EOF is not decodable.
                    Token::fail(INVALID_UTF8.to_string())
                } else {
                    Token::fail(e.to_string())
                });
            }
        }

        match std::str::from_utf8(&seq[..len]).ok().and_then(|s| s.chars().next()) {
            Some(c) => Ok(c),
            None => Err(Token::fail(INVALID_UTF8.to_string())),
        }
    }
}

// Words admit letters and digits plus the glyphs that keep a range
// expression or decimal literal in one piece.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '>' | '<' | '=')
}

fn utf8_len(first: u8) -> Option<usize> {
    match first {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}
