use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ast::Token;

/// Location of a character in the query source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Character offset from the start of the query
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {position}")]
pub struct LexError {
    pub message: String,
    pub position: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    token_start: Position,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            token_start: Position {
                offset: 0,
                line: 1,
                column: 1,
            },
        }
    }

    /// Start of the token most recently returned by [`Lexer::next_token`].
    pub fn token_start(&self) -> Position {
        self.token_start
    }

    fn here(&self) -> Position {
        Position {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            position: self.here(),
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        if self.current_char() == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '#' {
                // comment runs to end of line
                while self.current_char().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else if ch == ':'
                && self.peek_char(1) == Some(':')
                && self.peek_char(2).is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            {
                result.push_str("::");
                self.advance();
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_hex_escape(&mut self) -> Result<char, LexError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid \\u escape: expected 4 hex digits"))?;
            code = code * 16 + digit;
            self.advance();
        }
        char::from_u32(code).ok_or_else(|| self.error(format!("Invalid code point U+{:04X}", code)))
    }

    fn read_string(&mut self) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance(); // opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('b') => result.push('\u{8}'),
                        Some('f') => result.push('\u{c}'),
                        Some('"') => result.push('"'),
                        Some('\\') => result.push('\\'),
                        Some('/') => result.push('/'),
                        Some('u') => {
                            self.advance();
                            result.push(self.read_hex_escape()?);
                            continue;
                        }
                        Some('(') => return Err(self.error("String interpolation is not supported")),
                        Some(ch) => return Err(self.error(format!("Invalid escape sequence: \\{}", ch))),
                        None => return Err(self.error("Unterminated string: unexpected EOF after backslash")),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("Unterminated string: missing closing quote"))
    }

    fn read_number(&mut self) -> Result<Token, LexError> {
        let mut number = String::new();
        let mut is_fraction = false;
        let mut is_scientific = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_fraction
                && !is_scientific
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_fraction = true;
                number.push(ch);
                self.advance();
            } else if (ch == 'e' || ch == 'E') && !is_scientific {
                let sign = self.peek_char(1).is_some_and(|c| c == '+' || c == '-');
                let digit_at = if sign { 2 } else { 1 };
                if !self.peek_char(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                    break;
                }
                is_scientific = true;
                number.push('e');
                self.advance();
                if sign {
                    number.extend(self.current_char());
                    self.advance();
                }
            } else {
                break;
            }
        }

        let parsed = if is_scientific {
            Decimal::from_scientific(&number)
        } else {
            Decimal::from_str(&number)
        };
        parsed
            .map(Token::Number)
            .map_err(|e| self.error(format!("Invalid number '{}': {}", number, e)))
    }

    /// Consume `second` if it follows, returning `long`; otherwise `short`.
    fn pick(&mut self, second: char, long: Token, short: Token) -> Token {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            long
        } else {
            short
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.here();

        let token = match self.current_char() {
            None => Token::Eof,
            Some('.') => {
                self.advance();
                match self.current_char() {
                    Some('.') => {
                        self.advance();
                        Token::DotDot
                    }
                    Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                        Token::Field(self.read_identifier())
                    }
                    _ => Token::Dot,
                }
            }
            Some('$') => {
                self.advance();
                if self
                    .current_char()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                {
                    Token::Variable(self.read_identifier())
                } else {
                    return Err(self.error("Expected variable name after '$'"));
                }
            }
            Some('@') => {
                self.advance();
                if self
                    .current_char()
                    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                {
                    Token::Format(self.read_identifier())
                } else {
                    return Err(self.error("Expected format name after '@'"));
                }
            }
            Some('|') => self.pick('=', Token::UpdateAssign, Token::Pipe),
            Some('/') => {
                self.advance();
                match self.current_char() {
                    Some('/') => self.pick('=', Token::AltAssign, Token::Alt),
                    Some('=') => {
                        self.advance();
                        Token::SlashAssign
                    }
                    _ => Token::Slash,
                }
            }
            Some('=') => self.pick('=', Token::EqEq, Token::Assign),
            Some('!') => {
                if self.peek_char(1) == Some('=') {
                    self.advance();
                    self.advance();
                    Token::NotEq
                } else {
                    return Err(self.error("Unexpected '!' (did you mean '!=' or 'not'?)"));
                }
            }
            Some('<') => self.pick('=', Token::LtEq, Token::Lt),
            Some('>') => self.pick('=', Token::GtEq, Token::Gt),
            Some('+') => self.pick('=', Token::PlusAssign, Token::Plus),
            Some('-') => self.pick('=', Token::MinusAssign, Token::Minus),
            Some('*') => self.pick('=', Token::StarAssign, Token::Star),
            Some('%') => self.pick('=', Token::PercentAssign, Token::Percent),
            Some(ch) => {
                let single = match ch {
                    ',' => Some(Token::Comma),
                    ':' => Some(Token::Colon),
                    ';' => Some(Token::Semicolon),
                    '?' => Some(Token::Question),
                    '(' => Some(Token::LParen),
                    ')' => Some(Token::RParen),
                    '[' => Some(Token::LBracket),
                    ']' => Some(Token::RBracket),
                    '{' => Some(Token::LBrace),
                    '}' => Some(Token::RBrace),
                    _ => None,
                };
                if let Some(token) = single {
                    self.advance();
                    token
                } else if ch == '"' {
                    Token::String(self.read_string()?)
                } else if ch.is_ascii_alphabetic() || ch == '_' {
                    let ident = self.read_identifier();
                    Token::keyword(&ident).unwrap_or(Token::Identifier(ident))
                } else if ch.is_ascii_digit() {
                    self.read_number()?
                } else {
                    return Err(self.error(format!("Unexpected character '{}'", ch)));
                }
            }
        };
        Ok(token)
    }
}

#[test]
fn test_keywords() {
    let mut lexer = Lexer::new("and or true false null reduce");
    assert_eq!(lexer.next_token(), Ok(Token::And));
    assert_eq!(lexer.next_token(), Ok(Token::Or));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(true)));
    assert_eq!(lexer.next_token(), Ok(Token::Boolean(false)));
    assert_eq!(lexer.next_token(), Ok(Token::Null));
    assert_eq!(lexer.next_token(), Ok(Token::Reduce));
}

#[test]
fn test_pipe() {
    let mut lexer = Lexer::new(".items | .[2:5] |= length");
    assert_eq!(lexer.next_token(), Ok(Token::Field("items".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Pipe));
    assert_eq!(lexer.next_token(), Ok(Token::Dot));
    assert_eq!(lexer.next_token(), Ok(Token::LBracket));
    assert_eq!(lexer.next_token(), Ok(Token::Number(Decimal::from(2))));
    assert_eq!(lexer.next_token(), Ok(Token::Colon));
    assert_eq!(lexer.next_token(), Ok(Token::Number(Decimal::from(5))));
    assert_eq!(lexer.next_token(), Ok(Token::RBracket));
    assert_eq!(lexer.next_token(), Ok(Token::UpdateAssign));
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("length".to_string())));
    assert_eq!(lexer.next_token(), Ok(Token::Eof));
}

#[test]
fn test_alternative_family() {
    let mut lexer = Lexer::new("// //= /= /");
    assert_eq!(lexer.next_token(), Ok(Token::Alt));
    assert_eq!(lexer.next_token(), Ok(Token::AltAssign));
    assert_eq!(lexer.next_token(), Ok(Token::SlashAssign));
    assert_eq!(lexer.next_token(), Ok(Token::Slash));
}

#[test]
fn test_interpolation_rejected() {
    let mut lexer = Lexer::new("\"a\\(.b)\"");
    let err = lexer.next_token().unwrap_err();
    assert!(err.message.contains("interpolation"));
    assert_eq!(err.position.line, 1);
}

#[test]
fn test_comment_and_position() {
    let mut lexer = Lexer::new("# header\n  length");
    assert_eq!(lexer.next_token(), Ok(Token::Identifier("length".to_string())));
    assert_eq!(lexer.token_start().line, 2);
    assert_eq!(lexer.token_start().column, 3);
}
