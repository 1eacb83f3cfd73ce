use std::mem;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    ast::{Control, FuncCall, Index, ObjectEntry, ObjectKey, Operator, Query, Suffix, Term, TermKind, Token},
    lexer::{LexError, Lexer, Position},
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("{message} at {position}")]
    Syntax { message: String, position: Position },
}

pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_position: Position,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        let current_position = lexer.token_start();
        Ok(Parser {
            lexer,
            current_token,
            current_position,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        self.current_position = self.lexer.token_start();
        Ok(())
    }

    fn error<T>(&self, message: impl Into<String>) -> Result<T, ParseError> {
        Err(ParseError::Syntax {
            message: message.into(),
            position: self.current_position,
        })
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return self.error(format!("Expected {:?}, got {:?}", expected, self.current_token));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn expect_variable(&mut self) -> Result<String, ParseError> {
        match &self.current_token {
            Token::Variable(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            other => self.error(format!("Expected variable, got {:?}", other)),
        }
    }

    /// Parse a complete query and require end of input.
    pub fn parse(&mut self) -> Result<Query, ParseError> {
        let query = self.parse_pipe()?;
        self.expect(Token::Eof)?;
        Ok(query)
    }

    /// Pipe level: `a | b`, `term as $x | body`, `label $name | body`
    pub fn parse_pipe(&mut self) -> Result<Query, ParseError> {
        if self.check(&Token::Def) {
            return self.error("Function definitions are not supported");
        }

        if self.check(&Token::Label) {
            self.advance()?;
            let name = self.expect_variable()?;
            self.expect(Token::Pipe)?;
            let body = self.parse_pipe()?;
            return Ok(Query::term(TermKind::Control(Control::Label {
                name,
                body: Box::new(body),
            })));
        }

        let left = self.parse_comma()?;

        if self.check(&Token::As) {
            let Query::Term(source) = left else {
                return self.error("Only a single term can be bound with 'as'");
            };
            self.advance()?;
            let variable = self.expect_variable()?;
            self.expect(Token::Pipe)?;
            let body = self.parse_pipe()?;
            return Ok(Query::term(TermKind::Control(Control::Bind {
                source: Box::new(source),
                variable,
                body: Box::new(body),
            })));
        }

        if self.check(&Token::Pipe) {
            self.advance()?;
            let right = self.parse_pipe()?;
            return Ok(Query::binary(Operator::Pipe, left, right));
        }

        Ok(left)
    }

    fn parse_comma(&mut self) -> Result<Query, ParseError> {
        let mut left = self.parse_alternative()?;

        while self.check(&Token::Comma) {
            self.advance()?;
            let right = self.parse_alternative()?;
            left = Query::binary(Operator::Comma, left, right);
        }
        Ok(left)
    }

    fn parse_alternative(&mut self) -> Result<Query, ParseError> {
        let left = self.parse_assignment()?;

        if self.check(&Token::Alt) {
            self.advance()?;
            let right = self.parse_alternative()?; // right associative
            return Ok(Query::binary(Operator::Alternative, left, right));
        }
        Ok(left)
    }

    fn parse_assignment(&mut self) -> Result<Query, ParseError> {
        let left = self.parse_or()?;

        let op = match &self.current_token {
            Token::Assign => Operator::Assign,
            Token::UpdateAssign => Operator::Update,
            Token::PlusAssign => Operator::AddAssign,
            Token::MinusAssign => Operator::SubAssign,
            Token::StarAssign => Operator::MulAssign,
            Token::SlashAssign => Operator::DivAssign,
            Token::PercentAssign => Operator::ModAssign,
            Token::AltAssign => Operator::AltAssign,
            _ => return Ok(left),
        };

        self.advance()?;
        let right = self.parse_or()?;
        Ok(Query::binary(op, left, right))
    }

    fn parse_or(&mut self) -> Result<Query, ParseError> {
        let mut left = self.parse_and()?;

        while self.check(&Token::Or) {
            self.advance()?;
            let right = self.parse_and()?;
            left = Query::binary(Operator::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Query, ParseError> {
        let mut left = self.parse_comparison()?;

        while self.check(&Token::And) {
            self.advance()?;
            let right = self.parse_comparison()?;
            left = Query::binary(Operator::And, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Query, ParseError> {
        let left = self.parse_additive()?;

        let op = match &self.current_token {
            Token::EqEq => Operator::Eq,
            Token::NotEq => Operator::Ne,
            Token::Lt => Operator::Lt,
            Token::Gt => Operator::Gt,
            Token::LtEq => Operator::Le,
            Token::GtEq => Operator::Ge,
            _ => return Ok(left),
        };

        self.advance()?;
        let right = self.parse_additive()?;
        Ok(Query::binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Query, ParseError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => Operator::Add,
                Token::Minus => Operator::Sub,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = Query::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Query, ParseError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Star => Operator::Mul,
                Token::Slash => Operator::Div,
                Token::Percent => Operator::Mod,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;
            left = Query::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Query, ParseError> {
        if !self.check(&Token::Minus) {
            return Ok(Query::Term(self.parse_postfix()?));
        }

        self.advance()?;
        let operand = self.parse_postfix()?;
        match operand {
            // Negative literals stay literals
            Term {
                kind: TermKind::Number(n),
                suffixes,
            } if suffixes.is_empty() => Ok(Query::term(TermKind::Number(-n))),
            // Represent as 0 - operand
            operand => Ok(Query::binary(
                Operator::Sub,
                Query::term(TermKind::Number(Decimal::ZERO)),
                Query::Term(operand),
            )),
        }
    }

    fn parse_postfix(&mut self) -> Result<Term, ParseError> {
        let mut term = self.parse_primary()?;

        loop {
            match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Field(name) => {
                    self.advance()?;
                    term.suffixes.push(Suffix::Index(Index::Name(name)));
                }
                Token::Dot => {
                    self.advance()?;
                    // ."name" or .[...] after a term
                    match mem::replace(&mut self.current_token, Token::Eof) {
                        Token::String(name) => {
                            self.advance()?;
                            term.suffixes.push(Suffix::Index(Index::Name(name)));
                        }
                        Token::LBracket => {
                            self.current_token = Token::LBracket;
                            let suffix = self.parse_bracket_suffix()?;
                            term.suffixes.push(suffix);
                        }
                        token => {
                            self.current_token = token;
                            return self.error("Expected field name or '[' after '.'");
                        }
                    }
                }
                Token::LBracket => {
                    self.current_token = Token::LBracket;
                    let suffix = self.parse_bracket_suffix()?;
                    term.suffixes.push(suffix);
                }
                Token::Question => {
                    self.advance()?;
                    term.suffixes.push(Suffix::Optional);
                }
                token => {
                    self.current_token = token;
                    break;
                }
            }
        }
        Ok(term)
    }

    /// `[]`, `[q]`, `[s:e]`, `[:e]`, `[s:]`
    fn parse_bracket_suffix(&mut self) -> Result<Suffix, ParseError> {
        self.expect(Token::LBracket)?;

        if self.check(&Token::RBracket) {
            self.advance()?;
            return Ok(Suffix::Iterate);
        }

        if self.check(&Token::Colon) {
            self.advance()?;
            let end = if self.check(&Token::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_pipe()?))
            };
            self.expect(Token::RBracket)?;
            return Ok(Suffix::Index(Index::Slice { start: None, end }));
        }

        let first = self.parse_pipe()?;
        if self.check(&Token::Colon) {
            self.advance()?;
            let end = if self.check(&Token::RBracket) {
                None
            } else {
                Some(Box::new(self.parse_pipe()?))
            };
            self.expect(Token::RBracket)?;
            return Ok(Suffix::Index(Index::Slice {
                start: Some(Box::new(first)),
                end,
            }));
        }

        self.expect(Token::RBracket)?;
        Ok(Suffix::Index(Index::Expr(Box::new(first))))
    }

    /// Parse primary terms: literals, '.', '..', calls, constructors, control
    fn parse_primary(&mut self) -> Result<Term, ParseError> {
        let kind = match mem::replace(&mut self.current_token, Token::Eof) {
            // Literals
            Token::Number(n) => {
                self.advance()?;
                TermKind::Number(n)
            }
            Token::String(s) => {
                self.advance()?;
                TermKind::String(s)
            }
            Token::Boolean(b) => {
                self.advance()?;
                TermKind::Boolean(b)
            }
            Token::Null => {
                self.advance()?;
                TermKind::Null
            }
            Token::Format(name) => {
                self.advance()?;
                if let Token::String(s) = &self.current_token {
                    let s = s.clone();
                    self.advance()?;
                    TermKind::Format(name, Some(s))
                } else {
                    TermKind::Format(name, None)
                }
            }
            Token::Variable(name) => {
                self.advance()?;
                TermKind::Variable(name)
            }

            // Paths
            Token::Field(name) => {
                self.advance()?;
                TermKind::Index(Index::Name(name))
            }
            Token::DotDot => {
                self.advance()?;
                TermKind::Recurse
            }
            Token::Dot => {
                self.advance()?;
                match &self.current_token {
                    Token::String(name) => {
                        let name = name.clone();
                        self.advance()?;
                        TermKind::Index(Index::Name(name))
                    }
                    Token::LBracket => match self.parse_bracket_suffix()? {
                        Suffix::Index(index) => TermKind::Index(index),
                        // `.[]` is identity followed by iteration
                        suffix => {
                            return Ok(Term {
                                kind: TermKind::Identity,
                                suffixes: vec![suffix],
                            });
                        }
                    },
                    _ => TermKind::Identity,
                }
            }

            Token::Identifier(name) => {
                self.advance()?;
                let mut args = vec![];
                if self.check(&Token::LParen) {
                    self.advance()?;
                    loop {
                        args.push(self.parse_pipe()?);
                        if self.check(&Token::Semicolon) {
                            self.advance()?;
                        } else {
                            break;
                        }
                    }
                    self.expect(Token::RParen)?;
                }
                TermKind::Func(FuncCall { name, args })
            }

            Token::LParen => {
                self.advance()?;
                let inner = self.parse_pipe()?;
                self.expect(Token::RParen)?;
                TermKind::Paren(Box::new(inner))
            }
            // Array constructor
            Token::LBracket => {
                self.advance()?;
                if self.check(&Token::RBracket) {
                    self.advance()?;
                    TermKind::Array(None)
                } else {
                    let inner = self.parse_pipe()?;
                    self.expect(Token::RBracket)?;
                    TermKind::Array(Some(Box::new(inner)))
                }
            }
            // Object constructor
            Token::LBrace => {
                self.advance()?;
                TermKind::Object(self.parse_object_entries()?)
            }

            Token::If => {
                self.advance()?;
                self.parse_if()?
            }
            Token::Try => {
                self.advance()?;
                let body = self.parse_postfix()?;
                let catch = if self.check(&Token::Catch) {
                    self.advance()?;
                    Some(Box::new(Query::Term(self.parse_postfix()?)))
                } else {
                    None
                };
                TermKind::Control(Control::Try {
                    body: Box::new(Query::Term(body)),
                    catch,
                })
            }
            Token::Reduce => {
                self.advance()?;
                let source = self.parse_postfix()?;
                self.expect(Token::As)?;
                let variable = self.expect_variable()?;
                self.expect(Token::LParen)?;
                let init = self.parse_pipe()?;
                self.expect(Token::Semicolon)?;
                let update = self.parse_pipe()?;
                self.expect(Token::RParen)?;
                TermKind::Control(Control::Reduce {
                    source: Box::new(source),
                    variable,
                    init: Box::new(init),
                    update: Box::new(update),
                })
            }
            Token::Foreach => {
                self.advance()?;
                let source = self.parse_postfix()?;
                self.expect(Token::As)?;
                let variable = self.expect_variable()?;
                self.expect(Token::LParen)?;
                let init = self.parse_pipe()?;
                self.expect(Token::Semicolon)?;
                let update = self.parse_pipe()?;
                let extract = if self.check(&Token::Semicolon) {
                    self.advance()?;
                    Some(Box::new(self.parse_pipe()?))
                } else {
                    None
                };
                self.expect(Token::RParen)?;
                TermKind::Control(Control::Foreach {
                    source: Box::new(source),
                    variable,
                    init: Box::new(init),
                    update: Box::new(update),
                    extract,
                })
            }
            Token::Break => {
                self.advance()?;
                TermKind::Control(Control::Break(self.expect_variable()?))
            }
            Token::Def => {
                self.current_token = Token::Def;
                return self.error("Function definitions are not supported");
            }

            token => {
                let message = format!("Unexpected token in primary expression: {:?}", token);
                self.current_token = token;
                return self.error(message);
            }
        };
        Ok(Term::new(kind))
    }

    fn parse_if(&mut self) -> Result<TermKind, ParseError> {
        let mut branches = vec![];

        let cond = self.parse_pipe()?;
        self.expect(Token::Then)?;
        let then = self.parse_pipe()?;
        branches.push((cond, then));

        while self.check(&Token::Elif) {
            self.advance()?;
            let cond = self.parse_pipe()?;
            self.expect(Token::Then)?;
            let then = self.parse_pipe()?;
            branches.push((cond, then));
        }

        let otherwise = if self.check(&Token::Else) {
            self.advance()?;
            Some(Box::new(self.parse_pipe()?))
        } else {
            None
        };
        self.expect(Token::End)?;

        Ok(TermKind::Control(Control::If {
            branches,
            otherwise,
        }))
    }

    fn parse_object_entries(&mut self) -> Result<Vec<ObjectEntry>, ParseError> {
        let mut entries = vec![];

        while !self.check(&Token::RBrace) {
            let key = match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Identifier(name) | Token::String(name) => {
                    self.advance()?;
                    ObjectKey::Name(name)
                }
                Token::Variable(name) => {
                    self.advance()?;
                    ObjectKey::Variable(name)
                }
                Token::LParen => {
                    self.advance()?;
                    let key = self.parse_pipe()?;
                    self.expect(Token::RParen)?;
                    ObjectKey::Computed(Box::new(key))
                }
                token => match token.keyword_text() {
                    Some(text) => {
                        self.advance()?;
                        ObjectKey::Name(text.to_string())
                    }
                    None => {
                        self.current_token = token;
                        return self.error("Expected identifier, string, variable or '(' as object key");
                    }
                },
            };

            let value = if self.check(&Token::Colon) {
                self.advance()?;
                Some(self.parse_object_value()?)
            } else if matches!(key, ObjectKey::Computed(_)) {
                return self.error("Computed object keys need a value");
            } else {
                None
            };
            entries.push(ObjectEntry { key, value });

            if !self.check(&Token::RBrace) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RBrace)?;
        Ok(entries)
    }

    /// Object values may pipe but a bare comma ends the entry.
    fn parse_object_value(&mut self) -> Result<Query, ParseError> {
        let left = self.parse_alternative()?;
        if self.check(&Token::Pipe) {
            self.advance()?;
            let right = self.parse_object_value()?;
            return Ok(Query::binary(Operator::Pipe, left, right));
        }
        Ok(left)
    }
}

/// Parse a query string into an AST.
pub fn parse_query(source: &str) -> Result<Query, ParseError> {
    Parser::new(Lexer::new(source))?.parse()
}
