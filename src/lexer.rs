use std::fmt;

use thiserror::Error;

use crate::ast::Token;

/// Location of a token in the query text, as a 0-based character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub offset: usize,
}

impl Position {
    pub fn new(offset: usize) -> Self {
        Position { offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {}", self.offset)
    }
}

/// A token together with the position of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character {ch:?} at {position}")]
    UnexpectedCharacter { ch: char, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnexpectedCharacter { position, .. } => *position,
        }
    }
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_identifier_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    pub fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();

        let position = Position::new(self.position);
        let token = match self.current_char() {
            None => Token::Eof,
            Some('|') => self.single(Token::Pipe),
            Some('&') => self.single(Token::Ampersand),
            Some('-') => self.single(Token::Minus),
            Some('(') => self.single(Token::LParen),
            Some(')') => self.single(Token::RParen),
            Some(ch) if is_identifier_char(ch) => Token::Identifier(self.read_identifier()),
            Some(ch) => return Err(LexError::UnexpectedCharacter { ch, position }),
        };

        Ok(Spanned { token, position })
    }

    /// Scan the whole input, ending with `Token::Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

fn is_operator_char(ch: char) -> bool {
    matches!(ch, '|' | '&' | '-' | '(' | ')')
}

/// Control characters other than whitespace are rejected outright.
fn is_identifier_char(ch: char) -> bool {
    !ch.is_whitespace() && !ch.is_control() && !is_operator_char(ch)
}

#[test]
fn test_operators() {
    let mut lexer = Lexer::new("| & - ( )");
    assert_eq!(lexer.next_token().unwrap().token, Token::Pipe);
    assert_eq!(lexer.next_token().unwrap().token, Token::Ampersand);
    assert_eq!(lexer.next_token().unwrap().token, Token::Minus);
    assert_eq!(lexer.next_token().unwrap().token, Token::LParen);
    assert_eq!(lexer.next_token().unwrap().token, Token::RParen);
    assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
}

#[test]
fn test_query() {
    let mut lexer = Lexer::new("(A - B) | (C & D)");
    assert_eq!(lexer.next_token().unwrap().token, Token::LParen);
    assert_eq!(
        lexer.next_token().unwrap().token,
        Token::Identifier("A".to_string())
    );
    assert_eq!(lexer.next_token().unwrap().token, Token::Minus);
    assert_eq!(
        lexer.next_token().unwrap().token,
        Token::Identifier("B".to_string())
    );
    assert_eq!(lexer.next_token().unwrap().token, Token::RParen);
    assert_eq!(lexer.next_token().unwrap().token, Token::Pipe);
    assert_eq!(lexer.next_token().unwrap().token, Token::LParen);
    assert_eq!(
        lexer.next_token().unwrap().token,
        Token::Identifier("C".to_string())
    );
    assert_eq!(lexer.next_token().unwrap().token, Token::Ampersand);
    assert_eq!(
        lexer.next_token().unwrap().token,
        Token::Identifier("D".to_string())
    );
    assert_eq!(lexer.next_token().unwrap().token, Token::RParen);
    assert_eq!(lexer.next_token().unwrap().token, Token::Eof);
}
