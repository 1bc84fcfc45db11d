use std::mem;

use thiserror::Error;

use crate::{
    ast::{Node, Query, SetOp, Token},
    config::DEFAULT_MAX_QUERY_DEPTH,
    lexer::{LexError, Lexer, Position, Spanned},
};

/// Syntax errors. Each carries the position of the offending token; the
/// parser does no recovery, so the first error aborts the parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("empty expression at {position}")]
    EmptyExpression { position: Position },

    #[error("missing operand for `{op}`: found {found} at {position}")]
    MissingOperand {
        op: SetOp,
        found: Token,
        position: Position,
    },

    #[error("unmatched `(` at {position}")]
    UnmatchedOpenParen { position: Position },

    #[error("unmatched `)` at {position}")]
    UnmatchedCloseParen { position: Position },

    #[error("unexpected {found} at {position}")]
    UnexpectedToken { found: Token, position: Position },

    #[error("query nested too deeply at {position}")]
    TooDeep { position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(e) => e.position(),
            ParseError::EmptyExpression { position }
            | ParseError::MissingOperand { position, .. }
            | ParseError::UnmatchedOpenParen { position }
            | ParseError::UnmatchedCloseParen { position }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::TooDeep { position } => *position,
        }
    }
}

/// Parse query text into a [`Query`].
///
/// ```
/// use keyset_query::parser::parse_query;
///
/// let query = parse_query("(A - B) | (C & D)").unwrap();
/// assert_eq!(query.keys(), vec!["A", "B", "C", "D"]);
/// ```
pub fn parse_query(text: &str) -> Result<Query, ParseError> {
    parse_query_with_max_depth(text, DEFAULT_MAX_QUERY_DEPTH)
}

/// Like [`parse_query`], rejecting trees deeper than `max_depth`.
pub fn parse_query_with_max_depth(text: &str, max_depth: usize) -> Result<Query, ParseError> {
    let mut parser = Parser::with_max_depth(Lexer::new(text), max_depth)?;
    let root = parser.parse()?;
    Ok(Query::new(text, root))
}

/// A subtree together with its depth; a leaf has depth 1.
type Parsed = (Node, usize);

/// Recursive-descent parser for the grammar
///
/// ```text
/// expr   := term (('|' | '-') term)*
/// term   := factor ('&' factor)*
/// factor := IDENTIFIER | '(' expr ')'
/// ```
///
/// Tree depth and parenthesis nesting are both capped at `max_depth`;
/// anything deeper fails with [`ParseError::TooDeep`]. The evaluator and
/// `Node`'s `Display` and `Drop` recurse once per level, so they rely on
/// this bound.
pub struct Parser {
    lexer: Lexer,
    current: Spanned,
    max_depth: usize,
    nesting: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        Self::with_max_depth(lexer, DEFAULT_MAX_QUERY_DEPTH)
    }

    pub fn with_max_depth(mut lexer: Lexer, max_depth: usize) -> Result<Self, ParseError> {
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            max_depth: max_depth.max(1),
            nesting: 0,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current.token) == mem::discriminant(token)
    }

    fn unexpected(&self) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.current.token.clone(),
            position: self.current.position,
        }
    }

    fn combine(
        &self,
        op: SetOp,
        (left, left_depth): Parsed,
        (right, right_depth): Parsed,
        position: Position,
    ) -> Result<Parsed, ParseError> {
        let depth = left_depth.max(right_depth) + 1;
        if depth > self.max_depth {
            return Err(ParseError::TooDeep { position });
        }
        Ok((Node::binary(op, left, right), depth))
    }

    /// Parse a factor. `after` is the operator whose right operand this is,
    /// if any.
    fn parse_factor(&mut self, after: Option<SetOp>) -> Result<Parsed, ParseError> {
        let position = self.current.position;
        match mem::replace(&mut self.current.token, Token::Eof) {
            Token::Identifier(name) => {
                self.advance()?;
                Ok((Node::Leaf(name), 1))
            }
            Token::LParen => {
                if self.nesting >= self.max_depth {
                    return Err(ParseError::TooDeep { position });
                }
                self.advance()?;
                self.nesting += 1;
                let group = self.parse_group(position);
                self.nesting -= 1;
                group
            }
            found => {
                let op = match found {
                    Token::Pipe => Some(SetOp::Union),
                    Token::Ampersand => Some(SetOp::Intersection),
                    Token::Minus => Some(SetOp::Difference),
                    _ => None,
                };
                match (after.or(op), found) {
                    (Some(op), found) => Err(ParseError::MissingOperand {
                        op,
                        found,
                        position,
                    }),
                    (None, Token::RParen) => Err(ParseError::UnmatchedCloseParen { position }),
                    (None, _) => Err(ParseError::EmptyExpression { position }),
                }
            }
        }
    }

    /// Parse the inside of a parenthesised group; `(` is already consumed.
    fn parse_group(&mut self, open: Position) -> Result<Parsed, ParseError> {
        match self.current.token {
            Token::RParen => {
                return Err(ParseError::EmptyExpression {
                    position: self.current.position,
                });
            }
            Token::Eof => return Err(ParseError::UnmatchedOpenParen { position: open }),
            _ => {}
        }

        let expr = self.expression()?;

        match self.current.token {
            Token::RParen => {
                self.advance()?;
                Ok(expr)
            }
            Token::Eof => Err(ParseError::UnmatchedOpenParen { position: open }),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_term(&mut self, after: Option<SetOp>) -> Result<Parsed, ParseError> {
        let mut left = self.parse_factor(after)?;

        while self.check(&Token::Ampersand) {
            let position = self.current.position;
            self.advance()?;
            let right = self.parse_factor(Some(SetOp::Intersection))?;
            left = self.combine(SetOp::Intersection, left, right, position)?;
        }
        Ok(left)
    }

    fn expression(&mut self) -> Result<Parsed, ParseError> {
        let mut left = self.parse_term(None)?;

        loop {
            let op = match self.current.token {
                Token::Pipe => SetOp::Union,
                Token::Minus => SetOp::Difference,
                _ => break,
            };

            let position = self.current.position;
            self.advance()?;
            let right = self.parse_term(Some(op))?;

            left = self.combine(op, left, right, position)?;
        }
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        self.expression().map(|(node, _)| node)
    }

    /// Parse a complete expression, requiring the input to end after it.
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        let expr = self.parse_expression()?;

        match self.current.token {
            Token::Eof => Ok(expr),
            Token::RParen => Err(ParseError::UnmatchedCloseParen {
                position: self.current.position,
            }),
            _ => Err(self.unexpected()),
        }
    }
}
