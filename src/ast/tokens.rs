use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Name of a cache entry
    ///
    /// Any maximal run of characters that are not whitespace, operators or
    /// parentheses.
    ///
    /// # Examples
    /// ```text
    /// A
    /// segment_42
    /// users:active
    /// ```
    Identifier(String),

    // Operators
    /// Union operator
    ///
    /// # Examples
    /// ```text
    /// A | B
    /// ```
    Pipe,

    /// Intersection operator
    ///
    /// # Examples
    /// ```text
    /// A & B
    /// ```
    Ampersand,

    /// Difference operator
    ///
    /// # Examples
    /// ```text
    /// A - B
    /// ```
    Minus,

    // Delimiters
    /// Left parenthesis for grouping
    LParen,

    /// Right parenthesis
    RParen,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier `{}`", name),
            Token::Pipe => write!(f, "`|`"),
            Token::Ampersand => write!(f, "`&`"),
            Token::Minus => write!(f, "`-`"),
            Token::LParen => write!(f, "`(`"),
            Token::RParen => write!(f, "`)`"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
