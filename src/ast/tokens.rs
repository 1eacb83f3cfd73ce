use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Number literal, kept exactly as written
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// 1e3
    /// ```
    Number(Decimal),

    /// String literal enclosed in double quotes
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// "item #1"
    /// ```
    String(String),

    /// Boolean values
    Boolean(bool),

    /// Null value
    Null,

    // Identifiers and References
    /// Function name or bare object key
    ///
    /// Must start with letter or underscore, followed by letters, digits, or underscores.
    /// jq also allows `::` inside module-qualified names.
    ///
    /// # Examples
    /// ```text
    /// length
    /// base64_encode
    /// ```
    Identifier(String),

    /// Field access written directly after a dot
    ///
    /// # Examples
    /// ```text
    /// .name     // Field("name")
    /// .items    // Field("items")
    /// ```
    Field(String),

    /// Variable reference
    ///
    /// # Examples
    /// ```text
    /// $x
    /// $__loc__
    /// ```
    Variable(String),

    /// Format string selector
    ///
    /// # Examples
    /// ```text
    /// @base64
    /// @csv
    /// ```
    Format(String),

    /// Identity (`.`)
    Dot,

    /// Recursive descent (`..`)
    DotDot,

    // Keywords
    If,
    Then,
    Elif,
    Else,
    End,
    Try,
    Catch,
    Reduce,
    Foreach,
    As,
    Label,
    Break,
    Def,

    /// Logical AND (word, not symbol)
    And,

    /// Logical OR (word, not symbol)
    Or,

    // Operators
    /// Pipeline operator
    ///
    /// # Examples
    /// ```text
    /// .items | length
    /// ```
    Pipe,

    /// Alternative operator (`//`)
    Alt,

    /// Error suppression suffix (`?`)
    Question,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Assignment
    /// Plain assignment (`=`)
    Assign,
    /// Update assignment (`|=`)
    UpdateAssign,
    /// `+=`
    PlusAssign,
    /// `-=`
    MinusAssign,
    /// `*=`
    StarAssign,
    /// `/=`
    SlashAssign,
    /// `%=`
    PercentAssign,
    /// `//=`
    AltAssign,

    // Delimiters
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,

    /// Separates outputs, array elements and object entries
    Comma,

    /// Object key/value separator and slice bound separator
    Colon,

    /// Separates function arguments
    Semicolon,

    /// End of file
    Eof,
}

impl Token {
    /// Map an identifier to its keyword token, if it is one.
    pub fn keyword(ident: &str) -> Option<Token> {
        let token = match ident {
            "if" => Token::If,
            "then" => Token::Then,
            "elif" => Token::Elif,
            "else" => Token::Else,
            "end" => Token::End,
            "try" => Token::Try,
            "catch" => Token::Catch,
            "reduce" => Token::Reduce,
            "foreach" => Token::Foreach,
            "as" => Token::As,
            "label" => Token::Label,
            "break" => Token::Break,
            "def" => Token::Def,
            "and" => Token::And,
            "or" => Token::Or,
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            _ => return None,
        };
        Some(token)
    }

    /// Keywords may still be used as object keys (`{if: 1}`).
    pub fn keyword_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::If => "if",
            Token::Then => "then",
            Token::Elif => "elif",
            Token::Else => "else",
            Token::End => "end",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Reduce => "reduce",
            Token::Foreach => "foreach",
            Token::As => "as",
            Token::Label => "label",
            Token::Break => "break",
            Token::Def => "def",
            Token::And => "and",
            Token::Or => "or",
            Token::Boolean(true) => "true",
            Token::Boolean(false) => "false",
            Token::Null => "null",
            _ => return None,
        };
        Some(text)
    }
}
