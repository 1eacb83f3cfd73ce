// tests/lexer_tests.rs

use jqflow::ast::Token;
use jqflow::lexer::Lexer;
use rust_decimal::Decimal;
use std::str::FromStr;

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    loop {
        let token = lexer.next_token().unwrap();
        if token == Token::Eof {
            break;
        }
        out.push(token);
    }
    out
}

// ============================================================================
// Single Character Tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("?", Token::Question),
        ("|", Token::Pipe),
        ("+", Token::Plus),
        ("-", Token::Minus),
        ("*", Token::Star),
        ("/", Token::Slash),
        ("%", Token::Percent),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (".", Token::Dot),
        (",", Token::Comma),
        (":", Token::Colon),
        (";", Token::Semicolon),
        ("<", Token::Lt),
        (">", Token::Gt),
        ("=", Token::Assign),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }
}

// ============================================================================
// Multi Character Tokens
// ============================================================================

#[test]
fn test_multi_char_tokens() {
    let test_cases = vec![
        ("..", Token::DotDot),
        ("==", Token::EqEq),
        ("!=", Token::NotEq),
        ("<=", Token::LtEq),
        (">=", Token::GtEq),
        ("//", Token::Alt),
        ("|=", Token::UpdateAssign),
        ("+=", Token::PlusAssign),
        ("-=", Token::MinusAssign),
        ("*=", Token::StarAssign),
        ("/=", Token::SlashAssign),
        ("%=", Token::PercentAssign),
        ("//=", Token::AltAssign),
    ];

    for (input, expected) in test_cases {
        assert_eq!(tokens(input), vec![expected], "Failed for input: {}", input);
    }
}

#[test]
fn test_bang_alone_is_an_error() {
    let mut lexer = Lexer::new("!");
    let err = lexer.next_token().unwrap_err();
    assert!(err.message.contains("'!'"));
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn test_field_variable_and_format() {
    assert_eq!(
        tokens(".name $x @base64"),
        vec![
            Token::Field("name".to_string()),
            Token::Variable("x".to_string()),
            Token::Format("base64".to_string()),
        ]
    );
}

#[test]
fn test_chained_fields() {
    assert_eq!(
        tokens(".a.b_c"),
        vec![Token::Field("a".to_string()), Token::Field("b_c".to_string())]
    );
}

#[test]
fn test_module_qualified_identifier() {
    assert_eq!(tokens("mod::fn"), vec![Token::Identifier("mod::fn".to_string())]);
}

#[test]
fn test_object_key_colon_is_not_module_separator() {
    assert_eq!(
        tokens("{a: 1}"),
        vec![
            Token::LBrace,
            Token::Identifier("a".to_string()),
            Token::Colon,
            Token::Number(Decimal::from(1)),
            Token::RBrace,
        ]
    );
}

#[test]
fn test_keywords_are_not_identifiers() {
    assert_eq!(
        tokens("if then elif else end try catch label break def as foreach"),
        vec![
            Token::If,
            Token::Then,
            Token::Elif,
            Token::Else,
            Token::End,
            Token::Try,
            Token::Catch,
            Token::Label,
            Token::Break,
            Token::Def,
            Token::As,
            Token::Foreach,
        ]
    );
}

#[test]
fn test_dollar_without_name() {
    let mut lexer = Lexer::new("$ x");
    assert!(lexer.next_token().is_err());
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(tokens("42"), vec![Token::Number(Decimal::from(42))]);
    assert_eq!(
        tokens("3.14"),
        vec![Token::Number(Decimal::from_str("3.14").unwrap())]
    );
    assert_eq!(tokens("1e3"), vec![Token::Number(Decimal::from(1000))]);
}

#[test]
fn test_number_followed_by_field_dot() {
    // `1.` is not a fraction without a digit after the dot
    assert_eq!(
        tokens("1.a"),
        vec![Token::Number(Decimal::from(1)), Token::Field("a".to_string())]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#""a\"b\\c\nA""#),
        vec![Token::String("a\"b\\c\nA".to_string())]
    );
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("\"abc");
    let err = lexer.next_token().unwrap_err();
    assert!(err.message.contains("Unterminated"));
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_token_start_tracks_lines() {
    let mut lexer = Lexer::new(".a |\n  length");
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start().column, 1);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start().column, 4);
    lexer.next_token().unwrap();
    assert_eq!(lexer.token_start().line, 2);
    assert_eq!(lexer.token_start().column, 3);
    assert_eq!(lexer.token_start().offset, 7);
}

#[test]
fn test_unexpected_character_position() {
    let mut lexer = Lexer::new(".a ^");
    lexer.next_token().unwrap();
    let err = lexer.next_token().unwrap_err();
    assert_eq!(err.position.column, 4);
}
