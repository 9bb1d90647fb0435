#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenKind, &str)]) {
        let scanner = Scanner::new(source);
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_kind, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.kind, *expected_kind);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenKind::LeftParen, "("),
                (TokenKind::LeftBrace, "{"),
                (TokenKind::Star, "*"),
                (TokenKind::Dot, "."),
                (TokenKind::Comma, ","),
                (TokenKind::Plus, "+"),
                (TokenKind::Star, "*"),
                (TokenKind::RightBrace, "}"),
                (TokenKind::RightParen, ")"),
                (TokenKind::Eof, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators_and_comments() {
        assert_token_sequence(
            "!= == <= >= // ignored until newline\n/ <",
            &[
                (TokenKind::BangEqual, "!="),
                (TokenKind::EqualEqual, "=="),
                (TokenKind::LessEqual, "<="),
                (TokenKind::GreaterEqual, ">="),
                (TokenKind::Slash, "/"),
                (TokenKind::Less, "<"),
                (TokenKind::Eof, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { init() { this.x = super.y; } }",
            &[
                (TokenKind::Class, "class"),
                (TokenKind::Identifier, "Foo"),
                (TokenKind::Less, "<"),
                (TokenKind::Identifier, "Bar"),
                (TokenKind::LeftBrace, "{"),
                (TokenKind::Identifier, "init"),
                (TokenKind::LeftParen, "("),
                (TokenKind::RightParen, ")"),
                (TokenKind::LeftBrace, "{"),
                (TokenKind::This, "this"),
                (TokenKind::Dot, "."),
                (TokenKind::Identifier, "x"),
                (TokenKind::Equal, "="),
                (TokenKind::Super, "super"),
                (TokenKind::Dot, "."),
                (TokenKind::Identifier, "y"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::RightBrace, "}"),
                (TokenKind::RightBrace, "}"),
                (TokenKind::Eof, ""),
            ],
        );
    }

    #[test]
    fn test_literals_display() {
        let tokens = scan_tokens("42 3.25 \"hi\" name").unwrap();
        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            rendered,
            vec![
                "NUMBER 42 42.0",
                "NUMBER 3.25 3.25",
                "STRING \"hi\" hi",
                "IDENTIFIER name null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_multiline_string_advances_line() {
        let tokens = scan_tokens("\"a\nb\"\nx").unwrap();

        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb")));
        assert_eq!(tokens[1].lexeme, "x");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source).collect();

        // COMMA, DOT, error, LEFT_PAREN, error, EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenKind::Comma, ",");
        assert_token_matches(&results[1], TokenKind::Dot, ".");
        assert_token_matches(&results[3], TokenKind::LeftParen, "(");
        assert_token_matches(&results[5], TokenKind::Eof, "");

        let errors: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(errors.len(), 2, "Expected 2 error messages");

        for err in errors {
            assert!(
                matches!(err, LoxError::Lex { line: 1, .. }),
                "Expected a lex error on line 1, got: {:?}",
                err
            );
            assert!(err.to_string().contains("Unexpected character"));
        }
    }

    #[test]
    fn test_unterminated_string() {
        let err = scan_tokens("print \"oops;").unwrap_err();

        assert!(matches!(err, LoxError::Lex { .. }));
        assert_eq!(err.to_string(), "[line 1] Error: Unterminated string.");
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_tokens_serialize_to_json() {
        let tokens = scan_tokens("x = 1;").unwrap();
        let json = serde_json::to_value(&tokens).unwrap();

        assert_eq!(json[0]["kind"], "IDENTIFIER");
        assert_eq!(json[2]["literal"], 1.0);
        assert!(json[0].get("literal").is_none());
    }

    fn assert_token_matches(result: &rox::error::Result<Token>, expected_kind: TokenKind, expected_lexeme: &str) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.kind, expected_kind,
                    "Expected token kind {:?}, got {:?}",
                    expected_kind, token.kind
                );
                assert_eq!(
                    token.lexeme, expected_lexeme,
                    "Expected lexeme '{}', got '{}'",
                    expected_lexeme, token.lexeme
                );
            }
            Err(e) => panic!("Expected token but got error: {}", e),
        }
    }
}
