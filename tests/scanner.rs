#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    fn assert_token_matches(
        result: &Result<Token, LoxError>,
        expected_type: TokenType,
        expected_lexeme: &str,
    ) {
        match result {
            Ok(token) => {
                assert_eq!(
                    token.token_type, expected_type,
                    "Expected token type {:?}, got {:?}",
                    expected_type, token.token_type
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

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_collection_punctuation() {
        assert_token_sequence(
            "[a: ...b] % .",
            &[
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::IDENTIFIER, "a"),
                (TokenType::COLON, ":"),
                (TokenType::ELLIPSIS, "..."),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::PERCENT, "%"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords() {
        assert_token_sequence(
            "switch case default break continue enum static breaker",
            &[
                (TokenType::SWITCH, "switch"),
                (TokenType::CASE, "case"),
                (TokenType::DEFAULT, "default"),
                (TokenType::BREAK, "break"),
                (TokenType::CONTINUE, "continue"),
                (TokenType::ENUM, "enum"),
                (TokenType::STATIC, "static"),
                (TokenType::IDENTIFIER, "breaker"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers_keep_their_kind() {
        let tokens = Scanner::new(b"42 4.5 7.0").scan_all().unwrap();

        assert!(matches!(tokens[0].token_type, TokenType::INTEGER(42)));
        assert!(matches!(tokens[1].token_type, TokenType::DOUBLE(n) if n == 4.5));
        assert!(matches!(tokens[2].token_type, TokenType::DOUBLE(n) if n == 7.0));

        assert_eq!(tokens[0].to_string(), "INTEGER 42 42");
        assert_eq!(tokens[2].to_string(), "DOUBLE 7.0 7.0");
    }

    #[test]
    fn test_scanner_05_integer_overflow_is_a_lex_error() {
        let result = Scanner::new(b"99999999999999999999").scan_all();
        assert!(matches!(result, Err(LoxError::Lex { line: 1, .. })));
    }

    #[test]
    fn test_scanner_06_strings_span_lines() {
        let tokens = Scanner::new(b"\"a\nb\" x").scan_all().unwrap();

        assert!(matches!(&tokens[0].token_type, TokenType::STRING(s) if s == "a\nb"));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_scanner_07_unterminated_string() {
        let result = Scanner::new(b"\"open").scan_all();
        assert!(
            matches!(&result, Err(LoxError::Lex { message, .. }) if message == "Unterminated string.")
        );
    }

    #[test]
    fn test_scanner_08_comments_are_skipped() {
        assert_token_sequence(
            "a // rest of line ( {\nb",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<_> = scanner.collect();

        // COMMA, DOT, error for '$', LEFT_PAREN, error for '#', EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            let message = err.to_string();
            assert!(
                message.contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                message
            );
        }
    }

    #[test]
    fn test_scanner_exactly_one_eof() {
        let mut scanner = Scanner::new(b"");
        assert_token_matches(&scanner.next().unwrap(), TokenType::EOF, "");
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
