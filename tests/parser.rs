#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::*;
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::scanner::Scanner;

    fn parse(source: &str) -> Result<SyntaxTree, LoxError> {
        let tokens = Scanner::new(source.as_bytes()).scan_all()?;
        Parser::new(tokens).parse()
    }

    fn render(source: &str) -> String {
        match parse(source) {
            Ok(tree) => AstPrinter::print_program(&tree),
            Err(e) => panic!("parse failed: {}", e),
        }
    }

    fn parse_error(source: &str) -> String {
        match parse(source) {
            Ok(tree) => panic!("expected a parse error, got {:?}", tree),
            Err(e) => e.to_string(),
        }
    }

    fn expression(source: &str) -> String {
        let tokens = Scanner::new(source.as_bytes()).scan_all().unwrap();
        AstPrinter::print(&Parser::new(tokens).parse_expression().unwrap())
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(expression("1 + 2 * 3 - 4"), "(- (+ 1 (* 2 3)) 4)");
        assert_eq!(expression("!a == b or c and d"), "(or (== (! a) b) (and c d))");
        assert_eq!(expression("7 % 3 < 2"), "(< (% 7 3) 2)");
    }

    #[test]
    fn test_parser_02_postfix_chains() {
        assert_eq!(expression("a.b(1)[2].c"), "(. ([] (call (. a b) 1) 2) c)");
        assert_eq!(expression("f(...xs, 3)"), "(call f (... xs) 3)");
    }

    #[test]
    fn test_parser_03_assignment_targets() {
        assert_eq!(expression("a = b = 1"), "(= a (= b 1))");
        assert_eq!(expression("o.x = 2"), "(.= o x 2)");
        assert_eq!(expression("xs[0] = 3"), "([]= xs 0 3)");

        assert_eq!(
            parse_error("1 + 2 = 3;"),
            "[line 1] Error at '=': Invalid assignment target."
        );
    }

    #[test]
    fn test_parser_04_collection_literals() {
        assert_eq!(expression("[]"), "(list)");
        assert_eq!(expression("[1, 2,]"), "(list 1 2)");
        assert_eq!(expression("[:]"), "(dict)");
        assert_eq!(expression("[\"a\": 1, \"b\": 2,]"), "(dict (a 1) (b 2))");
        assert_eq!(expression("[...a, 1]"), "(list (... a) 1)");
    }

    #[test]
    fn test_parser_05_number_literals_keep_their_kind() {
        let tree = parse("1; 1.5;").unwrap();

        assert!(matches!(tree[0], Stmt::Expression(Expr::Literal(LiteralValue::Int(1)))));
        assert!(
            matches!(tree[1], Stmt::Expression(Expr::Literal(LiteralValue::Double(n))) if n == 1.5)
        );
    }

    #[test]
    fn test_parser_06_lambda_and_declaration() {
        let tree = parse("fun named() {} var f = fun (x) { return x; };").unwrap();

        match &tree[0] {
            Stmt::Function(decl) => {
                assert_eq!(decl.name.lexeme, "named");
                assert!(!decl.is_lambda);
            }
            other => panic!("expected a function, got {:?}", other),
        }

        match &tree[1] {
            Stmt::Var {
                initializer: Some(Expr::Lambda(decl)),
                ..
            } => {
                assert!(decl.is_lambda);
                assert_eq!(decl.params.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("expected a lambda initializer, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_07_class_members() {
        let tree = parse("class A < B { static make() {} area { return 1; } init(w) {} }").unwrap();

        let Stmt::Class(class) = &tree[0] else {
            panic!("expected a class");
        };

        assert_eq!(class.name.lexeme, "A");
        assert_eq!(
            class.superclass.as_ref().map(|s| s.name.lexeme.as_str()),
            Some("B")
        );

        let summary: Vec<_> = class
            .methods
            .iter()
            .map(|m| (m.function.name.lexeme.as_str(), m.is_static, m.function.is_getter()))
            .collect();
        assert_eq!(
            summary,
            vec![("make", true, false), ("area", false, true), ("init", false, false)]
        );
    }

    #[test]
    fn test_parser_08_variadic_must_be_last() {
        assert_eq!(
            parse_error("fun f(...rest, a) {}"),
            "[line 1] Error at ',': A variadic parameter must be the last one."
        );
        assert_eq!(render("fun f(a, ...rest) {}"), "(fun f (a ...rest))");
    }

    #[test]
    fn test_parser_09_switch_clauses() {
        let tree = parse(
            "switch (x) { case 1, 2: print 1; print 2; case 3: print 3; default: print 0; }",
        )
        .unwrap();

        let Stmt::Switch { cases, default, .. } = &tree[0] else {
            panic!("expected a switch");
        };

        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].values.len(), 2);
        assert_eq!(cases[0].body.len(), 2);
        assert_eq!(default.as_ref().map(|d| d.body.len()), Some(1));
    }

    #[test]
    fn test_parser_10_switch_default_must_be_last() {
        assert_eq!(
            parse_error("switch (x) { default: print 0; case 1: print 1; }"),
            "[line 1] Error at 'case': 'default' must be the last clause of a switch."
        );
        assert_eq!(
            parse_error("switch (x) { default: print 0; default: print 1; }"),
            "[line 1] Error at 'default': A switch can only have one 'default'."
        );
    }

    #[test]
    fn test_parser_11_enum_cases() {
        let tree = parse("enum Suit { Hearts, Spades, }").unwrap();

        let Stmt::Enum(decl) = &tree[0] else {
            panic!("expected an enum");
        };
        let cases: Vec<_> = decl.cases.iter().map(|c| c.lexeme.as_str()).collect();
        assert_eq!(cases, vec!["Hearts", "Spades"]);
    }

    #[test]
    fn test_parser_12_for_is_kept_as_its_own_node() {
        let tree = parse("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();

        assert!(matches!(
            &tree[0],
            Stmt::For {
                initializer: Some(_),
                condition: Some(_),
                increment: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn test_parser_13_first_error_wins() {
        assert_eq!(
            parse_error("print ;\nvar = 1;"),
            "[line 1] Error at ';': Expect expression."
        );
        assert_eq!(
            parse_error("print 1"),
            "[line 1] Error at end: Expect ';' after value."
        );
    }

    #[test]
    fn test_parser_14_repl_allows_trailing_expression() {
        let tokens = Scanner::new(b"var a = 1; a + 1").scan_all().unwrap();
        let tree = Parser::new(tokens).parse_repl().unwrap();

        assert_eq!(tree.len(), 2);
        assert!(matches!(tree[1], Stmt::Expression(Expr::Binary { .. })));

        assert!(parse("var a = 1; a + 1").is_err());
    }

    #[test]
    fn test_parser_15_argument_limit() {
        let args = vec!["1"; 256].join(", ");
        let message = parse_error(&format!("f({});", args));

        assert!(
            message.ends_with("Can't have more than 255 arguments."),
            "unexpected message: {}",
            message
        );
    }
}
