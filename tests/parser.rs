#[cfg(test)]
mod parser_tests {
    use rox::ast::*;
    use rox::ast_printer::AstPrinter;
    use rox::error::LoxError;
    use rox::parser::Parser;
    use rox::scanner::scan_tokens;
    use rox::token::TokenKind;
    use std::collections::HashSet;

    fn parse_err(source: &str) -> LoxError {
        let tokens = scan_tokens(source).unwrap();
        Parser::new(&tokens).parse().unwrap_err()
    }

    fn print_expr(source: &str) -> String {
        let tokens = scan_tokens(source).unwrap();
        let expr = Parser::new(&tokens).parse_expression().unwrap();
        AstPrinter::print(&expr)
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(print_expr("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(print_expr("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(print_expr("!true == false"), "(== (! true) false)");
        assert_eq!(print_expr("a = b = 1"), "(= a (= b 1.0))");
        assert_eq!(print_expr("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_for_loop_desugars_into_block_and_while() {
        let tokens = scan_tokens("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();
        let statements = Parser::new(&tokens).parse().unwrap();

        assert_eq!(statements.len(), 1);

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected a block, got {:?}", statements[0]);
        };
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let Stmt::While { body, .. } = &outer[1] else {
            panic!("expected a while loop, got {:?}", outer[1]);
        };
        let Stmt::Block(inner) = body.as_ref() else {
            panic!("expected the body and increment in a block");
        };
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_class_with_superclass() {
        let tokens = scan_tokens("class B < A { init(x) { this.x = x; } get() { return super.get(); } }").unwrap();
        let statements = Parser::new(&tokens).parse().unwrap();

        let Stmt::Class {
            name,
            superclass,
            methods,
        } = &statements[0]
        else {
            panic!("expected a class declaration");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].params.len(), 1);
        assert_eq!(methods[1].name.lexeme, "get");
    }

    #[test]
    fn test_binding_uses_get_distinct_ids() {
        let tokens = scan_tokens("var a = 1; a = a + a; { print a; }").unwrap();
        let statements = Parser::new(&tokens).parse().unwrap();

        fn collect(expr: &Expr<'_>, ids: &mut Vec<ExprId>) {
            match expr {
                Expr::Variable { id, .. } => ids.push(*id),
                Expr::Assign { id, value, .. } => {
                    ids.push(*id);
                    collect(value, ids);
                }
                Expr::Binary { left, right, .. } => {
                    collect(left, ids);
                    collect(right, ids);
                }
                _ => {}
            }
        }

        let mut ids = Vec::new();
        for stmt in &statements {
            match stmt {
                Stmt::Expression(expr) => collect(expr, &mut ids),
                Stmt::Block(inner) => {
                    if let Stmt::Print(expr) = &inner[0] {
                        collect(expr, &mut ids);
                    }
                }
                _ => {}
            }
        }

        assert_eq!(ids.len(), 4);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_invalid_assignment_target() {
        let err = parse_err("1 + 2 = 3;");

        assert!(matches!(err, LoxError::Parse { line: 1, .. }));
        assert!(err.to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_err("print 1\nprint 2;");

        assert!(matches!(err, LoxError::Parse { .. }));
        assert!(err.to_string().contains("Expected ';' after value"));
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let err = parse_err(&format!("f({});", args));

        assert!(err.to_string().contains("Can't have more than 255 arguments"));
    }

    #[test]
    fn test_eof_is_not_an_expression() {
        let tokens = scan_tokens("(1 + ").unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));

        let err = Parser::new(&tokens).parse_expression().unwrap_err();
        assert!(matches!(err, LoxError::Parse { .. }));
    }
}
