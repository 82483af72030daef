mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::*;
    use rox::error::{LoxError, ResolveError};

    use crate::common::resolve;

    fn resolved(source: &str) -> ResolvedTree {
        match resolve(source) {
            Ok(tree) => tree,
            Err(e) => panic!("resolve failed: {}", e),
        }
    }

    fn resolve_error(source: &str) -> ResolveError {
        match resolve(source) {
            Err(LoxError::Resolve(err)) => err,
            Err(other) => panic!("expected a resolve error, got {}", other),
            Ok(_) => panic!("expected a resolve error for {:?}", source),
        }
    }

    /// Slot of the variable printed by a `print name;` statement.
    fn printed_slot(stmt: &Stmt<Resolution>) -> Resolution {
        match stmt {
            Stmt::Print(Expr::Variable(var)) => var.slot,
            other => panic!("expected `print <variable>`, got {:?}", other),
        }
    }

    fn block(stmt: &Stmt<Resolution>) -> &[Stmt<Resolution>] {
        match stmt {
            Stmt::Block(statements) => statements,
            other => panic!("expected a block, got {:?}", other),
        }
    }

    #[test]
    fn test_resolver_01_same_scope_is_distance_zero() {
        let tree = resolved("{ var a = 1; print a; }");
        assert_eq!(printed_slot(&block(&tree[0])[1]), Resolution::Local(0));
    }

    #[test]
    fn test_resolver_02_enclosing_scope_is_distance_one() {
        let tree = resolved("{ var a = 1; { print a; } }");
        let inner = block(&block(&tree[0])[1]);
        assert_eq!(printed_slot(&inner[0]), Resolution::Local(1));
    }

    #[test]
    fn test_resolver_03_unknown_names_are_global() {
        let tree = resolved("var g = 1; { print g; print missing; }");
        let body = block(&tree[1]);

        assert_eq!(printed_slot(&body[0]), Resolution::Global);
        assert_eq!(printed_slot(&body[1]), Resolution::Global);
    }

    #[test]
    fn test_resolver_04_parameters_share_the_body_scope() {
        let tree = resolved("fun f(x) { print x; }");

        let Stmt::Function(decl) = &tree[0] else {
            panic!("expected a function");
        };
        assert_eq!(printed_slot(&decl.body[0]), Resolution::Local(0));
    }

    #[test]
    fn test_resolver_05_this_and_super_distances() {
        let tree = resolved(
            "class A { m() {} }
             class B < A { m() { print this; super.m(); } }",
        );

        let Stmt::Class(class) = &tree[1] else {
            panic!("expected a class");
        };
        let body = &class.methods[0].function.body;

        // this: one frame out of the call frame; super: one further.
        assert!(matches!(
            &body[0],
            Stmt::Print(Expr::This(VarRef {
                slot: Resolution::Local(1),
                ..
            }))
        ));
        match &body[1] {
            Stmt::Expression(Expr::Call { callee, .. }) => assert!(matches!(
                callee.as_ref(),
                Expr::Super {
                    keyword: VarRef {
                        slot: Resolution::Local(2),
                        ..
                    },
                    ..
                }
            )),
            other => panic!("expected a super call, got {:?}", other),
        }
    }

    #[test]
    fn test_resolver_06_for_loop_variable_lives_in_one_scope() {
        let tree = resolved("for (var i = 0; i < 1; i = i + 1) { print i; }");

        let Stmt::For { body, .. } = &tree[0] else {
            panic!("expected a for loop");
        };
        assert_eq!(printed_slot(&block(body)[0]), Resolution::Local(1));
    }

    #[test]
    fn test_resolver_07_read_in_own_initializer() {
        let err = resolve_error("var a = \"outer\"; { var a = a; }");

        assert!(matches!(err, ResolveError::ReadInOwnInitializer { .. }));
        assert_eq!(err.token().lexeme, "a");

        // Globals may refer to themselves.
        assert!(resolve("var a = a;").is_ok());
    }

    #[test]
    fn test_resolver_08_duplicate_local() {
        assert!(matches!(
            resolve_error("{ var a = 1; var a = 2; }"),
            ResolveError::AlreadyDeclared { .. }
        ));
        assert!(matches!(
            resolve_error("fun f(a, a) {}"),
            ResolveError::AlreadyDeclared { .. }
        ));
        assert!(resolve("var a = 1; var a = 2;").is_ok());
    }

    #[test]
    fn test_resolver_09_return_rules() {
        assert!(matches!(
            resolve_error("return 1;"),
            ResolveError::ReturnOutsideFunction { .. }
        ));
        assert!(matches!(
            resolve_error("class A { init() { return 1; } }"),
            ResolveError::ReturnValueFromInitializer { .. }
        ));
        assert!(resolve("class A { init() { return; } }").is_ok());
    }

    #[test]
    fn test_resolver_10_this_and_super_placement() {
        assert!(matches!(
            resolve_error("print this;"),
            ResolveError::ThisOutsideClass { .. }
        ));
        assert!(matches!(
            resolve_error("fun f() { super.m(); }"),
            ResolveError::SuperOutsideClass { .. }
        ));
        assert!(matches!(
            resolve_error("class A { m() { super.m(); } }"),
            ResolveError::SuperWithoutSuperclass { .. }
        ));
        assert!(matches!(
            resolve_error("class A < A {}"),
            ResolveError::SelfInheritance { .. }
        ));
    }

    #[test]
    fn test_resolver_11_static_methods_have_no_instance() {
        assert!(matches!(
            resolve_error("class A { static make() { return this; } }"),
            ResolveError::ThisOutsideClass { .. }
        ));
        assert!(matches!(
            resolve_error("class A {} class B < A { static make() { super.make(); } }"),
            ResolveError::SuperOutsideClass { .. }
        ));
        assert!(matches!(
            resolve_error("class A { static init() {} }"),
            ResolveError::StaticInitializer { .. }
        ));
    }

    #[test]
    fn test_resolver_12_break_and_continue_placement() {
        assert!(matches!(
            resolve_error("break;"),
            ResolveError::BreakOutsideLoop { .. }
        ));
        assert!(matches!(
            resolve_error("continue;"),
            ResolveError::ContinueOutsideLoop { .. }
        ));
        // A function body does not inherit the loop around it.
        assert!(matches!(
            resolve_error("while (true) { fun f() { break; } }"),
            ResolveError::BreakOutsideLoop { .. }
        ));
        // `break` leaves a switch, `continue` needs a loop.
        assert!(resolve("switch (1) { case 1: break; }").is_ok());
        assert!(matches!(
            resolve_error("switch (1) { case 1: continue; }"),
            ResolveError::ContinueOutsideLoop { .. }
        ));
        assert!(resolve("while (true) { switch (1) { case 1: continue; } }").is_ok());
    }

    #[test]
    fn test_resolver_13_getters_only_in_classes() {
        assert!(resolve("class A { area { return 1; } }").is_ok());

        assert!(matches!(
            resolve_error("fun f { return 1; }"),
            ResolveError::MissingParameterList { .. }
        ));
        assert!(matches!(
            resolve_error("var f = fun { return 1; };"),
            ResolveError::MissingParameterList { .. }
        ));
        assert!(matches!(
            resolve_error("class A { static area { return 1; } }"),
            ResolveError::MissingParameterList { .. }
        ));
    }

    #[test]
    fn test_resolver_14_splat_placement() {
        assert!(resolve("var xs = [1]; print [...xs]; print len(...xs);").is_ok());
        assert!(matches!(
            resolve_error("var xs = [1]; var y = ...xs;"),
            ResolveError::MisplacedSplat { .. }
        ));
        assert!(matches!(
            resolve_error("var xs = [1]; print 1 + ...xs;"),
            ResolveError::MisplacedSplat { .. }
        ));
    }

    #[test]
    fn test_resolver_15_enum_and_switch_shape() {
        assert!(matches!(
            resolve_error("enum E { A, B, A }"),
            ResolveError::DuplicateEnumCase { .. }
        ));
        assert!(matches!(
            resolve_error("switch (1) {}"),
            ResolveError::EmptySwitch { .. }
        ));
        assert!(matches!(
            resolve_error("switch (1) { case 1: case 2: print 2; }"),
            ResolveError::EmptyCase { .. }
        ));
    }

    #[test]
    fn test_resolver_16_error_message_format() {
        let err = resolve_error("{\n  var a = 1;\n  var a = 2;\n}");

        assert_eq!(
            err.to_string(),
            "[line 3] Error at 'a': Already a variable with this name in this scope."
        );
    }
}
