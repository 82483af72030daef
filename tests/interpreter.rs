mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;

    use rox::config::Config;
    use rox::error::{LoxError, RuntimeError};
    use rox::value::{Arity, Value};

    use crate::common::{lines, run, run_err, run_with, session_with, test_config};

    fn runtime_error(source: &str) -> RuntimeError {
        match run_err(source) {
            (_, LoxError::Runtime(err)) => err,
            (_, other) => panic!("expected a runtime error, got {}", other),
        }
    }

    #[test]
    fn test_interpreter_01_arithmetic_keeps_int_and_double_apart() {
        assert_eq!(
            lines("print 1 + 2; print 7 / 2; print -7 / 2; print 7.0 / 2; print 2 * 3.0; print 7 % 3; print 7.5 % 2;"),
            vec!["3", "3", "-3", "3.5", "6.0", "1", "1.5"]
        );
    }

    #[test]
    fn test_interpreter_02_equality() {
        assert_eq!(
            lines(
                "print 1 == 1.0; print \"1\" == 1; print nil == false; print \"a\" == \"a\"; print nil == nil; print 1 != 2;"
            ),
            vec!["true", "false", "false", "true", "true", "true"]
        );
    }

    #[test]
    fn test_interpreter_03_truthiness_and_logic() {
        assert_eq!(
            lines("print !nil; print !0; print nil or \"x\"; print 1 and 2; print false and nope;"),
            vec!["true", "false", "x", "2", "false"]
        );
    }

    #[test]
    fn test_interpreter_04_string_concatenation() {
        assert_eq!(lines("print \"ab\" + \"cd\";"), vec!["abcd"]);

        let err = runtime_error("print \"a\" + 1;");
        assert_eq!(
            err.to_string(),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
    }

    #[test]
    fn test_interpreter_05_division_by_zero() {
        for source in ["print 1 / 0;", "print 1.0 / 0.0;", "print 5 % 0;", "print 2.5 / 0;"] {
            let err = runtime_error(source);
            assert!(
                matches!(&err, RuntimeError::Arithmetic { message, .. } if message == "Division by zero."),
                "{}: {}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_interpreter_06_integer_overflow() {
        let err = runtime_error("print 9223372036854775807 + 1;");
        assert!(matches!(&err, RuntimeError::Arithmetic { message, .. } if message == "Integer overflow."));
    }

    #[test]
    fn test_interpreter_07_comparison_operands() {
        assert_eq!(lines("print 1 < 2.5; print 3 >= 3; print 2 <= 1;"), vec!["true", "true", "false"]);

        let err = runtime_error("print 1 < \"a\";");
        assert_eq!(err.to_string(), "Operands must be numbers.\n[line 1]");

        let err = runtime_error("print -\"a\";");
        assert_eq!(err.to_string(), "Operand must be a number.\n[line 1]");
    }

    #[test]
    fn test_interpreter_08_lexical_binding_is_static() {
        let source = r#"
            var a = "global";
            {
              fun show() { print a; }
              show();
              var a = "block";
              show();
            }
        "#;
        assert_eq!(lines(source), vec!["global", "global"]);
    }

    #[test]
    fn test_interpreter_09_counters_keep_their_own_state() {
        let source = r#"
            fun makeCounter() {
              var i = 0;
              fun inc() { i = i + 1; return i; }
              return inc;
            }
            var c = makeCounter();
            print c();
            print c();
            var d = makeCounter();
            print d();
        "#;
        assert_eq!(lines(source), vec!["1", "2", "1"]);
    }

    #[test]
    fn test_interpreter_10_closures_share_captured_variables() {
        let source = r#"
            var get;
            var set;
            {
              var x = 1;
              fun g() { return x; }
              fun s(v) { x = v; }
              get = g;
              set = s;
            }
            set(5);
            print get();
        "#;
        assert_eq!(lines(source), vec!["5"]);
    }

    #[test]
    fn test_interpreter_11_for_continue_runs_increment() {
        let source = r#"
            for (var i = 0; i < 5; i = i + 1) {
              if (i == 2) continue;
              if (i == 4) break;
              print i;
            }
        "#;
        assert_eq!(lines(source), vec!["0", "1", "3"]);
    }

    #[test]
    fn test_interpreter_12_while_break_and_continue() {
        let source = r#"
            var i = 0;
            while (true) {
              i = i + 1;
              if (i % 2 == 0) continue;
              if (i > 5) break;
              print i;
            }
            print i;
        "#;
        assert_eq!(lines(source), vec!["1", "3", "5", "7"]);
    }

    #[test]
    fn test_interpreter_13_infinite_loops_hit_the_iteration_limit() {
        let config = Config {
            max_loop_iterations: Some(100),
            ..test_config()
        };

        for source in ["for (;;) {}", "while (true) {}"] {
            match run_with(config.clone(), source) {
                Err(LoxError::Runtime(RuntimeError::IterationLimit { limit, .. })) => {
                    assert_eq!(limit, 100)
                }
                other => panic!("{}: expected an iteration limit, got {:?}", source, other.err()),
            }
        }

        // A loop under the limit is unaffected.
        let output = run_with(config, "var n = 0; while (n < 100) n = n + 1; print n;").unwrap();
        assert_eq!(output, "100\n");
    }

    #[test]
    fn test_interpreter_14_arity_is_checked() {
        let err = runtime_error("fun f(a, b) {}\nf(1);");
        assert!(matches!(
            err,
            RuntimeError::Arity {
                expected: Arity {
                    required: 2,
                    variadic: false
                },
                got: 1,
                ..
            }
        ));
        assert_eq!(err.to_string(), "Expected 2 arguments but got 1.\n[line 2]");

        let err = runtime_error("fun f(a, b) {} f(1, 2, 3);");
        assert_eq!(err.to_string(), "Expected 2 arguments but got 3.\n[line 1]");
    }

    #[test]
    fn test_interpreter_15_variadic_parameters() {
        let source = r#"
            fun f(a, ...rest) { print a; print rest; print rest.count; }
            f(1);
            f(1, 2, "three");
        "#;
        assert_eq!(
            lines(source),
            vec!["1", "[]", "0", "1", "[2, \"three\"]", "2"]
        );

        let err = runtime_error("fun f(a, ...rest) {} f();");
        assert_eq!(err.to_string(), "Expected at least 1 arguments but got 0.\n[line 1]");
    }

    #[test]
    fn test_interpreter_16_splat_expands_lists() {
        let source = r#"
            var xs = [1, 2];
            fun add(a, b) { return a + b; }
            print add(...xs);
            print [0, ...xs, 3];
            fun count(...all) { return all.count; }
            print count(...xs, ...xs);
        "#;
        assert_eq!(lines(source), vec!["3", "[0, 1, 2, 3]", "4"]);

        // Arity is checked on the expanded arguments.
        let err = runtime_error("fun add(a, b) {} add(...[1, 2, 3]);");
        assert!(matches!(err, RuntimeError::Arity { got: 3, .. }));

        let err = runtime_error("fun f(...a) {} f(...1);");
        assert_eq!(err.to_string(), "Can only spread a list, not int.\n[line 1]");
    }

    #[test]
    fn test_interpreter_17_recursion_and_return() {
        let source = r#"
            fun fib(n) {
              if (n < 2) return n;
              return fib(n - 1) + fib(n - 2);
            }
            print fib(15);

            fun firstOver(limit) {
              for (var i = 0; ; i = i + 1) {
                while (true) {
                  if (i * i > limit) return i;
                  break;
                }
              }
            }
            print firstOver(50);

            fun nothing() {}
            print nothing();
        "#;
        assert_eq!(lines(source), vec!["610", "8", "nil"]);
    }

    #[test]
    fn test_interpreter_18_call_depth_limit() {
        let config = Config {
            max_call_depth: 50,
            ..test_config()
        };
        let result = run_with(config, "fun down(n) { return down(n + 1); }\ndown(0);");

        assert!(matches!(
            result,
            Err(LoxError::Runtime(RuntimeError::StackOverflow { .. }))
        ));
    }

    #[test]
    fn test_interpreter_19_deep_recursion_within_the_limit() {
        let source = r#"
            fun depth(n) {
              if (n == 0) return 0;
              return 1 + depth(n - 1);
            }
            print depth(1000);
        "#;
        assert_eq!(lines(source), vec!["1000"]);
    }

    #[test]
    fn test_interpreter_20_lambdas() {
        let source = r#"
            var square = fun (x) { return x * x; };
            print square(4);
            print square;
            fun named() {}
            print named;
            print clock;
            fun apply(f, v) { return f(v); }
            print apply(fun (n) { return n + 1; }, 41);
        "#;
        assert_eq!(
            lines(source),
            vec!["16", "<fn>", "<fn named>", "<native fn clock>", "42"]
        );
    }

    #[test]
    fn test_interpreter_21_switch_selects_one_arm() {
        let source = r#"
            fun describe(x) {
              switch (x) {
                case 1, 2:
                  return "small";
                case 3:
                  print "three";
                  break;
                  print "unreachable";
                default:
                  return "other";
              }
              return "after";
            }
            print describe(2);
            print describe(3);
            print describe(9);

            switch ("b") {
              case "a": print "A";
              case "b": print "B";
              case "c": print "C";
            }
        "#;
        assert_eq!(
            lines(source),
            vec!["small", "three", "after", "other", "B"]
        );
    }

    #[test]
    fn test_interpreter_22_continue_passes_through_switch() {
        let source = r#"
            for (var i = 0; i < 4; i = i + 1) {
              switch (i) {
                case 1: continue;
                case 2: break;
              }
              print i;
            }
        "#;
        assert_eq!(lines(source), vec!["0", "2", "3"]);
    }

    #[test]
    fn test_interpreter_23_switch_arms_have_their_own_scope() {
        let source = r#"
            var x = "outer";
            switch (1) {
              case 1:
                var x = "arm";
                print x;
            }
            print x;
        "#;
        assert_eq!(lines(source), vec!["arm", "outer"]);
    }

    #[test]
    fn test_interpreter_24_runtime_error_messages() {
        assert_eq!(
            runtime_error("print nope;").to_string(),
            "Undefined variable 'nope'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("nope = 1;").to_string(),
            "Undefined variable 'nope'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("\"text\"();").to_string(),
            "Can only call functions and classes.\n[line 1]"
        );
    }

    #[test]
    fn test_interpreter_25_output_before_an_error_is_kept() {
        let (output, err) = run_err("print 1;\nprint 2;\nprint nope;");

        assert_eq!(output, "1\n2\n");
        assert_eq!(err.exit_code(), 70);
    }

    #[test]
    fn test_interpreter_26_static_errors_run_nothing() {
        let (output, err) = run_err("print 1;\nreturn;");

        assert_eq!(output, "");
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn test_interpreter_27_conversions() {
        let source = r#"
            print str(1) + "x";
            print int("42") + 1;
            print int(3.9);
            print double(2);
            print double("2.5");
            print str([1, "a"]);
        "#;
        assert_eq!(
            lines(source),
            vec!["1x", "43", "3", "2.0", "2.5", "[1, \"a\"]"]
        );

        let err = runtime_error("int(\"abc\");");
        assert_eq!(err.to_string(), "Can't convert \"abc\" to int.\n[line 1]");
    }

    #[test]
    fn test_interpreter_28_read_line() {
        let (mut session, output) = session_with(test_config(), "alice\r\nbob\n");
        session
            .run("print readLine(); print readLine(); print readLine();")
            .unwrap();

        assert_eq!(output.contents(), "alice\nbob\nnil\n");
    }

    #[test]
    fn test_interpreter_29_random_is_seeded() {
        let source = r#"
            var r = random();
            print r >= 0 and r < 1;
            print randomInt(3, 3);
            var n = randomInt(1, 6);
            print n >= 1 and n <= 6;
            print random();
        "#;

        let first = run(source).unwrap();
        let second = run(source).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("true\n3\ntrue\n"));

        let err = runtime_error("randomInt(6, 1);");
        assert!(matches!(err, RuntimeError::Native { .. }));
    }

    #[test]
    fn test_interpreter_30_clock_advances() {
        assert_eq!(
            lines("var a = clock(); var b = clock(); print a > 0; print b >= a;"),
            vec!["true", "true"]
        );
    }

    #[test]
    fn test_interpreter_31_repl_input_keeps_globals() {
        let (mut session, output) = session_with(test_config(), "");

        assert!(matches!(session.run_repl_input("var a = 2;"), Ok(None)));
        assert!(matches!(session.run_repl_input("a * 3"), Ok(Some(Value::Int(6)))));

        // A failed entry leaves earlier definitions intact.
        assert!(session.run_repl_input("print nope;").is_err());
        assert!(matches!(
            session.run_repl_input("print a; a"),
            Ok(Some(Value::Int(2)))
        ));
        assert_eq!(output.contents(), "2\n");

        assert!(matches!(session.interpreter().global("a"), Some(Value::Int(2))));
    }

    #[test]
    fn test_interpreter_32_host_built_values() {
        let (mut session, _) = session_with(test_config(), "");
        session.run("var answer = 42;").unwrap();

        let interpreter = session.interpreter();
        let list = interpreter.new_list(vec![Value::Int(1), interpreter.new_string("a")]);
        assert_eq!(list.to_string(), "[1, \"a\"]");
        assert!(interpreter.new_string("a").equals(&Value::from("a")));

        let names = interpreter.global_names();
        assert!(names.contains(&"answer".to_string()));
        assert!(names.contains(&"clock".to_string()));
        assert!(names.contains(&"List".to_string()));
    }

    #[test]
    fn test_interpreter_33_without_prelude() {
        let config = Config {
            prelude: false,
            ..test_config()
        };

        assert_eq!(run_with(config.clone(), "print [1].count;").unwrap(), "1\n");

        let result = run_with(config, "[1].append(2);");
        assert!(matches!(
            result,
            Err(LoxError::Runtime(RuntimeError::UndefinedProperty { .. }))
        ));
    }
}
