#[cfg(test)]
mod class_tests {
    use rox::error::{LoxError, RuntimeError};
    use rox::run_source;

    fn run(source: &str) -> String {
        let mut out = Vec::new();
        if let Err(e) = run_source(source, &mut out) {
            panic!("program failed: {}", e);
        }
        String::from_utf8(out).unwrap()
    }

    fn runtime_err(source: &str) -> RuntimeError {
        let mut out = Vec::new();
        match run_source(source, &mut out) {
            Err(LoxError::Runtime(e)) => e,
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_class_and_instance_display() {
        assert_eq!(run("class Bagel {} print Bagel; print Bagel();"), "Bagel\nBagel instance\n");
    }

    #[test]
    fn test_fields_and_methods() {
        let source = "
            class Cake {
                taste() {
                    var adjective = \"delicious\";
                    print \"The \" + this.flavor + \" cake is \" + adjective + \"!\";
                }
            }
            var cake = Cake();
            cake.flavor = \"German chocolate\";
            cake.taste();
        ";

        assert_eq!(run(source), "The German chocolate cake is delicious!\n");
    }

    #[test]
    fn test_bound_method_remembers_its_instance() {
        let source = "
            class Person {
                init(name) { this.name = name; }
                greet() { print \"hi \" + this.name; }
            }
            var greet = Person(\"ada\").greet;
            greet();
        ";

        assert_eq!(run(source), "hi ada\n");
    }

    #[test]
    fn test_init_returns_the_instance() {
        let source = "
            class Foo {
                init(x) { this.x = x; return; }
            }
            var foo = Foo(1);
            print foo.init(2) == foo;
            print foo.x;
        ";

        assert_eq!(run(source), "true\n2\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = "
            class A { m() { return \"method\"; } }
            var a = A();
            print a.m();
            a.m = \"field\";
            print a.m;
        ";

        assert_eq!(run(source), "method\nfield\n");
    }

    #[test]
    fn test_inheritance_and_overriding() {
        let source = "
            class Doughnut {
                cook() { print \"Fry until golden brown.\"; }
                glaze() { print \"Glazed.\"; }
            }
            class BostonCream < Doughnut {
                cook() {
                    super.cook();
                    print \"Pipe full of custard.\";
                }
            }
            var d = BostonCream();
            d.cook();
            d.glaze();
        ";

        assert_eq!(
            run(source),
            "Fry until golden brown.\nPipe full of custard.\nGlazed.\n"
        );
    }

    #[test]
    fn test_super_is_resolved_statically() {
        let source = "
            class A { method() { print \"A method\"; } }
            class B < A {
                method() { print \"B method\"; }
                test() { super.method(); }
            }
            class C < B {}
            C().test();
        ";

        assert_eq!(run(source), "A method\n");
    }

    #[test]
    fn test_inherited_initializer_sets_arity() {
        let source = "
            class A { init(a, b) { this.sum = a + b; } }
            class B < A {}
            print B(1, 2).sum;
        ";

        assert_eq!(run(source), "3\n");
        assert!(matches!(
            runtime_err("class A { init(a) {} } A();"),
            RuntimeError::ArityMismatch {
                expected: 1,
                got: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_class_runtime_errors() {
        assert!(matches!(
            runtime_err("var NotClass = 1; class A < NotClass {}"),
            RuntimeError::SuperclassNotClass { .. }
        ));
        assert!(matches!(
            runtime_err("class A {} print A().missing;"),
            RuntimeError::UndefinedProperty { ref name, .. } if name == "missing"
        ));
        assert!(matches!(
            runtime_err("var x = 1; print x.y;"),
            RuntimeError::PropertyOnNonInstance { .. }
        ));
        assert!(matches!(
            runtime_err("var x = 1; x.y = 2;"),
            RuntimeError::FieldOnNonInstance { .. }
        ));
        assert!(matches!(
            runtime_err("class A {} class B < A { m() { return super.nope; } } B().m();"),
            RuntimeError::UndefinedProperty { ref name, .. } if name == "nope"
        ));
    }
}
