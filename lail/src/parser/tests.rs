//! Parser tests

use super::{Parser, parse};
use crate::ast::{Expr, InfixOp, PrefixOp, Program, Statement};
use crate::error::ParseError;
use crate::loader::MemoryLoader;
use pretty_assertions::assert_eq;

/// Helper to parse and expect success
fn parse_ok(source: &str) -> Program {
    match parse(source) {
        Ok(program) => program,
        Err(e) => panic!("parse of {source:?} failed:\n{e}"),
    }
}

/// Helper to parse and return the diagnostics
fn parse_errors(source: &str) -> Vec<ParseError> {
    let mut parser = Parser::new(source);
    parser.parse_program();
    parser.take_errors()
}

fn messages(source: &str) -> Vec<String> {
    parse_errors(source).iter().map(ToString::to_string).collect()
}

/// Canonical source text
fn canonical(source: &str) -> String {
    parse_ok(source).to_string()
}

fn single_expr(source: &str) -> Expr {
    let program = parse_ok(source);
    assert_eq!(program.statements.len(), 1, "{source}");
    match program.statements.into_iter().next() {
        Some(Statement::Expression(expr)) => expr.node,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

// ============================================
// Statements
// ============================================

#[test]
fn test_let_statements() {
    let program = parse_ok("let x = 5; let y = true; let foobar = y;");
    let names: Vec<_> = program
        .statements
        .iter()
        .map(|s| match s {
            Statement::Let { name, .. } => name.node.as_str(),
            other => panic!("expected let, got {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["x", "y", "foobar"]);
}

#[test]
fn test_let_value() {
    let program = parse_ok("let x = 5;");
    let Statement::Let { value, .. } = &program.statements[0] else {
        panic!("expected let");
    };
    assert_eq!(value.node, Expr::IntLit(5));
}

#[test]
fn test_return_statements() {
    let program = parse_ok("return 5; return x + y; return;");
    assert_eq!(program.statements.len(), 3);
    assert!(matches!(&program.statements[0], Statement::Return { value: Some(_) }));
    assert!(matches!(&program.statements[2], Statement::Return { value: None }));
    assert_eq!(program.to_string(), "return 5; return (x + y); return;");
}

#[test]
fn test_return_before_closing_brace() {
    assert_eq!(canonical("fn() { return }"), "fn() { return; };");
}

#[test]
fn test_semicolons_are_optional() {
    assert_eq!(parse_ok("let a = 1\nlet b = 2\na + b").statements.len(), 3);
    assert_eq!(parse_ok("let a = 1;;; a;;").statements.len(), 2);
}

// ============================================
// Expressions
// ============================================

#[test]
fn test_identifier_and_literals() {
    assert_eq!(single_expr("foobar;"), Expr::Ident("foobar".into()));
    assert_eq!(single_expr("5;"), Expr::IntLit(5));
    assert_eq!(single_expr("false"), Expr::BoolLit(false));
    assert_eq!(single_expr("\"hello\\nworld\""), Expr::StringLit("hello\nworld".into()));
}

#[test]
fn test_prefix_expressions() {
    for (source, expected_op, expected) in [
        ("!5;", PrefixOp::Not, Expr::IntLit(5)),
        ("-15;", PrefixOp::Neg, Expr::IntLit(15)),
        ("!true;", PrefixOp::Not, Expr::BoolLit(true)),
    ] {
        let Expr::Prefix { op, operand } = single_expr(source) else {
            panic!("expected prefix for {source}");
        };
        assert_eq!(op, expected_op);
        assert_eq!(operand.node, expected);
    }
}

#[test]
fn test_infix_expressions() {
    for (source, expected_op) in [
        ("5 + 5;", InfixOp::Add),
        ("5 - 5;", InfixOp::Sub),
        ("5 * 5;", InfixOp::Mul),
        ("5 / 5;", InfixOp::Div),
        ("5 > 5;", InfixOp::Gt),
        ("5 < 5;", InfixOp::Lt),
        ("5 >= 5;", InfixOp::Ge),
        ("5 <= 5;", InfixOp::Le),
        ("5 == 5;", InfixOp::Eq),
        ("5 != 5;", InfixOp::Ne),
    ] {
        let Expr::Infix { left, op, right } = single_expr(source) else {
            panic!("expected infix for {source}");
        };
        assert_eq!(op, expected_op, "{source}");
        assert_eq!(left.node, Expr::IntLit(5));
        assert_eq!(right.node, Expr::IntLit(5));
    }
}

#[test]
fn test_operator_precedence() {
    let cases = [
        ("-a * b", "((-a) * b);"),
        ("!-a", "(!(-a));"),
        ("a + b + c", "((a + b) + c);"),
        ("a + b - c", "((a + b) - c);"),
        ("a * b * c", "((a * b) * c);"),
        ("a * b / c", "((a * b) / c);"),
        ("a + b / c", "(a + (b / c));"),
        ("a + b * c + d / e - f", "(((a + (b * c)) + (d / e)) - f);"),
        ("3 + 4; -5 * 5", "(3 + 4); ((-5) * 5);"),
        ("5 > 4 == 3 < 4", "((5 > 4) == (3 < 4));"),
        ("a < b == c < d", "((a < b) == (c < d));"),
        ("5 <= 4 != 3 >= 4", "((5 <= 4) != (3 >= 4));"),
        ("3 + 4 * 5 == 3 * 1 + 4 * 5", "((3 + (4 * 5)) == ((3 * 1) + (4 * 5)));"),
        ("true == !false", "(true == (!false));"),
        ("1 + (2 + 3) + 4", "((1 + (2 + 3)) + 4);"),
        ("(5 + 5) * 2", "((5 + 5) * 2);"),
        ("-(5 + 5)", "(-(5 + 5));"),
        ("a + add(b * c) + d", "((a + add((b * c))) + d);"),
        (
            "add(a, b, 1, 2 * 3, 4 + 5, add(6, 7 * 8))",
            "add(a, b, 1, (2 * 3), (4 + 5), add(6, (7 * 8)));",
        ),
        ("add(a + b + c * d / f + g)", "add((((a + b) + ((c * d) / f)) + g));"),
    ];
    for (source, expected) in cases {
        assert_eq!(canonical(source), expected, "{source}");
    }
}

#[test]
fn test_assignment() {
    insta::assert_snapshot!(canonical("x = 1 + 2"), @"(x = (1 + 2));");
    insta::assert_snapshot!(canonical("x = y = 5"), @"(x = (y = 5));");
    insta::assert_snapshot!(canonical("x = a == b"), @"(x = (a == b));");
}

#[test]
fn test_assignment_requires_identifier() {
    let errors = messages("1 = 2;");
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].ends_with("Expected: Identifier as left hand side Found: 1"),
        "{}",
        errors[0]
    );
    assert_eq!(messages("a + b = 2;").len(), 1);
}

#[test]
fn test_member_call_sugar() {
    insta::assert_snapshot!(canonical("a.f(b)"), @"f(a, b);");
    insta::assert_snapshot!(canonical("a.f()"), @"f(a);");
    insta::assert_snapshot!(canonical("a.f().g(1)"), @"g(f(a), 1);");
    insta::assert_snapshot!(canonical("1 + a.f()"), @"(1 + f(a));");
    insta::assert_snapshot!(canonical("-a.f()"), @"(-f(a));");
    insta::assert_snapshot!(canonical("[1, 2].tail()"), @"tail([1, 2]);");
}

#[test]
fn test_member_call_is_a_call_with_receiver_first() {
    let program = parse_ok("abc.f(1, 2)");
    let Statement::Expression(expr) = &program.statements[0] else {
        panic!("expected expression statement");
    };
    assert_eq!(expr.span.start, 0);
    assert_eq!(expr.span.end, 11);
    let Expr::Call { callee, args } = &expr.node else {
        panic!("expected call, got {:?}", expr.node);
    };
    assert_eq!(callee.node, Expr::Ident("f".to_string()));
    let args: Vec<String> = args.iter().map(|a| a.node.to_string()).collect();
    assert_eq!(args, vec!["abc", "1", "2"]);
}

#[test]
fn test_member_call_requires_name_and_parens() {
    assert!(messages("a.5()")[0].contains("Expected: IDENT Found: 5"));
    assert!(messages("a.f;")[0].contains("Expected: ( Found: ;"));
}

#[test]
fn test_if_expression() {
    let Expr::If {
        cond,
        consequence,
        alternative,
    } = single_expr("if (x < y) { x }")
    else {
        panic!("expected if");
    };
    assert_eq!(cond.to_string(), "(x < y)");
    assert_eq!(consequence.statements.len(), 1);
    assert!(alternative.is_none());
}

#[test]
fn test_if_else_expression() {
    insta::assert_snapshot!(
        canonical("if (x < y) { x } else { y }"),
        @"if ((x < y)) { x; } else { y; };"
    );
}

#[test]
fn test_if_requires_parenthesised_condition() {
    assert!(messages("if x { 1 }")[0].contains("Expected: ( Found: x"));
}

#[test]
fn test_function_literal() {
    let Expr::Fn(lit) = single_expr("fn(x, y) { x + y; }") else {
        panic!("expected fn");
    };
    assert_eq!(lit.param_names(), vec!["x", "y"]);
    assert_eq!(lit.body.statements.len(), 1);
    assert_eq!(lit.name, None);
    assert_eq!(lit.body.to_string(), "{ (x + y); }");
}

#[test]
fn test_function_parameters() {
    for (source, expected) in [
        ("fn() {};", vec![]),
        ("fn(x) {};", vec!["x"]),
        ("fn(x, y, z) {};", vec!["x", "y", "z"]),
    ] {
        let Expr::Fn(lit) = single_expr(source) else {
            panic!("expected fn");
        };
        assert_eq!(lit.param_names(), expected);
    }
    assert!(messages("fn(1) {}")[0].contains("Expected: IDENT Found: 1"));
}

#[test]
fn test_function_name_inferred_from_binding() {
    let program = parse_ok("let add = fn(a, b) { a + b }; sub = fn() { 0 }; let g = add;");
    let Statement::Let { value, .. } = &program.statements[0] else {
        panic!("expected let");
    };
    let Expr::Fn(lit) = &value.node else {
        panic!("expected fn");
    };
    assert_eq!(lit.name.as_deref(), Some("add"));

    let Statement::Expression(expr) = &program.statements[1] else {
        panic!("expected expression");
    };
    let Expr::Assign { value, .. } = &expr.node else {
        panic!("expected assignment");
    };
    assert!(matches!(&value.node, Expr::Fn(lit) if lit.name.as_deref() == Some("sub")));
}

#[test]
fn test_call_expression() {
    let Expr::Call { callee, args } = single_expr("add(1, 2 * 3, 4 + 5);") else {
        panic!("expected call");
    };
    assert_eq!(callee.node, Expr::Ident("add".into()));
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    assert_eq!(args, vec!["1", "(2 * 3)", "(4 + 5)"]);
}

#[test]
fn test_array_literal() {
    assert_eq!(canonical("[1, 2 * 2, 3 + 3]"), "[1, (2 * 2), (3 + 3)];");
    assert_eq!(single_expr("[]"), Expr::Array(vec![]));
    assert!(messages("[1, 2")[0].contains("Expected: ] Found: EOF"));
}

#[test]
fn test_string_is_reescaped() {
    insta::assert_snapshot!(canonical(r#"let s = "a\"b\tc";"#), @r#"let s = "a\"b\tc";"#);
}

// ============================================
// Bare blocks
// ============================================

fn parse_bare(source: &str) -> Program {
    let mut parser = Parser::new(source).bare_blocks(true);
    let program = parser.parse_program();
    assert!(parser.errors().is_empty(), "{:?}", parser.errors());
    program
}

#[test]
fn test_bare_blocks_disabled_by_default() {
    assert!(messages("if (x) 1 else 2")[0].contains("Expected: { Found: 1"));
}

#[test]
fn test_bare_blocks() {
    assert_eq!(
        parse_bare("if (x) 1 else 2").to_string(),
        "if (x) { 1; } else { 2; };"
    );
    assert_eq!(parse_bare("let f = fn(a) a * 2;").to_string(), "let f = fn(a) { (a * 2); };");
}

#[test]
fn test_bare_block_else_binds_to_nearest_if() {
    let program = parse_bare("if (a) if (b) 1 else 2");
    let Statement::Expression(expr) = &program.statements[0] else {
        panic!("expected expression");
    };
    let Expr::If {
        consequence,
        alternative,
        ..
    } = &expr.node
    else {
        panic!("expected if");
    };
    assert!(alternative.is_none());
    assert_eq!(consequence.to_string(), "{ if (b) { 1; } else { 2; }; }");
}

// ============================================
// Diagnostics
// ============================================

#[test]
fn test_expected_token_message() {
    let errors = messages("let = 5;");
    assert_eq!(errors, vec!["Parsing error. At (1:5) Expected: IDENT Found: ="]);
}

#[test]
fn test_error_position_on_later_line() {
    let errors = parse_errors("let x = 1;\n  let = 2;");
    assert_eq!(errors.len(), 1);
    assert_eq!((errors[0].line, errors[0].column), (2, 7));
}

#[test]
fn test_multiple_diagnostics_collected() {
    let mut parser = Parser::new("let = 1; let y 2; let z = 3;");
    let program = parser.parse_program();
    let errors: Vec<String> = parser.errors().iter().map(|e| e.message.clone()).collect();
    assert_eq!(errors, vec!["Expected: IDENT Found: =", "Expected: = Found: 2"]);
    assert_eq!(program.to_string(), "let z = 3;");
}

#[test]
fn test_no_prefix_rule() {
    let errors = messages(")");
    assert_eq!(errors, vec!["Parsing error. At (1:1) no prefix parse function for ) found"]);
}

#[test]
fn test_illegal_token_reported() {
    let errors = messages("let x = @;");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Illegal token @"));
}

#[test]
fn test_integer_overflow_reported() {
    let errors = messages("99999999999999999999");
    assert_eq!(
        errors,
        vec!["Parsing error. At (1:1) could not parse \"99999999999999999999\" as integer"]
    );
}

#[test]
fn test_unclosed_block() {
    let errors = messages("if (x) { 1");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Expected: } Found: EOF"));
}

#[test]
fn test_error_inside_block_reported_once() {
    assert_eq!(messages("fn() { 1 + }").len(), 1);
    let mut parser = Parser::new("let f = fn() { let = 1; 2 }; f");
    let program = parser.parse_program();
    assert_eq!(parser.errors().len(), 1);
    assert_eq!(program.statements.len(), 2);
}

#[test]
fn test_parse_returns_compile_error() {
    let err = parse("let = ;").unwrap_err();
    assert!(!err.parse_errors().is_empty());
}

// ============================================
// Imports
// ============================================

fn parse_with_files(source: &str, loader: &MemoryLoader) -> (Program, Vec<ParseError>) {
    let mut parser = Parser::with_loader(source, loader);
    let program = parser.parse_program();
    (program, parser.take_errors())
}

#[test]
fn test_import_embeds_program() {
    let loader = MemoryLoader::new().with_file("lib.lail", "let x = 1;");
    let (program, errors) = parse_with_files("import \"lib.lail\"; x", &loader);
    assert!(errors.is_empty());
    let Statement::Import(import) = &program.statements[0] else {
        panic!("expected import");
    };
    assert_eq!(import.path.node, "lib.lail");
    assert_eq!(import.program.to_string(), "let x = 1;");
    assert_eq!(program.to_string(), "import \"lib.lail\"; x;");
}

#[test]
fn test_missing_import_is_diagnostic() {
    let loader = MemoryLoader::new();
    let (_, errors) = parse_with_files("let a = 1;\nimport \"nope.lail\";", &loader);
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "Parsing error. At (2:8) Unable to locate and read file at nope.lail"
    );
}

#[test]
fn test_import_requires_string() {
    assert!(messages("import lib;")[0].contains("Expected: STRING Found: lib"));
}

#[test]
fn test_import_errors_carry_origin() {
    let loader = MemoryLoader::new().with_file("bad.lail", "let = 1;");
    let (_, errors) = parse_with_files("import \"bad.lail\";", &loader);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].origin.as_deref(), Some("bad.lail"));
    assert!(errors[0].to_string().starts_with("bad.lail: Parsing error. At (1:5)"));
}

#[test]
fn test_nested_import() {
    let loader = MemoryLoader::new()
        .with_file("a", "import \"b\"; let a = b + 1;")
        .with_file("b", "let b = 1;");
    let (program, errors) = parse_with_files("import \"a\";", &loader);
    assert!(errors.is_empty());
    assert_eq!(program.to_string(), "import \"a\";");
    let Statement::Import(outer) = &program.statements[0] else {
        panic!("expected import");
    };
    assert_eq!(outer.program.to_string(), "import \"b\"; let a = (b + 1);");
}

#[test]
fn test_import_cycle_detected() {
    let loader = MemoryLoader::new()
        .with_file("a", "import \"b\";")
        .with_file("b", "import \"a\";");
    let (_, errors) = parse_with_files("import \"a\";", &loader);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Import cycle detected at a"));
    assert_eq!(errors[0].origin.as_deref(), Some("b"));
}

#[test]
fn test_import_depth_limited() {
    let loader = MemoryLoader::new()
        .with_file("a", "import \"b\";")
        .with_file("b", "let b = 1;");
    let mut parser = Parser::with_loader("import \"a\";", &loader).max_import_depth(1);
    parser.parse_program();
    assert_eq!(parser.errors().len(), 1);
    assert!(parser.errors()[0].message.contains("Import depth exceeds 1"));
}

// ============================================
// Canonical form
// ============================================

#[test]
fn test_canonical_text_reparses_identically() {
    let sources = [
        "let adder = fn(x) { fn(y) { x + y } }; let addFive = adder(5); addFive(3);",
        "if (a < b == c) { out(\"x\\n\") } else { [1, -2, !3] }",
        "let f = fn(n) { if (n < 2) { return n; } f(n - 1) + f(n - 2) }; f(10)",
        "x = y = 1 + 2 * 3; [1, 2].tail().head()",
        "return;",
    ];
    for source in sources {
        let first = canonical(source);
        let second = canonical(&first);
        assert_eq!(first, second, "{source}");
    }
}

#[test]
fn test_canonical_import_reparses_to_import() {
    let loader = MemoryLoader::new().with_file("lib", "return 1; 2");
    let (program, errors) = parse_with_files("import \"lib\"; 5", &loader);
    assert!(errors.is_empty());
    let text = program.to_string();
    assert_eq!(text, "import \"lib\"; 5;");

    let (reparsed, errors) = parse_with_files(&text, &loader);
    assert!(errors.is_empty());
    assert_eq!(reparsed.to_string(), text);
    assert!(matches!(&reparsed.statements[0], Statement::Import(import) if import.program.to_string() == "return 1; 2;"));
}

#[test]
fn test_deeply_nested_prefix_operators() {
    let source = format!("{}1", "-".repeat(10_000));
    let program = parse_ok(&source);
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn test_deeply_nested_blocks() {
    let depth = 2_000;
    let source = format!("{}1{}", "if (true) { ".repeat(depth), " }".repeat(depth));
    let program = parse_ok(&source);
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn test_ast_serializes_to_json() {
    let program = parse_ok("let x = [1, \"a\"];");
    let json = serde_json::to_string(&program).unwrap();
    assert!(json.contains("IntLit"));
    assert!(json.contains("StringLit"));
}
