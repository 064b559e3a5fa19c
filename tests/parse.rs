//! End-to-end parsing tests through the public API.
//!
//! These cover grammar decisions that span several parser modules: cover
//! grammars, automatic semicolon insertion, strictness and Annex B.

use ecmaparse::{parse, parse_module, parse_script, ErrorKind, Options, Program};

fn next() -> Options {
    Options::script().with_next()
}

fn strict(source: &str) -> Result<Program, ecmaparse::ParseError> {
    let options = Options {
        force_strict_mode: true,
        ..Options::script()
    };
    parse(source, &options)
}

fn kind_of(source: &str, options: &Options) -> ErrorKind {
    match parse(source, options) {
        Ok(_) => panic!("expected {source:?} to be rejected"),
        Err(e) => e.kind,
    }
}

#[test]
fn test_parenthesized_cover_grammar() {
    for source in ["(a, b) => a", "(a, b)", "(a = b) => a", "(a = b)", "({a, b}) => a", "([a]) => a"] {
        assert!(parse_script(source).is_ok(), "{source}");
    }
    assert!(parse_script("({a = 1})").is_err());
    assert!(parse_script("({a = 1}) => a").is_ok());
    assert!(parse_script("({a = 1} = {})").is_ok());
    assert!(parse_script("(a, b) = 1").is_err());
    assert!(parse_script("(1) => 1").is_err());
    assert!(parse_script("() => {}\n()").is_err());
}

#[test]
fn test_async_arrow_forms() {
    assert!(parse_script("async x => x").is_ok());
    assert!(parse_script("async (x, y) => x + y").is_ok());
    assert!(parse_script("async ()").is_ok());
    assert!(parse_script("async\n(x) => x").is_err());
    assert_eq!(kind_of("async (a, a) => {}", &Options::script()), ErrorKind::Early);
    assert_eq!(kind_of("(a, a) => {}", &Options::script()), ErrorKind::Early);
    assert!(parse_script("function f(a, a) {}").is_ok());
}

#[test]
fn test_annex_b_if_function() {
    let source = "if (true) function f() {} else function _f() {}";
    assert!(parse_script(source).is_ok());
    let err = parse_script(&format!("\"use strict\"; {source}")).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);

    let legacy_off = Options {
        disable_legacy_web_compatibility: true,
        ..Options::script()
    };
    assert!(parse(source, &legacy_off).is_err());
}

#[test]
fn test_nested_dynamic_import() {
    assert!(parse("import(import(import(\"foo\")))", &next()).is_ok());
    assert!(parse("import(\"foo\")", &Options::script()).is_err());
    assert!(parse("import(\"foo\",)", &next()).is_err());
}

#[test]
fn test_return_is_terminated_by_newline() {
    let options = Options {
        treat_top_level_return_as_valid: true,
        ..Options::script()
    };
    let program = parse("return\n42", &options).unwrap();
    assert_eq!(program.body.len(), 2);

    let program = parse_script("function f() { return\n42 }").unwrap();
    assert_eq!(program.body.len(), 1);

    assert_eq!(kind_of("return 1", &Options::script()), ErrorKind::Syntax);
}

#[test]
fn test_semicolon_insertion() {
    assert!(parse_script("a\nb").is_ok());
    assert!(parse_script("a b").is_err());
    assert!(parse_script("{ a } b").is_ok());
    assert!(parse_script("do x; while (y) z").is_ok());
    assert_eq!(parse_script("a\n++b").unwrap().body.len(), 2);
    assert!(parse_script("for (;;\n) {}").is_ok());
    assert!(parse_script("for (\n) {}").is_err());
}

#[test]
fn test_strict_mode_only_rejects_more() {
    let sources = [
        "var x = 1; x += 2;",
        "function f(a, b) { return a + b }",
        "label: for (;;) { break label; }",
        "class A { m() { return this } }",
        "let [a, ...b] = c;",
        "try { x() } catch ({ message }) { log(message) }",
        "switch (x) { case 1: break; default: }",
        "x = `a${b}c`;",
        "async function f() { for await (const x of y) {} }",
    ];
    for source in sources {
        assert!(strict(source).is_ok(), "strict: {source}");
        assert!(parse_script(source).is_ok(), "sloppy: {source}");
    }

    let sloppy_only = [
        "with (a) {}",
        "var let = 1;",
        "delete x;",
        "function f(a, a) {}",
        "var x = 010;",
        "eval = 1;",
        "var yield;",
    ];
    for source in sloppy_only {
        assert!(parse_script(source).is_ok(), "sloppy: {source}");
        assert!(strict(source).is_err(), "strict: {source}");
    }
}

#[test]
fn test_use_strict_directive() {
    assert!(parse_script("with (a) {}").is_ok());
    assert_eq!(kind_of("'use strict'; with (a) {}", &Options::script()), ErrorKind::Early);
    assert!(parse_script("'use\\x20strict'; with (a) {}").is_ok());
    assert!(parse_script("a; 'use strict'; with (a) {}").is_ok());
    assert!(parse_script("function f() { 'use strict'; with (a) {} }").is_err());
}

#[test]
fn test_error_categories() {
    let script = Options::script();
    assert_eq!(kind_of("'abc", &script), ErrorKind::Lexical);
    assert_eq!(kind_of("1 +", &script), ErrorKind::Syntax);
    assert_eq!(kind_of("let a; let a;", &script), ErrorKind::Early);
    assert_eq!(kind_of("break;", &script), ErrorKind::Early);
    assert_eq!(kind_of("a: a: ;", &script), ErrorKind::Early);
    assert_eq!(kind_of("1 = 2", &script), ErrorKind::Early);
    assert_eq!(kind_of("export {}", &script), ErrorKind::Syntax);
}

#[test]
fn test_error_positions() {
    let err = parse_script("var a = 1;\nvar b = ;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Syntax);
    assert_eq!(err.line, 2);
    assert_eq!(err.column, 8);
    assert_eq!(err.start, 19);
    assert!(err.to_string().starts_with("SyntaxError: "));
    assert!(err.to_string().ends_with("(2:8)"));
}

#[test]
fn test_lexical_declarations_conflict_with_var() {
    assert!(parse_script("var a; var a;").is_ok());
    assert!(parse_script("let a; var a;").is_err());
    assert!(parse_script("var a; let a;").is_err());
    assert!(parse_script("let a; { var a; }").is_err());
    assert!(parse_script("{ let a; } var a;").is_ok());
    assert!(parse_script("function a() {} var a;").is_ok());
    assert!(parse_script("try {} catch (e) { var e; }").is_ok());
    assert_eq!(kind_of("try {} catch (e) { for (var e of []); }", &Options::script()), ErrorKind::Early);
    assert!(parse_script("try {} catch (e) { let e; }").is_err());
    assert!(parse_script("{ function a() {} function a() {} }").is_ok());
    assert!(strict("{ function a() {} function a() {} }").is_err());
}

#[test]
fn test_module_goal() {
    assert!(parse_module("import a from 'a'; export default a;").is_ok());
    assert!(parse_module("await 1").is_err());
    assert!(parse("await 1", &Options::module().with_next()).is_ok());
    assert!(parse_module("with (a) {}").is_err());
    assert!(parse_module("<!-- comment").is_err());
    assert!(parse_script("<!-- comment").is_ok());
    assert!(parse_module("export { x }").is_err());
    assert!(parse_module("let x; export { x }").is_ok());
}

#[test]
fn test_parsing_is_deterministic() {
    let source = "class A extends B { static #x = 1; m() { return this.#x ?? a?.b(...c) } }";
    let first = parse(source, &next().with_locations()).unwrap();
    let second = parse(source, &next().with_locations()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_regex_and_division() {
    assert!(parse_script("a = b / c / d").is_ok());
    assert!(parse_script("a = /b/g.test(c)").is_ok());
    assert!(parse_script("x = a++ / 2").is_ok());
    assert!(parse_script("if (a) /b/.exec(c)").is_ok());
    assert!(parse_script("x = {} / 1").is_ok());
    assert_eq!(kind_of("a = /b/gg", &Options::script()), ErrorKind::Lexical);
}

#[test]
fn test_parsing_with_a_subscriber_installed() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::TRACE.into()),
        )
        .with_test_writer()
        .try_init();
    let source = "{ function f() {} } class C { #x; m() { return async (a) => this.#x } }";
    assert!(parse(source, &next()).is_ok());
}
