//! ESTree JSON shape of parsed programs.

use ecmaparse::{parse, parse_module, parse_script, Options};
use serde_json::{json, Value};

fn to_json(source: &str, options: &Options) -> Value {
    let program = parse(source, options).unwrap();
    serde_json::to_value(&program).unwrap()
}

fn first_expression(source: &str, options: &Options) -> Value {
    to_json(source, options)["body"][0]["expression"].clone()
}

/// Checks that every child node lies within its parent, and that siblings in
/// a list appear in source order without overlapping.
fn assert_spans_nest(node: &Value, parent: Option<(u64, u64)>) {
    match node {
        Value::Object(map) => {
            let span = match (map.get("start"), map.get("end")) {
                (Some(Value::Number(s)), Some(Value::Number(e))) if map.contains_key("type") => {
                    let (s, e) = (s.as_u64().unwrap(), e.as_u64().unwrap());
                    assert!(s <= e, "inverted span in {node}");
                    if let Some((ps, pe)) = parent {
                        assert!(ps <= s && e <= pe, "{s}..{e} escapes {ps}..{pe}");
                    }
                    Some((s, e))
                }
                _ => parent,
            };
            for (key, child) in map {
                if key != "loc" {
                    assert_spans_nest(child, span);
                }
            }
        }
        Value::Array(items) => {
            let mut last_end = 0;
            for item in items {
                if let Some(start) = item.get("start").and_then(Value::as_u64) {
                    assert!(start >= last_end, "siblings overlap at {start}");
                    last_end = item["end"].as_u64().unwrap();
                }
                assert_spans_nest(item, parent);
            }
        }
        _ => {}
    }
}

#[test]
fn test_program_shape() {
    let actual = to_json("a + 1;", &Options::script());
    let expected = json!({
        "type": "Program",
        "start": 0,
        "end": 6,
        "body": [{
            "type": "ExpressionStatement",
            "start": 0,
            "end": 6,
            "expression": {
                "type": "BinaryExpression",
                "start": 0,
                "end": 5,
                "left": { "type": "Identifier", "start": 0, "end": 1, "name": "a" },
                "operator": "+",
                "right": { "type": "Literal", "start": 4, "end": 5, "value": 1, "raw": "1" }
            }
        }],
        "sourceType": "script"
    });
    assert_eq!(actual, expected);
}

#[test]
fn test_variable_declaration_shape() {
    let actual = to_json("let x = null;", &Options::script());
    assert_eq!(
        actual["body"][0],
        json!({
            "type": "VariableDeclaration",
            "start": 0,
            "end": 13,
            "declarations": [{
                "type": "VariableDeclarator",
                "start": 4,
                "end": 12,
                "id": { "type": "Identifier", "start": 4, "end": 5, "name": "x" },
                "init": { "type": "Literal", "start": 8, "end": 12, "value": null, "raw": "null" }
            }],
            "kind": "let"
        })
    );
}

#[test]
fn test_literal_values() {
    let script = Options::script();
    assert_eq!(first_expression("1.5", &script)["value"], json!(1.5));
    assert_eq!(first_expression("0x10", &script)["value"], json!(16));
    assert_eq!(first_expression("'a\\tb'", &script)["value"], json!("a\tb"));
    assert_eq!(first_expression("'a\\tb'", &script)["raw"], json!("'a\\tb'"));
    assert_eq!(first_expression("true", &script)["value"], json!(true));

    let regex = first_expression("/ab+/gi", &script);
    assert_eq!(regex["value"], Value::Null);
    assert_eq!(regex["regex"], json!({ "pattern": "ab+", "flags": "gi" }));

    let bigint = first_expression("10n", &script);
    assert_eq!(bigint["value"], Value::Null);
    assert_eq!(bigint["bigint"], json!("10"));
    assert_eq!(bigint["raw"], json!("10n"));
}

#[test]
fn test_directives() {
    let actual = to_json("'use strict'; 'other'\nx", &Options::script());
    assert_eq!(actual["body"][0]["directive"], json!("use strict"));
    assert_eq!(actual["body"][1]["directive"], json!("other"));
    assert!(actual["body"][2].get("directive").is_none());
}

#[test]
fn test_optional_chain_shape() {
    let actual = first_expression("a?.b", &Options::script().with_next());
    assert_eq!(
        actual,
        json!({
            "type": "ChainExpression",
            "start": 0,
            "end": 4,
            "expression": {
                "type": "MemberExpression",
                "start": 0,
                "end": 4,
                "object": { "type": "Identifier", "start": 0, "end": 1, "name": "a" },
                "property": { "type": "Identifier", "start": 3, "end": 4, "name": "b" },
                "computed": false,
                "optional": true
            }
        })
    );
}

#[test]
fn test_arrow_shape() {
    let actual = first_expression("async x => x", &Options::script());
    assert_eq!(actual["type"], json!("ArrowFunctionExpression"));
    assert_eq!(actual["async"], json!(true));
    assert_eq!(actual["expression"], json!(true));
    assert_eq!(actual["generator"], json!(false));
    assert_eq!(actual["params"][0]["name"], json!("x"));
    assert_eq!(actual["body"]["type"], json!("Identifier"));
}

#[test]
fn test_cover_grammar_results() {
    let script = Options::script();
    assert_eq!(first_expression("(a, b)", &script)["type"], json!("SequenceExpression"));
    assert_eq!(
        first_expression("(a = b) => a", &script)["params"][0]["type"],
        json!("AssignmentPattern")
    );
    assert_eq!(first_expression("(a = b)", &script)["type"], json!("AssignmentExpression"));
    assert_eq!(
        first_expression("[a, ...b] = c", &script)["left"]["elements"][1]["type"],
        json!("RestElement")
    );
    assert_eq!(
        first_expression("({ a: b.c } = d)", &script)["left"]["properties"][0]["value"]["type"],
        json!("MemberExpression")
    );
}

#[test]
fn test_template_elements() {
    let actual = first_expression("`a${b}c`", &Options::script());
    assert_eq!(actual["quasis"][0]["value"], json!({ "raw": "a", "cooked": "a" }));
    assert_eq!(actual["quasis"][0]["start"], json!(1));
    assert_eq!(actual["quasis"][0]["end"], json!(2));
    assert_eq!(actual["quasis"][1]["tail"], json!(true));

    let tagged = first_expression("tag`\\unicode`", &Options::script());
    assert_eq!(tagged["quasi"]["quasis"][0]["value"]["cooked"], Value::Null);
    assert_eq!(tagged["quasi"]["quasis"][0]["value"]["raw"], json!("\\unicode"));
}

#[test]
fn test_locations() {
    let actual = to_json("a\n  bé", &Options::script().with_locations());
    assert_eq!(actual["loc"]["start"], json!({ "line": 1, "column": 0 }));
    let b = &actual["body"][1]["expression"];
    assert_eq!(b["start"], json!(4));
    assert_eq!(b["end"], json!(7));
    assert_eq!(
        b["loc"],
        json!({ "start": { "line": 2, "column": 2 }, "end": { "line": 2, "column": 4 } })
    );

    let without = to_json("a", &Options::script());
    assert!(without.get("loc").is_none());
}

#[test]
fn test_module_shape() {
    let program = parse_module("import def, { a as b } from 'm'; export * as ns from 'n';").unwrap();
    let actual = serde_json::to_value(&program).unwrap();
    assert_eq!(actual["sourceType"], json!("module"));
    let import = &actual["body"][0];
    assert_eq!(import["specifiers"][0]["type"], json!("ImportDefaultSpecifier"));
    assert_eq!(import["specifiers"][1]["imported"]["name"], json!("a"));
    assert_eq!(import["specifiers"][1]["local"]["name"], json!("b"));
    assert_eq!(import["source"]["value"], json!("m"));
    let export = &actual["body"][1];
    assert_eq!(export["type"], json!("ExportAllDeclaration"));
    assert_eq!(export["exported"]["name"], json!("ns"));
}

#[test]
fn test_spans_nest_within_parents() {
    let sources = [
        "var { a, b: [c = 1, ...d] } = e; label: for (const x of y) { if (x) continue label; }",
        "class A extends (B, C) { static m() { return super.m?.() } get x() { return 1 } }",
        "async function* f(a, ...b) { yield* a; await b; for await (const x of b) ; }",
        "x = a ? (b, c) : `t${d}e${f`g`}h`; new Foo.Bar(...args)?.baz[qux]",
        "switch (a) { case 1: try { throw b } catch { } finally { } default: }",
    ];
    let options = Options::script().with_next().with_locations();
    for source in sources {
        assert_spans_nest(&to_json(source, &options), None);
    }
}

#[test]
fn test_options_from_json() {
    let options: Options = serde_json::from_str(
        r#"{ "sourceType": "module", "includeLocations": true, "allowNextSyntaxProposals": true }"#,
    )
    .unwrap();
    assert_eq!(options, Options::module().with_next().with_locations());

    let empty: Options = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, Options::script());
    assert!(parse_script("a").unwrap() == parse("a", &empty).unwrap());
}
