use shrike::{
    conflicts::ConflictError,
    driver::{ParseError, Parser, Step},
    grammar::Grammar,
};
use std::{env, path::PathBuf};

fn grammar_path(name: &str) -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap()).join(format!("tests/{}.grammar", name))
}

macro_rules! define_tests {
    ($($name:ident),*$(,)?) => {$(
        #[test]
        fn $name() {
            let grammar = Grammar::from_file(grammar_path(stringify!($name))).unwrap();
            let automaton = shrike::compile(&grammar).unwrap();
            assert!(automaton.nodes().any(|node| node.is_accept()));
        }
    )*};
}

define_tests! {
    function,
    recursive,
    program,
    arithmetic,
}

#[test]
fn ambiguous() {
    let grammar = Grammar::from_file(grammar_path("ambiguous")).unwrap();
    match shrike::compile(&grammar) {
        Err(ConflictError::ShiftReduce { terminal, .. }) => assert_eq!(terminal, "'+'"),
        Err(err) => panic!("unexpected error: {}", err),
        Ok(..) => panic!("the conflict was not detected"),
    }
}

#[test]
fn missing_grammar_file() {
    assert!(Grammar::from_file(grammar_path("missing")).is_err());
}

#[test]
fn state_count_is_stable() {
    let grammar = Grammar::from_file(grammar_path("program")).unwrap();
    let first = shrike::compile(&grammar).unwrap();
    let second = shrike::compile(&grammar).unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(
        first.display(&grammar).to_string(),
        second.display(&grammar).to_string()
    );
}

#[test]
fn parse_single_function() {
    let grammar = Grammar::from_file(grammar_path("function")).unwrap();
    let automaton = shrike::compile(&grammar).unwrap();
    let parser = Parser::new(&grammar, &automaton);

    let outcome = parser.parse("fn foo { return 1; }").unwrap();
    assert_eq!(outcome.shifted, 3);
    assert!(automaton.node(outcome.accept).is_accept());

    match parser.parse("foo { }") {
        Err(ParseError::NoAction { node, symbol }) => {
            assert_eq!(node, automaton.start());
            assert_eq!(symbol, "identifier");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn parse_program() {
    let grammar = Grammar::from_file(grammar_path("program")).unwrap();
    let automaton = shrike::compile(&grammar).unwrap();
    let parser = Parser::new(&grammar, &automaton);

    let input = r#"
fn add(a: int, b: int) -> int {
    return a + b;
}

fn main() {
    print("{}", add(1, 2));
}
"#;
    let outcome = parser.parse(input).unwrap();
    assert_eq!(outcome.shifted, 19);
    assert!(matches!(outcome.trace.last(), Some(Step::Accept { .. })));

    // every goto follows a reduction.
    let reduces = outcome
        .trace
        .iter()
        .filter(|step| matches!(step, Step::Reduce { .. }))
        .count();
    let gotos = outcome
        .trace
        .iter()
        .filter(|step| matches!(step, Step::Goto { .. }))
        .count();
    assert_eq!(reduces, gotos);

    assert!(matches!(
        parser.parse("fn f(a: int,) { }"),
        Err(ParseError::NoAction { symbol, .. }) if symbol == ")"
    ));
    assert!(matches!(
        parser.parse("fn f() -> { }"),
        Err(ParseError::NoAction { symbol, .. }) if symbol == "statements"
    ));
    assert!(matches!(
        parser.parse("fn f()"),
        Err(ParseError::Incomplete { .. })
    ));
}
