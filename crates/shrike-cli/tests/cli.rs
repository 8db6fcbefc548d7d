use std::{
    env,
    path::PathBuf,
    process::{Command, Output},
};

fn shrike(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shrike"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn grammar_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(format!("../shrike/tests/{}.grammar", name))
        .display()
        .to_string()
}

#[test]
fn missing_argument() {
    let output = shrike(&[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr: {}", stderr);
}

#[test]
fn help_exits_successfully() {
    let output = shrike(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn missing_grammar_file() {
    let output = shrike(&["this/grammar/does/not/exist.grammar"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("os error"), "stderr: {}", stderr);
}

#[test]
fn missing_input_file() {
    let grammar = grammar_path("function");
    let output = shrike(&[&grammar, "--input", "this/input/does/not/exist.txt"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("os error"), "stderr: {}", stderr);
}

#[test]
fn conflicting_grammar() {
    let output = shrike(&[&grammar_path("ambiguous")]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("shift/reduce"), "stderr: {}", stderr);
}

#[test]
fn parse_input_program() {
    let input = env::temp_dir().join(format!("shrike-cli-{}.txt", std::process::id()));
    std::fs::write(&input, "fn foo { return 1; }").unwrap();

    let grammar = grammar_path("function");
    let output = shrike(&[&grammar, "-i", &input.display().to_string()]);
    let _ = std::fs::remove_file(&input);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("#### State 00"), "stdout: {}", stdout);
    assert!(stdout.contains("## trace"), "stdout: {}", stdout);
    assert!(stdout.contains("(accept)"), "stdout: {}", stdout);
}
