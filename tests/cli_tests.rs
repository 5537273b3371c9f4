// Command-line tests for the engpy binary
//
// These run the built executable and check stdout, stderr and exit codes
// for the bare invocation, script files and the dump subcommands.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn engpy(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_engpy"))
        .args(args)
        .env_remove("ENGPY_MAX_STEPS")
        .env_remove("ENGPY_LOG")
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

fn script(name: &str, source: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("engpy_cli_{}_{}.eng", std::process::id(), name));
    fs::write(&path, source).unwrap();
    path
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_bare_invocation_prints_banner_then_runs_sample() {
    let output = engpy(&[]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_of(&output), format!("{}\n120\n", engpy::USAGE_BANNER));
}

#[test]
fn test_script_file_runs() {
    let path = script("countdown", "let n be 3\nwhile n > 0:\n  print n\n  n = n - 1\n");
    let output = engpy(&[path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_of(&output), "3\n2\n1\n");
}

#[test]
fn test_runtime_error_exits_nonzero() {
    let path = script("undefined", "print z\n");
    let output = engpy(&[path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_of(&output), "");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Undefined variable 'z'"));
}

#[test]
fn test_missing_file_exits_nonzero() {
    let output = engpy(&["run", "no/such/script.eng"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no/such/script.eng"));
}

#[test]
fn test_long_operator_chain_fails_cleanly() {
    let path = script("chain", &format!("print 0{}\n", "+1".repeat(200_000)));
    let output = engpy(&[path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("More than 512 operators"));
}

#[test]
fn test_step_limit_from_flag() {
    let path = script("forever", "while 1:\n  let x = 1\n");
    let output = engpy(&["--max-steps", "50", path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("50"));
}

#[test]
fn test_tokens_and_ast_dumps() {
    let path = script("dump", "if 2 > 1:\n  print 8 - 3 - 2\n");

    let tokens = engpy(&["tokens", path.to_str().unwrap()]);
    assert_eq!(tokens.status.code(), Some(0));
    let tokens = stdout_of(&tokens);
    assert!(tokens.starts_with("1:1\tidentifier 'if'\n"));
    assert!(tokens.contains("\tINDENT\n"));
    assert!(tokens.ends_with("\tend of input\n"));

    let ast = engpy(&["ast", path.to_str().unwrap()]);
    fs::remove_file(&path).unwrap();
    assert_eq!(ast.status.code(), Some(0));
    assert_eq!(stdout_of(&ast), "if (2 > 1):\n  print ((8 - 3) - 2)\n");
}
