use std::io::Write as _;
use std::path::Path;
use std::process::{Command as Proc, Stdio};

use kite_cli::{execute_to, Command, DisasmTask, Input, ParseTask, RunTask, TokensTask};
use pretty_assertions::assert_eq;

fn source_file(dir: &Path, name: &str, text: &str) -> Input {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    Input::Path(path)
}

fn capture(cmd: Command) -> (i32, String) {
    let mut out = Vec::new();
    let code = execute_to(cmd, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

#[test]
fn run_prints_last_value() {
    let dir = tempfile::tempdir().unwrap();
    let input = source_file(dir.path(), "sub.kt", "10 - 3\n");
    assert_eq!(capture(Command::Run(RunTask { input, asm: false })), (0, "7\n".into()));
}

#[test]
fn run_assembly_and_exit_codes() {
    let dir = tempfile::tempdir().unwrap();
    let ok = source_file(dir.path(), "ok.kasm", "CONSTANT 2\nCONSTANT 4\nMULTIPLY ; 8\nRETURN\n");
    assert_eq!(capture(Command::Run(RunTask { input: ok, asm: true })), (0, "8\n".into()));

    let underflow = source_file(dir.path(), "bad.kasm", "ADD\nRETURN\n");
    assert_eq!(capture(Command::Run(RunTask { input: underflow, asm: true })).0, 70);

    let unknown = source_file(dir.path(), "typo.kasm", "PUSH 1\n");
    assert_eq!(capture(Command::Run(RunTask { input: unknown, asm: true })).0, 65);

    let unsupported = source_file(dir.path(), "decl.kt", "val x = 1\n");
    assert_eq!(capture(Command::Run(RunTask { input: unsupported, asm: false })).0, 65);
}

#[test]
fn parse_prints_s_expressions() {
    let dir = tempfile::tempdir().unwrap();
    let input = source_file(dir.path(), "p.kt", "val x: Int = 1\na = b = 2\n");
    let (code, out) = capture(Command::Parse(ParseTask { input, json: false, recover: false }));
    assert_eq!(code, 0);
    assert_eq!(out, "(val x: Int = 1)\n(= a (= b 2))\n");
}

#[test]
fn parse_json_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let input = source_file(dir.path(), "j.kt", "1 + 2\n");
    let (code, out) = capture(Command::Parse(ParseTask { input, json: true, recover: false }));
    assert_eq!(code, 0);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["statements"].as_array().map(Vec::len), Some(1));
}

#[test]
fn parse_recover_keeps_going() {
    let dir = tempfile::tempdir().unwrap();
    let input = source_file(dir.path(), "r.kt", "val x\n1 + 1\nval y = )\n2\n");
    let (code, out) = capture(Command::Parse(ParseTask { input, json: false, recover: true }));
    assert_eq!(code, 65);
    assert_eq!(out.lines().count(), 2);
}

#[test]
fn disasm_listing() {
    let dir = tempfile::tempdir().unwrap();
    let input = source_file(dir.path(), "d.kt", "10 - 3\n");
    let (code, out) = capture(Command::Disasm(DisasmTask { input, asm: false }));
    assert_eq!(code, 0);
    let body: Vec<_> = out.lines().skip(1).collect();
    assert_eq!(
        body,
        vec![
            "0000    1 OP_CONSTANT         0 '10'",
            "0002    | OP_CONSTANT         1 '3'",
            "0004    | OP_SUBTRACT",
            "0005    | OP_RETURN",
        ]
    );
}

#[test]
fn tokens_listing() {
    let dir = tempfile::tempdir().unwrap();
    let input = source_file(dir.path(), "t.kt", "a += 1");
    let (code, out) = capture(Command::Tokens(TokensTask { input, json: false }));
    assert_eq!(code, 0);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines[0], "   1 Identifier   'a'");
    assert_eq!(lines[1], "   | PlusAssign   '+='");
    assert!(lines.last().unwrap().contains("Eof"));
}

#[test]
fn binary_reads_stdin() {
    let mut child = Proc::new(env!("CARGO_BIN_EXE_kite"))
        .args(["--color", "never", "run", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"(1 + 2) * 4\n").unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "12\n");
}

#[test]
fn binary_reports_compile_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("e.kt");
    std::fs::write(&path, "val x\n").unwrap();
    let output = Proc::new(env!("CARGO_BIN_EXE_kite")).arg("run").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(65));
    assert!(String::from_utf8_lossy(&output.stderr).contains("must either have a type annotation"));
}
