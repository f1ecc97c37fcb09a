// tests/engine.rs — parcours complet : source → Handle → C (fichier / compilateur C)
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use bf2c_compiler::interp::Limits;
use bf2c_compiler::{parse_file, parse_text, Compiler, Config, Error, Instruction, OptLevel, ParseError};

const HELLO: &str = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";

#[test]
fn parse_file_reads_the_whole_source() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("hello.bf");
    fs::write(&src, format!("hello world program\n{HELLO}\n")).unwrap();

    let from_file = parse_file(&src).unwrap();
    let from_text = parse_text(HELLO).unwrap();
    assert_eq!(from_file.code(), from_text.code());
}

#[test]
fn missing_file_is_reported_as_such() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.bf");
    match parse_file(&missing) {
        Err(Error::FileNotFound { path }) => assert_eq!(path, missing),
        other => panic!("attendu FileNotFound, obtenu {other:?}"),
    }
}

#[test]
fn emit_to_file_creates_then_truncates() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.c");

    parse_text(HELLO).unwrap().emit_to_file(&out).unwrap();
    let long = fs::read_to_string(&out).unwrap();

    let short = parse_text("").unwrap();
    short.emit_to_file(&out).unwrap();
    let written = fs::read_to_string(&out).unwrap();
    assert_eq!(written, short.code());
    assert!(written.len() < long.len());
}

#[test]
fn emit_to_unwritable_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("absent").join("out.c");
    let err = parse_text("+").unwrap().emit_to_file(&out).unwrap_err();
    assert!(matches!(err, Error::Io { ref path, .. } if path == &out), "{err:?}");
}

#[test]
fn generation_is_deterministic() {
    let a = parse_text(HELLO).unwrap().code();
    let b = parse_text(HELLO).unwrap().code();
    assert_eq!(a, b);

    let mut buf = Vec::new();
    parse_text(HELLO).unwrap().write_code(&mut buf).unwrap();
    assert_eq!(buf, a.into_bytes());
}

#[test]
fn handles_are_shared_across_threads() {
    let handle = parse_text(HELLO).unwrap();
    let expected = handle.code();
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let h = handle.clone();
            thread::spawn(move || h.code())
        })
        .collect();
    for w in workers {
        assert_eq!(w.join().unwrap(), expected);
    }
}

#[test]
fn independent_compilations_in_parallel() {
    let sources = ["++++", "++++[-]", ",.", HELLO];
    let workers: Vec<_> = sources
        .into_iter()
        .map(|src| thread::spawn(move || parse_text(src).map(|h| h.code())))
        .collect();
    for (w, src) in workers.into_iter().zip(sources) {
        assert_eq!(w.join().unwrap().unwrap(), parse_text(src).unwrap().code());
    }
}

#[test]
fn reference_scenarios() {
    let four = parse_text("++++").unwrap();
    assert_eq!(four.program().instructions(), &[Instruction::AdjustCell(4)]);
    let run = four.interpret(b"", Limits::default()).unwrap();
    assert_eq!(run.cell(0), 4);
    assert!(run.output.is_empty());

    let cleared = parse_text("++++[-]").unwrap();
    assert_eq!(cleared.program().instructions(), &[Instruction::AdjustCell(4), Instruction::SetZero]);
    assert_eq!(cleared.interpret(b"", Limits::default()).unwrap().cell(0), 0);

    let echo = parse_text(",.").unwrap();
    assert_eq!(echo.interpret(b"Q", Limits::default()).unwrap().output, b"Q");

    let err = parse_text("[").unwrap_err();
    assert_eq!(err.as_parse(), Some(&ParseError::unmatched_open(0)));
}

#[test]
fn zero_net_runs_emit_nothing() {
    let c = parse_text("+-<>+-").unwrap().code();
    assert!(!c.contains("tape[ptr] +"));
    assert!(!c.contains("tape[ptr] -"));
    assert!(!c.contains("ptr +="));
    assert!(!c.contains("ptr -="));
    assert_eq!(c, parse_text("").unwrap().code());
}

#[test]
fn comment_only_program_is_empty() {
    let h = parse_text("this program does nothing at all").unwrap();
    assert!(h.program().is_empty());
    assert!(h.code().contains("int main(void) {"));
    assert!(h.interpret(b"", Limits::default()).unwrap().output.is_empty());
}

#[test]
fn deeply_nested_sources_compile_and_drop() {
    let n = 100_000;
    let src = format!("+{}{}", "[".repeat(n), "]".repeat(n));
    for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2] {
        let h = Compiler::new(Config { opt_level: level, ..Config::default() }).parse_text(&src).unwrap();
        assert_eq!(h.program().depth(), n);
        assert_eq!(h.program().len(), n + 1);
        drop(h);
    }

    // Le C indente chaque niveau : taille quadratique, d’où une profondeur plus modeste.
    let n = 5_000;
    let src = format!("+{}{}", "[".repeat(n), "]".repeat(n));
    for level in [OptLevel::O0, OptLevel::O1] {
        let h = Compiler::new(Config { opt_level: level, indent_width: 1, ..Config::default() })
            .parse_text(&src)
            .unwrap();
        let code = h.code();
        assert_eq!(code.matches("while (tape[ptr]) {").count(), n);
        assert!(code.ends_with("\n return 0;\n}\n"));
    }
}

/* ─────────────────────────── compilateur C système ─────────────────────────── */

fn have_cc() -> bool {
    Command::new("cc")
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn compile_and_run(dir: &Path, name: &str, code: &str, input: &[u8]) -> Vec<u8> {
    let c_path = dir.join(format!("{name}.c"));
    let exe = dir.join(name);
    fs::write(&c_path, code).unwrap();
    let status = Command::new("cc")
        .args(["-std=c99", "-O1", "-o"])
        .arg(&exe)
        .arg(&c_path)
        .status()
        .unwrap();
    assert!(status.success(), "cc a échoué sur {name}.c");

    let mut child = Command::new(&exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(input).unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success());
    out.stdout
}

#[test]
fn generated_c_matches_interpreter() {
    if !have_cc() {
        eprintln!("(skip) pas de compilateur `cc` dans le PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let cases: [(&str, &str, &[u8]); 5] = [
        ("hello", HELLO, b""),
        ("echo", ",.,.,.", b"abc"),
        ("eof", "+,.", b""),
        ("empty", "", b""),
        ("wrap", "-.", b""),
    ];
    for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2] {
        let compiler = Compiler::new(Config { opt_level: level, ..Config::default() });
        for (name, src, input) in cases {
            let h = compiler.parse_text(src).unwrap();
            let expected = h.interpret(input, Limits::default()).unwrap().output;
            let got = compile_and_run(dir.path(), &format!("{name}_{level}"), &h.code(), input);
            assert_eq!(got, expected, "{name} @ {level}");
        }
    }
}

#[test]
fn heap_and_wide_cells_compile() {
    if !have_cc() {
        eprintln!("(skip) pas de compilateur `cc` dans le PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        tape_storage: bf2c_compiler::TapeStorage::Heap,
        cell_width: bf2c_compiler::CellWidth::U16,
        tape_len: 128,
        ..Config::default()
    };
    // 256 tient sur 16 bits : deux transferts de 256 itérations avant la sortie
    let src = "++++++++++++++++[>++++++++++++++++<-]>[>+<-]>[-<+>]<[-]++++++++[>++++++++<-]>+.";
    let h = Compiler::new(cfg).parse_text(src).unwrap();
    let expected = h.interpret(b"", Limits::default()).unwrap().output;
    assert_eq!(expected, b"A");
    assert_eq!(compile_and_run(dir.path(), "heap16", &h.code(), b""), expected);
}
