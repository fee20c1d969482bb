//! kite-cli: bibliothèque interne du binaire `kite`
//!
//! Le parsing d'arguments reste dans `main.rs` ; ici vivent les commandes,
//! chacune écrivant vers un `Write` fourni (stdout en vrai, buffer en test).
//!
//! Pipeline : **source → jetons → AST → chunk → VM**, ou **assembleur → chunk → VM**
//! avec `--asm`.
//!
//! - Traces (`feature = "trace"`) : `log` + `env_logger`, les crates internes
//!   émettent via `tracing` (pont `log`).
//! - Couleurs (`feature = "color"`) : `owo-colors` sur stderr.

#![forbid(unsafe_code)]

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use kite_core::bytecode::Chunk;
use kite_vm::{InterpretResult, Vm};

#[cfg(feature = "color")]
use owo_colors::{OwoColorize, Stream};

// ───────────────────────────── Types publics ─────────────────────────────

/// Commande haut-niveau (sans parsing CLI, réservé à main.rs).
#[derive(Clone, Debug)]
pub enum Command {
    /// Liste les jetons d'une source.
    Tokens(TokensTask),
    /// Affiche l'AST d'une source.
    Parse(ParseTask),
    /// Compile (ou assemble) puis désassemble.
    Disasm(DisasmTask),
    /// Compile (ou assemble) puis exécute.
    Run(RunTask),
    /// Boucle interactive ligne par ligne.
    Repl(ReplTask),
}

/// `kite tokens`
#[derive(Clone, Debug, Default)]
pub struct TokensTask {
    pub input: Input,
    pub json: bool,
}

/// `kite parse`
#[derive(Clone, Debug, Default)]
pub struct ParseTask {
    pub input: Input,
    pub json: bool,
    /// Continue après une erreur et rapporte toutes les erreurs.
    pub recover: bool,
}

/// `kite disasm`
#[derive(Clone, Debug, Default)]
pub struct DisasmTask {
    pub input: Input,
    pub asm: bool,
}

/// `kite run`
#[derive(Clone, Debug, Default)]
pub struct RunTask {
    pub input: Input,
    pub asm: bool,
}

/// `kite repl`
#[derive(Clone, Debug)]
pub struct ReplTask {
    pub prompt: String,
}

impl Default for ReplTask {
    fn default() -> Self { Self { prompt: "kite> ".into() } }
}

/// Entrée texte : fichier ou `-` (=stdin).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Input {
    Path(PathBuf),
    #[default]
    Stdin,
}

impl Input {
    /// `-` désigne stdin, tout le reste un chemin.
    pub fn from_arg(arg: Option<PathBuf>) -> Self {
        match arg {
            Some(p) if p.as_os_str() == "-" => Self::Stdin,
            Some(p) => Self::Path(p),
            None => Self::Stdin,
        }
    }

    fn name(&self) -> String {
        match self {
            Self::Path(p) => p.to_string_lossy().into_owned(),
            Self::Stdin => "<stdin>".into(),
        }
    }
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger ; `RUST_LOG` reste prioritaire sur la verbosité.
pub fn init_logger(verbose: u8, quiet: bool) {
    #[cfg(feature = "trace")]
    {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
            .format_timestamp(None)
            .try_init();
    }
    #[cfg(not(feature = "trace"))]
    {
        let _ = (verbose, quiet);
    }
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Exécute une commande sur stdin/stdout. Retourne un code de sortie.
pub fn execute(cmd: Command) -> Result<i32> {
    match cmd {
        Command::Repl(t) => repl(&t.prompt, io::stdin().lock(), io::stdout().lock()),
        other => {
            let mut out = io::stdout().lock();
            let code = execute_to(other, &mut out)?;
            out.flush()?;
            Ok(code)
        }
    }
}

/// Exécute une commande en écrivant vers `out`.
pub fn execute_to(cmd: Command, out: &mut dyn Write) -> Result<i32> {
    match cmd {
        Command::Tokens(t) => tokens_entry(&t, out),
        Command::Parse(t) => parse_entry(&t, out),
        Command::Disasm(t) => disasm_entry(&t, out),
        Command::Run(t) => run_entry(&t, out),
        Command::Repl(t) => repl(&t.prompt, io::stdin().lock(), out),
    }
}

fn tokens_entry(task: &TokensTask, out: &mut dyn Write) -> Result<i32> {
    let src = read_source(&task.input)?;
    let tokens = match kite_lexer::tokenize(&src) {
        Ok(tokens) => tokens,
        Err(e) => return Ok(report(&task.input, &e)),
    };

    if task.json {
        serde_json::to_writer_pretty(&mut *out, &tokens)?;
        writeln!(out)?;
        return Ok(0);
    }

    let mut last_line = None;
    for tok in &tokens {
        if last_line == Some(tok.pos.line) {
            write!(out, "   | ")?;
        } else {
            write!(out, "{:4} ", tok.pos.line)?;
        }
        last_line = Some(tok.pos.line);
        writeln!(out, "{:<12} '{}'", format!("{:?}", tok.kind), tok.spelling)?;
    }
    Ok(0)
}

fn parse_entry(task: &ParseTask, out: &mut dyn Write) -> Result<i32> {
    let src = read_source(&task.input)?;
    let program = if task.recover {
        let (program, errors) = match kite_parser::parse_recovering(&src) {
            Ok(pair) => pair,
            Err(e) => return Ok(report(&task.input, &e)),
        };
        for e in &errors {
            status_err("error", &format!("{}: {e}", task.input.name()));
        }
        if !errors.is_empty() {
            write_program(&program, task.json, out)?;
            return Ok(InterpretResult::CompileError.exit_code());
        }
        program
    } else {
        match kite_parser::parse(&src) {
            Ok(program) => program,
            Err(e) => return Ok(report(&task.input, &e)),
        }
    };

    #[cfg(feature = "trace")]
    log::info!("{}: {} statement(s)", task.input.name(), program.statements.len());

    write_program(&program, task.json, out)?;
    Ok(0)
}

fn write_program(program: &kite_ast::Program, json: bool, out: &mut dyn Write) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, program)?;
        writeln!(out)?;
    } else {
        write!(out, "{program}")?;
    }
    Ok(())
}

fn disasm_entry(task: &DisasmTask, out: &mut dyn Write) -> Result<i32> {
    let src = read_source(&task.input)?;
    let chunk = match build_chunk(&src, task.asm) {
        Ok(chunk) => chunk,
        Err(msg) => {
            status_err("error", &format!("{}: {msg}", task.input.name()));
            return Ok(InterpretResult::CompileError.exit_code());
        }
    };
    write!(out, "{}", kite_core::disasm::disassemble(&chunk, &task.input.name()))?;
    Ok(0)
}

fn run_entry(task: &RunTask, out: &mut dyn Write) -> Result<i32> {
    let src = read_source(&task.input)?;
    let mut vm = Vm::with_output(out);
    Ok(run_source(&mut vm, &src, task.asm, &task.input.name()).exit_code())
}

/// Compile (ou assemble) `src` puis l'exécute sur `vm`.
///
/// Les erreurs sont rapportées sur stderr ; le résultat donne le code de sortie.
pub fn run_source<W: Write>(vm: &mut Vm<W>, src: &str, asm: bool, name: &str) -> InterpretResult {
    let chunk = match build_chunk(src, asm) {
        Ok(chunk) => chunk,
        Err(msg) => {
            status_err("error", &format!("{name}: {msg}"));
            return InterpretResult::CompileError;
        }
    };

    #[cfg(feature = "trace")]
    log::debug!("{name}: {} byte(s), {} constant(s)", chunk.len(), chunk.constants().len());

    match vm.run(chunk) {
        Ok(_) => InterpretResult::Ok,
        Err(e) => {
            status_err("runtime error", &format!("{name}: {e}"));
            InterpretResult::RuntimeError
        }
    }
}

/// Source Kite ou texte d'assembleur vers chunk ; l'erreur est déjà formatée.
fn build_chunk(src: &str, asm: bool) -> std::result::Result<Chunk, String> {
    if asm {
        return kite_core::asm::assemble(src).map_err(|e| e.to_string());
    }
    let program = kite_parser::parse(src).map_err(|e| e.to_string())?;
    kite_compiler::compile(&program).map_err(|e| e.to_string())
}

/// REPL : chaque ligne non vide est compilée puis exécutée.
pub fn repl<R: BufRead, W: Write>(prompt: &str, input: R, out: W) -> Result<i32> {
    let mut vm = Vm::with_output(out);
    let mut lines = input.lines();
    loop {
        {
            let out = vm.output_mut();
            write!(out, "{prompt}")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line.context("lecture de stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let _ = run_source(&mut vm, &line, false, "<repl>");
    }
    writeln!(vm.output_mut())?;
    Ok(0)
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

/// Lit toute la source (fichier ou stdin).
pub fn read_source(input: &Input) -> Result<String> {
    let mut s = String::new();
    match input {
        Input::Stdin => {
            io::stdin().read_to_string(&mut s).context("lecture de stdin")?;
        }
        Input::Path(p) => {
            let f = File::open(p).with_context(|| format!("ouverture: {}", p.display()))?;
            BufReader::new(f).read_to_string(&mut s).with_context(|| format!("lecture: {}", p.display()))?;
        }
    }
    Ok(s)
}

fn report(input: &Input, e: &dyn std::error::Error) -> i32 {
    status_err("error", &format!("{}: {e}", input.name()));
    InterpretResult::CompileError.exit_code()
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

/// Force ou coupe la couleur (`None` : détection du terminal).
pub fn set_color(choice: Option<bool>) {
    #[cfg(feature = "color")]
    {
        match choice {
            Some(on) => owo_colors::set_override(on),
            None => owo_colors::unset_override(),
        }
    }
    #[cfg(not(feature = "color"))]
    {
        let _ = choice;
    }
}

fn status_err(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.if_supports_color(Stream::Stderr, |t| t.red()), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{tag} {msg}");
    }
}

// ───────────────────────────── Tests ─────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn input_dash_is_stdin() {
        assert_eq!(Input::from_arg(Some("-".into())), Input::Stdin);
        assert_eq!(Input::from_arg(None), Input::Stdin);
        assert_eq!(Input::from_arg(Some("a.kt".into())), Input::Path("a.kt".into()));
    }

    #[test]
    fn run_source_result_codes() {
        let mut vm = Vm::with_output(Vec::new());
        assert_eq!(run_source(&mut vm, "10 - 3", false, "t"), InterpretResult::Ok);
        assert_eq!(run_source(&mut vm, "val x = ", false, "t"), InterpretResult::CompileError);
        assert_eq!(run_source(&mut vm, "x + 1", false, "t"), InterpretResult::CompileError);
        assert_eq!(run_source(&mut vm, "ADD\nRETURN", true, "t"), InterpretResult::RuntimeError);
        assert_eq!(vm.output(), b"7\n");
    }

    #[test]
    fn repl_runs_each_line() {
        let input = Cursor::new("1 + 2\n\n2 * 21\nfoo(\n-4\n");
        let mut out = Vec::new();
        assert_eq!(repl("> ", input, &mut out).unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        let values: Vec<_> = text.split("> ").map(str::trim).filter(|s| !s.is_empty()).collect();
        assert_eq!(values, vec!["3", "42", "-4"]);
    }
}
