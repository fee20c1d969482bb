//! `kite`: CLI principal de Kite
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `kite_cli` (lib).

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use kite_cli as cli;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "kite", version, about = "Kite CLI : lexer, parser, bytecode et VM", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue, global = true)]
    quiet: bool,

    /// Couleur des diagnostics
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lister les jetons d'une source
    Tokens {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },

    /// Afficher l'AST (S-expressions, ou JSON avec --json)
    Parse {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
        /// Sortie JSON
        #[arg(long)]
        json: bool,
        /// Continuer après une erreur et les rapporter toutes
        #[arg(long)]
        recover: bool,
    },

    /// Compiler (ou assembler) puis désassembler
    Disasm {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
        /// L'entrée est du texte d'assembleur
        #[arg(long)]
        asm: bool,
    },

    /// Compiler (ou assembler) puis exécuter
    Run {
        /// Fichier source (ou - pour stdin)
        input: Option<PathBuf>,
        /// L'entrée est du texte d'assembleur
        #[arg(long)]
        asm: bool,
    },

    /// Lancer un REPL
    Repl {
        /// Prompt du REPL
        #[arg(long, default_value = "kite> ")]
        prompt: String,
    },
}

fn init_color(choice: ColorChoice) {
    let forced = match choice {
        ColorChoice::Auto => {
            if std::env::var_os("NO_COLOR").is_some() {
                Some(false)
            } else if std::env::var_os("CLICOLOR_FORCE").is_some_and(|v| v != "0") {
                Some(true)
            } else {
                None
            }
        }
        ColorChoice::Always => Some(true),
        ColorChoice::Never => Some(false),
    };
    cli::set_color(forced);
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> Result<i32> {
    let opt = Opt::parse();

    init_color(opt.color);
    cli::init_logger(opt.verbose, opt.quiet);

    use cli::{Command as C, DisasmTask, Input, ParseTask, ReplTask, RunTask, TokensTask};

    let command = match opt.cmd {
        Command::Tokens { input, json } => C::Tokens(TokensTask { input: Input::from_arg(input), json }),
        Command::Parse { input, json, recover } => {
            C::Parse(ParseTask { input: Input::from_arg(input), json, recover })
        }
        Command::Disasm { input, asm } => C::Disasm(DisasmTask { input: Input::from_arg(input), asm }),
        Command::Run { input, asm } => C::Run(RunTask { input: Input::from_arg(input), asm }),
        Command::Repl { prompt } => C::Repl(ReplTask { prompt }),
    };

    cli::execute(command).context("échec d'exécution de la commande")
}
