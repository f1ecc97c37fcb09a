//! bf2c-cli/src/lib.rs — CLI lib pour bf2c
//!
//! Sous-commandes :
//!   - build  : transpile un source Brainf*ck en C (fichier ou stdout)
//!   - run    : exécute le source avec l’interpréteur de référence
//!   - dump   : affiche l’arbre d’instructions optimisé
//!   - config : affiche la configuration effective (TOML)
//!
//! Configuration, du plus faible au plus fort :
//! défauts → ENV `BF2C_*` → fichier `bf2c.toml` → options de la ligne de commande.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{debug, LevelFilter};

use bf2c_compiler::interp::Limits;
use bf2c_compiler::{CellWidth, CliOverrides, Compiler, Config, Error, Handle, OptLevel, ParseError, TapeStorage};

/// Fichier de configuration lu implicitement dans le répertoire courant.
pub const DEFAULT_CONFIG_FILE: &str = "bf2c.toml";

/// Point d’entrée du binaire (à appeler depuis src/main.rs)
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Cmd::Build { input, output, engine } => cmd_build(input, output, &engine),
        Cmd::Run { file, input, max_steps, engine } => cmd_run(&file, input, max_steps, &engine),
        Cmd::Dump { file, engine } => cmd_dump(&file, &engine),
        Cmd::Config { engine } => cmd_config(&engine),
    }
}

#[derive(Parser, Debug)]
#[command(name = "bf2c", version, about = "Transpileur Brainf*ck → C")]
pub struct Cli {
    /// Verbosité des logs (-v info, -vv debug, -vvv trace) ; RUST_LOG reste prioritaire
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Génère le C d’un programme
    Build {
        /// Source (absent ou `-` : entrée standard)
        input: Option<Utf8PathBuf>,
        /// Fichier C à écrire (sinon sortie standard)
        #[arg(short, long)]
        output: Option<Utf8PathBuf>,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Exécute un programme avec l’interpréteur de référence
    Run {
        /// Source à exécuter
        file: Utf8PathBuf,
        /// Fichier servant d’entrée au programme (sinon entrée standard)
        #[arg(long)]
        input: Option<Utf8PathBuf>,
        /// Garde-fou contre les boucles infinies (0 = illimité)
        #[arg(long, default_value_t = 10_000_000)]
        max_steps: u64,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Affiche l’arbre d’instructions après optimisation
    Dump {
        file: Utf8PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Affiche la configuration effective au format TOML
    Config {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Options moteur communes à toutes les sous-commandes.
#[derive(Args, Debug, Default, Clone)]
pub struct EngineArgs {
    /// Niveau d’optimisation (0, 1, 2)
    #[arg(short = 'O', long = "opt", value_parser = parse_opt_arg)]
    pub opt: Option<OptLevel>,
    /// Nombre de cellules du ruban
    #[arg(long)]
    pub tape_len: Option<usize>,
    /// Largeur des cellules en bits (8, 16, 32)
    #[arg(long, value_parser = parse_bits_arg)]
    pub cell_bits: Option<CellWidth>,
    /// Ruban alloué sur le tas (calloc/free) plutôt que statique
    #[arg(long, overrides_with = "no_heap")]
    pub heap: bool,
    /// Ruban statique, même si la configuration demande le tas
    #[arg(long, overrides_with = "heap")]
    pub no_heap: bool,
    /// `#` affiche une fenêtre du ruban sur stderr
    #[arg(long, overrides_with = "no_debug_marker")]
    pub debug_marker: bool,
    /// `#` reste un commentaire, même si la configuration l’active
    #[arg(long, overrides_with = "debug_marker")]
    pub no_debug_marker: bool,
    /// Fichier de configuration (défaut : ./bf2c.toml s’il existe)
    #[arg(long)]
    pub config: Option<Utf8PathBuf>,
}

impl EngineArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            tape_len: self.tape_len,
            cell_width: self.cell_bits,
            opt_level: self.opt,
            tape_storage: switch(self.heap, self.no_heap).map(|heap| {
                if heap { TapeStorage::Heap } else { TapeStorage::Static }
            }),
            debug_marker: switch(self.debug_marker, self.no_debug_marker),
            indent_width: None,
        }
    }
}

/// `--x` / `--no-x` : `None` si aucun des deux n’est donné (la couche inférieure décide).
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn parse_opt_arg(s: &str) -> Result<OptLevel, String> {
    bf2c_compiler::config::parse_opt(s).ok_or_else(|| format!("niveau inconnu `{s}` (attendu 0, 1 ou 2)"))
}

fn parse_bits_arg(s: &str) -> Result<CellWidth, String> {
    bf2c_compiler::config::parse_cell_bits(s).ok_or_else(|| format!("largeur inconnue `{s}` (attendu 8, 16 ou 32)"))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, s’il est défini, s’applique par-dessus
    let _ = env_logger::Builder::new().filter_level(level).parse_default_env().try_init();
}

/* ─────────────────────────── Configuration ─────────────────────────── */

/// Lit un fichier `bf2c.toml` : mêmes clés que `Config`, toutes facultatives.
pub fn read_config_file(path: &Utf8Path) -> Result<CliOverrides> {
    let s = fs::read_to_string(path).with_context(|| format!("lecture {path}"))?;
    let o: CliOverrides = toml::from_str(&s).with_context(|| format!("TOML invalide: {path}"))?;
    Ok(o)
}

/// Empile défauts → ENV → fichier → ligne de commande, puis valide.
pub fn resolve_config(engine: &EngineArgs) -> Result<Config> {
    let mut cfg = Config::from_env();
    let file = match &engine.config {
        Some(p) => Some(p.clone()),
        None => Some(Utf8PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };
    if let Some(path) = file {
        debug!("configuration lue depuis {path}");
        cfg.apply_cli_overrides(&read_config_file(&path)?);
    }
    cfg.apply_cli_overrides(&engine.overrides());
    cfg.validate()?;
    Ok(cfg)
}

/* ─────────────────────────── Sous-commandes ─────────────────────────── */

/// Source chargée en mémoire, avec le nom à afficher dans les diagnostics.
struct Source {
    name: String,
    bytes: Vec<u8>,
}

impl Source {
    fn load(path: Option<&Utf8Path>) -> Result<Self> {
        match path {
            None => Self::stdin(),
            Some(p) if p.as_str() == "-" => Self::stdin(),
            Some(p) => {
                let bytes = fs::read(p).with_context(|| format!("lecture {p}"))?;
                Ok(Self { name: p.to_string(), bytes })
            }
        }
    }

    fn stdin() -> Result<Self> {
        let mut bytes = Vec::new();
        io::stdin().lock().read_to_end(&mut bytes).context("lecture de l’entrée standard")?;
        Ok(Self { name: "<stdin>".into(), bytes })
    }
}

/// `fichier:ligne:colonne: message`
pub fn render_parse_error(name: &str, source: &[u8], err: &ParseError) -> String {
    let (line, col) = err.line_col(source);
    format!("{name}:{line}:{col}: {}", err.kind)
}

/// Compile `src` ; une erreur de syntaxe est affichée en diagnostic et donne `Ok(None)`.
fn compile(src: &Source, engine: &EngineArgs) -> Result<Option<Handle>> {
    let cfg = resolve_config(engine)?;
    match Compiler::new(cfg).parse_bytes(&src.bytes) {
        Ok(h) => Ok(Some(h)),
        Err(Error::Parse(e)) => {
            eprintln!("{}", render_parse_error(&src.name, &src.bytes, &e));
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("compilation de {}", src.name)),
    }
}

fn cmd_build(input: Option<Utf8PathBuf>, output: Option<Utf8PathBuf>, engine: &EngineArgs) -> Result<ExitCode> {
    let src = Source::load(input.as_deref())?;
    let Some(handle) = compile(&src, engine)? else {
        return Ok(ExitCode::FAILURE);
    };
    match output {
        Some(out) if out.as_str() != "-" => handle.emit_to_file(&out)?,
        _ => handle.print_code()?,
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_run(file: &Utf8Path, input: Option<Utf8PathBuf>, max_steps: u64, engine: &EngineArgs) -> Result<ExitCode> {
    let src = Source::load(Some(file))?;
    let Some(handle) = compile(&src, engine)? else {
        return Ok(ExitCode::FAILURE);
    };
    let data = match input {
        Some(p) => fs::read(&p).with_context(|| format!("lecture {p}"))?,
        None => Source::stdin()?.bytes,
    };
    let limits = Limits { max_steps: (max_steps > 0).then_some(max_steps) };
    let exec = handle.interpret(&data, limits).with_context(|| format!("exécution de {file}"))?;
    debug!("{} pas, pointeur final {}", exec.steps, exec.pointer);

    let mut out = io::stdout().lock();
    out.write_all(&exec.output)?;
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_dump(file: &Utf8Path, engine: &EngineArgs) -> Result<ExitCode> {
    let src = Source::load(Some(file))?;
    let Some(handle) = compile(&src, engine)? else {
        return Ok(ExitCode::FAILURE);
    };
    let p = handle.program();
    println!("{p}");
    eprintln!(
        "{} instruction(s), profondeur {}, niveau {}",
        p.len(),
        p.depth(),
        handle.config().opt_level
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_config(engine: &EngineArgs) -> Result<ExitCode> {
    let cfg = resolve_config(engine)?;
    let s = toml::to_string(&cfg).map_err(|e| anyhow!("sérialisation TOML: {e}"))?;
    print!("{s}");
    Ok(ExitCode::SUCCESS)
}

/* ─────────────────────────────── Tests ─────────────────────────────── */
