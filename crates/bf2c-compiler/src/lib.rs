//! bf2c-compiler/src/lib.rs — Moteur du transpileur Brainf*ck → C
//!
//! Pipeline :
//!  - [`lexer`]    : octets → commandes (tout le reste est commentaire)
//!  - [`parser`]   : commandes → arbre de boucles, crochets vérifiés
//!  - [`optimize`] : fusion des séquences, boucles de mise à zéro, boucles mortes
//!  - [`emit`]     : arbre → source C autonome
//!  - [`interp`]   : interpréteur de référence (tests, `bf2c run`)
//!
//! API publique : `parse_text` / `parse_file` → [`Handle`] → `print_code` / `emit_to_file`
//!
//! Le [`Handle`] est immuable, `Send + Sync` et partageable : aucun état global,
//! deux compilations indépendantes ne partagent rien.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

pub mod ast;
pub mod config;
pub mod emit;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod optimize;
pub mod parser;

pub use ast::{Instruction, Program};
pub use config::{CellWidth, CliOverrides, Config, OptLevel, TapeStorage, DEFAULT_CELL_WIDTH, DEFAULT_TAPE_LEN, MAX_TAPE_LEN};
pub use error::{Error, ParseError, ParseErrorKind, Result, RuntimeError};

/// --------- API PUBLIQUE ---------

/// Compile du texte source avec la configuration par défaut.
pub fn parse_text(source: &str) -> Result<Handle> {
    Compiler::default().parse_text(source)
}

/// Compile un fichier source avec la configuration par défaut.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Handle> {
    Compiler::default().parse_file(path)
}

/// Point d’entrée configurable : porte la [`Config`] utilisée par toutes les phases.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: Config,
}

impl Compiler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile du texte (ses octets UTF-8) en [`Handle`].
    pub fn parse_text(&self, source: &str) -> Result<Handle> {
        self.parse_bytes(source.as_bytes())
    }

    /// Lit puis compile un fichier, en une seule lecture.
    ///
    /// Un chemin absent donne `Error::FileNotFound`, toute autre erreur de lecture `Error::Io`.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Handle> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::FileNotFound { path: path.to_path_buf() },
            _ => Error::io(path, e),
        })?;
        info!(target: "bf2c", "lecture de {} ({} octets)", path.display(), bytes.len());
        self.parse_bytes(&bytes)
    }

    /// Compile des octets bruts (aucun encodage requis).
    pub fn parse_bytes(&self, source: &[u8]) -> Result<Handle> {
        self.config.validate()?;
        let tokens = lexer::lex(source, lexer::LexOptions { debug_marker: self.config.debug_marker });
        let mut program = parser::parse(&tokens)?;
        debug!(target: "bf2c", "{} tokens → {} instructions", tokens.len(), program.len());
        optimize::optimize(&mut program, self.config.opt_level);
        Ok(Handle { program: Arc::new(program), config: self.config.clone() })
    }
}

/// Programme compilé, opaque et immuable.
///
/// Seules des lectures sont exposées ; `clone` partage l’arbre.
#[derive(Debug, Clone)]
pub struct Handle {
    program: Arc<Program>,
    config: Config,
}

impl Handle {
    /// Arbre (optimisé) en lecture seule.
    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Source C généré.
    pub fn code(&self) -> String {
        emit::emit_c(&self.program, &self.config)
    }

    /// Écrit le C généré dans `w`.
    pub fn write_code<W: Write>(&self, w: &mut W) -> io::Result<()> {
        emit::write_c(w, &self.program, &self.config)
    }

    /// Écrit le C généré sur la sortie standard.
    pub fn print_code(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.write_code(&mut lock).map_err(|e| Error::io("<stdout>", e))
    }

    /// Écrit le C généré dans `path` (créé ou tronqué).
    pub fn emit_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let code = self.code();
        fs::write(path, code.as_bytes()).map_err(|e| Error::io(path, e))?;
        info!(target: "bf2c", "C écrit → {} ({} octets)", path.display(), code.len());
        Ok(())
    }

    /// Exécute l’arbre avec l’interpréteur de référence.
    pub fn interpret(&self, input: &[u8], limits: interp::Limits) -> Result<interp::Execution, RuntimeError> {
        interp::run(&self.program, input, &self.config, limits)
    }
}

/// --------- TESTS ---------

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn handle_is_shareable() {
        assert_send_sync::<Handle>();
        assert_send_sync::<Compiler>();
    }

    #[test]
    fn default_path_optimizes() {
        let h = parse_text("++++[-]").expect("ok");
        assert_eq!(h.program().instructions(), &[Instruction::AdjustCell(4), Instruction::SetZero]);
    }

    #[test]
    fn o0_keeps_raw_tree() {
        let cfg = Config { opt_level: OptLevel::O0, ..Config::default() };
        let h = Compiler::new(cfg).parse_text("++").expect("ok");
        assert_eq!(h.program().len(), 2);
    }

    #[test]
    fn invalid_config_is_rejected_before_parsing() {
        let cfg = Config { tape_len: 0, ..Config::default() };
        assert!(matches!(Compiler::new(cfg).parse_text("+"), Err(Error::Config(_))));
        // aucun Handle ne porte un ruban que l’interpréteur ne pourrait pas allouer
        let cfg = Config { tape_len: usize::MAX, ..Config::default() };
        assert!(matches!(Compiler::new(cfg).parse_text("+."), Err(Error::Config(_))));
    }

    #[test]
    fn print_code_writes_to_stdout() {
        let h = parse_text("++++++++[>++++++++<-]>+.").expect("ok");
        assert!(h.print_code().is_ok());
        assert!(parse_text("").expect("ok").print_code().is_ok());
    }

    #[test]
    fn debug_marker_is_opt_in() {
        assert!(parse_text("#").expect("ok").program().is_empty());
        let cfg = Config { debug_marker: true, ..Config::default() };
        let h = Compiler::new(cfg).parse_text("#").expect("ok");
        assert!(h.program().has_debug_dump());
        assert!(h.code().contains("debug_dump(tape, ptr);"));
    }

    #[test]
    fn parse_error_never_yields_a_handle() {
        let err = parse_text("+[").unwrap_err();
        assert_eq!(err.as_parse(), Some(&ParseError::unmatched_open(1)));
    }

    #[test]
    fn clones_share_the_tree() {
        let h = parse_text("+.").expect("ok");
        let h2 = h.clone();
        assert!(Arc::ptr_eq(&h.program, &h2.program));
        assert_eq!(h.code(), h2.code());
    }
}
