//! error.rs — Erreurs structurées du moteur bf2c.
//!
//! - [`ParseError`] : crochet non apparié, avec l’offset (octet) du crochet fautif.
//! - [`Error`]      : erreur “publique” des points d’entrée (parse / émission).
//! - [`RuntimeError`] : erreurs de l’interpréteur de référence.
//!
//! Toutes les erreurs sont récupérables : le moteur ne fait jamais d’abort.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Nature d’une erreur de parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// `[` sans `]` correspondant en fin d’entrée.
    UnmatchedOpenBracket,
    /// `]` rencontré alors qu’aucune boucle n’est ouverte.
    UnmatchedCloseBracket,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnmatchedOpenBracket => f.write_str("'[' sans ']' correspondant"),
            ParseErrorKind::UnmatchedCloseBracket => f.write_str("']' sans '[' correspondant"),
        }
    }
}

/// Erreur de parsing : l’offset est celui, en octets, du crochet fautif dans la source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("{kind} (offset {offset})")]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn unmatched_open(offset: usize) -> Self {
        Self { offset, kind: ParseErrorKind::UnmatchedOpenBracket }
    }

    pub fn unmatched_close(offset: usize) -> Self {
        Self { offset, kind: ParseErrorKind::UnmatchedCloseBracket }
    }

    /// Ligne/colonne (1-based) de l’erreur dans `source`, pour les diagnostics.
    ///
    /// La colonne compte des octets : la source n’a pas d’encodage imposé.
    pub fn line_col(&self, source: &[u8]) -> (usize, usize) {
        let upto = &source[..self.offset.min(source.len())];
        let line = upto.iter().filter(|&&b| b == b'\n').count() + 1;
        let col = match upto.iter().rposition(|&b| b == b'\n') {
            Some(nl) => upto.len() - nl,
            None => upto.len() + 1,
        };
        (line, col)
    }
}

/// Erreur des points d’entrée du moteur.
#[derive(Debug, Error)]
pub enum Error {
    /// Source mal formée.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Fichier source introuvable.
    #[error("fichier introuvable: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Lecture / création / écriture échouée.
    #[error("io {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration incohérente (voir `Config::validate`).
    #[error("configuration invalide: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    /// Erreur de parsing sous-jacente, s’il y en a une.
    pub fn as_parse(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Erreurs de l’interpréteur de référence.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Le pointeur a quitté le ruban (le C généré, lui, ne vérifie pas).
    #[error("pointeur hors du ruban: {pointer} (taille {tape_len})")]
    PointerOutOfBounds { pointer: isize, tape_len: usize },

    /// Ruban impossible à allouer (taille hors de portée de la mémoire).
    #[error("ruban de {tape_len} cellules impossible à allouer")]
    TapeAlloc { tape_len: usize },

    /// Garde-fou anti-boucle infinie.
    #[error("limite d’instructions atteinte ({limit})")]
    StepLimitExceeded { limit: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let src = b"++\n+[\n-";
        let e = ParseError::unmatched_open(4);
        assert_eq!(e.line_col(src), (2, 2));
        assert_eq!(ParseError::unmatched_close(0).line_col(b"]"), (1, 1));
    }

    #[test]
    fn line_col_clamps_offset() {
        let e = ParseError::unmatched_open(99);
        assert_eq!(e.line_col(b"ab"), (1, 3));
    }

    #[test]
    fn messages_carry_context() {
        let e: Error = ParseError::unmatched_close(7).into();
        assert!(e.to_string().contains("offset 7"));
        assert!(e.as_parse().is_some());

        let e = Error::FileNotFound { path: PathBuf::from("nope.bf") };
        assert!(e.to_string().contains("nope.bf"));
        assert!(e.as_parse().is_none());
    }
}
