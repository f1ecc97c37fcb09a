//! config.rs — Configuration du moteur bf2c.
//!
//! Noyau de configuration partagé par le lexer, l’optimiseur, l’émetteur C et
//! l’interpréteur de référence.
//!
//! - Defaults sûrs (`Config::default()`) : ruban de [`DEFAULT_TAPE_LEN`] cellules
//!   de [`DEFAULT_CELL_WIDTH`], optimisation `O1`.
//! - Lecture **ENV** (préfixe `BF2C_...`) via `Config::from_env()`
//! - **Overrides CLI** via `CliOverrides` (appliqués avec `apply_cli_overrides`)
//! - `validate()` pour refuser les combinaisons absurdes (ruban vide ou > [`MAX_TAPE_LEN`]).
//!
//! ENV supportés (tous facultatifs) :
//!   BF2C_TAPE_LEN=<usize>
//!   BF2C_CELL_BITS=8|16|32
//!   BF2C_OPT=O0|O1|O2
//!   BF2C_HEAP=0|1
//!   BF2C_DEBUG_MARKER=0|1
//!   BF2C_INDENT=<usize>
//!
//! Le fichier TOML est lu côté CLI (feature `serde` de ce crate).

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Nombre de cellules du ruban généré par défaut (valeur historique du langage).
pub const DEFAULT_TAPE_LEN: usize = 30_000;

/// Taille maximale acceptée par `validate()` (2^28 cellules : 1 Gio en `u32`).
pub const MAX_TAPE_LEN: usize = 1 << 28;

/// Largeur de cellule par défaut.
pub const DEFAULT_CELL_WIDTH: CellWidth = CellWidth::U8;

/// Indentation (espaces par niveau) du C émis.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/* ─────────────────────────── Types publics ─────────────────────────── */

/// Largeur d’une cellule du ruban (entier non signé, arithmétique modulaire).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellWidth { U8, U16, U32 }

impl CellWidth {
    pub fn bits(self) -> u32 {
        match self {
            CellWidth::U8 => 8,
            CellWidth::U16 => 16,
            CellWidth::U32 => 32,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(CellWidth::U8),
            16 => Some(CellWidth::U16),
            32 => Some(CellWidth::U32),
            _ => None,
        }
    }

    /// Masque de la valeur maximale d’une cellule.
    pub fn mask(self) -> u32 {
        match self {
            CellWidth::U8 => u32::from(u8::MAX),
            CellWidth::U16 => u32::from(u16::MAX),
            CellWidth::U32 => u32::MAX,
        }
    }

    /// Type C `<stdint.h>` correspondant.
    pub fn c_type(self) -> &'static str {
        match self {
            CellWidth::U8 => "uint8_t",
            CellWidth::U16 => "uint16_t",
            CellWidth::U32 => "uint32_t",
        }
    }
}

impl fmt::Display for CellWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.bits())
    }
}

/// Niveau d’optimisation.
///
/// - `O0` : arbre brut, une instruction par commande.
/// - `O1` : fusion des séquences + boucles de mise à zéro (défaut).
/// - `O2` : `O1` + suppression des boucles jamais exécutées.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptLevel { O0, O1, O2 }

impl fmt::Display for OptLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OptLevel::O0 => "O0",
            OptLevel::O1 => "O1",
            OptLevel::O2 => "O2",
        };
        f.write_str(s)
    }
}

/// Emplacement du ruban dans le programme C généré.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TapeStorage {
    /// Tableau `static` (zéro-initialisé par le C).
    Static,
    /// `calloc` au démarrage, `free` en sortie.
    Heap,
}

/// Configuration complète du moteur.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Nombre de cellules du ruban.
    pub tape_len: usize,
    /// Largeur d’une cellule.
    pub cell_width: CellWidth,
    pub opt_level: OptLevel,
    pub tape_storage: TapeStorage,
    /// `#` devient une commande de dump du ruban (extension, désactivée par défaut).
    pub debug_marker: bool,
    /// Espaces par niveau d’indentation dans le C émis.
    pub indent_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tape_len: DEFAULT_TAPE_LEN,
            cell_width: DEFAULT_CELL_WIDTH,
            opt_level: OptLevel::O1,
            tape_storage: TapeStorage::Static,
            debug_marker: false,
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

/* ─────────────────────── Overrides (CLI / couches) ─────────────────────── */

/// Overrides typiques fournis par une CLI en amont.
/// Toutes les valeurs sont optionnelles — applique-les avec `apply_cli_overrides`.
#[derive(Default, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CliOverrides {
    pub tape_len: Option<usize>,
    pub cell_width: Option<CellWidth>,
    pub opt_level: Option<OptLevel>,
    pub tape_storage: Option<TapeStorage>,
    pub debug_marker: Option<bool>,
    pub indent_width: Option<usize>,
}

impl Config {
    /// Construit depuis les valeurs par défaut + ENV.
    pub fn from_env() -> Self {
        let mut c = Self::default();
        c.apply_env();
        c
    }

    /// Applique les variables d’environnement `BF2C_*`. Les valeurs illisibles sont ignorées.
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    fn apply_vars(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(n) = get("BF2C_TAPE_LEN").as_deref().and_then(parse_usize) { self.tape_len = n; }
        if let Some(w) = get("BF2C_CELL_BITS").as_deref().and_then(parse_cell_bits) { self.cell_width = w; }
        if let Some(o) = get("BF2C_OPT").as_deref().and_then(parse_opt) { self.opt_level = o; }
        if let Some(b) = get("BF2C_HEAP").as_deref().and_then(parse_bool) {
            self.tape_storage = if b { TapeStorage::Heap } else { TapeStorage::Static };
        }
        if let Some(b) = get("BF2C_DEBUG_MARKER").as_deref().and_then(parse_bool) { self.debug_marker = b; }
        if let Some(n) = get("BF2C_INDENT").as_deref().and_then(parse_usize) { self.indent_width = n; }
    }

    /// Applique des overrides “dernier mot” typiquement issus d’une CLI.
    pub fn apply_cli_overrides(&mut self, o: &CliOverrides) {
        if let Some(x) = o.tape_len     { self.tape_len = x; }
        if let Some(x) = o.cell_width   { self.cell_width = x; }
        if let Some(x) = o.opt_level    { self.opt_level = x; }
        if let Some(x) = o.tape_storage { self.tape_storage = x; }
        if let Some(x) = o.debug_marker { self.debug_marker = x; }
        if let Some(x) = o.indent_width { self.indent_width = x; }
    }

    /// Validation de base.
    pub fn validate(&self) -> Result<()> {
        if self.tape_len == 0 {
            return Err(Error::Config("tape_len doit être > 0".into()));
        }
        if self.tape_len > MAX_TAPE_LEN {
            return Err(Error::Config(format!("tape_len doit être ≤ {MAX_TAPE_LEN}")));
        }
        if self.indent_width == 0 {
            return Err(Error::Config("indent_width doit être > 0".into()));
        }
        Ok(())
    }
}

/* ────────────────────────── Parsing d’ENV ────────────────────────── */

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no"  | "n" | "off"=> Some(false),
        _ => None,
    }
}

fn parse_usize(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok()
}

pub fn parse_cell_bits(s: &str) -> Option<CellWidth> {
    s.trim().trim_start_matches(|c| c == 'u' || c == 'U').parse::<u32>().ok().and_then(CellWidth::from_bits)
}

pub fn parse_opt(s: &str) -> Option<OptLevel> {
    match s.trim().to_ascii_uppercase().as_str() {
        "O0" | "0" => Some(OptLevel::O0),
        "O1" | "1" => Some(OptLevel::O1),
        "O2" | "2" => Some(OptLevel::O2),
        _ => None,
    }
}

/* ───────────────────────────── Tests ───────────────────────────── */
