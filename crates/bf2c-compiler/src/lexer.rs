//! lexer.rs — Source brute → suite de commandes.
//!
//! Tout octet hors de l’alphabet est un commentaire et disparaît silencieusement.
//! Chaque commande retenue garde son offset (octet) d’origine pour les diagnostics.

use log::trace;

/// Commande atomique du langage source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Increment,
    Decrement,
    MoveRight,
    MoveLeft,
    Output,
    Input,
    LoopOpen,
    LoopClose,
    /// `#`, uniquement si le marqueur de debug est activé.
    DebugDump,
}

impl Command {
    /// Commande correspondant à `byte`, ou `None` pour un commentaire.
    pub fn from_byte(byte: u8, debug_marker: bool) -> Option<Self> {
        let cmd = match byte {
            b'+' => Command::Increment,
            b'-' => Command::Decrement,
            b'>' => Command::MoveRight,
            b'<' => Command::MoveLeft,
            b'.' => Command::Output,
            b',' => Command::Input,
            b'[' => Command::LoopOpen,
            b']' => Command::LoopClose,
            b'#' if debug_marker => Command::DebugDump,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn symbol(self) -> char {
        match self {
            Command::Increment => '+',
            Command::Decrement => '-',
            Command::MoveRight => '>',
            Command::MoveLeft => '<',
            Command::Output => '.',
            Command::Input => ',',
            Command::LoopOpen => '[',
            Command::LoopClose => ']',
            Command::DebugDump => '#',
        }
    }
}

/// Commande + position dans la source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub command: Command,
    pub offset: usize,
}

/// Options du lexer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexOptions {
    pub debug_marker: bool,
}

/// Découpe `source` en tokens. Ne peut pas échouer.
pub fn lex(source: &[u8], opts: LexOptions) -> Vec<Token> {
    let tokens: Vec<Token> = source
        .iter()
        .enumerate()
        .filter_map(|(offset, &b)| {
            Command::from_byte(b, opts.debug_marker).map(|command| Token { command, offset })
        })
        .collect();
    trace!(target: "bf2c::lexer", "{} octets → {} tokens", source.len(), tokens.len());
    tokens
}
