//! interp.rs — Interpréteur de référence de l’arbre d’instructions.
//!
//! Même sémantique que le C émis (cellules modulaires de la largeur configurée,
//! `EOF` laisse la cellule inchangée, sortie = octet de poids faible), avec deux
//! garde-fous que le C n’a pas : accès hors ruban détecté, limite d’instructions.
//!
//! API:
//!   - `run(&Program, input, &Config, Limits) -> Result<Execution, RuntimeError>`

use std::ops::Range;

use log::debug;

use crate::ast::{Instruction, Program};
use crate::config::Config;
use crate::emit::DEBUG_WINDOW;
use crate::error::RuntimeError;

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Garde-fou : nombre maximal d’instructions exécutées (tours de boucle compris).
    pub max_steps: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self { max_steps: Some(10_000_000) }
    }
}

/// Résultat d’une exécution complète.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: Vec<u8>,
    /// État final du ruban.
    pub tape: Vec<u32>,
    pub pointer: isize,
    pub steps: u64,
}

impl Execution {
    /// Valeur finale de la cellule `ix` (0 hors ruban).
    pub fn cell(&self, ix: usize) -> u32 {
        self.tape.get(ix).copied().unwrap_or(0)
    }
}

/// Exécute `program` sur `input`.
pub fn run(
    program: &Program,
    input: &[u8],
    config: &Config,
    limits: Limits,
) -> Result<Execution, RuntimeError> {
    let mut tape = Vec::new();
    tape.try_reserve_exact(config.tape_len)
        .map_err(|_| RuntimeError::TapeAlloc { tape_len: config.tape_len })?;
    tape.resize(config.tape_len, 0);

    let mut m = Machine {
        tape,
        ptr: 0,
        mask: config.cell_width.mask(),
        input,
        in_pos: 0,
        output: Vec::new(),
        steps: 0,
        limits,
    };
    m.exec(program.instructions())?;
    debug!(target: "bf2c::interp", "{} pas, {} octets écrits", m.steps, m.output.len());
    Ok(Execution { output: m.output, tape: m.tape, pointer: m.ptr, steps: m.steps })
}

/// Fenêtre de `DEBUG_WINDOW` cellules centrée sur `ptr`, même calcul que `debug_dump` en C.
pub fn debug_window(tape_len: usize, ptr: usize) -> Range<usize> {
    let size = DEBUG_WINDOW.min(tape_len);
    let start = if ptr < size / 2 {
        0
    } else if ptr >= tape_len - size / 2 {
        tape_len - size
    } else {
        ptr - size / 2
    };
    start..start + size
}

/// Rendu texte de la fenêtre : `<n>` pour la cellule courante, `[n]` pour les autres.
pub fn render_window(tape: &[u32], ptr: isize) -> String {
    let current = usize::try_from(ptr).ok();
    debug_window(tape.len(), current.unwrap_or(0))
        .map(|i| {
            if Some(i) == current {
                format!("<{:3}>", tape[i])
            } else {
                format!("[{:3}]", tape[i])
            }
        })
        .collect()
}

struct Machine<'a> {
    tape: Vec<u32>,
    ptr: isize,
    mask: u32,
    input: &'a [u8],
    in_pos: usize,
    output: Vec<u8>,
    steps: u64,
    limits: Limits,
}

/// Corps en cours d’exécution et position de la prochaine instruction.
struct Frame<'p> {
    body: &'p [Instruction],
    next: usize,
}

impl Machine<'_> {
    fn exec(&mut self, program: &[Instruction]) -> Result<(), RuntimeError> {
        let mut stack = vec![Frame { body: program, next: 0 }];
        loop {
            let depth = stack.len();
            let Some(frame) = stack.last_mut() else {
                return Ok(());
            };
            let body = frame.body;
            let Some(instr) = body.get(frame.next) else {
                // fin d’un corps : la racine termine, une boucle reteste sa cellule
                if depth == 1 {
                    return Ok(());
                }
                self.tick()?;
                if *self.cell_mut()? != 0 {
                    frame.next = 0;
                } else {
                    stack.pop();
                }
                continue;
            };
            frame.next += 1;
            self.tick()?;
            match instr {
                Instruction::AdjustCell(d) => {
                    let mask = self.mask;
                    let cell = self.cell_mut()?;
                    *cell = cell.wrapping_add(*d as u32) & mask;
                }
                Instruction::AdjustPointer(d) => self.ptr = self.ptr.wrapping_add(*d),
                Instruction::Output => {
                    let v = *self.cell_mut()?;
                    self.output.push(v as u8);
                }
                Instruction::Input => {
                    // EOF : cellule inchangée
                    if let Some(&b) = self.input.get(self.in_pos) {
                        self.in_pos += 1;
                        let v = u32::from(b) & self.mask;
                        *self.cell_mut()? = v;
                    }
                }
                Instruction::Loop(inner) => {
                    if *self.cell_mut()? != 0 {
                        stack.push(Frame { body: inner, next: 0 });
                    }
                }
                Instruction::SetZero => *self.cell_mut()? = 0,
                Instruction::DebugDump => {
                    debug!(target: "bf2c::interp", "ruban: {}", render_window(&self.tape, self.ptr));
                }
            }
        }
    }

    fn tick(&mut self) -> Result<(), RuntimeError> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(limit) if self.steps > limit => Err(RuntimeError::StepLimitExceeded { limit }),
            _ => Ok(()),
        }
    }

    fn cell_mut(&mut self) -> Result<&mut u32, RuntimeError> {
        let (pointer, tape_len) = (self.ptr, self.tape.len());
        usize::try_from(pointer)
            .ok()
            .and_then(|ix| self.tape.get_mut(ix))
            .ok_or(RuntimeError::PointerOutOfBounds { pointer, tape_len })
    }
}
