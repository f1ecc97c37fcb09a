//! optimize.rs — Passes peephole sur l’arbre d’instructions.
//!
//! Passes (appliquées de bas en haut, dans chaque corps de boucle) :
//!  1. fusion des séquences `AdjustCell` / `AdjustPointer` (somme nulle → supprimée)
//!  2. boucle de mise à zéro : `[d]` avec `d` impair → `SetZero`
//!  3. (O2) boucles mortes : une boucle ne pouvant jamais être entrée est retirée
//!
//! Chaque passe préserve l’ordre et les valeurs des E/S ainsi que l’état final du ruban.
//! Une réécriture dont on ne sait pas prouver cette équivalence n’a pas sa place ici.

use log::debug;

use crate::ast::{release, Instruction, Program};
use crate::config::OptLevel;

/// Compteurs de réécritures (pour logs / tests).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptStats {
    /// Instructions absorbées par une fusion.
    pub merged: usize,
    /// Séquences de somme nulle supprimées.
    pub noops_removed: usize,
    /// Boucles réécrites en `SetZero`.
    pub zero_loops: usize,
    /// Boucles jamais exécutées supprimées.
    pub dead_loops: usize,
}

/// Optimise `program` en place au niveau demandé.
pub fn optimize(program: &mut Program, level: OptLevel) -> OptStats {
    let mut stats = OptStats::default();
    if level == OptLevel::O0 {
        return stats;
    }
    let before = program.len();
    let body = std::mem::take(&mut program.body);
    program.body = optimize_tree(body, level, &mut stats);
    debug!(
        target: "bf2c::optimize",
        "{level}: {before} → {} instructions ({stats:?})",
        program.len()
    );
    stats
}

/// Séquence en cours de réécriture.
struct Frame {
    pending: std::vec::IntoIter<Instruction>,
    out: Vec<Instruction>,
    /// La séquence commence le programme (toutes les cellules valent 0).
    at_start: bool,
}

impl Frame {
    fn new(seq: Vec<Instruction>, at_start: bool) -> Self {
        Self { out: Vec::with_capacity(seq.len()), pending: seq.into_iter(), at_start }
    }
}

/// Réécrit l’arbre de bas en haut, avec une pile explicite de corps ouverts.
fn optimize_tree(root: Vec<Instruction>, level: OptLevel, stats: &mut OptStats) -> Vec<Instruction> {
    let mut stack = vec![Frame::new(root, true)];
    loop {
        let Some(top) = stack.last_mut() else {
            return Vec::new();
        };
        match top.pending.next() {
            Some(Instruction::Loop(body)) => {
                if level >= OptLevel::O2 && current_cell_known_zero(&top.out, top.at_start) {
                    stats.dead_loops += 1;
                    release(body);
                } else {
                    // La cellule courante est non nulle à l’entrée d’un corps de boucle.
                    stack.push(Frame::new(body, false));
                }
            }
            Some(instr) => push_merged(&mut top.out, instr, stats),
            None => {
                let done = stack.pop().map(|f| f.out).unwrap_or_default();
                let Some(parent) = stack.last_mut() else {
                    return done;
                };
                let instr = if is_zeroing_body(&done) {
                    stats.zero_loops += 1;
                    Instruction::SetZero
                } else {
                    Instruction::Loop(done)
                };
                push_merged(&mut parent.out, instr, stats);
            }
        }
    }
}

/// Ajoute `instr` à `out` en fusionnant avec la dernière instruction si possible.
/// Une fusion de somme nulle retire aussi la précédente, ce qui peut rendre
/// adjacentes deux séquences : la fusion se propage naturellement au push suivant.
fn push_merged(out: &mut Vec<Instruction>, instr: Instruction, stats: &mut OptStats) {
    let merged = match (out.last(), &instr) {
        (Some(Instruction::AdjustCell(a)), Instruction::AdjustCell(b)) => {
            Some(Instruction::AdjustCell(a.wrapping_add(*b)))
        }
        (Some(Instruction::AdjustPointer(a)), Instruction::AdjustPointer(b)) => {
            Some(Instruction::AdjustPointer(a.wrapping_add(*b)))
        }
        _ => None,
    };
    match merged {
        Some(m) => {
            out.pop();
            stats.merged += 1;
            if is_noop(&m) {
                stats.noops_removed += 1;
            } else {
                out.push(m);
            }
        }
        None if is_noop(&instr) => stats.noops_removed += 1,
        None => out.push(instr),
    }
}

fn is_noop(instr: &Instruction) -> bool {
    matches!(instr, Instruction::AdjustCell(0) | Instruction::AdjustPointer(0))
}

/// `[d]` avec `d` impair : `d` est inversible modulo 2^n, la boucle atteint 0
/// quelle que soit la valeur de départ et ne fait aucune E/S.
fn is_zeroing_body(body: &[Instruction]) -> bool {
    matches!(body, [Instruction::AdjustCell(d)] if d % 2 != 0)
}

/// Vrai si la cellule courante vaut forcément 0 après `emitted`.
fn current_cell_known_zero(emitted: &[Instruction], at_start: bool) -> bool {
    match emitted.last() {
        None => at_start,
        Some(Instruction::Loop(_) | Instruction::SetZero) => true,
        Some(_) => false,
    }
}
