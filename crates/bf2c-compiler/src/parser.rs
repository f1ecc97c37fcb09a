//! parser.rs — Tokens → arbre d’instructions.
//!
//! Un seul passage gauche→droite avec une pile explicite de corps de boucle en cours.
//! Aucune fusion ici (un `+` = un `AdjustCell(1)`) : c’est le travail de l’optimiseur.

use crate::ast::{release, Instruction, Program};
use crate::error::ParseError;
use crate::lexer::{Command, Token};

/// Boucle ouverte : offset du `[` + corps accumulé.
struct Frame {
    offset: usize,
    body: Vec<Instruction>,
}

/// En cas d’erreur, les corps accumulés sont libérés sans récursion.
impl Drop for Frame {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.body));
    }
}

/// Construit le programme, ou l’erreur du premier crochet non apparié.
///
/// - `]` sans boucle ouverte → `UnmatchedCloseBracket` à l’offset du `]`
/// - `[` non fermés en fin d’entrée → `UnmatchedOpenBracket` à l’offset du plus externe
pub fn parse(tokens: &[Token]) -> Result<Program, ParseError> {
    let mut root = Program::default();
    let mut stack: Vec<Frame> = Vec::new();

    for tok in tokens {
        let instr = match tok.command {
            Command::LoopOpen => {
                stack.push(Frame { offset: tok.offset, body: Vec::new() });
                continue;
            }
            Command::LoopClose => {
                let mut frame = stack.pop().ok_or(ParseError::unmatched_close(tok.offset))?;
                Instruction::Loop(std::mem::take(&mut frame.body))
            }
            Command::Increment => Instruction::AdjustCell(1),
            Command::Decrement => Instruction::AdjustCell(-1),
            Command::MoveRight => Instruction::AdjustPointer(1),
            Command::MoveLeft => Instruction::AdjustPointer(-1),
            Command::Output => Instruction::Output,
            Command::Input => Instruction::Input,
            Command::DebugDump => Instruction::DebugDump,
        };
        match stack.last_mut() {
            Some(frame) => frame.body.push(instr),
            None => root.body.push(instr),
        }
    }

    if let Some(outermost) = stack.first() {
        return Err(ParseError::unmatched_open(outermost.offset));
    }
    Ok(root)
}
