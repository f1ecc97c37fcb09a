//! ast.rs — Arbre d’instructions compilé.
//!
//! Un [`Program`] est une séquence d’[`Instruction`] ; chaque `Loop` possède
//! exclusivement son corps. Pas de références croisées : l’arbre est purement imbriqué.

use std::fmt;

/// Nœud de l’arbre compilé (type somme fermé : l’optimiseur et l’émetteur
/// doivent traiter chaque variante).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Variation nette de la cellule courante (arithmétique modulaire).
    AdjustCell(i32),
    /// Déplacement net du pointeur.
    AdjustPointer(isize),
    /// Écrit la cellule courante (un octet) sur la sortie.
    Output,
    /// Lit un octet dans la cellule courante ; en fin d’entrée la cellule est inchangée.
    Input,
    /// Répète le corps tant que la cellule courante est non nulle.
    Loop(Vec<Instruction>),
    /// Introduit par l’optimiseur : cellule courante ← 0.
    SetZero,
    /// Extension `#` : affiche une fenêtre du ruban sur stderr.
    DebugDump,
}

impl Instruction {
    pub fn is_loop(&self) -> bool {
        matches!(self, Instruction::Loop(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Instruction::Output | Instruction::Input)
    }

    fn mnemonic(&self) -> String {
        match self {
            Instruction::AdjustCell(d) => format!("ADD {d:+}"),
            Instruction::AdjustPointer(d) => format!("MOVE {d:+}"),
            Instruction::Output => "OUT".into(),
            Instruction::Input => "IN".into(),
            Instruction::Loop(body) => format!("LOOP ({} instr.)", body.len()),
            Instruction::SetZero => "ZERO".into(),
            Instruction::DebugDump => "DEBUG".into(),
        }
    }
}

/// Programme compilé : racine de l’arbre.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Program {
    pub(crate) body: Vec<Instruction>,
}

impl Program {
    pub fn new(body: Vec<Instruction>) -> Self {
        Self { body }
    }

    /// Instructions de premier niveau.
    pub fn instructions(&self) -> &[Instruction] {
        &self.body
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Nombre total de nœuds (boucles et corps compris).
    pub fn len(&self) -> usize {
        self.nodes().count()
    }

    /// Nombre de nœuds satisfaisant `pred`, à toute profondeur.
    pub fn count(&self, pred: impl Fn(&Instruction) -> bool) -> usize {
        self.nodes().filter(|n| pred(n.instr)).count()
    }

    /// Profondeur d’imbrication maximale des boucles (0 sans boucle).
    pub fn depth(&self) -> usize {
        self.nodes()
            .filter(|n| n.instr.is_loop())
            .map(|n| n.level + 1)
            .max()
            .unwrap_or(0)
    }

    /// Vrai si le programme lit ou écrit (détermine les `#include` nécessaires).
    pub fn performs_io(&self) -> bool {
        self.nodes().any(|n| n.instr.is_io())
    }

    pub fn has_debug_dump(&self) -> bool {
        self.nodes().any(|n| matches!(n.instr, Instruction::DebugDump))
    }

    /// Parcours préfixe de tout l’arbre, sans récursion.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { stack: vec![(self.body.len(), self.body.iter().enumerate())] }
    }
}

/// Libère une séquence sans descendre récursivement dans les corps de boucle.
pub(crate) fn release(seq: Vec<Instruction>) {
    let mut pending = seq;
    while let Some(instr) = pending.pop() {
        if let Instruction::Loop(body) = instr {
            pending.extend(body);
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.body));
    }
}

/// Nœud visité par [`Program::nodes`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    /// Niveau d’imbrication (0 = premier niveau).
    pub level: usize,
    /// Rang dans la séquence parente.
    pub index: usize,
    /// Longueur de la séquence parente.
    pub siblings: usize,
    pub instr: &'a Instruction,
}

/// Itérateur préfixe : pile explicite de séquences en cours.
pub struct Nodes<'a> {
    stack: Vec<(usize, std::iter::Enumerate<std::slice::Iter<'a, Instruction>>)>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Node<'a>> {
        loop {
            let level = self.stack.len().checked_sub(1)?;
            let (siblings, iter) = self.stack.last_mut()?;
            let siblings = *siblings;
            match iter.next() {
                Some((index, instr)) => {
                    if let Instruction::Loop(body) = instr {
                        self.stack.push((body.len(), body.iter().enumerate()));
                    }
                    return Some(Node { level, index, siblings, instr });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Dump indenté de l’arbre (un nœud par ligne, index par niveau).
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for n in self.nodes() {
            let pad = n.siblings.to_string().len();
            writeln!(f, "{:indent$}[{:>pad$}] {}", "", n.index, n.instr.mnemonic(), indent = n.level * 2)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use Instruction::*;

    fn sample() -> Program {
        Program::new(vec![
            AdjustCell(3),
            Loop(vec![AdjustPointer(1), Loop(vec![SetZero]), Output]),
            Input,
        ])
    }

    #[test]
    fn stats_walk_nested_bodies() {
        let p = sample();
        assert_eq!(p.len(), 7);
        assert_eq!(p.depth(), 2);
        assert_eq!(p.count(Instruction::is_loop), 2);
        assert!(p.performs_io());
        assert!(!p.has_debug_dump());
        assert_eq!(Program::default().depth(), 0);
    }

    #[test]
    fn display_is_an_indented_tree() {
        let text = sample().to_string();
        let expected = "\
[0] ADD +3
[1] LOOP (3 instr.)
  [0] MOVE +1
  [1] LOOP (1 instr.)
    [0] ZERO
  [2] OUT
[2] IN
";
        assert_eq!(text, expected);
    }

    #[test]
    fn nodes_are_visited_in_program_order() {
        let p = sample();
        let seen: Vec<(usize, usize)> = p.nodes().map(|n| (n.level, n.index)).collect();
        assert_eq!(seen, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (1, 2), (0, 2)]);
    }

    #[test]
    fn deep_nesting_is_walked_and_freed_iteratively() {
        let mut body = vec![Output];
        for _ in 0..200_000 {
            body = vec![Loop(body)];
        }
        let p = Program::new(body);
        assert_eq!(p.depth(), 200_000);
        assert_eq!(p.len(), 200_001);
        assert!(p.performs_io());
        drop(p);
    }
}
