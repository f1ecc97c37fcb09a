//! emit.rs — Émetteur C.
//!
//! Parcours structurel de l’arbre → source C autonome :
//! includes, ruban de `TAPE_LEN` cellules `cell_t` (non signées, modulaires),
//! pointeur `ptr` initialisé à 0 et jamais vérifié, `main`, `return 0`.
//!
//! Sortie déterministe : même arbre + même config ⇒ mêmes octets.
//!
//! Convention d’entrée : en fin d’entrée (`EOF`), `,` laisse la cellule inchangée.

use std::fmt::Write as _;
use std::io;

use crate::ast::{Instruction, Program};
use crate::config::{Config, TapeStorage};

/// Taille de la fenêtre affichée par `#` (centrée sur le pointeur).
pub const DEBUG_WINDOW: usize = 31;

const HEADER: &str = "/* generated by bf2c */\n";

const READ_CELL_FN: &str = "\
/* end of input leaves the cell unchanged */
static void read_cell(cell_t *cell) {
    int const c = getchar();
    if (c != EOF) {
        *cell = (cell_t)c;
    }
}
";

const DEBUG_DUMP_FN: &str = "\
static void debug_dump(cell_t const *tape, size_t ptr) {
    size_t const start = ptr < DBG_SIZE / 2 ? 0
                       : ptr >= TAPE_LEN - DBG_SIZE / 2 ? TAPE_LEN - DBG_SIZE
                       : ptr - DBG_SIZE / 2;
    fputc('\\n', stderr);
    for (size_t i = start; i < start + DBG_SIZE; ++i) {
        if (i == ptr) {
            fprintf(stderr, \"<%3lu>\", (unsigned long)tape[i]);
        } else {
            fprintf(stderr, \"[%3lu]\", (unsigned long)tape[i]);
        }
    }
    fputc('\\n', stderr);
}
";

/// Génère le source C de `program`.
pub fn emit_c(program: &Program, config: &Config) -> String {
    let mut e = CEmitter::new(config);
    e.emit_program(program);
    e.out
}

/// Génère puis écrit le source C dans `w` (un seul `write_all`).
pub fn write_c<W: io::Write>(w: &mut W, program: &Program, config: &Config) -> io::Result<()> {
    w.write_all(emit_c(program, config).as_bytes())?;
    w.flush()
}

struct CEmitter<'a> {
    config: &'a Config,
    out: String,
    level: usize,
}

impl<'a> CEmitter<'a> {
    fn new(config: &'a Config) -> Self {
        Self { config, out: String::new(), level: 0 }
    }

    fn emit_program(&mut self, program: &Program) {
        let io = program.performs_io();
        let has_input = program.count(|i| matches!(i, Instruction::Input)) > 0;
        let debug = program.has_debug_dump();
        let heap = self.config.tape_storage == TapeStorage::Heap;

        self.out.push_str(HEADER);
        self.out.push_str("#include <stddef.h>\n#include <stdint.h>\n");
        if io || debug {
            self.out.push_str("#include <stdio.h>\n");
        }
        if heap {
            self.out.push_str("#include <stdlib.h>\n");
        }
        self.out.push('\n');

        let _ = writeln!(self.out, "#define TAPE_LEN {}", self.config.tape_len);
        if debug {
            let _ = writeln!(self.out, "#define DBG_SIZE {}", DEBUG_WINDOW.min(self.config.tape_len));
        }
        let _ = writeln!(self.out, "typedef {} cell_t;", self.config.cell_width.c_type());
        self.out.push('\n');

        if has_input {
            self.out.push_str(READ_CELL_FN);
            self.out.push('\n');
        }
        if debug {
            self.out.push_str(DEBUG_DUMP_FN);
            self.out.push('\n');
        }

        self.out.push_str("int main(void) {\n");
        self.level = 1;
        if heap {
            self.line("cell_t *tape = calloc(TAPE_LEN, sizeof *tape);");
            self.line("if (tape == NULL) {");
            self.level += 1;
            self.line("return 1;");
            self.level -= 1;
            self.line("}");
        } else {
            self.line("static cell_t tape[TAPE_LEN];");
        }
        self.line("size_t ptr = 0;");
        if program.is_empty() {
            self.line("(void)tape;");
            self.line("(void)ptr;");
        }

        self.emit_seq(program.instructions());

        if heap {
            self.line("free(tape);");
        }
        self.line("return 0;");
        self.out.push_str("}\n");
    }

    /// Parcours avec une pile explicite : la profondeur d’imbrication n’est limitée que par le tas.
    fn emit_seq(&mut self, seq: &[Instruction]) {
        let mut stack = vec![seq.iter()];
        while let Some(iter) = stack.last_mut() {
            let Some(instr) = iter.next() else {
                stack.pop();
                if !stack.is_empty() {
                    self.level -= 1;
                    self.line("}");
                }
                continue;
            };
            match instr {
                Instruction::AdjustCell(d) => {
                    if let Some(stmt) = self.cell_update(*d) {
                        self.line(&stmt);
                    }
                }
                Instruction::AdjustPointer(d) => {
                    let stmt = if *d >= 0 {
                        format!("ptr += {d};")
                    } else {
                        format!("ptr -= {};", d.unsigned_abs())
                    };
                    self.line(&stmt);
                }
                Instruction::Output => self.line("putchar((unsigned char)tape[ptr]);"),
                Instruction::Input => self.line("read_cell(&tape[ptr]);"),
                Instruction::Loop(body) => {
                    self.line("while (tape[ptr]) {");
                    self.level += 1;
                    stack.push(body.iter());
                }
                Instruction::SetZero => self.line("tape[ptr] = 0;"),
                Instruction::DebugDump => self.line("debug_dump(tape, ptr);"),
            }
        }
    }

    /// `tape[ptr] += n;` ou `tape[ptr] -= n;` avec `d` ramené modulo la largeur de cellule.
    /// `None` si `d` est un multiple du module (aucun effet).
    fn cell_update(&self, d: i32) -> Option<String> {
        let modulus = u64::from(self.config.cell_width.mask()) + 1;
        let v = u64::from(d as u32) % modulus;
        if v == 0 {
            None
        } else if v <= modulus / 2 {
            Some(format!("tape[ptr] += {v};"))
        } else {
            Some(format!("tape[ptr] -= {};", modulus - v))
        }
    }

    fn line(&mut self, s: &str) {
        let indent = self.level * self.config.indent_width;
        let _ = writeln!(self.out, "{:indent$}{s}", "");
    }
}
