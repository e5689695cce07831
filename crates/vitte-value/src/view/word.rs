//! Mots : symbole + binding.

use crate::cell::Cell;
use crate::heap::Heap;
use crate::kind::Kind;
use crate::lift::Lift;
use crate::symbol::Symbol;

impl Heap {
    /// Mot plain, sans binding.
    pub fn make_word(&mut self, spelling: &str) -> Cell {
        Cell::word(self.intern(spelling))
    }

    /// Mot antiforme (`~null~`, `~okay~`…), toujours stable.
    pub fn make_keyword(&mut self, spelling: &str) -> Cell {
        let mut c = self.make_word(spelling);
        c.header.lift = Lift::Anti;
        c
    }
}

/// Symbole d'un mot, quel que soit son lift ou son sigil.
pub fn word_symbol(cell: &Cell) -> Option<Symbol> {
    debug_assert!(cell.kind() == Kind::Word, "{} n'est pas un mot", cell.kind());
    cell.as_symbol()
}

/// Orthographe d'un mot (`""` pour un autre kind).
pub fn spelling<'h>(heap: &'h Heap, cell: &Cell) -> &'h str {
    word_symbol(cell).map_or("", |s| heap.spelling(s))
}

/// Vrai pour le mot antiforme `name`.
pub fn is_keyword(heap: &Heap, cell: &Cell, name: &str) -> bool {
    cell.kind() == Kind::Word && cell.is_antiform() && spelling(heap, cell) == name
}
