//! symbol.rs — Interneur de symboles (Symbol ⇄ &str).
//!
//! Un `Symbol` est un indice stable dans la table ; deux orthographes
//! identiques donnent le même symbole. La comparaison est sensible à la casse.

use core::fmt;

use indexmap::IndexSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Symbole interné.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Symbol(u32);

impl Symbol {
    /// Indice interne.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sym#{}", self.0)
    }
}

/// Table d'internement.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    spellings: IndexSet<Box<str>>,
}

impl SymbolTable {
    /// Table vide.
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbole de `s`, créé au besoin.
    pub fn intern(&mut self, s: impl AsRef<str>) -> Symbol {
        let s = s.as_ref();
        if let Some(i) = self.spellings.get_index_of(s) {
            return Symbol(index_u32(i));
        }
        let (i, _) = self.spellings.insert_full(Box::from(s));
        Symbol(index_u32(i))
    }

    /// Symbole déjà interné, sans insertion.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.spellings.get_index_of(s).map(|i| Symbol(index_u32(i)))
    }

    /// Orthographe d'un symbole ; `""` pour un symbole étranger à la table.
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.spellings.get_index(sym.0 as usize).map_or("", |s| &**s)
    }

    /// Nombre de symboles distincts.
    pub fn len(&self) -> usize {
        self.spellings.len()
    }

    /// Aucun symbole.
    pub fn is_empty(&self) -> bool {
        self.spellings.is_empty()
    }
}

fn index_u32(i: usize) -> u32 {
    // plus de 4G symboles distincts : on sature plutôt que de tronquer
    u32::try_from(i).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let mut t = SymbolTable::new();
        let a = t.intern("foo");
        let b = t.intern("bar");
        assert_eq!(t.intern("foo"), a);
        assert_ne!(a, b);
        assert_eq!(t.resolve(b), "bar");
        assert_eq!(t.lookup("Foo"), None);
        assert_eq!(t.len(), 2);
    }
}
