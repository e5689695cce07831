//! slot.rs — Écriture des variables : chemin ordinaire et chemin meta.
//!
//! Un slot de variable est une cellule qui peut contenir une antiforme
//! *stable* (contrairement à un slot de liste). Les antiformes instables
//! (pack, erreur levée, ghost) n'y entrent que sous leur forme meta.

use crate::cell::Cell;
use crate::error::{CellError, CellResult};

fn check_writable(slot: &Cell) -> CellResult<()> {
    if slot.is_protected() {
        return Err(CellError::Protected);
    }
    Ok(())
}

/// Écriture ordinaire : refuse les antiformes instables et les slots protégés.
pub fn assign(slot: &mut Cell, value: &Cell) -> CellResult<()> {
    check_writable(slot)?;
    if value.is_unstable_antiform() {
        return Err(CellError::UnstableAntiform { kind: value.kind() });
    }
    value.copy_into(slot);
    Ok(())
}

/// Écriture meta : stocke la forme meta de `value` (tout est accepté).
pub fn assign_meta(slot: &mut Cell, value: &Cell) -> CellResult<()> {
    check_writable(slot)?;
    let mut lifted = *value;
    lifted.meta()?;
    lifted.copy_into(slot);
    Ok(())
}

/// Lecture ordinaire d'un slot.
pub fn read(slot: &Cell) -> Cell {
    debug_assert!(slot.is_readable(), "lecture d'une variable effacée");
    *slot
}

/// Lecture meta : inverse de [`assign_meta`].
pub fn read_meta(slot: &Cell) -> CellResult<Cell> {
    let mut v = *slot;
    v.unmeta()?;
    Ok(v)
}

/// Pose ou retire la protection du slot (elle ne suit pas les copies).
pub fn protect(slot: &mut Cell, on: bool) {
    slot.set_protected(on);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Accept;
    use crate::kind::Kind;
    use pretty_assertions::assert_eq;

    fn ghost() -> Cell {
        let mut g = Cell::comma();
        g.coerce_to_antiform(Accept::Meta).unwrap();
        g
    }

    #[test]
    fn unstable_needs_meta_path() {
        let mut slot = Cell::trash();
        assert_eq!(assign(&mut slot, &ghost()), Err(CellError::UnstableAntiform { kind: Kind::Comma }));
        assert_eq!(slot, Cell::trash());

        assign_meta(&mut slot, &ghost()).unwrap();
        assert!(slot.is_quasiform());
        assert_eq!(read_meta(&slot).unwrap(), ghost());
    }

    #[test]
    fn stable_antiform_goes_through_ordinary_path() {
        let mut slot = Cell::blank();
        assign(&mut slot, &Cell::trash()).unwrap();
        assert!(read(&slot).is_antiform());
    }

    #[test]
    fn meta_of_plain_is_a_quote() {
        let mut slot = Cell::trash();
        assign_meta(&mut slot, &Cell::integer(3)).unwrap();
        assert_eq!(slot.quote_depth(), 1);
        assert_eq!(read_meta(&slot).unwrap(), Cell::integer(3));
    }

    #[test]
    fn protection_stays_with_the_slot() {
        let mut slot = Cell::integer(1);
        protect(&mut slot, true);
        assert_eq!(assign(&mut slot, &Cell::integer(2)), Err(CellError::Protected));
        assert_eq!(assign_meta(&mut slot, &Cell::integer(2)), Err(CellError::Protected));
        let copy = read(&slot);
        let mut other = Cell::trash();
        assign(&mut other, &copy).unwrap();
        assert!(!other.is_protected());
        protect(&mut slot, false);
        assign(&mut slot, &Cell::integer(2)).unwrap();
        assert_eq!(slot.as_integer(), Some(2));
    }
}
