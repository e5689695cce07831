//! Contextes (object, module, error, frame) : varlist + keylist.
//!
//! La varlist est un buffer de cellules-slots ; sa `keylist` est un buffer
//! de mots, un par slot, dans le même ordre. La résolution symbole → slot
//! à travers les scopes lexicaux n'est pas faite ici : on ne sait que lire
//! et écrire les slots d'un contexte donné, après vérification de lisibilité.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::buffer::BufferData;
use crate::cell::{Cell, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::{BufferId, Heap};
use crate::kind::Kind;
use crate::slot;
use crate::symbol::Symbol;

impl Heap {
    /// Nouveau contexte ; une clé répétée garde sa dernière valeur.
    pub fn make_context(&mut self, kind: Kind, vars: &[(Symbol, Cell)]) -> CellResult<Cell> {
        debug_assert!(
            matches!(kind, Kind::Object | Kind::Module | Kind::Error),
            "{kind} n'est pas un contexte simple"
        );
        let varlist = self.make_varlist(vars)?;
        Ok(Cell::from_parts(kind, Payload::Context(varlist)))
    }

    pub(crate) fn make_varlist(&mut self, vars: &[(Symbol, Cell)]) -> CellResult<BufferId> {
        let mut unique: IndexMap<Symbol, Cell> = IndexMap::with_capacity(vars.len());
        for (key, value) in vars {
            if value.is_unstable_antiform() {
                return Err(CellError::UnstableAntiform { kind: value.kind() });
            }
            let mut fresh = Cell::trash();
            value.copy_into(&mut fresh);
            unique.insert(*key, fresh);
        }
        let keys = unique.keys().map(|&k| Cell::word(k)).collect();
        let keylist = self.alloc_managed(BufferData::Cells(keys));
        let varlist = self.alloc_managed(BufferData::Cells(unique.into_values().collect()));
        self.readable_mut(varlist)?.keylist = Some(keylist);
        Ok(varlist)
    }
}

/// Varlist d'une cellule de contexte ou de frame.
pub fn varlist_of(cell: &Cell) -> CellResult<BufferId> {
    debug_assert!(cell.kind().is_any_context(), "{} n'est pas un contexte", cell.kind());
    match *cell.payload() {
        Payload::Context(varlist) | Payload::Frame { varlist, .. } => Ok(varlist),
        _ => Err(CellError::ElementKind { expected: "contexte", found: cell.kind().name() }),
    }
}

fn keylist_cells(heap: &Heap, varlist: BufferId) -> CellResult<&[Cell]> {
    let keylist = heap.readability_check(varlist)?.keylist().ok_or(CellError::MissingKey)?;
    heap.readability_check(keylist)?.as_cells()
}

fn slot_index(heap: &Heap, varlist: BufferId, key: Symbol) -> CellResult<usize> {
    keylist_cells(heap, varlist)?
        .iter()
        .position(|k| k.as_symbol() == Some(key))
        .ok_or(CellError::MissingKey)
}

fn var_slot(heap: &Heap, ctx: &Cell, key: Symbol) -> CellResult<Cell> {
    let varlist = varlist_of(ctx)?;
    let i = slot_index(heap, varlist, key)?;
    let vars = heap.readability_check(varlist)?.as_cells()?;
    vars.get(i).copied().ok_or(CellError::OutOfRange { index: i, length: vars.len() })
}

fn var_slot_mut<'h>(heap: &'h mut Heap, ctx: &Cell, key: Symbol) -> CellResult<&'h mut Cell> {
    if ctx.is_const() {
        return Err(CellError::ConstView);
    }
    let varlist = varlist_of(ctx)?;
    let i = slot_index(heap, varlist, key)?;
    heap.mutable(varlist)?.var_slot_mut(i)
}

/// Clés du contexte, dans l'ordre des slots.
pub fn keys(heap: &Heap, ctx: &Cell) -> CellResult<SmallVec<[Symbol; 8]>> {
    Ok(keylist_cells(heap, varlist_of(ctx)?)?.iter().filter_map(Cell::as_symbol).collect())
}

/// Nombre de slots.
pub fn context_len(heap: &Heap, ctx: &Cell) -> CellResult<usize> {
    Ok(heap.readability_check(varlist_of(ctx)?)?.len())
}

/// Vrai si `key` nomme un slot.
pub fn has_key(heap: &Heap, ctx: &Cell, key: Symbol) -> CellResult<bool> {
    match slot_index(heap, varlist_of(ctx)?, key) {
        Ok(_) => Ok(true),
        Err(CellError::MissingKey) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Lecture ordinaire d'une variable.
pub fn read(heap: &Heap, ctx: &Cell, key: Symbol) -> CellResult<Cell> {
    var_slot(heap, ctx, key).map(|s| slot::read(&s))
}

/// Lecture meta d'une variable écrite par [`write_meta`].
pub fn read_meta(heap: &Heap, ctx: &Cell, key: Symbol) -> CellResult<Cell> {
    slot::read_meta(&var_slot(heap, ctx, key)?)
}

/// Écriture ordinaire (antiformes instables refusées).
pub fn write(heap: &mut Heap, ctx: &Cell, key: Symbol, value: &Cell) -> CellResult<()> {
    slot::assign(var_slot_mut(heap, ctx, key)?, value)
}

/// Écriture meta (tout est accepté, stocké sous forme meta).
pub fn write_meta(heap: &mut Heap, ctx: &Cell, key: Symbol, value: &Cell) -> CellResult<()> {
    slot::assign_meta(var_slot_mut(heap, ctx, key)?, value)
}

/// Protège (ou libère) une variable contre l'écriture ordinaire.
pub fn protect(heap: &mut Heap, ctx: &Cell, key: Symbol, on: bool) -> CellResult<()> {
    slot::protect(var_slot_mut(heap, ctx, key)?, on);
    Ok(())
}

/// Ajoute une clé (ou écrit la variable si elle existe déjà).
pub fn append(heap: &mut Heap, ctx: &Cell, key: Symbol, value: &Cell) -> CellResult<()> {
    if has_key(heap, ctx, key)? {
        return write(heap, ctx, key, value);
    }
    if ctx.is_const() {
        return Err(CellError::ConstView);
    }
    if value.is_unstable_antiform() {
        return Err(CellError::UnstableAntiform { kind: value.kind() });
    }
    let varlist = varlist_of(ctx)?;
    let keylist = heap.readability_check(varlist)?.keylist().ok_or(CellError::MissingKey)?;
    // vérifié avant d'écrire quoi que ce soit
    heap.mutable(varlist)?;
    let mut fresh = Cell::trash();
    value.copy_into(&mut fresh);
    heap.mutable(keylist)?.push_var(Cell::word(key))?;
    heap.mutable(varlist)?.push_var(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Accept;
    use pretty_assertions::assert_eq;

    fn pack(heap: &mut Heap) -> Cell {
        let mut p = heap.make_list(Kind::Block, &[Cell::integer(1), Cell::integer(2)]).unwrap();
        p.coerce_to_antiform(Accept::Meta).unwrap();
        p
    }

    #[test]
    fn read_write_by_symbol() {
        let mut heap = Heap::new();
        let (a, b, z) = (heap.intern("a"), heap.intern("b"), heap.intern("z"));
        let obj = heap
            .make_context(Kind::Object, &[(a, Cell::integer(1)), (b, Cell::trash()), (a, Cell::integer(3))])
            .unwrap();
        assert_eq!(keys(&heap, &obj).unwrap().as_slice(), &[a, b]);
        assert_eq!(read(&heap, &obj, a).unwrap(), Cell::integer(3));
        assert!(read(&heap, &obj, b).unwrap().is_antiform());
        assert_eq!(read(&heap, &obj, z), Err(CellError::MissingKey));

        write(&mut heap, &obj, b, &Cell::integer(9)).unwrap();
        assert_eq!(read(&heap, &obj, b).unwrap().as_integer(), Some(9));
    }

    #[test]
    fn unstable_values_need_meta_write() {
        let mut heap = Heap::new();
        let x = heap.intern("x");
        let obj = heap.make_context(Kind::Object, &[(x, Cell::trash())]).unwrap();
        let p = pack(&mut heap);
        assert_eq!(write(&mut heap, &obj, x, &p), Err(CellError::UnstableAntiform { kind: Kind::Block }));
        write_meta(&mut heap, &obj, x, &p).unwrap();
        assert!(read(&heap, &obj, x).unwrap().is_quasiform());
        assert_eq!(read_meta(&heap, &obj, x).unwrap(), p);
    }

    #[test]
    fn protection_const_and_freeze() {
        let mut heap = Heap::new();
        let x = heap.intern("x");
        let obj = heap.make_context(Kind::Object, &[(x, Cell::integer(1))]).unwrap();

        protect(&mut heap, &obj, x, true).unwrap();
        assert_eq!(write(&mut heap, &obj, x, &Cell::integer(2)), Err(CellError::Protected));
        protect(&mut heap, &obj, x, false).unwrap();

        assert_eq!(write(&mut heap, &obj.constified(), x, &Cell::integer(2)), Err(CellError::ConstView));

        let varlist = varlist_of(&obj).unwrap();
        heap.freeze(varlist).unwrap();
        assert_eq!(write(&mut heap, &obj, x, &Cell::integer(2)), Err(CellError::Frozen { buffer: varlist }));
        assert_eq!(read(&heap, &obj, x).unwrap(), Cell::integer(1));
    }

    #[test]
    fn append_grows_keys_and_slots() {
        let mut heap = Heap::new();
        let (x, y) = (heap.intern("x"), heap.intern("y"));
        let obj = heap.make_context(Kind::Module, &[(x, Cell::integer(1))]).unwrap();
        append(&mut heap, &obj, y, &Cell::integer(2)).unwrap();
        append(&mut heap, &obj, x, &Cell::integer(5)).unwrap();
        assert_eq!(context_len(&heap, &obj).unwrap(), 2);
        assert_eq!(read(&heap, &obj, y).unwrap(), Cell::integer(2));
        assert_eq!(read(&heap, &obj, x).unwrap(), Cell::integer(5));
        assert!(has_key(&heap, &obj, y).unwrap());
    }

    #[test]
    fn decayed_varlist_reports_freed() {
        let mut heap = Heap::new();
        let x = heap.intern("x");
        let err = heap.make_context(Kind::Error, &[(x, Cell::integer(1))]).unwrap();
        let varlist = varlist_of(&err).unwrap();
        heap.decay(varlist).unwrap();
        assert_eq!(read(&heap, &err, x), Err(CellError::DataFreed { buffer: varlist }));
        assert_eq!(context_len(&heap, &err), Err(CellError::DataFreed { buffer: varlist }));
    }
}
