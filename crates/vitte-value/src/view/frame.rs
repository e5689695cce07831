//! Frames : varlist d'un appel + lentille (phase en cours ou label en cache).
//!
//! Quand la frame n'exécute pas, la cellule garde le label à afficher ; quand
//! elle exécute, elle pointe la phase, qui porte le label. La résolution du
//! nom ne touche jamais la varlist : une frame expirée reste nommable.

use crate::buffer::BufferData;
use crate::cell::{Accept, Cell, FrameLens, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::{BufferId, Heap};
use crate::kind::Kind;
use crate::symbol::Symbol;

use super::context::varlist_of;

impl Heap {
    /// Phase : corps gelé d'une action, porteur de son label.
    pub fn make_phase(&mut self, label: Option<Symbol>, body: &[Cell]) -> CellResult<BufferId> {
        if let Some(bad) = body.iter().find(|c| !c.is_element()) {
            return Err(CellError::NotAnElement { kind: bad.kind() });
        }
        let id = self.alloc_managed(BufferData::Cells(body.to_vec()));
        self.readable_mut(id)?.label = label;
        self.freeze(id)?;
        Ok(id)
    }

    /// Nouvelle frame (kind `frame!`, plain).
    pub fn make_frame(&mut self, vars: &[(Symbol, Cell)], lens: FrameLens) -> CellResult<Cell> {
        let varlist = self.make_varlist(vars)?;
        Ok(Cell::from_parts(Kind::Frame, Payload::Frame { varlist, lens }))
    }

    /// Fin d'appel : la varlist expire, la cellule reste nommable.
    pub fn expire_frame(&mut self, frame: &Cell) -> CellResult<()> {
        self.decay(varlist_of(frame)?)
    }
}

/// Lentille courante du frame.
pub fn frame_lens(cell: &Cell) -> CellResult<FrameLens> {
    match *cell.payload() {
        Payload::Frame { lens, .. } => Ok(lens),
        _ => Err(CellError::ElementKind { expected: "frame", found: cell.kind().name() }),
    }
}

/// Nom à afficher pour la frame.
pub fn frame_label(heap: &Heap, cell: &Cell) -> CellResult<Option<Symbol>> {
    match frame_lens(cell)? {
        FrameLens::Phase(phase) => Ok(heap.readability_check(phase)?.label()),
        FrameLens::Label(label) => Ok(label),
    }
}

/// Remplace la lentille ; la varlist ne bouge pas.
pub fn set_lens(cell: &mut Cell, lens: FrameLens) -> CellResult<()> {
    let found = cell.kind().name();
    match &mut cell.payload {
        Payload::Frame { lens: slot, .. } => {
            *slot = lens;
            Ok(())
        }
        _ => Err(CellError::ElementKind { expected: "frame", found }),
    }
}

/// La frame cesse d'exécuter : le label de la phase est mis en cache.
pub fn cache_label(heap: &Heap, cell: &mut Cell) -> CellResult<()> {
    let label = frame_label(heap, cell)?;
    set_lens(cell, FrameLens::Label(label))
}

/// Action : antiforme (stable) d'une frame.
pub fn into_action(mut frame: Cell) -> CellResult<Cell> {
    debug_assert!(frame.kind() == Kind::Frame, "{} n'est pas une frame", frame.kind());
    frame.coerce_to_antiform(Accept::Stable)?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::context;
    use pretty_assertions::assert_eq;

    #[test]
    fn label_comes_from_phase_or_cache() {
        let mut heap = Heap::new();
        let (append, x) = (heap.intern("append"), heap.intern("x"));
        let phase = heap.make_phase(Some(append), &[]).unwrap();
        let mut f = heap.make_frame(&[(x, Cell::integer(1))], FrameLens::Phase(phase)).unwrap();
        assert_eq!(frame_label(&heap, &f).unwrap(), Some(append));

        cache_label(&heap, &mut f).unwrap();
        assert_eq!(frame_lens(&f).unwrap(), FrameLens::Label(Some(append)));
    }

    #[test]
    fn expired_frame_keeps_its_name() {
        let mut heap = Heap::new();
        let (foo, x) = (heap.intern("foo"), heap.intern("x"));
        let f = heap.make_frame(&[(x, Cell::integer(1))], FrameLens::Label(Some(foo))).unwrap();
        assert_eq!(context::read(&heap, &f, x).unwrap(), Cell::integer(1));

        heap.expire_frame(&f).unwrap();
        let varlist = varlist_of(&f).unwrap();
        assert_eq!(context::read(&heap, &f, x), Err(CellError::DataFreed { buffer: varlist }));
        assert_eq!(frame_label(&heap, &f).unwrap(), Some(foo));
    }

    #[test]
    fn action_is_a_stable_antiform() {
        let mut heap = Heap::new();
        let f = heap.make_frame(&[], FrameLens::Label(None)).unwrap();
        let action = into_action(f).unwrap();
        assert!(action.is_antiform() && !action.is_unstable_antiform());
    }
}
