//! Paramètres d'action : classe de passage, typeset, flags, spec optionnelle.

use crate::buffer::BufferData;
use crate::cell::{Cell, ParamClass, ParamFlags, Payload, Typeset};
use crate::error::{CellError, CellResult};
use crate::heap::{BufferId, Heap};
use crate::kind::Kind;

impl Heap {
    /// Paramètre avec un bloc de description gelé.
    pub fn make_parameter(
        &mut self,
        class: ParamClass,
        types: Typeset,
        flags: ParamFlags,
        spec: &[Cell],
    ) -> CellResult<Cell> {
        if let Some(bad) = spec.iter().find(|c| !c.is_element()) {
            return Err(CellError::NotAnElement { kind: bad.kind() });
        }
        let id = self.alloc_managed(BufferData::Cells(spec.to_vec()));
        self.freeze(id)?;
        let mut param = Cell::parameter(class, types, flags);
        if let Payload::Parameter { spec, .. } = &mut param.payload {
            *spec = Some(id);
        }
        Ok(param)
    }
}

type Parts = (Option<BufferId>, ParamClass, Typeset, ParamFlags);

fn parts(cell: &Cell) -> Option<Parts> {
    debug_assert!(cell.kind() == Kind::Parameter, "{} n'est pas un paramètre", cell.kind());
    match *cell.payload() {
        Payload::Parameter { spec, class, types, flags } => Some((spec, class, types, flags)),
        _ => None,
    }
}

/// Classe de passage.
pub fn param_class(cell: &Cell) -> Option<ParamClass> {
    parts(cell).map(|p| p.1)
}

/// Kinds acceptés.
pub fn param_types(cell: &Cell) -> Option<Typeset> {
    parts(cell).map(|p| p.2)
}

/// Flags du paramètre.
pub fn param_flags(cell: &Cell) -> Option<ParamFlags> {
    parts(cell).map(|p| p.3)
}

/// Paramètre `/x`.
pub fn is_refinement(cell: &Cell) -> bool {
    param_flags(cell).is_some_and(|f| f.contains(ParamFlags::REFINEMENT))
}

/// Bloc de description (vide s'il n'y en a pas).
pub fn param_spec<'h>(heap: &'h Heap, cell: &Cell) -> CellResult<&'h [Cell]> {
    match parts(cell).and_then(|p| p.0) {
        Some(id) => heap.readability_check(id)?.as_cells(),
        None => Ok(&[]),
    }
}

/// Vrai si `value` peut être passé à ce paramètre. Un typeset vide accepte tout kind.
pub fn accepts(param: &Cell, value: &Cell) -> bool {
    let Some((_, class, types, _)) = parts(param) else {
        return false;
    };
    let typed = types.is_empty() || types.contains(value.kind());
    match class {
        ParamClass::Meta => true,
        ParamClass::Literal => value.is_element() && typed,
        ParamClass::Normal => !value.is_unstable_antiform() && typed,
    }
}
