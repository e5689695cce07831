//! Listes : block `[…]`, group `(…)`, fence `{…}`.

use crate::buffer::BufferData;
use crate::cell::{Accept, Cell, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::Heap;
use crate::kind::Kind;
use crate::series::{self, SeriesSlice};

impl Heap {
    /// Nouvelle liste managée ; refuse les antiformes.
    pub fn make_list(&mut self, kind: Kind, cells: &[Cell]) -> CellResult<Cell> {
        debug_assert!(kind.is_any_list(), "{kind} n'est pas une liste");
        if let Some(bad) = cells.iter().find(|c| !c.is_element()) {
            return Err(CellError::NotAnElement { kind: bad.kind() });
        }
        let buffer = self.alloc_managed(BufferData::Cells(cells.to_vec()));
        Ok(Cell::from_parts(kind, Payload::Series { buffer, index: 0 }))
    }

    /// Splice : antiforme de group, contenu à épisser par l'appelant.
    pub fn make_splice(&mut self, cells: &[Cell]) -> CellResult<Cell> {
        let mut group = self.make_list(Kind::Group, cells)?;
        group.coerce_to_antiform(Accept::Stable)?;
        Ok(group)
    }
}

/// Cellules depuis l'index.
pub fn cells_at<'h>(heap: &'h Heap, cell: &Cell) -> CellResult<&'h [Cell]> {
    match series::at(heap, cell)? {
        SeriesSlice::Cells(c) => Ok(c),
        _ => Err(CellError::ElementKind { expected: "cellules", found: cell.kind().name() }),
    }
}
