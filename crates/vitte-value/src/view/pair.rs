//! Pairs `1x2` : appariement gelé de deux nombres.

use crate::buffer::BufferData;
use crate::cell::{Cell, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::Heap;
use crate::kind::Kind;

impl Heap {
    /// Pair de deux nombres, gelé.
    pub fn make_pair(&mut self, x: Cell, y: Cell) -> CellResult<Cell> {
        for c in [&x, &y] {
            if !c.is_bare() || !c.kind().is_number() {
                return Err(CellError::ElementKind { expected: "nombre", found: c.kind().name() });
            }
        }
        let id = self.alloc_managed(BufferData::Pairing(Box::new([x, y])));
        self.freeze(id)?;
        Ok(Cell::from_parts(Kind::Pair, Payload::Pairing(id)))
    }
}

/// Les deux composantes.
pub fn pair_parts(heap: &Heap, cell: &Cell) -> CellResult<(Cell, Cell)> {
    let Payload::Pairing(id) = *cell.payload() else {
        return Err(CellError::ElementKind { expected: "pair", found: cell.kind().name() });
    };
    match heap.readability_check(id)?.as_cells()? {
        [x, y] => Ok((*x, *y)),
        other => Err(CellError::OutOfRange { index: 2, length: other.len() }),
    }
}
