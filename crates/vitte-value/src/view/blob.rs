//! Blob : octets arbitraires, NUL compris.

use crate::buffer::BufferData;
use crate::cell::{Cell, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::Heap;
use crate::kind::Kind;
use crate::series::{self, SeriesSlice};

impl Heap {
    /// Blob managé.
    pub fn make_blob(&mut self, bytes: &[u8]) -> Cell {
        let buffer = self.alloc_managed(BufferData::Bytes(bytes.to_vec()));
        Cell::from_parts(Kind::Blob, Payload::Series { buffer, index: 0 })
    }
}

/// Octets depuis l'index.
pub fn bytes_at<'h>(heap: &'h Heap, cell: &Cell) -> CellResult<&'h [u8]> {
    match series::at(heap, cell)? {
        SeriesSlice::Bytes(b) => Ok(b),
        _ => Err(CellError::ElementKind { expected: "octets", found: cell.kind().name() }),
    }
}

/// Décodage UTF-8 des octets depuis l'index.
pub fn utf8_at<'h>(heap: &'h Heap, cell: &Cell) -> CellResult<&'h str> {
    core::str::from_utf8(bytes_at(heap, cell)?).map_err(|_| CellError::InvalidUtf8)
}
