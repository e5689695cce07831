//! series.rs — Protocole d'accès indexé (strings, blob, listes).
//!
//! Une cellule de série stocke `(buffer, index)`. L'index n'est jamais cru :
//! une autre cellule peut avoir raccourci le même buffer depuis. Chaque accès
//! revérifie donc la lisibilité du buffer puis `index ≤ longueur`.
//!
//! Position de queue (`index == longueur`) :
//! - [`length_at`] et [`at`] l'acceptent (longueur 0, tranche vide) ;
//! - [`element_at`] exige un élément réel (`index + offset < longueur`) ;
//! - les insertions l'acceptent, [`remove_at`] aussi (sans effet).

use crate::buffer::{char_to_byte, Buffer, BufferData};
use crate::cell::{Cell, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::{BufferId, Heap};

/// Tranche d'une série, de l'index de la cellule jusqu'à la queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesSlice<'a> {
    /// Octets restants.
    Bytes(&'a [u8]),
    /// Texte restant.
    Text(&'a str),
    /// Cellules restantes.
    Cells(&'a [Cell]),
}

impl SeriesSlice<'_> {
    /// Longueur logique (caractères pour le texte).
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(b) => b.len(),
            Self::Text(s) => s.chars().count(),
            Self::Cells(c) => c.len(),
        }
    }

    /// Rien après l'index.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Bytes(b) => b.is_empty(),
            Self::Text(s) => s.is_empty(),
            Self::Cells(c) => c.is_empty(),
        }
    }
}

/// Un élément isolé d'une série.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesItem {
    /// Octet d'un blob.
    Byte(u8),
    /// Caractère d'une string.
    Char(char),
    /// Cellule d'une liste.
    Cell(Cell),
}

/// `(buffer, index)` d'une cellule de série.
pub fn series_parts(cell: &Cell) -> CellResult<(BufferId, usize)> {
    debug_assert!(cell.kind().is_any_series(), "{} n'est pas une série", cell.kind());
    match *cell.payload() {
        Payload::Series { buffer, index } => Ok((buffer, index)),
        _ => Err(CellError::ElementKind { expected: "série", found: cell.kind().name() }),
    }
}

/// Buffer lisible + index validé (`index ≤ longueur`).
fn checked<'h>(heap: &'h Heap, cell: &Cell) -> CellResult<(&'h Buffer, usize, usize)> {
    let (id, index) = series_parts(cell)?;
    let buf = heap.readability_check(id)?;
    let length = buf.len();
    if index > length {
        return Err(CellError::OutOfRange { index, length });
    }
    Ok((buf, index, length))
}

/// Longueur restante depuis l'index de la cellule.
pub fn length_at(heap: &Heap, cell: &Cell) -> CellResult<usize> {
    let (_, index, length) = checked(heap, cell)?;
    Ok(length - index)
}

/// Contenu de l'index jusqu'à la queue.
pub fn at<'h>(heap: &'h Heap, cell: &Cell) -> CellResult<SeriesSlice<'h>> {
    let (buf, index, _) = checked(heap, cell)?;
    Ok(match buf.data() {
        BufferData::Bytes(b) => SeriesSlice::Bytes(&b[index..]),
        BufferData::Text(s) => SeriesSlice::Text(&s[char_to_byte(s, index)?..]),
        BufferData::Cells(_) | BufferData::Pairing(_) => {
            SeriesSlice::Cells(&buf.as_cells()?[index..])
        }
    })
}

/// Élément à `index + offset` ; la queue n'est pas un élément.
pub fn element_at(heap: &Heap, cell: &Cell, offset: usize) -> CellResult<SeriesItem> {
    let (buf, index, length) = checked(heap, cell)?;
    let pos = index.saturating_add(offset);
    if pos >= length {
        return Err(CellError::OutOfRange { index: pos, length });
    }
    Ok(match buf.data() {
        BufferData::Bytes(b) => SeriesItem::Byte(b[pos]),
        BufferData::Text(s) => {
            SeriesItem::Char(s.chars().nth(pos).ok_or(CellError::OutOfRange { index: pos, length })?)
        }
        BufferData::Cells(_) | BufferData::Pairing(_) => {
            SeriesItem::Cell(buf.as_cells()?[pos])
        }
    })
}

/// Refuse les vues `const` et les buffers gelés ; rend le buffer à muter.
pub fn ensure_mutable(heap: &Heap, cell: &Cell) -> CellResult<BufferId> {
    let (id, _) = series_parts(cell)?;
    if cell.is_const() {
        return Err(CellError::ConstView);
    }
    if heap.readability_check(id)?.is_frozen() {
        return Err(CellError::Frozen { buffer: id });
    }
    Ok(id)
}

/// Index stocké (non vérifié).
pub fn index_of(cell: &Cell) -> CellResult<usize> {
    series_parts(cell).map(|(_, i)| i)
}

fn with_index(cell: &Cell, index: usize) -> CellResult<Cell> {
    let (buffer, _) = series_parts(cell)?;
    let mut out = *cell;
    out.payload = Payload::Series { buffer, index };
    Ok(out)
}

/// Déplace l'index de `by`, borné à `[0, longueur]`.
pub fn skip(heap: &Heap, cell: &Cell, by: isize) -> CellResult<Cell> {
    let (_, index, length) = checked(heap, cell)?;
    let target = index.saturating_add_signed(by).min(length);
    with_index(cell, target)
}

/// Même série, index 0.
pub fn head(cell: &Cell) -> CellResult<Cell> {
    with_index(cell, 0)
}

/// Même série, index en queue.
pub fn tail(heap: &Heap, cell: &Cell) -> CellResult<Cell> {
    let (_, _, length) = checked(heap, cell)?;
    with_index(cell, length)
}

/* ─────────────────────────── Mutations ─────────────────────────── */

/// Index validé + buffer mutable.
fn mutable_at<'h>(heap: &'h mut Heap, cell: &Cell) -> CellResult<(&'h mut Buffer, usize)> {
    let id = ensure_mutable(heap, cell)?;
    let (_, index, _) = checked(heap, cell)?;
    Ok((heap.mutable(id)?, index))
}

/// Comme [`mutable_at`], avec réserve pour `additional` éléments de plus
/// (au moins `min_capacity`, selon la configuration du tas).
fn growable_at<'h>(
    heap: &'h mut Heap,
    cell: &Cell,
    additional: usize,
) -> CellResult<(&'h mut Buffer, usize)> {
    let min = heap.config().min_capacity;
    let (buf, index) = mutable_at(heap, cell)?;
    buf.reserve(additional.max(min));
    Ok((buf, index))
}

/// Ajoute des cellules en queue de la liste.
pub fn append_cells(heap: &mut Heap, list: &Cell, cells: &[Cell]) -> CellResult<()> {
    let (buf, _) = growable_at(heap, list, cells.len())?;
    let end = buf.len();
    buf.insert_cells(end, cells)
}

/// Insère des cellules à l'index de la cellule.
pub fn insert_cells(heap: &mut Heap, list: &Cell, cells: &[Cell]) -> CellResult<()> {
    let (buf, index) = growable_at(heap, list, cells.len())?;
    buf.insert_cells(index, cells)
}

/// Remplace l'élément à `index + offset`.
pub fn change_cell(heap: &mut Heap, list: &Cell, offset: usize, value: Cell) -> CellResult<()> {
    let (buf, index) = mutable_at(heap, list)?;
    buf.set_cell(index.saturating_add(offset), value)
}

/// Ajoute du texte en queue d'une any-string.
pub fn append_str(heap: &mut Heap, string: &Cell, text: &str) -> CellResult<()> {
    let (buf, _) = growable_at(heap, string, text.len())?;
    let end = buf.len();
    buf.insert_str(end, text)
}

/// Insère du texte à l'index de la cellule.
pub fn insert_str(heap: &mut Heap, string: &Cell, text: &str) -> CellResult<()> {
    let (buf, index) = growable_at(heap, string, text.len())?;
    buf.insert_str(index, text)
}

/// Ajoute des octets en queue d'un blob.
pub fn append_bytes(heap: &mut Heap, blob: &Cell, bytes: &[u8]) -> CellResult<()> {
    let (buf, _) = growable_at(heap, blob, bytes.len())?;
    let end = buf.len();
    buf.insert_bytes(end, bytes)
}

/// Retire `count` éléments à partir de l'index.
pub fn remove_at(heap: &mut Heap, cell: &Cell, count: usize) -> CellResult<()> {
    let (buf, index) = mutable_at(heap, cell)?;
    buf.remove(index, count)
}

/// Coupe le buffer à l'index de la cellule (`clear`).
pub fn truncate_at(heap: &mut Heap, cell: &Cell) -> CellResult<()> {
    let (buf, index) = mutable_at(heap, cell)?;
    buf.truncate(index)
}

/// Coupe le buffer à `len` éléments, quel que soit l'index de la cellule.
pub fn truncate(heap: &mut Heap, cell: &Cell, len: usize) -> CellResult<()> {
    let id = ensure_mutable(heap, cell)?;
    heap.mutable(id)?.truncate(len)
}
