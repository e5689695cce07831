//! Maps : pairlist `[k0 v0 k1 v1 …]`, recherche linéaire.
//!
//! L'égalité des clés passe par le tas : deux textes sont égaux si leurs
//! contenus le sont, quel que soit le buffer. Binding et flags sont ignorés.

use crate::buffer::BufferData;
use crate::cell::{Cell, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::{BufferId, Heap};
use crate::kind::Kind;
use crate::sequence::sequence_elements;
use crate::series;

use super::string::text_at;

impl Heap {
    /// Nouvelle map ; une clé répétée garde sa dernière valeur.
    pub fn make_map(&mut self, pairs: &[(Cell, Cell)]) -> CellResult<Cell> {
        let id = self.alloc_managed(BufferData::Cells(Vec::with_capacity(pairs.len() * 2)));
        let map = Cell::from_parts(Kind::Map, Payload::Map(id));
        for (key, value) in pairs {
            map_put(self, &map, key, value)?;
        }
        Ok(map)
    }
}

fn pairlist(cell: &Cell) -> CellResult<BufferId> {
    match *cell.payload() {
        Payload::Map(id) => Ok(id),
        _ => Err(CellError::ElementKind { expected: "map", found: cell.kind().name() }),
    }
}

/// Égalité de deux clés de map.
pub fn keys_equal(heap: &Heap, a: &Cell, b: &Cell) -> CellResult<bool> {
    if a.kind() != b.kind() || a.lift() != b.lift() || a.sigil() != b.sigil() {
        return Ok(false);
    }
    if a.kind() == Kind::Rune {
        return Ok(text_at(heap, a)? == text_at(heap, b)?);
    }
    match (a.payload(), b.payload()) {
        (Payload::Series { .. }, Payload::Series { .. }) => Ok(series::at(heap, a)? == series::at(heap, b)?),
        (Payload::Sequence(_), Payload::Sequence(_)) => {
            Ok(sequence_elements(heap, a)? == sequence_elements(heap, b)?)
        }
        (pa, pb) => Ok(pa == pb),
    }
}

/// Position (paire) de la clé dans la pairlist.
fn find(heap: &Heap, id: BufferId, key: &Cell) -> CellResult<Option<usize>> {
    let cells = heap.readability_check(id)?.as_cells()?;
    for (i, k) in cells.iter().step_by(2).enumerate() {
        if keys_equal(heap, k, key)? {
            return Ok(Some(i * 2));
        }
    }
    Ok(None)
}

/// Nombre de paires.
pub fn map_len(heap: &Heap, map: &Cell) -> CellResult<usize> {
    Ok(heap.readability_check(pairlist(map)?)?.len() / 2)
}

/// `None` si la clé est absente.
pub fn map_get(heap: &Heap, map: &Cell, key: &Cell) -> CellResult<Option<Cell>> {
    let id = pairlist(map)?;
    let Some(at) = find(heap, id, key)? else {
        return Ok(None);
    };
    Ok(heap.readability_check(id)?.as_cells()?.get(at + 1).copied())
}

fn check_mutable(map: &Cell) -> CellResult<BufferId> {
    if map.is_const() {
        return Err(CellError::ConstView);
    }
    pairlist(map)
}

/// Pose `key → value` (remplace la valeur si la clé existe).
pub fn map_put(heap: &mut Heap, map: &Cell, key: &Cell, value: &Cell) -> CellResult<()> {
    let id = check_mutable(map)?;
    for c in [key, value] {
        if !c.is_element() {
            return Err(CellError::NotAnElement { kind: c.kind() });
        }
    }
    match find(heap, id, key)? {
        Some(at) => heap.mutable(id)?.set_cell(at + 1, *value),
        None => {
            let buf = heap.mutable(id)?;
            let end = buf.len();
            buf.insert_cells(end, &[*key, *value])
        }
    }
}

/// Retire la clé ; `false` si elle était absente.
pub fn map_remove(heap: &mut Heap, map: &Cell, key: &Cell) -> CellResult<bool> {
    let id = check_mutable(map)?;
    let Some(at) = find(heap, id, key)? else {
        return Ok(false);
    };
    heap.mutable(id)?.remove(at, 2)?;
    Ok(true)
}

/// Paires clé/valeur, dans l'ordre d'insertion.
pub fn map_pairs(heap: &Heap, map: &Cell) -> CellResult<Vec<(Cell, Cell)>> {
    let cells = heap.readability_check(pairlist(map)?)?.as_cells()?;
    Ok(cells.chunks_exact(2).map(|kv| (kv[0], kv[1])).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_keys_compare_by_content() {
        let mut heap = Heap::new();
        let k1 = heap.make_string(Kind::Text, "clé");
        let k2 = heap.make_string(Kind::Text, "clé");
        let map = heap.make_map(&[(k1, Cell::integer(1))]).unwrap();
        assert_eq!(map_get(&heap, &map, &k2).unwrap(), Some(Cell::integer(1)));

        map_put(&mut heap, &map, &k2, &Cell::integer(2)).unwrap();
        assert_eq!(map_len(&heap, &map).unwrap(), 1);
        assert_eq!(map_get(&heap, &map, &k1).unwrap(), Some(Cell::integer(2)));

        let other = heap.make_string(Kind::File, "clé");
        assert_eq!(map_get(&heap, &map, &other).unwrap(), None);
    }

    #[test]
    fn words_ignore_binding() {
        let mut heap = Heap::new();
        let a = heap.make_word("a");
        let mut bound = a;
        bound.set_binding(crate::binding::Binding::new(5)).unwrap();
        let map = heap.make_map(&[(a, Cell::integer(1)), (Cell::integer(7), Cell::blank())]).unwrap();
        assert_eq!(map_get(&heap, &map, &bound).unwrap(), Some(Cell::integer(1)));
        assert!(map_remove(&mut heap, &map, &bound).unwrap());
        assert!(!map_remove(&mut heap, &map, &bound).unwrap());
        assert_eq!(map_pairs(&heap, &map).unwrap(), vec![(Cell::integer(7), Cell::blank())]);
    }

    #[test]
    fn antiform_values_and_const_views_are_refused() {
        let mut heap = Heap::new();
        let map = heap.make_map(&[]).unwrap();
        assert_eq!(
            map_put(&mut heap, &map, &Cell::integer(1), &Cell::trash()),
            Err(CellError::NotAnElement { kind: Kind::Blank })
        );
        assert_eq!(
            map_put(&mut heap, &map.constified(), &Cell::integer(1), &Cell::integer(2)),
            Err(CellError::ConstView)
        );
        assert_eq!(map_len(&heap, &map).unwrap(), 0);
    }
}
