//! Any-string (text, file, email, url, tag) et texte des runes.

use crate::buffer::BufferData;
use crate::cell::{Cell, Payload};
use crate::error::{CellError, CellResult};
use crate::heap::Heap;
use crate::kind::Kind;
use crate::series::{self, SeriesSlice};

impl Heap {
    /// Nouvelle any-string, index 0, buffer managé.
    pub fn make_string(&mut self, kind: Kind, text: &str) -> Cell {
        debug_assert!(kind.is_any_string(), "{kind} n'est pas une any-string");
        let buffer = self.alloc_managed(BufferData::Text(text.to_owned()));
        Cell::from_parts(kind, Payload::Series { buffer, index: 0 })
    }

    /// Rune : en ligne si elle tient, sinon texte gelé dans un buffer.
    pub fn make_rune(&mut self, text: &str) -> Cell {
        if let Some(c) = Cell::rune(text) {
            return c;
        }
        let buffer = self.frozen_managed(BufferData::Text(text.to_owned()));
        Cell::from_parts(Kind::Rune, Payload::Series { buffer, index: 0 })
    }
}

/// Texte d'une any-string (depuis son index) ou d'une rune.
pub fn text_at<'a>(heap: &'a Heap, cell: &'a Cell) -> CellResult<&'a str> {
    if cell.kind() == Kind::Rune {
        return match cell.payload() {
            Payload::Inline(b) => b.as_str().ok_or(CellError::InvalidUtf8),
            Payload::Series { buffer, .. } => heap.readability_check(*buffer)?.as_str(),
            _ => Err(CellError::ElementKind { expected: "texte", found: Kind::Rune.name() }),
        };
    }
    match series::at(heap, cell)? {
        SeriesSlice::Text(s) => Ok(s),
        _ => Err(CellError::ElementKind { expected: "texte", found: cell.kind().name() }),
    }
}

/// Caractère unique d'une rune d'un seul caractère.
pub fn rune_char(heap: &Heap, cell: &Cell) -> CellResult<Option<char>> {
    let text = text_at(heap, cell)?;
    let mut chars = text.chars();
    Ok(match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    })
}

/// Copie du texte depuis l'index (pour les appelants qui veulent posséder).
pub fn to_owned_text(heap: &Heap, cell: &Cell) -> CellResult<String> {
    text_at(heap, cell).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn string_view_follows_index() {
        let mut heap = Heap::new();
        let s = heap.make_string(Kind::File, "dir/ïle.txt");
        let s4 = series::skip(&heap, &s, 4).unwrap();
        assert_eq!(text_at(&heap, &s4).unwrap(), "ïle.txt");
        assert_eq!(series::length_at(&heap, &s4).unwrap(), 7);
    }

    #[test]
    fn long_rune_lives_in_a_frozen_buffer() {
        let mut heap = Heap::new();
        let short = heap.make_rune("a");
        assert!(heap.is_empty());
        assert_eq!(rune_char(&heap, &short).unwrap(), Some('a'));

        let long = heap.make_rune("a rather long rune text");
        assert_eq!(heap.len(), 1);
        assert_eq!(text_at(&heap, &long).unwrap(), "a rather long rune text");
        assert_eq!(rune_char(&heap, &long).unwrap(), None);
        assert_eq!(heap.stats().frozen, 1);
    }
}
