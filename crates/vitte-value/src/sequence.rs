//! sequence.rs — Séquences (tuple `a.b`, chain `a:b`, path `a/b`).
//!
//! Une séquence est immuable dès sa construction. Son payload choisit la
//! forme la plus compacte qui convient, dans cet ordre :
//!
//! 1. `Bytes` : que des entiers `0..=255`, stockés en ligne ;
//! 2. `WordLike` : un mot et un blank (`/foo`, `foo:`, `.foo`) ;
//! 3. `Pair` : deux éléments quelconques, dans un appariement gelé ;
//! 4. `Array` : tableau de cellules gelé.
//!
//! Les lecteurs ne voient jamais la forme : [`sequence_len`],
//! [`sequence_at`] et [`sequence_elements`] donnent le même résultat pour
//! toutes les représentations d'une même suite d'éléments.

use smallvec::SmallVec;

use crate::buffer::BufferData;
use crate::cell::{Cell, InlineBytes, Payload};
use crate::error::{CellError, CellResult, RejectReason, Rejection};
use crate::heap::{BufferId, Heap};
use crate::kind::Kind;
use crate::symbol::Symbol;

/// Côté du blank dans une séquence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlankSide {
    /// `/foo`
    Leading,
    /// `foo/`
    Trailing,
}

/// Représentation interne d'une séquence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceRepr {
    /// Octets en ligne (entiers `0..=255`).
    Bytes(InlineBytes),
    /// Un mot et un blank.
    WordLike {
        /// Le mot.
        symbol: Symbol,
        /// Côté du blank.
        blank: BlankSide,
    },
    /// Deux cellules dans un appariement gelé.
    Pair(BufferId),
    /// Tableau de cellules gelé.
    Array(BufferId),
}

/// Politique de compactage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Forme la plus compacte.
    #[default]
    Adaptive,
    /// Toujours un tableau (forme de référence).
    Never,
}

/* ─────────────────────────── Validation ─────────────────────────── */

fn reject(index: usize, reason: RejectReason) -> Rejection {
    Rejection::Element { index, reason }
}

/// Séquences admises comme éléments d'une séquence `outer`.
const fn may_nest(outer: Kind, inner: Kind) -> bool {
    match outer {
        Kind::Path => matches!(inner, Kind::Chain | Kind::Tuple),
        Kind::Chain => matches!(inner, Kind::Tuple),
        _ => false,
    }
}

fn check_element(
    heap: &Heap,
    outer: Kind,
    index: usize,
    len: usize,
    cell: &Cell,
) -> Result<(), Rejection> {
    if !cell.is_bare() {
        return Err(reject(index, RejectReason::NotPlain));
    }
    let kind = cell.kind();
    match kind {
        Kind::Blank => {
            if index != 0 && index + 1 != len {
                return Err(reject(index, RejectReason::InteriorBlank));
            }
        }
        Kind::Word => {
            let spelling = cell.as_symbol().map_or("", |s| heap.spelling(s));
            if spelling.contains(['/', ':', '.']) {
                return Err(reject(index, RejectReason::IllegalSpelling));
            }
        }
        Kind::Integer | Kind::Rune | Kind::Text | Kind::Tag | Kind::Block | Kind::Group | Kind::Fence => {}
        k if k.is_any_sequence() => {
            if !may_nest(outer, k) {
                return Err(reject(index, RejectReason::Nesting(k)));
            }
        }
        k => return Err(reject(index, RejectReason::Kind(k))),
    }
    Ok(())
}

fn validate(heap: &Heap, kind: Kind, elements: &[Cell]) -> Result<(), Rejection> {
    if !kind.is_any_sequence() {
        return Err(Rejection::NotSequence(kind));
    }
    let len = elements.len();
    if len < 2 {
        return Err(Rejection::TooShort { len });
    }
    for (i, c) in elements.iter().enumerate() {
        check_element(heap, kind, i, len, c)?;
    }
    if elements.iter().all(Cell::is_blank) {
        return Err(Rejection::AllBlank);
    }
    if elements[0].is_blank() && elements[len - 1].is_blank() {
        return Err(reject(len - 1, RejectReason::BlankAtBothEnds));
    }
    Ok(())
}

/* ─────────────────────────── Construction ─────────────────────────── */

/// Élément « nu » : aucun flag ni binding à perdre en ligne.
fn is_pristine(c: &Cell) -> bool {
    c.flags().is_empty() && c.binding().is_none()
}

fn try_bytes(elements: &[Cell], max_inline: usize) -> Option<InlineBytes> {
    if elements.len() > max_inline {
        return None;
    }
    let bytes: SmallVec<[u8; 16]> = elements
        .iter()
        .map(|c| {
            if !is_pristine(c) {
                return None;
            }
            c.as_integer().and_then(|i| u8::try_from(i).ok())
        })
        .collect::<Option<_>>()?;
    InlineBytes::new(&bytes)
}

fn try_word_like(elements: &[Cell]) -> Option<SequenceRepr> {
    let [first, second] = elements else {
        return None;
    };
    let (word, blank) = match (first.is_blank(), second.is_blank()) {
        (true, false) => (second, BlankSide::Leading),
        (false, true) => (first, BlankSide::Trailing),
        _ => return None,
    };
    if !is_pristine(word) || !is_pristine(if blank == BlankSide::Leading { first } else { second }) {
        return None;
    }
    word.as_symbol().map(|symbol| SequenceRepr::WordLike { symbol, blank })
}

impl Heap {
    /// Construit une séquence compactée.
    pub fn make_sequence(&mut self, kind: Kind, elements: &[Cell]) -> Result<Cell, Rejection> {
        self.make_sequence_with(kind, elements, Compression::Adaptive)
    }

    /// Construit une séquence avec une politique de compactage explicite.
    pub fn make_sequence_with(
        &mut self,
        kind: Kind,
        elements: &[Cell],
        compression: Compression,
    ) -> Result<Cell, Rejection> {
        validate(self, kind, elements)?;

        let compact = match compression {
            Compression::Never => None,
            Compression::Adaptive => try_bytes(elements, self.config().max_sequence_inline)
                .map(SequenceRepr::Bytes)
                .or_else(|| try_word_like(elements)),
        };
        let repr = match compact {
            Some(r) => r,
            None if compression == Compression::Adaptive && elements.len() == 2 => {
                let pairing = Box::new([elements[0], elements[1]]);
                SequenceRepr::Pair(self.frozen_managed(BufferData::Pairing(pairing)))
            }
            None => SequenceRepr::Array(self.frozen_managed(BufferData::Cells(elements.to_vec()))),
        };
        heap_event!(trace, ?kind, ?repr, "make_sequence");
        Ok(Cell::from_parts(kind, Payload::Sequence(repr)))
    }

    /// Buffer managé et gelé d'emblée.
    pub(crate) fn frozen_managed(&mut self, data: BufferData) -> BufferId {
        let id = self.alloc_managed(data);
        // buffer neuf : toujours lisible
        let _ = self.freeze(id);
        id
    }
}

/* ─────────────────────────── Contrat de lecture ─────────────────────────── */

/// Représentation d'une cellule de séquence.
pub fn sequence_repr(cell: &Cell) -> CellResult<SequenceRepr> {
    debug_assert!(cell.kind().is_any_sequence(), "{} n'est pas une séquence", cell.kind());
    match *cell.payload() {
        Payload::Sequence(r) => Ok(r),
        _ => Err(CellError::ElementKind { expected: "séquence", found: cell.kind().name() }),
    }
}

impl SequenceRepr {
    /// Nombre d'éléments, quelle que soit la forme.
    pub fn len(self, heap: &Heap) -> CellResult<usize> {
        Ok(match self {
            Self::Bytes(b) => b.len(),
            Self::WordLike { .. } => 2,
            Self::Pair(id) | Self::Array(id) => heap.readability_check(id)?.len(),
        })
    }

    /// Élément `index` tel que stocké (sans héritage de binding).
    pub fn element(self, heap: &Heap, index: usize) -> CellResult<Cell> {
        Ok(match self {
            Self::Bytes(b) => {
                let byte = b.as_slice().get(index).copied();
                Cell::integer(i64::from(byte.ok_or(CellError::OutOfRange { index, length: b.len() })?))
            }
            Self::WordLike { symbol, blank } => match (index, blank) {
                (0, BlankSide::Leading) | (1, BlankSide::Trailing) => Cell::blank(),
                (0 | 1, _) => Cell::word(symbol),
                _ => return Err(CellError::OutOfRange { index, length: 2 }),
            },
            Self::Pair(id) | Self::Array(id) => {
                let cells = heap.readability_check(id)?.as_cells()?;
                *cells.get(index).ok_or(CellError::OutOfRange { index, length: cells.len() })?
            }
        })
    }
}

/// Nombre d'éléments.
pub fn sequence_len(heap: &Heap, cell: &Cell) -> CellResult<usize> {
    sequence_repr(cell)?.len(heap)
}

/// Élément `index`. Un mot sans binding hérite de celui de la séquence.
pub fn sequence_at(heap: &Heap, cell: &Cell, index: usize) -> CellResult<Cell> {
    let mut out = sequence_repr(cell)?.element(heap, index)?;
    if out.kind() == Kind::Word && out.binding().is_none() {
        out.binding = cell.binding();
    }
    Ok(out)
}

/// Tous les éléments, dans l'ordre.
pub fn sequence_elements(heap: &Heap, cell: &Cell) -> CellResult<SmallVec<[Cell; 4]>> {
    let len = sequence_len(heap, cell)?;
    (0..len).map(|i| sequence_at(heap, cell, i)).collect()
}

/// Côté du blank, s'il y en a un.
pub fn blank_side(heap: &Heap, cell: &Cell) -> CellResult<Option<BlankSide>> {
    if let SequenceRepr::WordLike { blank, .. } = sequence_repr(cell)? {
        return Ok(Some(blank));
    }
    let len = sequence_len(heap, cell)?;
    if sequence_at(heap, cell, 0)?.is_blank() {
        return Ok(Some(BlankSide::Leading));
    }
    if sequence_at(heap, cell, len - 1)?.is_blank() {
        return Ok(Some(BlankSide::Trailing));
    }
    Ok(None)
}

/// `/foo`, `:foo`, `.foo` : deux éléments, blank en tête puis un mot,
/// quel que soit le kind de séquence et sa représentation.
pub fn is_refinement_like(heap: &Heap, cell: &Cell) -> CellResult<bool> {
    if !cell.kind().is_any_sequence() || sequence_len(heap, cell)? != 2 {
        return Ok(false);
    }
    Ok(blank_side(heap, cell)? == Some(BlankSide::Leading)
        && sequence_at(heap, cell, 1)?.kind() == Kind::Word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use crate::sigil::Sigil;
    use pretty_assertions::assert_eq;

    fn ints(xs: &[i64]) -> Vec<Cell> {
        xs.iter().map(|&i| Cell::integer(i)).collect()
    }

    #[test]
    fn small_integers_pack_inline() {
        let mut heap = Heap::new();
        let t = heap.make_sequence(Kind::Tuple, &ints(&[1, 2, 3])).unwrap();
        assert!(matches!(sequence_repr(&t).unwrap(), SequenceRepr::Bytes(_)));
        assert_eq!(sequence_len(&heap, &t).unwrap(), 3);
        assert_eq!(sequence_at(&heap, &t, 2).unwrap(), Cell::integer(3));
        assert!(heap.is_empty());
    }

    #[test]
    fn large_integer_falls_back_to_array() {
        let mut heap = Heap::new();
        let t = heap.make_sequence(Kind::Tuple, &ints(&[1, 300, 3])).unwrap();
        let SequenceRepr::Array(id) = sequence_repr(&t).unwrap() else {
            panic!("tableau attendu");
        };
        assert!(heap.is_frozen(id).unwrap());
        assert!(heap.is_managed(id));
        assert_eq!(sequence_elements(&heap, &t).unwrap().as_slice(), ints(&[1, 300, 3]).as_slice());
    }

    #[test]
    fn refinement_is_word_like() {
        let mut heap = Heap::new();
        let foo = heap.intern("foo");
        let p = heap.make_sequence(Kind::Path, &[Cell::blank(), Cell::word(foo)]).unwrap();
        assert_eq!(
            sequence_repr(&p).unwrap(),
            SequenceRepr::WordLike { symbol: foo, blank: BlankSide::Leading }
        );
        assert!(is_refinement_like(&heap, &p).unwrap());
        assert_eq!(sequence_at(&heap, &p, 0).unwrap(), Cell::blank());
        assert_eq!(sequence_at(&heap, &p, 1).unwrap(), Cell::word(foo));
        assert_eq!(sequence_at(&heap, &p, 2), Err(CellError::OutOfRange { index: 2, length: 2 }));

        let c = heap.make_sequence(Kind::Chain, &[Cell::word(foo), Cell::blank()]).unwrap();
        assert_eq!(blank_side(&heap, &c).unwrap(), Some(BlankSide::Trailing));
        assert!(!is_refinement_like(&heap, &c).unwrap());
    }

    #[test]
    fn refinement_like_ignores_kind_and_encoding() {
        let mut heap = Heap::new();
        let foo = heap.intern("foo");
        let lead = [Cell::blank(), Cell::word(foo)];
        for kind in [Kind::Path, Kind::Chain, Kind::Tuple] {
            let inline = heap.make_sequence(kind, &lead).unwrap();
            let boxed = heap.make_sequence_with(kind, &lead, Compression::Never).unwrap();
            assert!(is_refinement_like(&heap, &inline).unwrap(), "{kind}");
            assert!(is_refinement_like(&heap, &boxed).unwrap(), "{kind}");
        }
        let int = heap.make_sequence(Kind::Path, &[Cell::blank(), Cell::integer(1)]).unwrap();
        assert!(!is_refinement_like(&heap, &int).unwrap());
        let three = heap
            .make_sequence(Kind::Path, &[Cell::blank(), Cell::word(foo), Cell::word(foo)])
            .unwrap();
        assert!(!is_refinement_like(&heap, &three).unwrap());
        assert!(!is_refinement_like(&heap, &Cell::integer(1)).unwrap());
    }

    #[test]
    fn two_words_use_a_pairing() {
        let mut heap = Heap::new();
        let (a, b) = (heap.intern("a"), heap.intern("b"));
        let p = heap.make_sequence(Kind::Path, &[Cell::word(a), Cell::word(b)]).unwrap();
        assert!(matches!(sequence_repr(&p).unwrap(), SequenceRepr::Pair(_)));
        assert_eq!(blank_side(&heap, &p).unwrap(), None);
        assert_eq!(sequence_at(&heap, &p, 1).unwrap(), Cell::word(b));
    }

    #[test]
    fn words_inherit_sequence_binding() {
        let mut heap = Heap::new();
        let foo = heap.intern("foo");
        let mut p = heap.make_sequence(Kind::Path, &[Cell::blank(), Cell::word(foo)]).unwrap();
        p.set_binding(Binding::new(42)).unwrap();
        assert_eq!(sequence_at(&heap, &p, 1).unwrap().binding(), Binding::new(42));
        assert_eq!(sequence_at(&heap, &p, 0).unwrap().binding(), None);
    }

    #[test]
    fn rejections() {
        let mut heap = Heap::new();
        let (a, slashy) = (heap.intern("a"), heap.intern("a/b"));
        let w = Cell::word(a);

        assert_eq!(heap.make_sequence(Kind::Path, &[w]), Err(Rejection::TooShort { len: 1 }));
        assert_eq!(heap.make_sequence(Kind::Block, &[w, w]), Err(Rejection::NotSequence(Kind::Block)));
        assert_eq!(
            heap.make_sequence(Kind::Path, &[Cell::blank(), Cell::blank()]),
            Err(Rejection::AllBlank)
        );
        assert_eq!(
            heap.make_sequence(Kind::Path, &[w, Cell::blank(), w]),
            Err(reject(1, RejectReason::InteriorBlank))
        );
        assert_eq!(
            heap.make_sequence(Kind::Path, &[Cell::blank(), w, Cell::blank()]),
            Err(reject(2, RejectReason::BlankAtBothEnds))
        );
        assert_eq!(
            heap.make_sequence(Kind::Path, &[w, w.quoted(1).unwrap()]),
            Err(reject(1, RejectReason::NotPlain))
        );
        assert_eq!(
            heap.make_sequence(Kind::Path, &[w.with_sigil(Sigil::Pin).unwrap(), w]),
            Err(reject(0, RejectReason::NotPlain))
        );
        assert_eq!(
            heap.make_sequence(Kind::Path, &[w, Cell::word(slashy)]),
            Err(reject(1, RejectReason::IllegalSpelling))
        );
        assert_eq!(
            heap.make_sequence(Kind::Tuple, &[w, Cell::decimal(1.5)]),
            Err(reject(1, RejectReason::Kind(Kind::Decimal)))
        );
    }

    #[test]
    fn nesting_rules() {
        let mut heap = Heap::new();
        let (a, b) = (heap.intern("a"), heap.intern("b"));
        let tuple = heap.make_sequence(Kind::Tuple, &[Cell::word(a), Cell::word(b)]).unwrap();
        let chain = heap.make_sequence(Kind::Chain, &[Cell::word(a), tuple]).unwrap();
        let path = heap.make_sequence(Kind::Path, &[chain, tuple]).unwrap();
        assert_eq!(sequence_len(&heap, &path).unwrap(), 2);

        assert_eq!(
            heap.make_sequence(Kind::Tuple, &[Cell::word(a), chain]),
            Err(reject(1, RejectReason::Nesting(Kind::Chain)))
        );
        assert_eq!(
            heap.make_sequence(Kind::Chain, &[path, Cell::word(b)]),
            Err(reject(0, RejectReason::Nesting(Kind::Path)))
        );
    }

    #[test]
    fn inline_limit_follows_config() {
        let mut heap = Heap::with_config(crate::config::HeapConfig::new().with_max_sequence_inline(2));
        let t = heap.make_sequence(Kind::Tuple, &ints(&[1, 2, 3])).unwrap();
        assert!(matches!(sequence_repr(&t).unwrap(), SequenceRepr::Array(_)));
    }

    #[test]
    fn never_compress_matches_adaptive() {
        let mut heap = Heap::new();
        let foo = heap.intern("foo");
        for elems in [ints(&[1, 2, 3]), vec![Cell::blank(), Cell::word(foo)], ints(&[7, 1000])] {
            let a = heap.make_sequence(Kind::Path, &elems).unwrap();
            let n = heap.make_sequence_with(Kind::Path, &elems, Compression::Never).unwrap();
            assert!(matches!(sequence_repr(&n).unwrap(), SequenceRepr::Array(_)));
            assert_eq!(sequence_elements(&heap, &a).unwrap(), sequence_elements(&heap, &n).unwrap());
        }
    }
}
