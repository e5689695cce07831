//! Scénarios de bout en bout sur l'API publique.

use pretty_assertions::assert_eq;

use vitte_value::prelude::*;
use vitte_value::sequence::{blank_side, sequence_repr};
use vitte_value::series::{skip, truncate};
use vitte_value::{mold, BlankSide, Liveness, SequenceRepr};

/// `RUST_LOG=vitte_value=trace cargo test` pour voir les événements du tas.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn two_small_integers_are_byte_packed() {
    init_tracing();
    let mut heap = Heap::new();
    let t = heap.make_sequence(Kind::Tuple, &[Cell::integer(3), Cell::integer(255)]).unwrap();
    assert!(matches!(sequence_repr(&t).unwrap(), SequenceRepr::Bytes(_)));
    assert_eq!(sequence_len(&heap, &t).unwrap(), 2);
    assert_eq!(sequence_at(&heap, &t, 0).unwrap(), Cell::integer(3));
    assert_eq!(sequence_at(&heap, &t, 1).unwrap(), Cell::integer(255));
}

#[test]
fn blank_and_word_are_word_like() {
    init_tracing();
    let mut heap = Heap::new();
    let foo = heap.intern("foo");
    let p = heap.make_sequence(Kind::Path, &[Cell::blank(), Cell::word(foo)]).unwrap();
    assert!(matches!(
        sequence_repr(&p).unwrap(),
        SequenceRepr::WordLike { blank: BlankSide::Leading, .. }
    ));
    assert_eq!(blank_side(&heap, &p).unwrap(), Some(BlankSide::Leading));
    assert_eq!(sequence_len(&heap, &p).unwrap(), 2);
    assert_eq!(mold(&heap, &sequence_at(&heap, &p, 0).unwrap()).unwrap(), "_");
    assert_eq!(mold(&heap, &sequence_at(&heap, &p, 1).unwrap()).unwrap(), "foo");
}

#[test]
fn triple_quote_round_trip() {
    let v = Cell::integer(5).quoted(3).unwrap();
    assert_eq!(v.quote_depth(), 3);
    let back = v.unquoted(3).unwrap();
    assert_eq!(back.lift(), Lift::Plain);
    assert_eq!(back, Cell::integer(5));
}

#[test]
fn tail_index_goes_stale_after_truncation() {
    init_tracing();
    let mut heap = Heap::new();
    let (a, b, c) = (heap.intern("a"), heap.intern("b"), heap.intern("c"));
    let block = heap.make_list(Kind::Block, &[Cell::word(a), Cell::word(b), Cell::word(c)]).unwrap();
    let at_tail = skip(&heap, &block, 3).unwrap();
    assert_eq!(length_at(&heap, &at_tail).unwrap(), 0);

    truncate(&mut heap, &block, 1).unwrap();
    assert_eq!(length_at(&heap, &at_tail), Err(CellError::OutOfRange { index: 3, length: 1 }));
    assert!(at(&heap, &at_tail).is_err());
}

#[test]
fn pack_needs_the_meta_write_path() {
    let mut heap = Heap::new();
    let mut pack = heap.make_list(Kind::Block, &[Cell::integer(1), Cell::integer(2)]).unwrap();
    assert_eq!(pack.coerce_to_antiform(Accept::Stable), Err(CellError::UnstableAntiform { kind: Kind::Block }));
    pack.coerce_to_antiform(Accept::Meta).unwrap();
    assert!(pack.is_unstable_antiform());

    let mut var = Cell::trash();
    assert_eq!(slot::assign(&mut var, &pack), Err(CellError::UnstableAntiform { kind: Kind::Block }));

    slot::assign_meta(&mut var, &pack).unwrap();
    assert!(var.is_quasiform());
    assert_eq!(slot::read_meta(&var).unwrap(), pack);

    let mut quasi = pack;
    quasi.coerce_to_quasiform().unwrap();
    assert_eq!(var, quasi);
}

#[test]
fn frozen_buffers_refuse_every_mutation() {
    let mut heap = Heap::new();
    let text = heap.make_string(Kind::Text, "abc");
    let (id, _) = vitte_value::series::series_parts(&text).unwrap();
    heap.freeze(id).unwrap();

    let err = Err(CellError::Frozen { buffer: id });
    assert_eq!(ensure_mutable(&heap, &text).map(|_| ()), err);
    assert_eq!(vitte_value::series::append_str(&mut heap, &text, "d"), err);
    assert_eq!(vitte_value::series::insert_str(&mut heap, &text, "d"), err);
    assert_eq!(vitte_value::series::remove_at(&mut heap, &text, 1), err);
    assert_eq!(vitte_value::series::truncate_at(&mut heap, &text), err);
    assert_eq!(mold(&heap, &text).unwrap(), "\"abc\"");
}

#[test]
fn freed_buffers_never_come_back() {
    let mut heap = Heap::new();
    let block = heap.make_list(Kind::Block, &[Cell::integer(1)]).unwrap();
    let (id, _) = vitte_value::series::series_parts(&block).unwrap();

    heap.decay(id).unwrap();
    assert_eq!(heap.liveness(id), Some(Liveness::Decayed));
    for _ in 0..3 {
        assert_eq!(length_at(&heap, &block), Err(CellError::DataFreed { buffer: id }));
    }
    assert!(heap.manage(id).is_err());
    assert!(heap.freeze(id).is_err());

    assert_eq!(heap.sweep(|_| false), 1);
    let _reuse = heap.make_blob(b"new");
    assert_eq!(heap.readability_check(id).unwrap_err(), CellError::DataFreed { buffer: id });
    assert_eq!(length_at(&heap, &block), Err(CellError::DataFreed { buffer: id }));
}

#[test]
fn collector_walks_children() {
    let mut heap = Heap::new();
    let inner = heap.make_list(Kind::Group, &[Cell::integer(1)]).unwrap();
    let outer = heap.make_list(Kind::Block, &[inner]).unwrap();
    let (outer_id, _) = vitte_value::series::series_parts(&outer).unwrap();
    let (inner_id, _) = vitte_value::series::series_parts(&inner).unwrap();
    assert_eq!(heap.children(outer_id).unwrap(), vec![inner_id]);

    // seul `outer` est racine : le marquage suit les enfants
    let mut marked = vec![outer_id];
    let mut i = 0;
    while i < marked.len() {
        let kids = heap.children(marked[i]).unwrap();
        marked.extend(kids);
        i += 1;
    }
    assert_eq!(heap.sweep(|id| marked.contains(&id)), 0);
    assert_eq!(heap.sweep(|id| id != inner_id), 1);
    assert!(at(&heap, &outer).is_ok());
    assert!(at(&heap, &inner).is_err());
}
