//! mold.rs — Rendu textuel des cellules.
//!
//! L'afficheur est un client du protocole d'accès : il lit les séries par
//! [`series::at`], les séquences par [`sequence_at`], et ne connaît pas leurs
//! représentations internes. Un buffer libéré fait échouer le rendu.

use core::fmt::Write as _;

use smallvec::SmallVec;

use crate::cell::{Cell, CellFlags, Payload};
use crate::error::CellResult;
use crate::heap::{BufferId, Heap};
use crate::kind::Kind;
use crate::lift::Lift;
use crate::sequence::{sequence_at, sequence_len};
use crate::series::{self, SeriesSlice};
use crate::view::{context, frame, map, pair, string};

/// Rendu d'une cellule.
pub fn mold(heap: &Heap, cell: &Cell) -> CellResult<String> {
    let mut out = String::new();
    mold_into(heap, cell, &mut out)?;
    Ok(out)
}

/// Rendu ajouté à `out`.
///
/// Une liste, un contexte ou une map qui se contient lui-même (directement
/// ou non) est rendu `...` au point de récursion.
pub fn mold_into(heap: &Heap, cell: &Cell, out: &mut String) -> CellResult<()> {
    Molder { heap, out, stack: SmallVec::new() }.cell(cell)
}

/* ─────────────────────────── Molder ─────────────────────────── */

/// État d'un rendu : buffers en cours de parcours (pile de récursion).
struct Molder<'h, 'o> {
    heap: &'h Heap,
    out: &'o mut String,
    stack: SmallVec<[BufferId; 8]>,
}

impl Molder<'_, '_> {
    fn cell(&mut self, cell: &Cell) -> CellResult<()> {
        if !cell.is_readable() {
            self.out.push_str("#[effacé]");
            return Ok(());
        }
        let lift = cell.lift();
        for _ in 0..lift.quote_depth() {
            self.out.push('\'');
        }
        let tilde = matches!(lift.base(), Lift::Anti | Lift::Quasi);
        if tilde {
            self.out.push('~');
        }
        if let Some(sigil) = cell.sigil() {
            self.out.push(sigil.symbol());
        }
        self.body(cell)?;
        if tilde {
            self.out.push('~');
        }
        Ok(())
    }

    /// Rend `f` avec `id` sur la pile ; `...` si `id` y est déjà.
    fn nested(
        &mut self,
        id: BufferId,
        f: impl FnOnce(&mut Self) -> CellResult<()>,
    ) -> CellResult<()> {
        if self.stack.contains(&id) {
            self.out.push_str("...");
            return Ok(());
        }
        self.stack.push(id);
        let res = f(self);
        self.stack.pop();
        res
    }

    fn cells(&mut self, cells: &[Cell]) -> CellResult<()> {
        for (i, c) in cells.iter().enumerate() {
            if c.flags().contains(CellFlags::NEWLINE_BEFORE) {
                self.out.push('\n');
            } else if i > 0 {
                self.out.push(' ');
            }
            self.cell(c)?;
        }
        Ok(())
    }

    fn body(&mut self, cell: &Cell) -> CellResult<()> {
        let heap = self.heap;
        let kind = cell.kind();
        match *cell.payload() {
            Payload::Empty => self.out.push(if kind == Kind::Comma { ',' } else { '_' }),
            Payload::Integer(i) => {
                let _ = write!(self.out, "{i}");
            }
            Payload::Decimal(d) if kind == Kind::Percent => {
                mold_decimal(d * 100.0, self.out);
                self.out.push('%');
            }
            Payload::Decimal(d) => mold_decimal(d, self.out),
            Payload::Word(sym) => self.out.push_str(heap.spelling(sym)),
            Payload::Inline(_) | Payload::Series { .. } if kind == Kind::Rune => {
                self.out.push('#');
                self.out.push_str(string::text_at(heap, cell)?);
            }
            Payload::Inline(b) => {
                let _ = write!(self.out, "{b:?}");
            }
            Payload::Series { buffer, .. } => match series::at(heap, cell)? {
                SeriesSlice::Text(s) => mold_text(kind, s, self.out),
                SeriesSlice::Bytes(b) => {
                    self.out.push_str("#{");
                    for byte in b {
                        let _ = write!(self.out, "{byte:02X}");
                    }
                    self.out.push('}');
                }
                SeriesSlice::Cells(cells) => {
                    let (open, close) = match kind {
                        Kind::Group => ('(', ')'),
                        Kind::Fence => ('{', '}'),
                        _ => ('[', ']'),
                    };
                    self.out.push(open);
                    self.nested(buffer, |m| m.cells(cells))?;
                    self.out.push(close);
                }
            },
            Payload::Sequence(_) => {
                let delimiter = kind.delimiter().unwrap_or('/');
                for i in 0..sequence_len(heap, cell)? {
                    if i > 0 {
                        self.out.push(delimiter);
                    }
                    let item = sequence_at(heap, cell, i)?;
                    // un blank de séquence ne s'écrit pas : `/foo`, `foo:`
                    if !item.is_blank() {
                        self.cell(&item)?;
                    }
                }
            }
            Payload::Pairing(_) => {
                let (x, y) = pair::pair_parts(heap, cell)?;
                self.cell(&x)?;
                self.out.push('x');
                self.cell(&y)?;
            }
            Payload::Context(varlist) => {
                let _ = write!(self.out, "#[{kind} [");
                self.nested(varlist, |m| {
                    for (i, key) in context::keys(heap, cell)?.into_iter().enumerate() {
                        if i > 0 {
                            m.out.push(' ');
                        }
                        let _ = write!(m.out, "{}: ", heap.spelling(key));
                        m.cell(&context::read(heap, cell, key)?)?;
                    }
                    Ok(())
                })?;
                self.out.push_str("]]");
            }
            Payload::Frame { .. } => {
                let label = frame::frame_label(heap, cell)?;
                let _ = write!(
                    self.out,
                    "#[frame! {}]",
                    label.map_or("~anonymous~", |s| heap.spelling(s))
                );
            }
            Payload::Parameter { .. } => self.out.push_str("#[parameter!]"),
            Payload::Handle { addr, length } => {
                let _ = write!(self.out, "#[handle! 0x{addr:x} {length}]");
            }
            Payload::Map(pairlist) => {
                self.out.push_str("#[map! [");
                self.nested(pairlist, |m| {
                    for (i, (k, v)) in map::map_pairs(heap, cell)?.into_iter().enumerate() {
                        if i > 0 {
                            m.out.push(' ');
                        }
                        m.cell(&k)?;
                        m.out.push(' ');
                        m.cell(&v)?;
                    }
                    Ok(())
                })?;
                self.out.push_str("]]");
            }
        }
        Ok(())
    }
}

/* ─────────────────────────── Scalaires ─────────────────────────── */

fn mold_decimal(d: f64, out: &mut String) {
    if d.is_finite() && d.fract() == 0.0 {
        let _ = write!(out, "{d:.1}");
    } else {
        let _ = write!(out, "{d}");
    }
}

fn mold_text(kind: Kind, text: &str, out: &mut String) {
    match kind {
        Kind::File => {
            out.push('%');
            out.push_str(text);
        }
        Kind::Tag => {
            out.push('<');
            out.push_str(text);
            out.push('>');
        }
        Kind::Email | Kind::Url => out.push_str(text),
        _ => {
            out.push('"');
            for ch in text.chars() {
                match ch {
                    '"' => out.push_str("^\""),
                    '^' => out.push_str("^^"),
                    '\n' => out.push_str("^/"),
                    c => out.push(c),
                }
            }
            out.push('"');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{FrameLens, ParamClass, ParamFlags, Typeset};
    use crate::error::CellError;
    use crate::sigil::Sigil;
    use pretty_assertions::assert_eq;

    #[test]
    fn scalars_and_lift() {
        let heap = Heap::new();
        assert_eq!(mold(&heap, &Cell::integer(-4)).unwrap(), "-4");
        assert_eq!(mold(&heap, &Cell::decimal(2.0)).unwrap(), "2.0");
        assert_eq!(mold(&heap, &Cell::percent(0.25)).unwrap(), "25.0%");
        assert_eq!(mold(&heap, &Cell::integer(5).quoted(2).unwrap()).unwrap(), "''5");
        let mut q = Cell::blank();
        q.coerce_to_quasiform().unwrap();
        assert_eq!(mold(&heap, &q.quoted(1).unwrap()).unwrap(), "'~_~");
        assert_eq!(mold(&heap, &Cell::rune_char('x')).unwrap(), "#x");
        assert_eq!(mold(&heap, &Cell::erased()).unwrap(), "#[effacé]");
    }

    #[test]
    fn series_from_index() {
        let mut heap = Heap::new();
        let s = heap.make_string(Kind::Text, "a\"b");
        assert_eq!(mold(&heap, &s).unwrap(), "\"a^\"b\"");
        let f = heap.make_string(Kind::File, "x.txt");
        assert_eq!(mold(&heap, &f).unwrap(), "%x.txt");
        let blob = heap.make_blob(&[0x0A, 0xFF]);
        assert_eq!(mold(&heap, &blob).unwrap(), "#{0AFF}");

        let foo = heap.make_word("foo");
        let mut second = Cell::integer(2);
        second.set_newline_before(true);
        let g = heap.make_list(Kind::Group, &[foo.with_sigil(Sigil::Meta).unwrap(), second]).unwrap();
        assert_eq!(mold(&heap, &g).unwrap(), "(^foo\n2)");
        let tail = series::skip(&heap, &g, 1).unwrap();
        assert_eq!(mold(&heap, &tail).unwrap(), "(\n2)");
    }

    #[test]
    fn sequences_render_the_same_whatever_the_encoding() {
        let mut heap = Heap::new();
        let foo = heap.make_word("foo");
        let refinement = heap.make_sequence(Kind::Path, &[Cell::blank(), foo]).unwrap();
        assert_eq!(mold(&heap, &refinement).unwrap(), "/foo");
        let tuple = heap.make_sequence(Kind::Tuple, &[Cell::integer(3), Cell::integer(255)]).unwrap();
        assert_eq!(mold(&heap, &tuple).unwrap(), "3.255");
        let chain = heap.make_sequence(Kind::Chain, &[foo, Cell::blank()]).unwrap();
        assert_eq!(mold(&heap, &chain).unwrap(), "foo:");
    }

    #[test]
    fn contexts_frames_and_others() {
        let mut heap = Heap::new();
        let (x, label) = (heap.intern("x"), heap.intern("append"));
        let obj = heap.make_context(Kind::Object, &[(x, Cell::integer(1))]).unwrap();
        assert_eq!(mold(&heap, &obj).unwrap(), "#[object! [x: 1]]");

        let f = heap.make_frame(&[], FrameLens::Label(Some(label))).unwrap();
        assert_eq!(mold(&heap, &f).unwrap(), "#[frame! append]");

        let p = heap.make_pair(Cell::integer(1), Cell::integer(2)).unwrap();
        assert_eq!(mold(&heap, &p).unwrap(), "1x2");

        let m = heap.make_map(&[(Cell::integer(1), Cell::blank())]).unwrap();
        assert_eq!(mold(&heap, &m).unwrap(), "#[map! [1 _]]");

        assert_eq!(mold(&heap, &Cell::handle(255, 4)).unwrap(), "#[handle! 0xff 4]");
        let param = Cell::parameter(ParamClass::Normal, Typeset::EMPTY, ParamFlags::empty());
        assert_eq!(mold(&heap, &param).unwrap(), "#[parameter!]");
    }

    #[test]
    fn freed_buffers_fail_the_render() {
        let mut heap = Heap::new();
        let b = heap.make_list(Kind::Block, &[Cell::integer(1)]).unwrap();
        let (id, _) = series::series_parts(&b).unwrap();
        heap.decay(id).unwrap();
        assert_eq!(mold(&heap, &b), Err(CellError::DataFreed { buffer: id }));
    }

    #[test]
    fn self_containing_values_stop_at_the_cycle() {
        let mut heap = Heap::new();
        let b = heap.make_list(Kind::Block, &[Cell::integer(1)]).unwrap();
        series::append_cells(&mut heap, &b, &[b]).unwrap();
        assert_eq!(mold(&heap, &b).unwrap(), "[1 [...]]");

        let x = heap.intern("x");
        let obj = heap.make_context(Kind::Object, &[(x, Cell::blank())]).unwrap();
        context::write(&mut heap, &obj, x, &obj).unwrap();
        assert_eq!(mold(&heap, &obj).unwrap(), "#[object! [x: #[object! [...]]]]");

        let m = heap.make_map(&[]).unwrap();
        map::map_put(&mut heap, &m, &Cell::integer(1), &m).unwrap();
        assert_eq!(mold(&heap, &m).unwrap(), "#[map! [1 #[map! [...]]]]");

        // un même bloc deux fois côte à côte n'est pas un cycle
        let inner = heap.make_list(Kind::Block, &[Cell::integer(2)]).unwrap();
        let twice = heap.make_list(Kind::Block, &[inner, inner]).unwrap();
        assert_eq!(mold(&heap, &twice).unwrap(), "[[2] [2]]");
    }
}
