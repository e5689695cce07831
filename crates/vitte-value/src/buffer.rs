//! buffer.rs — Buffers de fond : octets, texte UTF-8, cellules, appariement.
//!
//! Un buffer est typé par son contenu ([`ElementKind`]), porte des flags
//! (gel) et un état de vie ([`Liveness`]). Il ne connaît pas son handle : les
//! vérifications de lisibilité et de gel se font dans le [`Heap`].
//!
//! [`Heap`]: crate::heap::Heap

use core::fmt;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::error::{CellError, CellResult};
use crate::heap::BufferId;
use crate::symbol::Symbol;

/// Type d'éléments d'un buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ElementKind {
    /// Octets arbitraires.
    Bytes,
    /// Texte UTF-8 (longueur et index en caractères).
    Text,
    /// Tableau de cellules.
    Cells,
    /// Exactement deux cellules.
    Pairing,
}

impl ElementKind {
    /// Nom lisible, utilisé dans les messages d'erreur.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bytes => "octets",
            Self::Text => "texte",
            Self::Cells => "cellules",
            Self::Pairing => "appariement",
        }
    }
}

/// État de vie d'un buffer.
///
/// `Decayed` l'emporte sur `Managed` ; l'appartenance au GC reste lisible par
/// [`BufferFlags::MANAGED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Liveness {
    /// Alloué, pas encore visible du GC.
    Unmanaged,
    /// Visible du GC.
    Managed,
    /// Propriétaire expiré : contenu relâché, tout accès échoue.
    Decayed,
}

bitflags! {
    /// Flags d'un buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct BufferFlags: u8 {
        /// Immuable, définitivement.
        const FROZEN     = 1 << 0;
        /// Taille fixe (appariements, varlists).
        const FIXED_SIZE = 1 << 1;
        /// Visible du GC ; survit à la décomposition.
        const MANAGED    = 1 << 2;
    }
}

/// Contenu d'un buffer.
#[derive(Clone, PartialEq)]
pub enum BufferData {
    /// Octets arbitraires (blob).
    Bytes(Vec<u8>),
    /// Texte UTF-8.
    Text(String),
    /// Cellules (listes, varlists, keylists, pairlists).
    Cells(Vec<Cell>),
    /// Deux cellules, taille fixe.
    Pairing(Box<[Cell; 2]>),
}

impl fmt::Debug for BufferData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => write!(f, "Bytes(len={})", b.len()),
            Self::Text(s) => {
                if s.len() > 32 {
                    write!(f, "Text({:?}…)", s.chars().take(32).collect::<String>())
                } else {
                    write!(f, "Text({s:?})")
                }
            }
            Self::Cells(c) => write!(f, "Cells(len={})", c.len()),
            Self::Pairing(_) => f.write_str("Pairing"),
        }
    }
}

impl BufferData {
    /// Type d'éléments porté.
    pub const fn element_kind(&self) -> ElementKind {
        match self {
            Self::Bytes(_) => ElementKind::Bytes,
            Self::Text(_) => ElementKind::Text,
            Self::Cells(_) => ElementKind::Cells,
            Self::Pairing(_) => ElementKind::Pairing,
        }
    }

    fn empty(kind: ElementKind, capacity: usize) -> Self {
        match kind {
            ElementKind::Bytes => Self::Bytes(Vec::with_capacity(capacity)),
            ElementKind::Text => Self::Text(String::with_capacity(capacity)),
            ElementKind::Cells => Self::Cells(Vec::with_capacity(capacity)),
            ElementKind::Pairing => Self::Pairing(Box::new([Cell::blank(), Cell::blank()])),
        }
    }
}

/// Buffer de fond référencé par les cellules.
#[derive(Debug, Clone)]
pub struct Buffer {
    pub(crate) data: BufferData,
    pub(crate) flags: BufferFlags,
    pub(crate) liveness: Liveness,
    /// Varlist : buffer de cellules nommant les clés.
    pub(crate) keylist: Option<BufferId>,
    /// Phase : nom affiché pour les frames qui l'exécutent.
    pub(crate) label: Option<Symbol>,
}

impl Buffer {
    pub(crate) fn new(kind: ElementKind, capacity: usize) -> Self {
        let mut flags = BufferFlags::empty();
        if kind == ElementKind::Pairing {
            flags |= BufferFlags::FIXED_SIZE;
        }
        Self {
            data: BufferData::empty(kind, capacity),
            flags,
            liveness: Liveness::Unmanaged,
            keylist: None,
            label: None,
        }
    }

    pub(crate) fn from_data(data: BufferData) -> Self {
        let mut b = Self::new(data.element_kind(), 0);
        b.data = data;
        b
    }

    /// Type d'éléments du contenu.
    pub const fn element_kind(&self) -> ElementKind {
        self.data.element_kind()
    }

    /// Contenu brut.
    pub const fn data(&self) -> &BufferData {
        &self.data
    }

    /// Flags du buffer.
    pub const fn flags(&self) -> BufferFlags {
        self.flags
    }

    /// État de vie.
    pub const fn liveness(&self) -> Liveness {
        self.liveness
    }

    /// Gelé : plus aucune mutation structurelle.
    pub const fn is_frozen(&self) -> bool {
        self.flags.contains(BufferFlags::FROZEN)
    }

    /// Appartient au GC (y compris après décomposition).
    pub const fn is_managed(&self) -> bool {
        self.flags.contains(BufferFlags::MANAGED)
    }

    /// Keylist d'une varlist.
    pub const fn keylist(&self) -> Option<BufferId> {
        self.keylist
    }

    /// Label d'une phase.
    pub const fn label(&self) -> Option<Symbol> {
        self.label
    }

    /// Longueur logique : octets, caractères ou cellules.
    pub fn len(&self) -> usize {
        match &self.data {
            BufferData::Bytes(b) => b.len(),
            BufferData::Text(s) => s.chars().count(),
            BufferData::Cells(c) => c.len(),
            BufferData::Pairing(_) => 2,
        }
    }

    /// Longueur nulle.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Capacité réservée, dans l'unité de [`Buffer::len`] (octets pour le texte).
    pub fn capacity(&self) -> usize {
        match &self.data {
            BufferData::Bytes(b) => b.capacity(),
            BufferData::Text(s) => s.capacity(),
            BufferData::Cells(c) => c.capacity(),
            BufferData::Pairing(_) => 2,
        }
    }

    fn kind_error(&self, expected: ElementKind) -> CellError {
        CellError::ElementKind { expected: expected.name(), found: self.element_kind().name() }
    }

    /// Octets, si le buffer en contient.
    pub fn as_bytes(&self) -> CellResult<&[u8]> {
        match &self.data {
            BufferData::Bytes(b) => Ok(b),
            _ => Err(self.kind_error(ElementKind::Bytes)),
        }
    }

    /// Texte, si le buffer en contient.
    pub fn as_str(&self) -> CellResult<&str> {
        match &self.data {
            BufferData::Text(s) => Ok(s),
            _ => Err(self.kind_error(ElementKind::Text)),
        }
    }

    /// Cellules d'un tableau ou d'un appariement.
    pub fn as_cells(&self) -> CellResult<&[Cell]> {
        match &self.data {
            BufferData::Cells(c) => Ok(c),
            BufferData::Pairing(p) => Ok(&p[..]),
            _ => Err(self.kind_error(ElementKind::Cells)),
        }
    }

    /* ───────────── Mutations (gel et vie vérifiés par le Heap) ───────────── */

    fn cells_mut(&mut self) -> CellResult<&mut Vec<Cell>> {
        match &mut self.data {
            BufferData::Cells(c) => Ok(c),
            other => Err(CellError::ElementKind {
                expected: ElementKind::Cells.name(),
                found: other.element_kind().name(),
            }),
        }
    }

    fn check_resizable(&self) -> CellResult<()> {
        if self.flags.contains(BufferFlags::FIXED_SIZE) {
            return Err(CellError::FixedSize);
        }
        Ok(())
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        match &mut self.data {
            BufferData::Bytes(b) => b.reserve(additional),
            BufferData::Text(s) => s.reserve(additional),
            BufferData::Cells(c) => c.reserve(additional),
            BufferData::Pairing(_) => {}
        }
    }

    /// Insère des cellules à la position `at` (en cellules).
    pub(crate) fn insert_cells(&mut self, at: usize, cells: &[Cell]) -> CellResult<()> {
        self.check_resizable()?;
        if let Some(bad) = cells.iter().find(|c| !c.is_element()) {
            return Err(CellError::NotAnElement { kind: bad.kind() });
        }
        let v = self.cells_mut()?;
        if at > v.len() {
            return Err(CellError::OutOfRange { index: at, length: v.len() });
        }
        v.splice(at..at, cells.iter().copied());
        Ok(())
    }

    /// Remplace une cellule existante.
    pub(crate) fn set_cell(&mut self, at: usize, cell: Cell) -> CellResult<()> {
        if !cell.is_element() {
            return Err(CellError::NotAnElement { kind: cell.kind() });
        }
        let length = self.len();
        let mismatch = self.kind_error(ElementKind::Cells);
        let slot = match &mut self.data {
            BufferData::Cells(c) => c.get_mut(at),
            BufferData::Pairing(p) => p.get_mut(at),
            _ => return Err(mismatch),
        };
        let slot = slot.ok_or(CellError::OutOfRange { index: at, length })?;
        cell.copy_into(slot);
        Ok(())
    }

    /// Écriture brute d'un slot de varlist (antiformes stables admises).
    pub(crate) fn var_slot_mut(&mut self, at: usize) -> CellResult<&mut Cell> {
        let v = self.cells_mut()?;
        let length = v.len();
        v.get_mut(at).ok_or(CellError::OutOfRange { index: at, length })
    }

    /// Ajoute un slot de varlist (antiformes stables admises).
    pub(crate) fn push_var(&mut self, cell: Cell) -> CellResult<()> {
        self.check_resizable()?;
        self.cells_mut()?.push(cell);
        Ok(())
    }

    /// Insère des octets à la position `at`.
    pub(crate) fn insert_bytes(&mut self, at: usize, bytes: &[u8]) -> CellResult<()> {
        match &mut self.data {
            BufferData::Bytes(b) => {
                if at > b.len() {
                    return Err(CellError::OutOfRange { index: at, length: b.len() });
                }
                b.splice(at..at, bytes.iter().copied());
                Ok(())
            }
            _ => Err(self.kind_error(ElementKind::Bytes)),
        }
    }

    /// Insère du texte à la position `at` (en caractères).
    pub(crate) fn insert_str(&mut self, at: usize, text: &str) -> CellResult<()> {
        match &mut self.data {
            BufferData::Text(s) => {
                let off = char_to_byte(s, at)?;
                s.insert_str(off, text);
                Ok(())
            }
            _ => Err(self.kind_error(ElementKind::Text)),
        }
    }

    /// Retire `count` éléments à partir de `at` (bornés à la queue).
    pub(crate) fn remove(&mut self, at: usize, count: usize) -> CellResult<()> {
        self.check_resizable()?;
        let length = self.len();
        if at > length {
            return Err(CellError::OutOfRange { index: at, length });
        }
        let end = at.saturating_add(count).min(length);
        match &mut self.data {
            BufferData::Bytes(b) => {
                b.drain(at..end);
            }
            BufferData::Cells(c) => {
                c.drain(at..end);
            }
            BufferData::Text(s) => {
                let from = char_to_byte(s, at)?;
                let to = char_to_byte(s, end)?;
                s.replace_range(from..to, "");
            }
            BufferData::Pairing(_) => {}
        }
        Ok(())
    }

    /// Tronque à `len` éléments (sans effet si déjà plus court).
    pub(crate) fn truncate(&mut self, len: usize) -> CellResult<()> {
        let length = self.len();
        if len >= length {
            return Ok(());
        }
        self.remove(len, length - len)
    }

    /// Relâche le contenu (décomposition) en gardant le type d'éléments.
    pub(crate) fn release(&mut self) {
        self.data = BufferData::empty(self.element_kind(), 0);
        self.keylist = None;
    }

    /// Buffers cités : cellules + keylist.
    pub(crate) fn referenced_buffers(&self) -> Vec<BufferId> {
        let mut out: Vec<BufferId> = self.keylist.into_iter().collect();
        if let Ok(cells) = self.as_cells() {
            for c in cells.iter().filter(|c| c.is_readable()) {
                out.extend(c.referenced_buffers());
            }
        }
        out
    }
}

/// Décalage en octets du caractère `index` (la queue est admise).
pub(crate) fn char_to_byte(s: &str, index: usize) -> CellResult<usize> {
    if index == 0 {
        return Ok(0);
    }
    match s.char_indices().nth(index) {
        Some((off, _)) => Ok(off),
        None => {
            let length = s.chars().count();
            if index == length {
                Ok(s.len())
            } else {
                Err(CellError::OutOfRange { index, length })
            }
        }
    }
}
