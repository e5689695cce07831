//! heap.rs — Arène générationnelle des buffers.
//!
//! Chaque buffer vit dans un slot ; son [`BufferId`] = (indice, génération).
//! Libérer un buffer incrémente la génération du slot : tout handle périmé
//! échoue alors à la vérification de lisibilité, même si le slot est réutilisé.
//!
//! Cycle de vie :
//! - [`Heap::allocate`] : buffer *non managé* ;
//! - [`Heap::manage`] : transition unique, le buffer devient visible du GC ;
//! - [`Heap::freeze`] : transition unique vers l'immuable ;
//! - [`Heap::decay`] : le propriétaire a expiré, le contenu est relâché ;
//! - [`Heap::free`] / [`Heap::sweep`] : libération (manuelle ou par le GC).

use core::fmt;
use std::collections::HashSet;

use crate::buffer::{Buffer, BufferData, BufferFlags, ElementKind, Liveness};
use crate::config::HeapConfig;
use crate::error::{CellError, CellResult};
use crate::symbol::{Symbol, SymbolTable};

/* ─────────────────────────── Handles ─────────────────────────── */

/// Handle générationnel vers un buffer.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferId {
    idx: u32,
    gen: u32,
}

impl BufferId {
    /// Indice du slot.
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Génération du slot au moment de l'allocation.
    pub const fn generation(self) -> u32 {
        self.gen
    }
}

impl fmt::Debug for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "buf#{}@{}", self.idx, self.gen)
    }
}

#[derive(Debug)]
struct Slot {
    gen: u32,
    buf: Option<Buffer>,
}

/// Compteurs de l'arène.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapStats {
    /// Buffers présents.
    pub live: usize,
    /// Buffers managés (décomposés compris).
    pub managed: usize,
    /// Buffers gelés.
    pub frozen: usize,
    /// Buffers décomposés, pas encore balayés.
    pub decayed: usize,
}

/* ─────────────────────────── Heap ─────────────────────────── */

/// Arène de buffers + table des symboles.
#[derive(Debug)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    symbols: SymbolTable,
    config: HeapConfig,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Tas vide, configuration par défaut.
    pub fn new() -> Self {
        Self::with_config(HeapConfig::default())
    }

    /// Tas vide ; `config` est validée d'abord.
    pub fn with_config(config: HeapConfig) -> Self {
        let config = config.validate();
        Self {
            slots: Vec::with_capacity(config.initial_slots),
            free: Vec::new(),
            symbols: SymbolTable::new(),
            config,
        }
    }

    /// Configuration validée.
    pub const fn config(&self) -> &HeapConfig {
        &self.config
    }

    /* ───────────── Symboles ───────────── */

    /// Table des symboles.
    pub const fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Interne une orthographe.
    pub fn intern(&mut self, spelling: &str) -> Symbol {
        self.symbols.intern(spelling)
    }

    /// Orthographe d'un symbole.
    pub fn spelling(&self, sym: Symbol) -> &str {
        self.symbols.resolve(sym)
    }

    /* ───────────── Allocation ───────────── */

    fn insert(&mut self, buf: Buffer) -> BufferId {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            debug_assert!(slot.buf.is_none());
            slot.buf = Some(buf);
            return BufferId { idx, gen: slot.gen };
        }
        let idx = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot { gen: 0, buf: Some(buf) });
        BufferId { idx, gen: 0 }
    }

    /// Alloue un buffer vide, non managé.
    pub fn allocate(&mut self, kind: ElementKind, capacity: usize) -> BufferId {
        let id = self.insert(Buffer::new(kind, capacity.max(self.config.min_capacity)));
        heap_event!(trace, buffer = ?id, ?kind, capacity, "allocate");
        id
    }

    /// Alloue un buffer déjà rempli, non managé.
    pub fn allocate_with(&mut self, data: BufferData) -> BufferId {
        let id = self.insert(Buffer::from_data(data));
        heap_event!(trace, buffer = ?id, "allocate (prérempli)");
        id
    }

    /// Alloue un buffer rempli et le rend visible du GC.
    pub(crate) fn alloc_managed(&mut self, data: BufferData) -> BufferId {
        let id = self.allocate_with(data);
        if let Some(Some(b)) = self.slots.get_mut(id.idx as usize).map(|s| s.buf.as_mut()) {
            b.liveness = Liveness::Managed;
            b.flags |= BufferFlags::MANAGED;
        }
        id
    }

    /* ───────────── Lisibilité ───────────── */

    fn slot_buffer(&self, id: BufferId) -> Option<&Buffer> {
        self.slots.get(id.idx as usize).filter(|s| s.gen == id.gen).and_then(|s| s.buf.as_ref())
    }

    fn slot_buffer_mut(&mut self, id: BufferId) -> Option<&mut Buffer> {
        self.slots
            .get_mut(id.idx as usize)
            .filter(|s| s.gen == id.gen)
            .and_then(|s| s.buf.as_mut())
    }

    /// Vérification à faire avant tout déréférencement.
    pub fn readability_check(&self, id: BufferId) -> CellResult<&Buffer> {
        match self.slot_buffer(id) {
            Some(b) if b.liveness != Liveness::Decayed => Ok(b),
            _ => Err(CellError::DataFreed { buffer: id }),
        }
    }

    /// Raccourci pour [`Heap::readability_check`].
    pub fn is_readable(&self, id: BufferId) -> bool {
        self.readability_check(id).is_ok()
    }

    /// Accès mutable sans contrôle de gel (flags, métadonnées).
    pub(crate) fn readable_mut(&mut self, id: BufferId) -> CellResult<&mut Buffer> {
        match self.slot_buffer_mut(id) {
            Some(b) if b.liveness != Liveness::Decayed => Ok(b),
            _ => Err(CellError::DataFreed { buffer: id }),
        }
    }

    /// Accès pour mutation structurelle : lisible et non gelé.
    pub fn mutable(&mut self, id: BufferId) -> CellResult<&mut Buffer> {
        let b = self.readable_mut(id)?;
        if b.is_frozen() {
            return Err(CellError::Frozen { buffer: id });
        }
        Ok(b)
    }

    /// `None` si le slot a été libéré.
    pub fn liveness(&self, id: BufferId) -> Option<Liveness> {
        self.slot_buffer(id).map(Buffer::liveness)
    }

    /* ───────────── Transitions ───────────── */

    /// Rend le buffer visible du GC (idempotent, sans retour).
    pub fn manage(&mut self, id: BufferId) -> CellResult<()> {
        let b = self.readable_mut(id)?;
        if !b.is_managed() {
            b.liveness = Liveness::Managed;
            b.flags |= BufferFlags::MANAGED;
            heap_event!(trace, buffer = ?id, "manage");
        }
        Ok(())
    }

    /// Vrai pour un buffer managé, même décomposé depuis.
    pub fn is_managed(&self, id: BufferId) -> bool {
        self.slot_buffer(id).is_some_and(Buffer::is_managed)
    }

    /// Gèle le buffer (définitif).
    pub fn freeze(&mut self, id: BufferId) -> CellResult<()> {
        let b = self.readable_mut(id)?;
        if !b.is_frozen() {
            b.flags |= BufferFlags::FROZEN;
            heap_event!(trace, buffer = ?id, "freeze");
        }
        Ok(())
    }

    /// Gèle le buffer et tout ce que ses cellules référencent.
    pub fn freeze_deep(&mut self, id: BufferId) -> CellResult<()> {
        let mut seen = HashSet::new();
        let mut todo = vec![id];
        while let Some(next) = todo.pop() {
            // les enfants décomposés n'ont plus rien à geler
            if !seen.insert(next) || (next != id && !self.is_readable(next)) {
                continue;
            }
            self.freeze(next)?;
            todo.extend(self.children(next)?);
        }
        Ok(())
    }

    /// Gelé ? Échoue si le buffer est illisible.
    pub fn is_frozen(&self, id: BufferId) -> CellResult<bool> {
        Ok(self.readability_check(id)?.is_frozen())
    }

    /// Le propriétaire a expiré : contenu relâché, lectures en échec pour toujours.
    pub fn decay(&mut self, id: BufferId) -> CellResult<()> {
        let b = self.slot_buffer_mut(id).ok_or(CellError::DataFreed { buffer: id })?;
        if b.liveness != Liveness::Decayed {
            b.release();
            b.liveness = Liveness::Decayed;
            heap_event!(debug, buffer = ?id, "decay");
        }
        Ok(())
    }

    fn release_slot(&mut self, id: BufferId) {
        if let Some(slot) = self.slots.get_mut(id.idx as usize) {
            slot.buf = None;
            slot.gen = slot.gen.wrapping_add(1);
            self.free.push(id.idx);
        }
    }

    /// Libère un buffer non managé. Les buffers managés appartiennent au GC,
    /// décomposés ou non.
    pub fn free(&mut self, id: BufferId) -> CellResult<()> {
        let b = self.slot_buffer(id).ok_or(CellError::DataFreed { buffer: id })?;
        if b.is_managed() {
            return Err(CellError::Managed { buffer: id });
        }
        self.release_slot(id);
        heap_event!(trace, buffer = ?id, "free");
        Ok(())
    }

    /// Passe de balayage pour un collecteur externe : libère les buffers
    /// managés (décomposés compris) que `is_marked` ne retient pas.
    pub fn sweep(&mut self, mut is_marked: impl FnMut(BufferId) -> bool) -> usize {
        let doomed: Vec<BufferId> =
            self.ids().filter(|&id| self.is_managed(id) && !is_marked(id)).collect();
        for &id in &doomed {
            self.release_slot(id);
        }
        heap_event!(debug, freed = doomed.len(), "sweep");
        doomed.len()
    }

    /* ───────────── Traversée ───────────── */

    /// Indice de traversée : buffers référencés par celui-ci.
    pub fn children(&self, id: BufferId) -> CellResult<Vec<BufferId>> {
        Ok(self.readability_check(id)?.referenced_buffers())
    }

    /// Handles de tous les buffers présents (décomposés compris).
    pub fn ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.buf.is_some())
            .map(|(i, s)| BufferId { idx: u32::try_from(i).unwrap_or(u32::MAX), gen: s.gen })
    }

    /// Compte les buffers par état.
    pub fn stats(&self) -> HeapStats {
        let mut st = HeapStats::default();
        for b in self.slots.iter().filter_map(|s| s.buf.as_ref()) {
            st.live += 1;
            if b.is_managed() {
                st.managed += 1;
            }
            if b.liveness == Liveness::Decayed {
                st.decayed += 1;
            }
            if b.is_frozen() {
                st.frozen += 1;
            }
        }
        st
    }

    /// Nombre de buffers présents.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Aucun buffer présent.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
