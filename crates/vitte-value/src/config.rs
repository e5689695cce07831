//! config.rs — Limites et politique de croissance du tas.
//!
//! La configuration ne fait que *décrire* des contraintes ; le [`Heap`]
//! les applique. Tout est sérialisable avec la feature `serde`.
//!
//! [`Heap`]: crate::heap::Heap

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::INLINE_CAPACITY;

/// Configuration du tas de buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HeapConfig {
    /// Capacité minimale réservée à l'allocation d'un buffer.
    pub min_capacity: usize,
    /// Nombre de slots pré-réservés dans l'arène.
    pub initial_slots: usize,
    /// Nombre max d'octets d'une séquence compactée en ligne
    /// (borné par la charge utile d'une cellule).
    pub max_sequence_inline: usize,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self { min_capacity: 4, initial_slots: 64, max_sequence_inline: INLINE_CAPACITY }
    }
}

impl HeapConfig {
    /// Configuration par défaut.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixe la capacité minimale des buffers.
    #[must_use]
    pub const fn with_min_capacity(mut self, n: usize) -> Self {
        self.min_capacity = n;
        self
    }

    /// Fixe la pré-réservation de l'arène.
    #[must_use]
    pub const fn with_initial_slots(mut self, n: usize) -> Self {
        self.initial_slots = n;
        self
    }

    /// Fixe la taille max des séquences compactées en ligne.
    #[must_use]
    pub const fn with_max_sequence_inline(mut self, n: usize) -> Self {
        self.max_sequence_inline = n;
        self
    }

    /// Ramène les valeurs hors limites dans leur domaine.
    #[must_use]
    pub fn validate(mut self) -> Self {
        self.max_sequence_inline = self.max_sequence_inline.min(INLINE_CAPACITY);
        self
    }
}
