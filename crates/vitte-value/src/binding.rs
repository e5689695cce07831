//! binding.rs — Handle opaque fourni par le binder.
//!
//! Le cœur ne l'interprète jamais : il le stocke, le copie avec la cellule,
//! et le refuse sur les kinds non bindables.

use core::num::NonZeroU64;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Référence de scope/binding, opaque pour ce crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Binding(NonZeroU64);

impl Binding {
    /// Reconstruit un binding depuis sa valeur brute.
    pub const fn from_raw(raw: NonZeroU64) -> Self {
        Self(raw)
    }

    /// `None` pour 0.
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Valeur brute, opaque pour ce crate.
    pub const fn raw(self) -> NonZeroU64 {
        self.0
    }
}
