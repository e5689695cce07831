//! vitte-value — cœur des valeurs du runtime
//!
//! Fournit :
//! - `Cell` : valeur à taille fixe (kind + lift + sigil + flags + payload + binding)
//! - `Heap` : arène générationnelle de buffers (octets, texte, cellules, appariements)
//! - `Lift` : antiforme / plain / quasiforme / quoté N fois
//! - Protocole d'accès indexé (`series`) : index revérifié à chaque accès
//! - Séquences compactées (`sequence`) : tuple, chain, path
//! - Vues dérivées (`view`) : strings, blobs, mots, listes, contextes, frames, maps…
//! - Rendu textuel (`mold`)
//! - Erreurs `CellError` + alias `CellResult<T>`
//!
//! Features :
//! - `tracing` (par défaut) : événements du cycle de vie des buffers
//! - `serde` : derive (dé)sérialisation sur les types « plain data »
//!
//! Le crate ne contient ni évaluateur, ni binder, ni collecteur : il leur
//! expose la vérification de lisibilité, le slot de binding opaque et la
//! transition « managé ».

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/* ─────────────────────────── Tracing ─────────────────────────── */

// Événement du tas ; ne compile en rien sans la feature `tracing`.
macro_rules! heap_event {
    ($lvl:ident, $($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::$lvl!($($arg)*);
        }
    };
}

/* ─────────────────────────── Modules ─────────────────────────── */

pub mod binding;
pub mod buffer;
pub mod cell;
pub mod config;
pub mod error;
pub mod heap;
pub mod kind;
pub mod lift;
pub mod mold;
pub mod sequence;
pub mod series;
pub mod sigil;
pub mod slot;
pub mod symbol;
pub mod view;

/* ─────────────────────────── Ré-exports ─────────────────────────── */

pub use binding::Binding;
pub use buffer::{Buffer, BufferData, BufferFlags, ElementKind, Liveness};
pub use cell::{
    Accept, Cell, CellFlags, FrameLens, InlineBytes, ParamClass, ParamFlags, Payload, Typeset,
    INLINE_CAPACITY,
};
pub use config::HeapConfig;
pub use error::{CellError, CellResult, RejectReason, Rejection};
pub use heap::{BufferId, Heap, HeapStats};
pub use kind::{Antiform, Kind};
pub use lift::{Lift, QuoteDepth, MAX_QUOTE_DEPTH};
pub use mold::mold;
pub use sequence::{BlankSide, Compression, SequenceRepr};
pub use series::{SeriesItem, SeriesSlice};
pub use sigil::Sigil;
pub use symbol::{Symbol, SymbolTable};

/// Import groupé pour les clients (évaluateur, binder, collecteur).
pub mod prelude {
    pub use crate::cell::{Accept, Cell, FrameLens};
    pub use crate::error::{CellError, CellResult, Rejection};
    pub use crate::heap::{BufferId, Heap};
    pub use crate::kind::Kind;
    pub use crate::lift::Lift;
    pub use crate::sequence::{sequence_at, sequence_len, Compression};
    pub use crate::series::{at, element_at, ensure_mutable, length_at};
    pub use crate::sigil::Sigil;
    pub use crate::slot;
    pub use crate::symbol::Symbol;
}
