//! view — Vues dérivées : comment chaque famille de kinds lit son payload.
//!
//! Chaque sous-module ajoute ses constructeurs à [`Heap`](crate::heap::Heap)
//! et expose des lecteurs libres `fn(&Heap, &Cell) -> CellResult<_>`. Tous
//! passent par la vérification de lisibilité avant de toucher un buffer.

pub mod blob;
pub mod context;
pub mod frame;
pub mod handle;
pub mod list;
pub mod map;
pub mod pair;
pub mod parameter;
pub mod string;
pub mod word;
