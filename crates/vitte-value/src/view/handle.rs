//! Handles : donnée opaque de l'hôte (adresse + longueur), jamais déréférencée.

use crate::cell::{Cell, Payload};
use crate::kind::Kind;

/// `(adresse, longueur)` d'un handle.
pub fn handle_parts(cell: &Cell) -> Option<(u64, usize)> {
    debug_assert!(cell.kind() == Kind::Handle, "{} n'est pas un handle", cell.kind());
    match *cell.payload() {
        Payload::Handle { addr, length } => Some((addr, length)),
        _ => None,
    }
}

/// Adresse d'un handle.
pub fn handle_addr(cell: &Cell) -> Option<u64> {
    handle_parts(cell).map(|(a, _)| a)
}

/// Longueur d'un handle.
pub fn handle_len(cell: &Cell) -> Option<usize> {
    handle_parts(cell).map(|(_, l)| l)
}
