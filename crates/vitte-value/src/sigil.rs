//! sigil.rs — Décorateur unique, orthogonal au quoting : `^` `@` `$`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sigil d'une cellule sigilable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Sigil {
    /// `^x`
    Meta,
    /// `@x`
    Pin,
    /// `$x`
    Tie,
}

impl Sigil {
    /// Caractère préfixe.
    pub const fn symbol(self) -> char {
        match self {
            Self::Meta => '^',
            Self::Pin => '@',
            Self::Tie => '$',
        }
    }

    /// Sigil écrit `c`, s'il existe.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '^' => Some(Self::Meta),
            '@' => Some(Self::Pin),
            '$' => Some(Self::Tie),
            _ => None,
        }
    }

    /// Encodage sur 2 bits ; 0 = pas de sigil.
    pub const fn encode(sigil: Option<Self>) -> u8 {
        match sigil {
            None => 0,
            Some(Self::Meta) => 1,
            Some(Self::Pin) => 2,
            Some(Self::Tie) => 3,
        }
    }

    /// Inverse de [`Sigil::encode`] ; seuls les 2 bits bas comptent.
    pub const fn decode(bits: u8) -> Option<Self> {
        match bits & 0b11 {
            1 => Some(Self::Meta),
            2 => Some(Self::Pin),
            3 => Some(Self::Tie),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_bit_roundtrip() {
        for s in [None, Some(Sigil::Meta), Some(Sigil::Pin), Some(Sigil::Tie)] {
            let bits = Sigil::encode(s);
            assert!(bits < 4);
            assert_eq!(Sigil::decode(bits), s);
        }
        assert_eq!(Sigil::from_char('@'), Some(Sigil::Pin));
        assert_eq!(Sigil::from_char('#'), None);
    }
}
