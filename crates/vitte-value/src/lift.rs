//! lift.rs — État de quoting / antiforme d'une cellule.
//!
//! Quatre états : antiforme, plain, quasiforme, quoté N fois (N ≥ 1) par-dessus
//! plain ou quasiforme. Une antiforme quotée n'est pas représentable : il faut
//! d'abord la remonter en quasiforme.

use core::fmt;
use core::num::NonZeroU8;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CellError, CellResult};

/// Profondeur maximale de quoting.
pub const MAX_QUOTE_DEPTH: u8 = 126;

/// Profondeur de quote, garantie dans `1..=MAX_QUOTE_DEPTH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub struct QuoteDepth(NonZeroU8);

impl QuoteDepth {
    /// Un seul niveau.
    pub const ONE: Self = Self(NonZeroU8::MIN);

    /// `None` si `depth` vaut 0 ou dépasse le maximum.
    pub const fn new(depth: u8) -> Option<Self> {
        if depth > MAX_QUOTE_DEPTH {
            return None;
        }
        match NonZeroU8::new(depth) {
            Some(n) => Some(Self(n)),
            None => None,
        }
    }

    /// Profondeur en clair.
    pub const fn get(self) -> u8 {
        self.0.get()
    }
}

impl TryFrom<u8> for QuoteDepth {
    type Error = CellError;
    fn try_from(v: u8) -> Result<Self, Self::Error> {
        Self::new(v).ok_or(CellError::QuoteOverflow { requested: usize::from(v) })
    }
}

impl From<QuoteDepth> for u8 {
    fn from(d: QuoteDepth) -> Self {
        d.get()
    }
}

/// État « lift » d'une cellule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Lift {
    /// Forme évaluée « suspecte » ; jamais dans une liste.
    Anti,
    /// État fondamental.
    #[default]
    Plain,
    /// `~x~` : représentation littérale d'une antiforme.
    Quasi,
    /// `'x`, `''~x~`…
    Quoted {
        /// Nombre d'apostrophes.
        depth: QuoteDepth,
        /// Vrai si la base quotée est une quasiforme.
        quasi: bool,
    },
}

impl Lift {
    /// Profondeur de quote (0 si non quoté).
    pub const fn quote_depth(self) -> u8 {
        match self {
            Self::Quoted { depth, .. } => depth.get(),
            _ => 0,
        }
    }

    /// État une fois tous les quotes retirés.
    pub const fn base(self) -> Self {
        match self {
            Self::Quoted { quasi: true, .. } => Self::Quasi,
            Self::Quoted { quasi: false, .. } => Self::Plain,
            other => other,
        }
    }

    /// Ajoute `n` niveaux de quote.
    pub fn quotify(self, n: u8) -> CellResult<Self> {
        if n == 0 {
            return Ok(self);
        }
        let (current, quasi) = match self {
            Self::Anti => return Err(CellError::AntiformNotQuotable),
            Self::Plain => (0, false),
            Self::Quasi => (0, true),
            Self::Quoted { depth, quasi } => (depth.get(), quasi),
        };
        let requested = usize::from(current) + usize::from(n);
        let depth = u8::try_from(requested)
            .ok()
            .and_then(QuoteDepth::new)
            .ok_or(CellError::QuoteOverflow { requested })?;
        Ok(Self::Quoted { depth, quasi })
    }

    /// Retire `n` niveaux de quote.
    pub fn unquotify(self, n: u8) -> CellResult<Self> {
        if n == 0 {
            return Ok(self);
        }
        let actual = self.quote_depth();
        if n > actual {
            return Err(CellError::QuoteUnderflow {
                requested: usize::from(n),
                actual: usize::from(actual),
            });
        }
        let quasi = self.base() == Self::Quasi;
        Ok(match QuoteDepth::new(actual - n) {
            Some(depth) => Self::Quoted { depth, quasi },
            None => self.base(),
        })
    }

    /// Encodage compact sur un octet : anti=0, plain=1, quasi=2, quoted(d)=1+2d(+1).
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Anti => 0,
            Self::Plain => 1,
            Self::Quasi => 2,
            Self::Quoted { depth, quasi } => 1 + 2 * depth.get() + quasi as u8,
        }
    }

    /// Décodage inverse de [`Lift::to_byte`].
    pub const fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Anti),
            1 => Some(Self::Plain),
            2 => Some(Self::Quasi),
            _ => {
                let quasi = b % 2 == 0;
                let d = (b - 1 - quasi as u8) / 2;
                match QuoteDepth::new(d) {
                    Some(depth) => Some(Self::Quoted { depth, quasi }),
                    None => None,
                }
            }
        }
    }
}

impl fmt::Display for Lift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anti => f.write_str("antiform"),
            Self::Plain => f.write_str("plain"),
            Self::Quasi => f.write_str("quasiform"),
            Self::Quoted { depth, quasi: false } => write!(f, "quoted-{}", depth.get()),
            Self::Quoted { depth, quasi: true } => write!(f, "quoted-{}-quasiform", depth.get()),
        }
    }
}
