//! kind.rs — Types fondamentaux (« kinds ») des cellules.
//!
//! Le `Kind` d'une cellule décide quelle interprétation du payload est
//! légale. Les codes numériques servent aux typesets et aux dumps : le code 0
//! est réservé à l'état effacé, `0xFC..=0xFF` aux sigils (jamais produits ici).

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Premier code réservé aux décorateurs (sigils).
pub const SIGIL_CODE_BASE: u8 = 0xFC;

/// Type fondamental d'une cellule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Kind {
    /// `_`
    Blank = 1,
    /// `,`
    Comma,
    /// Entier 64 bits.
    Integer,
    /// Flottant 64 bits.
    Decimal,
    /// Flottant affiché en pourcentage.
    Percent,
    /// Caractère(s) courts (`#a`, `#abc`).
    Rune,
    /// Octets arbitraires (NUL compris).
    Blob,
    /// Texte UTF-8.
    Text,
    /// `%file`
    File,
    /// `user@host`
    Email,
    /// `http://…`
    Url,
    /// `<tag>`
    Tag,
    /// Mot (symbole + binding).
    Word,
    /// `[…]`
    Block,
    /// `(…)`
    Group,
    /// `{…}`
    Fence,
    /// `a.b`
    Tuple,
    /// `a:b`
    Chain,
    /// `a/b`
    Path,
    /// `1x2` (appariement de deux cellules).
    Pair,
    /// Objet.
    Object,
    /// Module.
    Module,
    /// Erreur.
    Error,
    /// Frame d'appel.
    Frame,
    /// Paramètre d'action.
    Parameter,
    /// Donnée opaque de l'hôte.
    Handle,
    /// Table clé/valeur.
    Map,
}

/// Tous les kinds, dans l'ordre des codes.
pub const ALL_KINDS: [Kind; 27] = [
    Kind::Blank,
    Kind::Comma,
    Kind::Integer,
    Kind::Decimal,
    Kind::Percent,
    Kind::Rune,
    Kind::Blob,
    Kind::Text,
    Kind::File,
    Kind::Email,
    Kind::Url,
    Kind::Tag,
    Kind::Word,
    Kind::Block,
    Kind::Group,
    Kind::Fence,
    Kind::Tuple,
    Kind::Chain,
    Kind::Path,
    Kind::Pair,
    Kind::Object,
    Kind::Module,
    Kind::Error,
    Kind::Frame,
    Kind::Parameter,
    Kind::Handle,
    Kind::Map,
];

/// Ce que devient un kind quand il est en antiforme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Antiform {
    /// Mot antiforme (`~null~`, `~okay~`…).
    Keyword,
    /// Groupe antiforme : contenu à épisser.
    Splice,
    /// Frame antiforme : action exécutable.
    Action,
    /// Blank antiforme : valeur « poubelle ».
    Trash,
    /// Bloc antiforme : pack multi-valeurs (instable).
    Pack,
    /// Erreur antiforme : erreur levée (instable).
    Raised,
    /// Virgule antiforme : ghost, disparaît à l'évaluation (instable).
    Ghost,
}

impl Antiform {
    /// Stable = peut vivre dans une variable sans capture meta.
    pub const fn is_stable(self) -> bool {
        !matches!(self, Self::Pack | Self::Raised | Self::Ghost)
    }
}

impl Kind {
    /// Code numérique (1..=27).
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Décode un code ; refuse 0 (effacé) et la plage des sigils.
    pub fn from_code(code: u8) -> Option<Self> {
        if code == 0 || code >= SIGIL_CODE_BASE {
            return None;
        }
        ALL_KINDS.get(usize::from(code) - 1).copied()
    }

    /// Nom façon `text!`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blank => "blank!",
            Self::Comma => "comma!",
            Self::Integer => "integer!",
            Self::Decimal => "decimal!",
            Self::Percent => "percent!",
            Self::Rune => "rune!",
            Self::Blob => "blob!",
            Self::Text => "text!",
            Self::File => "file!",
            Self::Email => "email!",
            Self::Url => "url!",
            Self::Tag => "tag!",
            Self::Word => "word!",
            Self::Block => "block!",
            Self::Group => "group!",
            Self::Fence => "fence!",
            Self::Tuple => "tuple!",
            Self::Chain => "chain!",
            Self::Path => "path!",
            Self::Pair => "pair!",
            Self::Object => "object!",
            Self::Module => "module!",
            Self::Error => "error!",
            Self::Frame => "frame!",
            Self::Parameter => "parameter!",
            Self::Handle => "handle!",
            Self::Map => "map!",
        }
    }

    /// Text, file, email, url, tag, rune.
    pub const fn is_any_string(self) -> bool {
        matches!(self, Self::Text | Self::File | Self::Email | Self::Url | Self::Tag)
    }

    /// Block, group, fence.
    pub const fn is_any_list(self) -> bool {
        matches!(self, Self::Block | Self::Group | Self::Fence)
    }

    /// Tuple, chain, path.
    pub const fn is_any_sequence(self) -> bool {
        matches!(self, Self::Tuple | Self::Chain | Self::Path)
    }

    /// Object, module, error, frame.
    pub const fn is_any_context(self) -> bool {
        matches!(self, Self::Object | Self::Module | Self::Error | Self::Frame)
    }

    /// Kinds dont le payload est une référence indexée `(buffer, index)`.
    pub const fn is_any_series(self) -> bool {
        self.is_any_string() || self.is_any_list() || matches!(self, Self::Blob)
    }

    /// Kinds pouvant porter un sigil (`^`, `@`, `$`).
    pub const fn is_sigilable(self) -> bool {
        matches!(self, Self::Word) || self.is_any_list() || self.is_any_sequence()
    }

    /// Kinds dont le slot de binding est significatif.
    pub const fn is_bindable(self) -> bool {
        matches!(self, Self::Word) || self.is_any_list() || self.is_any_sequence()
    }

    /// Integer, decimal, percent.
    pub const fn is_number(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal | Self::Percent)
    }

    /// Antiforme définie pour ce kind, s'il y en a une.
    pub const fn antiform(self) -> Option<Antiform> {
        match self {
            Self::Word => Some(Antiform::Keyword),
            Self::Group => Some(Antiform::Splice),
            Self::Frame => Some(Antiform::Action),
            Self::Blank => Some(Antiform::Trash),
            Self::Block => Some(Antiform::Pack),
            Self::Error => Some(Antiform::Raised),
            Self::Comma => Some(Antiform::Ghost),
            _ => None,
        }
    }

    /// Délimiteur d'un kind de séquence.
    pub const fn delimiter(self) -> Option<char> {
        match self {
            Self::Tuple => Some('.'),
            Self::Chain => Some(':'),
            Self::Path => Some('/'),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
