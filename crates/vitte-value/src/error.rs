//! error.rs — Conditions de données signalées par le cœur des valeurs.
//!
//! Deux familles :
//! - [`CellError`] : conditions *récupérables* (index hors bornes, buffer
//!   libéré, profondeur de quote, antiforme mal définie…). Toujours vérifiées,
//!   même en release ; l'appelant immédiat décide comment les remonter.
//! - [`Rejection`] : refus de construction d'une séquence. Ce n'est pas une
//!   erreur d'exécution : l'appelant reçoit l'élément fautif.
//!
//! Les erreurs de programmation (mauvais accesseur pour le `Kind`, écriture
//! dans une cellule illisible) restent des `debug_assert!`.

use core::fmt;

use thiserror::Error;

use crate::heap::BufferId;
use crate::kind::Kind;
use crate::lift::MAX_QUOTE_DEPTH;

/// Résultat du cœur des valeurs.
pub type CellResult<T> = std::result::Result<T, CellError>;

/// Conditions de données récupérables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CellError {
    /// Index (éventuellement périmé) au-delà de la longueur courante du buffer.
    #[error("index {index} hors bornes (longueur {length})")]
    OutOfRange {
        /// Index demandé (index de la cellule + décalage éventuel).
        index: usize,
        /// Longueur logique observée au moment de l'accès.
        length: usize,
    },

    /// Le buffer a été libéré ou son propriétaire a expiré.
    #[error("données libérées ({buffer:?})")]
    DataFreed {
        /// Handle périmé.
        buffer: BufferId,
    },

    /// Le quoting dépasserait la profondeur maximale.
    #[error("profondeur de quote {requested} > {max}", max = MAX_QUOTE_DEPTH)]
    QuoteOverflow {
        /// Profondeur qui aurait résulté.
        requested: usize,
    },

    /// Retrait de plus de niveaux de quote qu'il n'y en a.
    #[error("unquote de {requested} niveau(x) sur une valeur quotée {actual} fois")]
    QuoteUnderflow {
        /// Niveaux demandés.
        requested: usize,
        /// Profondeur actuelle.
        actual: usize,
    },

    /// Les antiformes ne se quotent pas : passer d'abord par la quasiforme.
    #[error("une antiforme ne peut pas être quotée")]
    AntiformNotQuotable,

    /// Le kind n'a pas d'antiforme définie.
    #[error("{kind:?} n'a pas d'antiforme")]
    NoAntiform {
        /// Kind fautif.
        kind: Kind,
    },

    /// Antiforme instable hors de la convention « meta ».
    #[error("antiforme instable ({kind:?}) : capture meta requise")]
    UnstableAntiform {
        /// Kind de l'antiforme.
        kind: Kind,
    },

    /// Une antiforme ne porte jamais de sigil.
    #[error("antiforme de {kind:?} avec sigil")]
    SigilOnAntiform {
        /// Kind fautif.
        kind: Kind,
    },

    /// Coercition antiforme/quasiforme demandée sur une valeur quotée.
    #[error("coercition sur une valeur quotée")]
    QuotedCoercion,

    /// Le kind n'accepte pas de sigil.
    #[error("{kind:?} n'accepte pas de sigil")]
    NotSigilable {
        /// Kind fautif.
        kind: Kind,
    },

    /// Le kind n'accepte pas de binding.
    #[error("{kind:?} n'accepte pas de binding")]
    NotBindable {
        /// Kind fautif.
        kind: Kind,
    },

    /// Une antiforme ne peut pas être rangée dans un slot de liste.
    #[error("antiforme de {kind:?} interdite dans une liste")]
    NotAnElement {
        /// Kind de l'antiforme refusée.
        kind: Kind,
    },

    /// Buffer gelé : aucune mutation structurelle.
    #[error("buffer gelé ({buffer:?})")]
    Frozen {
        /// Buffer concerné.
        buffer: BufferId,
    },

    /// Insertion ou retrait sur un buffer de taille fixe (appariement).
    #[error("buffer de taille fixe : redimensionnement refusé")]
    FixedSize,

    /// Vue `const` d'un buffer par ailleurs mutable.
    #[error("vue const : mutation refusée")]
    ConstView,

    /// Variable protégée : écriture ordinaire refusée.
    #[error("slot protégé")]
    Protected,

    /// Le buffer libéré manuellement est déjà visible du GC.
    #[error("buffer managé ({buffer:?}) : seul le GC peut le libérer")]
    Managed {
        /// Buffer concerné.
        buffer: BufferId,
    },

    /// Le buffer n'a pas le type d'éléments attendu par l'accesseur.
    #[error("buffer de {found} là où {expected} était attendu")]
    ElementKind {
        /// Type d'éléments attendu.
        expected: &'static str,
        /// Type d'éléments trouvé.
        found: &'static str,
    },

    /// Coupure au milieu d'un caractère UTF-8.
    #[error("UTF-8 invalide")]
    InvalidUtf8,

    /// Clé absente d'un contexte ou d'une map.
    #[error("clé absente")]
    MissingKey,
}

/// Pourquoi un élément est refusé dans une séquence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Antiforme, quasiforme, valeur quotée ou portant un sigil.
    NotPlain,
    /// Kind non admis dans une séquence.
    Kind(Kind),
    /// Blank au milieu de la séquence (admis seulement en tête ou en queue).
    InteriorBlank,
    /// Blanks en tête et en queue à la fois.
    BlankAtBothEnds,
    /// Orthographe contenant un délimiteur (`/`, `:` ou `.`).
    IllegalSpelling,
    /// Séquence imbriquée interdite à ce niveau (ex. path dans un tuple).
    Nesting(Kind),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPlain => f.write_str("élément non plain (quote, quasi, anti ou sigil)"),
            Self::Kind(kind) => write!(f, "kind {kind} interdit dans une séquence"),
            Self::InteriorBlank => f.write_str("blank au milieu de la séquence"),
            Self::BlankAtBothEnds => f.write_str("blanks en tête et en queue"),
            Self::IllegalSpelling => f.write_str("orthographe contenant `/`, `:` ou `.`"),
            Self::Nesting(kind) => write!(f, "{kind} imbriqué interdit à ce niveau"),
        }
    }
}

/// Refus de construction d'une séquence (pas une exception).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Une séquence a au moins deux éléments.
    #[error("séquence trop courte ({len} élément(s))")]
    TooShort {
        /// Nombre d'éléments fournis.
        len: usize,
    },
    /// Séquence composée uniquement de blanks.
    #[error("séquence sans contenu (que des blanks)")]
    AllBlank,
    /// Élément refusé.
    #[error("élément {index} refusé : {reason}")]
    Element {
        /// Position de l'élément refusé.
        index: usize,
        /// Motif.
        reason: RejectReason,
    },
    /// Le kind demandé n'est pas une séquence.
    #[error("{0:?} n'est pas un kind de séquence")]
    NotSequence(Kind),
}
