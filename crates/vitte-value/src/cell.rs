//! cell.rs — La cellule : unité universelle de donnée, copiée par valeur.
//!
//! Une cellule = un en-tête ([`Header`] : kind + lift + sigil + flags), un
//! payload typé ([`Payload`]) et un slot de binding opaque. Le payload contient
//! soit des données en ligne (entiers, flottants, petits runs UTF-8), soit une
//! référence vers un buffer du [`Heap`](crate::heap::Heap).
//!
//! La cellule ne possède pas ses buffers : elle n'en garde qu'un handle
//! générationnel, vérifié à chaque accès.

use bitflags::bitflags;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::binding::Binding;
use crate::error::{CellError, CellResult};
use crate::heap::BufferId;
use crate::kind::Kind;
use crate::lift::Lift;
use crate::sequence::SequenceRepr;
use crate::sigil::Sigil;
use crate::symbol::Symbol;

/// Octets de données disponibles en ligne dans un payload.
pub const INLINE_CAPACITY: usize = 15;

/* ─────────────────────────── Octets en ligne ─────────────────────────── */

/// Petit run d'octets stocké directement dans la cellule.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InlineBytes {
    len: u8,
    data: [u8; INLINE_CAPACITY],
}

impl InlineBytes {
    /// `None` si `bytes` ne tient pas en ligne.
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > INLINE_CAPACITY {
            return None;
        }
        let mut data = [0u8; INLINE_CAPACITY];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self { len: bytes.len() as u8, data })
    }

    /// Octets utiles.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..usize::from(self.len)]
    }

    /// Nombre d'octets utiles.
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    /// Aucun octet.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Vue UTF-8, si les octets en sont.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_slice()).ok()
    }
}

impl core::fmt::Debug for InlineBytes {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.as_str() {
            Some(s) => write!(f, "Inline({s:?})"),
            None => write!(f, "Inline({:?})", self.as_slice()),
        }
    }
}

/* ─────────────────────────── En-tête ─────────────────────────── */

bitflags! {
    /// Flags par cellule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct CellFlags: u8 {
        /// Vue en lecture seule, plus restrictive que le buffer.
        const CONST          = 1 << 0;
        /// Slot de variable protégé contre l'écriture ordinaire.
        const PROTECTED      = 1 << 1;
        /// Cellule effacée : toute lecture est une erreur de programmation.
        const UNREADABLE     = 1 << 2;
        /// Indice pour l'afficheur : saut de ligne avant l'élément.
        const NEWLINE_BEFORE = 1 << 3;
    }
}

impl CellFlags {
    /// Flags qui suivent la valeur lors d'une copie (les autres restent au slot).
    pub const COPIED: Self = Self::CONST.union(Self::NEWLINE_BEFORE);
}

/// En-tête : kind, état lift, sigil et flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub(crate) kind: Kind,
    pub(crate) lift: Lift,
    pub(crate) sigil: Option<Sigil>,
    pub(crate) flags: CellFlags,
}

impl Header {
    /// En-tête plain, sans sigil ni flags.
    pub const fn new(kind: Kind) -> Self {
        Self { kind, lift: Lift::Plain, sigil: None, flags: CellFlags::empty() }
    }
}

/* ─────────────────────────── Payload ─────────────────────────── */

/// Ce qu'affiche une frame qui ne tourne pas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameLens {
    /// Phase en cours d'exécution (buffer portant le label).
    Phase(BufferId),
    /// Label mis en cache quand la frame n'exécute pas.
    Label(Option<Symbol>),
}

/// Convention de passage d'un paramètre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamClass {
    /// Argument évalué.
    #[default]
    Normal,
    /// Argument capturé en meta (accepte les antiformes instables).
    Meta,
    /// Argument pris littéralement.
    Literal,
}

bitflags! {
    /// Flags d'un paramètre.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct ParamFlags: u8 {
        /// Paramètre optionnel nommé (`/x`).
        const REFINEMENT = 1 << 0;
        /// Accepte la fin de l'entrée.
        const ENDABLE    = 1 << 1;
        /// Argument reçu en vue `const`.
        const CONST      = 1 << 2;
    }
}

/// Ensemble de kinds (un bit par code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Typeset(u32);

impl Typeset {
    /// Aucun kind.
    pub const EMPTY: Self = Self(0);

    /// Typeset des `kinds`.
    pub fn of(kinds: &[Kind]) -> Self {
        kinds.iter().fold(Self::EMPTY, |t, &k| t.with(k))
    }

    /// Ajoute un kind.
    #[must_use]
    pub const fn with(self, kind: Kind) -> Self {
        Self(self.0 | (1 << kind.code()))
    }

    /// Vrai si `kind` en fait partie.
    pub const fn contains(self, kind: Kind) -> bool {
        self.0 & (1 << kind.code()) != 0
    }

    /// Aucun kind.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Interprétation des mots de payload, dictée par le kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload {
    /// Kinds sans donnée (blank, comma, cellule effacée).
    Empty,
    /// Entier 64 bits.
    Integer(i64),
    /// Decimal et percent.
    Decimal(f64),
    /// Runes courtes.
    Inline(InlineBytes),
    /// Mots et keywords.
    Word(Symbol),
    /// Référence indexée (strings, blob, listes). L'index n'est jamais cru sur parole.
    Series {
        /// Buffer de fond.
        buffer: BufferId,
        /// Position, revérifiée à chaque accès.
        index: usize,
    },
    /// Tuple, chain, path.
    Sequence(SequenceRepr),
    /// Pair : appariement de deux cellules.
    Pairing(BufferId),
    /// Object, module, error : varlist gérée à l'extérieur.
    Context(BufferId),
    /// Frame : varlist d'appel + lentille.
    Frame {
        /// Slots des arguments et locaux.
        varlist: BufferId,
        /// Phase en cours ou label mis en cache.
        lens: FrameLens,
    },
    /// Paramètre d'action.
    Parameter {
        /// Bloc de spec gelé, optionnel.
        spec: Option<BufferId>,
        /// Classe de passage.
        class: ParamClass,
        /// Kinds acceptés.
        types: Typeset,
        /// Refinement, endable, const.
        flags: ParamFlags,
    },
    /// Handle opaque vers une donnée externe.
    Handle {
        /// Adresse, jamais déréférencée ici.
        addr: u64,
        /// Longueur déclarée.
        length: usize,
    },
    /// Map : pairlist clé/valeur.
    Map(BufferId),
}

/* ─────────────────────────── Cellule ─────────────────────────── */

/// Convention d'acceptation des antiformes instables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    /// Chemin ordinaire : antiformes stables seulement.
    Stable,
    /// Chemin meta : tout est accepté.
    Meta,
}

/// Valeur à taille fixe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub(crate) header: Header,
    pub(crate) payload: Payload,
    pub(crate) binding: Option<Binding>,
}

impl Cell {
    pub(crate) const fn from_parts(kind: Kind, payload: Payload) -> Self {
        Self { header: Header::new(kind), payload, binding: None }
    }

    /// Sentinelle « slot non initialisé ».
    pub const fn erased() -> Self {
        let mut header = Header::new(Kind::Blank);
        header.flags = CellFlags::UNREADABLE;
        Self { header, payload: Payload::Empty, binding: None }
    }

    /// `_`
    pub const fn blank() -> Self {
        Self::from_parts(Kind::Blank, Payload::Empty)
    }

    /// Antiforme de blank : valeur d'une variable jamais posée.
    pub const fn trash() -> Self {
        let mut c = Self::blank();
        c.header.lift = Lift::Anti;
        c
    }

    /// `,`
    pub const fn comma() -> Self {
        Self::from_parts(Kind::Comma, Payload::Empty)
    }

    /// Entier.
    pub const fn integer(i: i64) -> Self {
        Self::from_parts(Kind::Integer, Payload::Integer(i))
    }

    /// Decimal.
    pub const fn decimal(d: f64) -> Self {
        Self::from_parts(Kind::Decimal, Payload::Decimal(d))
    }

    /// Percent : `0.25` s'écrit `25%`.
    pub const fn percent(d: f64) -> Self {
        Self::from_parts(Kind::Percent, Payload::Decimal(d))
    }

    /// Mot plain, non lié.
    pub const fn word(sym: Symbol) -> Self {
        Self::from_parts(Kind::Word, Payload::Word(sym))
    }

    /// Rune d'un seul caractère.
    pub fn rune_char(c: char) -> Self {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        // 4 octets max : tient toujours en ligne
        let bytes = InlineBytes::new(s.as_bytes()).unwrap_or_default();
        Self::from_parts(Kind::Rune, Payload::Inline(bytes))
    }

    /// Rune courte ; `None` au-delà de [`INLINE_CAPACITY`] octets.
    pub fn rune(text: &str) -> Option<Self> {
        InlineBytes::new(text.as_bytes()).map(|b| Self::from_parts(Kind::Rune, Payload::Inline(b)))
    }

    /// Donnée hôte opaque (adresse + longueur).
    pub const fn handle(addr: u64, length: usize) -> Self {
        Self::from_parts(Kind::Handle, Payload::Handle { addr, length })
    }

    /// Paramètre sans spec.
    pub const fn parameter(class: ParamClass, types: Typeset, flags: ParamFlags) -> Self {
        Self::from_parts(Kind::Parameter, Payload::Parameter { spec: None, class, types, flags })
    }

    /* ───────────── Lecture de l'en-tête ───────────── */

    /// Faux pour une cellule effacée.
    pub const fn is_readable(&self) -> bool {
        !self.header.flags.contains(CellFlags::UNREADABLE)
    }

    #[inline]
    fn assert_readable(&self) {
        debug_assert!(self.is_readable(), "lecture d'une cellule effacée");
    }

    /// Type fondamental.
    pub fn kind(&self) -> Kind {
        self.assert_readable();
        self.header.kind
    }

    /// État de quoting.
    pub fn lift(&self) -> Lift {
        self.assert_readable();
        self.header.lift
    }

    /// Sigil éventuel.
    pub fn sigil(&self) -> Option<Sigil> {
        self.assert_readable();
        self.header.sigil
    }

    /// Flags de la cellule.
    pub const fn flags(&self) -> CellFlags {
        self.header.flags
    }

    /// Payload brut ; préférer les vues.
    pub fn payload(&self) -> &Payload {
        self.assert_readable();
        &self.payload
    }

    /// Nombre d'apostrophes.
    pub fn quote_depth(&self) -> u8 {
        self.lift().quote_depth()
    }

    /// Au moins une apostrophe.
    pub fn is_quoted(&self) -> bool {
        self.quote_depth() > 0
    }

    /// Antiforme (jamais quotée).
    pub fn is_antiform(&self) -> bool {
        self.lift() == Lift::Anti
    }

    /// Quasiforme non quotée.
    pub fn is_quasiform(&self) -> bool {
        self.lift() == Lift::Quasi
    }

    /// Antiforme qui ne peut pas vivre dans une variable ordinaire.
    pub fn is_unstable_antiform(&self) -> bool {
        self.is_antiform() && self.kind().antiform().is_some_and(|a| !a.is_stable())
    }

    /// Rangeable dans une liste (tout sauf antiforme).
    pub fn is_element(&self) -> bool {
        !self.is_antiform()
    }

    /// Plain, sans quote ni sigil.
    pub fn is_bare(&self) -> bool {
        self.lift() == Lift::Plain && self.sigil().is_none()
    }

    /// Vue `const` : mutation refusée à travers cette cellule.
    pub fn is_const(&self) -> bool {
        self.header.flags.contains(CellFlags::CONST)
    }

    /// Vrai pour un blank plain.
    pub fn is_blank(&self) -> bool {
        self.kind() == Kind::Blank && self.lift() == Lift::Plain
    }

    /* ───────────── Payloads en ligne ───────────── */

    /// Valeur d'un integer.
    pub fn as_integer(&self) -> Option<i64> {
        match *self.payload() {
            Payload::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Decimal ou percent.
    pub fn as_decimal(&self) -> Option<f64> {
        match *self.payload() {
            Payload::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Symbole d'un mot.
    pub fn as_symbol(&self) -> Option<Symbol> {
        match *self.payload() {
            Payload::Word(s) => Some(s),
            _ => None,
        }
    }

    /// Binding opaque, s'il y en a un.
    pub fn binding(&self) -> Option<Binding> {
        self.assert_readable();
        self.binding
    }

    /* ───────────── Quoting ───────────── */

    /// Ajoute `depth` niveaux de quote.
    pub fn quotify(&mut self, depth: u8) -> CellResult<()> {
        self.header.lift = self.lift().quotify(depth)?;
        Ok(())
    }

    /// Retire `depth` niveaux de quote.
    pub fn unquotify(&mut self, depth: u8) -> CellResult<()> {
        self.header.lift = self.lift().unquotify(depth)?;
        Ok(())
    }

    /// Variante par valeur de [`Cell::quotify`].
    pub fn quoted(mut self, depth: u8) -> CellResult<Self> {
        self.quotify(depth)?;
        Ok(self)
    }

    /// Variante par valeur de [`Cell::unquotify`].
    pub fn unquoted(mut self, depth: u8) -> CellResult<Self> {
        self.unquotify(depth)?;
        Ok(self)
    }

    /* ───────────── Antiforme / quasiforme ───────────── */

    /// Passe en antiforme (depuis plain ou quasiforme, profondeur 0).
    ///
    /// Les antiformes instables exigent [`Accept::Meta`].
    pub fn coerce_to_antiform(&mut self, accept: Accept) -> CellResult<()> {
        let kind = self.kind();
        if self.is_quoted() {
            return Err(CellError::QuotedCoercion);
        }
        let anti = kind.antiform().ok_or(CellError::NoAntiform { kind })?;
        if self.sigil().is_some() {
            return Err(CellError::SigilOnAntiform { kind });
        }
        if !anti.is_stable() && accept == Accept::Stable {
            return Err(CellError::UnstableAntiform { kind });
        }
        self.header.lift = Lift::Anti;
        Ok(())
    }

    /// Passe en quasiforme (depuis plain ou antiforme, profondeur 0).
    pub fn coerce_to_quasiform(&mut self) -> CellResult<()> {
        let kind = self.kind();
        if self.is_quoted() {
            return Err(CellError::QuotedCoercion);
        }
        // pas de quasiforme sans antiforme : `unmeta` doit toujours aboutir
        kind.antiform().ok_or(CellError::NoAntiform { kind })?;
        if self.sigil().is_some() {
            return Err(CellError::SigilOnAntiform { kind });
        }
        self.header.lift = Lift::Quasi;
        Ok(())
    }

    /// Convention meta : antiforme → quasiforme, sinon un quote de plus.
    pub fn meta(&mut self) -> CellResult<()> {
        if self.is_antiform() {
            self.header.lift = Lift::Quasi;
            return Ok(());
        }
        self.quotify(1)
    }

    /// Inverse de [`Cell::meta`] : quasiforme → antiforme, sinon un quote de moins.
    pub fn unmeta(&mut self) -> CellResult<()> {
        if self.is_quasiform() {
            return self.coerce_to_antiform(Accept::Meta);
        }
        self.unquotify(1)
    }

    /* ───────────── Sigil, flags, binding ───────────── */

    /// Pose ou retire le sigil ; refusé sur une antiforme ou une quasiforme.
    pub fn set_sigil(&mut self, sigil: Option<Sigil>) -> CellResult<()> {
        let kind = self.kind();
        if sigil.is_some() {
            if !kind.is_sigilable() {
                return Err(CellError::NotSigilable { kind });
            }
            if matches!(self.lift().base(), Lift::Anti | Lift::Quasi) {
                return Err(CellError::SigilOnAntiform { kind });
            }
        }
        self.header.sigil = sigil;
        Ok(())
    }

    /// Variante par valeur de [`Cell::set_sigil`].
    pub fn with_sigil(mut self, sigil: Sigil) -> CellResult<Self> {
        self.set_sigil(Some(sigil))?;
        Ok(self)
    }

    /// Prête la valeur en lecture seule.
    #[must_use]
    pub fn constified(mut self) -> Self {
        self.header.flags |= CellFlags::CONST;
        self
    }

    /// Retire la restriction `const` de la vue (pas celle du buffer).
    pub fn unconstify(&mut self) {
        self.header.flags.remove(CellFlags::CONST);
    }

    /// Indice de rendu : saut de ligne avant la cellule.
    pub fn set_newline_before(&mut self, on: bool) {
        self.header.flags.set(CellFlags::NEWLINE_BEFORE, on);
    }

    pub(crate) fn set_protected(&mut self, on: bool) {
        self.header.flags.set(CellFlags::PROTECTED, on);
    }

    /// Slot protégé contre l'écriture ordinaire.
    pub fn is_protected(&self) -> bool {
        self.header.flags.contains(CellFlags::PROTECTED)
    }

    /// Écrit le slot de binding (réservé aux kinds bindables).
    pub fn set_binding(&mut self, binding: Option<Binding>) -> CellResult<()> {
        let kind = self.kind();
        if binding.is_some() && !kind.is_bindable() {
            return Err(CellError::NotBindable { kind });
        }
        self.binding = binding;
        Ok(())
    }

    /// Indice de traversée pour le collecteur : buffers cités par le payload.
    pub fn referenced_buffers(&self) -> SmallVec<[BufferId; 2]> {
        let mut out = SmallVec::new();
        match self.payload {
            Payload::Series { buffer, .. }
            | Payload::Pairing(buffer)
            | Payload::Context(buffer)
            | Payload::Map(buffer) => out.push(buffer),
            Payload::Sequence(SequenceRepr::Pair(b) | SequenceRepr::Array(b)) => out.push(b),
            Payload::Frame { varlist, lens } => {
                out.push(varlist);
                if let FrameLens::Phase(phase) = lens {
                    out.push(phase);
                }
            }
            Payload::Parameter { spec: Some(spec), .. } => out.push(spec),
            _ => {}
        }
        out
    }

    /// Copie de la valeur vers un slot : les flags propres au slot ne suivent pas.
    pub(crate) fn copy_into(&self, slot: &mut Self) {
        let kept = slot.header.flags & CellFlags::PROTECTED;
        *slot = *self;
        slot.header.flags = (self.header.flags & CellFlags::COPIED) | kept;
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::erased()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn quote_roundtrip_on_integer() {
        let v = Cell::integer(5).quoted(3).unwrap();
        assert_eq!(v.quote_depth(), 3);
        assert_eq!(v.kind(), Kind::Integer);
        let back = v.unquoted(3).unwrap();
        assert_eq!(back, Cell::integer(5));
    }

    #[test]
    fn antiform_rules() {
        let mut i = Cell::integer(1);
        assert_eq!(
            i.coerce_to_antiform(Accept::Meta),
            Err(CellError::NoAntiform { kind: Kind::Integer })
        );

        let mut ghost = Cell::comma();
        assert_eq!(
            ghost.coerce_to_antiform(Accept::Stable),
            Err(CellError::UnstableAntiform { kind: Kind::Comma })
        );
        ghost.coerce_to_antiform(Accept::Meta).unwrap();
        assert!(ghost.is_unstable_antiform());
        assert_eq!(ghost.quotify(1), Err(CellError::AntiformNotQuotable));

        let mut q = Cell::blank().quoted(1).unwrap();
        assert_eq!(q.coerce_to_quasiform(), Err(CellError::QuotedCoercion));
    }

    #[test]
    fn quasiform_requires_an_antiform() {
        let mut i = Cell::integer(1);
        assert_eq!(i.coerce_to_quasiform(), Err(CellError::NoAntiform { kind: Kind::Integer }));
        assert_eq!(i.lift(), Lift::Plain);
        assert_eq!(i, Cell::integer(1));

        let mut b = Cell::blank();
        b.coerce_to_quasiform().unwrap();
        b.unmeta().unwrap();
        assert!(b.is_antiform());
    }

    #[test]
    fn meta_unmeta() {
        let mut trash = Cell::blank();
        trash.coerce_to_antiform(Accept::Stable).unwrap();
        trash.meta().unwrap();
        assert!(trash.is_quasiform());
        trash.meta().unwrap();
        assert_eq!(trash.quote_depth(), 1);
        trash.unmeta().unwrap();
        trash.unmeta().unwrap();
        assert!(trash.is_antiform());
        assert!(!trash.is_unstable_antiform());
    }

    #[test]
    fn sigils_and_binding_are_gated() {
        let mut i = Cell::integer(3);
        assert_eq!(i.set_sigil(Some(Sigil::Pin)), Err(CellError::NotSigilable { kind: Kind::Integer }));
        assert_eq!(
            i.set_binding(Binding::new(7)),
            Err(CellError::NotBindable { kind: Kind::Integer })
        );
        let mut t = word("foo");
        t.set_sigil(Some(Sigil::Meta)).unwrap();
        assert_eq!(t.coerce_to_antiform(Accept::Stable), Err(CellError::SigilOnAntiform { kind: Kind::Word }));
        t.set_binding(Binding::new(7)).unwrap();
        assert_eq!(t.binding(), Binding::new(7));
    }

    #[test]
    fn copy_keeps_slot_protection() {
        let mut slot = Cell::blank();
        slot.set_protected(true);
        Cell::integer(9).constified().copy_into(&mut slot);
        assert!(slot.is_protected());
        assert!(slot.is_const());
        assert_eq!(slot.as_integer(), Some(9));
    }

    #[test]
    fn inline_capacity() {
        assert!(Cell::rune("fifteen-bytes!!").is_some());
        assert!(Cell::rune("sixteen-bytes!!!").is_none());
        let r = Cell::rune_char('é');
        assert!(matches!(r.payload(), Payload::Inline(b) if b.as_str() == Some("é")));
    }

    #[test]
    fn typeset_bits() {
        let t = Typeset::of(&[Kind::Integer, Kind::Map]);
        assert!(t.contains(Kind::Map));
        assert!(!t.contains(Kind::Text));
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "cellule effacée")]
    fn erased_cell_is_unreadable() {
        let _ = Cell::erased().kind();
    }

    fn word(s: &str) -> Cell {
        let mut t = crate::symbol::SymbolTable::new();
        Cell::word(t.intern(s))
    }
}
