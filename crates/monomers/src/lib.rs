//! The reference table of monomers shared by every notation
//!
//! Each [`Monomer`] is known by a HELM symbol and a MAP token, and carries a SMILES fragment whose open valences are
//! marked with attachment dummies (`[*:1]`, `[*:2]`, `[*:3]`). Libraries are written in KDL, validated once when
//! loaded, and are read-only afterwards.

mod errors;
mod library;

// Standard Library Imports
use std::collections::BTreeMap;

// External Crate Imports
use derive_more::Display;
use molzip::AttachmentId;

// Public API ==========================================================================================================

pub use errors::{InvalidLibrary, LibraryErrorKind, LibraryLoadError};
pub use library::{DEFAULT_KDL, MonomerLibrary};

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Monomer {
    pub symbol: String,
    pub token: String,
    pub name: String,
    pub kind: MonomerKind,
    pub smiles: String,
    caps: BTreeMap<AttachmentId, String>,
}

/// Where in a chain a monomer is allowed to sit, decided by the shape of its MAP token
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum MonomerKind {
    #[display("residue")]
    Residue,
    #[display("N-terminal cap")]
    NTerminalCap,
    #[display("C-terminal cap")]
    CTerminalCap,
}

impl Monomer {
    /// The attachments this monomer declares, in `R1`, `R2`, `R3` order
    pub fn attachments(&self) -> impl Iterator<Item = AttachmentId> + '_ {
        self.caps.keys().copied()
    }

    #[must_use]
    pub fn has_attachment(&self, attachment: AttachmentId) -> bool {
        self.caps.contains_key(&attachment)
    }

    /// The substituent that fills `attachment` when nothing else is bonded there
    #[must_use]
    pub fn cap(&self, attachment: AttachmentId) -> Option<&str> {
        self.caps.get(&attachment).map(String::as_str)
    }
}

impl MonomerKind {
    const N_TERMINAL_PREFIX: &'static str = "{nt:";
    const C_TERMINAL_PREFIX: &'static str = "{ct:";

    #[must_use]
    pub fn of_token(token: &str) -> Self {
        if token.starts_with(Self::N_TERMINAL_PREFIX) {
            Self::NTerminalCap
        } else if token.starts_with(Self::C_TERMINAL_PREFIX) {
            Self::CTerminalCap
        } else {
            Self::Residue
        }
    }

    /// The backbone attachments a monomer of this kind must declare
    #[must_use]
    pub const fn required_attachments(self) -> &'static [AttachmentId] {
        match self {
            Self::Residue => &[AttachmentId::A1, AttachmentId::A2],
            Self::NTerminalCap => &[AttachmentId::A2],
            Self::CTerminalCap => &[AttachmentId::A1],
        }
    }

    #[must_use]
    pub const fn is_cap(self) -> bool {
        !matches!(self, Self::Residue)
    }
}

// Module Tests ========================================================================================================
