//! Zips SMILES fragments together at labelled attachment points
//!
//! Fragments mark their open valences with dummy atoms like `[*:1]`. Once loaded for a given chain position, each
//! dummy becomes a [`Site`] that can be capped with a substituent, or bonded to another site, either in a second
//! fragment ([`GraphEngine::join_fragments`]) or in the same one ([`GraphEngine::close_ring`]).

mod errors;
mod fragment;
mod layout;
mod parser;
mod zip;

// External Crate Imports
use derive_more::{Constructor, Display};

// Public API ==========================================================================================================

pub use errors::{GraphEngineError, Result, SmilesErrorKind};
pub use fragment::Fragment;
pub use zip::SmilesEngine;

/// One of the (up to three) named open valences of a monomer
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
pub enum AttachmentId {
    #[display("R1")]
    A1,
    #[display("R2")]
    A2,
    #[display("R3")]
    A3,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Constructor)]
#[display("{position}:{attachment}")]
pub struct Site {
    pub position: usize,
    pub attachment: AttachmentId,
}

/// The structural operations needed to assemble a linear or singly-cyclized chain
pub trait GraphEngine {
    type Fragment;

    fn fragment(&self, smiles: &str, position: usize) -> Result<Self::Fragment>;

    fn cap_attachment(&self, fragment: Self::Fragment, site: Site, substituent: &str) -> Result<Self::Fragment>;

    fn join_fragments(
        &self,
        left: Self::Fragment,
        left_site: Site,
        right: Self::Fragment,
        right_site: Site,
    ) -> Result<Self::Fragment>;

    fn close_ring(&self, fragment: Self::Fragment, a: Site, b: Site) -> Result<Self::Fragment>;

    fn write(&self, fragment: &Self::Fragment) -> Result<String>;
}

impl AttachmentId {
    pub const ALL: [Self; 3] = [Self::A1, Self::A2, Self::A3];

    #[must_use]
    pub const fn number(self) -> u32 {
        match self {
            Self::A1 => 1,
            Self::A2 => 2,
            Self::A3 => 3,
        }
    }

    #[must_use]
    pub const fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(Self::A1),
            2 => Some(Self::A2),
            3 => Some(Self::A3),
            _ => None,
        }
    }

    /// Parses HELM-style R-group names like `R2`
    #[must_use]
    pub fn from_r_group(name: &str) -> Option<Self> {
        name.strip_prefix('R')
            .and_then(|number| number.parse().ok())
            .and_then(Self::from_number)
    }
}

// Module Tests ========================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_numbering() {
        for attachment in AttachmentId::ALL {
            assert_eq!(
                AttachmentId::from_number(attachment.number()),
                Some(attachment)
            );
            assert_eq!(
                AttachmentId::from_r_group(&attachment.to_string()),
                Some(attachment)
            );
        }
        assert_eq!(AttachmentId::from_number(0), None);
        assert_eq!(AttachmentId::from_number(4), None);
        assert_eq!(AttachmentId::from_r_group("R4"), None);
        assert_eq!(AttachmentId::from_r_group("3"), None);
        assert_eq!(AttachmentId::from_r_group("R"), None);
    }

    #[test]
    fn site_display() {
        assert_eq!(Site::new(12, AttachmentId::A3).to_string(), "12:R3");
    }
}
