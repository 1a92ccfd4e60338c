// External Crate Imports
use monomers::Monomer;

// Local Crate Imports
use crate::{Error, Linkage, LinkageError, Result};

// Public API ==========================================================================================================

/// One element of a chain as it was written: either a library monomer or a run of text that didn't match any monomer
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Unit<'l> {
    Monomer(&'l Monomer),
    Literal(String),
}

/// A monomer and its 1-based position in the chain
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Residue<'l> {
    pub position: usize,
    pub monomer: &'l Monomer,
}

/// The notation-independent form of a peptide, shared by every reader and writer
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Peptide<'l> {
    sequence: Vec<Unit<'l>>,
    n_term_mods: Vec<String>,
    c_term_mods: Vec<String>,
    link: Option<Linkage>,
}

impl<'l> Peptide<'l> {
    /// Positions in `link` count monomers only, skipping any literal units
    pub fn new(
        sequence: Vec<Unit<'l>>,
        n_term_mods: Vec<String>,
        c_term_mods: Vec<String>,
        link: Option<Linkage>,
    ) -> Result<Self> {
        if sequence.is_empty() {
            return Err(Error::EmptyPeptide);
        }

        let peptide = Self {
            sequence,
            n_term_mods,
            c_term_mods,
            link,
        };

        if let Some(Linkage { source, target }) = link {
            let length = peptide.len();
            for site in [source, target] {
                let monomer = peptide
                    .monomer(site.position)
                    .ok_or(LinkageError::OutOfRange { site, length })?;
                if !monomer.has_attachment(site.attachment) {
                    let symbol = monomer.symbol.clone();
                    return Err(LinkageError::UndeclaredAttachment { site, symbol }.into());
                }
            }
            if source.position == target.position {
                return Err(LinkageError::SelfLink(source.position).into());
            }
        }

        Ok(peptide)
    }

    #[must_use]
    pub fn sequence(&self) -> &[Unit<'l>] {
        &self.sequence
    }

    pub fn residues(&self) -> impl Iterator<Item = Residue<'l>> + '_ {
        self.sequence
            .iter()
            .filter_map(|unit| match unit {
                Unit::Monomer(monomer) => Some(*monomer),
                Unit::Literal(_) => None,
            })
            .zip(1..)
            .map(|(monomer, position)| Residue { position, monomer })
    }

    #[must_use]
    pub fn monomer(&self, position: usize) -> Option<&'l Monomer> {
        let index = position.checked_sub(1)?;
        self.residues().nth(index).map(|r| r.monomer)
    }

    pub fn literals(&self) -> impl Iterator<Item = &str> + '_ {
        self.sequence.iter().filter_map(|unit| match unit {
            Unit::Literal(text) => Some(text.as_str()),
            Unit::Monomer(_) => None,
        })
    }

    /// The number of monomers in the chain
    #[must_use]
    pub fn len(&self) -> usize {
        self.residues().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.residues().next().is_none()
    }

    #[must_use]
    pub fn n_term_mods(&self) -> &[String] {
        &self.n_term_mods
    }

    #[must_use]
    pub fn c_term_mods(&self) -> &[String] {
        &self.c_term_mods
    }

    #[must_use]
    pub const fn link(&self) -> Option<Linkage> {
        self.link
    }
}

// Module Tests ========================================================================================================
