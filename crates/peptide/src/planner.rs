// Standard Library Imports
use std::collections::{BTreeMap, btree_map::Entry};

// External Crate Imports
use derive_more::Display;
use molzip::{AttachmentId, Site};
use tracing::debug;

// Local Crate Imports
use crate::{Error, Linkage, Peptide, Result};

// Public API ==========================================================================================================

/// What an attachment point is used for once a peptide has been assembled
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display)]
pub enum Consumption {
    /// Bonded into the backbone, to the residue at this position
    #[display("backbone bond to residue {_0}")]
    Backbone(usize),
    /// Bonded to the residue at this position, closing the ring
    #[display("cyclization with residue {_0}")]
    Cyclization(usize),
    /// Left free, so it's filled with its cap
    #[display("cap")]
    Unused,
}

/// The fate of every attachment point declared by every monomer of a peptide
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct LinkPlan {
    entries: BTreeMap<Site, Consumption>,
    link: Option<Linkage>,
}

impl LinkPlan {
    /// Plans backbone bonds between every adjacent pair of monomers, then the peptide's link (if it has one), and
    /// leaves every other attachment point unused
    ///
    /// # Errors
    ///
    /// Fails if the peptide has no monomers, if a backbone bond needs an attachment the monomer doesn't declare, or if
    /// the link lands on an attachment point that the backbone already uses.
    pub fn new(peptide: &Peptide) -> Result<Self> {
        if peptide.is_empty() {
            return Err(Error::EmptyPeptide);
        }

        let mut entries = BTreeMap::new();
        for residue in peptide.residues() {
            for attachment in residue.monomer.attachments() {
                entries.insert(Site::new(residue.position, attachment), Consumption::Unused);
            }
        }

        let mut consume = |site: Site, consumption: Consumption| match entries.entry(site) {
            Entry::Occupied(mut entry) if *entry.get() == Consumption::Unused => {
                entry.insert(consumption);
                Ok(())
            }
            Entry::Occupied(entry) => Err(Error::ConflictingLinkage {
                site,
                consumption: *entry.get(),
            }),
            Entry::Vacant(_) => {
                let symbol = peptide
                    .monomer(site.position)
                    .map(|m| m.symbol.clone())
                    .unwrap_or_default();
                Err(Error::BrokenBackbone { site, symbol })
            }
        };

        for position in 1..peptide.len() {
            let next = position + 1;
            consume(Site::new(position, AttachmentId::A2), Consumption::Backbone(next))?;
            consume(Site::new(next, AttachmentId::A1), Consumption::Backbone(position))?;
        }

        let link = peptide.link();
        if let Some(Linkage { source, target }) = link {
            consume(source, Consumption::Cyclization(target.position))?;
            consume(target, Consumption::Cyclization(source.position))?;
        }

        let plan = Self { entries, link };
        debug!(
            sites = plan.entries.len(),
            unused = plan.unused().count(),
            cyclized = link.is_some(),
            "planned peptide linkages"
        );
        Ok(plan)
    }

    #[must_use]
    pub fn get(&self, site: Site) -> Option<Consumption> {
        self.entries.get(&site).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Site, Consumption)> + '_ {
        self.entries.iter().map(|(&s, &c)| (s, c))
    }

    /// Every planned attachment of the monomer at `position`
    pub fn at(&self, position: usize) -> impl Iterator<Item = (AttachmentId, Consumption)> + '_ {
        let first = Site::new(position, AttachmentId::A1);
        let last = Site::new(position, AttachmentId::A3);
        self.entries
            .range(first..=last)
            .map(|(s, &c)| (s.attachment, c))
    }

    pub fn unused(&self) -> impl Iterator<Item = Site> + '_ {
        self.iter()
            .filter(|&(_, c)| c == Consumption::Unused)
            .map(|(s, _)| s)
    }

    /// The pair of sites bonded to close the ring
    #[must_use]
    pub const fn cyclization(&self) -> Option<Linkage> {
        self.link
    }
}

// Module Tests ========================================================================================================
